mod app;
mod middlewares;
mod routes;
mod services;
mod types;
mod utils;
mod workers;

use std::env;

use tracing::info;

use crate::workers::offline_cache::{self, LocalWorkerRuntime};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    info!("Starting nearby-api...");

    let wiki_host =
        env::var("WIKIPEDIA_HOST").unwrap_or_else(|_| "https://en.wikipedia.org".to_string());
    let auth_key = env::var("AUTH_KEY").ok();
    let public_origin =
        env::var("PUBLIC_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let _worker = offline_cache::bootstrap(LocalWorkerRuntime::new("."), &public_origin).await;

    let app = app::gen_app(&wiki_host, auth_key);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
