use crate::{
    middlewares::auth::auth_middleware,
    routes::apply_routes,
    services::wiki_client::wiki_service::{WikiService, WikiServiceConfig, FETCH_TIMEOUT},
    types::app_state::AppState,
};
use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

pub fn gen_app(wiki_host: &str, auth_key: Option<String>) -> Router {
    let cors_middleware = CorsLayer::new();
    let state = AppState {
        wiki_service: WikiService::new(WikiServiceConfig {
            host: wiki_host.to_string(),
            fetch_timeout: FETCH_TIMEOUT,
        }),
        auth_key,
    };

    apply_routes(Router::new())
        .route("/", get(root))
        .layer(cors_middleware)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

async fn root() -> &'static str {
    "nearby-api"
}

#[cfg(test)]
pub struct MockApp {
    pub app: Router,
    pub wiki_server: mockito::ServerGuard,
}

/// A router wired to a fresh mockito server standing in for the wiki host.
#[cfg(test)]
pub async fn gen_mock_app() -> MockApp {
    let wiki_server = mockito::Server::new_async().await;
    let app = gen_app(&wiki_server.url(), None);

    MockApp { app, wiki_server }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn root_responds() {
        let app = gen_app("http://wiki.invalid", None);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_request_without_auth_header() {
        let app = gen_app("http://wiki.invalid", Some("secret".to_string()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_request_with_auth_header() {
        let app = gen_app("http://wiki.invalid", Some("secret".to_string()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("authorization", "secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
