use axum::{routing::get, Router};

use crate::types::app_state::AppState;

mod get_nearby_items;

pub fn apply_routes(app: Router<AppState>) -> Router<AppState> {
    app.route("/nearby-items", get(get_nearby_items::get_nearby_items))
}
