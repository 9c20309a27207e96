use crate::services::wiki_client::wiki_service::WikiService;

#[derive(Clone)]
pub struct AppState {
    pub wiki_service: WikiService,
    pub auth_key: Option<String>,
}
