pub mod geosearch_response;
pub mod wiki_service_error;
