pub mod app_error;
pub mod geo;
pub mod query_string;
pub mod validated_query;
