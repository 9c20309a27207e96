pub mod types;
pub mod wiki_service;
