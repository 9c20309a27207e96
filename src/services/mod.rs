pub mod wiki_client;
