pub mod offline_cache;
