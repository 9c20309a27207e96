pub mod app_state;
pub mod geo_point;
