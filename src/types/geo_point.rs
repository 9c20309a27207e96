/// A latitude/longitude pair in decimal degrees (WGS84 assumed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}
