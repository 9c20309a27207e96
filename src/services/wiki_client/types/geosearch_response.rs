use serde::Deserialize;

#[derive(Deserialize)]
pub struct GeosearchThumbnail {
    pub source: String,
}

#[derive(Deserialize)]
pub struct GeosearchCoordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct GeosearchPage {
    pub title: String,
    pub thumbnail: Option<GeosearchThumbnail>,
    pub coordinates: Option<Vec<GeosearchCoordinate>>,
}

/// `query.pages` keyed by opaque page id. Kept as a raw JSON map so items
/// come out in the order the API returned them; each page is decoded into
/// [`GeosearchPage`] as it is consumed.
#[derive(Deserialize, Default)]
pub struct GeosearchQuery {
    #[serde(default)]
    pub pages: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct GeosearchResponse {
    #[serde(default)]
    pub query: GeosearchQuery,
}
