use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::timeout;
use urlencoding::encode;

use crate::types::geo_point::GeoPoint;
use crate::utils::{geo::format_distance, query_string::format_query_url};

use super::types::{
    geosearch_response::{GeosearchPage, GeosearchResponse},
    wiki_service_error::WikiServiceError,
};

/// Search radius around the caller's position, in meters.
pub const GEOSEARCH_RADIUS_M: u32 = 10_000;

/// Shown for pages that have no thumbnail of their own.
pub const DEFAULT_THUMBNAIL: &str = "https://bits.wikimedia.org/apple-touch/wikipedia.png";

/// How long to wait for the geosearch response before giving up.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

// The endpoint replies as JSONP: the payload arrives wrapped in a call to
// this function name. One fixed name means one request logically in flight
// at a time; concurrent fetches would need per-request callback identifiers.
const JSONP_CALLBACK: &str = "callback";

#[derive(Clone)]
pub struct WikiServiceConfig {
    pub host: String,
    pub fetch_timeout: Duration,
}

#[derive(Clone)]
pub struct WikiService {
    config: WikiServiceConfig,
    client: reqwest::Client,
}

/// A point of interest near the caller, ready to render.
#[derive(Debug)]
pub struct NearbyItem {
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    /// Formatted distance from the caller, e.g. `"512 m"`. Unset when the
    /// page carries no coordinates.
    pub distance: Option<String>,
}

impl WikiService {
    pub fn new(config: WikiServiceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Runs a geosearch centered on `point` and maps each returned page to a
    /// [`NearbyItem`], preserving the API's own page order.
    pub async fn get_nearby_items(
        &self,
        point: GeoPoint,
    ) -> Result<Vec<NearbyItem>, WikiServiceError> {
        let params = geosearch_params(point);
        let url = format_query_url(&format!("{}/w/api.php", self.config.host), &params);

        let body = self.fetch_jsonp(&url).await?;
        let payload = strip_jsonp(&body, JSONP_CALLBACK)?;
        let response: GeosearchResponse = serde_json::from_str(payload).map_err(|e| {
            WikiServiceError::Payload(format!("Failed to parse geosearch response: {}", e))
        })?;

        let mut items = Vec::with_capacity(response.query.pages.len());
        for (_page_id, value) in response.query.pages {
            let page: GeosearchPage = serde_json::from_value(value)
                .map_err(|e| WikiServiceError::Payload(format!("Malformed page entry: {}", e)))?;
            items.push(self.to_nearby_item(point, page));
        }

        Ok(items)
    }

    fn to_nearby_item(&self, point: GeoPoint, page: GeosearchPage) -> NearbyItem {
        let url = format!("{}/wiki/{}", self.config.host, encode(&page.title));
        let thumbnail_url = page
            .thumbnail
            .map(|t| t.source)
            .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string());
        let distance = page
            .coordinates
            .as_ref()
            .and_then(|coords| coords.first())
            .map(|c| format_distance(point, GeoPoint { lat: c.lat, lon: c.lon }));

        NearbyItem {
            title: page.title,
            url,
            thumbnail_url,
            distance,
        }
    }

    async fn fetch_jsonp(&self, url: &str) -> Result<String, WikiServiceError> {
        let fetch = async {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| WikiServiceError::Request(format!("Failed to send request: {}", e)))?;
            resp.text().await.map_err(|e| {
                WikiServiceError::Request(format!("Failed to read response body: {}", e))
            })
        };

        timeout(self.config.fetch_timeout, fetch)
            .await
            .map_err(|_| WikiServiceError::Timeout)?
    }
}

fn geosearch_params(point: GeoPoint) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("action", "query".to_string()),
        ("format", "json".to_string()),
        ("colimit", "max".to_string()),
        ("prop", "pageimages|coordinates".to_string()),
        ("pithumbsize", "180".to_string()),
        ("pilimit", "50".to_string()),
        ("generator", "geosearch".to_string()),
        ("ggsradius", GEOSEARCH_RADIUS_M.to_string()),
        ("ggsnamespace", "0".to_string()),
        ("ggslimit", "50".to_string()),
        ("ggscoord", format!("{}|{}", point.lat, point.lon)),
        ("callback", JSONP_CALLBACK.to_string()),
    ])
}

/// Extracts the JSON argument from a `callback(<json>)` invocation,
/// tolerating the `/**/` prefix the API emits.
fn strip_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str, WikiServiceError> {
    let open = body
        .find(&format!("{}(", callback))
        .map(|i| i + callback.len() + 1)
        .ok_or_else(|| {
            WikiServiceError::Payload("Response is not a JSONP callback invocation".to_string())
        })?;
    let close = body.rfind(')').filter(|&i| i >= open).ok_or_else(|| {
        WikiServiceError::Payload("Unterminated JSONP callback invocation".to_string())
    })?;

    Ok(&body[open..close])
}
