use crate::{
    types::{app_state::AppState, geo_point::GeoPoint},
    utils::{app_error::AppError, validated_query::ValidatedQuery},
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use validator::Validate;

#[derive(Validate, Deserialize)]
pub struct GetNearbyItemsPayload {
    #[validate(length(min = 1, message = "Must be at least 1 character"))]
    pub lat: String,

    #[validate(length(min = 1, message = "Must be at least 1 character"))]
    pub lon: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyItemsResponseItem {
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyItemsResponseData {
    pub items: Vec<GetNearbyItemsResponseItem>,
}

#[derive(Serialize, Deserialize)]
pub struct GetNearbyItemsResponse {
    pub data: GetNearbyItemsResponseData,
}

pub async fn get_nearby_items(
    State(state): State<AppState>,
    ValidatedQuery(payload): ValidatedQuery<GetNearbyItemsPayload>,
) -> Result<Response, AppError> {
    let point = parse_point(&payload)?;

    let items = state.wiki_service.get_nearby_items(point).await.map_err(|e| {
        error!("Failed to fetch nearby items: {}", e);
        AppError::from(e)
    })?;

    for item in &items {
        // Distance is computed per item but not rendered in the payload.
        debug!(
            "nearby item: {} ({})",
            item.title,
            item.distance.as_deref().unwrap_or("distance unknown")
        );
    }

    Ok(Json(GetNearbyItemsResponse {
        data: GetNearbyItemsResponseData {
            items: items
                .into_iter()
                .map(|item| GetNearbyItemsResponseItem {
                    title: item.title,
                    url: item.url,
                    thumbnail_url: item.thumbnail_url,
                })
                .collect(),
        },
    })
    .into_response())
}

fn parse_point(payload: &GetNearbyItemsPayload) -> Result<GeoPoint, AppError> {
    match (payload.lat.parse::<f64>(), payload.lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Ok(GeoPoint { lat, lon }),
        _ => Err(AppError::bad_request(
            "Invalid query: lat and lon must be decimal degrees",
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use super::*;
    use crate::{app::gen_mock_app, services::wiki_client::wiki_service::DEFAULT_THUMBNAIL};

    fn geosearch_body() -> String {
        format!(
            "/**/callback({})",
            serde_json::json!({
                "query": {
                    "pages": {
                        "18618509": {
                            "title": "Santa Cruz Wharf",
                            "thumbnail": {
                                "source": "https://upload.wikimedia.org/thumb/wharf.jpg"
                            },
                            "coordinates": [{ "lat": 36.9616, "lon": -122.0219 }]
                        },
                        "5407153": {
                            "title": "Natural Bridges State Beach",
                            "coordinates": [{ "lat": 36.9495, "lon": -122.0575 }]
                        }
                    }
                }
            })
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn renders_nearby_items() {
        let mut mock_app = gen_mock_app().await;

        let mock_server = mock_app
            .wiki_server
            .mock("GET", "/w/api.php")
            .with_header("content-type", "text/javascript")
            .with_body(geosearch_body())
            .match_query(mockito::Matcher::Regex(".*".to_string()))
            .create_async()
            .await;

        let response = mock_app
            .app
            .oneshot(
                Request::builder()
                    .uri("/nearby-items?lat=37.0&lon=-122.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        mock_server.assert();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: GetNearbyItemsResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(body.data.items.len(), 2);

        assert_eq!(body.data.items[0].title, "Santa Cruz Wharf");
        assert_eq!(
            body.data.items[0].url,
            format!("{}/wiki/Santa%20Cruz%20Wharf", mock_app.wiki_server.url())
        );
        assert_eq!(
            body.data.items[0].thumbnail_url,
            "https://upload.wikimedia.org/thumb/wharf.jpg"
        );

        assert_eq!(body.data.items[1].title, "Natural Bridges State Beach");
        assert_eq!(
            body.data.items[1].url,
            format!(
                "{}/wiki/Natural%20Bridges%20State%20Beach",
                mock_app.wiki_server.url()
            )
        );
        assert_eq!(body.data.items[1].thumbnail_url, DEFAULT_THUMBNAIL);
    }

    #[tokio::test]
    async fn rejects_a_missing_position() {
        let mock_app = gen_mock_app().await;

        let response = mock_app
            .app
            .oneshot(
                Request::builder()
                    .uri("/nearby-items?lat=37.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_a_malformed_position() {
        let mock_app = gen_mock_app().await;

        let response = mock_app
            .app
            .oneshot(
                Request::builder()
                    .uri("/nearby-items?lat=north&lon=-122.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[traced_test]
    async fn renders_bad_gateway_on_a_non_jsonp_body() {
        let mut mock_app = gen_mock_app().await;

        mock_app
            .wiki_server
            .mock("GET", "/w/api.php")
            .with_status(503)
            .with_body("<html>upstream error</html>")
            .match_query(mockito::Matcher::Regex(".*".to_string()))
            .create_async()
            .await;

        let response = mock_app
            .app
            .oneshot(
                Request::builder()
                    .uri("/nearby-items?lat=37.0&lon=-122.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(logs_contain("Failed to fetch nearby items"));
    }
}
