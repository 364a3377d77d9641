// SPDX-License-Identifier: MIT

//! Client for the external route recommendation service.
//!
//! The service is best-effort: crew creation must succeed even when it is
//! down, slow, or returns a partial payload. Every optional field is
//! resolved to a default once here, so the rest of the code only ever sees
//! a complete [`RouteInfo`].

use argon2::password_hash::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Normalized route description with every field present.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub route_id: String,
    pub route_type: String,
    pub distance_km: f64,
    pub safety_score: i64,
    pub duration_min: i64,
    /// Ordered "lat,lng" coordinate pairs
    pub waypoints: Vec<String>,
}

const DEFAULT_ROUTE_TYPE: &str = "safe";
const DEFAULT_DISTANCE_KM: f64 = 5.0;
const DEFAULT_SAFETY_SCORE: i64 = 20;
const DEFAULT_DURATION_MIN: i64 = 30;

/// Small square loop around the default start point, used whenever the
/// service supplies no waypoints.
fn default_waypoints() -> Vec<String> {
    vec![
        "35.8714,128.6014".to_string(),
        "35.8764,128.6014".to_string(),
        "35.8764,128.6064".to_string(),
        "35.8714,128.6064".to_string(),
        "35.8714,128.6014".to_string(),
    ]
}

fn generated_route_id() -> String {
    let mut buf = [0u8; 8];
    OsRng.fill_bytes(&mut buf);
    format!("route-{:016x}", u64::from_le_bytes(buf))
}

impl RouteInfo {
    /// The fixed payload used when the recommendation service fails.
    pub fn fallback() -> Self {
        Self {
            route_id: generated_route_id(),
            route_type: DEFAULT_ROUTE_TYPE.to_string(),
            distance_km: DEFAULT_DISTANCE_KM,
            safety_score: DEFAULT_SAFETY_SCORE,
            duration_min: DEFAULT_DURATION_MIN,
            waypoints: default_waypoints(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest<'a> {
    start_location: &'a str,
    distance_km: f64,
    pace: &'a str,
}

/// Wire shape of a recommendation. The service has shipped both a single
/// `route` object and a `routes` array; accept either.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RecommendResponse {
    route: Option<RouteBody>,
    routes: Option<Vec<RouteBody>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RouteBody {
    id: Option<String>,
    #[serde(rename = "type")]
    route_type: Option<String>,
    distance_km: Option<f64>,
    safety_score: Option<i64>,
    estimated_time_min: Option<i64>,
    waypoints: Option<Vec<WaypointBody>>,
}

#[derive(Debug, Deserialize)]
struct WaypointBody {
    lat: f64,
    lng: f64,
}

impl RouteBody {
    /// Resolve every missing field to its documented default.
    fn into_route_info(self) -> RouteInfo {
        let waypoints = match self.waypoints {
            Some(points) if !points.is_empty() => points
                .iter()
                .map(|p| format!("{},{}", p.lat, p.lng))
                .collect(),
            _ => default_waypoints(),
        };

        RouteInfo {
            route_id: self.id.unwrap_or_else(generated_route_id),
            route_type: self
                .route_type
                .unwrap_or_else(|| DEFAULT_ROUTE_TYPE.to_string()),
            distance_km: self.distance_km.unwrap_or(DEFAULT_DISTANCE_KM),
            safety_score: self.safety_score.unwrap_or(DEFAULT_SAFETY_SCORE),
            duration_min: self.estimated_time_min.unwrap_or(DEFAULT_DURATION_MIN),
            waypoints,
        }
    }
}

#[derive(Clone)]
pub struct RouteInfoClient {
    client: reqwest::Client,
    base_url: String,
}

impl RouteInfoClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Request a recommended route for a crew. Never fails: any transport
    /// or decode problem logs its class and returns the fallback payload.
    pub async fn recommend(&self, start_location: Option<&str>, pace: Option<&str>) -> RouteInfo {
        let request = RecommendRequest {
            start_location: start_location.unwrap_or("35.8714,128.6014"),
            distance_km: DEFAULT_DISTANCE_KM,
            pace: pace.unwrap_or("6'00\"/km"),
        };

        let url = format!("{}/api/routes/recommend", self.base_url);
        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::warn!(error = %e, "Route service timed out, using fallback route");
                return RouteInfo::fallback();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Route service unreachable, using fallback route");
                return RouteInfo::fallback();
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Route service returned an error, using fallback route");
            return RouteInfo::fallback();
        }

        let body: RecommendResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Route service response did not decode, using fallback route");
                return RouteInfo::fallback();
            }
        };

        let route = body
            .route
            .or_else(|| body.routes.into_iter().flatten().next());

        match route {
            Some(route) => route.into_route_info(),
            None => {
                tracing::warn!("Route service response held no route, using fallback route");
                RouteInfo::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_body_resolves_field_defaults() {
        let body: RecommendResponse = serde_json::from_str(
            r#"{"route": {"id": "r-1", "distanceKm": 7.5}}"#,
        )
        .unwrap();

        let info = body.route.unwrap().into_route_info();
        assert_eq!(info.route_id, "r-1");
        assert_eq!(info.route_type, "safe");
        assert_eq!(info.distance_km, 7.5);
        assert_eq!(info.safety_score, 20);
        assert_eq!(info.duration_min, 30);
        assert_eq!(info.waypoints, default_waypoints());
    }

    #[test]
    fn test_legacy_routes_array_shape() {
        let body: RecommendResponse = serde_json::from_str(
            r#"{"routes": [{"id": "first", "type": "scenic",
                 "waypoints": [{"lat": 1.0, "lng": 2.0}]}, {"id": "second"}]}"#,
        )
        .unwrap();

        let route = body
            .route
            .or_else(|| body.routes.into_iter().flatten().next())
            .unwrap();
        let info = route.into_route_info();
        assert_eq!(info.route_id, "first");
        assert_eq!(info.route_type, "scenic");
        assert_eq!(info.waypoints, vec!["1,2"]);
    }

    #[test]
    fn test_fallback_is_complete() {
        let info = RouteInfo::fallback();
        assert!(!info.route_id.is_empty());
        assert_eq!(info.route_type, "safe");
        assert_eq!(info.distance_km, 5.0);
        assert_eq!(info.safety_score, 20);
        assert_eq!(info.duration_min, 30);
        assert_eq!(info.waypoints.len(), 5);
    }
}
