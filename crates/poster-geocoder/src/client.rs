// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Nominatim search API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument, trace};

use crate::error::GeocodeError;
use crate::types::{GeocodeMatch, GeocodeQuery};
use crate::Geocoder;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Nominatim `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
	http_client: Client,
	base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
	lat: String,
	lon: String,
	display_name: String,
}

impl NominatimClient {
	/// Creates a client that identifies itself with `user_agent`.
	pub fn new(user_agent: &str) -> Result<Self, GeocodeError> {
		Self::with_timeout(user_agent, DEFAULT_TIMEOUT)
	}

	pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
		let http_client = Client::builder()
			.user_agent(user_agent)
			.timeout(timeout)
			.build()?;

		Ok(Self {
			http_client,
			base_url: DEFAULT_BASE_URL.to_string(),
		})
	}

	/// Sets a custom base URL for the API (useful for testing or a self-hosted instance).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	#[instrument(skip(self), fields(query = %query.text))]
	async fn search(&self, query: &GeocodeQuery) -> Result<Option<GeocodeMatch>, GeocodeError> {
		let url = format!("{}/search", self.base_url);
		debug!(url = %url, "Sending search request to Nominatim");

		let response = self
			.http_client
			.get(&url)
			.query(&[
				("q", query.text.as_str()),
				("format", "jsonv2"),
				("limit", "1"),
			])
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					error!("Request timed out");
					return GeocodeError::Timeout;
				}
				error!(error = %e, "Network error during Nominatim request");
				GeocodeError::Network(e)
			})?;

		let status = response.status();
		debug!(status = %status, "Received response from Nominatim");

		if !status.is_success() {
			let status_code = status.as_u16();
			let body = response.text().await.unwrap_or_default();

			if status_code == 429 {
				error!(status = status_code, "Rate limit exceeded");
				return Err(GeocodeError::RateLimited);
			}

			error!(status = status_code, body = %body, "Nominatim API error");
			return Err(GeocodeError::ApiError {
				status: status_code,
				message: body,
			});
		}

		let body = response.text().await.map_err(|e| {
			error!(error = %e, "Failed to read response body");
			GeocodeError::Network(e)
		})?;

		trace!(body = %body, "Response body");

		let places: Vec<NominatimPlace> = serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "Failed to parse Nominatim response");
			GeocodeError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;

		let Some(place) = places.into_iter().next() else {
			debug!("No match");
			return Ok(None);
		};

		let found = GeocodeMatch {
			latitude: parse_coordinate("lat", &place.lat)?,
			longitude: parse_coordinate("lon", &place.lon)?,
			display_name: place.display_name,
		};

		debug!(
			latitude = found.latitude,
			longitude = found.longitude,
			"Geocode completed successfully"
		);
		Ok(Some(found))
	}
}

fn parse_coordinate(field: &str, value: &str) -> Result<f64, GeocodeError> {
	value
		.parse::<f64>()
		.ok()
		.filter(|v| v.is_finite())
		.ok_or_else(|| GeocodeError::InvalidResponse(format!("{field} is not a number: '{value}'")))
}

#[async_trait]
impl Geocoder for NominatimClient {
	async fn geocode(&self, query: &GeocodeQuery) -> Result<Option<GeocodeMatch>, GeocodeError> {
		self.search(query).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client_for(server: &MockServer) -> NominatimClient {
		NominatimClient::new("poster-worker-tests/1.0")
			.unwrap()
			.with_base_url(server.uri())
	}

	#[test]
	fn test_client_creation() {
		let client = NominatimClient::new("poster-worker/0.1.0").unwrap();
		assert_eq!(client.base_url, DEFAULT_BASE_URL);
	}

	#[test]
	fn test_with_base_url_strips_trailing_slash() {
		let client = NominatimClient::new("ua")
			.unwrap()
			.with_base_url("http://nominatim.internal/");
		assert_eq!(client.base_url, "http://nominatim.internal");
	}

	#[tokio::test]
	async fn test_first_result_is_parsed() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/search"))
			.and(query_param("q", "Paris, France"))
			.and(query_param("format", "jsonv2"))
			.and(query_param("limit", "1"))
			.and(header("user-agent", "poster-worker-tests/1.0"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{
					"place_id": 88066702,
					"lat": "48.8588897",
					"lon": "2.3200410",
					"display_name": "Paris, Île-de-France, France métropolitaine, France"
				}
			])))
			.expect(1)
			.mount(&server)
			.await;

		let client = client_for(&server);
		let found = client
			.geocode(&GeocodeQuery::from_location("Paris, France"))
			.await
			.unwrap()
			.unwrap();

		assert!((found.latitude - 48.8588897).abs() < 1e-9);
		assert!((found.longitude - 2.3200410).abs() < 1e-9);
		assert!(found.display_name.starts_with("Paris"));
	}

	#[tokio::test]
	async fn test_empty_result_is_none() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/search"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let found = client
			.geocode(&GeocodeQuery::from_location("Atlantis"))
			.await
			.unwrap();
		assert!(found.is_none());
	}

	#[tokio::test]
	async fn test_429_is_rate_limited() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(429))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let result = client.geocode(&GeocodeQuery::from_location("Oslo")).await;
		assert!(matches!(result, Err(GeocodeError::RateLimited)));
	}

	#[tokio::test]
	async fn test_server_error_is_api_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let result = client.geocode(&GeocodeQuery::from_location("Oslo")).await;
		match result {
			Err(GeocodeError::ApiError { status, message }) => {
				assert_eq!(status, 503);
				assert_eq!(message, "maintenance");
			}
			other => panic!("expected ApiError, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_non_numeric_coordinate_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{ "lat": "north", "lon": "2.0", "display_name": "Nowhere" }
			])))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let result = client.geocode(&GeocodeQuery::from_location("Nowhere")).await;
		assert!(matches!(result, Err(GeocodeError::InvalidResponse(_))));
	}

	#[tokio::test]
	async fn test_html_body_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let result = client.geocode(&GeocodeQuery::from_location("Oslo")).await;
		assert!(matches!(result, Err(GeocodeError::InvalidResponse(_))));
	}

	#[tokio::test]
	async fn test_slow_server_is_timeout() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!([]))
					.set_delay(Duration::from_millis(500)),
			)
			.mount(&server)
			.await;

		let client = NominatimClient::with_timeout("ua", Duration::from_millis(50))
			.unwrap()
			.with_base_url(server.uri());
		let result = client.geocode(&GeocodeQuery::from_location("Oslo")).await;
		assert!(matches!(result, Err(GeocodeError::Timeout)));
	}
}
