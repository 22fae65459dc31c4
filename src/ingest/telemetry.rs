/// Authenticated telemetry client.
///
/// Wraps the remote measurement, forecast, and image endpoints behind one
/// uniform request protocol:
///
/// 1. Issue the request with the current bearer token.
/// 2. 200 → parse and return.
/// 3. 401/403 → refresh the token once, store it, retry the request exactly
///    once; if the retry fails too (or the refresh did), the whole fetch
///    fails with `FetchError::Authentication`.
/// 4. Any other status → `FetchError::RemoteService` with status and body.
/// 5. Network-level failures → `FetchError::Transport`, no retry.
///
/// 401 and 403 are deliberately one authorization-failure class, and every
/// endpoint goes through the same helper so the protocol cannot drift
/// between them.

use crate::config::{Credentials, Settings};
use crate::ingest::auth;
use crate::logging::{self, DataSource};
use crate::model::{FetchError, Forecast, ForecastPoint, Measurement, MeasurementKind, SeriesPoint};
use crate::stations::{self, Station};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout. Bounds worst-case broadcast duration: a wedged
/// endpoint costs at most this much per (user, station) pair.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MeasurementResponse {
    data: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    predictions: Vec<ForecastPoint>,
}

// ---------------------------------------------------------------------------
// Fetch abstraction
// ---------------------------------------------------------------------------

/// Read access to the telemetry API. The broadcast engine and briefing
/// builder depend on this seam rather than the concrete client, so tests
/// can substitute scripted doubles.
pub trait TelemetryFetch {
    fn fetch_measurement(
        &self,
        station: &str,
        time_range: &str,
        kind: MeasurementKind,
    ) -> Result<Measurement, FetchError>;

    fn fetch_forecast(&self, forward_days: u32) -> Result<Forecast, FetchError>;

    fn fetch_station_list(&self) -> Result<Vec<Station>, FetchError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TelemetryClient {
    http: Client,
    credentials: Credentials,
    measurement_url: String,
    forecast_url: String,
    image_url: String,
}

impl TelemetryClient {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        Self::with_credentials(
            Credentials::from_settings(settings),
            settings.measurement_url.clone(),
            settings.forecast_url.clone(),
            settings.image_url.clone(),
        )
    }

    /// Build a client over explicit credentials and endpoints.
    pub fn with_credentials(
        credentials: Credentials,
        measurement_url: String,
        forecast_url: String,
        image_url: String,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(TelemetryClient {
            http,
            credentials,
            measurement_url,
            forecast_url,
            image_url,
        })
    }

    /// Fetch the latest image payload for a station. Same protocol as the
    /// measurement fetches; the body is passed through undecoded.
    pub fn fetch_image(
        &self,
        station: &str,
        time_range: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let query = vec![
            ("station", station.to_string()),
            ("range", time_range.to_string()),
        ];
        let body = self.get_with_auth_retry(&self.image_url, &query)?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    // -- protocol -----------------------------------------------------------

    fn authorized_get(
        &self,
        url: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        self.http
            .get(url)
            .header("Accept", "application/json")
            .bearer_auth(token)
            .query(query)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    /// The authenticate-retry-once protocol shared by every endpoint.
    /// Returns the raw 200 body; callers own deserialization.
    fn get_with_auth_retry(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let response = self.authorized_get(url, query, &self.credentials.token())?;
        let status = response.status();

        if status == StatusCode::OK {
            return response.text().map_err(|e| FetchError::Transport(e.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let new_token = auth::refresh_access_token(&self.http, &self.credentials)
                .ok_or_else(|| FetchError::Authentication("token refresh failed".to_string()))?;
            self.credentials.set_token(new_token.clone());
            logging::info(DataSource::Auth, None, "access token refreshed");

            let retry = self.authorized_get(url, query, &new_token)?;
            let retry_status = retry.status();
            if retry_status == StatusCode::OK {
                return retry.text().map_err(|e| FetchError::Transport(e.to_string()));
            }
            let body = retry.text().unwrap_or_default();
            return Err(FetchError::Authentication(format!(
                "request still failing after token refresh: HTTP {} - {}",
                retry_status.as_u16(),
                body
            )));
        }

        let body = response.text().unwrap_or_default();
        Err(FetchError::RemoteService {
            status: status.as_u16(),
            body,
        })
    }
}

impl TelemetryFetch for TelemetryClient {
    /// Fetch a measurement series for one station.
    ///
    /// `time_range` is an opaque duration token (e.g. "15d") forwarded to
    /// the API verbatim; no parsing or clamping happens here.
    fn fetch_measurement(
        &self,
        station: &str,
        time_range: &str,
        kind: MeasurementKind,
    ) -> Result<Measurement, FetchError> {
        let query = vec![
            ("station", station.to_string()),
            ("range", time_range.to_string()),
            ("measurement", kind.as_str().to_string()),
        ];
        let body = self.get_with_auth_retry(&self.measurement_url, &query)?;
        let parsed: MeasurementResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(Measurement {
            station: station.to_string(),
            kind,
            time_range: time_range.to_string(),
            series: parsed.data,
        })
    }

    /// Fetch water-level predictions `forward_days` days ahead.
    ///
    /// The horizon must be at least one day; zero is a caller error and is
    /// rejected before any request goes out.
    fn fetch_forecast(&self, forward_days: u32) -> Result<Forecast, FetchError> {
        if forward_days == 0 {
            return Err(FetchError::Validation(
                "forecast horizon must be at least 1 day".to_string(),
            ));
        }

        let query = vec![("forward", forward_days.to_string())];
        let body = self.get_with_auth_retry(&self.forecast_url, &query)?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(Forecast {
            forward_days,
            predicted: parsed.predictions,
        })
    }

    /// List the stations this service covers.
    ///
    /// The remote metadata endpoint is not deployed; the static registry is
    /// the source of truth and always holds at least one station.
    fn fetch_station_list(&self) -> Result<Vec<Station>, FetchError> {
        Ok(stations::STATION_REGISTRY.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
//
// The retry protocol itself is exercised end-to-end in tests/auth_retry.rs
// against a local HTTP stub; here we only cover what needs no socket.

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> TelemetryClient {
        let credentials = Credentials::new(
            "http://127.0.0.1:9/login".to_string(),
            "user".to_string(),
            "pass".to_string(),
            None,
            "token".to_string(),
        );
        TelemetryClient::with_credentials(
            credentials,
            "http://127.0.0.1:9/measurement".to_string(),
            "http://127.0.0.1:9/predict".to_string(),
            "http://127.0.0.1:9/image".to_string(),
        )
        .expect("client should build")
    }

    #[test]
    fn test_zero_forecast_horizon_is_rejected_without_a_request() {
        // Port 9 (discard) is not listening; reaching the network would
        // surface as Transport, so a Validation error proves we bailed first.
        let client = offline_client();
        let err = client.fetch_forecast(0).unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)), "got {:?}", err);
    }

    #[test]
    fn test_station_list_serves_the_registry() {
        let client = offline_client();
        let listed = client.fetch_station_list().expect("static list never fails");
        assert!(!listed.is_empty());
        assert!(listed.iter().any(|s| s.slug == "bassac"));
    }
}
