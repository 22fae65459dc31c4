/// Token lifecycle management.
///
/// The telemetry API hands out short-lived bearer tokens. When a request
/// comes back 401/403, the client asks this module for a fresh token and
/// retries once. Refresh itself never retries: one credential-grant request
/// per invocation, and a `None` result means "refresh failed, abandon this
/// request attempt". Callers must not loop on refresh.

use crate::config::Credentials;
use crate::logging::{self, DataSource};
use serde::Deserialize;

/// Successful login response body. Extra fields (token type, expiry) are
/// ignored — only the token itself matters here.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Request a new access token with the stored credentials.
///
/// Sends a form-encoded password-grant request to the login endpoint,
/// including the configured refresh token when one exists. Returns the new
/// access token on HTTP 200, or `None` on any failure (logged, not raised).
pub fn refresh_access_token(
    client: &reqwest::blocking::Client,
    credentials: &Credentials,
) -> Option<String> {
    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "password"),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
    ];
    if let Some(ref refresh_token) = credentials.refresh_token {
        form.push(("refresh_token", refresh_token.as_str()));
    }

    let response = match client
        .post(&credentials.login_url)
        .header("Accept", "application/json")
        .form(&form)
        .send()
    {
        Ok(resp) => resp,
        Err(e) => {
            logging::error(DataSource::Auth, None, &format!("token refresh request failed: {}", e));
            return None;
        }
    };

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().unwrap_or_default();
        logging::error(
            DataSource::Auth,
            None,
            &format!("token refresh rejected: HTTP {} - {}", status.as_u16(), body),
        );
        return None;
    }

    match response.json::<TokenResponse>() {
        Ok(token) => Some(token.access_token),
        Err(e) => {
            logging::error(
                DataSource::Auth,
                None,
                &format!("token refresh response unreadable: {}", e),
            );
            None
        }
    }
}
