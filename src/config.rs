/// Environment-sourced configuration and the process-wide credential store.
///
/// All endpoint URLs and static credentials come from the environment
/// (optionally via a `.env` file). Required variables fail loudly when
/// unset — there are no baked-in endpoints.
///
/// The access token is the one mutable piece of configuration: it is
/// replaced in place when the token lifecycle manager obtains a fresh one.
/// Replacement is last-write-wins; any valid token is interchangeable, so
/// concurrent refreshes are tolerated and none of this is persisted — the
/// token is re-derived from username/password at the next auth failure
/// after a restart.

use std::path::PathBuf;
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_LOGIN_URL: &str = "LOGIN_URL";
pub const ENV_MEASUREMENT_API_URL: &str = "MEASUREMENT_API_URL";
pub const ENV_FORECAST_API_URL: &str = "FORECAST_API_URL";
pub const ENV_IMAGE_API_URL: &str = "IMAGE_API_URL";
pub const ENV_API_USERNAME: &str = "API_USERNAME";
pub const ENV_API_PASSWORD: &str = "API_PASSWORD";
pub const ENV_REFRESH_TOKEN: &str = "REFRESH_TOKEN";
pub const ENV_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";

const DEFAULT_DATABASE_PATH: &str = "database.db";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    Missing(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "required environment variable {} is not set", var)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Immutable startup configuration for the whole service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub login_url: String,
    pub measurement_url: String,
    pub forecast_url: String,
    pub image_url: String,
    pub username: String,
    pub password: String,
    pub refresh_token: Option<String>,
    /// Initial access token. May be empty — the first authenticated request
    /// then goes straight through the refresh path.
    pub access_token: String,
    pub database_path: PathBuf,
}

impl Settings {
    /// Load settings from the process environment, reading a `.env` file
    /// first if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through an arbitrary variable lookup. `from_env` is a
    /// thin wrapper over this; tests inject a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &str| -> Result<String, ConfigError> {
            match lookup(var) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ConfigError::Missing(var.to_string())),
            }
        };

        Ok(Settings {
            login_url: required(ENV_LOGIN_URL)?,
            measurement_url: required(ENV_MEASUREMENT_API_URL)?,
            forecast_url: required(ENV_FORECAST_API_URL)?,
            image_url: required(ENV_IMAGE_API_URL)?,
            username: required(ENV_API_USERNAME)?,
            password: required(ENV_API_PASSWORD)?,
            refresh_token: lookup(ENV_REFRESH_TOKEN).filter(|v| !v.trim().is_empty()),
            access_token: lookup(ENV_ACCESS_TOKEN).unwrap_or_default(),
            database_path: lookup(ENV_DATABASE_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
        })
    }
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

/// Holds the login endpoint, static credentials, and the current access
/// token. Read-only after startup except for token replacement.
#[derive(Debug)]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub refresh_token: Option<String>,
    access_token: RwLock<String>,
}

impl Credentials {
    pub fn new(
        login_url: String,
        username: String,
        password: String,
        refresh_token: Option<String>,
        access_token: String,
    ) -> Self {
        Credentials {
            login_url,
            username,
            password,
            refresh_token,
            access_token: RwLock::new(access_token),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Credentials::new(
            settings.login_url.clone(),
            settings.username.clone(),
            settings.password.clone(),
            settings.refresh_token.clone(),
            settings.access_token.clone(),
        )
    }

    /// Current access token. No validation of token format.
    pub fn token(&self) -> String {
        self.access_token.read().unwrap().clone()
    }

    /// Replace the current access token. Last write wins.
    pub fn set_token(&self, new_token: String) {
        *self.access_token.write().unwrap() = new_token;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_LOGIN_URL, "https://api.example.test/auth/login"),
            (ENV_MEASUREMENT_API_URL, "https://api.example.test/measurement"),
            (ENV_FORECAST_API_URL, "https://api.example.test/predict"),
            (ENV_IMAGE_API_URL, "https://api.example.test/image"),
            (ENV_API_USERNAME, "floodalert"),
            (ENV_API_PASSWORD, "hunter2"),
            (ENV_REFRESH_TOKEN, "rt-abc"),
            (ENV_ACCESS_TOKEN, "at-initial"),
            (ENV_DATABASE_PATH, "/tmp/floodalert-test.db"),
        ])
    }

    fn lookup_in<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| map.get(var).map(|v| v.to_string())
    }

    #[test]
    fn test_full_environment_loads() {
        let env = full_env();
        let settings = Settings::from_lookup(lookup_in(&env)).expect("all variables set");
        assert_eq!(settings.username, "floodalert");
        assert_eq!(settings.refresh_token.as_deref(), Some("rt-abc"));
        assert_eq!(settings.database_path, PathBuf::from("/tmp/floodalert-test.db"));
    }

    #[test]
    fn test_missing_required_variable_fails() {
        let mut env = full_env();
        env.remove(ENV_API_PASSWORD);
        let err = Settings::from_lookup(lookup_in(&env)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_API_PASSWORD.to_string()));
    }

    #[test]
    fn test_empty_required_variable_fails() {
        let mut env = full_env();
        env.insert(ENV_LOGIN_URL, "   ");
        let err = Settings::from_lookup(lookup_in(&env)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_LOGIN_URL.to_string()));
    }

    #[test]
    fn test_optional_variables_have_defaults() {
        let mut env = full_env();
        env.remove(ENV_REFRESH_TOKEN);
        env.remove(ENV_ACCESS_TOKEN);
        env.remove(ENV_DATABASE_PATH);
        let settings = Settings::from_lookup(lookup_in(&env)).expect("optionals may be unset");
        assert_eq!(settings.refresh_token, None);
        assert_eq!(settings.access_token, "");
        assert_eq!(settings.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    }

    #[test]
    fn test_token_replacement_is_visible_to_readers() {
        let creds = Credentials::new(
            "https://api.example.test/auth/login".to_string(),
            "floodalert".to_string(),
            "hunter2".to_string(),
            None,
            "stale".to_string(),
        );
        assert_eq!(creds.token(), "stale");
        creds.set_token("fresh".to_string());
        assert_eq!(creds.token(), "fresh");
    }
}
