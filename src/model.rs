/// Core data types for the flood-alert notification backend.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond trivial accessors, no I/O, and no external
/// dependencies — only types.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Measurement kinds
// ---------------------------------------------------------------------------

/// The three quantities the telemetry API reports per station.
///
/// The wire names are the `measurement` query-parameter values the remote
/// endpoint expects; they are stable and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    WaterLevel,
    Rainfall,
    WaterFlow,
}

impl MeasurementKind {
    /// Wire name used in the `measurement` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::WaterLevel => "water_level",
            MeasurementKind::Rainfall => "rainfall",
            MeasurementKind::WaterFlow => "water_flow",
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// One time-tagged sample in a measurement series.
///
/// Timestamps are opaque strings forwarded verbatim from the API; this
/// service never parses them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: f64,
}

/// A fetched time series for one (station, kind, range) triple.
///
/// Immutable once fetched; nothing is cached across requests — each fetch
/// re-queries the remote endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub station: String,
    pub kind: MeasurementKind,
    pub time_range: String,
    pub series: Vec<SeriesPoint>,
}

impl Measurement {
    /// The most recent sample, if the series is non-empty.
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.series.last()
    }
}

/// One predicted value, `day_offset` days ahead of the request time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "day")]
    pub day_offset: u32,
    #[serde(rename = "value")]
    pub predicted_value: f64,
}

/// Water-level predictions for the next `forward_days` days.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub forward_days: u32,
    pub predicted: Vec<ForecastPoint>,
}

impl Forecast {
    /// The nearest prediction (smallest day offset), if any.
    pub fn nearest(&self) -> Option<&ForecastPoint> {
        self.predicted.first()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching data from the telemetry API.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// Caller supplied an out-of-domain argument (e.g. a zero forecast
    /// horizon). Surfaced immediately, never retried.
    Validation(String),
    /// Token refresh failed, or the single retried request still failed.
    Authentication(String),
    /// Non-auth HTTP failure from a collaborator endpoint.
    RemoteService { status: u16, body: String },
    /// Network-level failure (timeout, connection refused). Not retried.
    Transport(String),
    /// A 200 response whose body could not be deserialized.
    Parse(String),
    /// The response contained no usable data points.
    NoData(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Validation(msg) => write!(f, "Validation error: {}", msg),
            FetchError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            FetchError::RemoteService { status, body } => {
                write!(f, "Remote service error: HTTP {} - {}", status, body)
            }
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::NoData(what) => write!(f, "No data available: {}", what),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors from the subscription store. Fatal for the specific store call;
/// always propagated to the caller, never swallowed.
#[derive(Debug)]
pub enum PersistenceError {
    /// The database file could not be opened.
    Connection(String),
    /// A statement failed to execute.
    Query(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Connection(msg) => write!(f, "Store connection error: {}", msg),
            PersistenceError::Query(msg) => write!(f, "Store query error: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
