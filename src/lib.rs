//! Notification and data-access backend for the flood-alert assistant.
//!
//! The conversational front-end, the text-generation service, and the
//! daily scheduler are external collaborators; this crate provides the
//! pieces with real state and consistency concerns:
//!
//! - [`config`] — environment-sourced settings and the credential store.
//! - [`ingest`] — the authenticated telemetry client and token lifecycle.
//! - [`store`] — durable users + station subscriptions (SQLite).
//! - [`alert`] — daily report formatting and the broadcast fan-out engine.
//! - [`briefing`] — factual context strings for the chat collaborator.
//! - [`stations`] — the canonical registry of monitored stations.

pub mod alert;
pub mod briefing;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod stations;
pub mod store;

pub use alert::broadcast::{BroadcastEngine, BroadcastSummary, MessageSender};
pub use config::{Credentials, Settings};
pub use ingest::telemetry::{TelemetryClient, TelemetryFetch};
pub use model::{FetchError, Forecast, Measurement, MeasurementKind, PersistenceError};
pub use store::{SubscriptionStore, User};
