/// Remote data access for the flood-alert service.
///
/// Submodules:
/// - `auth` — bearer-token refresh against the login endpoint.
/// - `telemetry` — authenticated measurement/forecast/image client.

pub mod auth;
pub mod telemetry;
