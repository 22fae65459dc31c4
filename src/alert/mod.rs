/// Daily alerting for subscribed users.
///
/// Submodules:
/// - `report` — per-station report message formatting.
/// - `broadcast` — the fan-out engine that delivers reports to subscribers.

pub mod broadcast;
pub mod report;
