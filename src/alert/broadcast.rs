/// Daily broadcast fan-out.
///
/// Walks the subscription snapshot, builds one report per (user, station)
/// pair, and dispatches it through the external message sender. The one
/// resilience property of this engine: a fetch or dispatch failure for one
/// pair is caught, logged, and never aborts the remaining pairs. Only a
/// failure to read the snapshot itself propagates.
///
/// The scheduling trigger is external — something invokes
/// `run_daily_broadcast` once a day; nothing here knows about time.

use crate::alert::report::StationReport;
use crate::ingest::telemetry::TelemetryFetch;
use crate::logging::{self, DataSource};
use crate::model::{FetchError, MeasurementKind, PersistenceError};
use crate::stations;
use crate::store::SubscriptionStore;
use std::collections::HashMap;
use std::error::Error;

/// Time range requested for the "latest" measurements in a daily report.
const DEFAULT_TIME_RANGE: &str = "15d";

/// Forecast horizon requested for daily reports, in days.
const DEFAULT_FORECAST_DAYS: u32 = 5;

// ---------------------------------------------------------------------------
// Sender seam
// ---------------------------------------------------------------------------

/// The messaging platform the reports go out through. Fire-and-forget from
/// this engine's point of view: send failures are logged and swallowed at
/// the per-pair granularity.
pub trait MessageSender {
    fn send_message(&self, chat_id: i64, text: &str) -> Result<(), Box<dyn Error>>;
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Outcome counts for one broadcast run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    /// (user, station) pairs visited.
    pub attempted: usize,
    /// Messages handed to the sender successfully.
    pub delivered: usize,
    /// Pairs that failed at fetch or dispatch.
    pub failed: usize,
}

pub struct BroadcastEngine<'a> {
    fetcher: &'a dyn TelemetryFetch,
    store: &'a SubscriptionStore,
    sender: &'a dyn MessageSender,
    time_range: String,
    forecast_days: u32,
}

impl<'a> BroadcastEngine<'a> {
    pub fn new(
        fetcher: &'a dyn TelemetryFetch,
        store: &'a SubscriptionStore,
        sender: &'a dyn MessageSender,
    ) -> Self {
        BroadcastEngine {
            fetcher,
            store,
            sender,
            time_range: DEFAULT_TIME_RANGE.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }

    /// Override the measurement range and forecast horizon for this engine.
    pub fn with_query(mut self, time_range: &str, forecast_days: u32) -> Self {
        self.time_range = time_range.to_string();
        self.forecast_days = forecast_days;
        self
    }

    /// Send today's report to every subscribed (user, station) pair.
    ///
    /// Pairs are visited in snapshot order (user ids ascending, stations in
    /// name order), so a run is deterministic. Station data fetched for one
    /// user is reused for every other user subscribed to the same station
    /// within the run; failures are never cached, so a later pair retries.
    pub fn run_daily_broadcast(&self) -> Result<BroadcastSummary, PersistenceError> {
        let subscribers = self.store.list_all_subscriptions()?;
        let mut cache: HashMap<String, StationReport> = HashMap::new();
        let mut summary = BroadcastSummary::default();

        for (user_id, subscriber) in &subscribers {
            for station in &subscriber.stations {
                summary.attempted += 1;

                let report = match self.station_report(station, &mut cache) {
                    Ok(report) => report,
                    Err(err) => {
                        logging::log_fetch_failure(
                            DataSource::Telemetry,
                            Some(station),
                            "daily report fetch",
                            &err,
                        );
                        summary.failed += 1;
                        continue;
                    }
                };

                match self.sender.send_message(subscriber.chat_id, &report.render()) {
                    Ok(()) => summary.delivered += 1,
                    Err(err) => {
                        logging::error(
                            DataSource::Broadcast,
                            Some(station),
                            &format!("dispatch to user {} failed: {}", user_id, err),
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        logging::log_broadcast_summary(summary.attempted, summary.delivered, summary.failed);
        Ok(summary)
    }

    fn station_report(
        &self,
        station: &str,
        cache: &mut HashMap<String, StationReport>,
    ) -> Result<StationReport, FetchError> {
        if let Some(report) = cache.get(station) {
            return Ok(report.clone());
        }
        let report = self.build_station_report(station)?;
        cache.insert(station.to_string(), report.clone());
        Ok(report)
    }

    fn build_station_report(&self, station: &str) -> Result<StationReport, FetchError> {
        let water_level = self.latest_value(station, MeasurementKind::WaterLevel)?;
        let rainfall = self.latest_value(station, MeasurementKind::Rainfall)?;
        let water_flow = self.latest_value(station, MeasurementKind::WaterFlow)?;

        let forecast = self.fetcher.fetch_forecast(self.forecast_days)?;
        let predicted_level = forecast
            .nearest()
            .map(|p| p.predicted_value)
            .ok_or_else(|| FetchError::NoData("forecast predictions".to_string()))?;

        Ok(StationReport {
            station_name: stations::display_name(station).to_string(),
            water_level,
            rainfall,
            water_flow,
            predicted_level,
        })
    }

    fn latest_value(&self, station: &str, kind: MeasurementKind) -> Result<f64, FetchError> {
        let measurement = self.fetcher.fetch_measurement(station, &self.time_range, kind)?;
        measurement
            .latest()
            .map(|p| p.value)
            .ok_or_else(|| FetchError::NoData(format!("{} {}", station, kind)))
    }
}
