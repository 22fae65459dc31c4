/// Factual context for the conversational front-end.
///
/// The chat collaborator (an external text-generation service) answers user
/// questions grounded on a small set of current facts. This module collects
/// those facts and renders them as plain text; it never consumes the
/// collaborator's output.
///
/// Unlike the broadcast path, a briefing degrades per field: a failed or
/// empty fetch turns into that field's "unavailable" fallback text instead
/// of an error, so the front-end always gets a usable context block.

use crate::ingest::telemetry::TelemetryFetch;
use crate::logging::{self, DataSource};
use crate::model::MeasurementKind;
use crate::stations;

const FORECAST_UNAVAILABLE: &str = "Forecast data is unavailable at the moment.";
const WATER_LEVEL_UNAVAILABLE: &str = "Water Level is unavailable at the moment.";
const RAINFALL_UNAVAILABLE: &str = "Rainfall data is unavailable at the moment.";
const WATER_FLOW_UNAVAILABLE: &str = "Water Flow is unavailable at the moment.";

/// Current facts for one station, each already rendered as display text.
#[derive(Debug, Clone, PartialEq)]
pub struct SituationBriefing {
    pub station: String,
    pub water_level_info: String,
    pub rainfall_info: String,
    pub water_flow_info: String,
    pub forecast_info: String,
}

impl SituationBriefing {
    /// Collect the four facts for `station`, falling back field by field.
    pub fn build(
        fetcher: &dyn TelemetryFetch,
        station: &str,
        time_range: &str,
        forecast_days: u32,
    ) -> Self {
        let water_level_info = latest_text(fetcher, station, time_range, MeasurementKind::WaterLevel, "m")
            .unwrap_or_else(|| WATER_LEVEL_UNAVAILABLE.to_string());
        let rainfall_info = latest_text(fetcher, station, time_range, MeasurementKind::Rainfall, "mm/day")
            .unwrap_or_else(|| RAINFALL_UNAVAILABLE.to_string());
        let water_flow_info = latest_text(fetcher, station, time_range, MeasurementKind::WaterFlow, "L/s")
            .unwrap_or_else(|| WATER_FLOW_UNAVAILABLE.to_string());

        let forecast_info = match fetcher.fetch_forecast(forecast_days) {
            Ok(forecast) => match forecast.nearest() {
                Some(point) => format!(
                    "{} m predicted within {} day(s)",
                    point.predicted_value, forecast.forward_days
                ),
                None => FORECAST_UNAVAILABLE.to_string(),
            },
            Err(err) => {
                logging::log_fetch_failure(DataSource::Forecast, Some(station), "briefing forecast", &err);
                FORECAST_UNAVAILABLE.to_string()
            }
        };

        SituationBriefing {
            station: station.to_string(),
            water_level_info,
            rainfall_info,
            water_flow_info,
            forecast_info,
        }
    }

    /// Render the context block handed to the text-generation collaborator.
    pub fn to_context_string(&self) -> String {
        format!(
            "Latest hydromet readings for {name}:\n\
             Water Level: {level}\n\
             Rainfall: {rain}\n\
             Water Flow: {flow}\n\
             Forecast: {forecast}",
            name = stations::display_name(&self.station),
            level = self.water_level_info,
            rain = self.rainfall_info,
            flow = self.water_flow_info,
            forecast = self.forecast_info,
        )
    }
}

fn latest_text(
    fetcher: &dyn TelemetryFetch,
    station: &str,
    time_range: &str,
    kind: MeasurementKind,
    unit: &str,
) -> Option<String> {
    match fetcher.fetch_measurement(station, time_range, kind) {
        Ok(measurement) => measurement.latest().map(|p| format!("{} {}", p.value, unit)),
        Err(err) => {
            logging::log_fetch_failure(DataSource::Telemetry, Some(station), "briefing fetch", &err);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FetchError, Forecast, ForecastPoint, Measurement, SeriesPoint};
    use crate::stations::Station;

    /// Fetcher double: rainfall fetches fail, everything else succeeds.
    struct PartialOutage;

    impl TelemetryFetch for PartialOutage {
        fn fetch_measurement(
            &self,
            station: &str,
            time_range: &str,
            kind: MeasurementKind,
        ) -> Result<Measurement, FetchError> {
            if kind == MeasurementKind::Rainfall {
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            Ok(Measurement {
                station: station.to_string(),
                kind,
                time_range: time_range.to_string(),
                series: vec![SeriesPoint { time: "2024-08-02T07:00:00Z".to_string(), value: 9.5 }],
            })
        }

        fn fetch_forecast(&self, forward_days: u32) -> Result<Forecast, FetchError> {
            Ok(Forecast {
                forward_days,
                predicted: vec![ForecastPoint { day_offset: 1, predicted_value: 11.2 }],
            })
        }

        fn fetch_station_list(&self) -> Result<Vec<Station>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_fallback_appears_only_for_failed_fields() {
        let briefing = SituationBriefing::build(&PartialOutage, "bassac", "15d", 5);
        assert_eq!(briefing.water_level_info, "9.5 m");
        assert_eq!(briefing.rainfall_info, RAINFALL_UNAVAILABLE);
        assert_eq!(briefing.water_flow_info, "9.5 L/s");
        assert_eq!(briefing.forecast_info, "11.2 m predicted within 5 day(s)");
    }

    #[test]
    fn test_context_string_uses_display_name_and_all_fields() {
        let briefing = SituationBriefing::build(&PartialOutage, "bassac", "15d", 5);
        let context = briefing.to_context_string();
        assert!(context.contains("Phnom Penh (Bassac)"), "context:\n{}", context);
        assert!(context.contains("Water Level: 9.5 m"), "context:\n{}", context);
        assert!(context.contains(RAINFALL_UNAVAILABLE), "context:\n{}", context);
        assert!(context.contains("Forecast: 11.2 m predicted"), "context:\n{}", context);
    }
}
