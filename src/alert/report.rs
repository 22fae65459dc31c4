/// Per-station daily report formatting.
///
/// A report carries the latest observed water level, rainfall, and water
/// flow for one station plus the nearest predicted level, and renders the
/// message text the broadcast engine hands to the external sender.

/// The facts embedded in one daily report message.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReport {
    /// Display name, not the wire slug.
    pub station_name: String,
    /// Latest observed water level, meters.
    pub water_level: f64,
    /// Latest observed rainfall, mm/day.
    pub rainfall: f64,
    /// Latest observed water flow, L/s.
    pub water_flow: f64,
    /// Nearest-day predicted water level, meters.
    pub predicted_level: f64,
}

impl StationReport {
    /// Render the daily broadcast message for this station.
    pub fn render(&self) -> String {
        format!(
            "🌊 Daily Flood Report for {name}\n\
             \n\
             Stay safe and updated on the current situation!\n\
             \n\
             Location: {name}\n\
             Water Level: {level} m\n\
             Rainfall: {rain} mm/day\n\
             Waterflow: {flow} L/s\n\
             \n\
             Forecast\n\
             Predicted Water Level: {predicted} m\n\
             \n\
             Stay alert and take precautions if needed! 🚨",
            name = self.station_name,
            level = self.water_level,
            rain = self.rainfall,
            flow = self.water_flow,
            predicted = self.predicted_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> StationReport {
        StationReport {
            station_name: "Phnom Penh (Bassac)".to_string(),
            water_level: 10.0,
            rainfall: 10.0,
            water_flow: 10.0,
            predicted_level: 12.0,
        }
    }

    #[test]
    fn test_render_embeds_station_and_all_four_values() {
        let text = sample_report().render();
        assert!(text.contains("Phnom Penh (Bassac)"), "missing station name:\n{}", text);
        assert!(text.contains("Water Level: 10 m"), "missing water level:\n{}", text);
        assert!(text.contains("Rainfall: 10 mm/day"), "missing rainfall:\n{}", text);
        assert!(text.contains("Waterflow: 10 L/s"), "missing water flow:\n{}", text);
        assert!(text.contains("Predicted Water Level: 12 m"), "missing forecast:\n{}", text);
    }

    #[test]
    fn test_render_keeps_fractional_values() {
        let mut report = sample_report();
        report.water_level = 9.85;
        let text = report.render();
        assert!(text.contains("Water Level: 9.85 m"), "fractional level lost:\n{}", text);
    }
}
