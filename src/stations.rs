/// Station registry for the flood-alert service.
///
/// Defines the canonical closed set of hydromet stations served by the
/// telemetry API, along with their metadata. The slug is the single source
/// of truth for wire parameters and subscription keys — all other modules
/// should reference stations from here rather than hardcoding names.
///
/// The remote metadata endpoint is not deployed for this system, so this
/// registry also backs `TelemetryClient::fetch_station_list`.

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitored hydromet station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Stable lowercase identifier used in API query parameters and as the
    /// subscription key.
    pub slug: &'static str,
    /// Human-readable station name shown in reports and menus.
    pub name: &'static str,
    /// The river the gauge sits on.
    pub river: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
}

/// All stations served by the telemetry API, main stem first.
pub static STATION_REGISTRY: &[Station] = &[
    Station {
        slug: "bassac",
        name: "Phnom Penh (Bassac)",
        river: "Bassac River",
        latitude: 11.5564,
        longitude: 104.9282,
    },
    Station {
        slug: "siem_reap",
        name: "Siem Reap",
        river: "Siem Reap River",
        latitude: 13.3633,
        longitude: 103.8564,
    },
    Station {
        slug: "battambang",
        name: "Battambang",
        river: "Sangker River",
        latitude: 13.0957,
        longitude: 103.2022,
    },
];

/// Returns the slugs for all monitored stations.
pub fn all_slugs() -> Vec<&'static str> {
    STATION_REGISTRY.iter().map(|s| s.slug).collect()
}

/// Looks up a station by slug. Returns `None` if not found.
pub fn find_station(slug: &str) -> Option<&'static Station> {
    STATION_REGISTRY.iter().find(|s| s.slug == slug)
}

/// Display name for a slug, falling back to the slug itself for stations
/// that are not (or no longer) in the registry.
pub fn display_name(slug: &str) -> &str {
    find_station(slug).map(|s| s.name).unwrap_or(slug)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_not_empty() {
        // fetch_station_list serves this registry and must return >= 1
        // station to satisfy its interface contract.
        assert!(!STATION_REGISTRY.is_empty());
    }

    #[test]
    fn test_slugs_are_valid_wire_identifiers() {
        // Slugs travel as query-parameter values and as subscription keys;
        // anything outside lowercase ascii + underscore would need escaping
        // somewhere and silently break lookups.
        for station in STATION_REGISTRY {
            assert!(
                station.slug.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "slug for '{}' should be lowercase ascii/underscore, got '{}'",
                station.name,
                station.slug
            );
        }
    }

    #[test]
    fn test_no_duplicate_slugs() {
        let mut seen = std::collections::HashSet::new();
        for station in STATION_REGISTRY {
            assert!(
                seen.insert(station.slug),
                "duplicate slug '{}' found in STATION_REGISTRY",
                station.slug
            );
        }
    }

    #[test]
    fn test_registry_contains_expected_stations() {
        let slugs = all_slugs();
        for expected in ["bassac", "siem_reap", "battambang"] {
            assert!(slugs.contains(&expected), "STATION_REGISTRY missing '{}'", expected);
        }
    }

    #[test]
    fn test_find_station_returns_correct_entry() {
        let station = find_station("bassac").expect("bassac should be in registry");
        assert_eq!(station.name, "Phnom Penh (Bassac)");
        assert_eq!(station.river, "Bassac River");
    }

    #[test]
    fn test_find_station_returns_none_for_unknown_slug() {
        assert!(find_station("mekong_upper").is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_slug() {
        assert_eq!(display_name("bassac"), "Phnom Penh (Bassac)");
        assert_eq!(display_name("retired_station"), "retired_station");
    }
}
