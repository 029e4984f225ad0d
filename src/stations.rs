/// Station registry for the Antisana sensor health service.
///
/// Defines the canonical list of monitoring stations whose columns may appear
/// in an uploaded readings sheet. Stations are fixed at deploy time; a column
/// in the sheet that is not listed here is ignored, and a station listed here
/// that has no column in the sheet is reported as a warning.
/// All other modules should reference station ids from here rather than
/// hardcoding them.

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitoring station.
pub struct Station {
    /// Short code used as the column header in the readings sheet.
    pub station_id: &'static str,
    /// Human-readable station name.
    pub name: &'static str,
    /// Measured variable.
    pub variable: &'static str,
    /// Unit of the readings.
    pub unit: &'static str,
}

/// All stations analyzed by default, in report order.
pub static STATION_REGISTRY: &[Station] = &[
    Station {
        station_id: "P42",
        name: "Pluviometer P42",
        variable: "precipitation",
        unit: "mm",
    },
    Station {
        station_id: "P43",
        name: "Pluviometer P43",
        variable: "precipitation",
        unit: "mm",
    },
    Station {
        station_id: "P55",
        name: "Pluviometer P55",
        variable: "precipitation",
        unit: "mm",
    },
];

/// Returns the ids of all registered stations, in registry order.
pub fn all_station_ids() -> Vec<&'static str> {
    STATION_REGISTRY.iter().map(|s| s.station_id).collect()
}

/// Looks up a station by id. Returns `None` if not registered.
pub fn find_station(station_id: &str) -> Option<&'static Station> {
    STATION_REGISTRY.iter().find(|s| s.station_id == station_id)
}

/// Checks whether a station id is registered.
pub fn is_known_station(station_id: &str) -> bool {
    find_station(station_id).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_ids_are_short_uppercase_codes() {
        // Ids double as sheet column headers, so they must survive the
        // header trim in the normalizer unchanged.
        for station in STATION_REGISTRY {
            assert!(
                !station.station_id.is_empty() && station.station_id.len() <= 8,
                "station id '{}' should be a short code",
                station.station_id
            );
            assert_eq!(
                station.station_id.trim(),
                station.station_id,
                "station id '{}' must not carry whitespace",
                station.station_id
            );
            assert!(
                station.station_id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "station id '{}' should be uppercase alphanumeric",
                station.station_id
            );
        }
    }

    #[test]
    fn test_no_duplicate_station_ids() {
        let mut seen = std::collections::HashSet::new();
        for station in STATION_REGISTRY {
            assert!(
                seen.insert(station.station_id),
                "duplicate station id '{}' found in STATION_REGISTRY",
                station.station_id
            );
        }
    }

    #[test]
    fn test_registry_contains_the_three_network_stations() {
        assert_eq!(all_station_ids(), vec!["P42", "P43", "P55"]);
    }

    #[test]
    fn test_find_station_returns_correct_entry() {
        let station = find_station("P43").expect("P43 should be in registry");
        assert_eq!(station.station_id, "P43");
        assert_eq!(station.unit, "mm");
    }

    #[test]
    fn test_find_station_returns_none_for_unknown_id() {
        assert!(find_station("P99").is_none());
        assert!(!is_known_station("p42"), "lookup is case sensitive");
    }
}
