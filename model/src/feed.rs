use anyhow::Result;
use serde::Deserialize;

use crate::VehicleID;

/// One vehicle position fix, as the feed server reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct VehicleRecord {
    pub id: VehicleID,
    pub lat: f64,
    pub lon: f64,
    /// Epoch milliseconds when the server last heard from this vehicle
    #[serde(rename = "lastUpdate")]
    pub last_update: i64,
}

/// Each feed message is a JSON array of records. A malformed message only poisons itself;
/// the connection carries on.
pub fn parse_batch(raw: &str) -> Result<Vec<VehicleRecord>> {
    let records = serde_json::from_str(raw)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_server_batch() {
        let raw = r#"[
            {"id": "1_4205", "lat": 47.611, "lon": -122.337, "lastUpdate": 1339648154000},
            {"id": "1_4207", "lat": 47.598, "lon": -122.328, "lastUpdate": 1339648158000}
        ]"#;
        let records = parse_batch(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, VehicleID("1_4205".to_string()));
        assert_eq!(records[0].lat, 47.611);
        assert_eq!(records[0].lon, -122.337);
        assert_eq!(records[0].last_update, 1339648154000);
    }

    #[test]
    fn empty_batch_is_fine() {
        assert!(parse_batch("[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_batch("not json").is_err());
        assert!(parse_batch(r#"{"id": "lonely object, not an array"}"#).is_err());
        assert!(parse_batch(r#"[{"id": "1", "lat": "not a number"}]"#).is_err());
    }
}
