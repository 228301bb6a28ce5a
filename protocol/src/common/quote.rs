//! Quote entity as stored by the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::{lenient, FilamentColor, FilamentType, NozzleSize, PrinterType, SupportType};

// ============================================================================
// Quote sections
// ============================================================================

/// Machine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterData {
    pub name: String,
    pub watts: f64,
    #[serde(rename = "type", default, deserialize_with = "lenient::deserialize")]
    pub kind: Option<PrinterType>,
    pub speed: f64,
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub nozzle: Option<NozzleSize>,
    pub layer: f64,
    pub bed_temperature: f64,
    pub hotend_temperature: f64,
    pub hourly_cost: f64,
}

/// Material parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilamentData {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::deserialize")]
    pub kind: Option<FilamentType>,
    pub diameter: f64,
    pub price_per_kg: f64,
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub color: Option<FilamentColor>,
    pub total_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyData {
    pub kwh_cost: f64,
}

/// Geometry of the printed part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    pub model_weight: f64,
    pub print_time: f64,
    pub infill: f64,
    pub supports: bool,
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub support_type: Option<SupportType>,
    pub support_weight: f64,
    pub layer_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommercialData {
    pub labor: f64,
    pub post_processing: f64,
    pub margin: f64,
    pub taxes: f64,
}

/// Server-computed estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub grams_used: f64,
    #[serde(default)]
    pub grams_wasted: f64,
    #[serde(default)]
    pub waste_percentage: f64,
    #[serde(default)]
    pub estimated_total_cost: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// ============================================================================
// Quote
// ============================================================================

/// Persisted quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub quote_name: String,
    pub printer: PrinterData,
    pub filament: FilamentData,
    pub energy: EnergyData,
    pub model: ModelData,
    pub commercial: CommercialData,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Backend timestamps come either as RFC 3339 or as naive ISO 8601 in UTC
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| parse(&value).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const BACKEND_QUOTE: &str = r#"{
        "_id": "665f1c2e9b1e8a0012345678",
        "user_id": "u-1",
        "quote_name": "Bracket",
        "printer": {
            "name": "Ender 3", "watts": 120, "type": "FDM", "speed": 60,
            "nozzle": "0.4", "layer": 0.2, "bed_temperature": 60,
            "hotend_temperature": 210, "hourly_cost": 2
        },
        "filament": {
            "name": "Basic PLA", "type": "PLA", "diameter": 1.75,
            "price_per_kg": 25, "color": "Negro", "total_weight": 1000
        },
        "energy": { "kwh_cost": 0.15 },
        "model": {
            "model_weight": 42, "print_time": 3.5, "infill": 20, "supports": false,
            "support_type": null, "support_weight": 0, "layer_height": 0.2
        },
        "commercial": { "labor": 5, "post_processing": 2, "margin": 0.3, "taxes": 0.12 },
        "summary": {
            "grams_used": 44.1, "grams_wasted": 2.1, "waste_percentage": 4.76,
            "estimated_total_cost": 12.8, "suggestions": ["Reduce infill"]
        },
        "created_at": "2024-06-04T13:45:18.123000",
        "updated_at": "2024-06-04T14:00:00Z"
    }"#;

    #[test]
    fn test_deserialize_backend_quote() {
        let quote: Quote = serde_json::from_str(BACKEND_QUOTE).unwrap();
        assert_eq!(quote.id, "665f1c2e9b1e8a0012345678");
        assert_eq!(quote.printer.kind, Some(PrinterType::Fdm));
        assert_eq!(quote.printer.nozzle, Some(NozzleSize::Mm04));
        assert_eq!(quote.filament.color, Some(FilamentColor::Black));
        assert_eq!(quote.model.support_type, None);
        assert_eq!(quote.summary.suggestions, vec!["Reduce infill".to_string()]);

        let created = quote.created_at.unwrap();
        assert_eq!(created.year(), 2024);
        assert_eq!(created.hour(), 13);
        assert!(quote.updated_at.is_some());
    }

    #[test]
    fn test_missing_summary_and_timestamps_default() {
        let mut value: serde_json::Value = serde_json::from_str(BACKEND_QUOTE).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("summary");
        object.remove("created_at");
        object.remove("updated_at");
        let id = object.remove("_id").unwrap();
        object.insert("id".to_string(), id);

        let quote: Quote = serde_json::from_value(value).unwrap();
        assert_eq!(quote.summary, Summary::default());
        assert!(quote.created_at.is_none());
        assert_eq!(quote.id, "665f1c2e9b1e8a0012345678");
    }

    #[test]
    fn test_unknown_option_values_do_not_fail_the_quote() {
        let mut value: serde_json::Value = serde_json::from_str(BACKEND_QUOTE).unwrap();
        value["printer"]["nozzle"] = serde_json::json!("0.3");
        value["filament"]["color"] = serde_json::json!("Fucsia");

        let quote: Quote = serde_json::from_value(value).unwrap();
        assert_eq!(quote.printer.nozzle, None);
        assert_eq!(quote.filament.color, None);
        assert_eq!(quote.printer.kind, Some(PrinterType::Fdm));
    }

    #[test]
    fn test_timestamp_parse_variants() {
        assert!(timestamp::parse("2024-06-04T13:45:18").is_ok());
        assert!(timestamp::parse("2024-06-04T13:45:18+02:00").is_ok());
        assert!(timestamp::parse("yesterday").is_err());
    }
}
