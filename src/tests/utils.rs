//! Test utilities and helpers for unit tests
//!
//! - temp dirs and files
//! - quote, payload and proposal fixtures

pub mod test_helpers {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Create a temporary directory for testing
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    /// Create a temporary file with content
    pub fn create_temp_file_with_content(dir: &TempDir, filename: &str, content: &[u8]) -> PathBuf {
        let file_path = dir.path().join(filename);
        std::fs::write(&file_path, content).expect("Failed to write temp file");
        file_path
    }
}

pub mod fixtures {
    use printquote_protocol::api::QuoteCreateRequest;
    use printquote_protocol::common::{OptimizationResponse, Quote};
    use serde_json::{json, Value};

    fn sections() -> Value {
        json!({
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
            "commercial": { "labor": 5, "post_processing": 2, "margin": 0.3, "taxes": 0.12 }
        })
    }

    /// Quote as the backend returns it
    pub fn quote_json(id: &str) -> Value {
        let mut value = sections();
        let object = value.as_object_mut().expect("fixture is an object");
        object.insert("_id".to_string(), json!(id));
        object.insert("user_id".to_string(), json!("u-1"));
        object.insert(
            "summary".to_string(),
            json!({
                "grams_used": 44.1, "grams_wasted": 2.1, "waste_percentage": 4.76,
                "estimated_total_cost": 12.8, "suggestions": ["Reduce infill to 15%"]
            }),
        );
        object.insert("created_at".to_string(), json!("2024-06-04T13:45:18.123000"));
        object.insert("updated_at".to_string(), json!("2024-06-04T14:00:00Z"));
        value
    }

    pub fn sample_quote(id: &str) -> Quote {
        serde_json::from_value(quote_json(id)).expect("valid quote fixture")
    }

    /// Fully valid create payload
    pub fn sample_request() -> QuoteCreateRequest {
        serde_json::from_value(sections()).expect("valid request fixture")
    }

    fn mode(speed: f64, layer_height: f64, infill: f64, print_time: f64, total_cost: f64) -> Value {
        json!({
            "new_parameters": {
                "speed": speed, "layer_height": layer_height, "infill": infill, "support_weight": 0
            },
            "results": {
                "print_time": print_time, "grams_used": 40.2, "grams_wasted": 1.6,
                "waste_percentage": 3.8, "material_cost": 1.01, "energy_cost": 0.05,
                "machine_cost": 4.4, "total_cost": total_cost
            }
        })
    }

    pub fn optimization_json() -> Value {
        json!({
            "fast": mode(120.0, 0.28, 15.0, 1.9, 11.5),
            "economic": mode(50.0, 0.2, 10.0, 4.2, 9.1),
            "balanced": mode(80.0, 0.24, 15.0, 2.8, 10.2),
        })
    }

    pub fn optimization_response() -> OptimizationResponse {
        serde_json::from_value(optimization_json()).expect("valid optimization fixture")
    }
}
