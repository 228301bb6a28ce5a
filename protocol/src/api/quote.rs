//! Quote API DTOs
//!
//! `POST /quotes/` takes a [`QuoteCreateRequest`]. `PUT /quotes/{id}` takes
//! either the same full body or a [`QuoteUpdatePatch`] carrying only the fields
//! to change.

use serde::{Deserialize, Serialize};

pub use crate::common::{
    CommercialData, EnergyData, FilamentData, ModelData, PrinterData, Quote, Summary,
};

// ============================================================================
// Full payloads
// ============================================================================

/// Create quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteCreateRequest {
    pub quote_name: String,
    pub printer: PrinterData,
    pub filament: FilamentData,
    pub energy: EnergyData,
    pub model: ModelData,
    pub commercial: CommercialData,
}

/// Full replacement uses the create shape
pub type QuoteUpdateRequest = QuoteCreateRequest;

// ============================================================================
// Partial update
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infill: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams_used: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grams_wasted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_percentage: Option<f64>,
}

/// Partial quote update; absent sections and fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer: Option<PrinterPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryPatch>,
}

impl QuoteUpdatePatch {
    pub fn is_empty(&self) -> bool {
        self.printer.is_none() && self.model.is_none() && self.summary.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_omits_absent_fields() {
        let patch = QuoteUpdatePatch {
            printer: Some(PrinterPatch { speed: Some(90.0) }),
            model: Some(ModelPatch {
                infill: Some(12.0),
                ..Default::default()
            }),
            summary: None,
        };

        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "printer": { "speed": 90.0 }, "model": { "infill": 12.0 } })
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(QuoteUpdatePatch::default().is_empty());
        assert_eq!(
            serde_json::to_string(&QuoteUpdatePatch::default()).unwrap(),
            "{}"
        );
    }
}
