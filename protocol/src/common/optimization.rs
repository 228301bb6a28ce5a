//! Optimization proposals returned by `GET /quotes/{id}/optimize`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::options::ParseChoiceError;

/// Parameters the backend suggests changing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeParameters {
    pub speed: f64,
    pub layer_height: f64,
    pub infill: f64,
    pub support_weight: f64,
}

/// Estimated outcome with the suggested parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeResults {
    pub print_time: f64,
    pub grams_used: f64,
    pub grams_wasted: f64,
    pub waste_percentage: f64,
    pub material_cost: f64,
    pub energy_cost: f64,
    pub machine_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMode {
    pub new_parameters: ModeParameters,
    pub results: ModeResults,
}

/// The three alternatives offered for one quote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub fast: OptimizationMode,
    pub economic: OptimizationMode,
    pub balanced: OptimizationMode,
}

impl OptimizationResponse {
    pub fn mode(&self, key: ModeKey) -> &OptimizationMode {
        match key {
            ModeKey::Fast => &self.fast,
            ModeKey::Economic => &self.economic,
            ModeKey::Balanced => &self.balanced,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModeKey, &OptimizationMode)> {
        ModeKey::ALL.iter().map(move |key| (*key, self.mode(*key)))
    }
}

/// Selects one of the three proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Fast,
    Economic,
    Balanced,
}

impl ModeKey {
    pub const ALL: &'static [ModeKey] = &[ModeKey::Fast, ModeKey::Economic, ModeKey::Balanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKey::Fast => "fast",
            ModeKey::Economic => "economic",
            ModeKey::Balanced => "balanced",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ModeKey::Fast => "Fast mode",
            ModeKey::Economic => "Economic mode",
            ModeKey::Balanced => "Balanced mode",
        }
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKey {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseChoiceError {
                kind: "optimization mode",
                value: wanted.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_json(speed: f64) -> serde_json::Value {
        serde_json::json!({
            "new_parameters": { "speed": speed, "layer_height": 0.28, "infill": 15, "support_weight": 0 },
            "results": {
                "print_time": 2.1, "grams_used": 38.0, "grams_wasted": 1.2, "waste_percentage": 3.1,
                "material_cost": 0.95, "energy_cost": 0.04, "machine_cost": 4.2, "total_cost": 9.9
            }
        })
    }

    #[test]
    fn test_deserialize_and_select_modes() {
        let body = serde_json::json!({
            "fast": mode_json(120.0),
            "economic": mode_json(50.0),
            "balanced": mode_json(80.0),
        });
        let response: OptimizationResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.mode(ModeKey::Economic).new_parameters.speed, 50.0);

        let speeds: Vec<f64> = response
            .iter()
            .map(|(_, mode)| mode.new_parameters.speed)
            .collect();
        assert_eq!(speeds, vec![120.0, 50.0, 80.0]);
    }

    #[test]
    fn test_mode_key_parse() {
        assert_eq!("Economic".parse::<ModeKey>(), Ok(ModeKey::Economic));
        assert!("cheap".parse::<ModeKey>().is_err());
    }
}
