//! Field rules for quote drafts
//!
//! Every rule is a pure function returning the violation message for a value,
//! or `None` when the value is acceptable.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::draft::Field;
use printquote_protocol::common::{SupportType, FILAMENT_DIAMETERS};

pub const INVALID_NUMBER: &str = "Enter a valid number";

/// Lower bound of a numeric rule
#[derive(Debug, Clone, Copy)]
pub enum Lower {
    /// value must be strictly greater
    Above(f64),
    /// value may equal the bound
    AtLeast(f64),
}

/// Bounds and messages for one numeric field
#[derive(Debug, Clone, Copy)]
pub struct NumberRule {
    pub lower: Lower,
    pub lower_message: &'static str,
    pub upper: Option<(f64, &'static str)>,
}

impl NumberRule {
    const fn above(min: f64, message: &'static str) -> Self {
        Self {
            lower: Lower::Above(min),
            lower_message: message,
            upper: None,
        }
    }

    const fn at_least(min: f64, message: &'static str) -> Self {
        Self {
            lower: Lower::AtLeast(min),
            lower_message: message,
            upper: None,
        }
    }

    const fn at_most(self, max: f64, message: &'static str) -> Self {
        Self {
            upper: Some((max, message)),
            ..self
        }
    }

    pub fn check(&self, value: f64) -> Option<&'static str> {
        if !value.is_finite() {
            return Some(INVALID_NUMBER);
        }
        let low_ok = match self.lower {
            Lower::Above(min) => value > min,
            Lower::AtLeast(min) => value >= min,
        };
        if !low_ok {
            return Some(self.lower_message);
        }
        match self.upper {
            Some((max, message)) if value > max => Some(message),
            _ => None,
        }
    }
}

pub const PRINTER_WATTS: NumberRule = NumberRule::above(0.0, "Watts must be > 0");
pub const PRINTER_SPEED: NumberRule =
    NumberRule::above(0.0, "Speed must be > 0").at_most(300.0, "Speed max = 300 mm/s");
pub const PRINTER_LAYER: NumberRule =
    NumberRule::above(0.0, "Layer must be > 0").at_most(1.0, "Layer max = 1.0 mm");
pub const BED_TEMPERATURE: NumberRule =
    NumberRule::at_least(0.0, "Bed temp ≥ 0").at_most(120.0, "Bed temp max = 120 °C");
pub const HOTEND_TEMPERATURE: NumberRule =
    NumberRule::at_least(150.0, "Hotend ≥ 150 °C").at_most(350.0, "Hotend ≤ 350 °C");
pub const HOURLY_COST: NumberRule =
    NumberRule::at_least(1.0, "Hourly cost ≥ 1").at_most(500.0, "Hourly cost ≤ 500");
pub const PRICE_PER_KG: NumberRule =
    NumberRule::at_least(1.0, "Price ≥ 1").at_most(100.0, "Price ≤ 100");
pub const TOTAL_WEIGHT: NumberRule = NumberRule::above(0.0, "Weight must be > 0");
pub const KWH_COST: NumberRule = NumberRule::above(0.0, "kWh cost must be > 0");
pub const MODEL_WEIGHT: NumberRule = NumberRule::above(0.0, "Model weight must be > 0");
pub const PRINT_TIME: NumberRule = NumberRule::above(0.0, "Print time must be > 0");
pub const INFILL: NumberRule =
    NumberRule::above(0.0, "Infill must be > 0").at_most(100.0, "Infill ≤ 100%");
pub const SUPPORT_WEIGHT: NumberRule = NumberRule::above(0.0, "Support weight must be > 0");
pub const LAYER_HEIGHT: NumberRule =
    NumberRule::above(0.0, "Layer height must be > 0").at_most(1.0, "Layer height ≤ 1.0");
pub const LABOR: NumberRule = NumberRule::at_least(0.0, "Labor ≥ 0").at_most(500.0, "Labor ≤ 500");
pub const POST_PROCESSING: NumberRule = NumberRule::at_least(0.0, "Post-processing ≥ 0")
    .at_most(500.0, "Post-processing ≤ 500");
pub const MARGIN: NumberRule = NumberRule::at_least(0.0, "Margin ≥ 0").at_most(1.0, "Margin ≤ 1.0");
pub const TAXES: NumberRule = NumberRule::at_least(0.0, "Taxes ≥ 0").at_most(1.0, "Taxes ≤ 1.0");

static PRINTER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9 ]+$").expect("printer name pattern"));
static FILAMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z ]+$").expect("filament name pattern"));

pub fn quote_name(value: &str) -> Option<&'static str> {
    let len = value.trim().chars().count();
    if len == 0 {
        Some("Quote name is required")
    } else if len < 3 {
        Some("Minimum 3 characters")
    } else if len > 60 {
        Some("Maximum 60 characters")
    } else {
        None
    }
}

pub fn printer_name(value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        Some("Printer name is required")
    } else if !PRINTER_NAME.is_match(value) {
        Some("Only letters, numbers and spaces")
    } else {
        None
    }
}

pub fn filament_name(value: &str) -> Option<&'static str> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        Some("Filament name is required")
    } else if !FILAMENT_NAME.is_match(value) {
        Some("Only letters and spaces")
    } else if len < 2 {
        Some("Minimum 2 characters")
    } else if len > 40 {
        Some("Maximum 40 characters")
    } else {
        None
    }
}

/// Enum fields are valid once something is selected
pub fn selection<T>(value: Option<T>, message: &'static str) -> Option<&'static str> {
    match value {
        Some(_) => None,
        None => Some(message),
    }
}

pub fn filament_diameter(value: &str) -> Option<&'static str> {
    if FILAMENT_DIAMETERS.contains(&value.trim()) {
        None
    } else {
        Some("Select a diameter")
    }
}

pub fn support_type(supports: bool, value: Option<SupportType>) -> Option<&'static str> {
    if !supports {
        return None;
    }
    selection(value, "Select a support type")
}

pub fn support_weight(supports: bool, value: f64) -> Option<&'static str> {
    if !supports {
        return None;
    }
    SUPPORT_WEIGHT.check(value)
}

/// Current violation message per field
///
/// Fields without a message are absent; an empty map means the draft is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    messages: BTreeMap<Field, &'static str>,
}

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.messages.get(&field).copied()
    }

    /// Store or clear the message of one field
    pub fn set(&mut self, field: Field, message: Option<&'static str>) {
        match message {
            Some(message) => {
                self.messages.insert(field, message);
            }
            None => {
                self.messages.remove(&field);
            }
        }
    }

    /// Apply several results at once
    pub fn apply(&mut self, batch: impl IntoIterator<Item = (Field, Option<&'static str>)>) {
        for (field, message) in batch {
            self.set(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.messages.iter().map(|(field, message)| (*field, *message))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", field.label(), message)?;
        }
        Ok(())
    }
}
