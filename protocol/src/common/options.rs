//! Fixed option sets accepted by the backend
//!
//! Every enumerated quote field is one of these. The serialized form is the
//! backend's own spelling, the `label` is what the client shows. Parsing accepts
//! either, case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a string is not one of an option set's values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseChoiceError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $wire:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every option, in the order the backend lists them
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Human name of the option set, used in "Select a ..." messages
            pub const KIND: &'static str = $kind;

            pub fn wire(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Default selection for a fresh draft
            pub fn first() -> Self {
                Self::ALL[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| {
                        option.wire().eq_ignore_ascii_case(wanted)
                            || option.label().eq_ignore_ascii_case(wanted)
                    })
                    .ok_or_else(|| ParseChoiceError {
                        kind: $kind,
                        value: wanted.to_string(),
                    })
            }
        }
    };
}

choice_enum! {
    /// Printing technology
    PrinterType ("printer type") {
        Fdm => "FDM", "FDM";
        Sla => "SLA", "SLA";
        Sls => "SLS", "SLS";
        Dlp => "DLP", "DLP";
        Msla => "MSLA", "MSLA";
    }
}

choice_enum! {
    /// Nozzle diameter, sent as a string
    NozzleSize ("nozzle") {
        Mm02 => "0.2", "0.2 mm";
        Mm04 => "0.4", "0.4 mm";
        Mm06 => "0.6", "0.6 mm";
        Mm08 => "0.8", "0.8 mm";
        Mm10 => "1.0", "1.0 mm";
    }
}

choice_enum! {
    /// Filament material
    FilamentType ("filament type") {
        Pla => "PLA", "PLA";
        Abs => "ABS", "ABS";
        Petg => "PETG", "PETG";
        Tpu => "TPU", "TPU";
        Nylon => "Nylon", "Nylon";
        Hips => "HIPS", "HIPS";
        Pc => "PC", "PC";
        Asa => "ASA", "ASA";
    }
}

choice_enum! {
    /// Filament color
    FilamentColor ("color") {
        Black => "Negro", "Black";
        White => "Blanco", "White";
        Red => "Rojo", "Red";
        Blue => "Azul", "Blue";
        Green => "Verde", "Green";
        Yellow => "Amarillo", "Yellow";
        Gray => "Gris", "Gray";
        Transparent => "Transparente", "Transparent";
        Orange => "Naranja", "Orange";
        Purple => "Púrpura", "Purple";
        Silver => "Plateado", "Silver";
        Gold => "Dorado", "Gold";
    }
}

choice_enum! {
    /// Support structure style
    SupportType ("support type") {
        Tree => "Árbol", "Tree";
        Linear => "Lineal", "Linear";
    }
}

/// Filament diameters in millimetres, as offered to the user
pub const FILAMENT_DIAMETERS: &[&str] = &["1.75", "2.85", "3.0"];

/// Map a numeric diameter back to its display option
pub fn diameter_option(diameter: f64) -> Option<&'static str> {
    FILAMENT_DIAMETERS.iter().copied().find(|option| {
        option
            .parse::<f64>()
            .map(|value| (value - diameter).abs() < 1e-9)
            .unwrap_or(false)
    })
}

/// Read an option-set field, taking anything outside the set as "not selected"
///
/// Stored quotes may carry values the client does not know. Those read as
/// `None` instead of failing the whole document, so the quote can still be
/// listed and fixed. Numbers are matched by their text form, e.g. `0.4`.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(text)) => text.parse().ok(),
            Some(Value::Number(number)) => number.to_string().parse().ok(),
            _ => None,
        })
    }
}
