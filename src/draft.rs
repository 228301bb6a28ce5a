//! In-memory quote draft with live validation
//!
//! A draft holds every editable field of a quote as typed values. Input arrives
//! as raw text per field; after each change the rules of that field and of the
//! fields depending on it are re-evaluated and written to the error set in one
//! batch.

use printquote_protocol::api::QuoteCreateRequest;
use printquote_protocol::common::{
    diameter_option, CommercialData, EnergyData, FilamentColor, FilamentData, FilamentType,
    ModelData, NozzleSize, PrinterData, PrinterType, Quote, Summary, SupportType,
    FILAMENT_DIAMETERS,
};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{PqError, Result};
use crate::validation::{self, FieldErrors};

/// Editable quote fields, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    QuoteName,
    PrinterName,
    PrinterWatts,
    PrinterType,
    PrinterSpeed,
    PrinterNozzle,
    PrinterLayer,
    BedTemperature,
    HotendTemperature,
    HourlyCost,
    FilamentName,
    FilamentType,
    FilamentDiameter,
    PricePerKg,
    FilamentColor,
    TotalWeight,
    KwhCost,
    ModelWeight,
    PrintTime,
    Infill,
    HasSupports,
    SupportType,
    SupportWeight,
    LayerHeight,
    Labor,
    PostProcessing,
    Margin,
    Taxes,
}

/// How a field is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Choice,
    Flag,
}

impl Field {
    pub const ALL: [Field; 28] = [
        Field::QuoteName,
        Field::PrinterName,
        Field::PrinterWatts,
        Field::PrinterType,
        Field::PrinterSpeed,
        Field::PrinterNozzle,
        Field::PrinterLayer,
        Field::BedTemperature,
        Field::HotendTemperature,
        Field::HourlyCost,
        Field::FilamentName,
        Field::FilamentType,
        Field::FilamentDiameter,
        Field::PricePerKg,
        Field::FilamentColor,
        Field::TotalWeight,
        Field::KwhCost,
        Field::ModelWeight,
        Field::PrintTime,
        Field::Infill,
        Field::HasSupports,
        Field::SupportType,
        Field::SupportWeight,
        Field::LayerHeight,
        Field::Labor,
        Field::PostProcessing,
        Field::Margin,
        Field::Taxes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::QuoteName => "Quote name",
            Field::PrinterName => "Printer name",
            Field::PrinterWatts => "Watts",
            Field::PrinterType => "Printer type",
            Field::PrinterSpeed => "Speed (mm/s)",
            Field::PrinterNozzle => "Nozzle",
            Field::PrinterLayer => "Printer layer (mm)",
            Field::BedTemperature => "Bed temperature (°C)",
            Field::HotendTemperature => "Hotend temperature (°C)",
            Field::HourlyCost => "Hourly cost",
            Field::FilamentName => "Filament name",
            Field::FilamentType => "Filament type",
            Field::FilamentDiameter => "Diameter (mm)",
            Field::PricePerKg => "Price per kg",
            Field::FilamentColor => "Color",
            Field::TotalWeight => "Total weight (g)",
            Field::KwhCost => "kWh cost",
            Field::ModelWeight => "Model weight (g)",
            Field::PrintTime => "Print time (h)",
            Field::Infill => "Infill (%)",
            Field::HasSupports => "Supports",
            Field::SupportType => "Support type",
            Field::SupportWeight => "Support weight (g)",
            Field::LayerHeight => "Layer height (mm)",
            Field::Labor => "Labor",
            Field::PostProcessing => "Post-processing",
            Field::Margin => "Margin (0-1)",
            Field::Taxes => "Taxes (0-1)",
        }
    }

    /// Dotted path of the field in the quote payload
    pub fn key(&self) -> &'static str {
        match self {
            Field::QuoteName => "quote_name",
            Field::PrinterName => "printer.name",
            Field::PrinterWatts => "printer.watts",
            Field::PrinterType => "printer.type",
            Field::PrinterSpeed => "printer.speed",
            Field::PrinterNozzle => "printer.nozzle",
            Field::PrinterLayer => "printer.layer",
            Field::BedTemperature => "printer.bed_temperature",
            Field::HotendTemperature => "printer.hotend_temperature",
            Field::HourlyCost => "printer.hourly_cost",
            Field::FilamentName => "filament.name",
            Field::FilamentType => "filament.type",
            Field::FilamentDiameter => "filament.diameter",
            Field::PricePerKg => "filament.price_per_kg",
            Field::FilamentColor => "filament.color",
            Field::TotalWeight => "filament.total_weight",
            Field::KwhCost => "energy.kwh_cost",
            Field::ModelWeight => "model.model_weight",
            Field::PrintTime => "model.print_time",
            Field::Infill => "model.infill",
            Field::HasSupports => "model.supports",
            Field::SupportType => "model.support_type",
            Field::SupportWeight => "model.support_weight",
            Field::LayerHeight => "model.layer_height",
            Field::Labor => "commercial.labor",
            Field::PostProcessing => "commercial.post_processing",
            Field::Margin => "commercial.margin",
            Field::Taxes => "commercial.taxes",
        }
    }

    /// Section heading used when prompting
    pub fn section(&self) -> &'static str {
        match self.key().split_once('.') {
            Some(("printer", _)) => "Printer",
            Some(("filament", _)) => "Filament",
            Some(("energy", _)) => "Energy",
            Some(("model", _)) => "Model",
            Some(("commercial", _)) => "Commercial",
            _ => "Quote",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::QuoteName | Field::PrinterName | Field::FilamentName => FieldKind::Text,
            Field::PrinterType
            | Field::PrinterNozzle
            | Field::FilamentType
            | Field::FilamentDiameter
            | Field::FilamentColor
            | Field::SupportType => FieldKind::Choice,
            Field::HasSupports => FieldKind::Flag,
            _ => FieldKind::Number,
        }
    }

    /// Fields whose rules read this field's value
    pub fn dependents(&self) -> &'static [Field] {
        match self {
            Field::HasSupports => &[Field::SupportType, Field::SupportWeight],
            _ => &[],
        }
    }

    /// Selectable values of a choice field, as shown to the user
    pub fn options(&self) -> Vec<&'static str> {
        match self {
            Field::PrinterType => PrinterType::ALL.iter().map(|o| o.label()).collect(),
            Field::PrinterNozzle => NozzleSize::ALL.iter().map(|o| o.label()).collect(),
            Field::FilamentType => FilamentType::ALL.iter().map(|o| o.label()).collect(),
            Field::FilamentDiameter => FILAMENT_DIAMETERS.to_vec(),
            Field::FilamentColor => FilamentColor::ALL.iter().map(|o| o.label()).collect(),
            Field::SupportType => SupportType::ALL.iter().map(|o| o.label()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the field is currently asked for
    pub fn is_active(&self, values: &DraftValues) -> bool {
        match self {
            Field::SupportType | Field::SupportWeight => values.supports,
            _ => true,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed field values of a draft
#[derive(Debug, Clone, PartialEq)]
pub struct DraftValues {
    pub quote_name: String,
    pub printer_name: String,
    pub watts: f64,
    pub printer_type: Option<PrinterType>,
    pub speed: f64,
    pub nozzle: Option<NozzleSize>,
    pub printer_layer: f64,
    pub bed_temperature: f64,
    pub hotend_temperature: f64,
    pub hourly_cost: f64,
    pub filament_name: String,
    pub filament_type: Option<FilamentType>,
    /// Display option, e.g. "1.75"
    pub diameter: String,
    pub price_per_kg: f64,
    pub color: Option<FilamentColor>,
    pub total_weight: f64,
    pub kwh_cost: f64,
    pub model_weight: f64,
    pub print_time: f64,
    pub infill: f64,
    pub supports: bool,
    pub support_type: Option<SupportType>,
    pub support_weight: f64,
    pub layer_height: f64,
    pub labor: f64,
    pub post_processing: f64,
    pub margin: f64,
    pub taxes: f64,
}

impl Default for DraftValues {
    fn default() -> Self {
        Self {
            quote_name: String::new(),
            printer_name: String::new(),
            watts: 0.0,
            printer_type: Some(PrinterType::first()),
            speed: 0.0,
            nozzle: Some(NozzleSize::first()),
            printer_layer: 0.0,
            bed_temperature: 0.0,
            hotend_temperature: 0.0,
            hourly_cost: 0.0,
            filament_name: String::new(),
            filament_type: Some(FilamentType::first()),
            diameter: FILAMENT_DIAMETERS[0].to_string(),
            price_per_kg: 0.0,
            color: Some(FilamentColor::first()),
            total_weight: 0.0,
            kwh_cost: 0.0,
            model_weight: 0.0,
            print_time: 0.0,
            infill: 0.0,
            supports: false,
            support_type: Some(SupportType::first()),
            support_weight: 0.0,
            layer_height: 0.0,
            labor: 0.0,
            post_processing: 0.0,
            margin: 0.0,
            taxes: 0.0,
        }
    }
}

fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_choice<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse::<T>().ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

/// Edit state of one quote
#[derive(Debug, Clone, Default)]
pub struct QuoteDraft {
    id: Option<String>,
    summary: Option<Summary>,
    values: DraftValues,
    errors: FieldErrors,
}

impl QuoteDraft {
    /// Empty draft for a new quote
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft editing an existing quote
    pub fn from_quote(quote: &Quote) -> Self {
        let mut draft = Self::from_request(QuoteCreateRequest {
            quote_name: quote.quote_name.clone(),
            printer: quote.printer.clone(),
            filament: quote.filament.clone(),
            energy: quote.energy.clone(),
            model: quote.model.clone(),
            commercial: quote.commercial.clone(),
        });
        draft.id = Some(quote.id.clone());
        draft.summary = Some(quote.summary.clone());
        draft
    }

    /// Draft seeded from a payload, e.g. one read from a JSON file
    pub fn from_request(request: QuoteCreateRequest) -> Self {
        let QuoteCreateRequest {
            quote_name,
            printer,
            filament,
            energy,
            model,
            commercial,
        } = request;

        let diameter = diameter_option(filament.diameter)
            .map(str::to_string)
            .unwrap_or_else(|| filament.diameter.to_string());

        let values = DraftValues {
            quote_name,
            printer_name: printer.name,
            watts: printer.watts,
            printer_type: printer.kind,
            speed: printer.speed,
            nozzle: printer.nozzle,
            printer_layer: printer.layer,
            bed_temperature: printer.bed_temperature,
            hotend_temperature: printer.hotend_temperature,
            hourly_cost: printer.hourly_cost,
            filament_name: filament.name,
            filament_type: filament.kind,
            diameter,
            price_per_kg: filament.price_per_kg,
            color: filament.color,
            total_weight: filament.total_weight,
            kwh_cost: energy.kwh_cost,
            model_weight: model.model_weight,
            print_time: model.print_time,
            infill: model.infill,
            supports: model.supports,
            support_type: if model.supports {
                model.support_type
            } else {
                model.support_type.or(Some(SupportType::first()))
            },
            support_weight: model.support_weight,
            layer_height: model.layer_height,
            labor: commercial.labor,
            post_processing: commercial.post_processing,
            margin: commercial.margin,
            taxes: commercial.taxes,
        };

        let mut draft = Self {
            id: None,
            summary: None,
            values,
            errors: FieldErrors::default(),
        };
        // values the backend stored outside an option set surface right away
        draft.validate_all();
        draft
    }

    /// Replace every value with a payload, keeping the quote being edited
    pub fn load_request(&mut self, request: QuoteCreateRequest) {
        let id = self.id.take();
        let summary = self.summary.take();
        *self = Self::from_request(request);
        self.id = id;
        self.summary = summary;
    }

    /// Id of the quote being edited, `None` for a new quote
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn values(&self) -> &DraftValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Apply raw text to one field and refresh the affected messages
    pub fn set_input(&mut self, field: Field, raw: &str) -> Result<()> {
        let v = &mut self.values;
        match field {
            Field::QuoteName => v.quote_name = raw.to_string(),
            Field::PrinterName => v.printer_name = raw.to_string(),
            Field::PrinterWatts => v.watts = parse_number(raw),
            Field::PrinterType => v.printer_type = parse_choice(raw),
            Field::PrinterSpeed => v.speed = parse_number(raw),
            Field::PrinterNozzle => v.nozzle = parse_choice(raw),
            Field::PrinterLayer => v.printer_layer = parse_number(raw),
            Field::BedTemperature => v.bed_temperature = parse_number(raw),
            Field::HotendTemperature => v.hotend_temperature = parse_number(raw),
            Field::HourlyCost => v.hourly_cost = parse_number(raw),
            Field::FilamentName => v.filament_name = raw.to_string(),
            Field::FilamentType => v.filament_type = parse_choice(raw),
            Field::FilamentDiameter => v.diameter = raw.trim().to_string(),
            Field::PricePerKg => v.price_per_kg = parse_number(raw),
            Field::FilamentColor => v.color = parse_choice(raw),
            Field::TotalWeight => v.total_weight = parse_number(raw),
            Field::KwhCost => v.kwh_cost = parse_number(raw),
            Field::ModelWeight => v.model_weight = parse_number(raw),
            Field::PrintTime => v.print_time = parse_number(raw),
            Field::Infill => v.infill = parse_number(raw),
            Field::HasSupports => {
                let supports = parse_flag(raw).ok_or_else(|| {
                    PqError::invalid_input(format!("'{}' is not yes or no", raw.trim()))
                })?;
                self.set_has_supports(supports);
                return Ok(());
            }
            Field::SupportType => v.support_type = parse_choice(raw),
            Field::SupportWeight => v.support_weight = parse_number(raw),
            Field::LayerHeight => v.layer_height = parse_number(raw),
            Field::Labor => v.labor = parse_number(raw),
            Field::PostProcessing => v.post_processing = parse_number(raw),
            Field::Margin => v.margin = parse_number(raw),
            Field::Taxes => v.taxes = parse_number(raw),
        }
        self.revalidate(field);
        Ok(())
    }

    /// Toggle supports; switching off also resets the support fields
    pub fn set_has_supports(&mut self, supports: bool) {
        self.values.supports = supports;
        if !supports {
            self.values.support_type = Some(SupportType::first());
            self.values.support_weight = 0.0;
        }
        self.revalidate(Field::HasSupports);
    }

    /// Current value of a field as editable text
    pub fn input_value(&self, field: Field) -> String {
        let v = &self.values;
        match field {
            Field::QuoteName => v.quote_name.clone(),
            Field::PrinterName => v.printer_name.clone(),
            Field::PrinterWatts => format_number(v.watts),
            Field::PrinterType => label_of(v.printer_type.map(|o| o.label())),
            Field::PrinterSpeed => format_number(v.speed),
            Field::PrinterNozzle => label_of(v.nozzle.map(|o| o.label())),
            Field::PrinterLayer => format_number(v.printer_layer),
            Field::BedTemperature => format_number(v.bed_temperature),
            Field::HotendTemperature => format_number(v.hotend_temperature),
            Field::HourlyCost => format_number(v.hourly_cost),
            Field::FilamentName => v.filament_name.clone(),
            Field::FilamentType => label_of(v.filament_type.map(|o| o.label())),
            Field::FilamentDiameter => v.diameter.clone(),
            Field::PricePerKg => format_number(v.price_per_kg),
            Field::FilamentColor => label_of(v.color.map(|o| o.label())),
            Field::TotalWeight => format_number(v.total_weight),
            Field::KwhCost => format_number(v.kwh_cost),
            Field::ModelWeight => format_number(v.model_weight),
            Field::PrintTime => format_number(v.print_time),
            Field::Infill => format_number(v.infill),
            Field::HasSupports => if v.supports { "yes" } else { "no" }.to_string(),
            Field::SupportType => label_of(v.support_type.map(|o| o.label())),
            Field::SupportWeight => format_number(v.support_weight),
            Field::LayerHeight => format_number(v.layer_height),
            Field::Labor => format_number(v.labor),
            Field::PostProcessing => format_number(v.post_processing),
            Field::Margin => format_number(v.margin),
            Field::Taxes => format_number(v.taxes),
        }
    }

    /// Evaluate the rule of one field against the current values
    pub fn check(&self, field: Field) -> Option<&'static str> {
        let v = &self.values;
        match field {
            Field::QuoteName => validation::quote_name(&v.quote_name),
            Field::PrinterName => validation::printer_name(&v.printer_name),
            Field::PrinterWatts => validation::PRINTER_WATTS.check(v.watts),
            Field::PrinterType => validation::selection(v.printer_type, "Select a printer type"),
            Field::PrinterSpeed => validation::PRINTER_SPEED.check(v.speed),
            Field::PrinterNozzle => validation::selection(v.nozzle, "Select a nozzle"),
            Field::PrinterLayer => validation::PRINTER_LAYER.check(v.printer_layer),
            Field::BedTemperature => validation::BED_TEMPERATURE.check(v.bed_temperature),
            Field::HotendTemperature => validation::HOTEND_TEMPERATURE.check(v.hotend_temperature),
            Field::HourlyCost => validation::HOURLY_COST.check(v.hourly_cost),
            Field::FilamentName => validation::filament_name(&v.filament_name),
            Field::FilamentType => validation::selection(v.filament_type, "Select a filament type"),
            Field::FilamentDiameter => validation::filament_diameter(&v.diameter),
            Field::PricePerKg => validation::PRICE_PER_KG.check(v.price_per_kg),
            Field::FilamentColor => validation::selection(v.color, "Select a color"),
            Field::TotalWeight => validation::TOTAL_WEIGHT.check(v.total_weight),
            Field::KwhCost => validation::KWH_COST.check(v.kwh_cost),
            Field::ModelWeight => validation::MODEL_WEIGHT.check(v.model_weight),
            Field::PrintTime => validation::PRINT_TIME.check(v.print_time),
            Field::Infill => validation::INFILL.check(v.infill),
            Field::HasSupports => None,
            Field::SupportType => validation::support_type(v.supports, v.support_type),
            Field::SupportWeight => validation::support_weight(v.supports, v.support_weight),
            Field::LayerHeight => validation::LAYER_HEIGHT.check(v.layer_height),
            Field::Labor => validation::LABOR.check(v.labor),
            Field::PostProcessing => validation::POST_PROCESSING.check(v.post_processing),
            Field::Margin => validation::MARGIN.check(v.margin),
            Field::Taxes => validation::TAXES.check(v.taxes),
        }
    }

    fn revalidate(&mut self, field: Field) {
        let batch: Vec<(Field, Option<&'static str>)> = std::iter::once(field)
            .chain(field.dependents().iter().copied())
            .map(|f| (f, self.check(f)))
            .collect();
        self.errors.apply(batch);
    }

    /// Re-run every rule and replace the error set
    pub fn validate_all(&mut self) -> &FieldErrors {
        let mut errors = FieldErrors::default();
        errors.apply(Field::ALL.iter().map(|f| (*f, self.check(*f))));
        self.errors = errors;
        &self.errors
    }

    /// Submission gate: full validation, then the payload
    pub fn submit(&mut self) -> Result<QuoteCreateRequest> {
        if !self.validate_all().is_empty() {
            debug!("Draft rejected with {} field error(s)", self.errors.len());
            return Err(PqError::invalid_draft(self.errors.clone()));
        }
        self.to_payload()
    }

    /// Shape the current values into a create/update body
    pub fn to_payload(&self) -> Result<QuoteCreateRequest> {
        let v = &self.values;

        let mut missing = FieldErrors::default();
        missing.apply(
            [
                Field::PrinterType,
                Field::PrinterNozzle,
                Field::FilamentType,
                Field::FilamentDiameter,
                Field::FilamentColor,
            ]
            .map(|f| (f, self.check(f))),
        );
        let diameter = v.diameter.trim().parse::<f64>().ok();

        let (Some(printer_type), Some(nozzle), Some(filament_type), Some(color), Some(diameter)) =
            (v.printer_type, v.nozzle, v.filament_type, v.color, diameter)
        else {
            return Err(PqError::invalid_draft(missing));
        };
        if !missing.is_empty() {
            return Err(PqError::invalid_draft(missing));
        }

        let (support_type, support_weight) = if v.supports {
            (v.support_type, v.support_weight)
        } else {
            (None, 0.0)
        };

        Ok(QuoteCreateRequest {
            quote_name: v.quote_name.trim().to_string(),
            printer: PrinterData {
                name: v.printer_name.trim().to_string(),
                watts: v.watts,
                kind: Some(printer_type),
                speed: v.speed,
                nozzle: Some(nozzle),
                layer: v.printer_layer,
                bed_temperature: v.bed_temperature,
                hotend_temperature: v.hotend_temperature,
                hourly_cost: v.hourly_cost,
            },
            filament: FilamentData {
                name: v.filament_name.trim().to_string(),
                kind: Some(filament_type),
                diameter,
                price_per_kg: v.price_per_kg,
                color: Some(color),
                total_weight: v.total_weight,
            },
            energy: EnergyData {
                kwh_cost: v.kwh_cost,
            },
            model: ModelData {
                model_weight: v.model_weight,
                print_time: v.print_time,
                infill: v.infill,
                supports: v.supports,
                support_type,
                support_weight,
                layer_height: v.layer_height,
            },
            commercial: CommercialData {
                labor: v.labor,
                post_processing: v.post_processing,
                margin: v.margin,
                taxes: v.taxes,
            },
        })
    }

    /// Back to an empty new-quote draft
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn label_of(label: Option<&'static str>) -> String {
    label.unwrap_or_default().to_string()
}
