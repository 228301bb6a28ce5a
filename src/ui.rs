use console::{strip_ansi_codes, Term};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use printquote_protocol::common::{ModeKey, OptimizationMode, OptimizationResponse, Quote};
use std::fmt;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::validation::FieldErrors;

/// Terminal output helpers
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Format authentication status with appropriate color (if supported)
    pub fn format_auth_status(&self, authenticated: bool) -> String {
        if authenticated {
            self.colorize("Authenticated", |t| t.green().to_string())
        } else {
            self.colorize("Not authenticated", |t| t.red().to_string())
        }
    }

    /// Format server connection status with appropriate color (if supported)
    pub fn format_server_status(&self, connected: bool) -> String {
        if connected {
            self.colorize("Connected", |t| t.green().to_string())
        } else {
            self.colorize("Connection failed", |t| t.red().to_string())
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        let term_width = self.width();
        let title_len = title.width() + 4;
        let line_len = if term_width > title_len {
            (term_width - title_len) / 2
        } else {
            0
        };

        let line = "═".repeat(line_len.min(30));

        println!();
        if self.supports_color() {
            println!("{} {} {}", line.cyan(), title.cyan().bold(), line.cyan());
        } else {
            println!("{} {} {}", line, title, line);
        }
        println!();
    }

    /// Smaller heading used between prompt groups
    pub fn subheader(&self, title: &str) {
        println!();
        println!("{}", self.colorize(title, |t| t.bold().underline().to_string()));
    }

    pub fn separator(&self) {
        let line = "─".repeat(self.width().min(80));
        println!("{}", self.colorize(&line, |l| l.dimmed().to_string()));
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let card_width = self.width().saturating_sub(4).clamp(50, 80);
        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_spaces = card_width.saturating_sub(title.width() + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            // widths ignore ANSI codes
            let label_width = strip_ansi_codes(label).width();
            let value_width = strip_ansi_codes(&value).width();
            let content_width = label_width + value_width + 4;

            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// One row per quote: id, name, printer, filament, infill
    pub fn quote_table(&self, quotes: &[Quote]) {
        if quotes.is_empty() {
            self.info("No quotes yet. Create one with `printquote create`.");
            return;
        }

        let rows: Vec<[String; 5]> = quotes
            .iter()
            .map(|q| {
                [
                    q.id.clone(),
                    q.quote_name.clone(),
                    format!("{} ({})", q.printer.name, choice(q.printer.kind)),
                    format!("{} {}", choice(q.filament.kind), choice(q.filament.color)),
                    format!("{}%", q.model.infill),
                ]
            })
            .collect();
        let headers = ["ID", "Name", "Printer", "Filament", "Infill"];

        let mut widths = headers.map(|h| h.width());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.width());
            }
        }

        let header_line = join_padded(&headers.map(str::to_string), &widths);
        println!("{}", self.colorize(&header_line, |h| h.bold().to_string()));
        self.separator();
        for row in &rows {
            println!("{}", join_padded(row, &widths));
        }
        println!();
    }

    /// Full view of one quote with its server summary
    pub fn quote_detail(&self, quote: &Quote) {
        let p = &quote.printer;
        let f = &quote.filament;
        let m = &quote.model;
        let c = &quote.commercial;
        let s = &quote.summary;

        let mut content = vec![
            ("ID", quote.id.clone()),
            ("Printer", format!("{} · {} · {} W", p.name, choice(p.kind), p.watts)),
            (
                "Print setup",
                format!(
                    "{} mm/s · nozzle {} · layer {} mm",
                    p.speed,
                    choice(p.nozzle),
                    p.layer
                ),
            ),
            (
                "Temperatures",
                format!("bed {} °C · hotend {} °C", p.bed_temperature, p.hotend_temperature),
            ),
            ("Hourly cost", format!("{:.2}", p.hourly_cost)),
            (
                "Filament",
                format!(
                    "{} · {} · {} · {} mm",
                    f.name,
                    choice(f.kind),
                    choice(f.color),
                    f.diameter
                ),
            ),
            (
                "Stock",
                format!("{} g at {:.2}/kg", f.total_weight, f.price_per_kg),
            ),
            ("kWh cost", format!("{:.3}", quote.energy.kwh_cost)),
            (
                "Model",
                format!(
                    "{} g · {} h · infill {}% · layer {} mm",
                    m.model_weight, m.print_time, m.infill, m.layer_height
                ),
            ),
            ("Supports", format_supports(quote)),
            (
                "Commercial",
                format!(
                    "labor {:.2} · post {:.2} · margin {:.0}% · taxes {:.0}%",
                    c.labor,
                    c.post_processing,
                    c.margin * 100.0,
                    c.taxes * 100.0
                ),
            ),
            ("Grams used", format!("{:.1} g", s.grams_used)),
            (
                "Grams wasted",
                format!("{:.1} g ({:.1}%)", s.grams_wasted, s.waste_percentage),
            ),
            (
                "Estimated total",
                self.colorize(&format!("{:.2}", s.estimated_total_cost), |t| {
                    t.green().bold().to_string()
                }),
            ),
        ];
        if let Some(created) = quote.created_at {
            content.push(("Created", created.format("%Y-%m-%d %H:%M UTC").to_string()));
        }
        if let Some(updated) = quote.updated_at {
            content.push(("Updated", updated.format("%Y-%m-%d %H:%M UTC").to_string()));
        }

        self.card(&quote.quote_name, content);

        if !s.suggestions.is_empty() {
            println!("{}", self.colorize("Suggestions", |t| t.bold().to_string()));
            for suggestion in &s.suggestions {
                println!("  • {}", suggestion);
            }
            println!();
        }
    }

    pub fn proposal_cards(&self, proposals: &OptimizationResponse) {
        for (key, mode) in proposals.iter() {
            self.proposal_card(key, mode);
        }
    }

    fn proposal_card(&self, key: ModeKey, mode: &OptimizationMode) {
        let p = &mode.new_parameters;
        let r = &mode.results;
        self.card(
            key.title(),
            vec![
                ("Speed", format!("{} mm/s", p.speed)),
                ("Layer height", format!("{} mm", p.layer_height)),
                ("Infill", format!("{}%", p.infill)),
                ("Support weight", format!("{} g", p.support_weight)),
                ("Print time", format!("{:.2} h", r.print_time)),
                ("Grams used", format!("{:.1} g", r.grams_used)),
                (
                    "Grams wasted",
                    format!("{:.1} g ({:.1}%)", r.grams_wasted, r.waste_percentage),
                ),
                ("Material cost", format!("{:.2}", r.material_cost)),
                ("Energy cost", format!("{:.2}", r.energy_cost)),
                ("Machine cost", format!("{:.2}", r.machine_cost)),
                (
                    "Total cost",
                    self.colorize(&format!("{:.2}", r.total_cost), |t| {
                        t.green().bold().to_string()
                    }),
                ),
            ],
        );
    }

    /// List every field message of a rejected draft
    pub fn field_errors(&self, errors: &FieldErrors) {
        for (field, message) in errors.iter() {
            let label = self.colorize(field.label(), |l| l.bold().to_string());
            let message = self.colorize(message, |m| m.red().to_string());
            eprintln!("  {}: {}", label, message);
        }
    }

    /// Spinner shown while a request is pending
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Label of a stored option; unknown values read as unset
fn choice<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|option| option.to_string())
        .unwrap_or_else(|| "not set".to_string())
}

fn format_supports(quote: &Quote) -> String {
    let m = &quote.model;
    match (m.supports, m.support_type) {
        (true, Some(kind)) => format!("{} · {} g", kind.label(), m.support_weight),
        (true, None) => format!("{} · {} g", choice(m.support_type), m.support_weight),
        (false, _) => "None".to_string(),
    }
}

/// Left-align cells to the given display widths
fn join_padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
