//! Interactive draft entry
//!
//! Each field is asked in form order, prefilled with the draft's value. Text
//! and number input is checked against the field rule while typing; choices
//! come from the field's option set.

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::draft::{Field, FieldKind, QuoteDraft};
use crate::error::{PqError, Result};
use crate::ui::UI;

pub struct DraftPrompter {
    theme: ColorfulTheme,
    ui: UI,
}

impl DraftPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            ui: UI::new(),
        }
    }

    /// Walk every active field of the draft
    pub fn fill(&self, draft: &mut QuoteDraft) -> Result<()> {
        if !Term::stderr().is_term() {
            return Err(PqError::invalid_input(
                "No terminal available; pass the quote with --file",
            ));
        }

        let mut section = "";
        for field in Field::ALL {
            if !field.is_active(draft.values()) {
                continue;
            }
            if field.section() != section {
                section = field.section();
                self.ui.subheader(section);
            }
            self.ask(draft, field)?;
        }
        Ok(())
    }

    fn ask(&self, draft: &mut QuoteDraft, field: Field) -> Result<()> {
        match field.kind() {
            FieldKind::Text | FieldKind::Number => {
                let current = draft.input_value(field);
                let probe = draft.clone();
                let value: String = Input::with_theme(&self.theme)
                    .with_prompt(field.label())
                    .with_initial_text(current)
                    .validate_with(|input: &String| -> std::result::Result<(), String> {
                        let mut candidate = probe.clone();
                        candidate
                            .set_input(field, input)
                            .map_err(|e| e.to_string())?;
                        match candidate.errors().get(field) {
                            Some(message) => Err(message.to_string()),
                            None => Ok(()),
                        }
                    })
                    .interact_text()?;
                draft.set_input(field, &value)
            }
            FieldKind::Choice => {
                let options = field.options();
                let current = draft.input_value(field);
                let default = options
                    .iter()
                    .position(|option| *option == current)
                    .unwrap_or(0);
                let index = Select::with_theme(&self.theme)
                    .with_prompt(field.label())
                    .items(&options)
                    .default(default)
                    .interact()?;
                draft.set_input(field, options[index])
            }
            FieldKind::Flag => {
                let enabled = Confirm::with_theme(&self.theme)
                    .with_prompt(field.label())
                    .default(draft.values().supports)
                    .interact()?;
                draft.set_has_supports(enabled);
                Ok(())
            }
        }
    }

    /// Ask before an irreversible action
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    /// Pick one item, `None` when the user chose the trailing cancel entry
    pub fn choose(&self, prompt: &str, items: &[&str]) -> Result<Option<usize>> {
        let mut entries = items.to_vec();
        entries.push("Cancel");
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&entries)
            .default(0)
            .interact()?;
        Ok((index < items.len()).then_some(index))
    }
}

impl Default for DraftPrompter {
    fn default() -> Self {
        Self::new()
    }
}
