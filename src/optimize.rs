//! Optimization proposals for a persisted quote
//!
//! Fetches are tagged with the quote id and a generation number. Only the
//! newest fetch may store its result; older ones finishing late are dropped.
//! Applying is refused while a fetch or another apply is pending.

use printquote_protocol::api::{ModelPatch, PrinterPatch, QuoteUpdatePatch, SummaryPatch};
use printquote_protocol::common::{ModeKey, OptimizationMode, OptimizationResponse, Quote};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{PqError, Result};
use crate::quotes::QuoteService;
use crate::validation;

/// Identifies one started fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub quote_id: String,
    pub generation: u64,
}

/// Proposals held for the quote being edited
#[derive(Debug, Default)]
pub struct ProposalSelector {
    quote_id: Option<String>,
    generation: u64,
    in_flight: bool,
    proposals: Option<OptimizationResponse>,
    applying: bool,
}

impl ProposalSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector bound to a quote; `None` for a quote not yet saved
    pub fn for_quote(quote_id: Option<&str>) -> Self {
        Self {
            quote_id: quote_id.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn proposals(&self) -> Option<&OptimizationResponse> {
        self.proposals.as_ref()
    }

    /// Start a fetch; supersedes every earlier one
    pub fn begin_fetch(&mut self) -> Result<FetchTicket> {
        let quote_id = self
            .quote_id
            .clone()
            .ok_or_else(|| PqError::optimization_unavailable("Save the quote before optimizing it"))?;
        self.generation += 1;
        self.in_flight = true;
        Ok(FetchTicket {
            quote_id,
            generation: self.generation,
        })
    }

    /// Record a fetch result; returns `Ok(false)` when the ticket is stale
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<OptimizationResponse>,
    ) -> Result<bool> {
        let current = self.quote_id.as_deref() == Some(ticket.quote_id.as_str())
            && ticket.generation == self.generation;
        if !current {
            debug!(
                "Discarding proposals for {} generation {} (newest is {})",
                ticket.quote_id, ticket.generation, self.generation
            );
            return Ok(false);
        }

        self.in_flight = false;
        match result {
            Ok(proposals) => {
                self.proposals = Some(proposals);
                Ok(true)
            }
            Err(e) => {
                self.proposals = None;
                Err(e)
            }
        }
    }

    pub async fn fetch<C: ApiClient + ?Sized>(&mut self, client: &C) -> Result<&OptimizationResponse> {
        let ticket = self.begin_fetch()?;
        let result = QuoteService::new(client)
            .fetch_optimization(&ticket.quote_id)
            .await;
        self.complete_fetch(&ticket, result)?;
        self.proposals()
            .ok_or_else(|| PqError::optimization_unavailable("Proposals were superseded"))
    }

    /// Reserve the apply slot and build the validated patch
    pub fn begin_apply(&mut self, mode: ModeKey) -> Result<(String, QuoteUpdatePatch)> {
        if self.in_flight {
            return Err(PqError::busy("Proposals are still loading"));
        }
        if self.applying {
            return Err(PqError::busy("Another proposal is being applied"));
        }
        let quote_id = self
            .quote_id
            .clone()
            .ok_or_else(|| PqError::optimization_unavailable("Save the quote before optimizing it"))?;
        let proposals = self
            .proposals
            .as_ref()
            .ok_or_else(|| PqError::optimization_unavailable("No proposals loaded"))?;

        let patch = build_patch(proposals.mode(mode));
        validate_patch(&patch)?;
        self.applying = true;
        Ok((quote_id, patch))
    }

    /// Release the apply slot; held proposals are stale after a success
    pub fn finish_apply(&mut self, success: bool) {
        self.applying = false;
        if success {
            self.proposals = None;
        }
    }

    /// Send the chosen proposal and reload the quote
    pub async fn apply<C: ApiClient + ?Sized>(&mut self, client: &C, mode: ModeKey) -> Result<Quote> {
        let (quote_id, patch) = self.begin_apply(mode)?;
        let service = QuoteService::new(client);

        let sent = service.patch(&quote_id, &patch).await;
        self.finish_apply(sent.is_ok());
        sent?;

        info!("Applied {} proposal to quote {}", mode, quote_id);
        service.get(&quote_id).await
    }
}

/// Partial update carrying only the fields a proposal changes
pub fn build_patch(mode: &OptimizationMode) -> QuoteUpdatePatch {
    let params = &mode.new_parameters;
    let results = &mode.results;
    QuoteUpdatePatch {
        printer: Some(PrinterPatch {
            speed: Some(params.speed),
        }),
        model: Some(ModelPatch {
            layer_height: Some(params.layer_height),
            infill: Some(params.infill),
            support_weight: Some(params.support_weight),
            print_time: Some(results.print_time),
        }),
        summary: Some(SummaryPatch {
            grams_used: Some(results.grams_used),
            grams_wasted: Some(results.grams_wasted),
            waste_percentage: Some(results.waste_percentage),
        }),
    }
}

fn non_negative(value: f64, key: &str) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PqError::validation_field(
            format!("{} must be a non-negative number", key),
            key,
        ))
    }
}

fn check_rule(rule: validation::NumberRule, value: f64, key: &str) -> Result<()> {
    match rule.check(value) {
        Some(message) => Err(PqError::validation_field(message, key)),
        None => Ok(()),
    }
}

/// Reject proposals the quote form itself would not accept
pub fn validate_patch(patch: &QuoteUpdatePatch) -> Result<()> {
    if let Some(printer) = &patch.printer {
        if let Some(speed) = printer.speed {
            check_rule(validation::PRINTER_SPEED, speed, "printer.speed")?;
        }
    }
    if let Some(model) = &patch.model {
        if let Some(layer_height) = model.layer_height {
            check_rule(validation::LAYER_HEIGHT, layer_height, "model.layer_height")?;
        }
        if let Some(infill) = model.infill {
            check_rule(validation::INFILL, infill, "model.infill")?;
        }
        if let Some(support_weight) = model.support_weight {
            non_negative(support_weight, "model.support_weight")?;
        }
        if let Some(print_time) = model.print_time {
            check_rule(validation::PRINT_TIME, print_time, "model.print_time")?;
        }
    }
    if let Some(summary) = &patch.summary {
        if let Some(grams_used) = summary.grams_used {
            non_negative(grams_used, "summary.grams_used")?;
        }
        if let Some(grams_wasted) = summary.grams_wasted {
            non_negative(grams_wasted, "summary.grams_wasted")?;
        }
        if let Some(waste) = summary.waste_percentage {
            non_negative(waste, "summary.waste_percentage")?;
            if waste > 100.0 {
                return Err(PqError::validation_field(
                    "summary.waste_percentage must be ≤ 100",
                    "summary.waste_percentage",
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::tests::mocks::MockApiClient;
    use crate::tests::utils::fixtures::{optimization_json, optimization_response, quote_json};
    use reqwest::Method;

    fn loaded_selector(id: &str) -> ProposalSelector {
        let mut selector = ProposalSelector::for_quote(Some(id));
        let ticket = selector.begin_fetch().unwrap();
        assert!(selector
            .complete_fetch(&ticket, Ok(optimization_response()))
            .unwrap());
        selector
    }

    #[test]
    fn test_patch_has_exactly_eight_fields() {
        let response = optimization_response();
        let patch = build_patch(response.mode(ModeKey::Fast));
        let value = serde_json::to_value(&patch).unwrap();

        let mut keys: Vec<String> = value
            .as_object()
            .unwrap()
            .iter()
            .flat_map(|(section, fields)| {
                fields
                    .as_object()
                    .unwrap()
                    .keys()
                    .map(move |k| format!("{}.{}", section, k))
            })
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "model.infill",
                "model.layer_height",
                "model.print_time",
                "model.support_weight",
                "printer.speed",
                "summary.grams_used",
                "summary.grams_wasted",
                "summary.waste_percentage",
            ]
        );
        assert_eq!(value["printer"]["speed"], 120.0);
    }

    #[test]
    fn test_unsaved_quote_cannot_fetch() {
        let mut selector = ProposalSelector::for_quote(None);
        let err = selector.begin_fetch().unwrap_err();
        assert_eq!(err.code(), ErrorCode::OptimizationUnavailable);
    }

    #[test]
    fn test_overlapping_fetches_keep_newest_in_order() {
        let mut selector = ProposalSelector::for_quote(Some("Q1"));
        let first = selector.begin_fetch().unwrap();
        let second = selector.begin_fetch().unwrap();

        let mut newer = optimization_response();
        newer.fast.new_parameters.speed = 99.0;

        assert!(selector.complete_fetch(&second, Ok(newer)).unwrap());
        assert!(!selector
            .complete_fetch(&first, Ok(optimization_response()))
            .unwrap());
        assert_eq!(selector.proposals().unwrap().fast.new_parameters.speed, 99.0);
        assert!(!selector.in_flight);
    }

    #[test]
    fn test_overlapping_fetches_keep_newest_reversed() {
        let mut selector = ProposalSelector::for_quote(Some("Q1"));
        let first = selector.begin_fetch().unwrap();
        let second = selector.begin_fetch().unwrap();

        assert!(!selector
            .complete_fetch(&first, Ok(optimization_response()))
            .unwrap());
        assert!(selector.proposals().is_none());
        assert!(selector.in_flight);

        let mut newer = optimization_response();
        newer.fast.new_parameters.speed = 99.0;
        assert!(selector.complete_fetch(&second, Ok(newer)).unwrap());
        assert_eq!(selector.proposals().unwrap().fast.new_parameters.speed, 99.0);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut selector = loaded_selector("Q1");
        let old = FetchTicket {
            quote_id: "Q1".to_string(),
            generation: 0,
        };
        assert!(!selector
            .complete_fetch(&old, Err(PqError::api(502, "late")))
            .unwrap());
        assert!(selector.proposals().is_some());
    }

    #[test]
    fn test_apply_while_fetching_is_busy() {
        let mut selector = loaded_selector("Q1");
        let _ticket = selector.begin_fetch().unwrap();
        let err = selector.begin_apply(ModeKey::Fast).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Busy);
    }

    #[test]
    fn test_second_apply_is_busy() {
        let mut selector = loaded_selector("Q1");
        selector.begin_apply(ModeKey::Fast).unwrap();
        let err = selector.begin_apply(ModeKey::Economic).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Busy);

        selector.finish_apply(false);
        assert!(selector.begin_apply(ModeKey::Economic).is_ok());
    }

    #[test]
    fn test_apply_without_proposals_is_unavailable() {
        let mut selector = ProposalSelector::for_quote(Some("Q1"));
        let err = selector.begin_apply(ModeKey::Balanced).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OptimizationUnavailable);
    }

    #[test]
    fn test_validate_patch_rejects_out_of_range() {
        let mut response = optimization_response();
        response.fast.new_parameters.speed = 450.0;
        let err = validate_patch(&build_patch(&response.fast)).unwrap_err();
        assert!(err.to_string().contains("Speed max = 300 mm/s"));

        response.fast.new_parameters.speed = 100.0;
        response.fast.results.grams_wasted = f64::NAN;
        assert!(validate_patch(&build_patch(&response.fast)).is_err());
    }

    #[tokio::test]
    async fn test_apply_economic_sends_its_speed_and_reloads() {
        let client = MockApiClient::new().with_auth();
        client.add_response(Method::GET, "/quotes/Q1/optimize", optimization_json());
        client.add_response(Method::PUT, "/quotes/Q1", serde_json::json!({"ok": true}));
        client.add_response(Method::GET, "/quotes/Q1", quote_json("Q1"));

        let mut selector = ProposalSelector::for_quote(Some("Q1"));
        let economic_speed = selector
            .fetch(&client)
            .await
            .unwrap()
            .economic
            .new_parameters
            .speed;

        let reloaded = selector.apply(&client, ModeKey::Economic).await.unwrap();
        assert_eq!(reloaded.id, "Q1");
        assert!(selector.proposals().is_none());
        assert!(!selector.applying);

        let put = client
            .requests()
            .into_iter()
            .find(|r| r.method == Method::PUT)
            .unwrap();
        let payload = put.payload.unwrap();
        assert_eq!(payload["printer"]["speed"], economic_speed);
        assert!(payload.get("commercial").is_none());
        assert!(payload["summary"].get("estimated_total_cost").is_none());

        let last = client.last_request().unwrap();
        assert_eq!((last.method, last.endpoint.as_str()), (Method::GET, "/quotes/Q1"));
    }

    #[tokio::test]
    async fn test_failed_apply_keeps_proposals() {
        let client = MockApiClient::new().with_auth();
        client.add_error(Method::PUT, "/quotes/Q1", PqError::api(500, "boom"));

        let mut selector = loaded_selector("Q1");
        assert!(selector.apply(&client, ModeKey::Fast).await.is_err());
        assert!(selector.proposals().is_some());
        assert!(!selector.applying);
    }
}
