//! The quote workspace: list, current quote, draft and proposals
//!
//! The list is reloaded wholesale after every successful mutation and left
//! alone when a mutation fails. A reload that fails after a saved mutation is
//! logged; the mutation still counts as done.

use printquote_protocol::common::{ModeKey, OptimizationResponse, Quote};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::draft::QuoteDraft;
use crate::error::Result;
use crate::optimize::ProposalSelector;
use crate::quotes::QuoteService;

pub struct QuoteWorkspace<'a, C: ApiClient + ?Sized> {
    service: QuoteService<'a, C>,
    quotes: Vec<Quote>,
    current: Option<Quote>,
    draft: QuoteDraft,
    selector: ProposalSelector,
}

impl<'a, C: ApiClient + ?Sized> QuoteWorkspace<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            service: QuoteService::new(client),
            quotes: Vec::new(),
            current: None,
            draft: QuoteDraft::new(),
            selector: ProposalSelector::new(),
        }
    }

    pub fn draft_mut(&mut self) -> &mut QuoteDraft {
        &mut self.draft
    }

    pub async fn refresh(&mut self) -> Result<&[Quote]> {
        self.quotes = self.service.list().await?;
        debug!("Workspace holds {} quote(s)", self.quotes.len());
        Ok(&self.quotes)
    }

    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!("Quote list refresh failed: {}", e);
        }
    }

    /// Start a blank draft
    pub fn open_new(&mut self) {
        self.current = None;
        self.draft = QuoteDraft::new();
        self.selector = ProposalSelector::new();
    }

    /// Start with a prepared draft, e.g. one read from a file
    pub fn open_draft(&mut self, draft: QuoteDraft) {
        self.selector = ProposalSelector::for_quote(draft.id());
        self.draft = draft;
    }

    /// Load a quote for editing
    pub async fn open(&mut self, id: &str) -> Result<&Quote> {
        let quote = self.service.get(id).await?;
        Ok(self.set_current(quote))
    }

    fn set_current(&mut self, quote: Quote) -> &Quote {
        self.draft = QuoteDraft::from_quote(&quote);
        self.selector = ProposalSelector::for_quote(Some(&quote.id));
        self.current.insert(quote)
    }

    /// Validate the draft and create or update the quote
    ///
    /// A created quote becomes current and the draft starts over; an updated
    /// quote is reloaded into the draft.
    pub async fn submit(&mut self) -> Result<&Quote> {
        let payload = self.draft.submit()?;

        let saved = match self.draft.id().map(str::to_string) {
            Some(id) => {
                let updated = self.service.update(&id, &payload).await?;
                self.draft = QuoteDraft::from_quote(&updated);
                updated
            }
            None => {
                let created = self.service.create(&payload).await?;
                self.draft.reset();
                created
            }
        };
        self.selector = ProposalSelector::for_quote(Some(&saved.id));
        self.reload_after_mutation().await;
        Ok(self.current.insert(saved))
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.service.delete(id).await?;
        if self.current.as_ref().is_some_and(|q| q.id == id) {
            self.open_new();
        }
        self.reload_after_mutation().await;
        Ok(())
    }

    pub async fn fetch_proposals(&mut self) -> Result<&OptimizationResponse> {
        let client = self.service.client();
        self.selector.fetch(client).await
    }

    /// Apply a proposal; the quote is reloaded from the server afterwards
    pub async fn apply_proposal(&mut self, mode: ModeKey) -> Result<&Quote> {
        let client = self.service.client();
        let reloaded = self.selector.apply(client, mode).await?;
        self.draft = QuoteDraft::from_quote(&reloaded);
        self.reload_after_mutation().await;
        Ok(self.current.insert(reloaded))
    }
}
