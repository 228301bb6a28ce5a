//! Quote endpoints

use printquote_protocol::api::{QuoteCreateRequest, QuoteUpdatePatch, QuoteUpdateRequest};
use printquote_protocol::common::{OptimizationResponse, Quote};
use reqwest::Method;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{PqError, Result};

const QUOTES: &str = "/quotes/";

fn quote_path(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(PqError::invalid_input("Quote id cannot be empty"));
    }
    // ids go into the path verbatim, so only URL-unreserved characters pass
    if let Some(bad) = id
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
    {
        return Err(PqError::invalid_input(format!(
            "Quote id '{}' contains '{}', which is not allowed",
            id, bad
        )));
    }
    Ok(format!("/quotes/{}", id))
}

/// Typed access to `/quotes`
pub struct QuoteService<'a, C: ApiClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ApiClient + ?Sized> QuoteService<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &'a C {
        self.client
    }

    pub async fn list(&self) -> Result<Vec<Quote>> {
        let quotes: Vec<Quote> = self
            .client
            .authenticated_request::<(), _>(Method::GET, QUOTES, None)
            .await?;
        debug!("Loaded {} quote(s)", quotes.len());
        Ok(quotes)
    }

    pub async fn get(&self, id: &str) -> Result<Quote> {
        let path = quote_path(id)?;
        self.client
            .authenticated_request::<(), _>(Method::GET, &path, None)
            .await
    }

    pub async fn create(&self, request: &QuoteCreateRequest) -> Result<Quote> {
        let quote: Quote = self
            .client
            .authenticated_request(Method::POST, QUOTES, Some(request))
            .await?;
        info!("Created quote {} ({})", quote.quote_name, quote.id);
        Ok(quote)
    }

    /// Full replacement
    pub async fn update(&self, id: &str, request: &QuoteUpdateRequest) -> Result<Quote> {
        let path = quote_path(id)?;
        let quote: Quote = self
            .client
            .authenticated_request(Method::PUT, &path, Some(request))
            .await?;
        info!("Updated quote {}", quote.id);
        Ok(quote)
    }

    /// Partial update; the response body is not trusted for unsent fields
    pub async fn patch(&self, id: &str, patch: &QuoteUpdatePatch) -> Result<()> {
        if patch.is_empty() {
            return Err(PqError::invalid_input("Nothing to update"));
        }
        let path = quote_path(id)?;
        let _: serde_json::Value = self
            .client
            .authenticated_request(Method::PUT, &path, Some(patch))
            .await?;
        info!("Patched quote {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = quote_path(id)?;
        let _: serde_json::Value = self
            .client
            .authenticated_request::<(), _>(Method::DELETE, &path, None)
            .await?;
        info!("Deleted quote {}", id);
        Ok(())
    }

    pub async fn fetch_optimization(&self, id: &str) -> Result<OptimizationResponse> {
        let path = format!("{}/optimize", quote_path(id)?);
        self.client
            .authenticated_request::<(), _>(Method::GET, &path, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::MockApiClient;
    use crate::tests::utils::fixtures::{optimization_json, quote_json, sample_request};

    #[tokio::test]
    async fn test_list_and_get() {
        let client = MockApiClient::new().with_auth();
        client.add_response(Method::GET, "/quotes/", serde_json::json!([quote_json("q-1"), quote_json("q-2")]));
        client.add_response(Method::GET, "/quotes/q-2", quote_json("q-2"));

        let service = QuoteService::new(&client);
        let quotes = service.list().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(service.get("q-2").await.unwrap().id, "q-2");
    }

    #[tokio::test]
    async fn test_list_survives_unknown_option_value() {
        let client = MockApiClient::new().with_auth();
        let mut odd = quote_json("q-2");
        odd["printer"]["nozzle"] = serde_json::json!("0.3");
        client.add_response(Method::GET, "/quotes/", serde_json::json!([quote_json("q-1"), odd]));

        let quotes = QuoteService::new(&client).list().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert!(quotes[0].printer.nozzle.is_some());
        assert_eq!(quotes[1].printer.nozzle, None);
    }

    #[tokio::test]
    async fn test_create_sends_payload() {
        let client = MockApiClient::new().with_auth();
        client.add_response(Method::POST, "/quotes/", quote_json("q-9"));

        let service = QuoteService::new(&client);
        let created = service.create(&sample_request()).await.unwrap();
        assert_eq!(created.id, "q-9");

        let sent = client.last_request().unwrap();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.payload.unwrap()["printer"]["nozzle"], "0.4");
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let client = MockApiClient::new().with_auth();
        client.add_response(Method::DELETE, "/quotes/q-1", serde_json::Value::Null);

        QuoteService::new(&client).delete("q-1").await.unwrap();
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_errors_surface_unchanged() {
        let client = MockApiClient::new().with_auth();
        client.add_error(Method::GET, "/quotes/missing", PqError::not_found("Quote not found"));

        let err = QuoteService::new(&client).get("missing").await.unwrap_err();
        assert!(matches!(err, PqError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_locally() {
        let client = MockApiClient::new().with_auth();
        let service = QuoteService::new(&client);
        assert!(service.get("  ").await.is_err());
        assert!(service.fetch_optimization("").await.is_err());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_id_cannot_escape_its_path_segment() {
        let client = MockApiClient::new().with_auth();
        let service = QuoteService::new(&client);

        for id in ["q-1/optimize", "q-1?admin=1", "q-1#x", "q 1", "../users"] {
            let err = service.get(id).await.unwrap_err();
            assert!(matches!(err, PqError::InvalidInput { .. }), "{} was accepted", id);
        }
        assert!(service.delete("a/b").await.is_err());
        assert!(client.requests().is_empty());

        assert_eq!(quote_path("665f1c2e9b1d4a0012ab34cd").unwrap(), "/quotes/665f1c2e9b1d4a0012ab34cd");
    }

    #[tokio::test]
    async fn test_fetch_optimization_route() {
        let client = MockApiClient::new().with_auth();
        client.add_response(Method::GET, "/quotes/q-1/optimize", optimization_json());

        let proposals = QuoteService::new(&client).fetch_optimization("q-1").await.unwrap();
        assert_eq!(proposals.fast.new_parameters.speed, 120.0);
    }
}
