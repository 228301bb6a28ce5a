//! HTTP client implementations for the quote backend

use printquote_protocol::api::{LoginRequest, RegisterRequest};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::AuthClient;
use crate::config::ClientConfig;
use crate::error::{PqError, Result};
use crate::session::Session;

/// Operations every backend client offers
///
/// Implemented by [`HttpClient`] and by the mock used in tests.
#[allow(async_fn_in_trait)]
pub trait ApiClient {
    async fn is_authenticated(&self) -> bool;

    async fn login(&self, request: &LoginRequest) -> Result<()>;

    async fn register(&self, request: &RegisterRequest) -> Result<()>;

    async fn logout(&self) -> Result<()>;

    /// Send a request under the API prefix with the bearer token attached
    async fn authenticated_request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned;
}

/// Human-readable detail of an error body
///
/// Accepts `{"detail": "..."}`, FastAPI validation arrays under `detail`,
/// and `{"message": "..."}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.clone())
        }
        Some(serde_json::Value::Array(items)) if !items.is_empty() => {
            let parts: Vec<String> = items.iter().map(render_validation_item).collect();
            return Some(parts.join("; "));
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn render_validation_item(item: &serde_json::Value) -> String {
    let msg = item
        .get("msg")
        .and_then(|m| m.as_str())
        .unwrap_or("invalid value");
    let location: Vec<String> = item
        .get("loc")
        .and_then(|l| l.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter(|p| p.as_str() != Some("body"))
                .map(|p| match p {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    if location.is_empty() {
        msg.to_string()
    } else {
        format!("{}: {}", location.join("."), msg)
    }
}

/// Fallback detail when the body has none
pub fn status_text(status: StatusCode) -> String {
    format!(
        "{}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

/// Map a non-success response to an error kind
pub fn classify_error(status: StatusCode, body: &str) -> PqError {
    let detail = extract_detail(body).unwrap_or_else(|| status_text(status));
    match status {
        StatusCode::UNAUTHORIZED => PqError::authentication(detail),
        StatusCode::FORBIDDEN => PqError::authorization(detail),
        StatusCode::NOT_FOUND => PqError::not_found(detail),
        StatusCode::CONFLICT => PqError::conflict(detail),
        _ => PqError::api(status.as_u16(), detail),
    }
}

/// Parse a success body; an empty body reads as JSON `null`
pub fn decode_body<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| {
        PqError::invalid_response(status.as_u16(), format!("Invalid API response: {}", e))
    })
}

/// Base HTTP client for unauthenticated operations
#[derive(Debug, Clone)]
pub struct BaseClient {
    pub(crate) client: Client,
    config: ClientConfig,
}

impl BaseClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client, config })
    }

    pub(crate) fn builder<T>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&T>,
    ) -> RequestBuilder
    where
        T: Serialize + ?Sized,
    {
        let mut request_builder = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        if let Some(data) = payload {
            request_builder = request_builder.json(data);
        }
        request_builder
    }

    /// Send and read the body; only transport failures are errors here
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Response {}", status);
        Ok((status, text))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// HTTP client with authentication support
#[derive(Debug)]
pub struct HttpClient {
    base_client: BaseClient,
    auth_client: Mutex<AuthClient>,
}

impl HttpClient {
    /// Client using the session stored on disk
    pub fn new(config: ClientConfig) -> Result<Self> {
        let session = Session::load(&config)?;
        Self::with_session(config, session)
    }

    pub fn with_session(config: ClientConfig, session: Session) -> Result<Self> {
        let base_client = BaseClient::new(config.clone())?;
        let auth_client = AuthClient::new(config, session)?;
        Ok(Self {
            base_client,
            auth_client: Mutex::new(auth_client),
        })
    }

    pub async fn resolve(&self, route: crate::session::Route) -> crate::session::Route {
        self.auth_client.lock().await.session().resolve(route)
    }
}

impl ApiClient for HttpClient {
    async fn is_authenticated(&self) -> bool {
        self.auth_client.lock().await.is_authenticated()
    }

    async fn login(&self, request: &LoginRequest) -> Result<()> {
        self.auth_client.lock().await.login(request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.auth_client.lock().await.register(request).await
    }

    async fn logout(&self) -> Result<()> {
        self.auth_client.lock().await.logout()
    }

    async fn authenticated_request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let access_token = self.auth_client.lock().await.access_token()?;

        let url = self.base_client.config().api_url(endpoint);
        debug!("{} {}", method, url);

        let request = self
            .base_client
            .builder(method, &url, payload)
            .header("Authorization", format!("Bearer {}", access_token));
        let (status, text) = self.base_client.execute(request).await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("Server rejected the session token, clearing it");
            self.auth_client.lock().await.invalidate()?;
            let detail = extract_detail(&text)
                .unwrap_or_else(|| "Session expired, please log in again".to_string());
            return Err(PqError::session_expired(detail));
        }

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        decode_body(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::session::Route;
    use printquote_protocol::common::TokenResponse;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_extract_detail_variants() {
        assert_eq!(
            extract_detail(r#"{"detail": "Quote not found"}"#),
            Some("Quote not found".to_string())
        );
        assert_eq!(
            extract_detail(r#"{"message": "Bad things"}"#),
            Some("Bad things".to_string())
        );
        assert_eq!(extract_detail("<html>oops</html>"), None);
        assert_eq!(extract_detail(r#"{"detail": ""}"#), None);
    }

    #[test]
    fn test_extract_detail_renders_validation_array() {
        let body = r#"{"detail": [
            {"loc": ["body", "printer", "speed"], "msg": "ensure this value is less than or equal to 300", "type": "value_error"},
            {"loc": ["body", "quote_name"], "msg": "field required", "type": "value_error.missing"}
        ]}"#;
        assert_eq!(
            extract_detail(body).unwrap(),
            "printer.speed: ensure this value is less than or equal to 300; quote_name: field required"
        );
    }

    #[test]
    fn test_classify_error_by_status() {
        let err = classify_error(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, PqError::Authentication { .. }));

        let err = classify_error(StatusCode::FORBIDDEN, r#"{"detail": "Not yours"}"#);
        assert!(matches!(err, PqError::Authorization { ref message, .. } if message == "Not yours"));

        let err = classify_error(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, PqError::NotFound { ref resource, .. } if resource == "404: Not Found"));

        let err = classify_error(StatusCode::CONFLICT, r#"{"message": "exists"}"#);
        assert!(matches!(err, PqError::Conflict { .. }));

        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(
            matches!(err, PqError::Api { status: 500, ref message, .. } if message == "500: Internal Server Error")
        );
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let _unit: () = decode_body(StatusCode::NO_CONTENT, "").unwrap();

        let value: serde_json::Value = decode_body(StatusCode::OK, r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);

        let err = decode_body::<Vec<String>>(StatusCode::OK, "{").unwrap_err();
        assert!(matches!(err, PqError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_protected_request_requires_session() {
        let client = HttpClient::with_session(ClientConfig::default(), Session::in_memory()).unwrap();
        assert!(!client.is_authenticated().await);

        let err = client
            .authenticated_request::<(), serde_json::Value>(Method::GET, "/quotes/", None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotLoggedIn);
    }

    /// Serve one canned HTTP response on a local port
    async fn serve_once(status_line: &'static str, body: &'static str) -> ClientConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        ClientConfig {
            base_url: format!("http://{}", addr),
            ..ClientConfig::default()
        }
    }

    fn logged_in() -> Session {
        let mut session = Session::in_memory();
        session
            .establish(TokenResponse {
                access_token: "stale-token".to_string(),
                token_type: "bearer".to_string(),
            })
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_unauthorized_response_clears_session() {
        let config = serve_once("401 Unauthorized", r#"{"detail": "Token expired"}"#).await;
        let client = HttpClient::with_session(config, logged_in()).unwrap();
        assert!(client.is_authenticated().await);

        let err = client
            .authenticated_request::<(), serde_json::Value>(Method::GET, "/quotes/", None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SessionExpired);
        assert!(err.to_string().contains("Token expired"));
        assert!(!client.is_authenticated().await);
        assert_eq!(client.resolve(Route::Quotes).await, Route::Login);
    }

    #[tokio::test]
    async fn test_forbidden_response_keeps_session() {
        let config = serve_once("403 Forbidden", r#"{"detail": "Not your quote"}"#).await;
        let client = HttpClient::with_session(config, logged_in()).unwrap();

        let err = client
            .authenticated_request::<(), serde_json::Value>(Method::GET, "/quotes/q-9", None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::AuthorizationDenied);
        assert!(matches!(err, PqError::Authorization { ref message, .. } if message == "Not your quote"));
        assert!(client.is_authenticated().await);
    }
}
