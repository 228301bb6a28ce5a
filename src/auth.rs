//! Authentication against the quote backend

use dialoguer::{Input, Password};
use printquote_protocol::api::{LoginRequest, RegisterRequest};
use printquote_protocol::common::TokenResponse;
use reqwest::Method;
use tracing::info;
use validator::Validate;

use crate::client::{decode_body, extract_detail, ApiClient, BaseClient, HttpClient};
use crate::config::{ClientConfig, Config};
use crate::error::{PqError, Result};
use crate::session::{Route, Session};
use crate::ui::UI;

const LOGIN_FAILED: &str = "Invalid username or password";
const REGISTER_FAILED: &str = "Registration failed";
const CONNECTION_ERROR: &str = "Connection error";

/// Keep the transport sub-code but show a plain message
fn connection_error(err: PqError) -> PqError {
    match err {
        PqError::Network { code, source, .. } => PqError::Network {
            code,
            message: CONNECTION_ERROR.to_string(),
            source,
        },
        other => other,
    }
}

/// Authentication client
///
/// Owns the session; every token change goes through here.
#[derive(Debug)]
pub struct AuthClient {
    base_client: BaseClient,
    session: Session,
}

impl AuthClient {
    pub fn new(config: ClientConfig, session: Session) -> Result<Self> {
        let base_client = BaseClient::new(config)?;
        Ok(Self {
            base_client,
            session,
        })
    }

    async fn token_request<T>(&self, endpoint: &str, payload: &T, fallback: &str) -> Result<TokenResponse>
    where
        T: serde::Serialize,
    {
        let url = self.base_client.config().endpoint_url(endpoint);
        let request = self.base_client.builder(Method::POST, &url, Some(payload));
        let (status, text) = self
            .base_client
            .execute(request)
            .await
            .map_err(connection_error)?;

        if !status.is_success() {
            let detail = extract_detail(&text).unwrap_or_else(|| fallback.to_string());
            return Err(PqError::authentication(detail));
        }
        decode_body(status, &text)
    }

    pub async fn login(&mut self, request: &LoginRequest) -> Result<()> {
        request.validate()?;
        let token = self.token_request("/auth/token", request, LOGIN_FAILED).await?;
        self.session.establish(token)?;
        info!("Logged in as {}", request.identifier);
        Ok(())
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<()> {
        check_registration(request)?;
        let token = self
            .token_request("/auth/register", request, REGISTER_FAILED)
            .await?;
        self.session.establish(token)?;
        info!("Registered {}", request.username);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.clear()
    }

    /// Drop a token the server no longer accepts
    pub fn invalidate(&mut self) -> Result<()> {
        self.session.clear()
    }

    pub fn access_token(&self) -> Result<String> {
        self.session
            .token()
            .map(str::to_string)
            .ok_or_else(PqError::not_logged_in)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether anything answers at the configured endpoint
    pub async fn ping(&self) -> Result<()> {
        let url = self.base_client.config().endpoint_url("/");
        let request = self.base_client.builder::<()>(Method::GET, &url, None);
        self.base_client.execute(request).await.map(|_| ())
    }
}

/// Local checks run before a registration is sent
pub fn check_registration(request: &RegisterRequest) -> Result<()> {
    if request.password != request.confirm_password {
        return Err(PqError::validation_field("Passwords do not match", "confirm_password"));
    }
    request.validate()?;
    Ok(())
}

pub struct StatusInfo {
    pub version: String,
    pub authenticated: bool,
    pub endpoint: String,
    pub stored_at: Option<String>,
    pub server_connected: bool,
    pub server_status_msg: String,
}

/// CLI-facing authentication flows
pub struct AuthService {
    config: Config,
    ui: UI,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ui: UI::new(),
        }
    }

    pub fn client(&self) -> Result<HttpClient> {
        HttpClient::new(self.config.to_client_config()?)
    }

    /// Client for a protected command; anonymous sessions are sent to login
    pub async fn get_authenticated_client(&self) -> Result<HttpClient> {
        let client = self.client()?;
        match client.resolve(Route::Quotes).await {
            Route::Quotes => Ok(client),
            _ => Err(PqError::not_logged_in()),
        }
    }

    pub async fn login(&self, identifier: Option<String>) -> Result<()> {
        let client = self.client()?;
        if client.resolve(Route::Login).await != Route::Login {
            self.ui
                .info("Already logged in. Run `printquote logout` to switch accounts.");
            return Ok(());
        }

        let identifier = match identifier {
            Some(identifier) => identifier,
            None => Input::<String>::new()
                .with_prompt("Username or email")
                .interact_text()?,
        };
        let password = Password::new().with_prompt("Password").interact()?;

        let request = LoginRequest {
            identifier: identifier.trim().to_string(),
            password,
        };
        client.login(&request).await?;
        self.ui.success("Login successful");
        Ok(())
    }

    pub async fn register(&self) -> Result<()> {
        let client = self.client()?;
        if client.resolve(Route::Register).await != Route::Register {
            self.ui
                .info("Already logged in. Run `printquote logout` to create another account.");
            return Ok(());
        }

        let username: String = Input::new().with_prompt("Username").interact_text()?;
        let email: String = Input::new().with_prompt("Email").interact_text()?;
        let password = Password::new().with_prompt("Password").interact()?;
        let confirm_password = Password::new().with_prompt("Confirm password").interact()?;

        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password,
            confirm_password,
        };
        client.register(&request).await?;
        self.ui.success("Account created, you are now logged in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let client = self.client()?;
        if !client.is_authenticated().await {
            self.ui.info("Not logged in");
            return Ok(());
        }
        client.logout().await?;
        self.ui.success("Logged out");
        Ok(())
    }

    pub async fn get_status(&self) -> Result<StatusInfo> {
        let client_config = self.config.to_client_config()?;
        let session = Session::load(&client_config)?;
        let stored_at = session
            .stored_token()
            .map(|t| t.stored_at.format("%Y-%m-%d %H:%M UTC").to_string());
        let authenticated = session.is_authenticated();

        let auth_client = AuthClient::new(client_config.clone(), session)?;
        let (server_connected, server_status_msg) = match auth_client.ping().await {
            Ok(()) => (true, String::new()),
            Err(e) => (false, connection_error(e).to_string()),
        };

        Ok(StatusInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            authenticated,
            endpoint: client_config.base_url,
            stored_at,
            server_connected,
            server_status_msg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn register_request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: "maker".to_string(),
            email: "maker@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn unreachable_config() -> ClientConfig {
        ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: 2,
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_registration_password_mismatch() {
        let err = check_registration(&register_request("secret1", "secret2")).unwrap_err();
        assert!(err.to_string().contains("Passwords do not match"));
        assert!(check_registration(&register_request("secret1", "secret1")).is_ok());
    }

    #[test]
    fn test_registration_field_rules() {
        let mut request = register_request("abc", "abc");
        assert!(check_registration(&request).is_err());

        request = register_request("secret1", "secret1");
        request.email = "not-an-email".to_string();
        assert!(check_registration(&request).is_err());
    }

    #[test]
    fn test_connection_error_keeps_kind() {
        let err = connection_error(PqError::Network {
            code: ErrorCode::ConnectionRefused,
            message: "tcp connect error".to_string(),
            source: None,
        });
        assert_eq!(err.code(), ErrorCode::ConnectionRefused);
        assert!(err.to_string().contains("Connection error"));

        let other = connection_error(PqError::authentication("nope"));
        assert_eq!(other.code(), ErrorCode::AuthenticationFailed);
    }

    #[test]
    fn test_access_token_requires_session() {
        let client = AuthClient::new(ClientConfig::default(), Session::in_memory()).unwrap();
        assert!(!client.is_authenticated());
        assert!(client.access_token().is_err());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let mut client = AuthClient::new(unreachable_config(), Session::in_memory()).unwrap();
        let request = LoginRequest {
            identifier: "maker".to_string(),
            password: "secret1".to_string(),
        };

        let err = client.login(&request).await.unwrap_err();
        assert!(matches!(err, PqError::Network { .. }));
        assert!(!client.is_authenticated());
    }
}
