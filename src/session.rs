//! Session state and navigation
//!
//! A [`Session`] owns the bearer token of one user. It is created per client
//! and handed to it explicitly, so several sessions can coexist in one process.
//! Every command names the view it wants; [`Session::resolve`] decides where
//! the user actually lands.

use chrono::Utc;
use printquote_protocol::common::TokenResponse;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::store::{StoredToken, TokenStore, TokenStoreConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Destinations a command can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Quotes,
}

#[derive(Debug)]
pub struct Session {
    token: Option<StoredToken>,
    store: Option<TokenStore>,
}

impl Session {
    /// Session backed by the configured token file
    pub fn load(config: &ClientConfig) -> Result<Self> {
        if !config.token_storage.enabled {
            return Ok(Self::in_memory());
        }
        let store_config: TokenStoreConfig = config.token_storage.clone().into();
        let store = TokenStore::new(store_config)?;
        Ok(Self {
            token: store.get_token(),
            store: Some(store),
        })
    }

    /// Session that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            token: None,
            store: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn stored_token(&self) -> Option<&StoredToken> {
        self.token.as_ref()
    }

    /// Login or registration succeeded
    pub fn establish(&mut self, response: TokenResponse) -> Result<()> {
        let token = StoredToken {
            access_token: response.access_token,
            token_type: response.token_type,
            stored_at: Utc::now(),
        };
        if let Some(store) = &mut self.store {
            store.store_token(token.clone())?;
        }
        self.token = Some(token);
        debug!("Session established");
        Ok(())
    }

    /// Logout, or the server rejected the token
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        if let Some(store) = &mut self.store {
            store.remove_token()?;
        }
        debug!("Session cleared");
        Ok(())
    }

    /// Where a request for `route` ends up in the current state
    pub fn resolve(&self, route: Route) -> Route {
        match (self.state(), route) {
            (SessionState::Anonymous, Route::Register) => Route::Register,
            (SessionState::Anonymous, _) => Route::Login,
            (SessionState::Authenticated, _) => Route::Quotes,
        }
    }
}
