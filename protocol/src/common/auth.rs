//! Authentication-related common types

use serde::{Deserialize, Serialize};

/// Token issued by `/auth/token` and `/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
