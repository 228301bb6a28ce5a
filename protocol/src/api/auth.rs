//! Authentication API DTOs
//!
//! Request bodies for `/auth/token` and `/auth/register`. Both endpoints answer
//! with a [`TokenResponse`].

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::TokenResponse;

// ============================================================================
// Login DTOs
// ============================================================================

/// Login request; `identifier` is a username or an email address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub identifier: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
}

// ============================================================================
// Registration DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
}
