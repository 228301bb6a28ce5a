//! API DTOs module
//!
//! This module contains the request bodies organized by domain:
//! - `auth`: login and registration
//! - `quote`: quote creation, full replacement and partial updates

pub mod auth;
pub mod quote;

pub use auth::*;
pub use quote::*;
