//! Wire types for the printquote backend
//!
//! - `common`: entities returned by the backend (quotes, option sets, proposals, tokens)
//! - `api`: request bodies sent by the client

pub mod api;
pub mod common;
