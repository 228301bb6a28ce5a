pub mod auth;
pub mod optimization;
pub mod options;
pub mod quote;

pub use auth::*;
pub use optimization::*;
pub use options::*;
pub use quote::*;
