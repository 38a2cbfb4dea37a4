//! Shared types, pricing math and validation for the shop dashboard
//!
//! This crate is used by the backend service and, through WASM, by the
//! browser for live price previews. Both sides use the same math.

pub mod currency;
pub mod models;
pub mod pricing;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
