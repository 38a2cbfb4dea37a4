//! HTTP handlers

pub mod assistant;
pub mod context;
pub mod health;
pub mod inventory;
pub mod pricing;
pub mod product;

pub use assistant::*;
pub use context::*;
pub use health::*;
pub use inventory::*;
pub use pricing::*;
pub use product::*;
