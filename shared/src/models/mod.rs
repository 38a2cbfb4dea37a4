//! Domain models for the shop dashboard

mod business;
mod inventory;
mod product;

pub use business::*;
pub use inventory::*;
pub use product::*;
