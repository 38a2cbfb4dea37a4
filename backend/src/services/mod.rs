//! Business logic services for the shop dashboard

pub mod assistant;
pub mod context;
pub mod inventory;
pub mod pricing;
pub mod product;

pub use assistant::AssistantService;
pub use context::ContextService;
pub use inventory::InventoryService;
pub use product::ProductService;
