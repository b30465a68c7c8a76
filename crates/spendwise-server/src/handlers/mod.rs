//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod budgets;
pub mod categories;
pub mod chat;
pub mod goals;
pub mod predictions;
pub mod reports;
pub mod smart;
pub mod transactions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use budgets::*;
pub use categories::*;
pub use chat::*;
pub use goals::*;
pub use predictions::*;
pub use reports::*;
pub use smart::*;
pub use transactions::*;
