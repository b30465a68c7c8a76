//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, load_config, date parsing)
//! - `import` - CSV transaction import
//! - `transactions` - Transaction commands (list, add, delete)
//! - `categories` - Category commands (list, add)
//! - `budgets` - Budget commands (list with status, set)
//! - `goals` - Savings goal commands (list with progress, add, contribute, delete)
//! - `analyze` - Terminal rendering of every analytics engine
//! - `serve` - Web server command

pub mod analyze;
pub mod budgets;
pub mod categories;
pub mod core;
pub mod goals;
pub mod import;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use analyze::*;
pub use budgets::*;
pub use categories::*;
pub use core::*;
pub use goals::*;
pub use import::*;
pub use serve::*;
pub use transactions::*;

/// Truncate a string to max length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
