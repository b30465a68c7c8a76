//! Spendwise Core Library
//!
//! Shared functionality for the Spendwise personal finance tool:
//! - Database access and migrations (transactions, categories, budgets, reports)
//! - CSV transaction import with deduplication
//! - Rule-based analytics engines (anomalies, health score, forecasts,
//!   budget advice, spending patterns, savings)
//! - Analytics configuration loaded from TOML
//! - Pluggable LLM backend for chat and narrative insights

pub mod ai;
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;

/// Test utilities: transaction fixtures and a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, AiLimits, Assistant, MockBackend, OpenAICompatibleBackend};
pub use analytics::{AnalyticsService, Outcome, Period};
pub use config::AnalyticsConfig;
pub use db::{Database, TransactionInsertResult};
pub use error::{Error, Result};
pub use import::{import_csv, ImportStats};
