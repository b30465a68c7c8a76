//! Spendwise CLI - Personal finance analytics
//!
//! Usage:
//!   spendwise init                      Initialize database
//!   spendwise import --file CSV         Import transactions
//!   spendwise analyze anomalies         Flag unusual transactions
//!   spendwise serve --port 3000         Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user.as_str();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, user),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, user, &file)
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_transactions_list(&db, user, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, user, limit)
                }
                Some(TransactionsAction::Add {
                    amount,
                    category,
                    transaction_type,
                    date,
                    description,
                }) => commands::cmd_transactions_add(
                    &db,
                    user,
                    amount,
                    &transaction_type,
                    &category,
                    date.as_deref(),
                    description.as_deref(),
                ),
                Some(TransactionsAction::Edit {
                    id,
                    amount,
                    category,
                    transaction_type,
                    date,
                    description,
                }) => commands::cmd_transactions_edit(
                    &db,
                    user,
                    id,
                    amount,
                    transaction_type.as_deref(),
                    category.as_deref(),
                    date.as_deref(),
                    description.as_deref(),
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, user, id)
                }
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_categories_list(&db, user, None),
                Some(CategoriesAction::List { transaction_type }) => {
                    commands::cmd_categories_list(&db, user, transaction_type.as_deref())
                }
                Some(CategoriesAction::Add {
                    name,
                    transaction_type,
                    kind,
                }) => commands::cmd_categories_add(
                    &db,
                    user,
                    &name,
                    &transaction_type,
                    kind.as_deref(),
                ),
                Some(CategoriesAction::Rename { id, name }) => {
                    commands::cmd_categories_rename(&db, user, id, &name)
                }
                Some(CategoriesAction::Delete { id }) => {
                    commands::cmd_categories_delete(&db, user, id)
                }
            }
        }
        Commands::Budgets { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_budgets_list(&db, user, None, None),
                Some(BudgetsAction::List { month, year }) => {
                    commands::cmd_budgets_list(&db, user, month, year)
                }
                Some(BudgetsAction::Set {
                    category,
                    amount,
                    month,
                    year,
                }) => commands::cmd_budgets_set(&db, user, &category, amount, month, year),
            }
        }
        Commands::Goals { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(GoalsAction::List) => commands::cmd_goals_list(&db, user),
                Some(GoalsAction::Add {
                    name,
                    target,
                    deadline,
                    priority,
                }) => commands::cmd_goals_add(
                    &db,
                    user,
                    &name,
                    target,
                    deadline.as_deref(),
                    priority,
                ),
                Some(GoalsAction::Contribute { id, amount, note }) => {
                    commands::cmd_goals_contribute(&db, user, id, amount, note.as_deref())
                }
                Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&db, user, id),
            }
        }
        Commands::Analyze { kind, as_of, json } => {
            let db = commands::open_db(&cli.db)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_analyze(&db, &config, user, &kind, as_of.as_deref(), json)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                cli.config.as_deref(),
                &host,
                port,
                no_auth,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
