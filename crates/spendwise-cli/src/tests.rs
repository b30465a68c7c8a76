//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::Path;

use spendwise_core::db::Database;
use spendwise_core::models::{TransactionQuery, TransactionType};
use spendwise_core::AnalyticsConfig;

use crate::cli::AnalyzeKind;
use crate::commands::{self, truncate};

const USER: &str = "local";
const AS_OF: Option<&str> = Some("2024-03-31");

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_categories(USER).unwrap();
    db
}

/// Three months of salary, rent and groceries, plus one large purchase in March
fn history_csv() -> String {
    let mut csv = String::from("date,type,amount,category,description\n");
    for month in 1..=3 {
        csv.push_str(&format!("2024-{:02}-01,income,3000,Salary,Paycheck\n", month));
        csv.push_str(&format!("2024-{:02}-02,expense,900,Housing,Rent\n", month));
        for day in [5, 12, 19, 26] {
            csv.push_str(&format!(
                "2024-{:02}-{:02},expense,20,Food,Groceries\n",
                month, day
            ));
        }
    }
    csv.push_str("2024-03-15,expense,2500,Shopping,Laptop\n");
    csv
}

fn write_csv(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("transactions.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn seeded_history() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), &history_csv());
    let db = setup_test_db();
    commands::cmd_import(&db, USER, &csv).unwrap();
    (dir, db)
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long string that exceeds", 10), "a long ..."); // 7 chars + "..."
    assert_eq!(truncate("exact", 5), "exact");
    assert_eq!(truncate("toolong", 6), "too...");
    assert_eq!(truncate("Café crème", 7), "Café...");
}

#[test]
fn test_parse_date_arg() {
    let date = commands::parse_date_arg(Some("2024-02-29")).unwrap();
    assert_eq!(date.to_string(), "2024-02-29");
    assert!(commands::parse_date_arg(Some("2024-02-30")).is_err());
    assert!(commands::parse_date_arg(Some("yesterday")).is_err());
    assert!(commands::parse_date_arg(None).is_ok());
}

// ========== Init Tests ==========

#[test]
fn test_cmd_init_seeds_categories() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    commands::cmd_init(&db_path, USER).unwrap();
    assert!(db_path.exists());

    let db = commands::open_db(&db_path).unwrap();
    let count = db.list_categories(USER, None).unwrap().len();
    assert!(count > 0);

    // Running init again does not duplicate categories
    commands::cmd_init(&db_path, USER).unwrap();
    assert_eq!(db.list_categories(USER, None).unwrap().len(), count);
}

#[test]
fn test_cmd_init_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    commands::cmd_init(&db_path, "alice").unwrap();

    let db = commands::open_db(&db_path).unwrap();
    assert!(!db.list_categories("alice", None).unwrap().is_empty());
    assert!(db.list_categories("bob", None).unwrap().is_empty());
}

// ========== Import Tests ==========

#[test]
fn test_cmd_import_and_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), &history_csv());
    let db = setup_test_db();

    commands::cmd_import(&db, USER, &csv).unwrap();
    assert_eq!(db.count_transactions(USER).unwrap(), 19);

    // Same file again: everything is a duplicate
    commands::cmd_import(&db, USER, &csv).unwrap();
    assert_eq!(db.count_transactions(USER).unwrap(), 19);

    let conn = db.conn().unwrap();
    let hashed: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1 AND import_hash IS NOT NULL",
            rusqlite::params![USER],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(hashed, 19);
}

#[test]
fn test_cmd_import_repeated_rows_in_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "date,type,amount,category,description\n\
         2024-01-05,expense,4.50,Food,Coffee\n\
         2024-01-05,expense,4.50,Food,Coffee\n",
    );
    let db = setup_test_db();

    commands::cmd_import(&db, USER, &csv).unwrap();
    assert_eq!(db.count_transactions(USER).unwrap(), 2);
}

#[test]
fn test_cmd_import_missing_file() {
    let db = setup_test_db();
    let result = commands::cmd_import(&db, USER, Path::new("/nonexistent/file.csv"));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to open file"));
}

#[test]
fn test_cmd_import_invalid_row() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "date,type,amount,category,description\n2024-01-05,expense,-3,Food,Refund\n",
    );
    let db = setup_test_db();

    assert!(commands::cmd_import(&db, USER, &csv).is_err());
    assert_eq!(db.count_transactions(USER).unwrap(), 0);
}

// ========== Transaction Tests ==========

#[test]
fn test_cmd_transactions_list_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_transactions_list(&db, USER, 20).is_ok());
}

#[test]
fn test_cmd_transactions_add() {
    let db = setup_test_db();
    let result = commands::cmd_transactions_add(
        &db,
        USER,
        12.5,
        "expense",
        "Coffee Shops",
        Some("2024-01-10"),
        Some("Flat white"),
    );
    assert!(result.is_ok());

    let txs = db
        .list_transactions(USER, &TransactionQuery::default())
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, 12.5);
    assert_eq!(txs[0].transaction_type, TransactionType::Expense);
    assert_eq!(txs[0].description.as_deref(), Some("Flat white"));
    assert_eq!(txs[0].category_name(), "Coffee Shops");

    assert!(commands::cmd_transactions_list(&db, USER, 5).is_ok());
}

#[test]
fn test_cmd_transactions_add_rejects_bad_input() {
    let db = setup_test_db();

    let bad_type =
        commands::cmd_transactions_add(&db, USER, 10.0, "transfer", "Food", None, None);
    assert!(bad_type.is_err());

    let bad_date =
        commands::cmd_transactions_add(&db, USER, 10.0, "expense", "Food", Some("01/10/2024"), None);
    assert!(bad_date.is_err());

    let negative = commands::cmd_transactions_add(&db, USER, -10.0, "expense", "Food", None, None);
    assert!(negative.is_err());

    assert_eq!(db.count_transactions(USER).unwrap(), 0);
}

#[test]
fn test_cmd_transactions_delete() {
    let db = setup_test_db();
    commands::cmd_transactions_add(&db, USER, 50.0, "expense", "Food", Some("2024-01-10"), None)
        .unwrap();
    let id = db
        .list_transactions(USER, &TransactionQuery::default())
        .unwrap()[0]
        .id;

    assert!(commands::cmd_transactions_delete(&db, USER, id).is_ok());
    assert_eq!(db.count_transactions(USER).unwrap(), 0);

    // Already gone
    assert!(commands::cmd_transactions_delete(&db, USER, id).is_err());
}

#[test]
fn test_cmd_transactions_delete_other_user() {
    let db = setup_test_db();
    commands::cmd_transactions_add(&db, "alice", 50.0, "expense", "Food", None, None).unwrap();
    let id = db
        .list_transactions("alice", &TransactionQuery::default())
        .unwrap()[0]
        .id;

    assert!(commands::cmd_transactions_delete(&db, "bob", id).is_err());
    assert_eq!(db.count_transactions("alice").unwrap(), 1);
}

#[test]
fn test_cmd_transactions_edit() {
    let db = setup_test_db();
    commands::cmd_transactions_add(&db, USER, 50.0, "expense", "Food", Some("2024-01-10"), None)
        .unwrap();
    let id = db
        .list_transactions(USER, &TransactionQuery::default())
        .unwrap()[0]
        .id;

    commands::cmd_transactions_edit(
        &db,
        USER,
        id,
        Some(65.0),
        None,
        Some("Housing"),
        None,
        Some("Fixed"),
    )
    .unwrap();
    let tx = db.get_transaction(USER, id).unwrap().unwrap();
    assert_eq!(tx.amount, 65.0);
    assert_eq!(tx.category_name(), "Housing");
    assert_eq!(tx.date.to_string(), "2024-01-10");
    assert_eq!(tx.description.as_deref(), Some("Fixed"));

    let negative =
        commands::cmd_transactions_edit(&db, USER, id, Some(-1.0), None, None, None, None);
    assert!(negative.is_err());
    let other_user =
        commands::cmd_transactions_edit(&db, "bob", id, Some(1.0), None, None, None, None);
    assert!(other_user.is_err());
    assert_eq!(db.get_transaction(USER, id).unwrap().unwrap().amount, 65.0);
}

// ========== Category Tests ==========

#[test]
fn test_cmd_categories_list() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_list(&db, USER, None).is_ok());
    assert!(commands::cmd_categories_list(&db, USER, Some("income")).is_ok());
    assert!(commands::cmd_categories_list(&db, USER, Some("bogus")).is_err());
}

#[test]
fn test_cmd_categories_add_derives_kind() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, USER, "Commute Pass", "expense", None).unwrap();

    let cat = db
        .find_category_by_name(USER, "commute pass", TransactionType::Expense)
        .unwrap()
        .unwrap();
    assert_eq!(cat.kind.as_str(), "transport");
}

#[test]
fn test_cmd_categories_add_explicit_kind() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, USER, "Side Gig", "income", Some("business")).unwrap();

    let cat = db
        .find_category_by_name(USER, "Side Gig", TransactionType::Income)
        .unwrap()
        .unwrap();
    assert_eq!(cat.kind.as_str(), "business");
}

#[test]
fn test_cmd_categories_add_invalid() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_add(&db, USER, "  ", "expense", None).is_err());
    assert!(commands::cmd_categories_add(&db, USER, "Toys", "expense", Some("fun")).is_err());
    assert!(commands::cmd_categories_add(&db, USER, "Toys", "gift", None).is_err());
}

#[test]
fn test_cmd_categories_rename_and_delete() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, USER, "Hobbies", "expense", None).unwrap();
    let id = db
        .find_category_by_name(USER, "Hobbies", TransactionType::Expense)
        .unwrap()
        .unwrap()
        .id;

    commands::cmd_categories_rename(&db, USER, id, "Board Games").unwrap();
    assert_eq!(db.get_category(USER, id).unwrap().unwrap().name, "Board Games");
    assert!(commands::cmd_categories_rename(&db, USER, id, "Housing").is_err());

    commands::cmd_transactions_add(&db, USER, 30.0, "expense", "Board Games", None, None).unwrap();
    assert!(commands::cmd_categories_delete(&db, USER, id).is_err());

    let tx = db
        .list_transactions(USER, &TransactionQuery::default())
        .unwrap()[0]
        .id;
    commands::cmd_transactions_delete(&db, USER, tx).unwrap();
    commands::cmd_categories_delete(&db, USER, id).unwrap();
    assert!(db.get_category(USER, id).unwrap().is_none());
    assert!(commands::cmd_categories_delete(&db, USER, id).is_err());
}

// ========== Budget Tests ==========

#[test]
fn test_cmd_budgets_set_and_list() {
    let (_dir, db) = seeded_history();

    commands::cmd_budgets_set(&db, USER, "Housing", 1000.0, Some(1), Some(2024)).unwrap();
    // Setting again replaces the limit
    commands::cmd_budgets_set(&db, USER, "housing", 950.0, Some(1), Some(2024)).unwrap();

    let budgets = db.list_budgets(USER, 1, 2024).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, 950.0);

    let status = db.get_budget_status(USER, 1, 2024).unwrap();
    assert_eq!(status[0].spent, 900.0);

    assert!(commands::cmd_budgets_list(&db, USER, Some(1), Some(2024)).is_ok());
    assert!(commands::cmd_budgets_list(&db, USER, Some(6), Some(2024)).is_ok());
}

#[test]
fn test_cmd_budgets_set_invalid() {
    let db = setup_test_db();
    assert!(commands::cmd_budgets_set(&db, USER, "Nonexistent", 100.0, Some(1), Some(2024)).is_err());
    assert!(commands::cmd_budgets_set(&db, USER, "Food", 100.0, Some(13), Some(2024)).is_err());
    assert!(commands::cmd_budgets_list(&db, USER, Some(0), None).is_err());
}

// ========== Goal Tests ==========

#[test]
fn test_cmd_goals_add_contribute_delete() {
    let db = setup_test_db();
    assert!(commands::cmd_goals_list(&db, USER).is_ok());

    commands::cmd_goals_add(&db, USER, "Emergency fund", 5000.0, Some("2030-01-01"), None)
        .unwrap();
    let goals = db.list_goals(USER).unwrap();
    assert_eq!(goals.len(), 1);
    let id = goals[0].id;

    commands::cmd_goals_contribute(&db, USER, id, 250.0, Some("first")).unwrap();
    commands::cmd_goals_contribute(&db, USER, id, 250.0, None).unwrap();
    assert_eq!(db.get_goal(USER, id).unwrap().unwrap().current_amount, 500.0);
    assert!(commands::cmd_goals_list(&db, USER).is_ok());

    commands::cmd_goals_delete(&db, USER, id).unwrap();
    assert!(db.list_goals(USER).unwrap().is_empty());
}

#[test]
fn test_cmd_goals_invalid() {
    let db = setup_test_db();
    assert!(commands::cmd_goals_add(&db, USER, "Bike", 0.0, None, None).is_err());
    assert!(commands::cmd_goals_add(&db, USER, "Bike", 100.0, Some("next year"), None).is_err());
    assert!(commands::cmd_goals_contribute(&db, USER, 42, 10.0, None).is_err());
    assert!(commands::cmd_goals_delete(&db, USER, 42).is_err());

    commands::cmd_goals_add(&db, USER, "Bike", 100.0, None, Some(2)).unwrap();
    let id = db.list_goals(USER).unwrap()[0].id;
    assert!(commands::cmd_goals_contribute(&db, USER, id, -1.0, None).is_err());
    assert!(commands::cmd_goals_contribute(&db, "someone-else", id, 1.0, None).is_err());
}

// ========== Analyze Tests ==========

#[test]
fn test_cmd_analyze_every_kind() {
    let (_dir, db) = seeded_history();
    let config = AnalyticsConfig::default();

    let kinds = [
        AnalyzeKind::Anomalies,
        AnalyzeKind::Health { income: None },
        AnalyzeKind::Health {
            income: Some(4000.0),
        },
        AnalyzeKind::Forecast { months: Some(2) },
        AnalyzeKind::Predict { by_category: false },
        AnalyzeKind::Predict { by_category: true },
        AnalyzeKind::Budget { income: None },
        AnalyzeKind::Patterns,
        AnalyzeKind::Savings,
        AnalyzeKind::Summary {
            period: "quarter".to_string(),
        },
    ];

    for kind in &kinds {
        for json in [false, true] {
            let result = commands::cmd_analyze(&db, &config, USER, kind, AS_OF, json);
            assert!(result.is_ok(), "{} (json={}) failed: {:?}", kind.name(), json, result);
        }
    }
}

#[test]
fn test_cmd_analyze_insufficient_data_is_not_an_error() {
    let db = setup_test_db();
    let config = AnalyticsConfig::default();

    let result = commands::cmd_analyze(&db, &config, USER, &AnalyzeKind::Anomalies, AS_OF, false);
    assert!(result.is_ok());

    let result = commands::cmd_analyze(
        &db,
        &config,
        USER,
        &AnalyzeKind::Forecast { months: None },
        AS_OF,
        true,
    );
    assert!(result.is_ok());
}

#[test]
fn test_cmd_analyze_rejects_bad_arguments() {
    let (_dir, db) = seeded_history();
    let config = AnalyticsConfig::default();

    let bad_period = AnalyzeKind::Summary {
        period: "decade".to_string(),
    };
    assert!(commands::cmd_analyze(&db, &config, USER, &bad_period, AS_OF, false).is_err());

    let negative_income = AnalyzeKind::Budget {
        income: Some(-100.0),
    };
    assert!(commands::cmd_analyze(&db, &config, USER, &negative_income, AS_OF, false).is_err());

    let bad_date = Some("31-03-2024");
    assert!(
        commands::cmd_analyze(&db, &config, USER, &AnalyzeKind::Patterns, bad_date, false)
            .is_err()
    );
}

// ========== Config Tests ==========

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics.toml");
    std::fs::write(&path, "[forecast]\nwindow_months = 12\n").unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.forecast.window_months, 12);
    assert_eq!(config.anomaly, AnalyticsConfig::default().anomaly);
}

#[test]
fn test_load_config_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.toml");
    assert!(commands::load_config(Some(&missing)).is_err());

    let invalid = dir.path().join("invalid.toml");
    std::fs::write(&invalid, "[anomaly\n").unwrap();
    assert!(commands::load_config(Some(&invalid)).is_err());
}
