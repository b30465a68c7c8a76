//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Personal finance tracker with rule-based spending analytics")]
#[command(version)]
pub struct Cli {
    /// Path to database file
    #[arg(long, default_value = "spendwise.db", global = true)]
    pub db: PathBuf,

    /// User whose data the command reads and writes
    #[arg(long, default_value = "local", global = true)]
    pub user: String,

    /// Analytics config file (TOML). Defaults to the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Import transactions from a CSV file
    Import {
        /// Path to CSV file (date,type,amount,category,description)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List, add, edit or delete transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// List, add, rename or delete categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// List or set monthly budgets
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Track savings goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Run an analysis over your transactions
    Analyze {
        #[command(subcommand)]
        kind: AnalyzeKind,

        /// Reference date for the analysis (YYYY-MM-DD, default: today)
        #[arg(long, global = true)]
        as_of: Option<String>,

        /// Print the raw JSON result instead of a summary
        #[arg(long, global = true)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
    /// Record a transaction
    Add {
        /// Amount (non-negative)
        amount: f64,

        /// Category name (created if missing)
        #[arg(short, long)]
        category: String,

        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a transaction
    Edit {
        /// Transaction ID
        id: i64,

        /// New amount
        #[arg(short, long)]
        amount: Option<f64>,

        /// Category name (created if missing)
        #[arg(short, long)]
        category: Option<String>,

        /// income or expense
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List {
        /// Only show income or expense categories
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,
    },
    /// Create a category
    Add {
        /// Category name
        name: String,

        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Semantic kind (food, transport, housing, ...). Derived from the name if omitted.
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Rename a category
    Rename {
        /// Category ID
        id: i64,

        /// New name
        name: String,
    },
    /// Delete a category that no transaction uses
    Delete {
        /// Category ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// Show budget status for a month
    List {
        /// Month (1-12, default: current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (default: current)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Set the budget for a category and month
    Set {
        /// Category name
        category: String,

        /// Monthly limit
        amount: f64,

        /// Month (1-12, default: current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (default: current)
        #[arg(short, long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// Show goals with progress and pace
    List,
    /// Create a goal
    Add {
        /// Goal name
        name: String,

        /// Target amount
        target: f64,

        /// Deadline (YYYY-MM-DD)
        #[arg(short, long)]
        deadline: Option<String>,

        /// Priority (1 = highest)
        #[arg(short, long)]
        priority: Option<i64>,
    },
    /// Put money towards a goal
    Contribute {
        /// Goal ID
        id: i64,

        /// Amount to add
        amount: f64,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AnalyzeKind {
    /// Flag unusually large or small transactions
    Anomalies,
    /// Score this month's financial health (0-100)
    Health {
        /// Monthly income to score against instead of recorded income
        #[arg(long)]
        income: Option<f64>,
    },
    /// Project income and expense for the coming months
    Forecast {
        /// Months to project (default from config)
        #[arg(short, long)]
        months: Option<u32>,
    },
    /// Predict next month's spending
    Predict {
        /// Break the prediction down per category
        #[arg(long)]
        by_category: bool,
    },
    /// Suggest per-category budgets against benchmarks
    Budget {
        /// Monthly income to plan with instead of the recorded average
        #[arg(long)]
        income: Option<f64>,
    },
    /// Day-of-week and week-of-month spending patterns
    Patterns,
    /// Where cutting back would save the most
    Savings,
    /// Income, expense and top categories for a period
    Summary {
        /// week, month or quarter
        #[arg(short, long, default_value = "month")]
        period: String,
    },
}

impl AnalyzeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Anomalies => "anomalies",
            Self::Health { .. } => "health",
            Self::Forecast { .. } => "forecast",
            Self::Predict { .. } => "predict",
            Self::Budget { .. } => "budget",
            Self::Patterns => "patterns",
            Self::Savings => "savings",
            Self::Summary { .. } => "summary",
        }
    }
}
