//! Domain models for Spendwise

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money flow. Amounts are stored non-negative; the sign comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic kind of a category, independent of its display name.
///
/// Budget benchmarks and savings tips are keyed by kind so that renaming a
/// category (or using another language) does not change the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Food,
    Transport,
    Housing,
    Utilities,
    Health,
    Education,
    Shopping,
    Entertainment,
    Salary,
    Bonus,
    Investment,
    Business,
    #[default]
    Other,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Housing => "housing",
            Self::Utilities => "utilities",
            Self::Health => "health",
            Self::Education => "education",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Salary => "salary",
            Self::Bonus => "bonus",
            Self::Investment => "investment",
            Self::Business => "business",
            Self::Other => "other",
        }
    }

    /// Map a free-text category name to a kind.
    ///
    /// Only used when a category is created without an explicit kind (seeding,
    /// CSV import, legacy clients). The name is split into words and matched
    /// against whole-word aliases, so "Headphones" does not match "phone".
    /// Unrecognized names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_phrase = |phrase: &str| {
            let needle: Vec<&str> = phrase.split(' ').collect();
            words.windows(needle.len()).any(|w| w == needle.as_slice())
        };

        KIND_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| has_phrase(a)))
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Other)
    }
}

/// Whole-word aliases per kind, checked in order; multi-word entries match
/// consecutive words
const KIND_ALIASES: &[(CategoryKind, &[&str])] = &[
    (
        CategoryKind::Food,
        &[
            "ăn uống", "food", "dining", "eating", "restaurant", "restaurants", "grocery",
            "groceries", "cafe", "café", "coffee",
        ],
    ),
    (
        CategoryKind::Transport,
        &[
            "di chuyển", "transport", "transportation", "travel", "fuel", "taxi", "commute",
            "parking", "transit",
        ],
    ),
    (
        CategoryKind::Housing,
        &["nhà cửa", "nhà ở", "housing", "rent", "mortgage", "home"],
    ),
    (
        CategoryKind::Utilities,
        &[
            "hóa đơn", "điện nước", "bill", "bills", "utility", "utilities", "internet",
            "phone", "electricity", "water",
        ],
    ),
    (
        CategoryKind::Health,
        &["sức khỏe", "health", "healthcare", "medical", "pharmacy", "doctor", "gym"],
    ),
    (
        CategoryKind::Education,
        &["giáo dục", "education", "school", "tuition", "course", "courses", "book", "books"],
    ),
    (
        CategoryKind::Shopping,
        &["mua sắm", "shopping", "clothes", "clothing", "retail"],
    ),
    (
        CategoryKind::Entertainment,
        &[
            "giải trí", "entertainment", "movie", "movies", "game", "games", "hobby", "hobbies",
        ],
    ),
    (
        CategoryKind::Salary,
        &["lương", "salary", "wage", "wages", "payroll", "paycheck"],
    ),
    (CategoryKind::Bonus, &["thưởng", "bonus"]),
    (
        CategoryKind::Investment,
        &[
            "đầu tư", "invest", "investment", "investments", "dividend", "dividends", "interest",
        ],
    ),
    (CategoryKind::Business, &["kinh doanh", "business", "freelance"]),
];

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "housing" => Ok(Self::Housing),
            "utilities" => Ok(Self::Utilities),
            "health" => Ok(Self::Health),
            "education" => Ok(Self::Education),
            "shopping" => Ok(Self::Shopping),
            "entertainment" => Ok(Self::Entertainment),
            "salary" => Ok(Self::Salary),
            "bonus" => Ok(Self::Bonus),
            "investment" => Ok(Self::Investment),
            "business" => Ok(Self::Business),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category kind: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending or income category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub kind: CategoryKind,
    pub icon: String,
    pub color: String,
}

impl Category {
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            icon: self.icon.clone(),
            color: self.color.clone(),
        }
    }
}

/// Category data joined onto a transaction or budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: String,
    pub color: String,
}

/// New category to insert
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// Derived from the name when omitted
    #[serde(default)]
    pub kind: Option<CategoryKind>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial edit of a category; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<CategoryKind>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A single income or expense entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub category_id: i64,
    /// Always non-negative
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<CategoryRef>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Category display name, falling back to a placeholder for orphaned rows
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized")
    }

    pub fn category_kind(&self) -> CategoryKind {
        self.category.as_ref().map(|c| c.kind).unwrap_or_default()
    }
}

/// New transaction to insert
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub category_id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    /// Set by the importer for deduplication
    #[serde(skip)]
    pub import_hash: Option<String>,
}

/// Monthly spending limit for a category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub category_id: i64,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
    pub category: Option<CategoryRef>,
}

/// New budget (or replacement limit for an existing month/category)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: i64,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

/// A savings target the user contributes towards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub target_amount: f64,
    /// Sum of all contributions
    pub current_amount: f64,
    pub deadline: Option<NaiveDate>,
    /// Free-text grouping label ("travel", "emergency fund", ...)
    pub category: Option<String>,
    /// Lower sorts first
    pub priority: i64,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial edit of a goal; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_amount: Option<f64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Money put towards a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalContribution {
    pub id: i64,
    pub goal_id: i64,
    pub amount: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionQuery {
    /// All transactions in an inclusive date window
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    pub fn of_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }
}

// ============================================================================
// Report models
// ============================================================================

/// Income/expense totals for a period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub transaction_count: i64,
}

/// Total for one category within a period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub total: f64,
    pub count: i64,
}

/// Income and expense for one calendar month ("YYYY-MM")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTrendPoint {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// A budget with its spending progress for the month
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: f64,
    pub remaining: f64,
    /// Spent as a percentage of the limit (0 when the limit is 0)
    pub percentage: f64,
}
