//! Category operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryKind, CategoryUpdate, NewCategory, TransactionType};

/// Categories every user starts with: (name, type, kind, icon, color)
pub const DEFAULT_CATEGORIES: &[(&str, TransactionType, CategoryKind, &str, &str)] = &[
    ("Food & Dining", TransactionType::Expense, CategoryKind::Food, "🍜", "#FF6B6B"),
    ("Transport", TransactionType::Expense, CategoryKind::Transport, "🚗", "#4ECDC4"),
    ("Shopping", TransactionType::Expense, CategoryKind::Shopping, "🛒", "#45B7D1"),
    ("Entertainment", TransactionType::Expense, CategoryKind::Entertainment, "🎮", "#96CEB4"),
    ("Health", TransactionType::Expense, CategoryKind::Health, "💊", "#FFEAA7"),
    ("Education", TransactionType::Expense, CategoryKind::Education, "📚", "#DDA0DD"),
    ("Bills & Utilities", TransactionType::Expense, CategoryKind::Utilities, "📄", "#98D8C8"),
    ("Housing", TransactionType::Expense, CategoryKind::Housing, "🏠", "#F7DC6F"),
    ("Other", TransactionType::Expense, CategoryKind::Other, "📦", "#808080"),
    ("Salary", TransactionType::Income, CategoryKind::Salary, "💰", "#2ECC71"),
    ("Bonus", TransactionType::Income, CategoryKind::Bonus, "🎁", "#27AE60"),
    ("Investment", TransactionType::Income, CategoryKind::Investment, "📈", "#1ABC9C"),
    ("Business", TransactionType::Income, CategoryKind::Business, "💼", "#16A085"),
    ("Other Income", TransactionType::Income, CategoryKind::Other, "💵", "#3498DB"),
];

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let category_type: String = row.get(3)?;
    let kind: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category_type: parse_enum(&category_type)?,
        kind: parse_enum(&kind)?,
        icon: row.get(5)?,
        color: row.get(6)?,
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, type, kind, icon, color";

impl Database {
    /// Seed the default categories for a user (idempotent)
    ///
    /// Returns the number of categories that were newly created.
    pub fn seed_default_categories(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let mut created = 0;

        for (name, category_type, kind, icon, color) in DEFAULT_CATEGORIES {
            created += conn.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, type, kind, icon, color) VALUES (?, ?, ?, ?, ?, ?)",
                params![user_id, name, category_type.as_str(), kind.as_str(), icon, color],
            )?;
        }

        if created > 0 {
            tracing::debug!(user = user_id, created, "Seeded default categories");
        }
        Ok(created)
    }

    /// Create a category, deriving its kind from the name when not given
    pub fn create_category(&self, user_id: &str, category: &NewCategory) -> Result<i64> {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name is required".into()));
        }

        let kind = category
            .kind
            .unwrap_or_else(|| CategoryKind::from_name(name));
        let icon = category.icon.as_deref().unwrap_or("📦");
        let color = category.color.as_deref().unwrap_or("#808080");

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, type, kind, icon, color) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                user_id,
                name,
                category.category_type.as_str(),
                kind.as_str(),
                icon,
                color
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List a user's categories, optionally restricted to one type
    pub fn list_categories(
        &self,
        user_id: &str,
        category_type: Option<TransactionType>,
    ) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2) ORDER BY type, name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(
                params![user_id, category_type.map(|t| t.as_str())],
                row_to_category,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(categories)
    }

    /// Get a category by ID (scoped to the user)
    pub fn get_category(&self, user_id: &str, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                params![id, user_id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Find a category by name and type (case-insensitive)
    pub fn find_category_by_name(
        &self,
        user_id: &str,
        name: &str,
        category_type: TransactionType,
    ) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE user_id = ? AND type = ? AND LOWER(name) = LOWER(?)",
                    CATEGORY_COLUMNS
                ),
                params![user_id, category_type.as_str(), name.trim()],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Find a category by name, creating it when missing
    pub fn get_or_create_category(
        &self,
        user_id: &str,
        name: &str,
        category_type: TransactionType,
    ) -> Result<Category> {
        if let Some(existing) = self.find_category_by_name(user_id, name, category_type)? {
            return Ok(existing);
        }

        let id = self.create_category(
            user_id,
            &NewCategory {
                name: name.to_string(),
                category_type,
                kind: None,
                icon: None,
                color: None,
            },
        )?;

        self.get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Rename or restyle a category
    ///
    /// Returns the updated category, or None when the user has no category
    /// with this ID. The kind only changes when given explicitly.
    pub fn update_category(
        &self,
        user_id: &str,
        id: i64,
        update: &CategoryUpdate,
    ) -> Result<Option<Category>> {
        let Some(current) = self.get_category(user_id, id)? else {
            return Ok(None);
        };

        let name = match update.name.as_deref().map(str::trim) {
            Some("") => return Err(Error::InvalidData("Category name is required".into())),
            Some(name) => name.to_string(),
            None => current.name.clone(),
        };
        if !name.eq_ignore_ascii_case(&current.name) {
            if let Some(other) = self.find_category_by_name(user_id, &name, current.category_type)? {
                if other.id != id {
                    return Err(Error::InvalidData(format!(
                        "A {} category named '{}' already exists",
                        current.category_type, name
                    )));
                }
            }
        }

        let kind = update.kind.unwrap_or(current.kind);
        let icon = update.icon.as_deref().unwrap_or(&current.icon);
        let color = update.color.as_deref().unwrap_or(&current.color);

        let conn = self.conn()?;
        conn.execute(
            "UPDATE categories SET name = ?, kind = ?, icon = ?, color = ? WHERE id = ? AND user_id = ?",
            params![name, kind.as_str(), icon, color, id, user_id],
        )?;
        drop(conn);

        self.get_category(user_id, id)
    }

    /// Delete a category and its budgets
    ///
    /// Categories still referenced by transactions are refused; move or
    /// delete those transactions first. Returns whether a row was removed.
    pub fn delete_category(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE category_id = ? AND user_id = ?",
            params![id, user_id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(Error::InvalidData(format!(
                "Category is used by {} transaction(s)",
                in_use
            )));
        }

        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if deleted > 0 {
            tracing::debug!(user = user_id, id, "Deleted category");
        }
        Ok(deleted > 0)
    }
}
