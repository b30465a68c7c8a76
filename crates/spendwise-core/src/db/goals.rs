//! Savings goal operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Goal, GoalContribution, GoalUpdate, NewGoal};

const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, deadline, category, \
     priority, icon, color, created_at";

fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
    let deadline: Option<String> = row.get(5)?;
    let created_at: String = row.get(10)?;
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        deadline: deadline.as_deref().map(parse_date).transpose()?,
        category: row.get(6)?,
        priority: row.get(7)?,
        icon: row.get(8)?,
        color: row.get(9)?,
        created_at: parse_datetime(&created_at),
    })
}

fn row_to_contribution(row: &Row) -> rusqlite::Result<GoalContribution> {
    let created_at: String = row.get(4)?;
    Ok(GoalContribution {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        amount: row.get(2)?,
        note: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

fn validate_target(target: f64) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Target amount must be a positive number, got {}",
            target
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidData("Goal name is required".into()));
    }
    Ok(name)
}

impl Database {
    pub fn create_goal(&self, user_id: &str, goal: &NewGoal) -> Result<i64> {
        let name = validate_name(&goal.name)?;
        validate_target(goal.target_amount)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goals (user_id, name, target_amount, deadline, category, priority, icon, color)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                goal.target_amount,
                goal.deadline.map(|d| d.to_string()),
                goal.category,
                goal.priority.unwrap_or(1),
                goal.icon.as_deref().unwrap_or("🎯"),
                goal.color.as_deref().unwrap_or("#3498DB"),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_goal(&self, user_id: &str, id: i64) -> Result<Option<Goal>> {
        let conn = self.conn()?;
        let goal = conn
            .query_row(
                &format!("SELECT {} FROM goals WHERE id = ? AND user_id = ?", GOAL_COLUMNS),
                params![id, user_id],
                row_to_goal,
            )
            .optional()?;
        Ok(goal)
    }

    /// A user's goals, highest priority first
    pub fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM goals WHERE user_id = ? ORDER BY priority, id",
            GOAL_COLUMNS
        ))?;
        let goals = stmt
            .query_map(params![user_id], row_to_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    /// Apply a partial edit; None when the user has no goal with this ID
    pub fn update_goal(
        &self,
        user_id: &str,
        id: i64,
        update: &GoalUpdate,
    ) -> Result<Option<Goal>> {
        let Some(current) = self.get_goal(user_id, id)? else {
            return Ok(None);
        };

        let name = match update.name.as_deref() {
            Some(name) => validate_name(name)?.to_string(),
            None => current.name,
        };
        let target = update.target_amount.unwrap_or(current.target_amount);
        validate_target(target)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE goals
            SET name = ?, target_amount = ?, deadline = ?, category = ?, priority = ?,
                icon = ?, color = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![
                name,
                target,
                update.deadline.or(current.deadline).map(|d| d.to_string()),
                update.category.as_ref().or(current.category.as_ref()),
                update.priority.unwrap_or(current.priority),
                update.icon.as_ref().unwrap_or(&current.icon),
                update.color.as_ref().unwrap_or(&current.color),
                id,
                user_id,
            ],
        )?;
        drop(conn);

        self.get_goal(user_id, id)
    }

    /// Delete a goal with its contributions, returning whether it existed
    pub fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM goals WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Record a contribution and add it to the goal's current amount
    ///
    /// Returns None when the user has no goal with this ID.
    pub fn contribute_to_goal(
        &self,
        user_id: &str,
        goal_id: i64,
        amount: f64,
        note: Option<&str>,
    ) -> Result<Option<GoalContribution>> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Contribution must be a positive number, got {}",
                amount
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            r#"
            UPDATE goals SET current_amount = current_amount + ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![amount, goal_id, user_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        tx.execute(
            "INSERT INTO goal_contributions (goal_id, user_id, amount, note) VALUES (?, ?, ?, ?)",
            params![goal_id, user_id, amount, note],
        )?;
        let id = tx.last_insert_rowid();
        let contribution = tx.query_row(
            "SELECT id, goal_id, amount, note, created_at FROM goal_contributions WHERE id = ?",
            params![id],
            row_to_contribution,
        )?;

        tx.commit()?;
        tracing::debug!(user = user_id, goal_id, amount, "Recorded goal contribution");
        Ok(Some(contribution))
    }

    /// Contributions to one goal, newest first
    pub fn list_goal_contributions(
        &self,
        user_id: &str,
        goal_id: i64,
    ) -> Result<Vec<GoalContribution>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, goal_id, amount, note, created_at FROM goal_contributions
            WHERE goal_id = ? AND user_id = ?
            ORDER BY id DESC
            "#,
        )?;
        let contributions = stmt
            .query_map(params![goal_id, user_id], row_to_contribution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contributions)
    }
}
