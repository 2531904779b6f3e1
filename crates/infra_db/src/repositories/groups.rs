//! Group repository implementation
//!
//! One row per group in the `groups` table. The member list, the balance
//! map and the entry log are stored as JSONB documents and passed through
//! this layer untouched; the adapter turns them into domain types.
//!
//! # Optimistic Concurrency
//!
//! `update` only writes when the stored `version` still equals the version
//! the caller read, and bumps it in the same statement.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

const GROUP_COLUMNS: &str =
    "group_id, name, members, balances, expenses, version, created_at, updated_at";

/// A row of the `groups` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GroupRow {
    pub group_id: Uuid,
    pub name: String,
    /// JSON array of member names
    pub members: Value,
    /// JSON object of member name to decimal balance
    pub balances: Value,
    /// JSON array of entry records
    pub expenses: Value,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for group rows
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a group by its identifier
    ///
    /// # Returns
    ///
    /// The group row or `DatabaseError::NotFound`
    pub async fn get_by_id(&self, group_id: Uuid) -> Result<GroupRow, DatabaseError> {
        let sql = format!("SELECT {} FROM groups WHERE group_id = $1", GROUP_COLUMNS);

        sqlx::query_as::<_, GroupRow>(&sql)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Group", group_id))
    }

    /// Lists all groups, newest first
    pub async fn list(&self) -> Result<Vec<GroupRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM groups ORDER BY created_at DESC, group_id DESC",
            GROUP_COLUMNS
        );

        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed groups");
        Ok(rows)
    }

    /// Inserts a new group row as given
    ///
    /// # Errors
    ///
    /// `DatabaseError::DuplicateEntry` if the group id already exists
    pub async fn insert(&self, row: &GroupRow) -> Result<GroupRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO groups ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            GROUP_COLUMNS, GROUP_COLUMNS
        );

        let inserted = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(row.group_id)
            .bind(&row.name)
            .bind(&row.members)
            .bind(&row.balances)
            .bind(&row.expenses)
            .bind(row.version)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("Group", "group_id", row.group_id)
                }
                other => other,
            })?;

        Ok(inserted)
    }

    /// Replaces a group row if its stored version is `row.version`
    ///
    /// # Returns
    ///
    /// The stored row with `version + 1`
    ///
    /// # Errors
    ///
    /// - `DatabaseError::VersionConflict` if another writer got there first
    /// - `DatabaseError::NotFound` if the row no longer exists
    pub async fn update(&self, row: &GroupRow) -> Result<GroupRow, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let sql = format!(
            r#"
            UPDATE groups
            SET name = $3,
                members = $4,
                balances = $5,
                expenses = $6,
                updated_at = $7,
                version = version + 1
            WHERE group_id = $1 AND version = $2
            RETURNING {}
            "#,
            GROUP_COLUMNS
        );

        let updated = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(row.group_id)
            .bind(row.version)
            .bind(&row.name)
            .bind(&row.members)
            .bind(&row.balances)
            .bind(&row.expenses)
            .bind(row.updated_at)
            .fetch_optional(&mut *tx)
            .await?;

        let updated = match updated {
            Some(updated) => updated,
            None => {
                let stored: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM groups WHERE group_id = $1")
                        .bind(row.group_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match stored {
                    Some(version) => DatabaseError::VersionConflict(format!(
                        "Group {} is at version {}, update was based on version {}",
                        row.group_id, version, row.version
                    )),
                    None => DatabaseError::not_found("Group", row.group_id),
                });
            }
        };

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        debug!(group_id = %updated.group_id, version = updated.version, "Updated group");
        Ok(updated)
    }

    /// Deletes a group row
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if no row was deleted
    pub async fn delete(&self, group_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM groups WHERE group_id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Group", group_id));
        }
        Ok(())
    }

    /// Checks that the database answers queries
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
