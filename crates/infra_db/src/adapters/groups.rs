//! PostgreSQL Group Adapter
//!
//! Implements the group domain's `GroupPort` on top of `GroupRepository`.
//! It converts `Group` aggregates to rows (JSONB documents in the persisted
//! camelCase layout) and back, and translates database errors into
//! `PortError`s:
//!
//! - `DatabaseError::NotFound` -> `PortError::NotFound`
//! - `DatabaseError::VersionConflict` / `DuplicateEntry` -> `PortError::Conflict`
//! - malformed stored documents -> `PortError::Transformation`
//! - other errors -> `PortError::Connection` or `PortError::Internal`

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Amount, DomainPort, GroupId, HealthCheckResult, HealthCheckable, PortError,
};
use domain_groups::{Group, GroupPort, GroupSnapshot, LedgerEntry};

use crate::error::DatabaseError;
use crate::repositories::groups::{GroupRepository, GroupRow};

const ADAPTER_ID: &str = "postgres-group-adapter";

/// Pings slower than this report `Degraded`
const SLOW_PING: Duration = Duration::from_millis(500);

/// PostgreSQL-backed implementation of the GroupPort trait
#[derive(Debug, Clone)]
pub struct PostgresGroupAdapter {
    repository: GroupRepository,
}

impl PostgresGroupAdapter {
    /// Creates a new PostgreSQL group adapter
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: GroupRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &GroupRepository {
        &self.repository
    }
}

impl DomainPort for PostgresGroupAdapter {}

#[async_trait]
impl HealthCheckable for PostgresGroupAdapter {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self.repository.ping().await;
        let latency = start.elapsed();

        let (status, message) = ping_status(result, latency);

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms: latency.as_millis() as u64,
            message,
            checked_at: Utc::now(),
        }
    }
}

fn ping_status(
    result: Result<(), DatabaseError>,
    latency: Duration,
) -> (AdapterHealth, Option<String>) {
    match result {
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        Ok(()) if latency > SLOW_PING => (
            AdapterHealth::Degraded,
            Some(format!("Ping took {}ms", latency.as_millis())),
        ),
        Ok(()) => (AdapterHealth::Healthy, None),
    }
}

#[async_trait]
impl GroupPort for PostgresGroupAdapter {
    #[instrument(skip(self, group), fields(group_id = %group.id()))]
    async fn create_group(&self, group: &Group) -> Result<Group, PortError> {
        debug!("Inserting group");

        let row = group_to_row(group)?;
        let inserted = self.repository.insert(&row).await?;
        row_to_group(inserted)
    }

    #[instrument(skip(self), fields(group_id = %id))]
    async fn get_group(&self, id: GroupId) -> Result<Group, PortError> {
        debug!("Fetching group by ID");

        let row = self
            .repository
            .get_by_id(id.into())
            .await
            .map_err(|e| not_found_as_group(e, id))?;
        row_to_group(row)
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<Group>, PortError> {
        self.repository
            .list()
            .await?
            .into_iter()
            .map(row_to_group)
            .collect()
    }

    #[instrument(skip(self, group), fields(group_id = %group.id(), version = group.version()))]
    async fn save_group(&self, group: &Group) -> Result<Group, PortError> {
        debug!("Updating group");

        let row = group_to_row(group)?;
        let updated = self
            .repository
            .update(&row)
            .await
            .map_err(|e| not_found_as_group(e, group.id()))?;
        row_to_group(updated)
    }

    #[instrument(skip(self), fields(group_id = %id))]
    async fn delete_group(&self, id: GroupId) -> Result<(), PortError> {
        self.repository
            .delete(id.into())
            .await
            .map_err(|e| not_found_as_group(e, id))
    }
}

fn not_found_as_group(error: DatabaseError, id: GroupId) -> PortError {
    if error.is_not_found() {
        PortError::not_found("Group", id)
    } else {
        error.into()
    }
}

/// Converts a group to its table row
pub(crate) fn group_to_row(group: &Group) -> Result<GroupRow, PortError> {
    let version = i64::try_from(group.version()).map_err(|_| PortError::Transformation {
        message: format!("Version {} does not fit in a BIGINT", group.version()),
    })?;

    Ok(GroupRow {
        group_id: group.id().into(),
        name: group.name().to_string(),
        members: to_json(group.members())?,
        balances: to_json(group.balances())?,
        expenses: to_json(group.expenses())?,
        version,
        created_at: group.created_at(),
        updated_at: group.updated_at(),
    })
}

/// Converts a table row back into a group
///
/// Stored balances are kept as the cached values; missing members get a
/// zero balance.
pub(crate) fn row_to_group(row: GroupRow) -> Result<Group, PortError> {
    let members: Vec<String> = from_json(row.members, "members")?;
    let balances: BTreeMap<String, Amount> = from_json(row.balances, "balances")?;
    let expenses: Vec<LedgerEntry> = from_json(row.expenses, "expenses")?;
    let version = u64::try_from(row.version).map_err(|_| PortError::Transformation {
        message: format!("Negative version {} for group {}", row.version, row.group_id),
    })?;

    Ok(Group::restore(GroupSnapshot {
        id: GroupId::from_uuid(row.group_id),
        name: row.name,
        members,
        balances,
        expenses,
        version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value, PortError> {
    serde_json::to_value(value).map_err(|e| PortError::Transformation {
        message: e.to_string(),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value, column: &str) -> Result<T, PortError> {
    serde_json::from_value(value).map_err(|e| PortError::Transformation {
        message: format!("Invalid {} document: {}", column, e),
    })
}
