//! Group Domain Ports
//!
//! `GroupPort` is everything the group domain needs from storage. Two
//! adapters implement it:
//!
//! - **PostgreSQL Adapter**: `infra_db::PostgresGroupAdapter`
//! - **In-memory Adapter**: [`memory::InMemoryGroupPort`], for tests and
//!   for running the API without a database
//!
//! # Optimistic Concurrency
//!
//! Every stored group carries a version. `save_group` only succeeds when
//! the version of the group passed in matches the stored one, so two
//! writers that read the same version cannot both commit. The loser gets
//! `PortError::Conflict` and is expected to reload and retry.
//!
//! ```rust,ignore
//! let group = port.get_group(id).await?;
//! let mut next = group.clone();
//! next.settle("B", "A", amount)?;
//! let saved = port.save_group(&next).await?; // saved.version() == group.version() + 1
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, GroupId, HealthCheckable, PortError};

use crate::group::Group;

pub mod memory;

/// Storage operations for groups
#[async_trait]
pub trait GroupPort: DomainPort + HealthCheckable {
    /// Stores a new group
    ///
    /// # Returns
    ///
    /// The stored group, or `PortError::Conflict` if the id is already taken
    async fn create_group(&self, group: &Group) -> Result<Group, PortError>;

    /// Retrieves a group by id
    ///
    /// # Returns
    ///
    /// The group if found, or `PortError::NotFound`
    async fn get_group(&self, id: GroupId) -> Result<Group, PortError>;

    /// Lists every group, newest first
    async fn list_groups(&self) -> Result<Vec<Group>, PortError>;

    /// Replaces a stored group
    ///
    /// `group.version()` must be the version the caller read.
    ///
    /// # Returns
    ///
    /// The stored group with its version incremented, `PortError::Conflict`
    /// if another writer saved first, or `PortError::NotFound`
    async fn save_group(&self, group: &Group) -> Result<Group, PortError>;

    /// Removes a group
    ///
    /// # Returns
    ///
    /// `PortError::NotFound` if there was nothing to delete
    async fn delete_group(&self, id: GroupId) -> Result<(), PortError>;
}
