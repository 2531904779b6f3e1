//! Port wrappers for failure injection

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use core_kernel::{DomainPort, GroupId, HealthCheckResult, HealthCheckable, PortError};
use domain_groups::{Group, GroupPort, InMemoryGroupPort};

/// In-memory port whose next `n` saves fail with a conflict
///
/// Each injected conflict also commits an unrelated concurrent write
/// (the group as it was, with a bumped version), so the retry really has
/// to reload fresh state.
#[derive(Debug, Clone, Default)]
pub struct ConflictingGroupPort {
    inner: InMemoryGroupPort,
    conflicts_left: Arc<AtomicU32>,
    saves_attempted: Arc<AtomicU32>,
}

impl ConflictingGroupPort {
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryGroupPort::new(),
            conflicts_left: Arc::new(AtomicU32::new(conflicts)),
            saves_attempted: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of `save_group` calls seen so far
    pub fn saves_attempted(&self) -> u32 {
        self.saves_attempted.load(Ordering::SeqCst)
    }
}

impl DomainPort for ConflictingGroupPort {}

#[async_trait]
impl HealthCheckable for ConflictingGroupPort {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl GroupPort for ConflictingGroupPort {
    async fn create_group(&self, group: &Group) -> Result<Group, PortError> {
        self.inner.create_group(group).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Group, PortError> {
        self.inner.get_group(id).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, PortError> {
        self.inner.list_groups().await
    }

    async fn save_group(&self, group: &Group) -> Result<Group, PortError> {
        self.saves_attempted.fetch_add(1, Ordering::SeqCst);

        let inject = self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if inject {
            let current = self.inner.get_group(group.id()).await?;
            self.inner.save_group(&current).await?;
        }

        self.inner.save_group(group).await
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), PortError> {
        self.inner.delete_group(id).await
    }
}
