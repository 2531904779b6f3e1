//! In-memory group storage

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use core_kernel::{
    AdapterHealth, DomainPort, GroupId, HealthCheckResult, HealthCheckable, PortError,
};

use super::GroupPort;
use crate::group::Group;

/// Groups kept in a map behind an async lock
///
/// Clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGroupPort {
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
}

impl InMemoryGroupPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates with groups for testing
    pub async fn with_groups(groups: Vec<Group>) -> Self {
        let port = Self::new();
        {
            let mut stored = port.groups.write().await;
            for group in groups {
                stored.insert(group.id(), group);
            }
        }
        port
    }

    /// Number of stored groups
    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }
}

impl DomainPort for InMemoryGroupPort {}

#[async_trait]
impl HealthCheckable for InMemoryGroupPort {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-group-port".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory storage always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl GroupPort for InMemoryGroupPort {
    #[instrument(skip(self, group), fields(group_id = %group.id()))]
    async fn create_group(&self, group: &Group) -> Result<Group, PortError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.id()) {
            return Err(PortError::conflict(format!("Group {} already exists", group.id())));
        }
        groups.insert(group.id(), group.clone());
        Ok(group.clone())
    }

    async fn get_group(&self, id: GroupId) -> Result<Group, PortError> {
        self.groups
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Group", id))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, PortError> {
        let mut groups: Vec<Group> = self.groups.read().await.values().cloned().collect();
        groups.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
        });
        Ok(groups)
    }

    #[instrument(skip(self, group), fields(group_id = %group.id(), version = group.version()))]
    async fn save_group(&self, group: &Group) -> Result<Group, PortError> {
        let mut groups = self.groups.write().await;
        let stored = groups
            .get(&group.id())
            .ok_or_else(|| PortError::not_found("Group", group.id()))?;

        if stored.version() != group.version() {
            return Err(PortError::conflict(format!(
                "Group {} is at version {}, update was based on version {}",
                group.id(),
                stored.version(),
                group.version()
            )));
        }

        let committed = group.clone().committed();
        groups.insert(committed.id(), committed.clone());
        Ok(committed)
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), PortError> {
        self.groups
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("Group", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::NewExpense;
    use core_kernel::Amount;
    use rust_decimal_macros::dec;

    fn group() -> Group {
        Group::create("Trip", vec!["A".into(), "B".into()]).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let port = InMemoryGroupPort::new();
        let created = port.create_group(&group()).await.unwrap();

        let found = port.get_group(created.id()).await.unwrap();
        assert_eq!(found, created);
        assert!(port.create_group(&created).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_get_missing_group() {
        let port = InMemoryGroupPort::new();
        let result = port.get_group(GroupId::new_v7()).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let port = InMemoryGroupPort::new();
        let mut loaded = port.create_group(&group()).await.unwrap();
        loaded
            .add_expense(NewExpense::equal("Taxi", Amount::new(dec!(20)), "A", vec!["B".into()]))
            .unwrap();

        let saved = port.save_group(&loaded).await.unwrap();
        assert_eq!(saved.version(), 1);
        assert_eq!(port.get_group(saved.id()).await.unwrap().expenses().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let port = InMemoryGroupPort::new();
        let original = port.create_group(&group()).await.unwrap();

        let mut first = original.clone();
        first.settle("A", "B", Amount::new(dec!(5))).unwrap();
        port.save_group(&first).await.unwrap();

        let mut second = original.clone();
        second.settle("B", "A", Amount::new(dec!(5))).unwrap();
        let err = port.save_group(&second).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = port.get_group(original.id()).await.unwrap();
        assert_eq!(stored.balance_of("A"), Some(Amount::new(dec!(-5))));
    }

    #[tokio::test]
    async fn test_delete() {
        let port = InMemoryGroupPort::new();
        let created = port.create_group(&group()).await.unwrap();

        port.delete_group(created.id()).await.unwrap();
        assert!(port.is_empty().await);
        assert!(port.delete_group(created.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_health_check() {
        let port = InMemoryGroupPort::new();
        assert_eq!(port.health_check().await.status, AdapterHealth::Healthy);
    }
}
