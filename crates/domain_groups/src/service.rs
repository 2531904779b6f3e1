//! Group application service
//!
//! `GroupService` runs every ledger operation as an atomic
//! read-compute-write against a [`GroupPort`]: the group is loaded, the
//! operation runs on a copy, and the copy is saved with a version check.
//! When another writer committed in between, the whole cycle is repeated
//! on fresh state, up to the configured number of retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use core_kernel::{Amount, EntryId, GroupId, HealthCheckResult};

use crate::error::GroupError;
use crate::expense::NewExpense;
use crate::group::Group;
use crate::ports::GroupPort;
use crate::summary::{
    member_totals, BalanceSummary, GroupOverview, MemberTotals, SettlementSuggestion,
};

/// How often a conflicting write is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

/// Outcome of a balance recalculation
#[derive(Debug, Clone)]
pub struct Recalculation {
    pub group: Group,
    /// True if the stored balances did not match the entry log
    pub drift: bool,
}

/// Ledger operations on stored groups
#[derive(Clone)]
pub struct GroupService {
    port: Arc<dyn GroupPort>,
    retry: RetryPolicy,
}

impl GroupService {
    pub fn new(port: Arc<dyn GroupPort>) -> Self {
        Self::with_retry_policy(port, RetryPolicy::default())
    }

    pub fn with_retry_policy(port: Arc<dyn GroupPort>, retry: RetryPolicy) -> Self {
        Self { port, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Creates and stores a new group
    ///
    /// # Errors
    ///
    /// `GroupError::Validation` for a blank name or a bad member list
    #[instrument(skip(self, members), fields(members = members.len()))]
    pub async fn create_group(
        &self,
        name: &str,
        members: Vec<String>,
    ) -> Result<Group, GroupError> {
        let group = Group::create(name, members)?;
        let stored = self.port.create_group(&group).await?;
        info!(group_id = %stored.id(), "Created group");
        Ok(stored)
    }

    pub async fn get_group(&self, id: GroupId) -> Result<Group, GroupError> {
        Ok(self.port.get_group(id).await?)
    }

    /// All groups, newest first
    pub async fn list_groups(&self) -> Result<Vec<Group>, GroupError> {
        Ok(self.port.list_groups().await?)
    }

    #[instrument(skip(self), fields(group_id = %id))]
    pub async fn delete_group(&self, id: GroupId) -> Result<(), GroupError> {
        self.port.delete_group(id).await?;
        info!("Deleted group");
        Ok(())
    }

    /// Records an expense, equal or exact depending on `expense.split`
    ///
    /// # Returns
    ///
    /// The saved group and the id of the new entry
    ///
    /// # Errors
    ///
    /// - `GroupError::NotFound` if the group does not exist
    /// - `GroupError::Validation` if the expense is invalid; nothing is stored
    /// - `GroupError::Conflict` if concurrent writers exhausted the retries
    #[instrument(skip(self, expense), fields(group_id = %id, amount = %expense.amount))]
    pub async fn add_expense(
        &self,
        id: GroupId,
        expense: NewExpense,
    ) -> Result<(Group, EntryId), GroupError> {
        self.mutate(id, "add_expense", |group| group.add_expense(expense.clone()))
            .await
    }

    /// Records an expense with an explicit share per member
    ///
    /// The shares must add up to `amount` exactly.
    pub async fn add_expense_with_shares(
        &self,
        id: GroupId,
        description: &str,
        amount: Amount,
        paid_by: &str,
        shares: Vec<(String, Amount)>,
    ) -> Result<(Group, EntryId), GroupError> {
        self.add_expense(id, NewExpense::exact(description, amount, paid_by, shares))
            .await
    }

    /// Records a settlement from `payer` to `receiver`
    #[instrument(skip(self, amount), fields(group_id = %id, amount = %amount))]
    pub async fn settle(
        &self,
        id: GroupId,
        payer: &str,
        receiver: &str,
        amount: Amount,
    ) -> Result<(Group, EntryId), GroupError> {
        self.mutate(id, "settle", |group| group.settle(payer, receiver, amount))
            .await
    }

    #[instrument(skip(self), fields(group_id = %id))]
    pub async fn add_member(&self, id: GroupId, member: &str) -> Result<Group, GroupError> {
        let (group, ()) = self
            .mutate(id, "add_member", |group| group.add_member(member))
            .await?;
        Ok(group)
    }

    /// Rebuilds a group's balances from its log
    ///
    /// The group is only written back when the stored balances had drifted.
    #[instrument(skip(self), fields(group_id = %id))]
    pub async fn recalculate(&self, id: GroupId) -> Result<Recalculation, GroupError> {
        let mut retry = 0;
        loop {
            let mut group = self.port.get_group(id).await?;
            if !group.recalculate_balances() {
                debug!("Balances match the entry log");
                return Ok(Recalculation { group, drift: false });
            }

            match self.port.save_group(&group).await {
                Ok(saved) => {
                    info!(version = saved.version(), "Stored recalculated balances");
                    return Ok(Recalculation { group: saved, drift: true });
                }
                Err(err) if err.is_conflict() && retry < self.retry.max_retries => {
                    retry += 1;
                    self.back_off("recalculate", retry).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Balance summary of one member
    ///
    /// # Errors
    ///
    /// `GroupError::Validation` if the member is not in the group
    pub async fn balance_summary(
        &self,
        id: GroupId,
        member: &str,
    ) -> Result<BalanceSummary, GroupError> {
        let group = self.port.get_group(id).await?;
        BalanceSummary::for_member(&group, member).ok_or_else(|| not_a_member(member))
    }

    pub async fn overview(&self, id: GroupId) -> Result<GroupOverview, GroupError> {
        let group = self.port.get_group(id).await?;
        Ok(GroupOverview::of(&group))
    }

    /// Suggested settlement for a member, `None` if they owe nothing
    pub async fn suggest_settlement(
        &self,
        id: GroupId,
        member: &str,
    ) -> Result<Option<SettlementSuggestion>, GroupError> {
        let group = self.port.get_group(id).await?;
        if !group.is_member(member) {
            return Err(not_a_member(member));
        }
        Ok(SettlementSuggestion::for_member(&group, member))
    }

    /// What a member owes and is owed over every stored group
    pub async fn member_totals(&self, member: &str) -> Result<MemberTotals, GroupError> {
        let groups = self.port.list_groups().await?;
        Ok(member_totals(&groups, member))
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        self.port.health_check().await
    }

    /// Load, apply `op` to a copy, save; repeat on conflict
    async fn mutate<T, F>(
        &self,
        id: GroupId,
        operation: &'static str,
        mut op: F,
    ) -> Result<(Group, T), GroupError>
    where
        F: FnMut(&mut Group) -> Result<T, GroupError> + Send,
        T: Send,
    {
        let mut retry = 0;
        loop {
            let mut group = self.port.get_group(id).await?;
            let output = op(&mut group)?;

            match self.port.save_group(&group).await {
                Ok(saved) => {
                    debug!(operation, version = saved.version(), "Saved group");
                    return Ok((saved, output));
                }
                Err(err) if err.is_conflict() => {
                    if retry >= self.retry.max_retries {
                        warn!(operation, retries = retry, "Giving up after repeated conflicts");
                        return Err(GroupError::Conflict(format!(
                            "{} on group {} kept conflicting with concurrent updates",
                            operation, id
                        )));
                    }
                    retry += 1;
                    self.back_off(operation, retry).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn back_off(&self, operation: &str, retry: u32) {
        let delay = self.retry.delay_for(retry);
        debug!(operation, retry, delay_ms = delay.as_millis() as u64, "Retrying after conflict");
        tokio::time::sleep(delay).await;
    }
}

fn not_a_member(member: &str) -> GroupError {
    GroupError::validation(format!("'{}' is not a member of the group", member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::memory::InMemoryGroupPort;
    use rust_decimal_macros::dec;

    fn service() -> GroupService {
        GroupService::new(Arc::new(InMemoryGroupPort::new()))
    }

    fn abc() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    #[tokio::test]
    async fn test_expense_then_settle() {
        let service = service();
        let group = service.create_group("Trip", abc()).await.unwrap();

        let (saved, _) = service
            .add_expense(group.id(), NewExpense::equal("Dinner", Amount::new(dec!(300)), "A", abc()))
            .await
            .unwrap();
        assert_eq!(saved.version(), 1);

        let (saved, _) = service
            .settle(group.id(), "B", "A", Amount::new(dec!(100)))
            .await
            .unwrap();
        assert_eq!(saved.balance_of("A"), Some(Amount::new(dec!(-100))));
        assert_eq!(saved.version(), 2);
    }

    #[tokio::test]
    async fn test_exact_shares_must_match_amount() {
        let service = service();
        let group = service.create_group("Trip", abc()).await.unwrap();

        let shares = vec![
            ("A".to_string(), Amount::new(dec!(10))),
            ("B".to_string(), Amount::new(dec!(5))),
        ];
        let err = service
            .add_expense_with_shares(group.id(), "Taxi", Amount::new(dec!(20)), "A", shares.clone())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let (saved, _) = service
            .add_expense_with_shares(group.id(), "Taxi", Amount::new(dec!(15)), "A", shares)
            .await
            .unwrap();
        assert_eq!(saved.balance_of("A"), Some(Amount::new(dec!(-5))));
        assert_eq!(saved.balance_of("B"), Some(Amount::new(dec!(5))));
    }

    #[tokio::test]
    async fn test_invalid_expense_stores_nothing() {
        let service = service();
        let group = service.create_group("Trip", abc()).await.unwrap();

        let err = service
            .add_expense(group.id(), NewExpense::equal("Dinner", Amount::new(dec!(10)), "Z", abc()))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let stored = service.get_group(group.id()).await.unwrap();
        assert_eq!(stored.version(), 0);
        assert!(stored.expenses().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let err = service()
            .settle(GroupId::new_v7(), "A", "B", Amount::new(dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_balance_summary_of_non_member() {
        let service = service();
        let group = service.create_group("Trip", abc()).await.unwrap();
        let err = service.balance_summary(group.id(), "Z").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_recalculate_without_drift_does_not_save() {
        let service = service();
        let group = service.create_group("Trip", abc()).await.unwrap();

        let result = service.recalculate(group.id()).await.unwrap();
        assert!(!result.drift);
        assert_eq!(result.group.version(), 0);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        assert_eq!(policy.delay_for(1), Duration::from_millis(5));
        assert_eq!(policy.delay_for(3), Duration::from_millis(15));
    }
}
