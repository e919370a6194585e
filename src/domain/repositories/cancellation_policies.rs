use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::entities::cancellation_policies::{
    CancellationPolicyEntity, CancellationRuleEntity,
};

/// The single policy in force at `now`, with its rules in position order.
#[derive(Debug, Clone)]
pub struct ActivePolicy {
    pub policy: CancellationPolicyEntity,
    pub rules: Vec<CancellationRuleEntity>,
}

#[async_trait]
#[automock]
pub trait CancellationPolicyRepository: Send + Sync {
    /// Most recent `effective_from` among active policies covering `now`.
    /// `None` is a configuration error for the refund engine, never a
    /// silent default.
    async fn find_active_policy(&self, now: DateTime<Utc>) -> Result<Option<ActivePolicy>>;
}
