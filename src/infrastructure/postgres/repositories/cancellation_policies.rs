use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    domain::{
        entities::cancellation_policies::{CancellationPolicyEntity, CancellationRuleEntity},
        repositories::cancellation_policies::{ActivePolicy, CancellationPolicyRepository},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{cancellation_policies, cancellation_rules},
    },
};

pub struct CancellationPolicyPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CancellationPolicyPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CancellationPolicyRepository for CancellationPolicyPostgres {
    async fn find_active_policy(&self, now: DateTime<Utc>) -> Result<Option<ActivePolicy>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let policy = cancellation_policies::table
            .select(CancellationPolicyEntity::as_select())
            .filter(cancellation_policies::is_active.eq(true))
            .filter(cancellation_policies::effective_from.le(now))
            .filter(
                cancellation_policies::effective_to
                    .is_null()
                    .or(cancellation_policies::effective_to.gt(now)),
            )
            .order(cancellation_policies::effective_from.desc())
            .first::<CancellationPolicyEntity>(&mut conn)
            .optional()?;

        let Some(policy) = policy else {
            return Ok(None);
        };

        let rules = CancellationRuleEntity::belonging_to(&policy)
            .select(CancellationRuleEntity::as_select())
            .order(cancellation_rules::position.asc())
            .load::<CancellationRuleEntity>(&mut conn)?;

        Ok(Some(ActivePolicy { policy, rules }))
    }
}
