use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{cancellation_policies, cancellation_rules};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = cancellation_policies)]
pub struct CancellationPolicyEntity {
    pub id: Uuid,
    pub name: String,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One refund tier. Bounds are hours-before-service; a `None` bound is open
/// in that direction. Rules are evaluated in `position` order.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Associations)]
#[diesel(table_name = cancellation_rules, belongs_to(CancellationPolicyEntity, foreign_key = policy_id))]
pub struct CancellationRuleEntity {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub position: i32,
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
    pub refund_percent: i32,
    pub notes: Option<String>,
}
