use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    repositories::cancellation_policies::{ActivePolicy, CancellationPolicyRepository},
    value_objects::{refunds::RefundComputation, schedule_time},
};

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("no active cancellation policy configured")]
    NoActivePolicy,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RefundError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            RefundError::NoActivePolicy => StatusCode::INTERNAL_SERVER_ERROR,
            RefundError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Tiered refund computation against the single active cancellation policy.
/// Read-only; the coordinator decides what to do with the result.
pub struct RefundEngine<C>
where
    C: CancellationPolicyRepository + 'static,
{
    policy_repo: Arc<C>,
}

impl<C> RefundEngine<C>
where
    C: CancellationPolicyRepository + 'static,
{
    pub fn new(policy_repo: Arc<C>) -> Self {
        Self { policy_repo }
    }

    pub async fn calculate_refund(
        &self,
        scheduled_at: DateTime<Utc>,
        paid_amount_minor: Option<i64>,
    ) -> Result<RefundComputation, RefundError> {
        self.calculate_refund_at(scheduled_at, paid_amount_minor, Utc::now())
            .await
    }

    pub async fn calculate_refund_at(
        &self,
        scheduled_at: DateTime<Utc>,
        paid_amount_minor: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<RefundComputation, RefundError> {
        let hours_until_service = schedule_time::hours_until(scheduled_at, now);

        let paid = match paid_amount_minor {
            Some(amount) if amount > 0 => amount,
            _ => {
                info!(
                    hours_until_service,
                    "refunds: nothing paid, nothing to refund"
                );
                return Ok(RefundComputation::nothing_to_refund(hours_until_service));
            }
        };

        let active = self
            .policy_repo
            .find_active_policy(now)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "refunds: failed to load active cancellation policy");
                RefundError::Internal(err)
            })?
            .ok_or_else(|| {
                error!("refunds: no active cancellation policy; refusing to guess a default");
                RefundError::NoActivePolicy
            })?;

        Ok(compute(&active, paid, hours_until_service))
    }
}

fn compute(active: &ActivePolicy, paid_amount_minor: i64, hours_until_service: f64) -> RefundComputation {
    let matched = active.rules.iter().find(|rule| {
        let above_min = rule.min_hours.map_or(true, |min| hours_until_service >= min);
        let below_max = rule.max_hours.map_or(true, |max| hours_until_service < max);
        above_min && below_max
    });

    // No matching bucket means the rule author left a gap; the last rule in
    // order is the most restrictive one and wins.
    let rule = match matched.or_else(|| active.rules.last()) {
        Some(rule) => rule,
        None => {
            warn!(
                policy = %active.policy.name,
                "refunds: active policy has no rules; treating as zero refund"
            );
            return RefundComputation::nothing_to_refund(hours_until_service);
        }
    };

    if matched.is_none() {
        warn!(
            policy = %active.policy.name,
            hours_until_service,
            "refunds: no rule matched, falling back to last rule"
        );
    }

    // The schema forbids percents outside 0-100, but a row written before the
    // constraint existed must still never refund more than was paid.
    let refund_percent = rule.refund_percent.clamp(0, 100);
    if refund_percent != rule.refund_percent {
        warn!(
            policy = %active.policy.name,
            rule_percent = rule.refund_percent,
            "refunds: rule percent outside 0-100, clamping"
        );
    }

    let refund_amount_minor = round_half_up_percent(paid_amount_minor, refund_percent);
    RefundComputation {
        refund_percent,
        refund_amount_minor,
        deduction_amount_minor: paid_amount_minor - refund_amount_minor,
        hours_until_service,
        rule_applied: Some(rule.notes.clone().unwrap_or_else(|| describe_rule(rule))),
    }
}

fn describe_rule(rule: &crate::domain::entities::cancellation_policies::CancellationRuleEntity) -> String {
    match (rule.min_hours, rule.max_hours) {
        (Some(min), Some(max)) => format!("{}-{}h before service: {}%", min, max, rule.refund_percent),
        (Some(min), None) => format!(">={}h before service: {}%", min, rule.refund_percent),
        (None, Some(max)) => format!("<{}h before service: {}%", max, rule.refund_percent),
        (None, None) => format!("any time: {}%", rule.refund_percent),
    }
}

/// Half-up rounding to whole minor units; non-negative inputs only.
fn round_half_up_percent(amount_minor: i64, percent: i32) -> i64 {
    (amount_minor * percent as i64 + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::cancellation_policies::{CancellationPolicyEntity, CancellationRuleEntity},
        repositories::cancellation_policies::MockCancellationPolicyRepository,
    };
    use chrono::Duration;
    use uuid::Uuid;

    fn rule(
        policy_id: Uuid,
        position: i32,
        min_hours: Option<f64>,
        max_hours: Option<f64>,
        refund_percent: i32,
    ) -> CancellationRuleEntity {
        CancellationRuleEntity {
            id: Uuid::new_v4(),
            policy_id,
            position,
            min_hours,
            max_hours,
            refund_percent,
            notes: None,
        }
    }

    /// [>=48h: 100%] [24-48h: 50%] [<24h: 0%]
    fn standard_policy() -> ActivePolicy {
        let policy_id = Uuid::new_v4();
        ActivePolicy {
            policy: CancellationPolicyEntity {
                id: policy_id,
                name: "standard".to_string(),
                effective_from: Utc::now() - Duration::days(30),
                effective_to: None,
                is_active: true,
                created_at: Utc::now(),
            },
            rules: vec![
                rule(policy_id, 1, Some(48.0), None, 100),
                rule(policy_id, 2, Some(24.0), Some(48.0), 50),
                rule(policy_id, 3, None, Some(24.0), 0),
            ],
        }
    }

    fn engine_with(active: Option<ActivePolicy>) -> RefundEngine<MockCancellationPolicyRepository> {
        let mut policy_repo = MockCancellationPolicyRepository::new();
        policy_repo
            .expect_find_active_policy()
            .returning(move |_| {
                let active = active.clone();
                Box::pin(async move { Ok(active) })
            });
        RefundEngine::new(Arc::new(policy_repo))
    }

    #[tokio::test]
    async fn thirty_hours_out_hits_the_fifty_percent_tier() {
        let engine = engine_with(Some(standard_policy()));
        let now = Utc::now();

        let computation = engine
            .calculate_refund_at(now + Duration::hours(30), Some(1000_00), now)
            .await
            .unwrap();

        assert_eq!(computation.refund_percent, 50);
        assert_eq!(computation.refund_amount_minor, 500_00);
        assert_eq!(computation.deduction_amount_minor, 500_00);
        assert!((computation.hours_until_service - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn far_out_cancellation_refunds_everything() {
        let engine = engine_with(Some(standard_policy()));
        let now = Utc::now();

        let computation = engine
            .calculate_refund_at(now + Duration::hours(72), Some(500_00), now)
            .await
            .unwrap();

        assert_eq!(computation.refund_percent, 100);
        assert_eq!(computation.refund_amount_minor, 500_00);
        assert_eq!(computation.deduction_amount_minor, 0);
    }

    #[tokio::test]
    async fn unpaid_booking_yields_zero_without_policy_lookup() {
        // No expectation set: touching the repo would panic the mock.
        let policy_repo = MockCancellationPolicyRepository::new();
        let engine = RefundEngine::new(Arc::new(policy_repo));
        let now = Utc::now();

        for paid in [None, Some(0), Some(-100)] {
            let computation = engine
                .calculate_refund_at(now + Duration::hours(30), paid, now)
                .await
                .unwrap();
            assert_eq!(computation.refund_amount_minor, 0);
            assert_eq!(computation.refund_percent, 0);
        }
    }

    #[tokio::test]
    async fn gap_in_rules_falls_back_to_last_rule() {
        let policy_id = Uuid::new_v4();
        let gappy = ActivePolicy {
            rules: vec![
                rule(policy_id, 1, Some(48.0), None, 100),
                // Nothing covers 24-48h.
                rule(policy_id, 2, None, Some(24.0), 10),
            ],
            ..standard_policy()
        };
        let engine = engine_with(Some(gappy));
        let now = Utc::now();

        let computation = engine
            .calculate_refund_at(now + Duration::hours(30), Some(1000_00), now)
            .await
            .unwrap();

        assert_eq!(computation.refund_percent, 10);
        assert_eq!(computation.refund_amount_minor, 100_00);
    }

    #[tokio::test]
    async fn percent_above_hundred_never_refunds_more_than_paid() {
        let policy_id = Uuid::new_v4();
        let misauthored = ActivePolicy {
            rules: vec![rule(policy_id, 1, None, None, 150)],
            ..standard_policy()
        };
        let engine = engine_with(Some(misauthored));
        let now = Utc::now();

        let computation = engine
            .calculate_refund_at(now + Duration::hours(30), Some(1000_00), now)
            .await
            .unwrap();

        assert_eq!(computation.refund_percent, 100);
        assert_eq!(computation.refund_amount_minor, 1000_00);
        assert_eq!(computation.deduction_amount_minor, 0);
    }

    #[tokio::test]
    async fn negative_percent_is_clamped_to_zero() {
        let policy_id = Uuid::new_v4();
        let misauthored = ActivePolicy {
            rules: vec![rule(policy_id, 1, None, None, -10)],
            ..standard_policy()
        };
        let engine = engine_with(Some(misauthored));
        let now = Utc::now();

        let computation = engine
            .calculate_refund_at(now + Duration::hours(30), Some(1000_00), now)
            .await
            .unwrap();

        assert_eq!(computation.refund_percent, 0);
        assert_eq!(computation.refund_amount_minor, 0);
        assert_eq!(computation.deduction_amount_minor, 1000_00);
    }

    #[tokio::test]
    async fn missing_active_policy_is_a_configuration_error() {
        let engine = engine_with(None);
        let now = Utc::now();

        let err = engine
            .calculate_refund_at(now + Duration::hours(30), Some(1000_00), now)
            .await
            .unwrap_err();

        assert!(matches!(err, RefundError::NoActivePolicy));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up_percent(99, 50), 50);
        assert_eq!(round_half_up_percent(101, 50), 51);
        assert_eq!(round_half_up_percent(333, 33), 110);
    }
}
