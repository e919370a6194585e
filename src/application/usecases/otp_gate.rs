use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::service_otps::ServiceOtpRepository,
    value_objects::{enums::otp_types::OtpType, service_flow::OtpConsume},
};

/// Expiry handling for one OTP purpose. Service start/end codes enforce
/// expiry; other purposes (e.g. login, out of scope here) may not, so the
/// policy is configuration rather than a global rule.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    pub ttl_minutes: i64,
    pub enforce_expiry: bool,
}

impl OtpPolicy {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.ttl_minutes > 0).then(|| now + Duration::minutes(self.ttl_minutes))
    }
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("verification code expired")]
    Expired,
    #[error("invalid verification code")]
    Invalid,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OtpError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OtpError::Expired | OtpError::Invalid => StatusCode::CONFLICT,
            OtpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Issues and single-use-verifies the short numeric codes that gate service
/// start and end.
pub struct OtpGate<O>
where
    O: ServiceOtpRepository + 'static,
{
    otp_repo: Arc<O>,
    policy: OtpPolicy,
}

impl<O> OtpGate<O>
where
    O: ServiceOtpRepository + 'static,
{
    pub fn new(otp_repo: Arc<O>, policy: OtpPolicy) -> Self {
        Self { otp_repo, policy }
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    /// Generates a fresh zero-padded 6-digit code, superseding any prior
    /// unused code of the same type for the same booking.
    pub async fn issue(&self, booking_id: Uuid, otp_type: OtpType) -> Result<String, OtpError> {
        let code = generate_code();
        let expires_at = self.policy.expires_at(Utc::now());

        self.otp_repo
            .supersede_and_issue(booking_id, otp_type, &code, expires_at)
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    otp_type = %otp_type,
                    db_error = ?err,
                    "otp_gate: failed to issue code"
                );
                OtpError::Internal(err)
            })?;

        info!(%booking_id, otp_type = %otp_type, "otp_gate: code issued");
        Ok(code)
    }

    /// Verify-and-consume as one atomic repository operation; a code can
    /// succeed at most once, ever.
    pub async fn verify(
        &self,
        booking_id: Uuid,
        otp_type: OtpType,
        submitted_code: &str,
    ) -> Result<(), OtpError> {
        let outcome = self
            .otp_repo
            .consume(
                booking_id,
                otp_type,
                submitted_code,
                Utc::now(),
                self.policy.enforce_expiry,
            )
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    otp_type = %otp_type,
                    db_error = ?err,
                    "otp_gate: failed to consume code"
                );
                OtpError::Internal(err)
            })?;

        match outcome {
            OtpConsume::Consumed => {
                info!(%booking_id, otp_type = %otp_type, "otp_gate: code verified and consumed");
                Ok(())
            }
            OtpConsume::Expired => {
                warn!(%booking_id, otp_type = %otp_type, "otp_gate: code expired");
                Err(OtpError::Expired)
            }
            OtpConsume::NotFound => {
                warn!(%booking_id, otp_type = %otp_type, "otp_gate: code invalid or already used");
                Err(OtpError::Invalid)
            }
        }
    }
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::service_otps::MockServiceOtpRepository;
    use mockall::predicate::{always, eq};

    fn policy() -> OtpPolicy {
        OtpPolicy {
            ttl_minutes: 10,
            enforce_expiry: true,
        }
    }

    #[test]
    fn codes_are_six_zero_padded_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let no_ttl = OtpPolicy {
            ttl_minutes: 0,
            enforce_expiry: false,
        };
        assert!(no_ttl.expires_at(Utc::now()).is_none());
        assert!(policy().expires_at(Utc::now()).is_some());
    }

    #[tokio::test]
    async fn issue_supersedes_through_repository_with_expiry() {
        let booking_id = Uuid::new_v4();
        let mut otp_repo = MockServiceOtpRepository::new();
        otp_repo
            .expect_supersede_and_issue()
            .withf(move |id, otp_type, code, expires_at| {
                *id == booking_id
                    && *otp_type == OtpType::Start
                    && code.len() == 6
                    && expires_at.is_some()
            })
            .returning(|_, _, _, _| Box::pin(async { Ok(Uuid::new_v4()) }));

        let gate = OtpGate::new(Arc::new(otp_repo), policy());
        let code = gate.issue(booking_id, OtpType::Start).await.unwrap();
        assert_eq!(code.len(), 6);
    }

    #[tokio::test]
    async fn same_code_verifies_exactly_once() {
        let booking_id = Uuid::new_v4();
        let mut otp_repo = MockServiceOtpRepository::new();
        let mut consumed = false;
        otp_repo
            .expect_consume()
            .with(eq(booking_id), eq(OtpType::End), eq("123456"), always(), eq(true))
            .returning(move |_, _, _, _, _| {
                let outcome = if consumed {
                    OtpConsume::NotFound
                } else {
                    consumed = true;
                    OtpConsume::Consumed
                };
                Box::pin(async move { Ok(outcome) })
            });

        let gate = OtpGate::new(Arc::new(otp_repo), policy());
        gate.verify(booking_id, OtpType::End, "123456").await.unwrap();
        let second = gate.verify(booking_id, OtpType::End, "123456").await;
        assert!(matches!(second, Err(OtpError::Invalid)));
    }

    #[tokio::test]
    async fn expired_code_gets_its_own_reason() {
        let booking_id = Uuid::new_v4();
        let mut otp_repo = MockServiceOtpRepository::new();
        otp_repo
            .expect_consume()
            .returning(|_, _, _, _, _| Box::pin(async { Ok(OtpConsume::Expired) }));

        let gate = OtpGate::new(Arc::new(otp_repo), policy());
        let result = gate.verify(booking_id, OtpType::Start, "000000").await;
        assert!(matches!(result, Err(OtpError::Expired)));
    }
}
