use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::service_otps::InsertServiceOtpEntity,
        repositories::service_otps::ServiceOtpRepository,
        value_objects::{enums::otp_types::OtpType, service_flow::OtpConsume},
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::service_otps},
};

pub struct ServiceOtpPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ServiceOtpPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Marks every unused code of the same (booking, type) as used before
/// inserting the replacement, so at most one code per type can ever verify.
pub(crate) fn supersede_and_issue_in_tx(
    conn: &mut PgConnection,
    insert_entity: &InsertServiceOtpEntity,
    now: DateTime<Utc>,
) -> Result<Uuid, diesel::result::Error> {
    update(service_otps::table)
        .filter(service_otps::booking_id.eq(insert_entity.booking_id))
        .filter(service_otps::otp_type.eq(&insert_entity.otp_type))
        .filter(service_otps::used.eq(false))
        .set((
            service_otps::used.eq(true),
            service_otps::used_at.eq(Some(now)),
        ))
        .execute(conn)?;

    insert_into(service_otps::table)
        .values(insert_entity)
        .returning(service_otps::id)
        .get_result::<Uuid>(conn)
}

/// Conditional consume shared with the service-flow transactions: flips
/// `used` on the single matching unused code, distinguishing an expired
/// match from no match at all.
pub(crate) fn consume_in_tx(
    conn: &mut PgConnection,
    booking_id: Uuid,
    otp_type: OtpType,
    submitted_code: &str,
    now: DateTime<Utc>,
    enforce_expiry: bool,
) -> Result<OtpConsume, diesel::result::Error> {
    let mark_used = (
        service_otps::used.eq(true),
        service_otps::used_at.eq(Some(now)),
    );

    let updated = if enforce_expiry {
        update(service_otps::table)
            .filter(service_otps::booking_id.eq(booking_id))
            .filter(service_otps::otp_type.eq(otp_type.to_string()))
            .filter(service_otps::code.eq(submitted_code))
            .filter(service_otps::used.eq(false))
            .filter(
                service_otps::expires_at
                    .is_null()
                    .or(service_otps::expires_at.gt(now)),
            )
            .set(mark_used)
            .execute(conn)?
    } else {
        update(service_otps::table)
            .filter(service_otps::booking_id.eq(booking_id))
            .filter(service_otps::otp_type.eq(otp_type.to_string()))
            .filter(service_otps::code.eq(submitted_code))
            .filter(service_otps::used.eq(false))
            .set(mark_used)
            .execute(conn)?
    };

    if updated > 0 {
        return Ok(OtpConsume::Consumed);
    }

    // Nothing flipped: either the code never matched, or it matched but sat
    // past its expiry.
    let expired_matches: i64 = service_otps::table
        .filter(service_otps::booking_id.eq(booking_id))
        .filter(service_otps::otp_type.eq(otp_type.to_string()))
        .filter(service_otps::code.eq(submitted_code))
        .filter(service_otps::used.eq(false))
        .filter(service_otps::expires_at.le(now))
        .count()
        .get_result(conn)?;

    if expired_matches > 0 {
        Ok(OtpConsume::Expired)
    } else {
        Ok(OtpConsume::NotFound)
    }
}

#[async_trait]
impl ServiceOtpRepository for ServiceOtpPostgres {
    async fn supersede_and_issue(
        &self,
        booking_id: Uuid,
        otp_type: OtpType,
        code: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let insert_entity = InsertServiceOtpEntity {
            booking_id,
            otp_type: otp_type.to_string(),
            code: code.to_string(),
            used: false,
            expires_at,
        };

        let otp_id = conn.transaction::<Uuid, diesel::result::Error, _>(|tx| {
            supersede_and_issue_in_tx(tx, &insert_entity, Utc::now())
        })?;

        Ok(otp_id)
    }

    async fn consume(
        &self,
        booking_id: Uuid,
        otp_type: OtpType,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
    ) -> Result<OtpConsume> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<OtpConsume, diesel::result::Error, _>(|tx| {
            consume_in_tx(tx, booking_id, otp_type, submitted_code, now, enforce_expiry)
        })?;

        Ok(outcome)
    }
}

// Run with `cargo test -- --ignored` against a migrated database; every test
// stays inside a rolled-back test transaction.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::postgres::schema::bookings;
    use chrono::Duration;
    use diesel::Connection;

    fn test_connection() -> PgConnection {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a migrated database");
        let mut conn =
            PgConnection::establish(&database_url).expect("failed to connect to test database");
        conn.begin_test_transaction()
            .expect("failed to open test transaction");
        conn
    }

    fn seed_booking(conn: &mut PgConnection) -> Uuid {
        insert_into(bookings::table)
            .values((
                bookings::owner_id.eq(Uuid::new_v4()),
                bookings::pet_id.eq(Uuid::new_v4()),
                bookings::service_id.eq(Uuid::new_v4()),
                bookings::scheduled_at.eq(Utc::now() + Duration::hours(4)),
                bookings::duration_minutes.eq(60),
                bookings::status.eq("confirmed"),
                bookings::total_amount_minor.eq(50_000_i64),
                bookings::payment_status.eq("paid"),
            ))
            .returning(bookings::id)
            .get_result(conn)
            .expect("failed to seed booking")
    }

    fn otp(booking_id: Uuid, code: &str, expires_at: Option<DateTime<Utc>>) -> InsertServiceOtpEntity {
        InsertServiceOtpEntity {
            booking_id,
            otp_type: OtpType::Start.to_string(),
            code: code.to_string(),
            used: false,
            expires_at,
        }
    }

    #[test]
    #[ignore = "needs DATABASE_URL"]
    fn reissued_code_invalidates_the_prior_code() {
        let mut conn = test_connection();
        let booking_id = seed_booking(&mut conn);
        let now = Utc::now();

        supersede_and_issue_in_tx(&mut conn, &otp(booking_id, "111111", None), now).unwrap();
        supersede_and_issue_in_tx(&mut conn, &otp(booking_id, "222222", None), now).unwrap();

        let prior = consume_in_tx(&mut conn, booking_id, OtpType::Start, "111111", now, true).unwrap();
        assert_eq!(prior, OtpConsume::NotFound);

        let current =
            consume_in_tx(&mut conn, booking_id, OtpType::Start, "222222", now, true).unwrap();
        assert_eq!(current, OtpConsume::Consumed);
    }

    #[test]
    #[ignore = "needs DATABASE_URL"]
    fn consumed_code_cannot_verify_twice() {
        let mut conn = test_connection();
        let booking_id = seed_booking(&mut conn);
        let now = Utc::now();

        supersede_and_issue_in_tx(&mut conn, &otp(booking_id, "333333", None), now).unwrap();

        let first = consume_in_tx(&mut conn, booking_id, OtpType::Start, "333333", now, true).unwrap();
        assert_eq!(first, OtpConsume::Consumed);

        let second =
            consume_in_tx(&mut conn, booking_id, OtpType::Start, "333333", now, true).unwrap();
        assert_eq!(second, OtpConsume::NotFound);
    }

    #[test]
    #[ignore = "needs DATABASE_URL"]
    fn expired_code_reports_expired_not_missing() {
        let mut conn = test_connection();
        let booking_id = seed_booking(&mut conn);
        let now = Utc::now();

        let expired_at = Some(now - Duration::minutes(1));
        supersede_and_issue_in_tx(&mut conn, &otp(booking_id, "444444", expired_at), now).unwrap();

        let outcome =
            consume_in_tx(&mut conn, booking_id, OtpType::Start, "444444", now, true).unwrap();
        assert_eq!(outcome, OtpConsume::Expired);
    }
}
