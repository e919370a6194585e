use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::service_otps;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = service_otps)]
pub struct ServiceOtpEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub otp_type: String,
    pub code: String,
    pub used: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = service_otps)]
pub struct InsertServiceOtpEntity {
    pub booking_id: Uuid,
    pub otp_type: String,
    pub code: String,
    pub used: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
