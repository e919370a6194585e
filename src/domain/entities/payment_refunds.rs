use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_refunds;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_refunds)]
pub struct PaymentRefundEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub gateway_refund_id: Option<String>,
    pub amount_minor: i64,
    pub status: String,
    pub gateway_response: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_refunds)]
pub struct InsertPaymentRefundEntity {
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub gateway_refund_id: Option<String>,
    pub amount_minor: i64,
    pub status: String,
    pub gateway_response: Option<Value>,
}
