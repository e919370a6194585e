use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{wallet_transactions, wallets};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = wallets)]
pub struct WalletEntity {
    pub id: Uuid,
    pub sitter_id: Uuid,
    pub pending_amount_minor: i64,
    pub available_amount_minor: i64,
    pub total_earnings_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = wallet_transactions)]
pub struct WalletTransactionEntity {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub status: String,
    pub description: Option<String>,
    pub available_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_transactions)]
pub struct InsertWalletTransactionEntity {
    pub wallet_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub status: String,
    pub description: Option<String>,
    pub available_at: Option<DateTime<Utc>>,
}
