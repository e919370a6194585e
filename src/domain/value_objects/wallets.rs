use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::wallets::{WalletEntity, WalletTransactionEntity},
    value_objects::enums::wallet_transactions::{WalletTransactionStatus, WalletTransactionType},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletBalanceModel {
    pub sitter_id: Uuid,
    pub pending_amount_minor: i64,
    pub available_amount_minor: i64,
    pub total_earnings_minor: i64,
}

impl From<WalletEntity> for WalletBalanceModel {
    fn from(entity: WalletEntity) -> Self {
        Self {
            sitter_id: entity.sitter_id,
            pending_amount_minor: entity.pending_amount_minor,
            available_amount_minor: entity.available_amount_minor,
            total_earnings_minor: entity.total_earnings_minor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletTransactionModel {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: WalletTransactionType,
    pub status: WalletTransactionStatus,
    pub description: Option<String>,
    pub available_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransactionEntity> for WalletTransactionModel {
    fn from(entity: WalletTransactionEntity) -> Self {
        Self {
            id: entity.id,
            booking_id: entity.booking_id,
            amount_minor: entity.amount_minor,
            transaction_type: WalletTransactionType::from_str(&entity.transaction_type)
                .unwrap_or(WalletTransactionType::Adjustment),
            status: WalletTransactionStatus::from_str(&entity.status).unwrap_or_default(),
            description: entity.description,
            available_at: entity.available_at,
            created_at: entity.created_at,
        }
    }
}

/// Result of an earning credit attempt. A repeat credit for the same booking
/// reports `Duplicate` instead of inserting a second transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Credited(Uuid),
    Duplicate,
}
