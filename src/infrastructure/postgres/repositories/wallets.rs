use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::wallets::{InsertWalletTransactionEntity, WalletEntity, WalletTransactionEntity},
        repositories::wallets::WalletRepository,
        value_objects::{
            enums::wallet_transactions::{WalletTransactionStatus, WalletTransactionType},
            wallets::CreditOutcome,
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{wallet_transactions, wallets},
    },
};

pub struct WalletPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WalletPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Earning credit shared with the completion transaction. Locks (or creates)
/// the sitter wallet, refuses a second earning for the same booking, then
/// inserts the pending transaction and bumps the wallet counters together.
pub(crate) fn credit_earning_in_tx(
    conn: &mut PgConnection,
    sitter_id: Uuid,
    booking_id: Uuid,
    amount_minor: i64,
    description: &str,
    available_at: DateTime<Utc>,
) -> Result<CreditOutcome, diesel::result::Error> {
    let existing = wallets::table
        .filter(wallets::sitter_id.eq(sitter_id))
        .select(WalletEntity::as_select())
        .for_update()
        .first::<WalletEntity>(conn)
        .optional()?;

    let wallet_id = match existing {
        Some(wallet) => wallet.id,
        None => insert_into(wallets::table)
            .values((
                wallets::sitter_id.eq(sitter_id),
                wallets::pending_amount_minor.eq(0_i64),
                wallets::available_amount_minor.eq(0_i64),
                wallets::total_earnings_minor.eq(0_i64),
            ))
            .returning(wallets::id)
            .get_result::<Uuid>(conn)?,
    };

    let already_credited: i64 = wallet_transactions::table
        .filter(wallet_transactions::wallet_id.eq(wallet_id))
        .filter(wallet_transactions::booking_id.eq(booking_id))
        .filter(wallet_transactions::transaction_type.eq(WalletTransactionType::Earning.to_string()))
        .count()
        .get_result(conn)?;
    if already_credited > 0 {
        return Ok(CreditOutcome::Duplicate);
    }

    let transaction_id: Uuid = insert_into(wallet_transactions::table)
        .values(&InsertWalletTransactionEntity {
            wallet_id,
            booking_id: Some(booking_id),
            amount_minor,
            transaction_type: WalletTransactionType::Earning.to_string(),
            status: WalletTransactionStatus::Pending.to_string(),
            description: Some(description.to_string()),
            available_at: Some(available_at),
        })
        .returning(wallet_transactions::id)
        .get_result::<Uuid>(conn)?;

    update(wallets::table.find(wallet_id))
        .set((
            wallets::pending_amount_minor.eq(wallets::pending_amount_minor + amount_minor),
            wallets::total_earnings_minor.eq(wallets::total_earnings_minor + amount_minor),
            wallets::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    Ok(CreditOutcome::Credited(transaction_id))
}

#[async_trait]
impl WalletRepository for WalletPostgres {
    async fn find_wallet(&self, sitter_id: Uuid) -> Result<Option<WalletEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let wallet = wallets::table
            .filter(wallets::sitter_id.eq(sitter_id))
            .select(WalletEntity::as_select())
            .first::<WalletEntity>(&mut conn)
            .optional()?;

        Ok(wallet)
    }

    async fn list_transactions(&self, sitter_id: Uuid) -> Result<Vec<WalletTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = wallet_transactions::table
            .inner_join(wallets::table)
            .filter(wallets::sitter_id.eq(sitter_id))
            .select(WalletTransactionEntity::as_select())
            .order(wallet_transactions::created_at.desc())
            .load::<WalletTransactionEntity>(&mut conn)?;

        Ok(results)
    }
}
