use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_refunds::InsertPaymentRefundEntity,
        repositories::payment_refunds::PaymentRefundRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_refunds},
};

pub struct PaymentRefundPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentRefundPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRefundRepository for PaymentRefundPostgres {
    async fn record_refund(&self, refund: InsertPaymentRefundEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let refund_id = insert_into(payment_refunds::table)
            .values(&refund)
            .returning(payment_refunds::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(refund_id)
    }
}
