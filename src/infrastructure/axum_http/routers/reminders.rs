use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::error;

use crate::{
    application::{notify::NotificationSender, usecases::reminders::ReminderSweepUseCase},
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad, repositories::reminders::ReminderPostgres,
    },
};

type ReminderSweep = ReminderSweepUseCase<ReminderPostgres>;

/// Invoked by the scheduler (cron or an external trigger); safe to call as
/// often as you like because every reminder is claimed before it is sent.
pub fn routes(db_pool: Arc<PgPoolSquad>, notifier: Arc<dyn NotificationSender>) -> Router {
    let reminder_repository = ReminderPostgres::new(Arc::clone(&db_pool));
    let sweep_usecase = ReminderSweepUseCase::new(Arc::new(reminder_repository), notifier);

    Router::new()
        .route("/sweep", post(sweep))
        .with_state(Arc::new(sweep_usecase))
}

pub async fn sweep(State(sweep_usecase): State<Arc<ReminderSweep>>) -> Response {
    match sweep_usecase.sweep().await {
        Ok(dispatched) => (StatusCode::OK, Json(json!({ "dispatched": dispatched }))).into_response(),
        Err(err) => {
            error!(error = %err, "reminders: sweep failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
