use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::error;
use uuid::Uuid;

use crate::{
    application::{
        notify::NotificationSender,
        usecases::{
            lifecycle::{LifecycleError, LifecycleUseCase},
            otp_gate::{OtpGate, OtpPolicy},
            refunds::RefundEngine,
        },
    },
    config::config_model::DotEnvyConfig,
    domain::value_objects::{
        bookings::{CancelBookingModel, CreateBookingModel, SubmitOtpModel},
        enums::otp_types::OtpType,
    },
    infrastructure::{
        axum_http::auth::AuthUser,
        payments::gateway_client::GatewayClient,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, cancellation_policies::CancellationPolicyPostgres,
                payment_refunds::PaymentRefundPostgres, service_flow::ServiceFlowPostgres,
                service_otps::ServiceOtpPostgres,
            },
        },
    },
};

type Lifecycle = LifecycleUseCase<
    BookingPostgres,
    ServiceFlowPostgres,
    CancellationPolicyPostgres,
    ServiceOtpPostgres,
    PaymentRefundPostgres,
    GatewayClient,
>;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: &DotEnvyConfig,
    notifier: Arc<dyn NotificationSender>,
) -> Router {
    let booking_repository = BookingPostgres::new(Arc::clone(&db_pool));
    let flow_repository = ServiceFlowPostgres::new(Arc::clone(&db_pool));
    let policy_repository = CancellationPolicyPostgres::new(Arc::clone(&db_pool));
    let otp_repository = ServiceOtpPostgres::new(Arc::clone(&db_pool));
    let refund_repository = PaymentRefundPostgres::new(Arc::clone(&db_pool));
    let gateway = GatewayClient::new(
        config.payment_gateway.base_url.clone(),
        config.payment_gateway.key_id.clone(),
        config.payment_gateway.key_secret.clone(),
    );

    let lifecycle_usecase = LifecycleUseCase::new(
        Arc::new(booking_repository),
        Arc::new(flow_repository),
        RefundEngine::new(Arc::new(policy_repository)),
        OtpGate::new(
            Arc::new(otp_repository),
            OtpPolicy {
                ttl_minutes: config.service_otp.ttl_minutes,
                enforce_expiry: config.service_otp.enforce_expiry,
            },
        ),
        Arc::new(refund_repository),
        Arc::new(gateway),
        notifier,
        config.wallet.maturation_days,
    );

    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:booking_id", get(get_booking))
        .route("/:booking_id/cancel", post(cancel_booking))
        .route("/:booking_id/refund-preview", get(refund_preview))
        .route("/:booking_id/start-otp", post(request_start_otp))
        .route("/:booking_id/end-otp", post(request_end_otp))
        .route("/:booking_id/start", post(start_service))
        .route("/:booking_id/complete", post(complete_service))
        .with_state(Arc::new(lifecycle_usecase))
}

pub async fn create_booking(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Json(model): Json<CreateBookingModel>,
) -> Response {
    match lifecycle_usecase.create_booking(user.user_id, model).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => map_error("create_booking", err),
    }
}

pub async fn list_bookings(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
) -> Response {
    match lifecycle_usecase.list_bookings(user.user_id).await {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(err) => map_error("list_bookings", err),
    }
}

pub async fn get_booking(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response {
    match lifecycle_usecase.get_booking(user.user_id, booking_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => map_error("get_booking", err),
    }
}

pub async fn cancel_booking(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(model): Json<CancelBookingModel>,
) -> Response {
    match lifecycle_usecase
        .cancel_booking(user.user_id, booking_id, model)
        .await
    {
        Ok(cancelled) => (StatusCode::OK, Json(cancelled)).into_response(),
        Err(err) => map_error("cancel_booking", err),
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct RefundPreviewParams {
    pub amount_minor: Option<i64>,
}

pub async fn refund_preview(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
    Query(params): Query<RefundPreviewParams>,
) -> Response {
    match lifecycle_usecase
        .refund_preview(user.user_id, booking_id, params.amount_minor)
        .await
    {
        Ok(computation) => (StatusCode::OK, Json(computation)).into_response(),
        Err(err) => map_error("refund_preview", err),
    }
}

pub async fn request_start_otp(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response {
    match lifecycle_usecase
        .request_service_otp(user.user_id, booking_id, OtpType::Start)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => map_error("request_start_otp", err),
    }
}

pub async fn request_end_otp(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response {
    match lifecycle_usecase
        .request_service_otp(user.user_id, booking_id, OtpType::End)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => map_error("request_end_otp", err),
    }
}

pub async fn start_service(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(model): Json<SubmitOtpModel>,
) -> Response {
    match lifecycle_usecase
        .start_service(user.user_id, booking_id, &model.otp)
        .await
    {
        Ok(transition) => (StatusCode::OK, Json(transition)).into_response(),
        Err(err) => map_error("start_service", err),
    }
}

pub async fn complete_service(
    State(lifecycle_usecase): State<Arc<Lifecycle>>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(model): Json<SubmitOtpModel>,
) -> Response {
    match lifecycle_usecase
        .complete_service(user.user_id, booking_id, &model.otp)
        .await
    {
        Ok(completion) => (StatusCode::OK, Json(completion)).into_response(),
        Err(err) => map_error("complete_service", err),
    }
}

fn map_error(label: &str, err: LifecycleError) -> Response {
    let status = err.status_code();
    let message = match &err {
        // Internal details stay in the logs, not the response body.
        LifecycleError::Internal(_) | LifecycleError::NoActivePolicy => {
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };

    error!(
        status = status.as_u16(),
        error = %err,
        "bookings: {} failed",
        label
    );
    (status, message).into_response()
}
