use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Appointment, BookAppointmentRequest, BookingError, CancelAppointmentRequest};
use crate::services::BookingService;

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub professional_id: Uuid,
    pub date: NaiveDate,
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => AppError::NotFound(e.to_string()),
        BookingError::ConflictDetected
        | BookingError::ProfessionalUnavailable
        | BookingError::InvalidStatusTransition(_, _) => AppError::Conflict(e.to_string()),
        BookingError::ServiceNotFound(_) | BookingError::InvalidTime(_) => {
            AppError::BadRequest(e.to_string())
        }
        BookingError::Validation(msg) => AppError::ValidationError(msg),
        BookingError::Database(msg) => AppError::Database(msg),
    }
}

fn is_participant(user: &User, appointment: &Appointment) -> bool {
    user.is_admin()
        || user.id == appointment.client_id.to_string()
        || user.id == appointment.professional_id.to_string()
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_appointment(&user, request, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_booking_error)?;

    if !is_participant(&user, &appointment) {
        return Err(AppError::Auth(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_booking_error)?;

    // Only the professional or an admin confirms a booking
    if !user.is_admin() && user.id != appointment.professional_id.to_string() {
        return Err(AppError::Auth(
            "Not authorized to confirm this appointment".to_string(),
        ));
    }

    let confirmed = booking_service
        .confirm_appointment(appointment_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(confirmed)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_booking_error)?;

    if !is_participant(&user, &appointment) {
        return Err(AppError::Auth(
            "Not authorized to cancel this appointment".to_string(),
        ));
    }

    let cancelled = booking_service
        .cancel_appointment(appointment_id, request, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(cancelled)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Day listings belong to the professional's own dashboard
    if !user.is_admin() && user.id != query.professional_id.to_string() {
        return Err(AppError::Auth(
            "Not authorized to list appointments for this professional".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .list_for_professional(query.professional_id, query.date, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "professional_id": query.professional_id,
        "date": query.date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}
