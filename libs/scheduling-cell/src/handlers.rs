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

use crate::models::{
    DayOfWeek, DayScheduleResponse, SchedulingError, SlotQuery, UpsertDayScheduleRequest,
};
use crate::services::{AvailabilityService, ScheduleService};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub step_minutes: Option<i32>,
}

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::InvalidDuration(_) | SchedulingError::InvalidStep(_) => {
            AppError::BadRequest(e.to_string())
        }
        SchedulingError::Validation(msg) => AppError::ValidationError(msg),
        SchedulingError::Storage(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots_public(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let slot_query = SlotQuery {
        date: query.date,
        duration_minutes: query.duration_minutes,
        step_minutes: query.step_minutes,
    };

    let slots = availability_service
        .get_available_slots(professional_id, &slot_query, None)
        .await
        .map_err(map_scheduling_error)?;

    let labels: Vec<String> = slots.iter().map(|slot| slot.start_label()).collect();

    Ok(Json(json!({
        "professional_id": professional_id,
        "date": query.date,
        "duration_minutes": query.duration_minutes,
        "slots": labels,
        "total_slots": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn get_schedule_public(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let weekly = schedule_service
        .get_weekly_availability(professional_id, None)
        .await
        .map_err(map_scheduling_error)?;

    let days: Vec<DayScheduleResponse> = (0..7)
        .filter_map(DayOfWeek::from_index)
        .map(|day| {
            let schedule = weekly
                .days
                .get(&day)
                .cloned()
                .unwrap_or_else(crate::models::DaySchedule::closed);
            DayScheduleResponse {
                day,
                is_available: schedule.is_available,
                windows: schedule.windows,
            }
        })
        .collect();

    Ok(Json(json!({
        "professional_id": professional_id,
        "days": days
    })))
}

// ==============================================================================
// SCHEDULE MANAGEMENT HANDLERS (Professional Configuration)
// ==============================================================================

#[axum::debug_handler]
pub async fn upsert_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Path((professional_id, day)): Path<(Uuid, DayOfWeek)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertDayScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    // Only the professional themselves or an admin can edit the schedule
    if !user.is_admin() && user.id != professional_id.to_string() {
        return Err(AppError::Auth(
            "Not authorized to edit this professional's schedule".to_string(),
        ));
    }

    let schedule_service = ScheduleService::new(&state);

    let row = schedule_service
        .upsert_day_schedule(professional_id, day, request, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!(row)))
}
