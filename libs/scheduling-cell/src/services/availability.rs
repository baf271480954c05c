use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{AvailableSlot, BookedInterval, SchedulingError, SlotQuery, WeeklyAvailability};
use crate::services::schedule::ScheduleService;
use crate::services::slots::{filter_available, generate_candidate_slots, DEFAULT_STEP_MINUTES};

/// Weekly-schedule lookup consumed by the slot computation.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn weekly_availability(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<WeeklyAvailability, SchedulingError>;
}

/// Occupancy lookup consumed by the slot computation. Implementations must
/// return only appointments in an active (slot-blocking) state.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn appointments_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<BookedInterval>, SchedulingError>;
}

#[async_trait]
impl AvailabilitySource for ScheduleService {
    async fn weekly_availability(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<WeeklyAvailability, SchedulingError> {
        self.get_weekly_availability(professional_id, auth_token).await
    }
}

pub struct StoreAppointmentSource {
    store: Arc<StoreClient>,
}

impl StoreAppointmentSource {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct AppointmentInterval {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[async_trait]
impl AppointmentSource for StoreAppointmentSource {
    async fn appointments_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<BookedInterval>, SchedulingError> {
        let start_of_day = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SchedulingError::Storage("Invalid date".to_string()))?
            .and_utc();
        let end_of_day = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| SchedulingError::Storage("Invalid date".to_string()))?
            .and_utc();

        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&start_time=gte.{}&start_time=lte.{}&status=in.(pending,confirmed,in_progress)&order=start_time.asc",
            professional_id,
            start_of_day.to_rfc3339(),
            end_of_day.to_rfc3339()
        );

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?;

        let intervals = result
            .into_iter()
            .map(serde_json::from_value::<AppointmentInterval>)
            .collect::<Result<Vec<AppointmentInterval>, _>>()
            .map_err(|e| {
                SchedulingError::Storage(format!("Failed to parse appointments: {}", e))
            })?;

        Ok(intervals
            .into_iter()
            .map(|apt| BookedInterval {
                start: apt.start_time,
                end: apt.end_time,
            })
            .collect())
    }
}

/// The booking entry point: resolve the day's working windows, enumerate
/// candidate start times, drop ones colliding with existing appointments.
pub struct AvailabilityService {
    availability: Arc<dyn AvailabilitySource>,
    appointments: Arc<dyn AppointmentSource>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(config));
        Self {
            availability: Arc::new(ScheduleService::with_store(Arc::clone(&store))),
            appointments: Arc::new(StoreAppointmentSource::new(store)),
        }
    }

    pub fn with_sources(
        availability: Arc<dyn AvailabilitySource>,
        appointments: Arc<dyn AppointmentSource>,
    ) -> Self {
        Self {
            availability,
            appointments,
        }
    }

    pub async fn get_available_slots(
        &self,
        professional_id: Uuid,
        query: &SlotQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        debug!(
            "Computing available slots for professional {} on {}",
            professional_id, query.date
        );

        if query.duration_minutes <= 0 {
            return Err(SchedulingError::InvalidDuration(query.duration_minutes));
        }
        let step_minutes = query.step_minutes.unwrap_or(DEFAULT_STEP_MINUTES);
        if step_minutes <= 0 {
            return Err(SchedulingError::InvalidStep(step_minutes));
        }

        let weekly = self
            .availability
            .weekly_availability(professional_id, auth_token)
            .await?;

        let schedule = weekly.resolve(query.date);
        if !schedule.is_available || schedule.windows.is_empty() {
            debug!(
                "Professional {} is closed on {}",
                professional_id, query.date
            );
            return Ok(Vec::new());
        }

        let candidates = generate_candidate_slots(
            &schedule.windows,
            query.duration_minutes,
            query.date,
            Utc::now(),
            step_minutes,
        )?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let booked = self
            .appointments
            .appointments_for_date(professional_id, query.date, auth_token)
            .await?;

        let open = filter_available(&candidates, query.duration_minutes, &booked);

        debug!(
            "Found {} bookable slots out of {} candidates",
            open.len(),
            candidates.len()
        );

        Ok(open
            .into_iter()
            .map(|start| AvailableSlot::from_start(start, query.duration_minutes))
            .collect())
    }
}
