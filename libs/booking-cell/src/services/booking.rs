use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use scheduling_cell::services::ScheduleService;
use shared_config::AppConfig;
use shared_database::store::StoreClient;
use shared_models::auth::User;

use crate::models::{
    total_duration, Appointment, AppointmentStatus, BookAppointmentRequest, BookingError,
    CancelAppointmentRequest, SalonService,
};
use crate::services::conflict::ConflictService;
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct BookingService {
    store: Arc<StoreClient>,
    conflict_service: ConflictService,
    lifecycle_service: AppointmentLifecycleService,
    schedule_service: ScheduleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(config));

        Self {
            conflict_service: ConflictService::new(Arc::clone(&store)),
            lifecycle_service: AppointmentLifecycleService::new(),
            schedule_service: ScheduleService::with_store(Arc::clone(&store)),
            store,
        }
    }

    /// Book a continuous block covering all selected services, guarded by a
    /// working-hours check and a conflict check against active appointments.
    pub async fn book_appointment(
        &self,
        client: &User,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking appointment for client {} with professional {}",
            client.id, request.professional_id
        );

        let client_id = Uuid::parse_str(&client.id)
            .map_err(|_| BookingError::Validation("Invalid client id".to_string()))?;

        if request.service_ids.is_empty() {
            return Err(BookingError::Validation(
                "At least one service must be selected".to_string(),
            ));
        }

        if request.start_time <= Utc::now() {
            return Err(BookingError::InvalidTime(
                "Appointment must start in the future".to_string(),
            ));
        }

        let services = self.fetch_services(&request.service_ids, auth_token).await?;
        let duration_minutes = total_duration(&services);
        if duration_minutes <= 0 {
            return Err(BookingError::Validation(
                "Selected services have no duration".to_string(),
            ));
        }

        let end_time = request.start_time + Duration::minutes(duration_minutes as i64);

        self.verify_working_hours(
            request.professional_id,
            request.start_time,
            end_time,
            auth_token,
        )
        .await?;

        let has_conflict = self
            .conflict_service
            .has_conflict(
                request.professional_id,
                request.start_time,
                end_time,
                None,
                auth_token,
            )
            .await?;

        if has_conflict {
            warn!(
                "Appointment conflict for professional {} at {}",
                request.professional_id, request.start_time
            );
            return Err(BookingError::ConflictDetected);
        }

        let appointment = self
            .create_appointment_record(client_id, &request, end_time, duration_minutes, auth_token)
            .await?;

        info!(
            "Appointment {} booked with professional {}",
            appointment.id, request.professional_id
        );
        Ok(appointment)
    }

    /// Confirm a pending appointment.
    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Confirming appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &AppointmentStatus::Confirmed)?;

        self.patch_appointment(
            appointment_id,
            json!({
                "status": AppointmentStatus::Confirmed,
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        )
        .await
    }

    /// Cancel an appointment, releasing its interval.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &AppointmentStatus::Cancelled)?;

        self.patch_appointment(
            appointment_id,
            json!({
                "status": AppointmentStatus::Cancelled,
                "cancellation_reason": request.reason,
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        )
        .await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(BookingError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))
    }

    /// All appointments of one professional on one date, any status.
    pub async fn list_for_professional(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let start_of_day = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| BookingError::Validation("Invalid date".to_string()))?
            .and_utc();
        let end_of_day = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| BookingError::Validation("Invalid date".to_string()))?
            .and_utc();

        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&start_time=gte.{}&start_time=lte.{}&order=start_time.asc",
            professional_id,
            start_of_day.to_rfc3339(),
            end_of_day.to_rfc3339()
        );

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::Database(format!("Failed to parse appointments: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn fetch_services(
        &self,
        service_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<SalonService>, BookingError> {
        let id_list = service_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<String>>()
            .join(",");

        let path = format!("/rest/v1/services?id=in.({})", id_list);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let services: Vec<SalonService> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<SalonService>, _>>()
            .map_err(|e| BookingError::Database(format!("Failed to parse services: {}", e)))?;

        for requested in service_ids {
            if !services.iter().any(|service| service.id == *requested) {
                return Err(BookingError::ServiceNotFound(*requested));
            }
        }

        Ok(services)
    }

    // The requested interval must lie inside one of the day's working
    // windows.
    async fn verify_working_hours(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let weekly = self
            .schedule_service
            .get_weekly_availability(professional_id, Some(auth_token))
            .await?;

        let date = start_time.date_naive();
        let schedule = weekly.resolve(date);

        if !schedule.is_available {
            return Err(BookingError::ProfessionalUnavailable);
        }

        let fits = schedule.windows.iter().any(|window| {
            !window.is_degenerate()
                && start_time.time() >= window.start
                && end_time.date_naive() == date
                && end_time.time() <= window.end
        });

        if !fits {
            debug!(
                "Requested interval {} - {} is outside working windows for {}",
                start_time, end_time, professional_id
            );
            return Err(BookingError::ProfessionalUnavailable);
        }

        Ok(())
    }

    async fn create_appointment_record(
        &self,
        client_id: Uuid,
        request: &BookAppointmentRequest,
        end_time: DateTime<Utc>,
        duration_minutes: i32,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let appointment_data = json!({
            "professional_id": request.professional_id,
            "client_id": client_id,
            "start_time": request.start_time.to_rfc3339(),
            "end_time": end_time.to_rfc3339(),
            "duration_minutes": duration_minutes,
            "service_ids": request.service_ids,
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "cancellation_reason": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::Database("Failed to create appointment".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        patch: Value,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .store
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(headers))
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(BookingError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| BookingError::Database(format!("Failed to parse appointment: {}", e)))
    }
}
