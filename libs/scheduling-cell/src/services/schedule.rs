use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    DayOfWeek, ProfessionalAvailability, SchedulingError, UpsertDayScheduleRequest,
    WeeklyAvailability,
};

pub struct ScheduleService {
    store: Arc<StoreClient>,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    pub fn with_store(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Fetch the professional's configured weekly schedule.
    pub async fn get_weekly_availability(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<WeeklyAvailability, SchedulingError> {
        debug!("Fetching weekly availability for professional: {}", professional_id);

        let path = format!(
            "/rest/v1/professional_availability?professional_id=eq.{}&order=day_of_week.asc",
            professional_id
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?;

        let rows: Vec<ProfessionalAvailability> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProfessionalAvailability>, _>>()
            .map_err(|e| {
                SchedulingError::Storage(format!("Failed to parse availability rows: {}", e))
            })?;

        Ok(WeeklyAvailability::from_rows(rows))
    }

    /// Create or replace one day's schedule.
    pub async fn upsert_day_schedule(
        &self,
        professional_id: Uuid,
        day: DayOfWeek,
        request: UpsertDayScheduleRequest,
        auth_token: &str,
    ) -> Result<ProfessionalAvailability, SchedulingError> {
        debug!(
            "Upserting {:?} schedule for professional: {}",
            day, professional_id
        );

        // Closed days carry no windows.
        let windows = if request.is_available {
            Self::validate_windows(&request.windows)?;
            request.windows
        } else {
            Vec::new()
        };

        let existing_path = format!(
            "/rest/v1/professional_availability?professional_id=eq.{}&day_of_week=eq.{}",
            professional_id,
            day.index()
        );
        let existing: Vec<Value> = self
            .store
            .request(Method::GET, &existing_path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Storage(e.to_string()))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = if existing.is_empty() {
            let row = json!({
                "professional_id": professional_id,
                "day_of_week": day.index(),
                "is_available": request.is_available,
                "windows": windows,
                "updated_at": Utc::now().to_rfc3339()
            });

            self.store
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/professional_availability",
                    Some(auth_token),
                    Some(row),
                    Some(headers),
                )
                .await
                .map_err(|e| SchedulingError::Storage(e.to_string()))?
        } else {
            let patch = json!({
                "is_available": request.is_available,
                "windows": windows,
                "updated_at": Utc::now().to_rfc3339()
            });

            self.store
                .request_with_headers(
                    Method::PATCH,
                    &existing_path,
                    Some(auth_token),
                    Some(patch),
                    Some(headers),
                )
                .await
                .map_err(|e| SchedulingError::Storage(e.to_string()))?
        };

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::Storage("Failed to save day schedule".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Storage(format!("Failed to parse saved row: {}", e)))
    }

    fn validate_windows(windows: &[crate::models::TimeWindow]) -> Result<(), SchedulingError> {
        for window in windows {
            if window.is_degenerate() {
                return Err(SchedulingError::Validation(format!(
                    "Window start must be before end ({} - {})",
                    window.start, window.end
                )));
            }
        }

        for (i, a) in windows.iter().enumerate() {
            for b in windows.iter().skip(i + 1) {
                if a.start < b.end && b.start < a.end {
                    return Err(SchedulingError::Validation(format!(
                        "Windows overlap: {} - {} and {} - {}",
                        a.start, a.end, b.start, b.end
                    )));
                }
            }
        }

        Ok(())
    }
}
