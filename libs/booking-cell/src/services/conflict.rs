use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::store::StoreClient;

use crate::models::{Appointment, BookingError};

/// Half-open interval intersection: `[start1, end1)` meets `[start2, end2)`
/// iff start1 < end2 AND start2 < end1. Touching boundaries do not overlap.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

pub struct ConflictService {
    store: Arc<StoreClient>,
}

impl ConflictService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Check whether `[start_time, end_time)` collides with any active
    /// appointment of the professional.
    pub async fn has_conflict(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, BookingError> {
        debug!(
            "Checking conflicts for professional {} from {} to {}",
            professional_id, start_time, end_time
        );

        let existing = self
            .appointments_in_range(
                professional_id,
                start_time,
                end_time,
                exclude_appointment_id,
                auth_token,
            )
            .await?;

        let conflicting = existing
            .iter()
            .filter(|apt| apt.status.is_active())
            .filter(|apt| {
                intervals_overlap(start_time, end_time, apt.start_time, apt.end_time)
            })
            .count();

        if conflicting > 0 {
            warn!(
                "Conflict detected for professional {} - {} overlapping appointments",
                professional_id, conflicting
            );
        }

        Ok(conflicting > 0)
    }

    // Fetch boundary-inclusive from the store, overlap precision stays in
    // memory.
    async fn appointments_in_range(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let mut query_parts = vec![
            format!("professional_id=eq.{}", professional_id),
            format!("start_time=lte.{}", end_time.to_rfc3339()),
            format!("end_time=gte.{}", start_time.to_rfc3339()),
        ];

        if let Some(exclude_id) = exclude_appointment_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/appointments?{}&order=start_time.asc",
            query_parts.join("&")
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
}
