//! Event ingestion endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{PulseError, Result};
use crate::store::{parse_timestamp_utc, NewEvent};

/// Request body for `POST /api/v1/events`.
///
/// The timestamp is accepted as a string so that both zoned and naive forms
/// can be normalized explicitly rather than left to serde.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub event_id: Option<String>,

    pub timestamp_utc: String,

    pub user_id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub latency_ms: i64,

    #[serde(default = "default_metadata")]
    pub metadata_json: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

impl CreateEventRequest {
    fn into_event(self) -> Result<NewEvent> {
        if self.user_id.trim().is_empty() {
            return Err(PulseError::validation("user_id cannot be empty"));
        }
        if self.event_type.trim().is_empty() {
            return Err(PulseError::validation("type cannot be empty"));
        }
        if let Some(event_id) = self.event_id.as_deref() {
            if event_id.trim().is_empty() {
                return Err(PulseError::validation("event_id cannot be empty when present"));
            }
        }
        if self.latency_ms < 0 {
            return Err(PulseError::validation("latency_ms must be >= 0"));
        }
        if !self.metadata_json.is_object() {
            return Err(PulseError::validation("metadata_json must be a JSON object"));
        }

        let timestamp_utc = parse_timestamp_utc(&self.timestamp_utc)
            .ok_or_else(|| PulseError::validation("timestamp_utc is not a valid timestamp"))?;

        Ok(NewEvent {
            event_id: self.event_id,
            timestamp_utc,
            user_id: self.user_id,
            event_type: self.event_type,
            latency_ms: self.latency_ms,
            metadata: self.metadata_json,
        })
    }
}

/// `POST /api/v1/events`
///
/// Returns 201 with the stored event when a new row is created, or 200 with
/// the original row when the same `event_id` has been seen before.
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Response> {
    let event = payload.into_event()?;
    let (record, is_new) = state.ingest.ingest(event).await?;

    let status = if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(record)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(overrides: serde_json::Value) -> CreateEventRequest {
        let mut base = json!({
            "timestamp_utc": "2025-06-01T12:00:00Z",
            "user_id": "alice",
            "type": "login",
            "latency_ms": 100,
        });
        base.as_object_mut()
            .unwrap()
            .extend(overrides.as_object().unwrap().clone());
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_valid_request_converts() {
        let event = request(json!({})).into_event().unwrap();
        assert_eq!(event.user_id, "alice");
        assert_eq!(event.metadata, json!({}));
    }

    #[test]
    fn test_empty_user_id_rejected() {
        assert!(request(json!({"user_id": ""})).into_event().is_err());
        assert!(request(json!({"user_id": "   "})).into_event().is_err());
    }

    #[test]
    fn test_empty_type_rejected() {
        assert!(request(json!({"type": ""})).into_event().is_err());
    }

    #[test]
    fn test_negative_latency_rejected() {
        assert!(request(json!({"latency_ms": -1})).into_event().is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        assert!(request(json!({"timestamp_utc": "yesterday"}))
            .into_event()
            .is_err());
    }

    #[test]
    fn test_non_object_metadata_rejected() {
        assert!(request(json!({"metadata_json": [1, 2, 3]}))
            .into_event()
            .is_err());
    }
}
