//! Season schedule endpoints.
//!
//! The email renderer calls these to get the occurrence list for a session,
//! either one already stored or one passed inline.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::DbSession;
use crate::schedule::{ScheduleError, SessionRecord};
use crate::server::types::ApiErrorType;
use crate::types::ScheduleState;

/// Query parameters for GET /sessions.
#[derive(Debug, Deserialize)]
pub struct SessionListParams {
    /// Only return sessions of this program
    pub program: Option<String>,
}

/// Query parameters for the occurrence endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct OccurrenceParams {
    /// Lowers the configured occurrence cap
    pub max_occurrences: Option<usize>,
}

/// Body of POST /occurrences.
#[derive(Debug, Deserialize)]
pub struct OccurrenceRequest {
    pub session: SessionRecord,
    #[serde(default)]
    pub max_occurrences: Option<usize>,
}

/// Body of PUT /sessions/:session_id.
#[derive(Debug, Deserialize)]
pub struct SessionUpsert {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(flatten)]
    pub record: SessionRecord,
}

/// Converts ScheduleError to API response.
fn schedule_error_to_response(error: ScheduleError) -> Response {
    let message = match &error {
        ScheduleError::MalformedSession { .. } => "Session data is malformed",
        ScheduleError::UnrecognizedWeekdays { .. } => "Session has unrecognized meeting days",
    };

    ApiErrorType::from((
        StatusCode::UNPROCESSABLE_ENTITY,
        message,
        Some(error.to_string()),
    ))
    .into_response()
}

/// Converts an extractor rejection (bad JSON body, bad query string) to the
/// API's JSON error shape.
fn rejection_to_response(status: StatusCode, details: String) -> Response {
    ApiErrorType::from((status, "Invalid request", Some(details))).into_response()
}

fn storage_error_to_response(error: rusqlite::Error, message: &str) -> Response {
    error!("{}: {}", message, error);
    ApiErrorType::from((
        StatusCode::INTERNAL_SERVER_ERROR,
        message,
        Some(error.to_string()),
    ))
    .into_response()
}

/// GET /sessions
///
/// Returns stored session rows.
///
/// Query parameters:
/// - `program` (optional): Only sessions of this program
pub async fn get_sessions(
    State(s): State<Arc<ScheduleState>>,
    params: Result<Query<SessionListParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return rejection_to_response(e.status(), e.body_text()),
    };
    info!("GET /sessions (program={:?})", params.program);

    let result = match &params.program {
        Some(program) => s.schedule_db.get_sessions_for_program(program),
        None => s.schedule_db.get_all_sessions(),
    };

    match result {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => storage_error_to_response(e, "Failed to fetch sessions"),
    }
}

/// PUT /sessions/:session_id
///
/// Stores a session row, replacing any row with the same id. The row is
/// stored as given; bad values surface when its schedule is requested.
pub async fn put_session(
    Path(session_id): Path<String>,
    State(s): State<Arc<ScheduleState>>,
    body: Result<Json<SessionUpsert>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return rejection_to_response(e.status(), e.body_text()),
    };
    info!("PUT /sessions/{}", session_id);

    let session = DbSession::new(session_id, body.program, body.record);
    match s.schedule_db.insert_session(&session) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "session_id": session.session_id })),
        )
            .into_response(),
        Err(e) => storage_error_to_response(e, "Failed to store session"),
    }
}

/// DELETE /sessions/:session_id
pub async fn delete_session(
    Path(session_id): Path<String>,
    State(s): State<Arc<ScheduleState>>,
) -> Response {
    info!("DELETE /sessions/{}", session_id);

    match s.schedule_db.delete_session(&session_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "Session not found",
            Some(session_id),
        ))
        .into_response(),
        Err(e) => storage_error_to_response(e, "Failed to delete session"),
    }
}

/// GET /sessions/:session_id/occurrences
///
/// Expands a stored session into its season schedule.
///
/// Query parameters:
/// - `max_occurrences` (optional): Lowers the configured cap; larger values
///   are clamped to it
pub async fn get_session_occurrences(
    Path(session_id): Path<String>,
    State(s): State<Arc<ScheduleState>>,
    params: Result<Query<OccurrenceParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return rejection_to_response(e.status(), e.body_text()),
    };
    info!("GET /sessions/{}/occurrences", session_id);

    let stored = match s.schedule_db.get_session(&session_id) {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            return ApiErrorType::from((
                StatusCode::NOT_FOUND,
                "Session not found",
                Some(session_id),
            ))
            .into_response()
        }
        Err(e) => return storage_error_to_response(e, "Failed to fetch session"),
    };

    match s
        .generator
        .generate_record(&stored.record, params.max_occurrences)
    {
        Ok(schedule) => (
            StatusCode::OK,
            Json(json!({
                "session_id": stored.session_id,
                "program": stored.program,
                "schedule": schedule,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(session_id = %stored.session_id, "Could not generate schedule: {}", e);
            schedule_error_to_response(e)
        }
    }
}

/// POST /occurrences
///
/// Expands a session passed in the request body. A `max_occurrences` above
/// the configured cap is clamped to it.
pub async fn post_occurrences(
    State(s): State<Arc<ScheduleState>>,
    request: Result<Json<OccurrenceRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(e) => return rejection_to_response(e.status(), e.body_text()),
    };
    info!(
        "POST /occurrences (startdate={}, enddate={:?})",
        request.session.start_date, request.session.end_date
    );

    match s
        .generator
        .generate_record(&request.session, request.max_occurrences)
    {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(e) => {
            warn!("Could not generate schedule: {}", e);
            schedule_error_to_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbSession, SessionDbManager};
    use crate::schedule::{OccurrenceGenerator, ScheduleConfig};
    use serde_json::Value;

    fn record(days: &str) -> SessionRecord {
        SessionRecord {
            start_date: "2025-09-16".to_string(),
            end_date: Some("2025-09-30".to_string()),
            start_time: "18:00".to_string(),
            end_time: "20:00".to_string(),
            days_of_week: Some(days.to_string()),
            timezone: Some("America/New_York".to_string()),
        }
    }

    fn state(config: ScheduleConfig) -> Arc<ScheduleState> {
        let db = SessionDbManager::in_memory().unwrap();
        db.insert_session(&DbSession::new(
            "fall-vb",
            Some("volleyball".to_string()),
            record("Tuesday,Thursday"),
        ))
        .unwrap();
        db.insert_session(&DbSession::new(
            "fall-tennis",
            Some("tennis".to_string()),
            record("Tusday"),
        ))
        .unwrap();
        Arc::new(ScheduleState::new(db, OccurrenceGenerator::new(config).unwrap()))
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_stored_session_occurrences() {
        let response = get_session_occurrences(
            Path("fall-vb".to_string()),
            State(state(ScheduleConfig::default())),
            Ok(Query(OccurrenceParams::default())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["session_id"], "fall-vb");
        assert_eq!(body["program"], "volleyball");
        let occurrences = body["schedule"]["occurrences"].as_array().unwrap();
        assert_eq!(occurrences.len(), 5);
        assert_eq!(occurrences[0]["date"], "2025-09-16");
        assert_eq!(occurrences[4]["date"], "2025-09-30");
        assert_eq!(body["schedule"]["weekdays"], json!([2, 4]));
        assert_eq!(body["schedule"]["truncated"], false);
    }

    #[tokio::test]
    async fn test_occurrence_cap_from_query() {
        let response = get_session_occurrences(
            Path("fall-vb".to_string()),
            State(state(ScheduleConfig::default())),
            Ok(Query(OccurrenceParams {
                max_occurrences: Some(2),
            })),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["schedule"]["occurrences"].as_array().unwrap().len(), 2);
        assert_eq!(body["schedule"]["truncated"], true);
    }

    #[tokio::test]
    async fn test_query_cap_is_clamped_to_configured_cap() {
        let config = ScheduleConfig {
            max_occurrences: 3,
            ..ScheduleConfig::default()
        };
        let response = get_session_occurrences(
            Path("fall-vb".to_string()),
            State(state(config)),
            Ok(Query(OccurrenceParams {
                max_occurrences: Some(1_000_000),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["schedule"]["occurrences"].as_array().unwrap().len(), 3);
        assert_eq!(body["schedule"]["truncated"], true);
    }

    #[tokio::test]
    async fn test_bad_query_string_is_json_error() {
        let uri = "/sessions/fall-vb/occurrences?max_occurrences=abc"
            .parse()
            .unwrap();
        let response = get_session_occurrences(
            Path("fall-vb".to_string()),
            State(state(ScheduleConfig::default())),
            Query::try_from_uri(&uri),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_bad_json_body_is_json_error() {
        let response = post_occurrences(
            State(state(ScheduleConfig::default())),
            Json::from_bytes(b"{\"session\": "),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request");

        // Well-formed JSON missing required fields
        let response = post_occurrences(
            State(state(ScheduleConfig::default())),
            Json::from_bytes(br#"{"session": {"startdate": "2025-09-16"}}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let response = get_session_occurrences(
            Path("nope".to_string()),
            State(state(ScheduleConfig::default())),
            Ok(Query(OccurrenceParams::default())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_typo_with_422() {
        let s = state(ScheduleConfig::default().strict());
        let response = get_session_occurrences(
            Path("fall-tennis".to_string()),
            State(s.clone()),
            Ok(Query(OccurrenceParams::default())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // The permissive generator falls back to the start date
        let response = get_session_occurrences(
            Path("fall-tennis".to_string()),
            State(state(ScheduleConfig::default())),
            Ok(Query(OccurrenceParams::default())),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["schedule"]["occurrences"].as_array().unwrap().len(), 1);
        assert_eq!(body["schedule"]["unrecognized_tokens"], json!(["Tusday"]));
    }

    #[tokio::test]
    async fn test_post_inline_session() {
        let request = OccurrenceRequest {
            session: record("qwerty"),
            max_occurrences: Some(10),
        };
        let response = post_occurrences(State(state(ScheduleConfig::default())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let occurrences = body["occurrences"].as_array().unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(
            occurrences[0]["start_at"],
            "2025-09-16T18:00:00-04:00"
        );
    }

    #[tokio::test]
    async fn test_post_malformed_session_is_422() {
        let mut session = record("Tuesday");
        session.end_time = "17:00".to_string();
        let request = OccurrenceRequest {
            session,
            max_occurrences: None,
        };
        let response = post_occurrences(State(state(ScheduleConfig::default())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Session data is malformed");
        assert!(body["details"].as_str().unwrap().contains("end_time"));
    }

    #[tokio::test]
    async fn test_put_then_delete_session() {
        let s = state(ScheduleConfig::default());
        let body: SessionUpsert = serde_json::from_value(json!({
            "program": "pickleball",
            "startdate": "2025-10-04",
            "enddate": "2025-10-25",
            "starttime": "09:00",
            "endtime": "10:30",
            "daysofweek": "Sat",
        }))
        .unwrap();

        let response = put_session(Path("pb-sat".to_string()), State(s.clone()), Ok(Json(body))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_session_occurrences(
            Path("pb-sat".to_string()),
            State(s.clone()),
            Ok(Query(OccurrenceParams::default())),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["schedule"]["occurrences"].as_array().unwrap().len(), 4);

        let response = delete_session(Path("pb-sat".to_string()), State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = delete_session(Path("pb-sat".to_string()), State(s)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_sessions_by_program() {
        let response = get_sessions(
            State(state(ScheduleConfig::default())),
            Ok(Query(SessionListParams {
                program: Some("tennis".to_string()),
            })),
        )
        .await;
        let body = body_json(response).await;
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_id"], "fall-tennis");
        assert_eq!(sessions[0]["startdate"], "2025-09-16");
    }
}
