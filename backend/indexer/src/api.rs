//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{self, EventFilter};
use crate::events::{EventKind, EventRecord};
use crate::summary;

const MAX_LIMIT: i64 = 1_000;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

/// `?type=vote_cast&phase=1&limit=50`, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub phase: Option<i64>,
    pub limit: Option<i64>,
}

impl EventsQuery {
    fn into_filter(self, project_id: Option<String>) -> Result<EventFilter, String> {
        let kind = match self.event_type {
            None => None,
            Some(name) => match EventKind::from_stored(&name) {
                EventKind::Unknown => return Err(format!("unknown event type {name:?}")),
                kind => Some(kind),
            },
        };
        let limit = match self.limit {
            Some(n) if !(1..=MAX_LIMIT).contains(&n) => {
                return Err(format!("limit must be between 1 and {MAX_LIMIT}"))
            }
            limit => limit,
        };
        Ok(EventFilter {
            project_id,
            phase_id: self.phase,
            kind,
            limit,
        })
    }
}

#[derive(Serialize)]
pub struct EventsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub count: usize,
    pub project_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /projects`
pub async fn list_projects(State(state): State<Arc<ApiState>>) -> Response {
    match db::list_project_ids(&state.pool).await {
        Ok(project_ids) => Json(ProjectsResponse {
            count: project_ids.len(),
            project_ids,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `GET /projects/:id/events`
pub async fn get_project_events(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Response {
    list_events(&state.pool, query, Some(project_id)).await
}

/// `GET /events`
pub async fn get_all_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    list_events(&state.pool, query, None).await
}

async fn list_events(pool: &SqlitePool, query: EventsQuery, project_id: Option<String>) -> Response {
    let filter = match query.into_filter(project_id) {
        Ok(filter) => filter,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    match db::query_events(pool, &filter).await {
        Ok(events) => Json(EventsResponse {
            project_id: filter.project_id,
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `GET /projects/:id/summary`
///
/// Totals folded from the project's indexed events. Status is not included;
/// it is resolved by the contract against the ledger clock.
pub async fn get_project_summary(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Response {
    let events = match db::get_events_for_project(&state.pool, &project_id).await {
        Ok(events) => events,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    if events.is_empty() {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("no events indexed for project {project_id}"),
        );
    }
    match summary::summarize(&project_id, &events) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
