// HTTP surface: a thin adapter over the outline engine and the course
// store. Handlers translate requests into engine/store calls; every reader
// goes through the projector so the editor, the viewer, and the shared page
// all see the identical unified order.

pub mod error;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use lectern_common::outline::assigner::assign_indices;
use lectern_common::outline::projector::project;
use lectern_common::protocol::{
    build_outline, validate_payload, validate_structure, SaveOutlineRequest,
};
use lectern_common::types::OutlineItem;

use crate::store::course_db::CourseDb;
use crate::store::courses::CourseStore;
use crate::store::progress::ProgressStore;

use self::error::{ApiError, ErrorCode};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<Mutex<CourseDb>>,
}

impl ApiState {
    pub fn new(db: CourseDb) -> Self {
        Self { db: Arc::new(Mutex::new(db)) }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/courses", post(create_course))
        .route(
            "/api/courses/{course_id}/outline",
            get(get_outline).put(save_outline),
        )
        .route("/api/courses/{course_id}/progress", post(mark_progress))
        .route("/api/shared/{share_key}", get(get_shared_outline))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Request/response shapes ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CourseEnvelope {
    pub id: Uuid,
    pub title: String,
    pub share_key: String,
}

/// The projected outline as served to the editor, the viewer, and the
/// shared page alike.
#[derive(Debug, Serialize)]
pub struct OutlineEnvelope {
    pub course_id: Uuid,
    pub title: String,
    pub items: Vec<OutlineItem>,
    pub completed_lesson_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MarkProgressRequest {
    pub lesson_id: Uuid,
}

// ── Handlers ───────────────────────────────────────────────────────

async fn create_course(
    State(state): State<ApiState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseEnvelope>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::ValidationFailed, "course title must not be empty"));
    }

    let db = state.db.lock().await;
    let course = CourseStore::create_course(db.connection(), payload.title.trim())?;
    tracing::info!(course_id = %course.id, "created course");

    Ok((
        StatusCode::CREATED,
        Json(CourseEnvelope { id: course.id, title: course.title, share_key: course.share_key }),
    ))
}

async fn get_outline(
    State(state): State<ApiState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<OutlineEnvelope>, ApiError> {
    let db = state.db.lock().await;
    let course = CourseStore::load_structure(db.connection(), course_id)?
        .ok_or_else(|| ApiError::not_found("course"))?;
    let completed = ProgressStore::completed_lessons(db.connection(), course.id)?;

    Ok(Json(OutlineEnvelope {
        course_id: course.id,
        title: course.title.clone(),
        items: project(&course).items,
        completed_lesson_ids: completed,
    }))
}

async fn save_outline(
    State(state): State<ApiState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<SaveOutlineRequest>,
) -> Result<Json<OutlineEnvelope>, ApiError> {
    validate_payload(&payload)?;

    let mut outline = build_outline(payload);
    assign_indices(&mut outline);
    validate_structure(&outline)?;

    let mut db = state.db.lock().await;
    let replaced = CourseStore::replace_structure(db.connection_mut(), course_id, &outline)?;
    if !replaced {
        return Err(ApiError::not_found("course"));
    }

    let course = CourseStore::load_structure(db.connection(), course_id)?
        .ok_or_else(|| ApiError::not_found("course"))?;
    tracing::info!(
        course_id = %course_id,
        lessons = outline.lesson_count(),
        "replaced course structure"
    );

    Ok(Json(OutlineEnvelope {
        course_id: course.id,
        title: course.title.clone(),
        items: project(&course).items,
        completed_lesson_ids: Vec::new(),
    }))
}

async fn get_shared_outline(
    State(state): State<ApiState>,
    Path(share_key): Path<String>,
) -> Result<Json<OutlineEnvelope>, ApiError> {
    let db = state.db.lock().await;
    let course = CourseStore::load_structure_by_share_key(db.connection(), &share_key)?
        .ok_or_else(|| ApiError::not_found("shared course"))?;
    let completed = ProgressStore::completed_lessons(db.connection(), course.id)?;

    Ok(Json(OutlineEnvelope {
        course_id: course.id,
        title: course.title.clone(),
        items: project(&course).items,
        completed_lesson_ids: completed,
    }))
}

async fn mark_progress(
    State(state): State<ApiState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<MarkProgressRequest>,
) -> Result<StatusCode, ApiError> {
    let db = state.db.lock().await;
    let marked = ProgressStore::mark_complete(db.connection(), course_id, payload.lesson_id)?;
    if !marked {
        return Err(ApiError::not_found("lesson"));
    }
    Ok(StatusCode::NO_CONTENT)
}
