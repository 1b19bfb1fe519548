use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;

use crate::db::services::{EventError, EventService, MembershipService};
use crate::web::models::Requester;
use crate::web::models::event_models::{self, EventListQuery, EventResponse};
use crate::web::{AppError, AppState, guards};

pub fn create_event_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_events))
        .route(
            "/{event_id}",
            get(get_event)
                .patch(update_event)
                .post(update_event)
                .delete(delete_event),
        )
}

/// `POST /api/groups/{group_id}/events`
pub async fn create_group_event(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(group_id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_authenticated(&requester)?;
    let group = guards::require_group(db, group_id).await?;
    guards::require_group_admin(db, user, group.id).await?;
    let new_event = event_models::parse_new_event(&body)?;

    let detail = EventService::create_event(db, group.id, new_event).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn list_events(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_read_identity(app_state.config.event_access_policy, &requester)?;
    let admin_group_ids = match user {
        Some(user) => MembershipService::admin_group_ids(db, user.id).await?,
        None => Vec::new(),
    };

    let events = EventService::list_events(db, &query.into(), &admin_group_ids).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn get_event(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(event_id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_read_identity(app_state.config.event_access_policy, &requester)?;
    let event = guards::require_event(db, event_id).await?;
    guards::require_event_read(db, user, &event).await?;

    let detail = EventService::load_detail(db, event).await?;
    Ok(Json(detail.into()))
}

async fn update_event(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(event_id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<EventResponse>, AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_authenticated(&requester)?;
    let event = guards::require_event(db, event_id).await?;
    guards::require_group_admin(db, user, event.group_id).await?;
    let patch = event_models::parse_event_patch(&body)?;

    let detail = EventService::update_event(db, event.id, patch).await?;
    Ok(Json(detail.into()))
}

async fn delete_event(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(event_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_authenticated(&requester)?;
    let event = guards::require_event(db, event_id).await?;
    guards::require_group_admin(db, user, event.group_id).await?;

    EventService::delete_event(db, event.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::DbErr(e) => AppError::DatabaseError(e.to_string()),
            EventError::NotFound(id) => AppError::NotFound(format!("Event with ID {id} not found")),
            EventError::UnknownTags(names) => AppError::UnknownTags(names),
        }
    }
}
