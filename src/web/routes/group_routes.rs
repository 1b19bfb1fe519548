use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use std::sync::Arc;

use crate::db::services::{GroupError, GroupService};
use crate::web::models::Requester;
use crate::web::models::group_models::{
    CreateGroupRequest, GroupResponse, MembershipResponse, UpdateMembershipRequest,
};
use crate::web::routes::event_routes;
use crate::web::{AppError, AppState, guards};

pub fn create_group_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/{group_id}/join", post(join_group))
        .route("/{group_id}/members/{user_id}", patch(update_membership))
        .route("/{group_id}/events", post(event_routes::create_group_event))
}

async fn list_groups(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = GroupService::get_all_groups(&app_state.db_pool).await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

async fn create_group(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    let user = guards::require_authenticated(&requester)?;
    let (group, _) =
        GroupService::create_group(&app_state.db_pool, user.id, payload.name, payload.description).await?;
    Ok((StatusCode::CREATED, Json(group.into())))
}

async fn join_group(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(group_id): Path<i32>,
) -> Result<(StatusCode, Json<MembershipResponse>), AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_authenticated(&requester)?;
    let group = guards::require_group(db, group_id).await?;

    let membership = GroupService::join_group(db, group.id, user.id).await?;
    Ok((StatusCode::CREATED, Json(membership.into())))
}

async fn update_membership(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path((group_id, user_id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateMembershipRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let db = &app_state.db_pool;

    let user = guards::require_authenticated(&requester)?;
    let group = guards::require_group(db, group_id).await?;
    guards::require_group_admin(db, user, group.id).await?;

    let membership =
        GroupService::update_membership(db, group.id, user_id, payload.is_approved, payload.is_admin).await?;
    Ok(Json(membership.into()))
}

impl From<GroupError> for AppError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::DbErr(e) => AppError::DatabaseError(e.to_string()),
            GroupError::NotFound(id) => AppError::NotFound(format!("Group with ID {id} not found")),
            e @ GroupError::MembershipNotFound { .. } => AppError::NotFound(e.to_string()),
            e @ GroupError::AlreadyMember { .. } => AppError::Conflict(e.to_string()),
            GroupError::EmptyName => AppError::InvalidInput("Group name cannot be empty.".to_string()),
        }
    }
}
