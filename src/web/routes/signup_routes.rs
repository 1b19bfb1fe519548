use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::db::services::{SignupError, SignupService};
use crate::web::models::event_models::{SignupResponse, UserSignupEntry};
use crate::web::models::{AuthenticatedUser, Requester};
use crate::web::{AppError, AppState, guards};

pub fn create_signup_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/slots/{slot_id}/signups", post(create_signup))
        .route("/signups/{signup_id}", delete(delete_signup))
}

/// Routes under `/api/users/me`; expects the `auth` layer.
pub fn create_user_signups_router() -> Router<Arc<AppState>> {
    Router::new().route("/signups", get(list_user_signups))
}

async fn create_signup(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(slot_id): Path<i32>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let user = guards::require_authenticated(&requester)?;
    let signup = SignupService::create_signup(&app_state.db_pool, user.id, slot_id).await?;
    Ok((StatusCode::CREATED, Json(SignupResponse::new(signup, true))))
}

async fn delete_signup(
    State(app_state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(signup_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let user = guards::require_authenticated(&requester)?;
    SignupService::delete_signup(&app_state.db_pool, user.id, signup_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_user_signups(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<UserSignupEntry>>, AppError> {
    let signups = SignupService::get_signups_for_user(&app_state.db_pool, user.id).await?;

    let entries = signups
        .into_iter()
        .map(|(detail, signup)| UserSignupEntry {
            event: detail.into(),
            signup: SignupResponse::new(signup, false),
        })
        .collect();
    Ok(Json(entries))
}

impl From<SignupError> for AppError {
    fn from(err: SignupError) -> Self {
        match err {
            SignupError::DbErr(e) => AppError::DatabaseError(e.to_string()),
            SignupError::SlotNotFound(id) => AppError::NotFound(format!("Slot with ID {id} not found")),
            SignupError::NotFound(id) => AppError::NotFound(format!("Signup with ID {id} not found")),
            SignupError::Forbidden => {
                AppError::Forbidden("Signups for this event are limited to approved admins of its group.".to_string())
            }
            e @ (SignupError::AlreadySignedUp(_) | SignupError::SlotFull(_)) => AppError::Conflict(e.to_string()),
        }
    }
}
