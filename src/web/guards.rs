//! Request guards for the group-admin authorization pipeline.
//!
//! Handlers call these in order (identity, target lookup, permission) and stop at
//! the first failure, so every failure mode maps to its own status.

use sea_orm::DbConn;
use tracing::debug;

use crate::db::entities::{event, group};
use crate::db::services::{EventService, GroupService, MembershipService};
use crate::server::config::EventAccessPolicy;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Requester};

pub fn require_authenticated(requester: &Requester) -> Result<&AuthenticatedUser, AppError> {
    requester
        .0
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided.".to_string()))
}

/// Under `Authenticated`, anonymous requesters may not read events at all.
pub fn require_read_identity(
    policy: EventAccessPolicy,
    requester: &Requester,
) -> Result<Option<&AuthenticatedUser>, AppError> {
    match policy {
        EventAccessPolicy::AuthenticatedOrReadOnly => Ok(requester.0.as_ref()),
        EventAccessPolicy::Authenticated => require_authenticated(requester).map(Some),
    }
}

pub async fn require_group(db: &DbConn, group_id: i32) -> Result<group::Model, AppError> {
    Ok(GroupService::get_group_by_id(db, group_id).await?)
}

pub async fn require_event(db: &DbConn, event_id: i32) -> Result<event::Model, AppError> {
    Ok(EventService::get_event_by_id(db, event_id).await?)
}

pub async fn require_group_admin(db: &DbConn, user: &AuthenticatedUser, group_id: i32) -> Result<(), AppError> {
    if MembershipService::authorize(db, user.id, group_id).await? {
        Ok(())
    } else {
        debug!(user_id = user.id, group_id, "Group admin check failed.");
        Err(AppError::Forbidden(
            "You must be an approved admin of this group to perform this action.".to_string(),
        ))
    }
}

/// Public events are readable by anyone the policy let through; other events
/// need an approved admin of the owning group.
pub async fn require_event_read(
    db: &DbConn,
    user: Option<&AuthenticatedUser>,
    event: &event::Model,
) -> Result<(), AppError> {
    if event.is_public {
        return Ok(());
    }
    let user = user.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;
    require_group_admin(db, user, event.group_id).await
}
