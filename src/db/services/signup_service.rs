use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::entities::{event, signup, slot};
use crate::db::services::{EventDetail, EventService, MembershipService, is_unique_violation};

#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Slot not found: {0}")]
    SlotNotFound(i32),
    #[error("Signup not found: {0}")]
    NotFound(i32),
    #[error("Event is not open to this user")]
    Forbidden,
    #[error("Already signed up for slot {0}")]
    AlreadySignedUp(i32),
    #[error("Slot {0} is full")]
    SlotFull(i32),
}

pub struct SignupService;

impl SignupService {
    /// Signs the user up for a slot. Non-public events only accept signups from
    /// users who may read them (approved admins of the group), and the slot must
    /// have room left.
    pub async fn create_signup(db: &DbConn, user_id: i32, slot_id: i32) -> Result<signup::Model, SignupError> {
        let txn = db.begin().await?;

        // Row lock serializes concurrent signups for the same slot.
        let slot = slot::Entity::find_by_id(slot_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(SignupError::SlotNotFound(slot_id))?;
        let event = slot
            .find_related(event::Entity)
            .one(&txn)
            .await?
            .ok_or(SignupError::SlotNotFound(slot_id))?;

        if !event.is_public && !MembershipService::authorize(&txn, user_id, event.group_id).await? {
            return Err(SignupError::Forbidden);
        }

        let existing = signup::Entity::find()
            .filter(signup::Column::UserId.eq(user_id))
            .filter(signup::Column::SlotId.eq(slot.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(SignupError::AlreadySignedUp(slot.id));
        }

        let taken = signup::Entity::find()
            .filter(signup::Column::SlotId.eq(slot.id))
            .count(&txn)
            .await?;
        if taken >= u64::try_from(slot.limit).unwrap_or(0) {
            return Err(SignupError::SlotFull(slot.id));
        }

        let signup = signup::ActiveModel {
            user_id: Set(user_id),
            slot_id: Set(slot.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SignupError::AlreadySignedUp(slot.id)
            } else {
                e.into()
            }
        })?;

        txn.commit().await?;
        Ok(signup)
    }

    /// Cancels a signup. Signups of other users are reported as not found.
    pub async fn delete_signup(db: &DbConn, user_id: i32, signup_id: i32) -> Result<(), SignupError> {
        let signup = signup::Entity::find_by_id(signup_id)
            .filter(signup::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(SignupError::NotFound(signup_id))?;

        signup.delete(db).await?;
        Ok(())
    }

    /// All signups of the user, newest first, each paired with its event.
    pub async fn get_signups_for_user(
        db: &DbConn,
        user_id: i32,
    ) -> Result<Vec<(EventDetail, signup::Model)>, SignupError> {
        let rows = signup::Entity::find()
            .filter(signup::Column::UserId.eq(user_id))
            .order_by_desc(signup::Column::CreatedAt)
            .order_by_desc(signup::Column::Id)
            .find_also_related(slot::Entity)
            .all(db)
            .await?;

        let mut event_ids: Vec<i32> = rows
            .iter()
            .filter_map(|(_, slot)| slot.as_ref().map(|s| s.event_id))
            .collect();
        event_ids.sort_unstable();
        event_ids.dedup();

        let events = if event_ids.is_empty() {
            Vec::new()
        } else {
            event::Entity::find()
                .filter(event::Column::Id.is_in(event_ids))
                .all(db)
                .await?
        };
        let details: HashMap<i32, EventDetail> = EventService::load_details(db, events)
            .await?
            .into_iter()
            .map(|detail| (detail.event.id, detail))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|(signup, slot)| {
                let detail = details.get(&slot?.event_id)?;
                Some((detail.clone(), signup))
            })
            .collect())
    }
}
