use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DbConn, DbErr, EntityTrait, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{group, membership};
use crate::db::services::{MembershipService, is_unique_violation};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Group not found: {0}")]
    NotFound(i32),
    #[error("User {user_id} is not a member of group {group_id}")]
    MembershipNotFound { group_id: i32, user_id: i32 },
    #[error("User {user_id} already belongs to group {group_id}")]
    AlreadyMember { group_id: i32, user_id: i32 },
    #[error("Group name cannot be empty")]
    EmptyName,
}

pub struct GroupService;

impl GroupService {
    /// Creates a group and makes its creator an approved admin in one transaction.
    pub async fn create_group(
        db: &DbConn,
        creator_id: i32,
        name: String,
        description: String,
    ) -> Result<(group::Model, membership::Model), GroupError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(GroupError::EmptyName);
        }

        let now = Utc::now();
        let txn = db.begin().await?;

        let group = group::ActiveModel {
            name: Set(name),
            description: Set(description),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let membership = membership::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(creator_id),
            is_approved: Set(true),
            is_admin: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((group, membership))
    }

    pub async fn get_all_groups(db: &DbConn) -> Result<Vec<group::Model>, GroupError> {
        Ok(group::Entity::find()
            .order_by_asc(group::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn get_group_by_id(db: &DbConn, group_id: i32) -> Result<group::Model, GroupError> {
        group::Entity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or(GroupError::NotFound(group_id))
    }

    /// Requests membership. New memberships start unapproved and non-admin.
    pub async fn join_group(db: &DbConn, group_id: i32, user_id: i32) -> Result<membership::Model, GroupError> {
        if MembershipService::find(db, group_id, user_id).await?.is_some() {
            return Err(GroupError::AlreadyMember { group_id, user_id });
        }

        membership::ActiveModel {
            group_id: Set(group_id),
            user_id: Set(user_id),
            is_approved: Set(false),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GroupError::AlreadyMember { group_id, user_id }
            } else {
                e.into()
            }
        })
    }

    pub async fn update_membership(
        db: &DbConn,
        group_id: i32,
        user_id: i32,
        is_approved: Option<bool>,
        is_admin: Option<bool>,
    ) -> Result<membership::Model, GroupError> {
        let membership = MembershipService::find(db, group_id, user_id)
            .await?
            .ok_or(GroupError::MembershipNotFound { group_id, user_id })?;

        let mut active: membership::ActiveModel = membership.clone().into();
        if let Some(is_approved) = is_approved {
            active.is_approved = Set(is_approved);
        }
        if let Some(is_admin) = is_admin {
            active.is_admin = Set(is_admin);
        }

        if !active.is_changed() {
            return Ok(membership);
        }
        Ok(active.update(db).await?)
    }
}
