use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{group, membership};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateMembershipRequest {
    pub is_approved: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl From<group::Model> for GroupResponse {
    fn from(group: group::Model) -> Self {
        GroupResponse {
            id: group.id,
            name: group.name,
            description: group.description,
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub group: i32,
    pub user: i32,
    pub is_approved: bool,
    pub is_admin: bool,
}

impl From<membership::Model> for MembershipResponse {
    fn from(membership: membership::Model) -> Self {
        MembershipResponse {
            group: membership.group_id,
            user: membership.user_id,
            is_approved: membership.is_approved,
            is_admin: membership.is_admin,
        }
    }
}
