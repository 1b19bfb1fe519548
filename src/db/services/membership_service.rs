use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};

use crate::db::entities::membership;

pub struct MembershipService;

impl MembershipService {
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        group_id: i32,
        user_id: i32,
    ) -> Result<Option<membership::Model>, DbErr> {
        membership::Entity::find_by_id((group_id, user_id)).one(db).await
    }

    /// Group-admin check: the requester needs a membership that is both approved
    /// and admin. A missing membership is a plain `false`.
    pub async fn authorize<C: ConnectionTrait>(db: &C, user_id: i32, group_id: i32) -> Result<bool, DbErr> {
        let membership = Self::find(db, group_id, user_id).await?;
        Ok(membership.is_some_and(|m| m.is_approved && m.is_admin))
    }

    /// Ids of the groups in which the user passes `authorize`.
    pub async fn admin_group_ids<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<i32>, DbErr> {
        membership::Entity::find()
            .select_only()
            .column(membership::Column::GroupId)
            .filter(membership::Column::UserId.eq(user_id))
            .filter(membership::Column::IsApproved.eq(true))
            .filter(membership::Column::IsAdmin.eq(true))
            .into_tuple::<i32>()
            .all(db)
            .await
    }
}
