//! Creates missing tables from the entity definitions.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::debug;

use crate::db::entities::{event, group, membership, signup, slot, tag, user};

pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // Referenced tables first.
    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, group::Entity).await?;
    create_table(db, &schema, membership::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, event::Entity).await?;
    create_table(db, &schema, slot::Entity).await?;
    create_table(db, &schema, signup::Entity).await?;

    let signup_index = Index::create()
        .name("idx_signups_user_slot")
        .table(signup::Entity)
        .col(signup::Column::UserId)
        .col(signup::Column::SlotId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&signup_index)).await?;

    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    debug!(table = entity.table_name(), "Ensuring table exists.");
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}
