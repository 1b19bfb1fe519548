use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::tag;

/// Retrieves every tag, ordered by name.
pub async fn get_all_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
}

/// Resolves tag names by exact match. Names without a tag are absent from the map.
pub async fn get_tags_by_names<C: ConnectionTrait>(
    db: &C,
    names: &[String],
) -> Result<HashMap<String, tag::Model>, DbErr> {
    if names.is_empty() {
        return Ok(HashMap::new());
    }

    let tags = tag::Entity::find()
        .filter(tag::Column::Name.is_in(names.iter().cloned()))
        .all(db)
        .await?;

    Ok(tags.into_iter().map(|t| (t.name.clone(), t)).collect())
}

/// Inserts the given tag names that do not exist yet. Names are trimmed; blanks
/// and repeats are skipped. Returns how many were created.
pub async fn seed_tags<C: ConnectionTrait>(db: &C, names: &[String]) -> Result<usize, DbErr> {
    let wanted: Vec<String> = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let existing = get_tags_by_names(db, &wanted).await?;

    let mut created = 0;
    for name in wanted {
        if existing.contains_key(&name) {
            continue;
        }
        tag::ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }

    if created > 0 {
        info!(count = created, "Seeded tags.");
    }
    Ok(created)
}
