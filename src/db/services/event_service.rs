use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbConn, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{event, signup, slot, tag};
use crate::db::services::get_tags_by_names;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Event not found: {0}")]
    NotFound(i32),
    #[error("Unknown tag names: {}", .0.join(", "))]
    UnknownTags(Vec<String>),
}

/// A validated event-creation request.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub location: String,
    pub is_public: bool,
    /// (tag name, limit) pairs; limits are already known to be non-negative.
    pub slots: Vec<(String, i32)>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub id: Option<i32>,
    pub group_id: Option<i32>,
    pub is_public: Option<bool>,
    /// Substring match on title or description.
    pub search: Option<String>,
    /// 1-based; only applied together with `page_size`.
    pub page: Option<u64>,
    /// Clamped to `MAX_PAGE_SIZE`.
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SlotDetail {
    pub slot: slot::Model,
    pub tag_name: String,
    pub signup_count: i64,
}

/// An event together with its slots.
#[derive(Debug, Clone)]
pub struct EventDetail {
    pub event: event::Model,
    pub slots: Vec<SlotDetail>,
}

pub const MAX_PAGE_SIZE: u64 = 100;

pub struct EventService;

impl EventService {
    /// Persists the event and one slot per tag/limit pair. Either everything is
    /// written or nothing is.
    pub async fn create_event(
        db: &DbConn,
        group_id: i32,
        new_event: NewEvent,
    ) -> Result<EventDetail, EventError> {
        let txn = db.begin().await?;

        let event = event::ActiveModel {
            group_id: Set(group_id),
            title: Set(new_event.title),
            description: Set(new_event.description),
            start_date_time: Set(new_event.start_date_time),
            end_date_time: Set(new_event.end_date_time),
            location: Set(new_event.location),
            is_public: Set(new_event.is_public),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let tag_names: Vec<String> = new_event.slots.iter().map(|(name, _)| name.clone()).collect();
        let tags = get_tags_by_names(&txn, &tag_names).await?;

        let unknown: Vec<String> = tag_names
            .iter()
            .filter(|name| !tags.contains_key(*name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            txn.rollback().await?;
            return Err(EventError::UnknownTags(unknown));
        }

        for (tag_name, limit) in &new_event.slots {
            let tag = &tags[tag_name];
            slot::ActiveModel {
                event_id: Set(event.id),
                tag_id: Set(tag.id),
                limit: Set(*limit),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let detail = Self::load_detail(&txn, event).await?;
        txn.commit().await?;

        info!(
            event_id = detail.event.id,
            group_id,
            slot_count = detail.slots.len(),
            "Event created."
        );
        Ok(detail)
    }

    pub async fn get_event_by_id<C: ConnectionTrait>(db: &C, event_id: i32) -> Result<event::Model, EventError> {
        event::Entity::find_by_id(event_id)
            .one(db)
            .await?
            .ok_or(EventError::NotFound(event_id))
    }

    pub async fn update_event(db: &DbConn, event_id: i32, patch: EventPatch) -> Result<EventDetail, EventError> {
        let event = Self::get_event_by_id(db, event_id).await?;

        let mut active: event::ActiveModel = event.clone().into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(start_date_time) = patch.start_date_time {
            active.start_date_time = Set(start_date_time);
        }
        if let Some(end_date_time) = patch.end_date_time {
            active.end_date_time = Set(end_date_time);
        }
        if let Some(location) = patch.location {
            active.location = Set(location);
        }
        if let Some(is_public) = patch.is_public {
            active.is_public = Set(is_public);
        }

        let event = if active.is_changed() {
            active.update(db).await?
        } else {
            debug!(event_id, "Event patch carried no changes.");
            event
        };

        Ok(Self::load_detail(db, event).await?)
    }

    /// Deletes the event with its slots and their signups.
    pub async fn delete_event(db: &DbConn, event_id: i32) -> Result<(), EventError> {
        let txn = db.begin().await?;

        let event = Self::get_event_by_id(&txn, event_id).await?;

        let slot_ids: Vec<i32> = slot::Entity::find()
            .select_only()
            .column(slot::Column::Id)
            .filter(slot::Column::EventId.eq(event.id))
            .into_tuple::<i32>()
            .all(&txn)
            .await?;

        if !slot_ids.is_empty() {
            signup::Entity::delete_many()
                .filter(signup::Column::SlotId.is_in(slot_ids))
                .exec(&txn)
                .await?;
        }
        slot::Entity::delete_many()
            .filter(slot::Column::EventId.eq(event.id))
            .exec(&txn)
            .await?;
        event::Entity::delete_by_id(event.id).exec(&txn).await?;

        txn.commit().await?;
        info!(event_id, "Event deleted.");
        Ok(())
    }

    /// Lists events matching `filter` that are public or owned by one of
    /// `admin_group_ids`.
    pub async fn list_events(
        db: &DbConn,
        filter: &EventFilter,
        admin_group_ids: &[i32],
    ) -> Result<Vec<EventDetail>, EventError> {
        let mut visible = Condition::any().add(event::Column::IsPublic.eq(true));
        if !admin_group_ids.is_empty() {
            visible = visible.add(event::Column::GroupId.is_in(admin_group_ids.to_vec()));
        }

        let mut query = event::Entity::find().filter(visible);

        if let Some(id) = filter.id {
            query = query.filter(event::Column::Id.eq(id));
        }
        if let Some(group_id) = filter.group_id {
            query = query.filter(event::Column::GroupId.eq(group_id));
        }
        if let Some(is_public) = filter.is_public {
            query = query.filter(event::Column::IsPublic.eq(is_public));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(event::Column::Title.contains(search))
                    .add(event::Column::Description.contains(search)),
            );
        }

        query = query.order_by_asc(event::Column::Id);

        if let Some(page_size) = filter.page_size.filter(|size| *size > 0) {
            let page_size = page_size.min(MAX_PAGE_SIZE);
            let page = filter.page.unwrap_or(1).max(1);
            // The binder stores LIMIT/OFFSET as i64.
            let offset = (page - 1).saturating_mul(page_size).min(i64::MAX as u64);
            query = query.limit(page_size).offset(offset);
        }

        let events = query.all(db).await?;
        Ok(Self::load_details(db, events).await?)
    }

    pub async fn load_detail<C: ConnectionTrait>(db: &C, event: event::Model) -> Result<EventDetail, DbErr> {
        let mut details = Self::load_details(db, vec![event]).await?;
        details
            .pop()
            .ok_or_else(|| DbErr::Custom("event detail missing after load".to_string()))
    }

    /// Attaches slots, tag names and signup counts to each event, preserving order.
    pub async fn load_details<C: ConnectionTrait>(
        db: &C,
        events: Vec<event::Model>,
    ) -> Result<Vec<EventDetail>, DbErr> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let event_ids: Vec<i32> = events.iter().map(|e| e.id).collect();
        let slots = slot::Entity::find()
            .filter(slot::Column::EventId.is_in(event_ids))
            .order_by_asc(slot::Column::Id)
            .find_also_related(tag::Entity)
            .all(db)
            .await?;

        let slot_ids: Vec<i32> = slots.iter().map(|(s, _)| s.id).collect();
        let counts: HashMap<i32, i64> = if slot_ids.is_empty() {
            HashMap::new()
        } else {
            signup::Entity::find()
                .select_only()
                .column(signup::Column::SlotId)
                .column_as(Expr::col(signup::Column::Id).count(), "signup_count")
                .filter(signup::Column::SlotId.is_in(slot_ids))
                .group_by(signup::Column::SlotId)
                .into_tuple::<(i32, i64)>()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };

        let mut slots_by_event: HashMap<i32, Vec<SlotDetail>> = HashMap::new();
        for (slot, tag) in slots {
            slots_by_event.entry(slot.event_id).or_default().push(SlotDetail {
                signup_count: counts.get(&slot.id).copied().unwrap_or(0),
                tag_name: tag.map(|t| t.name).unwrap_or_default(),
                slot,
            });
        }

        Ok(events
            .into_iter()
            .map(|event| EventDetail {
                slots: slots_by_event.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }
}
