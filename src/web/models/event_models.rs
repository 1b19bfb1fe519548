use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::entities::signup;
use crate::db::services::{EventDetail, EventFilter, EventPatch, NewEvent, SlotDetail};
use crate::web::models::validation::{FieldErrors, FieldReader};

/// Validates a `POST /groups/{id}/events` body.
pub fn parse_new_event(body: &Value) -> Result<NewEvent, FieldErrors> {
    let mut reader = FieldReader::new(body)?;

    let title = reader.optional_string("title").unwrap_or_default();
    let description = reader.optional_string("description").unwrap_or_default();
    let location = reader.optional_string("location").unwrap_or_default();
    let start_date_time = reader.required_epoch("start_date_time");
    let end_date_time = reader.required_epoch("end_date_time");
    let is_public = reader.required_bool("is_public");
    let slots = reader.required_limits("slots");

    match (start_date_time, end_date_time, is_public, slots) {
        (Some(start_date_time), Some(end_date_time), Some(is_public), Some(slots)) => {
            reader.errors.into_result(NewEvent {
                title,
                description,
                start_date_time,
                end_date_time,
                location,
                is_public,
                slots,
            })
        }
        _ => Err(reader.errors),
    }
}

/// Validates a partial update. `id`, `group` and `slots` are read-only and ignored.
pub fn parse_event_patch(body: &Value) -> Result<EventPatch, FieldErrors> {
    let mut reader = FieldReader::new(body)?;

    let patch = EventPatch {
        title: reader.optional_string("title"),
        description: reader.optional_string("description"),
        start_date_time: reader.optional_epoch("start_date_time"),
        end_date_time: reader.optional_epoch("end_date_time"),
        location: reader.optional_string("location"),
        is_public: reader.optional_bool("is_public"),
    };
    reader.errors.into_result(patch)
}

#[derive(Debug, Deserialize, Default)]
pub struct EventListQuery {
    pub id: Option<i32>,
    pub group: Option<i32>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl From<EventListQuery> for EventFilter {
    fn from(query: EventListQuery) -> Self {
        EventFilter {
            id: query.id,
            group_id: query.group,
            is_public: query.is_public,
            search: query.search,
            page: query.page,
            page_size: query.page_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlotResponse {
    pub id: i32,
    pub tag: String,
    pub limit: i32,
    pub signup_count: i64,
}

impl From<SlotDetail> for SlotResponse {
    fn from(detail: SlotDetail) -> Self {
        SlotResponse {
            id: detail.slot.id,
            tag: detail.tag_name,
            limit: detail.slot.limit,
            signup_count: detail.signup_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub group: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_date_time: DateTime<Utc>,
    pub location: String,
    pub is_public: bool,
    pub slots: Vec<SlotResponse>,
}

impl From<EventDetail> for EventResponse {
    fn from(detail: EventDetail) -> Self {
        let event = detail.event;
        EventResponse {
            id: event.id,
            title: event.title,
            description: event.description,
            group: event.group_id,
            start_date_time: event.start_date_time,
            end_date_time: event.end_date_time,
            location: event.location,
            is_public: event.is_public,
            slots: detail.slots.into_iter().map(SlotResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: i32,
    pub slot: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<i32>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl SignupResponse {
    pub fn new(signup: signup::Model, include_user: bool) -> Self {
        SignupResponse {
            id: signup.id,
            slot: signup.slot_id,
            user: include_user.then_some(signup.user_id),
            created_at: signup.created_at,
        }
    }
}

/// One entry of the requester's signup listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSignupEntry {
    pub event: EventResponse,
    pub signup: SignupResponse,
}
