//! Data access for the scheduling domain.
//!
//! Each sub-module owns one entity (or a tightly related pair) and exposes the
//! find/save/delete operations the web layer composes. Helpers that must run both
//! inside and outside a transaction are generic over `ConnectionTrait`.

pub mod event_service;
pub mod group_service;
pub mod membership_service;
pub mod signup_service;
pub mod tag_service;
pub mod user_service;

pub use event_service::*;
pub use group_service::*;
pub use membership_service::*;
pub use signup_service::*;
pub use tag_service::*;
pub use user_service::*;

use sea_orm::{DbErr, SqlErr};

/// True when the error comes from a unique index or primary key.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
