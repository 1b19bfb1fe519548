//! SeaORM entities mapping the scheduling tables.

pub mod user;
pub mod group;
pub mod membership;
pub mod event;
pub mod tag;
pub mod slot;
pub mod signup;

