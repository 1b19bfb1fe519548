pub mod event_routes;
pub mod group_routes;
pub mod signup_routes;
pub mod tag_routes;
