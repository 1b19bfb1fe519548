use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

use crate::db::{entities::tag, services};
use crate::web::{AppError, AppState};

async fn list_tags_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<tag::Model>>, AppError> {
    let tags = services::get_all_tags(&app_state.db_pool).await?;
    Ok(Json(tags))
}

pub fn create_tag_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_tags_handler))
}
