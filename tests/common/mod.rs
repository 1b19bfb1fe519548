#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use slotify::db::entities::{group, membership, user};
use slotify::db::{schema, services};
use slotify::server::config::{EventAccessPolicy, ServerConfig};
use slotify::services::auth_service;

pub const JWT_SECRET: &str = "test-secret";

/// In-memory SQLite with the schema and the `speaker`/`volunteer` tags.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // One connection, otherwise each pooled connection sees its own database.
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();

    schema::ensure_schema(&db).await.unwrap();
    services::seed_tags(&db, &["speaker".to_string(), "volunteer".to_string()])
        .await
        .unwrap();
    db
}

pub fn test_config(policy: EventAccessPolicy) -> Arc<ServerConfig> {
    Arc::new(ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_ttl_hours: 1,
        log_dir: "logs".to_string(),
        db_max_connections: 1,
        event_access_policy: policy,
        seed_tags: Vec::new(),
    })
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    services::create_user(db, username, "not-a-real-hash").await.unwrap()
}

pub async fn create_group(db: &DatabaseConnection, name: &str) -> group::Model {
    group::ActiveModel {
        name: Set(name.to_string()),
        description: Set(String::new()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn add_member(
    db: &DatabaseConnection,
    group_id: i32,
    user_id: i32,
    is_approved: bool,
    is_admin: bool,
) -> membership::Model {
    membership::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        is_approved: Set(is_approved),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn token_for(user: &user::Model) -> String {
    auth_service::create_jwt_for_user(user, JWT_SECRET, 1).unwrap().token
}
