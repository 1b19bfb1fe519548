use axum::{Extension, extract::State};
use std::sync::Arc;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services;
use crate::web::AppState;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

pub async fn register_user(pool: &DatabaseConnection, req: RegisterRequest) -> Result<UserResponse, AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Username cannot be empty and password must be at least 8 characters.".to_string(),
        ));
    }

    if services::get_user_by_username(pool, username).await?.is_some() {
        return Err(AppError::UserAlreadyExists("Username is already taken.".to_string()));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let user_model = services::create_user(pool, username, &password_hash)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create user: {e}")))?;

    info!(user_id = user_model.id, "User registered.");
    Ok(UserResponse {
        id: user_model.id,
        username: user_model.username,
    })
}

pub async fn login_user(
    pool: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<LoginResponse, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Username and password cannot be empty.".to_string()));
    }

    let user = services::get_user_by_username(pool, &req.username)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;

    if !valid_password {
        warn!(username = %req.username, "Login rejected: wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret, ttl_hours)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str, ttl_hours: i64) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username.clone(),
    })
}

/// Validates a token and returns the identity it carries.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error.");
        AppError::InvalidCredentials
    })?;

    Ok(AuthenticatedUser {
        id: token_data.claims.user_id,
        username: token_data.claims.sub,
    })
}

pub async fn me(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<axum::Json<UserResponse>, AppError> {
    let user = services::get_user_by_id(&app_state.db_pool, user.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(axum::Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
