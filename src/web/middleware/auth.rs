use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::models::Requester;
use crate::web::{AppState, error::AppError};

// Authorization header first, then the `token` cookie
fn extract_token(req: &Request<AxumBody>, jar: &CookieJar) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
}

/// Rejects requests without a valid token and attaches `AuthenticatedUser`.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req, &jar).ok_or(AppError::InvalidCredentials)?;
    let authenticated_user = auth_service::decode_token(&token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(Requester(Some(authenticated_user.clone())));
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Attaches a `Requester` to every request. Anonymous requests pass through;
/// a token that is present but invalid is still rejected.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let requester = match extract_token(&req, &jar) {
        Some(token) => Requester(Some(auth_service::decode_token(&token, &state.config.jwt_secret)?)),
        None => Requester(None),
    };

    req.extensions_mut().insert(requester);
    Ok(next.run(req).await)
}
