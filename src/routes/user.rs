use crate::{
    AppState,
    auth::{create_token, current_uid},
    dto::{AuthResponse, LoginRequest, SignupRequest, UserResponse},
    errors::ApiError,
    models::User,
};
use axum::{Json, extract::State, http::HeaderMap};
use bcrypt::{hash, verify};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// POST /auth/signup
/// Body: { "email": "...", "username": "...", "password": "..." }
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let hashed_password = hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = User {
        id: Uuid::new_v4(),
        email: payload.email,
        username: payload.username,
        hashed_password,
        created_at: Utc::now().timestamp(),
    };

    // Claiming the email and checking for it happen under one shard lock.
    match state.email_index.entry(user.email.clone()) {
        Entry::Occupied(_) => return Err(ApiError::UserAlreadyExists),
        Entry::Vacant(slot) => {
            slot.insert(user.id);
        }
    }
    state.users.insert(user.id, user.clone());

    let token = create_token(
        &user.uid(),
        &user.email,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    info!("New user registered: {}", user.email);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /auth/login
/// Body: { "email": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user_id = state
        .email_index
        .get(&payload.email)
        .map(|entry| *entry)
        .ok_or(ApiError::InvalidCredentials)?;

    let user = state
        .users
        .get(&user_id)
        .map(|entry| entry.clone())
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = verify(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_token(
        &user.uid(),
        &user.email,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    info!("User logged in: {}", user.email);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /users/me
/// Headers: Authorization: Bearer <token>
pub async fn get_current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let user_id = Uuid::parse_str(&uid).map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .users
        .get(&user_id)
        .map(|entry| entry.clone())
        .ok_or_else(|| ApiError::NotFound(format!("user {}", user_id)))?;

    Ok(Json(user.into()))
}
