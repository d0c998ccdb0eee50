/// Authentication endpoints
///
/// - `POST /auth/register` - Register new user
/// - `POST /auth/login` - Login, sets `access_token` and `refresh_token` cookies
/// - `POST /auth/refresh` - Exchange the refresh cookie for a new access token
/// - `GET  /auth/me` - Current user profile
/// - `PUT  /auth/me/contacts` - Update Telegram chat ID / phone number
///
/// Cookies are `HttpOnly; SameSite=Lax; Path=/` with `Max-Age` equal to the
/// token lifetime, plus `Secure` in production.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ensure_storable, JsonBody},
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskminder_shared::{
    auth::{
        credentials::{self, ACCESS_COOKIE, REFRESH_COOKIE},
        password,
    },
    models::user::{CreateUser, UpdateContacts, User, UserProfile},
};
use validator::Validate;

/// Width of `users.telegram_chat_id`
const MAX_CHAT_ID_LEN: usize = 64;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 1024, message = "Password must not be empty"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Body returned alongside token cookies
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub message: String,

    /// Same value as the `access_token` cookie, for bearer clients
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Builds a `Set-Cookie` value for a token
fn token_cookie(name: &str, value: &str, max_age: chrono::Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        name,
        value,
        max_age.num_seconds()
    );

    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "email": "alice@x.io", "password": "pw1" }
/// ```
///
/// # Response
///
/// ```json
/// { "id": "uuid", "email": "alice@x.io", "is_active": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, empty password, or email already registered
pub async fn register(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<UserProfile>> {
    req.email = normalize_email(&req.email);
    req.validate().map_err(ApiError::from_validation)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(UserProfile::from(user)))
}

/// Login endpoint
///
/// Verifies the password and sets both token cookies. Unknown email and wrong
/// password produce the same 401.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "alice@x.io", "password": "pw1" }
/// ```
///
/// # Response
///
/// ```text
/// Set-Cookie: access_token=eyJ...; Max-Age=900; Path=/; HttpOnly; SameSite=Lax
/// Set-Cookie: refresh_token=eyJ...; Max-Age=604800; Path=/; HttpOnly; SameSite=Lax
///
/// { "message": "Login successful", "access_token": "eyJ...", "token_type": "bearer" }
/// ```
pub async fn login(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.email = normalize_email(&req.email);
    req.validate().map_err(ApiError::from_validation)?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is disabled".to_string()));
    }

    let access_token = state.tokens.issue_access(&user.id)?;
    let refresh_token = state.tokens.issue_refresh(&user.id)?;
    let secure = state.config.api.production;

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            token_cookie(ACCESS_COOKIE, &access_token, state.tokens.access_ttl(), secure),
        ),
        (
            header::SET_COOKIE,
            token_cookie(REFRESH_COOKIE, &refresh_token, state.tokens.refresh_ttl(), secure),
        ),
    ]);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        cookies,
        Json(TokenResponse {
            message: "Login successful".to_string(),
            access_token,
            token_type: "bearer".to_string(),
        }),
    ))
}

/// Token refresh endpoint
///
/// Reads the `refresh_token` cookie and sets a fresh `access_token` cookie.
/// The refresh token itself is not rotated.
///
/// # Errors
///
/// - `401 Unauthorized`: cookie missing, token invalid or expired, or user gone
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = credentials::refresh_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".to_string()))?;

    let access_token = state.identity().refresh(&refresh_token).await?;

    let cookie = token_cookie(
        ACCESS_COOKIE,
        &access_token,
        state.tokens.access_ttl(),
        state.config.api.production,
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(TokenResponse {
            message: "Token refreshed".to_string(),
            access_token,
            token_type: "bearer".to_string(),
        }),
    ))
}

/// Current user profile
pub async fn me(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
    Json(user)
}

/// Update the current user's contact fields
///
/// Absent fields are left alone; `null` or an empty string clears a field.
///
/// ```text
/// PUT /auth/me/contacts
///
/// { "telegram_chat_id": "123456789", "phone_number": null }
/// ```
pub async fn update_contacts(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    JsonBody(mut req): JsonBody<UpdateContacts>,
) -> ApiResult<Json<UserProfile>> {
    if req.is_empty() {
        return Err(ApiError::BadRequest("No contact fields supplied".to_string()));
    }

    req.telegram_chat_id = req.telegram_chat_id.map(normalize_contact);
    req.phone_number = req.phone_number.map(normalize_contact);

    if let Some(Some(chat_id)) = &req.telegram_chat_id {
        if !is_valid_chat_id(chat_id) {
            return Err(ApiError::BadRequest("Invalid Telegram chat ID".to_string()));
        }
    }

    if let Some(Some(phone)) = &req.phone_number {
        ensure_storable("phone_number", phone)?;
        let valid = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
        if !valid || phone.len() > 32 {
            return Err(ApiError::BadRequest("Invalid phone number".to_string()));
        }
    }

    let updated = User::update_contacts(&state.db, &user.id, req)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "Contacts updated");

    Ok(Json(UserProfile::from(updated)))
}

/// Telegram chat IDs are integers; group chats are negative
fn is_valid_chat_id(chat_id: &str) -> bool {
    let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
    chat_id.len() <= MAX_CHAT_ID_LEN
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}

fn normalize_contact(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
