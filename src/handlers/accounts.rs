// handlers/accounts.rs - sign-up, sign-in, change-password, sign-out

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{hash_password, verify_password};
use crate::database::{Document, Owner};
use crate::error::ApiError;
use crate::middleware::{ApiResult, Principal, ResourceResponse};
use crate::resources::user::{HASHED_PASSWORD, SESSION_TOKEN};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub credentials: Credentials,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub passwords: Passwords,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Passwords {
    pub old: String,
    pub new: String,
}

/**
 * POST /sign-up - Create an account
 *
 * Expected Input:
 * ```json
 * { "credentials": { "email": "a@b.c", "password": "pw", "password_confirmation": "pw" } }
 * ```
 *
 * Responds 201 with `{ "user": { "id", "email", ... } }`. The password hash
 * is never part of the response.
 */
pub async fn sign_up(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(CredentialsRequest { credentials }) = body?;

    if credentials.password.is_empty() {
        return Err(ApiError::invalid_field("password", "is required"));
    }
    if credentials.password_confirmation.as_deref() != Some(credentials.password.as_str()) {
        return Err(ApiError::invalid_field("password_confirmation", "does not match password"));
    }

    let hashed = hash_blocking(credentials.password).await?;

    let mut fields = Map::new();
    fields.insert("email".to_string(), Value::String(credentials.email));
    fields.insert(HASHED_PASSWORD.to_string(), Value::String(hashed));

    let users = state.users();
    let user = users.insert(Owner::Itself, fields).await?;
    tracing::info!("Signed up user {}", user.id);

    Ok(ResourceResponse::created("user", users.schema().render(&user)))
}

/**
 * POST /sign-in - Exchange credentials for a bearer token
 *
 * Expected Input:
 * ```json
 * { "credentials": { "email": "a@b.c", "password": "pw" } }
 * ```
 *
 * Responds 201 with the user and its fresh token under `user.token`. Every
 * sign-in starts a new session, so tokens from earlier sessions stop working.
 */
pub async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(CredentialsRequest { credentials }) = body?;
    let users = state.users();

    let user = users
        .find_one_by("email", &Value::String(credentials.email.clone()))
        .await?
        .ok_or_else(bad_credentials)?;

    let hash = stored_hash(&user)?;
    if !verify_blocking(credentials.password, hash).await? {
        tracing::warn!("Failed sign-in for user {}", user.id);
        return Err(bad_credentials());
    }

    let session = start_session(&state, &user).await?;
    let token = state
        .tokens
        .issue(user.id, &credentials.email, &session)
        .map_err(|e| {
            tracing::error!("Failed to issue token: {}", e);
            ApiError::internal_server_error("Failed to issue token")
        })?;

    let mut rendered = users.schema().render(&user);
    if let Value::Object(map) = &mut rendered {
        map.insert("token".to_string(), Value::String(token));
    }

    tracing::info!("Signed in user {}", user.id);
    Ok(ResourceResponse::created("user", rendered))
}

/// PATCH /change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(ChangePasswordRequest { passwords }) = body?;

    if passwords.new.is_empty() {
        return Err(ApiError::invalid_field("passwords.new", "is required"));
    }

    let users = state.users();
    let user = users.find_by_id(principal.id).await?;
    let hash = stored_hash(&user)?;
    if !verify_blocking(passwords.old, hash).await? {
        return Err(ApiError::invalid_field("passwords.old", "is incorrect"));
    }

    let mut changes = Map::new();
    changes.insert(HASHED_PASSWORD.to_string(), Value::String(hash_blocking(passwords.new).await?));
    users.update(user.id, changes).await?;

    tracing::info!("Changed password for user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    let user = state.users().find_by_id(principal.id).await?;
    start_session(&state, &user).await?;

    tracing::info!("Signed out user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the user's session key, invalidating every token issued before.
async fn start_session(state: &AppState, user: &Document) -> Result<String, ApiError> {
    let session = Uuid::new_v4().simple().to_string();

    let mut changes = Map::new();
    changes.insert(SESSION_TOKEN.to_string(), Value::String(session.clone()));
    state.users().update(user.id, changes).await?;

    Ok(session)
}

fn bad_credentials() -> ApiError {
    ApiError::unauthenticated("Invalid email or password")
}

fn stored_hash(user: &Document) -> Result<String, ApiError> {
    user.get_str(HASHED_PASSWORD).map(str::to_string).ok_or_else(|| {
        tracing::error!("User {} has no password hash", user.id);
        ApiError::internal_server_error("Account is missing credentials")
    })
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Password task failed: {e}")))?
        .map_err(|e| {
            tracing::error!("{}", e);
            ApiError::internal_server_error("Failed to hash password")
        })
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Password task failed: {e}")))?
        .map_err(|e| {
            tracing::error!("{}", e);
            ApiError::internal_server_error("Failed to verify password")
        })
}
