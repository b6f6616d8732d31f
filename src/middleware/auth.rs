use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::resources::user::SESSION_TOKEN;

/// The authenticated caller, injected into request extensions by `require_token`
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

/// Bearer authentication for protected routes. Requests that do not resolve
/// to a principal are answered with 401 here and never reach a handler.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(ApiError::unauthenticated)?;
    let principal = resolve_principal(&state, &token).await?;

    tracing::debug!("Authenticated {} ({})", principal.email, principal.id);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Token → principal. The token must verify, name an existing user, and carry
/// that user's current session key (sign-in and sign-out rotate it).
pub async fn resolve_principal(state: &AppState, token: &str) -> Result<Principal, ApiError> {
    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthenticated("Invalid bearer token")
    })?;

    let user = match state.users().find_by_id(claims.sub).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            tracing::warn!("Bearer token for unknown user {}", claims.sub);
            return Err(ApiError::unauthenticated("Invalid bearer token"));
        }
        Err(e) => return Err(e.into()),
    };

    if user.get_str(SESSION_TOKEN) != Some(claims.sid.as_str()) {
        tracing::warn!("Bearer token for ended session of user {}", user.id);
        return Err(ApiError::unauthenticated("Session has ended"));
    }

    Ok(Principal {
        id: user.id,
        email: user.get_str("email").unwrap_or(claims.email.as_str()).to_string(),
    })
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
