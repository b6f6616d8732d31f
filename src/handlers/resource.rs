//! Generic resource routes: `/<plural>` and `/<plural>/:id`, one set per
//! registered resource type, all behind the auth boundary.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::mediator::CrudMediator;
use crate::middleware::{ApiResult, Principal, ResourceResponse};
use crate::schema::OwnerPolicy;

use super::utils::envelope_body;

type Mediator = Arc<CrudMediator>;

/// Self-owned resources (users) are created through sign-up, so their
/// collection route has no POST.
pub fn routes(mediator: Mediator) -> Router {
    let schema = mediator.schema();
    let collection_path = format!("/{}", schema.plural);
    let item_path = format!("/{}/:id", schema.plural);

    let collection_route = match schema.owner_policy {
        OwnerPolicy::Principal => get(list).post(create),
        OwnerPolicy::SelfOwned => get(list),
    };

    Router::new()
        .route(&collection_path, collection_route)
        .route(&item_path, get(show).patch(update).delete(destroy))
        .with_state(mediator)
}

/// GET /<plural>
pub async fn list(State(mediator): State<Mediator>) -> ApiResult<Vec<Value>> {
    let items = mediator.list().await?;
    Ok(ResourceResponse::ok(mediator.schema().plural, items))
}

/// GET /<plural>/:id
pub async fn show(State(mediator): State<Mediator>, Path(id): Path<String>) -> ApiResult<Value> {
    let item = mediator.get(&id).await?;
    Ok(ResourceResponse::ok(mediator.schema().singular, item))
}

/// POST /<plural>
pub async fn create(
    State(mediator): State<Mediator>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = body?;
    let singular = mediator.schema().singular;
    let fields = envelope_body(singular, body)?;

    let created = mediator.create(fields, &principal).await?;
    Ok(ResourceResponse::created(singular, created))
}

/// PATCH /<plural>/:id
pub async fn update(
    State(mediator): State<Mediator>,
    Path(id): Path<String>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body?;
    let fields = envelope_body(mediator.schema().singular, body)?;

    mediator.patch(&id, fields, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /<plural>/:id
pub async fn destroy(
    State(mediator): State<Mediator>,
    Path(id): Path<String>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    mediator.delete(&id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
