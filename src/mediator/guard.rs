//! Ownership checks for mutating operations.

use thiserror::Error;
use uuid::Uuid;

use crate::database::Document;
use crate::middleware::Principal;

/// A principal tried to modify a resource owned by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{principal} does not own {resource}")]
pub struct OwnershipError {
    pub principal: Uuid,
    pub owner: Uuid,
    pub resource: Uuid,
}

/// Decides whether `principal` may mutate `resource`. On success the
/// resource is handed back so callers can keep going with it.
pub trait OwnershipGuard: Send + Sync {
    fn check_ownership(&self, principal: &Principal, resource: Document) -> Result<Document, OwnershipError>;
}

/// Only the principal recorded as `owner` may mutate.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl OwnershipGuard for OwnerOnly {
    fn check_ownership(&self, principal: &Principal, resource: Document) -> Result<Document, OwnershipError> {
        if resource.owner == principal.id {
            Ok(resource)
        } else {
            Err(OwnershipError {
                principal: principal.id,
                owner: resource.owner,
                resource: resource.id,
            })
        }
    }
}
