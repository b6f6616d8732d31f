pub mod auth;
pub mod response;

pub use auth::{require_token, resolve_principal, Principal};
pub use response::{ApiResult, ResourceResponse};
