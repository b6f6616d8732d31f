pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mediator;
pub mod middleware;
pub mod registry;
pub mod resources;
pub mod schema;

pub use app::{router, AppState};
