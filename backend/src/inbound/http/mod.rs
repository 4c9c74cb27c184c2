//! HTTP inbound adapter exposing the sync and revision endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod items;
pub mod revisions;
pub mod schemas;
pub mod state;

pub use error::ApiResult;
