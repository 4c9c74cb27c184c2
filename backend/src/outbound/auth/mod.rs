//! Adapter for the external auth service.

mod dto;
mod http_auth_service;

pub use http_auth_service::HttpAuthService;
