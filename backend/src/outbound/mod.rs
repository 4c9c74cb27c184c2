//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **auth**: reqwest client for the auth service
//! - **events**: in-process domain event channel
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod auth;
pub mod events;
pub mod persistence;
