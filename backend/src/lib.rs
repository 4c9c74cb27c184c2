//! Item syncing server library.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the sync engine
//! and its ports, [`inbound`] adapts HTTP requests onto the driving ports
//! and [`outbound`] implements the driven ports against Postgres, the auth
//! service and an in-process event channel.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
