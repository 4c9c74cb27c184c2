//! Inbound adapters that translate external requests into domain use-case
//! calls while keeping framework details at the edge.

pub mod http;
