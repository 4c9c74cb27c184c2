//! Request middleware.
//!
//! Purpose: wrap the request lifecycle with cross-cutting concerns such as
//! trace correlation.

pub mod trace;

pub use trace::Trace;
