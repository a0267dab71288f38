//! Request middleware.
//!
//! Purpose: request tracing and the authorisation gates that resolve
//! principals for the HTTP handlers.

pub mod auth;
pub mod trace;

pub use auth::{Authorize, Gate};
pub use trace::Trace;
