//! Backend of the Ship add-on.
//!
//! Hexagonal layout: [`domain`] holds entities, validation and ports;
//! [`outbound`] implements the ports on PostgreSQL; [`inbound`] exposes them
//! over HTTP behind the gates in [`middleware`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
