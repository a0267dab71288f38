//! Shared helpers for the repository integration suites.
//!
//! Each file under `backend/tests/` compiles as its own crate, so the suites
//! pull these in with `mod support;`.

#![allow(dead_code)]

pub mod cluster_skip;
pub mod embedded_postgres;
pub mod shared_cluster;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{provision_template_database, seed_app, seed_version};

/// Render a `postgres` error with its SQLSTATE, detail and hint.
///
/// `Display` on `postgres::Error` often collapses to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}
