//! PostgreSQL persistence adapters built on Diesel.
//!
//! Each adapter implements one repository port over a shared `bb8` pool of
//! `diesel-async` connections. Row structs and the schema stay private to
//! this module; callers only see domain types and [`RepositoryError`].
//!
//! Writes validate before touching the database, multi-row writes run in a
//! single transaction, and Diesel's `NotFound` becomes
//! [`RepositoryError::NotFound`].
//!
//! # Example
//!
//! ```ignore
//! use ship_backend::outbound::persistence::{DbPool, DieselAppVersionRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ship")).await?;
//! let versions = DieselAppVersionRepository::new(pool);
//! ```
//!
//! [`RepositoryError`]: crate::domain::ports::RepositoryError
//! [`RepositoryError::NotFound`]: crate::domain::ports::RepositoryError::NotFound

mod diesel_app_contact_repository;
mod diesel_app_repository;
mod diesel_app_version_repository;
mod diesel_screenshot_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_app_contact_repository::DieselAppContactRepository;
pub use diesel_app_repository::DieselAppRepository;
pub use diesel_app_version_repository::DieselAppVersionRepository;
pub use diesel_screenshot_repository::DieselScreenshotRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
