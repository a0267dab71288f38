//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories built on Diesel.
//!
//! Adapters translate between domain types and storage rows. They contain no
//! business rules beyond running the entity validators before a write.

pub mod persistence;
