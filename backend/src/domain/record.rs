//! Attributes shared by every persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifier and timestamps assigned by storage when a row is created.
///
/// `id` never changes after creation; `updated_at` moves forward on every
/// successful write and is never earlier than `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Record {
    /// Opaque unique key.
    pub id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest successful write.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Build a record from stored values.
    pub fn new(id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at,
        }
    }
}
