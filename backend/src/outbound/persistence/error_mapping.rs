//! Diesel and pool error mapping into [`RepositoryError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Map pool failures to connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RepositoryError::connection(message)
        }
    }
}

/// Map Diesel failures, keeping the database message for query errors.
pub(crate) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => RepositoryError::not_found(),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            RepositoryError::connection(info.message())
        }
        DieselError::DatabaseError(_, info) => RepositoryError::query(info.message()),
        other => RepositoryError::query(other.to_string()),
    }
}

/// Reject lookups that would match an arbitrary row.
pub(crate) fn empty_filter_error(entity: &str) -> RepositoryError {
    RepositoryError::query(format!("refusing to look up {entity} without a filter"))
}
