//! Result of a write that passed transport parsing.

use super::validation::ValidationErrors;

/// Either the stored value or the validation errors that blocked the write.
///
/// Infrastructure failures travel separately in the surrounding `Result`, so
/// a rejected write and a storage fault can never be reported together.
///
/// # Examples
/// ```
/// use ship_backend::domain::{ValidationErrors, WriteOutcome};
///
/// let outcome: WriteOutcome<u8> = WriteOutcome::Applied(7);
/// assert_eq!(outcome.into_result(), Ok(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome<T> {
    /// The write happened; carries the stored value.
    Applied(T),
    /// Nothing was written; carries every violation found.
    Rejected(ValidationErrors),
}

impl<T> WriteOutcome<T> {
    /// Reject when `errors` is non-empty, otherwise build the value.
    pub fn from_errors(errors: ValidationErrors, value: impl FnOnce() -> T) -> Self {
        if errors.is_empty() {
            Self::Applied(value())
        } else {
            Self::Rejected(errors)
        }
    }

    /// Transform the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        match self {
            Self::Applied(value) => WriteOutcome::Applied(f(value)),
            Self::Rejected(errors) => WriteOutcome::Rejected(errors),
        }
    }

    /// True when the write was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<T, ValidationErrors> {
        match self {
            Self::Applied(value) => Ok(value),
            Self::Rejected(errors) => Err(errors),
        }
    }
}
