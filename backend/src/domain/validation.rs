//! Field-scoped validation errors and the shared rule helpers.
//!
//! Every rule reports through [`ValidationErrors`], which keeps violations
//! in the order they were found. Rules never short-circuit across fields, so
//! a caller sees every rejected attribute in one response.

use std::fmt;

/// Reason reported when a required value is empty.
pub const CANT_BE_BLANK: &str = "Can't be blank";
/// Reason reported when a value exceeds its length limit.
pub const TOO_LONG: &str = "Too long";
/// Reason reported when a value does not match its expected shape.
pub const WRONG_FORMAT: &str = "Wrong format";
/// Reason reported when a patch value has the wrong JSON type.
pub const WRONG_TYPE: &str = "Wrong type";
/// Reason reported when a count or size is below zero.
pub const MUST_NOT_BE_NEGATIVE: &str = "Must not be negative";

/// A single rejected attribute.
///
/// Renders as `"<field>: <reason>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: String,
    reason: String,
}

impl ValidationError {
    /// Create an error for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the rejected field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Human-readable rejection reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Prefix the field with a batch position, e.g. `[2] filename`.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self {
            field: format!("[{index}] {}", self.field),
            reason: self.reason,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Ordered collection of [`ValidationError`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Record a violation for `field` with `reason`.
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.push(ValidationError::new(field, reason));
    }

    /// True when nothing was rejected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Rendered `"field: reason"` strings.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

/// Full-entity validation run before a create.
pub trait Validate {
    /// Collect every violation on the value.
    fn validate(&self) -> ValidationErrors;
}

/// Reject empty or whitespace-only values.
pub fn require_present(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, CANT_BE_BLANK);
        return false;
    }
    true
}

/// Reject values longer than `max` characters.
pub fn require_max_chars(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add(field, TOO_LONG);
        return false;
    }
    true
}
