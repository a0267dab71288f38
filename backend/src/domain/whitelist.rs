//! Whitelisted partial updates.
//!
//! Each entity declares an enum of the attributes callers may change. The
//! enum is the only way to name a column in an update: internal callers pick
//! variants directly, external names go through [`Whitelist::parse`] or
//! [`apply_patch`], which reject anything the enum does not list.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::outcome::WriteOutcome;
use super::validation::{ValidationError, ValidationErrors, WRONG_TYPE};

/// A name that does not correspond to any updatable attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attribute `{name}` doesn't exist in the model")]
pub struct UnknownAttribute {
    name: String,
}

impl UnknownAttribute {
    /// Build the error for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The offending attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Closed set of attribute names for one entity.
///
/// Implemented by [`updatable_fields!`]; do not implement by hand.
pub trait FieldName:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr<Err = UnknownAttribute> + 'static
{
    /// Every attribute in declaration order.
    const ALL: &'static [Self];

    /// Stable snake_case name, matching the storage column and JSON key.
    fn name(self) -> &'static str;
}

/// Setter and validator for one updatable attribute.
pub trait UpdatableField: FieldName {
    /// Entity the attribute belongs to.
    type Entity;

    /// Replace the attribute on `entity` with a JSON value.
    ///
    /// # Errors
    /// Returns `"<field>: Wrong type"` when `value` has the wrong shape.
    fn assign(self, entity: &mut Self::Entity, value: Value) -> Result<(), ValidationError>;

    /// Check the attribute's current value on `entity`.
    fn validate(self, entity: &Self::Entity, errors: &mut ValidationErrors);
}

/// Declare an entity's updatable attributes.
macro_rules! updatable_fields {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $column:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::domain::whitelist::FieldName for $name {
            const ALL: &'static [Self] = &[$(Self::$variant,)*];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $column,)*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::domain::whitelist::FieldName::name(*self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::whitelist::UnknownAttribute;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::domain::whitelist::FieldName>::ALL
                    .iter()
                    .copied()
                    .find(|field| $crate::domain::whitelist::FieldName::name(*field) == s)
                    .ok_or_else(|| $crate::domain::whitelist::UnknownAttribute::new(s))
            }
        }
    };
}

pub(crate) use updatable_fields;

/// Ordered, de-duplicated set of attributes authorised for one update.
///
/// # Examples
/// ```
/// use ship_backend::domain::{AppField, Whitelist};
///
/// let whitelist = Whitelist::<AppField>::parse(["plan", "plan"]).unwrap();
/// assert_eq!(whitelist.names(), ["plan"]);
/// assert!(Whitelist::<AppField>::parse(["api_token"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist<F> {
    fields: Vec<F>,
}

impl<F: FieldName> Default for Whitelist<F> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<F: FieldName> Whitelist<F> {
    /// Empty whitelist; an update with it only refreshes `updated_at`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every updatable attribute.
    pub fn all() -> Self {
        Self::of(F::ALL.iter().copied())
    }

    /// Whitelist from typed fields, keeping the first occurrence of each.
    pub fn of(fields: impl IntoIterator<Item = F>) -> Self {
        let mut seen = HashSet::new();
        let fields = fields.into_iter().filter(|field| seen.insert(*field)).collect();
        Self { fields }
    }

    /// Resolve external attribute names.
    ///
    /// # Errors
    /// Fails on the first name that is not an updatable attribute.
    pub fn parse<I>(names: I) -> Result<Self, UnknownAttribute>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|name| name.as_ref().parse::<F>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::of(fields))
    }

    /// Whether `field` may be written.
    pub fn contains(&self, field: F) -> bool {
        self.fields.contains(&field)
    }

    /// True when no attribute is authorised.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in the order they were authorised.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        self.fields.iter().copied()
    }

    /// Attribute names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(FieldName::name).collect()
    }
}

impl<F: UpdatableField> Whitelist<F> {
    /// Run the validators of the authorised attributes only.
    pub fn validate(&self, entity: &F::Entity) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in self.iter() {
            field.validate(entity, &mut errors);
        }
        errors
    }
}

/// Apply a JSON object of attribute changes to `entity`.
///
/// Every key is resolved before anything is assigned, so an unknown key leaves
/// `entity` untouched. Values of the wrong shape are collected as validation
/// errors. On success the returned whitelist names exactly the patched keys.
///
/// # Errors
/// Returns [`UnknownAttribute`] for the first key that is not updatable.
pub fn apply_patch<F: UpdatableField>(
    entity: &mut F::Entity,
    patch: &Map<String, Value>,
) -> Result<WriteOutcome<Whitelist<F>>, UnknownAttribute> {
    let resolved = patch
        .iter()
        .map(|(name, value)| name.parse::<F>().map(|field| (field, value)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut errors = ValidationErrors::new();
    for (field, value) in &resolved {
        if let Err(error) = field.assign(entity, (*value).clone()) {
            errors.push(error);
        }
    }
    let whitelist = Whitelist::of(resolved.into_iter().map(|(field, _)| field));
    Ok(WriteOutcome::from_errors(errors, || whitelist))
}

fn wrong_type(field: impl FieldName) -> ValidationError {
    ValidationError::new(field.name(), WRONG_TYPE)
}

pub(crate) fn json_string(field: impl FieldName, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(text) => Ok(text),
        _ => Err(wrong_type(field)),
    }
}

pub(crate) fn json_optional_string(
    field: impl FieldName,
    value: Value,
) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(wrong_type(field)),
    }
}

pub(crate) fn json_bool(field: impl FieldName, value: Value) -> Result<bool, ValidationError> {
    value.as_bool().ok_or_else(|| wrong_type(field))
}

pub(crate) fn json_i64(field: impl FieldName, value: Value) -> Result<i64, ValidationError> {
    value.as_i64().ok_or_else(|| wrong_type(field))
}

pub(crate) fn json_optional_timestamp(
    field: impl FieldName,
    value: Value,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| wrong_type(field)),
        _ => Err(wrong_type(field)),
    }
}

pub(crate) fn json_typed<T: DeserializeOwned>(
    field: impl FieldName,
    value: Value,
) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|_| wrong_type(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::CANT_BE_BLANK;
    use rstest::rstest;
    use serde_json::json;

    #[derive(Debug, Default)]
    pub struct Widget {
        label: String,
        count: i64,
    }

    updatable_fields! {
        pub enum WidgetField {
            Label => "label",
            Count => "count",
        }
    }

    impl UpdatableField for WidgetField {
        type Entity = Widget;

        fn assign(self, entity: &mut Widget, value: Value) -> Result<(), ValidationError> {
            match self {
                Self::Label => entity.label = json_string(self, value)?,
                Self::Count => entity.count = json_i64(self, value)?,
            }
            Ok(())
        }

        fn validate(self, entity: &Widget, errors: &mut ValidationErrors) {
            if self == Self::Label && entity.label.is_empty() {
                errors.add(self.name(), CANT_BE_BLANK);
            }
        }
    }

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    fn parse_rejects_unknown_names() {
        let err = Whitelist::<WidgetField>::parse(["label", "colour"]).unwrap_err();
        assert_eq!(err.to_string(), "attribute `colour` doesn't exist in the model");
    }

    #[rstest]
    fn of_deduplicates_preserving_order() {
        let whitelist = Whitelist::of([WidgetField::Count, WidgetField::Label, WidgetField::Count]);
        assert_eq!(whitelist.names(), ["count", "label"]);
    }

    #[rstest]
    fn validate_only_checks_whitelisted_fields() {
        let widget = Widget::default();
        assert!(Whitelist::of([WidgetField::Count]).validate(&widget).is_empty());
        assert_eq!(
            Whitelist::of([WidgetField::Label]).validate(&widget).messages(),
            ["label: Can't be blank"]
        );
    }

    #[rstest]
    fn apply_patch_assigns_and_whitelists_keys() {
        let mut widget = Widget::default();
        let outcome =
            apply_patch::<WidgetField>(&mut widget, &patch(json!({ "count": 4 }))).expect("known keys");
        let whitelist = outcome.applied().expect("well typed");
        assert_eq!(whitelist.names(), ["count"]);
        assert_eq!(widget.count, 4);
        assert!(widget.label.is_empty());
    }

    #[rstest]
    fn apply_patch_unknown_key_leaves_entity_untouched() {
        let mut widget = Widget::default();
        let result =
            apply_patch::<WidgetField>(&mut widget, &patch(json!({ "count": 9, "id": "x" })));
        assert_eq!(result.unwrap_err().name(), "id");
        assert_eq!(widget.count, 0);
    }

    #[rstest]
    fn apply_patch_collects_type_errors() {
        let mut widget = Widget::default();
        let outcome = apply_patch::<WidgetField>(
            &mut widget,
            &patch(json!({ "label": 1, "count": "many" })),
        )
        .expect("known keys");
        let errors = outcome.into_result().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.messages().contains(&"label: Wrong type".to_owned()));
        assert!(errors.messages().contains(&"count: Wrong type".to_owned()));
    }
}
