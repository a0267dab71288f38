//! People notified about an app's releases.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::record::Record;
use super::validation::{
    Validate, ValidationError, ValidationErrors, WRONG_FORMAT, require_max_chars, require_present,
};
use super::whitelist::{
    FieldName, UpdatableField, Whitelist, json_optional_string, json_optional_timestamp,
    json_string, updatable_fields,
};

const EMAIL_MAX_CHARS: usize = 255;
const CONFIRMATION_TOKEN_LENGTH: usize = 32;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$")
        .expect("valid email pattern")
});

/// Which release events a contact wants to hear about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPreferences {
    /// A new version became available.
    pub new_version: bool,
    /// A publish finished successfully.
    pub successful_publish: bool,
    /// A publish failed.
    pub failed_publish: bool,
}

impl NotificationPreferences {
    /// Decode a stored blob; absent, `null`, empty text or `{}` mean all off.
    ///
    /// # Errors
    /// Returns `notification_preferences: Wrong format` for any other shape.
    ///
    /// # Examples
    /// ```
    /// use ship_backend::domain::NotificationPreferences;
    /// use serde_json::json;
    ///
    /// let prefs = NotificationPreferences::from_blob(None).unwrap();
    /// assert!(!prefs.new_version);
    /// let prefs = NotificationPreferences::from_blob(Some(&json!({ "new_version": true }))).unwrap();
    /// assert!(prefs.new_version);
    /// ```
    pub fn from_blob(blob: Option<&Value>) -> Result<Self, ValidationError> {
        match blob {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(Self::default()),
            Some(value) => Self::deserialize(value).map_err(|_| {
                ValidationError::new(AppContactField::NotificationPreferences.name(), WRONG_FORMAT)
            }),
        }
    }

    /// Encode for storage.
    pub fn to_blob(self) -> Value {
        serde_json::json!({
            "new_version": self.new_version,
            "successful_publish": self.successful_publish,
            "failed_publish": self.failed_publish,
        })
    }
}

/// A contact subscribed to an app's release notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AppContact {
    /// Identifier and timestamps.
    #[serde(flatten)]
    pub record: Record,
    /// Owning app.
    pub app_id: Uuid,
    /// Address notifications go to.
    pub email: String,
    /// Token mailed to the contact; cleared once confirmed.
    #[serde(skip)]
    pub confirmation_token: Option<String>,
    /// When the contact confirmed their address.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Stored preference blob.
    #[schema(value_type = Option<NotificationPreferences>)]
    pub notification_preferences: Option<Value>,
}

impl AppContact {
    /// Decoded preferences.
    ///
    /// # Errors
    /// Fails when the stored blob is malformed.
    pub fn notification_preferences(&self) -> Result<NotificationPreferences, ValidationError> {
        NotificationPreferences::from_blob(self.notification_preferences.as_ref())
    }

    /// Mark the contact confirmed at `now` and clear the token.
    ///
    /// Returns the attributes that must be persisted. Applying it to an
    /// already confirmed contact writes the same columns again.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Whitelist<AppContactField> {
        self.confirmed_at = Some(now);
        self.confirmation_token = None;
        Whitelist::of([AppContactField::ConfirmedAt, AppContactField::ConfirmationToken])
    }

    /// Replace the preference flags.
    pub fn set_notification_preferences(
        &mut self,
        preferences: NotificationPreferences,
    ) -> Whitelist<AppContactField> {
        self.notification_preferences = Some(preferences.to_blob());
        Whitelist::of([AppContactField::NotificationPreferences])
    }

    /// True once the contact has confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }
}

/// Values for a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAppContact {
    /// Owning app.
    pub app_id: Uuid,
    /// Address to notify.
    pub email: String,
    /// Confirmation token; generated on create when absent.
    pub confirmation_token: Option<String>,
    /// Preference blob.
    pub notification_preferences: Option<Value>,
}

/// Sparse lookup over contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppContactFilter {
    /// Match on identifier.
    pub id: Option<Uuid>,
    /// Match on owning app.
    pub app_id: Option<Uuid>,
    /// Match on email.
    pub email: Option<String>,
    /// Match on pending confirmation token.
    pub confirmation_token: Option<String>,
}

impl AppContactFilter {
    /// Filter by identifier.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Contact `id` belonging to `app_id`.
    pub fn owned(id: Uuid, app_id: Uuid) -> Self {
        Self {
            id: Some(id),
            app_id: Some(app_id),
            ..Self::default()
        }
    }

    /// Filter by pending confirmation token.
    pub fn by_confirmation_token(token: impl Into<String>) -> Self {
        Self {
            confirmation_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// True when no member is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.app_id.is_none()
            && self.email.is_none()
            && self.confirmation_token.is_none()
    }
}

updatable_fields! {
    /// Attributes of [`AppContact`] that may be changed after creation.
    pub enum AppContactField {
        /// Address.
        Email => "email",
        /// Pending confirmation token.
        ConfirmationToken => "confirmation_token",
        /// Confirmation time.
        ConfirmedAt => "confirmed_at",
        /// Preference blob.
        NotificationPreferences => "notification_preferences",
    }
}

/// Email rules, reporting at most one error.
fn validate_email(errors: &mut ValidationErrors, email: &str) {
    let field = AppContactField::Email.name();
    if !require_present(errors, field, email) || !require_max_chars(errors, field, email, EMAIL_MAX_CHARS) {
        return;
    }
    if !EMAIL.is_match(email) {
        errors.add(field, WRONG_FORMAT);
    }
}

fn validate_preferences(errors: &mut ValidationErrors, blob: Option<&Value>) {
    if let Err(error) = NotificationPreferences::from_blob(blob) {
        errors.push(error);
    }
}

impl UpdatableField for AppContactField {
    type Entity = AppContact;

    fn assign(self, contact: &mut AppContact, value: Value) -> Result<(), ValidationError> {
        match self {
            Self::Email => contact.email = json_string(self, value)?,
            Self::ConfirmationToken => contact.confirmation_token = json_optional_string(self, value)?,
            Self::ConfirmedAt => contact.confirmed_at = json_optional_timestamp(self, value)?,
            Self::NotificationPreferences => contact.notification_preferences = Some(value),
        }
        Ok(())
    }

    fn validate(self, contact: &AppContact, errors: &mut ValidationErrors) {
        match self {
            Self::Email => validate_email(errors, &contact.email),
            Self::NotificationPreferences => {
                validate_preferences(errors, contact.notification_preferences.as_ref());
            }
            Self::ConfirmationToken | Self::ConfirmedAt => {}
        }
    }
}

impl Validate for NewAppContact {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_email(&mut errors, &self.email);
        validate_preferences(&mut errors, self.notification_preferences.as_ref());
        errors
    }
}

/// Random token mailed to a new contact.
pub fn generate_confirmation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
