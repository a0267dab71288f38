//! Apps registered through add-on provisioning.

use std::sync::LazyLock;

use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::record::Record;
use super::validation::{
    Validate, ValidationError, ValidationErrors, WRONG_FORMAT, require_present,
};
use super::whitelist::{FieldName, UpdatableField, json_optional_string, json_string, updatable_fields};

const API_TOKEN_LENGTH: usize = 32;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid colour pattern"));

/// Root entity owning versions and contacts.
///
/// Tokens and the sealed secret never leave the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct App {
    /// Identifier and timestamps.
    #[serde(flatten)]
    pub record: Record,
    /// Slug of the app on the parent platform.
    pub app_slug: String,
    /// Add-on plan.
    pub plan: String,
    /// Token clients use to call the app-scoped API.
    #[serde(skip)]
    pub api_token: String,
    /// Token for calling the parent platform on behalf of the app.
    #[serde(skip)]
    pub bitrise_api_token: String,
    /// Primary branding colour, `#RRGGBB` or empty.
    pub header_color_1: String,
    /// Secondary branding colour, `#RRGGBB` or empty.
    pub header_color_2: String,
    /// Sealed webhook secret.
    #[serde(skip)]
    pub encrypted_secret: Option<Vec<u8>>,
    /// Nonce the secret was sealed with.
    #[serde(skip)]
    pub encrypted_secret_iv: Option<Vec<u8>>,
    /// Per-app settings created alongside the app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<AppSettings>,
}

/// Settings record created in the same transaction as its app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppSettings {
    /// Identifier and timestamps.
    #[serde(flatten)]
    pub record: Record,
    /// Owning app.
    pub app_id: Uuid,
    /// Workflow that builds the iOS app.
    pub ios_workflow: String,
    /// Workflow that builds the Android app.
    pub android_workflow: String,
}

/// Values for a new app; identifier and timestamps come from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewApp {
    /// Slug of the app on the parent platform.
    pub app_slug: String,
    /// Add-on plan.
    pub plan: String,
    /// Token clients use to call the app-scoped API.
    pub api_token: String,
    /// Token for calling the parent platform.
    pub bitrise_api_token: String,
    /// Primary branding colour.
    pub header_color_1: String,
    /// Secondary branding colour.
    pub header_color_2: String,
    /// Sealed webhook secret.
    pub encrypted_secret: Option<Vec<u8>>,
    /// Nonce for the sealed secret; when set, no secret is generated.
    pub encrypted_secret_iv: Option<Vec<u8>>,
}

/// Sparse lookup over apps; unset members are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFilter {
    /// Match on identifier.
    pub id: Option<Uuid>,
    /// Match on slug.
    pub app_slug: Option<String>,
    /// Match on API token.
    pub api_token: Option<String>,
}

impl AppFilter {
    /// Filter by identifier.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Filter by slug.
    pub fn by_slug(app_slug: impl Into<String>) -> Self {
        Self {
            app_slug: Some(app_slug.into()),
            ..Self::default()
        }
    }

    /// Narrow to a specific API token.
    #[must_use]
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    /// True when no member is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.app_slug.is_none() && self.api_token.is_none()
    }
}

updatable_fields! {
    /// Attributes of [`App`] that may be changed after creation.
    pub enum AppField {
        /// Add-on plan.
        Plan => "plan",
        /// Parent platform token.
        BitriseApiToken => "bitrise_api_token",
        /// Primary branding colour.
        HeaderColor1 => "header_color_1",
        /// Secondary branding colour.
        HeaderColor2 => "header_color_2",
    }
}

fn validate_color(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !value.is_empty() && !HEX_COLOR.is_match(value) {
        errors.add(field, WRONG_FORMAT);
    }
}

impl UpdatableField for AppField {
    type Entity = App;

    fn assign(self, app: &mut App, value: Value) -> Result<(), ValidationError> {
        match self {
            Self::Plan => app.plan = json_string(self, value)?,
            Self::BitriseApiToken => app.bitrise_api_token = json_string(self, value)?,
            Self::HeaderColor1 => {
                app.header_color_1 = json_optional_string(self, value)?.unwrap_or_default();
            }
            Self::HeaderColor2 => {
                app.header_color_2 = json_optional_string(self, value)?.unwrap_or_default();
            }
        }
        Ok(())
    }

    fn validate(self, app: &App, errors: &mut ValidationErrors) {
        match self {
            Self::Plan => {
                require_present(errors, self.name(), &app.plan);
            }
            Self::BitriseApiToken => {}
            Self::HeaderColor1 => validate_color(errors, self.name(), &app.header_color_1),
            Self::HeaderColor2 => validate_color(errors, self.name(), &app.header_color_2),
        }
    }
}

impl Validate for NewApp {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "app_slug", &self.app_slug);
        require_present(&mut errors, "plan", &self.plan);
        require_present(&mut errors, "api_token", &self.api_token);
        validate_color(&mut errors, "header_color_1", &self.header_color_1);
        validate_color(&mut errors, "header_color_2", &self.header_color_2);
        errors
    }
}

impl NewApp {
    /// Draft for a freshly provisioned app with a new API token.
    pub fn provisioned(
        app_slug: impl Into<String>,
        plan: impl Into<String>,
        bitrise_api_token: impl Into<String>,
    ) -> Self {
        Self {
            app_slug: app_slug.into(),
            plan: plan.into(),
            api_token: generate_api_token(),
            bitrise_api_token: bitrise_api_token.into(),
            ..Self::default()
        }
    }
}

/// Random token the app's clients present as `Authorization: token <..>`.
pub fn generate_api_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
