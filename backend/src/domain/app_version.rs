//! Builds of an app awaiting or past store publication.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::record::Record;
use super::validation::{
    Validate, ValidationError, ValidationErrors, require_max_chars, require_present,
};
use super::whitelist::{
    FieldName, UpdatableField, json_optional_timestamp, json_string, json_typed, updatable_fields,
};

/// Target store platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Apple App Store.
    Ios,
    /// Google Play.
    Android,
}

impl Platform {
    /// Stored and serialised form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform name that is neither `ios` nor `android`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform `{0}`")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(UnknownPlatform(other.to_owned())),
        }
    }
}

/// Store listing text for a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AppStoreInfo {
    /// Subtitle shown under the app name.
    pub short_description: String,
    /// Main listing text.
    pub full_description: String,
    /// Release notes.
    pub whats_new: String,
    /// Promotional banner text.
    pub promotional_text: String,
    /// Comma separated search keywords.
    pub keywords: String,
    /// Notes for store reviewers.
    pub review_notes: String,
    /// Support page.
    pub support_url: String,
    /// Marketing page.
    pub marketing_url: String,
}

impl AppStoreInfo {
    fn limited_fields(&self) -> [(&'static str, &str, usize); 5] {
        [
            ("short_description", &self.short_description, 80),
            ("full_description", &self.full_description, 4000),
            ("whats_new", &self.whats_new, 4000),
            ("promotional_text", &self.promotional_text, 170),
            ("keywords", &self.keywords, 100),
        ]
    }

    /// Check length limits, reporting `app_store_info.<key>: Too long`.
    pub fn validate_into(&self, errors: &mut ValidationErrors) {
        for (key, value, max) in self.limited_fields() {
            require_max_chars(errors, &format!("app_store_info.{key}"), value, max);
        }
    }
}

/// A single build of an app for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AppVersion {
    /// Identifier and timestamps.
    #[serde(flatten)]
    pub record: Record,
    /// Owning app.
    pub app_id: Uuid,
    /// Target platform.
    pub platform: Platform,
    /// Build number assigned by CI.
    pub build_number: String,
    /// Slug of the CI build that produced the artefact.
    pub build_slug: String,
    /// Marketing version string.
    pub version: String,
    /// When the build last changed on the CI side.
    pub last_update: Option<DateTime<Utc>>,
    /// Store listing text.
    pub app_store_info: AppStoreInfo,
}

/// Values for a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppVersion {
    /// Owning app.
    pub app_id: Uuid,
    /// Target platform.
    pub platform: Platform,
    /// Build number.
    pub build_number: String,
    /// CI build slug.
    pub build_slug: String,
    /// Version string.
    pub version: String,
    /// Last CI update.
    pub last_update: Option<DateTime<Utc>>,
    /// Store listing text.
    pub app_store_info: AppStoreInfo,
}

/// Sparse lookup over versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppVersionFilter {
    /// Match on identifier.
    pub id: Option<Uuid>,
    /// Match on owning app.
    pub app_id: Option<Uuid>,
    /// Match on platform.
    pub platform: Option<Platform>,
}

impl AppVersionFilter {
    /// Version `id` belonging to `app_id`.
    pub fn owned(id: Uuid, app_id: Uuid) -> Self {
        Self {
            id: Some(id),
            app_id: Some(app_id),
            platform: None,
        }
    }

    /// True when no member is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.app_id.is_none() && self.platform.is_none()
    }
}

updatable_fields! {
    /// Attributes of [`AppVersion`] that may be changed after creation.
    pub enum AppVersionField {
        /// Build number.
        BuildNumber => "build_number",
        /// CI build slug.
        BuildSlug => "build_slug",
        /// Version string.
        Version => "version",
        /// Last CI update.
        LastUpdate => "last_update",
        /// Store listing text.
        StoreInfo => "app_store_info",
    }
}

impl UpdatableField for AppVersionField {
    type Entity = AppVersion;

    fn assign(self, version: &mut AppVersion, value: Value) -> Result<(), ValidationError> {
        match self {
            Self::BuildNumber => version.build_number = json_string(self, value)?,
            Self::BuildSlug => version.build_slug = json_string(self, value)?,
            Self::Version => version.version = json_string(self, value)?,
            Self::LastUpdate => version.last_update = json_optional_timestamp(self, value)?,
            Self::StoreInfo => version.app_store_info = json_typed(self, value)?,
        }
        Ok(())
    }

    fn validate(self, version: &AppVersion, errors: &mut ValidationErrors) {
        match self {
            Self::BuildNumber => {
                require_present(errors, self.name(), &version.build_number);
            }
            Self::Version => {
                require_present(errors, self.name(), &version.version);
            }
            Self::StoreInfo => version.app_store_info.validate_into(errors),
            Self::BuildSlug | Self::LastUpdate => {}
        }
    }
}

impl Validate for NewAppVersion {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "build_number", &self.build_number);
        require_present(&mut errors, "version", &self.version);
        self.app_store_info.validate_into(&mut errors);
        errors
    }
}
