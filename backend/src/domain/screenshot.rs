//! Store screenshots attached to a version.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::record::Record;
use super::validation::{
    MUST_NOT_BE_NEGATIVE, Validate, ValidationError, ValidationErrors, require_present,
};
use super::whitelist::{FieldName, UpdatableField, json_bool, json_i64, json_string, updatable_fields};

/// A screenshot uploaded for one device type and screen size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Screenshot {
    /// Identifier and timestamps.
    #[serde(flatten)]
    pub record: Record,
    /// Owning version.
    pub app_version_id: Uuid,
    /// Original file name.
    pub filename: String,
    /// Size in bytes.
    pub filesize: i64,
    /// Device family, e.g. `iPhone`.
    pub device_type: String,
    /// Screen size label, e.g. `6.5 inch`.
    pub screen_size: String,
    /// Whether the upload finished.
    pub uploaded: bool,
}

/// Values for a new screenshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewScreenshot {
    /// Owning version.
    pub app_version_id: Uuid,
    /// File name.
    pub filename: String,
    /// Size in bytes.
    pub filesize: i64,
    /// Device family.
    pub device_type: String,
    /// Screen size label.
    pub screen_size: String,
    /// Upload finished.
    pub uploaded: bool,
}

/// Sparse lookup over screenshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotFilter {
    /// Match on identifier.
    pub id: Option<Uuid>,
    /// Match on owning version.
    pub app_version_id: Option<Uuid>,
}

impl ScreenshotFilter {
    /// Screenshot `id` belonging to version `app_version_id`.
    pub fn owned(id: Uuid, app_version_id: Uuid) -> Self {
        Self {
            id: Some(id),
            app_version_id: Some(app_version_id),
        }
    }

    /// True when no member is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.app_version_id.is_none()
    }
}

updatable_fields! {
    /// Attributes of [`Screenshot`] that may be changed after creation.
    pub enum ScreenshotField {
        /// File name.
        Filename => "filename",
        /// Size in bytes.
        Filesize => "filesize",
        /// Device family.
        DeviceType => "device_type",
        /// Screen size label.
        ScreenSize => "screen_size",
        /// Upload finished.
        Uploaded => "uploaded",
    }
}

fn validate_filesize(errors: &mut ValidationErrors, filesize: i64) {
    if filesize < 0 {
        errors.add(ScreenshotField::Filesize.name(), MUST_NOT_BE_NEGATIVE);
    }
}

impl UpdatableField for ScreenshotField {
    type Entity = Screenshot;

    fn assign(self, screenshot: &mut Screenshot, value: Value) -> Result<(), ValidationError> {
        match self {
            Self::Filename => screenshot.filename = json_string(self, value)?,
            Self::Filesize => screenshot.filesize = json_i64(self, value)?,
            Self::DeviceType => screenshot.device_type = json_string(self, value)?,
            Self::ScreenSize => screenshot.screen_size = json_string(self, value)?,
            Self::Uploaded => screenshot.uploaded = json_bool(self, value)?,
        }
        Ok(())
    }

    fn validate(self, screenshot: &Screenshot, errors: &mut ValidationErrors) {
        match self {
            Self::Filename => {
                require_present(errors, self.name(), &screenshot.filename);
            }
            Self::Filesize => validate_filesize(errors, screenshot.filesize),
            Self::DeviceType => {
                require_present(errors, self.name(), &screenshot.device_type);
            }
            Self::ScreenSize => {
                require_present(errors, self.name(), &screenshot.screen_size);
            }
            Self::Uploaded => {}
        }
    }
}

impl Validate for NewScreenshot {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "filename", &self.filename);
        validate_filesize(&mut errors, self.filesize);
        require_present(&mut errors, "device_type", &self.device_type);
        require_present(&mut errors, "screen_size", &self.screen_size);
        errors
    }
}

/// Validate every item of a batch, prefixing errors with the item index.
pub fn validate_batch<T>(items: &[T], mut validate: impl FnMut(&T) -> ValidationErrors) -> ValidationErrors {
    items
        .iter()
        .enumerate()
        .flat_map(|(index, item)| validate(item).into_iter().map(move |err| err.at_index(index)))
        .collect()
}
