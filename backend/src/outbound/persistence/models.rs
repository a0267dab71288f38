//! Diesel row structs. Internal to the persistence adapters.
//!
//! Changeset structs hold `Option` per column; `None` leaves the column out of
//! the `SET` list. Nullable columns use `Option<Option<_>>` so a whitelisted
//! attribute can be cleared to `NULL`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{app_contacts, app_settings, app_versions, apps, screenshots};

// ---------------------------------------------------------------------------
// apps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = apps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppRow {
    pub id: Uuid,
    pub app_slug: String,
    pub plan: String,
    pub api_token: String,
    pub bitrise_api_token: String,
    pub header_color_1: String,
    pub header_color_2: String,
    pub encrypted_secret: Option<Vec<u8>>,
    pub encrypted_secret_iv: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = apps)]
pub(crate) struct NewAppRow<'a> {
    pub id: Uuid,
    pub app_slug: &'a str,
    pub plan: &'a str,
    pub api_token: &'a str,
    pub bitrise_api_token: &'a str,
    pub header_color_1: &'a str,
    pub header_color_2: &'a str,
    pub encrypted_secret: Option<&'a [u8]>,
    pub encrypted_secret_iv: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = apps)]
pub(crate) struct AppChangeset<'a> {
    pub plan: Option<&'a str>,
    pub bitrise_api_token: Option<&'a str>,
    pub header_color_1: Option<&'a str>,
    pub header_color_2: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppSettingsRow {
    pub id: Uuid,
    pub app_id: Uuid,
    pub ios_workflow: String,
    pub android_workflow: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_settings)]
pub(crate) struct NewAppSettingsRow {
    pub id: Uuid,
    pub app_id: Uuid,
}

// ---------------------------------------------------------------------------
// app_versions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppVersionRow {
    pub id: Uuid,
    pub app_id: Uuid,
    pub platform: String,
    pub build_number: String,
    pub build_slug: String,
    pub version: String,
    pub last_update: Option<DateTime<Utc>>,
    pub app_store_info: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_versions)]
pub(crate) struct NewAppVersionRow<'a> {
    pub id: Uuid,
    pub app_id: Uuid,
    pub platform: &'a str,
    pub build_number: &'a str,
    pub build_slug: &'a str,
    pub version: &'a str,
    pub last_update: Option<DateTime<Utc>>,
    pub app_store_info: &'a Value,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = app_versions)]
pub(crate) struct AppVersionChangeset<'a> {
    pub build_number: Option<&'a str>,
    pub build_slug: Option<&'a str>,
    pub version: Option<&'a str>,
    pub last_update: Option<Option<DateTime<Utc>>>,
    pub app_store_info: Option<Value>,
}

// ---------------------------------------------------------------------------
// app_contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppContactRow {
    pub id: Uuid,
    pub app_id: Uuid,
    pub email: String,
    pub confirmation_token: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub notification_preferences: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_contacts)]
pub(crate) struct NewAppContactRow<'a> {
    pub id: Uuid,
    pub app_id: Uuid,
    pub email: &'a str,
    pub confirmation_token: Option<&'a str>,
    pub notification_preferences: Option<&'a Value>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = app_contacts)]
pub(crate) struct AppContactChangeset<'a> {
    pub email: Option<&'a str>,
    pub confirmation_token: Option<Option<&'a str>>,
    pub confirmed_at: Option<Option<DateTime<Utc>>>,
    pub notification_preferences: Option<Option<&'a Value>>,
}

// ---------------------------------------------------------------------------
// screenshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = screenshots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ScreenshotRow {
    pub id: Uuid,
    pub app_version_id: Uuid,
    pub filename: String,
    pub filesize: i64,
    pub device_type: String,
    pub screen_size: String,
    pub uploaded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = screenshots)]
pub(crate) struct NewScreenshotRow<'a> {
    pub id: Uuid,
    pub app_version_id: Uuid,
    pub filename: &'a str,
    pub filesize: i64,
    pub device_type: &'a str,
    pub screen_size: &'a str,
    pub uploaded: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = screenshots)]
pub(crate) struct ScreenshotChangeset<'a> {
    pub filename: Option<&'a str>,
    pub filesize: Option<i64>,
    pub device_type: Option<&'a str>,
    pub screen_size: Option<&'a str>,
    pub uploaded: Option<bool>,
}
