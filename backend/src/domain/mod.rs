//! Domain entities, validation rules and ports.
//!
//! Nothing here knows about Diesel or Actix. Entities carry their own
//! validation and declare which attributes may be updated; ports describe
//! what the persistence adapters must provide.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic error payload.
//! - [`Record`]: identifier and timestamps shared by every entity.
//! - [`App`], [`AppVersion`], [`AppContact`], [`Screenshot`] and their
//!   drafts, filters and updatable-field enums.
//! - [`Whitelist`] / [`apply_patch`]: whitelisted partial updates.
//! - [`WriteOutcome`] / [`ValidationErrors`]: write result classification.

pub mod app;
pub mod app_contact;
pub mod app_secret;
pub mod app_version;
pub mod error;
pub mod outcome;
pub mod ports;
pub mod record;
pub mod screenshot;
mod trace_id;
pub mod validation;
pub mod whitelist;

pub use self::app::{App, AppField, AppFilter, AppSettings, NewApp, generate_api_token};
pub use self::app_contact::{
    AppContact, AppContactField, AppContactFilter, NewAppContact, NotificationPreferences,
    generate_confirmation_token,
};
pub use self::app_secret::{SealedSecret, SecretError, SecretKey, ensure_secret};
pub use self::app_version::{
    AppStoreInfo, AppVersion, AppVersionField, AppVersionFilter, NewAppVersion, Platform,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::outcome::WriteOutcome;
pub use self::record::Record;
pub use self::screenshot::{NewScreenshot, Screenshot, ScreenshotField, ScreenshotFilter};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::validation::{Validate, ValidationError, ValidationErrors};
pub use self::whitelist::{UnknownAttribute, Whitelist, apply_patch};

/// Result alias for inbound adapters.
///
/// # Examples
/// ```
/// use ship_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::unauthorized("missing token"))
/// }
/// # assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
