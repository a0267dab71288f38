//! Screenshots attached to a version.
//!
//! ```text
//! GET    /apps/{app_slug}/versions/{version_id}/screenshots
//! POST   /apps/{app_slug}/versions/{version_id}/screenshots
//! PATCH  /apps/{app_slug}/versions/{version_id}/screenshots
//! DELETE /apps/{app_slug}/versions/{version_id}/screenshots/{screenshot_id}
//! ```
//!
//! Batch writes are all-or-nothing; per-item validation errors carry the
//! item index, e.g. `"[1] filename: Can't be blank"`.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Error, NewScreenshot, Screenshot, ScreenshotField, ScreenshotFilter, ValidationErrors,
    Whitelist, WriteOutcome, apply_patch,
};

use super::app_versions::{VersionPath, owned_version};
use super::envelope::Envelope;
use super::error::{ApiResult, applied};
use super::principal::AuthorizedAppId;
use super::state::HttpState;

/// Metadata of a screenshot about to be uploaded.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewScreenshotRequest {
    pub filename: String,
    pub filesize: i64,
    pub device_type: String,
    pub screen_size: String,
}

impl NewScreenshotRequest {
    fn into_draft(self, app_version_id: Uuid) -> NewScreenshot {
        NewScreenshot {
            app_version_id,
            filename: self.filename,
            filesize: self.filesize,
            device_type: self.device_type,
            screen_size: self.screen_size,
            uploaded: false,
        }
    }
}

/// Path segments addressing one screenshot.
#[derive(Debug, Deserialize)]
pub struct ScreenshotPath {
    pub version_id: Uuid,
    pub screenshot_id: Uuid,
}

/// List screenshots of a version.
#[utoipa::path(
    get,
    path = "/apps/{app_slug}/versions/{version_id}/screenshots",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier")
    ),
    responses(
        (status = 200, description = "Screenshots", body = Envelope<Vec<Screenshot>>),
        (status = 404, description = "Version not found", body = Error)
    ),
    tags = ["screenshots"],
    operation_id = "listScreenshots"
)]
#[get("/versions/{version_id}/screenshots")]
pub async fn list_screenshots(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<VersionPath>,
) -> ApiResult<HttpResponse> {
    let version = owned_version(&state, principal, path.version_id).await?;
    let screenshots = state.screenshots.find_all(version.record.id).await?;
    Ok(Envelope::ok(screenshots))
}

/// Register a batch of screenshots.
#[utoipa::path(
    post,
    path = "/apps/{app_slug}/versions/{version_id}/screenshots",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier")
    ),
    request_body = Vec<NewScreenshotRequest>,
    responses(
        (status = 201, description = "Created screenshots", body = Envelope<Vec<Screenshot>>),
        (status = 404, description = "Version not found", body = Error),
        (status = 422, description = "An item failed validation", body = Error)
    ),
    tags = ["screenshots"],
    operation_id = "createScreenshots"
)]
#[post("/versions/{version_id}/screenshots")]
pub async fn create_screenshots(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<VersionPath>,
    payload: web::Json<Vec<NewScreenshotRequest>>,
) -> ApiResult<HttpResponse> {
    let version = owned_version(&state, principal, path.version_id).await?;
    let drafts = payload
        .into_inner()
        .into_iter()
        .map(|item| item.into_draft(version.record.id))
        .collect();
    let created = applied(state.screenshots.batch_create(drafts).await?)?;
    debug!(version_id = %version.record.id, count = created.len(), "screenshots created");
    Ok(Envelope::created(created))
}

/// Apply one patch to every screenshot of `screenshots`.
fn patch_each(
    screenshots: &mut [Screenshot],
    patch: &Map<String, Value>,
) -> Result<WriteOutcome<Whitelist<ScreenshotField>>, Error> {
    let whitelist = Whitelist::<ScreenshotField>::parse(patch.keys())?;
    let mut errors = ValidationErrors::new();
    for (index, screenshot) in screenshots.iter_mut().enumerate() {
        if let WriteOutcome::Rejected(rejected) = apply_patch::<ScreenshotField>(screenshot, patch)? {
            errors.extend(rejected.into_iter().map(|error| error.at_index(index)));
        }
    }
    Ok(WriteOutcome::from_errors(errors, || whitelist))
}

/// Patch every screenshot of a version, e.g. `{"uploaded": true}`.
#[utoipa::path(
    patch,
    path = "/apps/{app_slug}/versions/{version_id}/screenshots",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier")
    ),
    request_body(content = Object, description = "Attributes to change on every screenshot"),
    responses(
        (status = 200, description = "Updated screenshots", body = Envelope<Vec<Screenshot>>),
        (status = 400, description = "Unknown attribute", body = Error),
        (status = 404, description = "Version or screenshot not found", body = Error),
        (status = 422, description = "An item failed validation", body = Error)
    ),
    tags = ["screenshots"],
    operation_id = "updateScreenshots"
)]
#[patch("/versions/{version_id}/screenshots")]
pub async fn update_screenshots(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<VersionPath>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let version = owned_version(&state, principal, path.version_id).await?;
    let mut screenshots = state.screenshots.find_all(version.record.id).await?;
    let whitelist = applied(patch_each(&mut screenshots, &payload)?)?;
    let updated = applied(state.screenshots.batch_update(&screenshots, &whitelist).await?)?;
    Ok(Envelope::ok(updated))
}

/// Remove one screenshot.
#[utoipa::path(
    delete,
    path = "/apps/{app_slug}/versions/{version_id}/screenshots/{screenshot_id}",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier"),
        ("screenshot_id" = Uuid, Path, description = "Screenshot identifier")
    ),
    responses(
        (status = 200, description = "Deleted screenshot", body = Envelope<Screenshot>),
        (status = 404, description = "Version or screenshot not found", body = Error)
    ),
    tags = ["screenshots"],
    operation_id = "deleteScreenshot"
)]
#[delete("/versions/{version_id}/screenshots/{screenshot_id}")]
pub async fn delete_screenshot(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<ScreenshotPath>,
) -> ApiResult<HttpResponse> {
    let version = owned_version(&state, principal, path.version_id).await?;
    let screenshot = state
        .screenshots
        .find(&ScreenshotFilter::owned(path.screenshot_id, version.record.id))
        .await?;
    state.screenshots.delete(screenshot.record.id).await?;
    Ok(Envelope::ok(screenshot))
}
