//! Versions of the authorised app.
//!
//! ```text
//! GET /apps/{app_slug}/versions
//! GET /apps/{app_slug}/versions/{version_id}
//! PUT /apps/{app_slug}/versions/{version_id}
//! ```

use actix_web::{HttpResponse, get, put, web};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{AppVersion, AppVersionField, AppVersionFilter, Error, apply_patch};

use super::envelope::Envelope;
use super::error::{ApiResult, applied};
use super::principal::AuthorizedAppId;
use super::state::HttpState;

/// Path segment addressing one version.
#[derive(Debug, Deserialize)]
pub struct VersionPath {
    pub version_id: Uuid,
}

/// Load a version owned by the authorised app; anything else is a 404.
pub(crate) async fn owned_version(
    state: &HttpState,
    principal: AuthorizedAppId,
    version_id: Uuid,
) -> ApiResult<AppVersion> {
    Ok(state
        .app_versions
        .find(&AppVersionFilter::owned(version_id, principal.id()))
        .await?)
}

/// List the app's versions, newest first.
#[utoipa::path(
    get,
    path = "/apps/{app_slug}/versions",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    responses(
        (status = 200, description = "Versions", body = Envelope<Vec<AppVersion>>),
        (status = 401, description = "Missing or wrong API token", body = Error)
    ),
    tags = ["versions"],
    operation_id = "listVersions"
)]
#[get("/versions")]
pub async fn list_versions(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
) -> ApiResult<HttpResponse> {
    let versions = state.app_versions.find_all(principal.id()).await?;
    Ok(Envelope::ok(versions))
}

/// Fetch one version.
#[utoipa::path(
    get,
    path = "/apps/{app_slug}/versions/{version_id}",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier")
    ),
    responses(
        (status = 200, description = "The version", body = Envelope<AppVersion>),
        (status = 401, description = "Missing or wrong API token", body = Error),
        (status = 404, description = "Version not found", body = Error)
    ),
    tags = ["versions"],
    operation_id = "getVersion"
)]
#[get("/versions/{version_id}")]
pub async fn get_version(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<VersionPath>,
) -> ApiResult<HttpResponse> {
    let version = owned_version(&state, principal, path.version_id).await?;
    Ok(Envelope::ok(version))
}

/// Patch store listing or build details of a version.
#[utoipa::path(
    put,
    path = "/apps/{app_slug}/versions/{version_id}",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("version_id" = Uuid, Path, description = "Version identifier")
    ),
    request_body(content = Object, description = "Attributes to change"),
    responses(
        (status = 200, description = "Updated version", body = Envelope<AppVersion>),
        (status = 400, description = "Malformed body or unknown attribute", body = Error),
        (status = 404, description = "Version not found", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["versions"],
    operation_id = "updateVersion"
)]
#[put("/versions/{version_id}")]
pub async fn update_version(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<VersionPath>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let mut version = owned_version(&state, principal, path.version_id).await?;
    let whitelist = applied(apply_patch::<AppVersionField>(&mut version, &payload)?)?;
    let version = applied(state.app_versions.update(&version, &whitelist).await?)?;
    Ok(Envelope::ok(version))
}
