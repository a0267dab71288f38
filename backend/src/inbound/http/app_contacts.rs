//! Notification contacts of the authorised app and email confirmation.
//!
//! ```text
//! GET    /apps/{app_slug}/contacts
//! POST   /apps/{app_slug}/contacts
//! PUT    /apps/{app_slug}/contacts/{contact_id}
//! DELETE /apps/{app_slug}/contacts/{contact_id}
//! PATCH  /confirm_email?token=...
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    App, AppContact, AppContactFilter, AppFilter, Error, NewAppContact, NotificationPreferences,
};

use super::envelope::Envelope;
use super::error::{ApiResult, applied, sql_error};
use super::principal::{AuthorizedAppContactId, AuthorizedAppId};
use super::state::HttpState;

/// New contact for the app.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewContactRequest {
    pub email: String,
    /// Initial flags; all off when omitted.
    #[serde(default)]
    pub notification_preferences: Option<NotificationPreferences>,
}

/// Path segment addressing one contact.
#[derive(Debug, Deserialize)]
pub struct ContactPath {
    pub contact_id: Uuid,
}

/// Confirmed contact together with the app it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmedContact {
    pub app_contact: AppContact,
    pub app: App,
}

async fn owned_contact(
    state: &HttpState,
    principal: AuthorizedAppId,
    contact_id: Uuid,
) -> ApiResult<AppContact> {
    Ok(state
        .app_contacts
        .find(&AppContactFilter::owned(contact_id, principal.id()))
        .await?)
}

/// List contacts, newest first.
#[utoipa::path(
    get,
    path = "/apps/{app_slug}/contacts",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    responses(
        (status = 200, description = "Contacts", body = Envelope<Vec<AppContact>>),
        (status = 401, description = "Missing or wrong API token", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "listContacts"
)]
#[get("/contacts")]
pub async fn list_contacts(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
) -> ApiResult<HttpResponse> {
    let contacts = state.app_contacts.find_all(principal.id()).await?;
    Ok(Envelope::ok(contacts))
}

/// Add a contact; it stays unconfirmed until the emailed token is used.
#[utoipa::path(
    post,
    path = "/apps/{app_slug}/contacts",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    request_body = NewContactRequest,
    responses(
        (status = 201, description = "Created contact", body = Envelope<AppContact>),
        (status = 400, description = "Malformed body", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "createContact"
)]
#[post("/contacts")]
pub async fn create_contact(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    payload: web::Json<NewContactRequest>,
) -> ApiResult<HttpResponse> {
    let NewContactRequest {
        email,
        notification_preferences,
    } = payload.into_inner();
    let draft = NewAppContact {
        app_id: principal.id(),
        email,
        confirmation_token: None,
        notification_preferences: Some(notification_preferences.unwrap_or_default().to_blob()),
    };
    let contact = applied(state.app_contacts.create(draft).await?)?;
    info!(app_id = %principal.id(), contact_id = %contact.record.id, "contact added");
    Ok(Envelope::created(contact))
}

/// Replace a contact's notification flags; missing flags are off.
#[utoipa::path(
    put,
    path = "/apps/{app_slug}/contacts/{contact_id}",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("contact_id" = Uuid, Path, description = "Contact identifier")
    ),
    request_body = NotificationPreferences,
    responses(
        (status = 200, description = "Updated contact", body = Envelope<AppContact>),
        (status = 400, description = "Malformed body", body = Error),
        (status = 404, description = "Contact not found", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "updateContact"
)]
#[put("/contacts/{contact_id}")]
pub async fn update_contact(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<ContactPath>,
    payload: web::Json<NotificationPreferences>,
) -> ApiResult<HttpResponse> {
    let mut contact = owned_contact(&state, principal, path.contact_id).await?;
    let whitelist = contact.set_notification_preferences(payload.into_inner());
    let contact = applied(state.app_contacts.update(&contact, &whitelist).await?)?;
    Ok(Envelope::ok(contact))
}

/// Remove a contact.
#[utoipa::path(
    delete,
    path = "/apps/{app_slug}/contacts/{contact_id}",
    params(
        ("app_slug" = String, Path, description = "Slug of the app"),
        ("contact_id" = Uuid, Path, description = "Contact identifier")
    ),
    responses(
        (status = 200, description = "Deleted contact", body = Envelope<AppContact>),
        (status = 404, description = "Contact not found", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "deleteContact"
)]
#[delete("/contacts/{contact_id}")]
pub async fn delete_contact(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    path: web::Path<ContactPath>,
) -> ApiResult<HttpResponse> {
    let contact = owned_contact(&state, principal, path.contact_id).await?;
    state.app_contacts.delete(contact.record.id).await?;
    Ok(Envelope::ok(contact))
}

/// Confirm the contact holding the presented token.
#[utoipa::path(
    patch,
    path = "/confirm_email",
    params(("token" = String, Query, description = "Confirmation token")),
    responses(
        (status = 200, description = "Confirmed contact and its app", body = Envelope<ConfirmedContact>),
        (status = 401, description = "Unknown confirmation token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["contacts"],
    operation_id = "confirmEmail"
)]
#[patch("")]
pub async fn confirm_email(
    state: web::Data<HttpState>,
    principal: AuthorizedAppContactId,
) -> ApiResult<HttpResponse> {
    let mut contact = state
        .app_contacts
        .find(&AppContactFilter::by_id(principal.id()))
        .await
        .map_err(sql_error)?;
    let whitelist = contact.confirm(state.clock.utc());
    let contact = applied(
        state
            .app_contacts
            .update(&contact, &whitelist)
            .await
            .map_err(sql_error)?,
    )?;
    let app = state
        .apps
        .find(&AppFilter::by_id(contact.app_id))
        .await
        .map_err(sql_error)?;
    info!(contact_id = %contact.record.id, "contact confirmed");
    Ok(Envelope::ok(ConfirmedContact {
        app_contact: contact,
        app,
    }))
}
