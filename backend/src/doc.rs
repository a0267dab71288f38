//! OpenAPI documentation for the add-on API.
//!
//! Registers every handler under `inbound::http` plus the credential schemes
//! the authorisation gates accept. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    App, AppContact, AppSettings, AppStoreInfo, AppVersion, Error, ErrorCode,
    NotificationPreferences, Platform, Screenshot,
};
use crate::inbound::http::app_contacts::{ConfirmedContact, NewContactRequest};
use crate::inbound::http::envelope::Message;
use crate::inbound::http::provision::{EnvVar, PlanRequest, ProvisionRequest, ProvisionResponse};
use crate::inbound::http::screenshots::NewScreenshotRequest;

/// Adds the credential schemes used by the gates.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "AddonToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authentication",
                "Add-on access token shared with the platform.",
            ))),
        );
        components.add_security_scheme(
            "AppToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`token <api token>` issued during provisioning.",
            ))),
        );
        components.add_security_scheme(
            "ConfirmationToken",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::with_description(
                "token",
                "Token mailed to a new contact.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Ship add-on backend API",
        description = "Apps, versions, screenshots and notification contacts of the Ship add-on."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("AppToken" = [])),
    paths(
        crate::inbound::http::root::root,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::provision::provision,
        crate::inbound::http::provision::change_plan,
        crate::inbound::http::provision::deprovision,
        crate::inbound::http::login::login,
        crate::inbound::http::apps::get_app,
        crate::inbound::http::apps::patch_app,
        crate::inbound::http::app_versions::list_versions,
        crate::inbound::http::app_versions::get_version,
        crate::inbound::http::app_versions::update_version,
        crate::inbound::http::screenshots::list_screenshots,
        crate::inbound::http::screenshots::create_screenshots,
        crate::inbound::http::screenshots::update_screenshots,
        crate::inbound::http::screenshots::delete_screenshot,
        crate::inbound::http::app_contacts::list_contacts,
        crate::inbound::http::app_contacts::create_contact,
        crate::inbound::http::app_contacts::update_contact,
        crate::inbound::http::app_contacts::delete_contact,
        crate::inbound::http::app_contacts::confirm_email,
    ),
    components(schemas(
        App,
        AppSettings,
        AppVersion,
        AppStoreInfo,
        Platform,
        AppContact,
        NotificationPreferences,
        Screenshot,
        Error,
        ErrorCode,
        Message,
        ProvisionRequest,
        ProvisionResponse,
        PlanRequest,
        EnvVar,
        NewScreenshotRequest,
        NewContactRequest,
        ConfirmedContact,
    )),
    tags(
        (name = "root", description = "Service banner"),
        (name = "health", description = "Endpoints for health checks"),
        (name = "provisioning", description = "Add-on lifecycle driven by the platform"),
        (name = "auth", description = "Single sign-on"),
        (name = "apps", description = "The authorised app"),
        (name = "versions", description = "App versions and store listings"),
        (name = "screenshots", description = "Screenshots of a version"),
        (name = "contacts", description = "Notification contacts")
    )
)]
pub struct ApiDoc;
