//! App resource for the authorised app.
//!
//! ```text
//! GET   /apps/{app_slug}
//! PATCH /apps/{app_slug}
//! ```

use actix_web::{HttpResponse, get, patch, web};
use serde_json::{Map, Value};

use crate::domain::{App, AppField, AppFilter, Error, apply_patch};

use super::envelope::Envelope;
use super::error::{ApiResult, applied};
use super::principal::AuthorizedAppId;
use super::state::HttpState;
use super::{app_contacts, app_versions, screenshots};

/// Load the authorised app; a missing row is a 404.
pub(crate) async fn authorized_app(state: &HttpState, principal: AuthorizedAppId) -> ApiResult<App> {
    Ok(state.apps.find(&AppFilter::by_id(principal.id())).await?)
}

/// Fetch the authorised app with its settings.
#[utoipa::path(
    get,
    path = "/apps/{app_slug}",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    responses(
        (status = 200, description = "The app", body = Envelope<App>),
        (status = 401, description = "Missing or wrong API token", body = Error),
        (status = 404, description = "App not found", body = Error)
    ),
    tags = ["apps"],
    operation_id = "getApp"
)]
#[get("")]
pub async fn get_app(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
) -> ApiResult<HttpResponse> {
    Ok(Envelope::ok(authorized_app(&state, principal).await?))
}

/// Patch branding, plan or platform token of the authorised app.
///
/// Keys outside the updatable set are rejected with 400 before anything is
/// written.
#[utoipa::path(
    patch,
    path = "/apps/{app_slug}",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    request_body(content = Object, description = "Attributes to change"),
    responses(
        (status = 200, description = "Updated app", body = Envelope<App>),
        (status = 400, description = "Malformed body or unknown attribute", body = Error),
        (status = 401, description = "Missing or wrong API token", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["apps"],
    operation_id = "patchApp"
)]
#[patch("")]
pub async fn patch_app(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let mut app = authorized_app(&state, principal).await?;
    let whitelist = applied(apply_patch::<AppField>(&mut app, &payload)?)?;
    let app = applied(state.apps.update(&app, &whitelist).await?)?;
    Ok(Envelope::ok(app))
}

/// Mount every app-scoped route, relative to `/apps/{app_slug}`.
///
/// The caller wraps the scope with the API token gate.
pub fn app_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_app)
        .service(patch_app)
        .service(app_versions::list_versions)
        .service(app_versions::get_version)
        .service(app_versions::update_version)
        .service(screenshots::list_screenshots)
        .service(screenshots::create_screenshots)
        .service(screenshots::update_screenshots)
        .service(screenshots::delete_screenshot)
        .service(app_contacts::list_contacts)
        .service(app_contacts::create_contact)
        .service(app_contacts::update_contact)
        .service(app_contacts::delete_contact);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::RepositoryError;
    use crate::domain::{ValidationErrors, WriteOutcome};
    use crate::inbound::http::test_utils::{MockPorts, body_json, sample_app, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    fn scoped(cfg: &mut web::ServiceConfig) {
        cfg.service(web::scope("/apps/{app_slug}").configure(app_routes));
    }

    fn ports_with_app(id: Uuid) -> MockPorts {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .withf(move |filter| filter.id == Some(id))
            .return_once(move |_| Ok(sample_app(id)));
        ports
    }

    #[rstest]
    #[actix_web::test]
    async fn get_returns_app_without_secrets() {
        let id = Uuid::new_v4();
        let app = test_app!(ports_with_app(id).into_state(), Some(AuthorizedAppId(id)), scoped);

        let req = test::TestRequest::get().uri("/apps/test-app-slug").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["data"]["id"], id.to_string());
        assert_eq!(body["data"]["app_slug"], "test-app-slug");
        assert!(body["data"].get("api_token").is_none());
        assert!(body["data"].get("bitrise_api_token").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn get_missing_app_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Err(RepositoryError::not_found()));
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(Uuid::new_v4())), scoped);

        let req = test::TestRequest::get().uri("/apps/test-app-slug").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn patch_writes_only_patched_fields() {
        let id = Uuid::new_v4();
        let mut ports = ports_with_app(id);
        ports
            .apps
            .expect_update()
            .withf(|app, whitelist| {
                app.header_color_1 == "#a1b2c3" && whitelist.names() == ["header_color_1"]
            })
            .return_once(|app, _| Ok(WriteOutcome::Applied(app.clone())));
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(id)), scoped);

        let req = test::TestRequest::patch()
            .uri("/apps/test-app-slug")
            .set_json(json!({"header_color_1": "#a1b2c3"}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["header_color_1"], "#a1b2c3");
    }

    #[rstest]
    #[actix_web::test]
    async fn patch_unknown_attribute_is_bad_request() {
        let id = Uuid::new_v4();
        let mut ports = ports_with_app(id);
        ports.apps.expect_update().never();
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(id)), scoped);

        let req = test::TestRequest::patch()
            .uri("/apps/test-app-slug")
            .set_json(json!({"api_token": "stolen"}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await["message"],
            "attribute `api_token` doesn't exist in the model"
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn patch_rejected_by_repository_is_unprocessable() {
        let id = Uuid::new_v4();
        let mut ports = ports_with_app(id);
        ports.apps.expect_update().return_once(|_, _| {
            let mut errors = ValidationErrors::new();
            errors.add("header_color_2", "Wrong format");
            Ok(WriteOutcome::Rejected(errors))
        });
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(id)), scoped);

        let req = test::TestRequest::patch()
            .uri("/apps/test-app-slug")
            .set_json(json!({"header_color_2": "red"}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(res).await["errors"], json!(["header_color_2: Wrong format"]));
    }

    #[rstest]
    #[actix_web::test]
    async fn patch_with_wrong_value_type_is_unprocessable() {
        let id = Uuid::new_v4();
        let mut ports = ports_with_app(id);
        ports.apps.expect_update().never();
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(id)), scoped);

        let req = test::TestRequest::patch()
            .uri("/apps/test-app-slug")
            .set_json(json!({"plan": 3}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(res).await["errors"], json!(["plan: Wrong type"]));
    }
}
