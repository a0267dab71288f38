//! Add-on provisioning called by the parent platform.
//!
//! ```text
//! POST   /provision
//! PUT    /provision/{app_slug}
//! DELETE /provision/{app_slug}
//! ```
//!
//! Every route sits behind the add-on access token gate.

use actix_web::{HttpResponse, delete, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::RepositoryError;
use crate::domain::{App, AppField, AppFilter, Error, NewApp, Whitelist};

use super::envelope::Envelope;
use super::error::{ApiResult, applied, sql_error};
use super::state::HttpState;

const API_URL_ENV: &str = "ADDON_SHIP_API_URL";
const API_TOKEN_ENV: &str = "ADDON_SHIP_API_TOKEN";

/// Provisioning request sent when the add-on is enabled for an app.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProvisionRequest {
    pub plan: String,
    pub app_slug: String,
    /// Token for calling the platform on behalf of the app.
    pub api_token: String,
}

/// Plan change request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlanRequest {
    pub plan: String,
}

/// Environment variable exported to the app's builds.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Variables the platform injects into the app's builds.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProvisionResponse {
    pub envs: Vec<EnvVar>,
}

impl ProvisionResponse {
    fn for_app(host_url: &str, app: &App) -> Self {
        Self {
            envs: vec![
                EnvVar {
                    key: API_URL_ENV.into(),
                    value: host_url.into(),
                },
                EnvVar {
                    key: API_TOKEN_ENV.into(),
                    value: app.api_token.clone(),
                },
            ],
        }
    }
}

/// Provision the add-on for an app; repeat calls return the same app.
#[utoipa::path(
    post,
    path = "/provision",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Build environment for the app", body = ProvisionResponse),
        (status = 400, description = "Malformed body", body = Error),
        (status = 401, description = "Missing or wrong add-on token", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["provisioning"],
    operation_id = "provision"
)]
#[post("")]
pub async fn provision(
    state: web::Data<HttpState>,
    payload: web::Json<ProvisionRequest>,
) -> ApiResult<HttpResponse> {
    let ProvisionRequest {
        plan,
        app_slug,
        api_token,
    } = payload.into_inner();

    let app = match state.apps.find(&AppFilter::by_slug(app_slug.as_str())).await {
        Ok(app) => app,
        Err(RepositoryError::NotFound) => {
            let draft = NewApp::provisioned(app_slug, plan, api_token);
            let app = applied(state.apps.create(draft).await?)?;
            info!(app_id = %app.record.id, app_slug = %app.app_slug, "app provisioned");
            app
        }
        Err(err) => return Err(sql_error(err)),
    };

    Ok(HttpResponse::Ok().json(ProvisionResponse::for_app(&state.addon.host_url, &app)))
}

/// Change the plan of a provisioned app.
#[utoipa::path(
    put,
    path = "/provision/{app_slug}",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Updated app", body = Envelope<App>),
        (status = 401, description = "Missing or wrong add-on token", body = Error),
        (status = 404, description = "App not provisioned", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["provisioning"],
    operation_id = "changePlan"
)]
#[put("/{app_slug}")]
pub async fn change_plan(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PlanRequest>,
) -> ApiResult<HttpResponse> {
    let mut app = state.apps.find(&AppFilter::by_slug(path.into_inner())).await?;
    app.plan = payload.into_inner().plan;
    let app = applied(state.apps.update(&app, &Whitelist::of([AppField::Plan])).await?)?;
    Ok(Envelope::ok(app))
}

/// Remove a provisioned app together with everything it owns.
#[utoipa::path(
    delete,
    path = "/provision/{app_slug}",
    params(("app_slug" = String, Path, description = "Slug of the app")),
    responses(
        (status = 200, description = "Deleted app", body = Envelope<App>),
        (status = 401, description = "Missing or wrong add-on token", body = Error),
        (status = 404, description = "App not provisioned", body = Error)
    ),
    tags = ["provisioning"],
    operation_id = "deprovision"
)]
#[delete("/{app_slug}")]
pub async fn deprovision(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let app = state.apps.find(&AppFilter::by_slug(path.into_inner())).await?;
    state.apps.delete(app.record.id).await?;
    info!(app_id = %app.record.id, app_slug = %app.app_slug, "app deprovisioned");
    Ok(Envelope::ok(app))
}

/// Mount the provisioning routes under `/provision` without their gate.
pub fn provision_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(provision).service(change_plan).service(deprovision);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WriteOutcome;
    use crate::inbound::http::error::json_config;
    use crate::inbound::http::test_utils::{ADDON_HOST, MockPorts, sample_app};
    use actix_web::http::StatusCode;
    use actix_web::{App as ActixApp, test};
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    async fn call(ports: MockPorts, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(
            ActixApp::new()
                .app_data(ports.into_state())
                .app_data(json_config())
                .service(web::scope("/provision").configure(provision_routes)),
        )
        .await;
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("JSON body")
        };
        (status, value)
    }

    fn provision_body() -> Value {
        json!({"plan": "free", "app_slug": "test-app-slug", "api_token": "bitrise-token"})
    }

    #[rstest]
    #[actix_web::test]
    async fn provisioning_new_app_creates_it() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .withf(|filter| filter.app_slug.as_deref() == Some("test-app-slug"))
            .return_once(|_| Err(RepositoryError::not_found()));
        ports
            .apps
            .expect_create()
            .withf(|draft| {
                draft.plan == "free"
                    && draft.bitrise_api_token == "bitrise-token"
                    && draft.api_token.len() == 32
            })
            .return_once(|draft| {
                let mut app = sample_app(Uuid::new_v4());
                app.api_token = draft.api_token;
                Ok(WriteOutcome::Applied(app))
            });

        let req = test::TestRequest::post().uri("/provision").set_json(provision_body());
        let (status, body) = call(ports, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["envs"][0], json!({"key": API_URL_ENV, "value": ADDON_HOST}));
        assert_eq!(body["envs"][1]["key"], API_TOKEN_ENV);
        assert_eq!(body["envs"][1]["value"].as_str().map(str::len), Some(32));
    }

    #[rstest]
    #[actix_web::test]
    async fn provisioning_existing_app_returns_its_token() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Ok(sample_app(Uuid::new_v4())));
        ports.apps.expect_create().never();

        let req = test::TestRequest::post().uri("/provision").set_json(provision_body());
        let (status, body) = call(ports, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["envs"][1]["value"], "test-app-api-token");
    }

    #[rstest]
    #[actix_web::test]
    async fn provisioning_surfaces_lookup_failure_as_internal() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Err(RepositoryError::connection("refused")));

        let req = test::TestRequest::post().uri("/provision").set_json(provision_body());
        let (status, body) = call(ports, req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[rstest]
    #[actix_web::test]
    async fn change_plan_updates_only_the_plan() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Ok(sample_app(Uuid::new_v4())));
        ports
            .apps
            .expect_update()
            .withf(|app, whitelist| app.plan == "gold" && whitelist.names() == ["plan"])
            .return_once(|app, _| Ok(WriteOutcome::Applied(app.clone())));

        let req = test::TestRequest::put()
            .uri("/provision/test-app-slug")
            .set_json(json!({"plan": "gold"}));
        let (status, body) = call(ports, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["plan"], "gold");
        assert!(body["data"].get("api_token").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn deprovision_missing_app_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Err(RepositoryError::not_found()));
        ports.apps.expect_delete().never();

        let req = test::TestRequest::delete().uri("/provision/unknown");
        let (status, _) = call(ports, req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn deprovision_deletes_the_app() {
        let id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports.apps.expect_find().return_once(move |_| Ok(sample_app(id)));
        ports
            .apps
            .expect_delete()
            .withf(move |deleted| *deleted == id)
            .return_once(|_| Ok(()));

        let req = test::TestRequest::delete().uri("/provision/test-app-slug");
        let (status, body) = call(ports, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.to_string());
    }
}
