//! Single sign-on landing endpoint.
//!
//! The platform posts a signed form here; the gate in front of this route
//! verifies it and injects the app. The handler only redirects the browser to
//! the frontend with the app's API token.
//!
//! Mounted as `web::scope("/login")` so the gate can wrap it.

use actix_web::http::header;
use actix_web::{HttpResponse, post, web};
use tracing::debug;

use crate::domain::{AppFilter, Error};

use super::error::{ApiResult, sql_error};
use super::principal::AuthorizedAppId;
use super::state::HttpState;

/// Redirect an authorised app to the frontend.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content_type = "application/x-www-form-urlencoded", description = "app_slug, timestamp and token"),
    responses(
        (status = 301, description = "Redirect to the frontend", headers(("Location" = String))),
        (status = 401, description = "Invalid single sign-on request", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login"
)]
#[post("")]
pub async fn login(
    state: web::Data<HttpState>,
    principal: AuthorizedAppId,
) -> ApiResult<HttpResponse> {
    let app = state
        .apps
        .find(&AppFilter::by_id(principal.id()))
        .await
        .map_err(sql_error)?;
    debug!(app_slug = %app.app_slug, "redirecting single sign-on login");
    let location = format!(
        "{}/apps/{}?token={}",
        state.addon.frontend_host_url, app.app_slug, app.api_token
    );
    Ok(HttpResponse::MovedPermanently()
        .insert_header((header::LOCATION, location))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::RepositoryError;
    use crate::inbound::http::test_utils::{FRONTEND_HOST, MockPorts, sample_app, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use uuid::Uuid;

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(web::scope("/login").service(login));
    }

    #[rstest]
    #[actix_web::test]
    async fn redirects_to_frontend_with_api_token() {
        let id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .withf(move |filter| filter.id == Some(id))
            .return_once(move |_| Ok(sample_app(id)));
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(id)), routes);

        let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request())
            .await;

        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        let location = res
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("location header");
        assert_eq!(
            location,
            format!("{FRONTEND_HOST}/apps/test-app-slug?token=test-app-api-token")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_app_is_internal_error() {
        let mut ports = MockPorts::default();
        ports
            .apps
            .expect_find()
            .return_once(|_| Err(RepositoryError::not_found()));
        let app = test_app!(ports.into_state(), Some(AuthorizedAppId(Uuid::new_v4())), routes);

        let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request())
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_principal_is_internal_error() {
        let mut ports = MockPorts::default();
        ports.apps.expect_find().never();
        let app = test_app!(ports.into_state(), None::<AuthorizedAppId>, routes);

        let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request())
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
