//! Authorisation gates.
//!
//! Each [`Authorize`] layer checks one kind of credential, resolves the
//! principal through the repository ports held in [`HttpState`] and stores it
//! in the request extensions for the handler extractors. Rejections never
//! reach the wrapped service.
//!
//! | Gate              | Credential                                         | Principal                |
//! |-------------------|----------------------------------------------------|--------------------------|
//! | `AddonToken`      | `Authentication: <addon access token>`             | none                     |
//! | `SingleSignOn`    | form `app_slug`, `timestamp`, `token`              | `AuthorizedAppId`        |
//! | `AppToken`        | `Authorization: token <api token>` + `{app_slug}`  | `AuthorizedAppId`        |
//! | `ContactToken`    | `?token=<confirmation token>`                      | `AuthorizedAppContactId` |

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderMap;
use actix_web::{HttpMessage, web};
use futures_util::future::{Ready, ready};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::RepositoryError;
use crate::domain::{AppContactFilter, AppFilter, Error};
use crate::inbound::http::error::sql_error;
use crate::inbound::http::principal::{AuthorizedAppContactId, AuthorizedAppId};
use crate::inbound::http::state::{AddonSettings, HttpState};

/// Header carrying the add-on access token on provisioning calls.
pub const ADDON_TOKEN_HEADER: &str = "Authentication";
/// Maximum distance between a sign-on timestamp and now, in seconds.
pub const SSO_WINDOW_SECS: i64 = 300;

const APP_TOKEN_SCHEME: &str = "token ";

/// Credential checked by an [`Authorize`] layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Parent platform calling the provisioning API.
    AddonToken,
    /// Signed single sign-on form posted by the platform.
    SingleSignOn,
    /// App client presenting its API token.
    AppToken,
    /// Contact following the link in a confirmation email.
    ContactToken,
}

/// Middleware rejecting requests without a valid credential for its gate.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use ship_backend::middleware::Authorize;
///
/// let _app = App::new().service(web::scope("/provision").wrap(Authorize::addon_token()));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Authorize {
    gate: Gate,
}

impl Authorize {
    /// Guard a scope with `gate`.
    #[must_use]
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }

    /// Require the add-on access token in the `Authentication` header.
    #[must_use]
    pub fn addon_token() -> Self {
        Self::new(Gate::AddonToken)
    }

    /// Require a signed sign-on form within the timestamp window.
    #[must_use]
    pub fn single_sign_on() -> Self {
        Self::new(Gate::SingleSignOn)
    }

    /// Require `Authorization: token <api token>` matching the path's app.
    #[must_use]
    pub fn app_token() -> Self {
        Self::new(Gate::AppToken)
    }

    /// Require a pending confirmation token in the `token` query.
    #[must_use]
    pub fn contact_token() -> Self {
        Self::new(Gate::ContactToken)
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuthorizeMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizeMiddleware {
            service: Rc::new(service),
            gate: self.gate,
        }))
    }
}

/// Service produced by [`Authorize`].
pub struct AuthorizeMiddleware<S> {
    service: Rc<S>,
    gate: Gate,
}

impl<S, B> Service<ServiceRequest> for AuthorizeMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate;
        Box::pin(async move {
            let outcome = match req.app_data::<web::Data<HttpState>>().cloned() {
                Some(state) => authorize(gate, &state, &mut req).await,
                None => Err(Error::internal("HTTP state is not configured")),
            };
            if let Err(error) = outcome {
                warn!(?gate, path = %req.path(), reason = %error.message(), "request rejected");
                return Ok(req.error_response(error).map_into_right_body());
            }
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

async fn authorize(gate: Gate, state: &HttpState, req: &mut ServiceRequest) -> Result<(), Error> {
    match gate {
        Gate::AddonToken => check_addon_token(&state.addon, req.headers()),
        Gate::SingleSignOn => {
            let form = req
                .extract::<web::Form<SingleSignOnForm>>()
                .await
                .map_err(|_| Error::unauthorized("Invalid single sign-on request"))?
                .into_inner();
            let id = resolve_single_sign_on(state, &form).await?;
            req.extensions_mut().insert(AuthorizedAppId(id));
            Ok(())
        }
        Gate::AppToken => {
            let token = app_token(req.headers())?.to_owned();
            let slug = req
                .match_info()
                .get("app_slug")
                .ok_or_else(|| Error::internal("app_slug missing from route"))?
                .to_owned();
            let id = resolve_app_token(state, slug, token).await?;
            req.extensions_mut().insert(AuthorizedAppId(id));
            Ok(())
        }
        Gate::ContactToken => {
            let query = web::Query::<TokenQuery>::from_query(req.query_string())
                .map_err(|_| Error::unauthorized("Missing confirmation token"))?;
            let id = resolve_contact_token(state, &query.token).await?;
            req.extensions_mut().insert(AuthorizedAppContactId(id));
            Ok(())
        }
    }
}

/// Form posted by the platform to sign an app's user in.
#[derive(Debug, Deserialize)]
pub struct SingleSignOnForm {
    pub app_slug: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// `hex(sha256("<app_slug>:<sso_secret>:<timestamp>"))`.
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: String,
}

fn unauthorized() -> Error {
    Error::unauthorized("Unauthorized")
}

/// Lookups keyed by a credential: an unknown credential is a 401.
fn credential_lookup(err: RepositoryError) -> Error {
    if err.is_not_found() {
        unauthorized()
    } else {
        sql_error(err)
    }
}

fn check_addon_token(addon: &AddonSettings, headers: &HeaderMap) -> Result<(), Error> {
    let presented = headers
        .get(ADDON_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(unauthorized)?;
    if addon.access_token.is_empty() || presented != addon.access_token {
        return Err(unauthorized());
    }
    Ok(())
}

fn app_token(headers: &HeaderMap) -> Result<&str, Error> {
    headers
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(APP_TOKEN_SCHEME))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(unauthorized)
}

/// Digest the platform signs a sign-on request with.
///
/// # Examples
/// ```
/// use ship_backend::middleware::auth::sso_token;
///
/// assert_eq!(sso_token("slug", "secret", 1).len(), 64);
/// ```
pub fn sso_token(app_slug: &str, sso_secret: &str, timestamp: i64) -> String {
    hex::encode(Sha256::digest(format!("{app_slug}:{sso_secret}:{timestamp}")))
}

async fn resolve_single_sign_on(state: &HttpState, form: &SingleSignOnForm) -> Result<Uuid, Error> {
    let now = state.clock.utc().timestamp();
    if now.abs_diff(form.timestamp) > SSO_WINDOW_SECS.unsigned_abs() {
        return Err(Error::unauthorized("Timestamp expired"));
    }
    let expected = sso_token(&form.app_slug, &state.addon.sso_secret, form.timestamp);
    if state.addon.sso_secret.is_empty() || !expected.eq_ignore_ascii_case(&form.token) {
        return Err(unauthorized());
    }
    let app = state
        .apps
        .find(&AppFilter::by_slug(form.app_slug.as_str()))
        .await
        .map_err(credential_lookup)?;
    Ok(app.record.id)
}

async fn resolve_app_token(state: &HttpState, slug: String, token: String) -> Result<Uuid, Error> {
    let app = state
        .apps
        .find(&AppFilter::by_slug(slug).with_api_token(token))
        .await
        .map_err(credential_lookup)?;
    Ok(app.record.id)
}

async fn resolve_contact_token(state: &HttpState, token: &str) -> Result<Uuid, Error> {
    if token.is_empty() {
        return Err(unauthorized());
    }
    let contact = state
        .app_contacts
        .find(&AppContactFilter::by_confirmation_token(token))
        .await
        .map_err(credential_lookup)?;
    Ok(contact.record.id)
}
