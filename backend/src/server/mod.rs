//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, ShipSettings};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use ship_backend::Trace;
#[cfg(debug_assertions)]
use ship_backend::doc::ApiDoc;
use ship_backend::inbound::http::app_contacts::confirm_email;
use ship_backend::inbound::http::apps::app_routes;
use ship_backend::inbound::http::error::json_config;
use ship_backend::inbound::http::health::{HealthState, live, ready};
use ship_backend::inbound::http::login::login;
use ship_backend::inbound::http::provision::provision_routes;
use ship_backend::inbound::http::root::root;
use ship_backend::inbound::http::state::HttpState;
use ship_backend::middleware::Authorize;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

/// Mount every route behind the gate that guards it.
///
/// | Scope              | Gate                      |
/// |--------------------|---------------------------|
/// | `/provision`       | add-on access token       |
/// | `/login`           | signed single sign-on     |
/// | `/confirm_email`   | contact confirmation token|
/// | `/apps/{app_slug}` | app API token             |
fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .wrap(Trace)
        .service(root)
        .service(ready)
        .service(live)
        .service(
            web::scope("/provision")
                .wrap(Authorize::addon_token())
                .configure(provision_routes),
        )
        .service(
            web::scope("/login")
                .wrap(Authorize::single_sign_on())
                .service(login),
        )
        .service(
            web::scope("/confirm_email")
                .wrap(Authorize::contact_token())
                .service(confirm_email),
        )
        .service(
            web::scope("/apps/{app_slug}")
                .wrap(Authorize::app_token())
                .configure(app_routes),
        );

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server for the given configuration.
///
/// Marks `health_state` ready once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        db_pool,
        secret_key,
        addon,
    } = config;
    let http_state = build_http_state(&db_pool, secret_key, addon);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
