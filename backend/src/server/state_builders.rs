//! Builds the HTTP state from the Diesel adapters.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use ship_backend::domain::SecretKey;
use ship_backend::inbound::http::state::{AddonSettings, HttpState, HttpStatePorts};
use ship_backend::outbound::persistence::{
    DbPool, DieselAppContactRepository, DieselAppRepository, DieselAppVersionRepository,
    DieselScreenshotRepository,
};

/// Wire every repository port to the shared pool.
pub(super) fn build_http_state(
    pool: &DbPool,
    secret_key: SecretKey,
    addon: AddonSettings,
) -> web::Data<HttpState> {
    let ports = HttpStatePorts {
        apps: Arc::new(DieselAppRepository::new(pool.clone(), secret_key)),
        app_versions: Arc::new(DieselAppVersionRepository::new(pool.clone())),
        app_contacts: Arc::new(DieselAppContactRepository::new(pool.clone())),
        screenshots: Arc::new(DieselScreenshotRepository::new(pool.clone())),
    };
    web::Data::new(HttpState::new(ports, Arc::new(DefaultClock), addon))
}
