//! Fixtures for handler and middleware tests.

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    MockAppContactRepository, MockAppRepository, MockAppVersionRepository, MockScreenshotStore,
};
use crate::domain::{
    App, AppContact, AppStoreInfo, AppVersion, Platform, Record, Screenshot,
};

use super::state::{AddonSettings, HttpState, HttpStatePorts};

pub(crate) const ADDON_TOKEN: &str = "addon-access-token";
pub(crate) const SSO_SECRET: &str = "sso-secret";
pub(crate) const FRONTEND_HOST: &str = "http://ship.bitrise.io";
pub(crate) const ADDON_HOST: &str = "https://ship-api.example";

/// Clock pinned to one instant.
pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Mocked ports; set expectations, then call [`MockPorts::into_state`].
#[derive(Default)]
pub(crate) struct MockPorts {
    pub(crate) apps: MockAppRepository,
    pub(crate) app_versions: MockAppVersionRepository,
    pub(crate) app_contacts: MockAppContactRepository,
    pub(crate) screenshots: MockScreenshotStore,
}

impl MockPorts {
    pub(crate) fn into_state(self) -> web::Data<HttpState> {
        let ports = HttpStatePorts {
            apps: Arc::new(self.apps),
            app_versions: Arc::new(self.app_versions),
            app_contacts: Arc::new(self.app_contacts),
            screenshots: Arc::new(self.screenshots),
        };
        web::Data::new(HttpState::new(
            ports,
            Arc::new(FixtureClock {
                utc_now: fixture_now(),
            }),
            AddonSettings {
                host_url: ADDON_HOST.into(),
                frontend_host_url: FRONTEND_HOST.into(),
                access_token: ADDON_TOKEN.into(),
                sso_secret: SSO_SECRET.into(),
            },
        ))
    }
}

fn record(id: Uuid) -> Record {
    let now = fixture_now();
    Record::new(id, now, now)
}

pub(crate) fn sample_app(id: Uuid) -> App {
    App {
        record: record(id),
        app_slug: "test-app-slug".into(),
        plan: "free".into(),
        api_token: "test-app-api-token".into(),
        bitrise_api_token: "bitrise-token".into(),
        header_color_1: String::new(),
        header_color_2: String::new(),
        encrypted_secret: None,
        encrypted_secret_iv: None,
        settings: None,
    }
}

pub(crate) fn sample_version(id: Uuid, app_id: Uuid) -> AppVersion {
    AppVersion {
        record: record(id),
        app_id,
        platform: Platform::Ios,
        build_number: "123".into(),
        build_slug: "build-slug".into(),
        version: "1.0.0".into(),
        last_update: None,
        app_store_info: AppStoreInfo::default(),
    }
}

pub(crate) fn sample_contact(id: Uuid, app_id: Uuid) -> AppContact {
    AppContact {
        record: record(id),
        app_id,
        email: "someone@example.com".into(),
        confirmation_token: Some("confirm-me".into()),
        confirmed_at: None,
        notification_preferences: None,
    }
}

pub(crate) fn sample_screenshot(id: Uuid, app_version_id: Uuid) -> Screenshot {
    Screenshot {
        record: record(id),
        app_version_id,
        filename: "home.png".into(),
        filesize: 2048,
        device_type: "iPhone 11".into(),
        screen_size: "6.5 inch".into(),
        uploaded: false,
    }
}

/// Initialise a test service with `$principal` injected into the request
/// extensions the way the authorisation gates do it.
///
/// Pass `None::<AuthorizedAppId>` to simulate a route mounted without its gate.
macro_rules! test_app {
    ($state:expr, $principal:expr, $configure:expr) => {{
        use actix_web::HttpMessage as _;
        use actix_web::dev::Service as _;
        let principal = $principal;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .app_data($crate::inbound::http::error::json_config())
                .wrap_fn(move |req, srv| {
                    if let Some(principal) = principal {
                        req.extensions_mut().insert(principal);
                    }
                    srv.call(req)
                })
                .configure($configure),
        )
        .await
    }};
}

pub(crate) use test_app;

/// Read a response body as JSON, `null` when empty.
pub(crate) async fn body_json<B>(res: actix_web::dev::ServiceResponse<B>) -> serde_json::Value
where
    B: actix_web::body::MessageBody,
{
    let bytes = actix_web::test::read_body(res).await;
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    }
}
