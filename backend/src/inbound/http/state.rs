//! Shared HTTP adapter state.
//!
//! Handlers and the authorisation middleware receive this through
//! `web::Data`, so they depend only on the repository ports and stay testable
//! without a database.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{EntityRepository, ScopedRepository, ScreenshotRepository};
use crate::domain::{App, AppContact, AppVersion};

/// Values the add-on needs from its parent platform.
#[derive(Clone)]
pub struct AddonSettings {
    /// Public URL of this service, handed out during provisioning.
    pub host_url: String,
    /// Frontend base URL used for login redirects.
    pub frontend_host_url: String,
    /// Token the platform presents when provisioning.
    pub access_token: String,
    /// Shared secret for single sign-on digests.
    pub sso_secret: String,
}

impl std::fmt::Debug for AddonSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonSettings")
            .field("host_url", &self.host_url)
            .field("frontend_host_url", &self.frontend_host_url)
            .finish_non_exhaustive()
    }
}

/// Parameter object bundling the repository ports.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub apps: Arc<dyn EntityRepository<App>>,
    pub app_versions: Arc<dyn ScopedRepository<AppVersion>>,
    pub app_contacts: Arc<dyn ScopedRepository<AppContact>>,
    pub screenshots: Arc<dyn ScreenshotRepository>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub apps: Arc<dyn EntityRepository<App>>,
    pub app_versions: Arc<dyn ScopedRepository<AppVersion>>,
    pub app_contacts: Arc<dyn ScopedRepository<AppContact>>,
    pub screenshots: Arc<dyn ScreenshotRepository>,
    pub clock: Arc<dyn Clock>,
    pub addon: AddonSettings,
}

impl HttpState {
    /// Bundle ports, clock and add-on settings.
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>, addon: AddonSettings) -> Self {
        let HttpStatePorts {
            apps,
            app_versions,
            app_contacts,
            screenshots,
        } = ports;
        Self {
            apps,
            app_versions,
            app_contacts,
            screenshots,
            clock,
            addon,
        }
    }
}
