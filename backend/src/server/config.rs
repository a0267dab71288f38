//! Runtime settings loaded via OrthoConfig and the server configuration
//! derived from them.

use std::net::{IpAddr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use ship_backend::domain::{SecretError, SecretKey};
use ship_backend::inbound::http::state::AddonSettings;
use ship_backend::outbound::persistence::{DbPool, PoolConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Invalid or missing settings; startup aborts on any of these.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid bind host `{host}`")]
    InvalidHost { host: String },
    #[error("setting `{field}` is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid app_webhook_secret_encrypt_key: {0}")]
    InvalidKey(#[from] SecretError),
}

/// Settings read from `SHIP_*` environment variables, config files and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SHIP")]
pub struct ShipSettings {
    /// Bind address; defaults to all interfaces.
    pub host: Option<String>,
    /// Bind port; defaults to 8080.
    pub port: Option<u16>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// Public URL of this service, exported to builds at provisioning.
    pub addon_host_url: Option<String>,
    /// Frontend base URL for sign-on redirects.
    pub addon_frontend_host_url: Option<String>,
    /// Token the platform presents on provisioning calls.
    pub addon_access_token: Option<String>,
    /// Shared secret for single sign-on digests.
    pub sso_secret: Option<String>,
    /// 32-byte key, raw or base64, sealing app webhook secrets.
    pub app_webhook_secret_encrypt_key: Option<String>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
}

fn required<'a>(value: Option<&'a String>, name: &'static str) -> Result<&'a str, SettingsError> {
    value
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SettingsError::Missing(name))
}

fn base_url(value: Option<&String>, name: &'static str) -> Result<String, SettingsError> {
    let raw = required(value, name)?;
    Url::parse(raw).map_err(|source| SettingsError::InvalidUrl { field: name, source })?;
    Ok(raw.trim_end_matches('/').to_owned())
}

impl ShipSettings {
    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let ip: IpAddr = host.parse().map_err(|_| SettingsError::InvalidHost {
            host: host.to_owned(),
        })?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT)))
    }

    pub fn database_url(&self) -> Result<&str, SettingsError> {
        required(self.database_url.as_ref(), "database_url")
    }

    /// Pool settings for [`DbPool::new`].
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let config = PoolConfig::new(self.database_url()?);
        Ok(match self.pool_max_size {
            Some(max_size) => config.with_max_size(max_size),
            None => config,
        })
    }

    /// Values the handlers need from the platform integration.
    pub fn addon_settings(&self) -> Result<AddonSettings, SettingsError> {
        Ok(AddonSettings {
            host_url: base_url(self.addon_host_url.as_ref(), "addon_host_url")?,
            frontend_host_url: base_url(
                self.addon_frontend_host_url.as_ref(),
                "addon_frontend_host_url",
            )?,
            access_token: required(self.addon_access_token.as_ref(), "addon_access_token")?
                .to_owned(),
            sso_secret: required(self.sso_secret.as_ref(), "sso_secret")?.to_owned(),
        })
    }

    /// Key sealing app webhook secrets.
    pub fn secret_key(&self) -> Result<SecretKey, SettingsError> {
        let raw = required(
            self.app_webhook_secret_encrypt_key.as_ref(),
            "app_webhook_secret_encrypt_key",
        )?;
        Ok(SecretKey::parse(raw)?)
    }
}

/// Everything [`super::create_server`] needs.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) secret_key: SecretKey,
    pub(crate) addon: AddonSettings,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        secret_key: SecretKey,
        addon: AddonSettings,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            secret_key,
            addon,
        }
    }
}
