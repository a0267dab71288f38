//! HTTP inbound adapter exposing the add-on's REST endpoints.

pub mod app_contacts;
pub mod app_versions;
pub mod apps;
pub mod envelope;
pub mod error;
pub mod health;
pub mod login;
pub mod principal;
pub mod provision;
pub mod root;
pub mod screenshots;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
