//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod repository;
mod screenshot_repository;

#[cfg(test)]
pub use repository::{MockAppContactRepository, MockAppRepository, MockAppVersionRepository};
pub use repository::{Entity, EntityRepository, RepositoryError, ScopedRepository};
#[cfg(test)]
pub use screenshot_repository::MockScreenshotStore;
pub use screenshot_repository::ScreenshotRepository;
