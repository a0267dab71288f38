//! Generic persistence port shared by every entity.
//!
//! Reads return the entity or [`RepositoryError::NotFound`]; they never hand
//! back an empty placeholder. Writes return `Ok(WriteOutcome::Rejected(..))`
//! when validation fails, in which case storage has not been touched, and
//! `Err(..)` only for infrastructure faults.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::whitelist::{UpdatableField, Whitelist};
use crate::domain::{
    App, AppContact, AppContactField, AppContactFilter, AppField, AppFilter, AppVersion,
    AppVersionField, AppVersionFilter, NewApp, NewAppContact, NewAppVersion, NewScreenshot,
    Screenshot, ScreenshotField, ScreenshotFilter, WriteOutcome,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// No row matched the lookup, update or delete.
        NotFound => "record not found",
        /// A connection could not be obtained.
        Connection { message } => "database connection failed: {message}",
        /// The statement failed; carries the database message.
        Query { message } => "{message}",
    }
}

/// Types stored through an [`EntityRepository`].
pub trait Entity: Send + Sync + 'static {
    /// Values needed to create the entity.
    type Draft: Send + 'static;
    /// Sparse lookup.
    type Filter: Send + Sync + 'static;
    /// Attributes an update may touch.
    type Field: UpdatableField<Entity = Self> + Send + Sync;
}

impl Entity for App {
    type Draft = NewApp;
    type Filter = AppFilter;
    type Field = AppField;
}

impl Entity for AppVersion {
    type Draft = NewAppVersion;
    type Filter = AppVersionFilter;
    type Field = AppVersionField;
}

impl Entity for AppContact {
    type Draft = NewAppContact;
    type Filter = AppContactFilter;
    type Field = AppContactField;
}

impl Entity for Screenshot {
    type Draft = NewScreenshot;
    type Filter = ScreenshotFilter;
    type Field = ScreenshotField;
}

/// Find, create, update and delete for one entity type.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// First row matching every set member of `filter`.
    ///
    /// An empty filter is rejected with [`RepositoryError::Query`].
    async fn find(&self, filter: &E::Filter) -> Result<E, RepositoryError>;

    /// Validate every attribute of `draft` and insert it.
    async fn create(&self, draft: E::Draft) -> Result<WriteOutcome<E>, RepositoryError>;

    /// Persist the whitelisted attributes of `entity`.
    ///
    /// Attributes outside `whitelist` are neither validated nor written, even
    /// when they differ from the stored row. `updated_at` is always refreshed.
    async fn update(
        &self,
        entity: &E,
        whitelist: &Whitelist<E::Field>,
    ) -> Result<WriteOutcome<E>, RepositoryError>;

    /// Remove the row with `id`; [`RepositoryError::NotFound`] when absent.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Listing of entities owned by a parent row.
#[async_trait]
pub trait ScopedRepository<E: Entity>: EntityRepository<E> {
    /// Every row owned by `parent_id`, newest first. Empty is not an error.
    async fn find_all(&self, parent_id: Uuid) -> Result<Vec<E>, RepositoryError>;
}

#[cfg(test)]
mockall::mock! {
    pub AppRepository {}

    #[async_trait]
    impl EntityRepository<App> for AppRepository {
        async fn find(&self, filter: &AppFilter) -> Result<App, RepositoryError>;
        async fn create(&self, draft: NewApp) -> Result<WriteOutcome<App>, RepositoryError>;
        async fn update(
            &self,
            entity: &App,
            whitelist: &Whitelist<AppField>,
        ) -> Result<WriteOutcome<App>, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub AppVersionRepository {}

    #[async_trait]
    impl EntityRepository<AppVersion> for AppVersionRepository {
        async fn find(&self, filter: &AppVersionFilter) -> Result<AppVersion, RepositoryError>;
        async fn create(
            &self,
            draft: NewAppVersion,
        ) -> Result<WriteOutcome<AppVersion>, RepositoryError>;
        async fn update(
            &self,
            entity: &AppVersion,
            whitelist: &Whitelist<AppVersionField>,
        ) -> Result<WriteOutcome<AppVersion>, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    }

    #[async_trait]
    impl ScopedRepository<AppVersion> for AppVersionRepository {
        async fn find_all(&self, parent_id: Uuid) -> Result<Vec<AppVersion>, RepositoryError>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub AppContactRepository {}

    #[async_trait]
    impl EntityRepository<AppContact> for AppContactRepository {
        async fn find(&self, filter: &AppContactFilter) -> Result<AppContact, RepositoryError>;
        async fn create(
            &self,
            draft: NewAppContact,
        ) -> Result<WriteOutcome<AppContact>, RepositoryError>;
        async fn update(
            &self,
            entity: &AppContact,
            whitelist: &Whitelist<AppContactField>,
        ) -> Result<WriteOutcome<AppContact>, RepositoryError>;
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    }

    #[async_trait]
    impl ScopedRepository<AppContact> for AppContactRepository {
        async fn find_all(&self, parent_id: Uuid) -> Result<Vec<AppContact>, RepositoryError>;
    }
}
