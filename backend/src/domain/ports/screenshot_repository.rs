//! Screenshot persistence with all-or-nothing batch writes.

use async_trait::async_trait;

use crate::domain::whitelist::Whitelist;
use crate::domain::{NewScreenshot, Screenshot, ScreenshotField, WriteOutcome};

use super::repository::{RepositoryError, ScopedRepository};

/// Screenshot storage.
///
/// Batch writes run in one transaction. Every item is validated before the
/// first statement; a rejected item rejects the batch with its errors
/// prefixed by the item index, and a missing row rolls the batch back.
#[async_trait]
pub trait ScreenshotRepository: ScopedRepository<Screenshot> {
    /// Insert every draft or none.
    async fn batch_create(
        &self,
        drafts: Vec<NewScreenshot>,
    ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError>;

    /// Persist the whitelisted attributes of every screenshot or none.
    async fn batch_update(
        &self,
        screenshots: &[Screenshot],
        whitelist: &Whitelist<ScreenshotField>,
    ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError>;
}

#[cfg(test)]
mockall::mock! {
    pub ScreenshotStore {}

    #[async_trait]
    impl super::repository::EntityRepository<Screenshot> for ScreenshotStore {
        async fn find(
            &self,
            filter: &crate::domain::ScreenshotFilter,
        ) -> Result<Screenshot, RepositoryError>;
        async fn create(
            &self,
            draft: NewScreenshot,
        ) -> Result<WriteOutcome<Screenshot>, RepositoryError>;
        async fn update(
            &self,
            entity: &Screenshot,
            whitelist: &Whitelist<ScreenshotField>,
        ) -> Result<WriteOutcome<Screenshot>, RepositoryError>;
        async fn delete(&self, id: uuid::Uuid) -> Result<(), RepositoryError>;
    }

    #[async_trait]
    impl ScopedRepository<Screenshot> for ScreenshotStore {
        async fn find_all(&self, parent_id: uuid::Uuid) -> Result<Vec<Screenshot>, RepositoryError>;
    }

    #[async_trait]
    impl ScreenshotRepository for ScreenshotStore {
        async fn batch_create(
            &self,
            drafts: Vec<NewScreenshot>,
        ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError>;
        async fn batch_update(
            &self,
            screenshots: &[Screenshot],
            whitelist: &Whitelist<ScreenshotField>,
        ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError>;
    }
}
