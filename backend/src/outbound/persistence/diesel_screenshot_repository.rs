//! PostgreSQL-backed screenshot repository with transactional batch writes.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    EntityRepository, RepositoryError, ScopedRepository, ScreenshotRepository,
};
use crate::domain::screenshot::validate_batch;
use crate::domain::{
    NewScreenshot, Record, Screenshot, ScreenshotField, ScreenshotFilter, Validate, Whitelist,
    WriteOutcome,
};

use super::error_mapping::{empty_filter_error, map_diesel_error, map_pool_error};
use super::models::{NewScreenshotRow, ScreenshotChangeset, ScreenshotRow};
use super::pool::DbPool;
use super::schema::screenshots;

/// Diesel implementation of [`ScreenshotRepository`], scoped by app version.
#[derive(Clone)]
pub struct DieselScreenshotRepository {
    pool: DbPool,
}

impl DieselScreenshotRepository {
    /// Repository drawing connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_screenshot(row: ScreenshotRow) -> Screenshot {
    Screenshot {
        record: Record::new(row.id, row.created_at, row.updated_at),
        app_version_id: row.app_version_id,
        filename: row.filename,
        filesize: row.filesize,
        device_type: row.device_type,
        screen_size: row.screen_size,
        uploaded: row.uploaded,
    }
}

fn new_row(draft: &NewScreenshot) -> NewScreenshotRow<'_> {
    NewScreenshotRow {
        id: Uuid::new_v4(),
        app_version_id: draft.app_version_id,
        filename: &draft.filename,
        filesize: draft.filesize,
        device_type: &draft.device_type,
        screen_size: &draft.screen_size,
        uploaded: draft.uploaded,
    }
}

impl<'a> ScreenshotChangeset<'a> {
    fn from_whitelist(screenshot: &'a Screenshot, whitelist: &Whitelist<ScreenshotField>) -> Self {
        let mut changeset = Self::default();
        for field in whitelist.iter() {
            match field {
                ScreenshotField::Filename => changeset.filename = Some(&screenshot.filename),
                ScreenshotField::Filesize => changeset.filesize = Some(screenshot.filesize),
                ScreenshotField::DeviceType => changeset.device_type = Some(&screenshot.device_type),
                ScreenshotField::ScreenSize => changeset.screen_size = Some(&screenshot.screen_size),
                ScreenshotField::Uploaded => changeset.uploaded = Some(screenshot.uploaded),
            }
        }
        changeset
    }
}

#[async_trait]
impl EntityRepository<Screenshot> for DieselScreenshotRepository {
    async fn find(&self, filter: &ScreenshotFilter) -> Result<Screenshot, RepositoryError> {
        if filter.is_empty() {
            return Err(empty_filter_error("screenshot"));
        }
        let mut query = screenshots::table.into_boxed();
        if let Some(id) = filter.id {
            query = query.filter(screenshots::id.eq(id));
        }
        if let Some(version_id) = filter.app_version_id {
            query = query.filter(screenshots::app_version_id.eq(version_id));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        query
            .select(ScreenshotRow::as_select())
            .first(&mut conn)
            .await
            .map(row_to_screenshot)
            .map_err(map_diesel_error)
    }

    async fn create(
        &self,
        draft: NewScreenshot,
    ) -> Result<WriteOutcome<Screenshot>, RepositoryError> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(screenshots::table)
            .values(&new_row(&draft))
            .returning(ScreenshotRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(|row| WriteOutcome::Applied(row_to_screenshot(row)))
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        screenshot: &Screenshot,
        whitelist: &Whitelist<ScreenshotField>,
    ) -> Result<WriteOutcome<Screenshot>, RepositoryError> {
        let errors = whitelist.validate(screenshot);
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let changeset = ScreenshotChangeset::from_whitelist(screenshot, whitelist);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(screenshots::table.find(screenshot.record.id))
            .set((changeset, screenshots::updated_at.eq(diesel::dsl::now)))
            .returning(ScreenshotRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(|row| WriteOutcome::Applied(row_to_screenshot(row)))
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(screenshots::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if deleted == 0 {
            return Err(RepositoryError::not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl ScopedRepository<Screenshot> for DieselScreenshotRepository {
    async fn find_all(&self, app_version_id: Uuid) -> Result<Vec<Screenshot>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        screenshots::table
            .filter(screenshots::app_version_id.eq(app_version_id))
            .order(screenshots::created_at.desc())
            .then_order_by(screenshots::id)
            .select(ScreenshotRow::as_select())
            .load(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(row_to_screenshot).collect())
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl ScreenshotRepository for DieselScreenshotRepository {
    async fn batch_create(
        &self,
        drafts: Vec<NewScreenshot>,
    ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError> {
        let errors = validate_batch(&drafts, NewScreenshot::validate);
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        if drafts.is_empty() {
            return Ok(WriteOutcome::Applied(Vec::new()));
        }
        let rows: Vec<NewScreenshotRow<'_>> = drafts.iter().map(new_row).collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let created = conn
            .transaction(|conn| {
                async move {
                    let mut created = Vec::with_capacity(rows.len());
                    for row in &rows {
                        let inserted = diesel::insert_into(screenshots::table)
                            .values(row)
                            .returning(ScreenshotRow::as_returning())
                            .get_result(conn)
                            .await?;
                        created.push(row_to_screenshot(inserted));
                    }
                    Ok::<_, diesel::result::Error>(created)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        debug!(count = created.len(), "screenshot batch created");
        Ok(WriteOutcome::Applied(created))
    }

    async fn batch_update(
        &self,
        items: &[Screenshot],
        whitelist: &Whitelist<ScreenshotField>,
    ) -> Result<WriteOutcome<Vec<Screenshot>>, RepositoryError> {
        let errors = validate_batch(items, |screenshot| whitelist.validate(screenshot));
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let changesets: Vec<(Uuid, ScreenshotChangeset<'_>)> = items
            .iter()
            .map(|s| (s.record.id, ScreenshotChangeset::from_whitelist(s, whitelist)))
            .collect();
        if changesets.is_empty() {
            return Ok(WriteOutcome::Applied(Vec::new()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = conn
            .transaction(|conn| {
                async move {
                    let mut updated = Vec::with_capacity(changesets.len());
                    for (id, changeset) in changesets {
                        let row = diesel::update(screenshots::table.find(id))
                            .set((changeset, screenshots::updated_at.eq(diesel::dsl::now)))
                            .returning(ScreenshotRow::as_returning())
                            .get_result(conn)
                            .await?;
                        updated.push(row_to_screenshot(row));
                    }
                    Ok::<_, diesel::result::Error>(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        debug!(count = updated.len(), "screenshot batch updated");
        Ok(WriteOutcome::Applied(updated))
    }
}
