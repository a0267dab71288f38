//! PostgreSQL-backed app version repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{EntityRepository, RepositoryError, ScopedRepository};
use crate::domain::{
    AppStoreInfo, AppVersion, AppVersionField, AppVersionFilter, NewAppVersion, Platform, Record,
    Validate, Whitelist, WriteOutcome,
};

use super::error_mapping::{empty_filter_error, map_diesel_error, map_pool_error};
use super::models::{AppVersionChangeset, AppVersionRow, NewAppVersionRow};
use super::pool::DbPool;
use super::schema::app_versions;

/// Diesel implementation of `ScopedRepository<AppVersion>`, scoped by app.
#[derive(Clone)]
pub struct DieselAppVersionRepository {
    pool: DbPool,
}

impl DieselAppVersionRepository {
    /// Repository drawing connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn store_info_to_json(info: &AppStoreInfo) -> Result<Value, RepositoryError> {
    serde_json::to_value(info)
        .map_err(|err| RepositoryError::query(format!("encode app_store_info: {err}")))
}

fn row_to_version(row: AppVersionRow) -> Result<AppVersion, RepositoryError> {
    let platform: Platform = row
        .platform
        .parse()
        .map_err(|err| RepositoryError::query(format!("stored version {}: {err}", row.id)))?;
    let app_store_info: AppStoreInfo = serde_json::from_value(row.app_store_info)
        .map_err(|err| RepositoryError::query(format!("stored version {}: {err}", row.id)))?;
    Ok(AppVersion {
        record: Record::new(row.id, row.created_at, row.updated_at),
        app_id: row.app_id,
        platform,
        build_number: row.build_number,
        build_slug: row.build_slug,
        version: row.version,
        last_update: row.last_update,
        app_store_info,
    })
}

impl<'a> AppVersionChangeset<'a> {
    fn from_whitelist(
        version: &'a AppVersion,
        whitelist: &Whitelist<AppVersionField>,
    ) -> Result<Self, RepositoryError> {
        let mut changeset = Self::default();
        for field in whitelist.iter() {
            match field {
                AppVersionField::BuildNumber => changeset.build_number = Some(&version.build_number),
                AppVersionField::BuildSlug => changeset.build_slug = Some(&version.build_slug),
                AppVersionField::Version => changeset.version = Some(&version.version),
                AppVersionField::LastUpdate => changeset.last_update = Some(version.last_update),
                AppVersionField::StoreInfo => {
                    changeset.app_store_info = Some(store_info_to_json(&version.app_store_info)?);
                }
            }
        }
        Ok(changeset)
    }
}

#[async_trait]
impl EntityRepository<AppVersion> for DieselAppVersionRepository {
    async fn find(&self, filter: &AppVersionFilter) -> Result<AppVersion, RepositoryError> {
        if filter.is_empty() {
            return Err(empty_filter_error("app version"));
        }
        let mut query = app_versions::table.into_boxed();
        if let Some(id) = filter.id {
            query = query.filter(app_versions::id.eq(id));
        }
        if let Some(app_id) = filter.app_id {
            query = query.filter(app_versions::app_id.eq(app_id));
        }
        if let Some(platform) = filter.platform {
            query = query.filter(app_versions::platform.eq(platform.as_str()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = query
            .select(AppVersionRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_version(row)
    }

    async fn create(
        &self,
        draft: NewAppVersion,
    ) -> Result<WriteOutcome<AppVersion>, RepositoryError> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let store_info = store_info_to_json(&draft.app_store_info)?;
        let new_row = NewAppVersionRow {
            id: Uuid::new_v4(),
            app_id: draft.app_id,
            platform: draft.platform.as_str(),
            build_number: &draft.build_number,
            build_slug: &draft.build_slug,
            version: &draft.version,
            last_update: draft.last_update,
            app_store_info: &store_info,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(app_versions::table)
            .values(&new_row)
            .returning(AppVersionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_version(row).map(WriteOutcome::Applied)
    }

    async fn update(
        &self,
        version: &AppVersion,
        whitelist: &Whitelist<AppVersionField>,
    ) -> Result<WriteOutcome<AppVersion>, RepositoryError> {
        let errors = whitelist.validate(version);
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let changeset = AppVersionChangeset::from_whitelist(version, whitelist)?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(app_versions::table.find(version.record.id))
            .set((changeset, app_versions::updated_at.eq(diesel::dsl::now)))
            .returning(AppVersionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_version(row).map(WriteOutcome::Applied)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(app_versions::table.find(id))
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
impl ScopedRepository<AppVersion> for DieselAppVersionRepository {
    async fn find_all(&self, app_id: Uuid) -> Result<Vec<AppVersion>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AppVersionRow> = app_versions::table
            .filter(app_versions::app_id.eq(app_id))
            .order(app_versions::created_at.desc())
            .then_order_by(app_versions::id)
            .select(AppVersionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_version).collect()
    }
}
