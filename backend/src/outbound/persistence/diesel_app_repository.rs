//! PostgreSQL-backed app repository.
//!
//! Creating an app inserts its settings row in the same transaction and seals
//! a fresh webhook secret unless the caller supplied an IV.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{EntityRepository, RepositoryError};
use crate::domain::{
    App, AppField, AppFilter, AppSettings, NewApp, Record, SecretKey, Validate, Whitelist,
    WriteOutcome, ensure_secret,
};

use super::error_mapping::{empty_filter_error, map_diesel_error, map_pool_error};
use super::models::{AppChangeset, AppRow, AppSettingsRow, NewAppRow, NewAppSettingsRow};
use super::pool::DbPool;
use super::schema::{app_settings, apps};

/// Diesel implementation of `EntityRepository<App>`.
#[derive(Clone)]
pub struct DieselAppRepository {
    pool: DbPool,
    secret_key: SecretKey,
}

impl DieselAppRepository {
    /// Repository sealing new secrets with `secret_key`.
    pub fn new(pool: DbPool, secret_key: SecretKey) -> Self {
        Self { pool, secret_key }
    }
}

fn row_to_settings(row: AppSettingsRow) -> AppSettings {
    AppSettings {
        record: Record::new(row.id, row.created_at, row.updated_at),
        app_id: row.app_id,
        ios_workflow: row.ios_workflow,
        android_workflow: row.android_workflow,
    }
}

fn row_to_app(row: AppRow, settings: Option<AppSettings>) -> App {
    App {
        record: Record::new(row.id, row.created_at, row.updated_at),
        app_slug: row.app_slug,
        plan: row.plan,
        api_token: row.api_token,
        bitrise_api_token: row.bitrise_api_token,
        header_color_1: row.header_color_1,
        header_color_2: row.header_color_2,
        encrypted_secret: row.encrypted_secret,
        encrypted_secret_iv: row.encrypted_secret_iv,
        settings,
    }
}

impl<'a> AppChangeset<'a> {
    fn from_whitelist(app: &'a App, whitelist: &Whitelist<AppField>) -> Self {
        let mut changeset = Self::default();
        for field in whitelist.iter() {
            match field {
                AppField::Plan => changeset.plan = Some(&app.plan),
                AppField::BitriseApiToken => changeset.bitrise_api_token = Some(&app.bitrise_api_token),
                AppField::HeaderColor1 => changeset.header_color_1 = Some(&app.header_color_1),
                AppField::HeaderColor2 => changeset.header_color_2 = Some(&app.header_color_2),
            }
        }
        changeset
    }
}

async fn load_settings(
    conn: &mut AsyncPgConnection,
    app_id: Uuid,
) -> Result<Option<AppSettings>, diesel::result::Error> {
    app_settings::table
        .filter(app_settings::app_id.eq(app_id))
        .select(AppSettingsRow::as_select())
        .first(conn)
        .await
        .optional()
        .map(|row| row.map(row_to_settings))
}

#[async_trait]
impl EntityRepository<App> for DieselAppRepository {
    async fn find(&self, filter: &AppFilter) -> Result<App, RepositoryError> {
        if filter.is_empty() {
            return Err(empty_filter_error("app"));
        }
        let mut query = apps::table.into_boxed();
        if let Some(id) = filter.id {
            query = query.filter(apps::id.eq(id));
        }
        if let Some(slug) = &filter.app_slug {
            query = query.filter(apps::app_slug.eq(slug.clone()));
        }
        if let Some(token) = &filter.api_token {
            query = query.filter(apps::api_token.eq(token.clone()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = query
            .select(AppRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let settings = load_settings(&mut conn, row.id).await.map_err(map_diesel_error)?;
        Ok(row_to_app(row, settings))
    }

    async fn create(&self, mut draft: NewApp) -> Result<WriteOutcome<App>, RepositoryError> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        ensure_secret(&mut draft, &self.secret_key)
            .map_err(|err| RepositoryError::query(format!("seal app secret: {err}")))?;

        let app_row = NewAppRow {
            id: Uuid::new_v4(),
            app_slug: &draft.app_slug,
            plan: &draft.plan,
            api_token: &draft.api_token,
            bitrise_api_token: &draft.bitrise_api_token,
            header_color_1: &draft.header_color_1,
            header_color_2: &draft.header_color_2,
            encrypted_secret: draft.encrypted_secret.as_deref(),
            encrypted_secret_iv: draft.encrypted_secret_iv.as_deref(),
        };
        let settings_row = NewAppSettingsRow {
            id: Uuid::new_v4(),
            app_id: app_row.id,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (app, settings) = conn
            .transaction(|conn| {
                async move {
                    let app = diesel::insert_into(apps::table)
                        .values(&app_row)
                        .returning(AppRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let settings = diesel::insert_into(app_settings::table)
                        .values(&settings_row)
                        .returning(AppSettingsRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((app, settings))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        debug!(app_id = %app.id, app_slug = %app.app_slug, "app created");
        Ok(WriteOutcome::Applied(row_to_app(app, Some(row_to_settings(settings)))))
    }

    async fn update(
        &self,
        app: &App,
        whitelist: &Whitelist<AppField>,
    ) -> Result<WriteOutcome<App>, RepositoryError> {
        let errors = whitelist.validate(app);
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let changeset = AppChangeset::from_whitelist(app, whitelist);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(apps::table.find(app.record.id))
            .set((changeset, apps::updated_at.eq(diesel::dsl::now)))
            .returning(AppRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let settings = load_settings(&mut conn, row.id).await.map_err(map_diesel_error)?;
        Ok(WriteOutcome::Applied(row_to_app(row, settings)))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(apps::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if deleted == 0 {
            return Err(RepositoryError::not_found());
        }
        Ok(())
    }
}
