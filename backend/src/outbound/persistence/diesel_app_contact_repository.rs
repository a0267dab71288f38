//! PostgreSQL-backed app contact repository.
//!
//! New contacts receive a confirmation token unless the caller supplies one.
//! `(app_id, email)` is unique; a duplicate surfaces as a query error carrying
//! the database message.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{EntityRepository, RepositoryError, ScopedRepository};
use crate::domain::{
    AppContact, AppContactField, AppContactFilter, NewAppContact, Record, Validate, Whitelist,
    WriteOutcome, generate_confirmation_token,
};

use super::error_mapping::{empty_filter_error, map_diesel_error, map_pool_error};
use super::models::{AppContactChangeset, AppContactRow, NewAppContactRow};
use super::pool::DbPool;
use super::schema::app_contacts;

/// Diesel implementation of `ScopedRepository<AppContact>`, scoped by app.
#[derive(Clone)]
pub struct DieselAppContactRepository {
    pool: DbPool,
}

impl DieselAppContactRepository {
    /// Repository drawing connections from `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_contact(row: AppContactRow) -> AppContact {
    AppContact {
        record: Record::new(row.id, row.created_at, row.updated_at),
        app_id: row.app_id,
        email: row.email,
        confirmation_token: row.confirmation_token,
        confirmed_at: row.confirmed_at,
        notification_preferences: row.notification_preferences,
    }
}

impl<'a> AppContactChangeset<'a> {
    fn from_whitelist(contact: &'a AppContact, whitelist: &Whitelist<AppContactField>) -> Self {
        let mut changeset = Self::default();
        for field in whitelist.iter() {
            match field {
                AppContactField::Email => changeset.email = Some(&contact.email),
                AppContactField::ConfirmationToken => {
                    changeset.confirmation_token = Some(contact.confirmation_token.as_deref());
                }
                AppContactField::ConfirmedAt => changeset.confirmed_at = Some(contact.confirmed_at),
                AppContactField::NotificationPreferences => {
                    changeset.notification_preferences =
                        Some(contact.notification_preferences.as_ref());
                }
            }
        }
        changeset
    }
}

#[async_trait]
impl EntityRepository<AppContact> for DieselAppContactRepository {
    async fn find(&self, filter: &AppContactFilter) -> Result<AppContact, RepositoryError> {
        if filter.is_empty() {
            return Err(empty_filter_error("app contact"));
        }
        let mut query = app_contacts::table.into_boxed();
        if let Some(id) = filter.id {
            query = query.filter(app_contacts::id.eq(id));
        }
        if let Some(app_id) = filter.app_id {
            query = query.filter(app_contacts::app_id.eq(app_id));
        }
        if let Some(email) = &filter.email {
            query = query.filter(app_contacts::email.eq(email.clone()));
        }
        if let Some(token) = &filter.confirmation_token {
            query = query.filter(app_contacts::confirmation_token.eq(token.clone()));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        query
            .select(AppContactRow::as_select())
            .first(&mut conn)
            .await
            .map(row_to_contact)
            .map_err(map_diesel_error)
    }

    async fn create(
        &self,
        draft: NewAppContact,
    ) -> Result<WriteOutcome<AppContact>, RepositoryError> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let token = draft
            .confirmation_token
            .clone()
            .unwrap_or_else(generate_confirmation_token);
        let new_row = NewAppContactRow {
            id: Uuid::new_v4(),
            app_id: draft.app_id,
            email: &draft.email,
            confirmation_token: Some(&token),
            notification_preferences: draft.notification_preferences.as_ref(),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(app_contacts::table)
            .values(&new_row)
            .returning(AppContactRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(contact_id = %row.id, app_id = %row.app_id, "app contact created");
        Ok(WriteOutcome::Applied(row_to_contact(row)))
    }

    async fn update(
        &self,
        contact: &AppContact,
        whitelist: &Whitelist<AppContactField>,
    ) -> Result<WriteOutcome<AppContact>, RepositoryError> {
        let errors = whitelist.validate(contact);
        if !errors.is_empty() {
            return Ok(WriteOutcome::Rejected(errors));
        }
        let changeset = AppContactChangeset::from_whitelist(contact, whitelist);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(app_contacts::table.find(contact.record.id))
            .set((changeset, app_contacts::updated_at.eq(diesel::dsl::now)))
            .returning(AppContactRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(|row| WriteOutcome::Applied(row_to_contact(row)))
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(app_contacts::table.find(id))
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
impl ScopedRepository<AppContact> for DieselAppContactRepository {
    async fn find_all(&self, app_id: Uuid) -> Result<Vec<AppContact>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        app_contacts::table
            .filter(app_contacts::app_id.eq(app_id))
            .order(app_contacts::created_at.desc())
            .then_order_by(app_contacts::id)
            .select(AppContactRow::as_select())
            .load(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(row_to_contact).collect())
            .map_err(map_diesel_error)
    }
}
