//! Integration tests for `DieselAppContactRepository` against embedded PostgreSQL.

use chrono::{DateTime, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use ship_backend::domain::ports::{EntityRepository, RepositoryError, ScopedRepository};
use ship_backend::domain::{AppContactFilter, NewAppContact, NotificationPreferences};
use ship_backend::outbound::persistence::{DbPool, DieselAppContactRepository, PoolConfig};
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::shared_cluster::shared_cluster_handle;
use support::{handle_cluster_setup_failure, provision_template_database, seed_app};

struct TestContext {
    runtime: Runtime,
    repository: DieselAppContactRepository,
    app_id: Uuid,
    _database: TemporaryDatabase,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    let database = provision_template_database(cluster)?;
    let url = database.url().to_string();
    let app_id = seed_app(&url, "contacts-app", "token-c")?;

    let config = PoolConfig::new(url).with_max_size(2).with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        repository: DieselAppContactRepository::new(pool),
        app_id,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn draft(app_id: Uuid, email: &str) -> NewAppContact {
    NewAppContact {
        app_id,
        email: email.to_owned(),
        confirmation_token: None,
        notification_preferences: Some(NotificationPreferences::default().to_blob()),
    }
}

#[rstest]
fn created_contact_can_be_confirmed_by_token(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: created_contact_can_be_confirmed_by_token skipped");
        return;
    };
    let repo = &ctx.repository;

    let created = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "qa@example.com")))
        .expect("create")
        .applied()
        .expect("valid");
    let token = created
        .confirmation_token
        .clone()
        .expect("token generated on create");

    let mut contact = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::by_confirmation_token(token.clone())))
        .expect("find by token");
    assert_eq!(contact.record.id, created.record.id);

    let whitelist = contact.confirm(Utc::now());
    ctx.runtime
        .block_on(repo.update(&contact, &whitelist))
        .expect("update")
        .applied()
        .expect("valid");

    let stored = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::owned(created.record.id, ctx.app_id)))
        .expect("find");
    assert!(stored.is_confirmed());
    assert!(stored.confirmation_token.is_none());
    let by_old_token = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::by_confirmation_token(token)));
    assert!(matches!(by_old_token, Err(RepositoryError::NotFound)));
}

#[rstest]
fn duplicate_email_per_app_is_a_query_error(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_email_per_app_is_a_query_error skipped");
        return;
    };
    let repo = &ctx.repository;
    ctx.runtime
        .block_on(repo.create(draft(ctx.app_id, "dup@example.com")))
        .expect("first create")
        .applied()
        .expect("valid");

    let second = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "dup@example.com")));
    assert!(matches!(second, Err(RepositoryError::Query { .. })));

    let listed = ctx
        .runtime
        .block_on(repo.find_all(ctx.app_id))
        .expect("list");
    assert_eq!(listed.len(), 1);
}

#[rstest]
fn invalid_email_is_rejected_before_insert(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: invalid_email_is_rejected_before_insert skipped");
        return;
    };
    let outcome = ctx
        .runtime
        .block_on(ctx.repository.create(draft(ctx.app_id, "not-an-email")))
        .expect("no infrastructure fault");
    let errors = outcome.into_result().expect_err("rejected");
    assert_eq!(errors.messages(), vec!["email: Wrong format".to_owned()]);
}

#[rstest]
fn preferences_update_persists_blob(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: preferences_update_persists_blob skipped");
        return;
    };
    let repo = &ctx.repository;
    let mut contact = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "prefs@example.com")))
        .expect("create")
        .applied()
        .expect("valid");

    let preferences = NotificationPreferences {
        new_version: true,
        successful_publish: false,
        failed_publish: true,
    };
    let whitelist = contact.set_notification_preferences(preferences);
    ctx.runtime
        .block_on(repo.update(&contact, &whitelist))
        .expect("update")
        .applied()
        .expect("valid");

    let stored = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::by_id(contact.record.id)))
        .expect("find");
    assert_eq!(
        stored.notification_preferences().expect("decodes"),
        preferences
    );

    ctx.runtime
        .block_on(repo.delete(contact.record.id))
        .expect("delete");
    let gone = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::by_id(contact.record.id)));
    assert!(matches!(gone, Err(RepositoryError::NotFound)));
}

#[rstest]
fn find_all_lists_newest_contact_first(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: find_all_lists_newest_contact_first skipped");
        return;
    };
    let repo = &ctx.repository;
    let older = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "first@example.com")))
        .expect("create first")
        .applied()
        .expect("valid");
    let newer = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "second@example.com")))
        .expect("create second")
        .applied()
        .expect("valid");

    let listed: Vec<_> = ctx
        .runtime
        .block_on(repo.find_all(ctx.app_id))
        .expect("list")
        .into_iter()
        .map(|contact| contact.record.id)
        .collect();
    assert_eq!(listed, vec![newer.record.id, older.record.id]);
}

fn confirmed_at_fixture() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[rstest]
fn confirming_twice_rewrites_the_same_columns(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: confirming_twice_rewrites_the_same_columns skipped");
        return;
    };
    let repo = &ctx.repository;
    let mut contact = ctx
        .runtime
        .block_on(repo.create(draft(ctx.app_id, "twice@example.com")))
        .expect("create")
        .applied()
        .expect("valid");

    let whitelist = contact.confirm(confirmed_at_fixture());
    let first = ctx
        .runtime
        .block_on(repo.update(&contact, &whitelist))
        .expect("first confirm")
        .applied()
        .expect("valid");

    let mut again = ctx
        .runtime
        .block_on(repo.find(&AppContactFilter::by_id(contact.record.id)))
        .expect("find confirmed");
    let whitelist = again.confirm(confirmed_at_fixture());
    let second = ctx
        .runtime
        .block_on(repo.update(&again, &whitelist))
        .expect("second confirm")
        .applied()
        .expect("valid");

    assert_eq!(second.confirmed_at, first.confirmed_at);
    assert_eq!(second.confirmed_at, Some(confirmed_at_fixture()));
    assert!(second.confirmation_token.is_none());
    assert_eq!(second.email, first.email);
    assert_eq!(second.notification_preferences, first.notification_preferences);
}
