use huddle_application::{RoleRepository, SchemeRepository};
use huddle_core::{StoreError, new_id};
use huddle_domain::{Role, Scheme, SchemeScope, make_default_roles};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresSchemeRepository;
use crate::PostgresRoleRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres scheme tests: {error}");
    }

    Some(pool)
}

fn team_scheme() -> (Scheme, Vec<Role>) {
    let defaults: Vec<Role> = make_default_roles().into_values().collect();
    let mut scheme = Scheme::new("Scheme Test", SchemeScope::Team);
    scheme.name = new_id();
    let Ok(roles) = scheme.derive_backing_roles(&defaults, new_id) else {
        panic!("default roles should cover every slot");
    };
    (scheme, roles)
}

#[tokio::test]
async fn save_new_writes_the_scheme_and_its_roles() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let schemes = PostgresSchemeRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool);
    let (scheme, backing_roles) = team_scheme();

    let Ok(saved) = schemes.save_new(scheme, backing_roles).await else {
        panic!("scheme insert should succeed");
    };

    assert_eq!(saved.id.len(), 26);
    let stored_roles = roles.get_by_names(&saved.role_names()).await;
    assert!(stored_roles.is_ok_and(|stored| {
        stored.len() == 6 && stored.iter().all(|role| role.scheme_managed)
    }));
    assert!(
        schemes
            .get_by_name(&saved.name)
            .await
            .is_ok_and(|stored| stored == saved)
    );
}

#[tokio::test]
async fn failed_role_insert_rolls_back_the_whole_scheme() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let schemes = PostgresSchemeRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool);
    let taken = new_id();
    assert!(
        roles
            .save(Role::new(taken.clone(), "Taken", ["create_post"]))
            .await
            .is_ok()
    );

    let (scheme, mut backing_roles) = team_scheme();
    let first_name = backing_roles[0].name.clone();
    if let Some(last) = backing_roles.last_mut() {
        last.name = taken;
    }
    let scheme_name = scheme.name.clone();

    let result = schemes.save_new(scheme, backing_roles).await;

    assert!(matches!(result, Err(StoreError::Conflict { .. })));
    assert!(matches!(
        roles.get_by_name(&first_name).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        schemes.get_by_name(&scheme_name).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_soft_deletes_and_detaches_teams() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let schemes = PostgresSchemeRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool.clone());
    let (scheme, backing_roles) = team_scheme();
    let Ok(saved) = schemes.save_new(scheme, backing_roles).await else {
        panic!("scheme insert should succeed");
    };
    let team_id = new_id();
    let team_insert = sqlx::query("INSERT INTO teams (id, scheme_id) VALUES ($1, $2)")
        .bind(&team_id)
        .bind(&saved.id)
        .execute(&pool)
        .await;
    assert!(team_insert.is_ok());

    assert!(
        schemes
            .delete(&saved.id)
            .await
            .is_ok_and(|deleted| deleted.is_deleted())
    );

    let team_scheme: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT scheme_id FROM teams WHERE id = $1")
            .bind(&team_id)
            .fetch_one(&pool)
            .await;
    assert!(team_scheme.is_ok_and(|scheme_id| scheme_id.is_none()));
    assert!(
        roles
            .get_by_names(&saved.role_names())
            .await
            .is_ok_and(|stored| stored.iter().all(|role| role.delete_at != 0))
    );
    assert!(matches!(
        schemes.delete(&saved.id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        schemes.save(saved).await,
        Err(StoreError::NotFound { .. })
    ));
}
