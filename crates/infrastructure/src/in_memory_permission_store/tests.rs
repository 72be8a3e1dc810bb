use std::sync::Arc;

use huddle_application::{
    MembershipRepository, MembershipService, PermissionMigrationService, RoleRepository,
    RoleService, SchemeRepository, SchemeService,
};
use huddle_core::StoreError;
use huddle_domain::{
    MembershipKey, MembershipScope, Role, Scheme, SchemeFlags, SchemeRoleSlot, SchemeScope,
};

use super::InMemoryPermissionStore;

struct Services {
    store: Arc<InMemoryPermissionStore>,
    roles: RoleService,
    schemes: SchemeService,
    members: MembershipService,
}

async fn migrated() -> Services {
    let store = Arc::new(InMemoryPermissionStore::new());
    let migrations =
        PermissionMigrationService::new(store.clone(), store.clone(), store.clone(), store.clone());
    assert!(migrations.run_all().await.is_complete());

    Services {
        roles: RoleService::new(store.clone()),
        schemes: SchemeService::new(store.clone(), store.clone(), store.clone()),
        members: MembershipService::new(store.clone(), store.clone()),
        store,
    }
}

async fn create_scheme(services: &Services, name: &str, scope: SchemeScope) -> Scheme {
    let mut scheme = Scheme::new(name, scope);
    scheme.name = name.to_owned();
    let Ok(scheme) = services.schemes.create_scheme(scheme).await else {
        panic!("scheme {name} should be created");
    };
    scheme
}

fn slot_role(scheme: &Scheme, level: SchemeScope, slot: SchemeRoleSlot) -> String {
    let Some(name) = scheme.default_role(level, slot) else {
        panic!("scheme {} has no {level:?} {slot:?} role", scheme.name);
    };
    name.to_owned()
}

fn user_flags() -> SchemeFlags {
    SchemeFlags {
        user: true,
        ..SchemeFlags::default()
    }
}

#[tokio::test]
async fn boot_migration_folds_legacy_member_tokens() {
    let store = Arc::new(InMemoryPermissionStore::new());
    store.add_team("team1", None).await;
    store
        .add_member(
            MembershipScope::Team,
            MembershipKey::new("team1", "alice"),
            "team_user team_admin",
            SchemeFlags::default(),
        )
        .await;
    let migrations =
        PermissionMigrationService::new(store.clone(), store.clone(), store.clone(), store.clone());

    let report = migrations.run_all().await;

    assert!(report.is_complete());
    assert_eq!(report.applied.len(), 17);
    let members = MembershipService::new(store.clone(), store.clone());
    let Ok(alice) = members
        .get_member(MembershipScope::Team, &MembershipKey::new("team1", "alice"))
        .await
    else {
        panic!("alice should be a member");
    };
    assert!(alice.explicit_roles.is_empty());
    assert!(alice.scheme_user && alice.scheme_admin && !alice.scheme_guest);
    let roles: Vec<&str> = alice.roles.split_whitespace().collect();
    assert!(roles.contains(&"team_user") && roles.contains(&"team_admin"));

    assert!(migrations.run_all().await.applied.is_empty());
}

#[tokio::test]
async fn team_scheme_supplies_member_roles_at_both_levels() {
    let services = migrated().await;
    let scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    services.store.add_team("team1", Some(&scheme.id)).await;
    services.store.add_channel("channel1", "team1", None).await;
    services
        .store
        .add_member(
            MembershipScope::Team,
            MembershipKey::new("team1", "alice"),
            "",
            user_flags(),
        )
        .await;
    services
        .store
        .add_member(
            MembershipScope::Channel,
            MembershipKey::new("channel1", "alice"),
            "",
            user_flags(),
        )
        .await;

    let team_member = services
        .members
        .get_member(MembershipScope::Team, &MembershipKey::new("team1", "alice"))
        .await;
    let channel_member = services
        .members
        .get_member(MembershipScope::Channel, &MembershipKey::new("channel1", "alice"))
        .await;

    let team_user = slot_role(&scheme, SchemeScope::Team, SchemeRoleSlot::User);
    let channel_user = slot_role(&scheme, SchemeScope::Channel, SchemeRoleSlot::User);
    assert!(team_member.is_ok_and(|member| member.roles == team_user));
    assert!(channel_member.is_ok_and(|member| member.roles == channel_user));
}

#[tokio::test]
async fn channel_scheme_takes_precedence_over_team_scheme() {
    let services = migrated().await;
    let team_scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    let channel_scheme = create_scheme(&services, "announcements", SchemeScope::Channel).await;
    services.store.add_team("team1", Some(&team_scheme.id)).await;
    services
        .store
        .add_channel("channel1", "team1", Some(&channel_scheme.id))
        .await;
    let key = MembershipKey::new("channel1", "bob");
    services
        .store
        .add_member(MembershipScope::Channel, key.clone(), "", user_flags())
        .await;

    let member = services.members.get_member(MembershipScope::Channel, &key).await;

    let expected = slot_role(&channel_scheme, SchemeScope::Channel, SchemeRoleSlot::User);
    assert!(member.is_ok_and(|member| member.roles == expected));
}

#[tokio::test]
async fn updating_roles_persists_flags_and_explicit_names() {
    let services = migrated().await;
    let scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    services.store.add_team("team1", Some(&scheme.id)).await;
    let key = MembershipKey::new("team1", "carol");
    services
        .store
        .add_member(MembershipScope::Team, key.clone(), "", SchemeFlags::default())
        .await;
    let custom = Role::new("support_desk", "Support Desk", ["create_post"]);
    let Ok(custom) = RoleRepository::save(services.store.as_ref(), custom).await else {
        panic!("custom role should be created");
    };
    let team_admin = slot_role(&scheme, SchemeScope::Team, SchemeRoleSlot::Admin);

    let updated = services
        .members
        .update_member_roles(
            MembershipScope::Team,
            &key,
            &format!("{} {team_admin}", custom.name),
        )
        .await;

    assert!(updated.is_ok_and(|member| {
        member.explicit_roles == "support_desk" && member.scheme_admin && !member.scheme_user
    }));
    let Ok(stored) = services.store.get_member(MembershipScope::Team, &key).await else {
        panic!("carol should still be a member");
    };
    assert_eq!(stored.roles, "support_desk");
    assert!(stored.flags.admin);
}

#[tokio::test]
async fn higher_scoped_permissions_follow_the_team_scheme() {
    let services = migrated().await;
    let team_scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    let channel_scheme = create_scheme(&services, "announcements", SchemeScope::Channel).await;
    services.store.add_team("team1", Some(&team_scheme.id)).await;
    services
        .store
        .add_channel("channel1", "team1", Some(&channel_scheme.id))
        .await;
    let channel_user = slot_role(&channel_scheme, SchemeScope::Channel, SchemeRoleSlot::User);

    let Ok(role) = services.roles.get_role_by_name(&channel_user).await else {
        panic!("channel scheme user role missing");
    };
    assert!(role.has_permission("create_post"));
    assert!(role.has_permission("read_channel"));

    let higher_name = slot_role(&team_scheme, SchemeScope::Channel, SchemeRoleSlot::User);
    let Ok(higher) = services.roles.get_role_by_name(&higher_name).await else {
        panic!("team scheme channel user role missing");
    };
    assert!(
        services
            .roles
            .patch_role(&higher.id, vec!["read_channel".to_owned()])
            .await
            .is_ok()
    );

    let Ok(role) = services.roles.get_role_by_name(&channel_user).await else {
        panic!("channel scheme user role missing");
    };
    assert!(!role.has_permission("create_post"));
    assert!(role.has_permission("read_channel"));
}

#[tokio::test]
async fn higher_scoped_permissions_fall_back_to_system_channel_roles() {
    let services = migrated().await;
    let channel_scheme = create_scheme(&services, "announcements", SchemeScope::Channel).await;
    services.store.add_team("team1", None).await;
    services
        .store
        .add_channel("channel1", "team1", Some(&channel_scheme.id))
        .await;
    let channel_admin = slot_role(&channel_scheme, SchemeScope::Channel, SchemeRoleSlot::Admin);

    let higher = services
        .store
        .channel_higher_scoped_permissions(&[channel_admin.clone(), "team_user".to_owned()])
        .await;

    let Ok(higher) = higher else {
        panic!("lookup should succeed");
    };
    assert_eq!(higher.len(), 1);
    let Some(admin) = higher.get(&channel_admin) else {
        panic!("admin role should be resolved");
    };
    assert_eq!(admin.slot, SchemeRoleSlot::Admin);
    let Ok(system_admin_role) = services.roles.get_role_by_name("channel_admin").await else {
        panic!("channel_admin missing");
    };
    assert_eq!(admin.permissions, system_admin_role.permissions);
}

#[tokio::test]
async fn deleting_a_scheme_detaches_teams_and_retires_its_roles() {
    let services = migrated().await;
    let scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    services.store.add_team("team1", Some(&scheme.id)).await;
    let key = MembershipKey::new("team1", "dave");
    services
        .store
        .add_member(MembershipScope::Team, key.clone(), "", user_flags())
        .await;

    assert!(services.schemes.delete_scheme(&scheme.id).await.is_ok());

    let member = services.members.get_member(MembershipScope::Team, &key).await;
    assert!(member.is_ok_and(|member| member.roles == "team_user"));
    let team_user = slot_role(&scheme, SchemeScope::Team, SchemeRoleSlot::User);
    assert!(
        RoleRepository::get_by_name(services.store.as_ref(), &team_user)
            .await
            .is_ok_and(|role| role.delete_at != 0)
    );
    assert!(
        SchemeRepository::get(services.store.as_ref(), &scheme.id)
            .await
            .is_ok_and(|stored| stored.is_deleted())
    );
    assert!(matches!(
        SchemeRepository::delete(services.store.as_ref(), &scheme.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deleted_channel_schemes_are_not_merged() {
    let services = migrated().await;
    let channel_scheme = create_scheme(&services, "announcements", SchemeScope::Channel).await;
    services.store.add_team("team1", None).await;
    services
        .store
        .add_channel("channel1", "team1", Some(&channel_scheme.id))
        .await;
    let channel_user = slot_role(&channel_scheme, SchemeScope::Channel, SchemeRoleSlot::User);

    assert!(services.schemes.delete_scheme(&channel_scheme.id).await.is_ok());

    let higher = services
        .store
        .channel_higher_scoped_permissions(std::slice::from_ref(&channel_user))
        .await;
    assert!(higher.is_ok_and(|higher| higher.is_empty()));

    let Ok(stored) = RoleRepository::get_by_name(services.store.as_ref(), &channel_user).await
    else {
        panic!("retired role should still be readable");
    };
    let resolved = services.roles.get_role_by_name(&channel_user).await;
    assert!(resolved.is_ok_and(|role| role.permissions == stored.permissions));
}

#[tokio::test]
async fn team_scheme_channel_roles_are_returned_as_stored() {
    let services = migrated().await;
    let team_scheme = create_scheme(&services, "engineering", SchemeScope::Team).await;
    services.store.add_team("team1", Some(&team_scheme.id)).await;
    services.store.add_channel("channel1", "team1", None).await;

    for slot in [SchemeRoleSlot::Guest, SchemeRoleSlot::User, SchemeRoleSlot::Admin] {
        let name = slot_role(&team_scheme, SchemeScope::Channel, slot);
        let Ok(stored) = RoleRepository::get_by_name(services.store.as_ref(), &name).await else {
            panic!("team scheme role {name} missing");
        };
        assert!(stored.scheme_managed);

        let Ok(resolved) = services.roles.get_role_by_name(&name).await else {
            panic!("team scheme role {name} should resolve");
        };
        assert_eq!(resolved.permissions, stored.permissions);
    }
}

#[tokio::test]
async fn missing_higher_scope_role_fails_the_lookup() {
    let services = migrated().await;
    let channel_scheme = create_scheme(&services, "announcements", SchemeScope::Channel).await;
    services.store.add_team("team1", None).await;
    services
        .store
        .add_channel("channel1", "team1", Some(&channel_scheme.id))
        .await;
    services
        .store
        .state
        .write()
        .await
        .roles
        .retain(|_, role| role.name != "channel_guest");
    let channel_user = slot_role(&channel_scheme, SchemeScope::Channel, SchemeRoleSlot::User);

    let higher = services
        .store
        .channel_higher_scoped_permissions(std::slice::from_ref(&channel_user))
        .await;
    assert!(matches!(higher, Err(StoreError::NotFound { .. })));
    assert!(services.roles.get_role_by_name(&channel_user).await.is_err());
}

#[tokio::test]
async fn failed_scheme_insert_leaves_no_roles_behind() {
    let store = InMemoryPermissionStore::new();
    let mut scheme = Scheme::new("Broken", SchemeScope::Team);
    scheme.name = "broken".to_owned();
    let roles = vec![
        Role::new("duplicate_role", "First", ["create_post"]),
        Role::new("duplicate_role", "Second", ["create_post"]),
    ];

    let result = store.save_new(scheme, roles).await;

    assert!(matches!(result, Err(StoreError::Conflict { .. })));
    assert!(store.get_all().await.is_ok_and(|roles| roles.is_empty()));
    assert!(matches!(
        SchemeRepository::get_by_name(&store, "broken").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn members_are_listed_in_key_order_after_a_cursor() {
    let store = InMemoryPermissionStore::new();
    for (parent, principal) in [("team2", "alice"), ("team1", "carol"), ("team1", "bob")] {
        store
            .add_member(
                MembershipScope::Team,
                MembershipKey::new(parent, principal),
                "",
                SchemeFlags::default(),
            )
            .await;
    }

    let Ok(first) = store.list_members_after(MembershipScope::Team, None, 2).await else {
        panic!("listing should succeed");
    };
    let keys: Vec<MembershipKey> = first.iter().map(|record| record.key.clone()).collect();
    assert_eq!(
        keys,
        vec![MembershipKey::new("team1", "bob"), MembershipKey::new("team1", "carol")]
    );

    let rest = store
        .list_members_after(MembershipScope::Team, keys.last(), 2)
        .await;
    assert!(rest.is_ok_and(|records| {
        records.len() == 1 && records[0].key == MembershipKey::new("team2", "alice")
    }));
    assert!(
        store
            .list_members_after(MembershipScope::Channel, None, 10)
            .await
            .is_ok_and(|records| records.is_empty())
    );
}

#[tokio::test]
async fn unknown_members_are_not_found() {
    let store = InMemoryPermissionStore::new();

    let result = store
        .get_member(MembershipScope::Team, &MembershipKey::new("team1", "nobody"))
        .await;

    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}
