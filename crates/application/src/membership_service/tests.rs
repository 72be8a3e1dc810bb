use std::sync::Arc;

use huddle_core::ErrorKind;
use huddle_domain::{
    MembershipKey, MembershipRecord, MembershipScope, Role, SchemeDefaults, SchemeFlags,
};

use crate::test_support::FakeStore;

use super::MembershipService;

fn key() -> MembershipKey {
    MembershipKey::new("channel1", "user1")
}

fn channel_member(roles: &str, flags: SchemeFlags) -> MembershipRecord {
    MembershipRecord {
        scope: MembershipScope::Channel,
        key: key(),
        roles: roles.to_owned(),
        flags,
        team_scheme_defaults: SchemeDefaults::default(),
        channel_scheme_defaults: SchemeDefaults::default(),
    }
}

async fn store_with(record: MembershipRecord) -> Arc<FakeStore> {
    let store = Arc::new(FakeStore::default());
    store.seed_default_roles().await;
    store
        .seed_role(Role::new("custom_role", "Custom", ["create_post"]))
        .await;
    store.members.lock().await.push(record);
    store
}

fn service_with(store: &Arc<FakeStore>) -> MembershipService {
    MembershipService::new(store.clone(), store.clone())
}

#[tokio::test]
async fn get_member_folds_legacy_tokens_into_flags() {
    let store = store_with(channel_member(
        "channel_user channel_admin custom_role",
        SchemeFlags::default(),
    ))
    .await;
    let service = service_with(&store);

    let member = service.get_member(MembershipScope::Channel, &key()).await;

    let Ok(member) = member else {
        panic!("member should load");
    };
    assert_eq!(member.roles, "custom_role channel_user channel_admin");
    assert_eq!(member.explicit_roles, "custom_role");
    assert!(member.scheme_user && member.scheme_admin && !member.scheme_guest);
}

#[tokio::test]
async fn get_member_prefers_channel_scheme_over_team_scheme() {
    let mut record = channel_member(
        "",
        SchemeFlags {
            user: true,
            ..SchemeFlags::default()
        },
    );
    record.team_scheme_defaults.user = Some("team_scheme_channel_user".to_owned());
    record.team_scheme_defaults.admin = Some("team_scheme_channel_admin".to_owned());
    record.channel_scheme_defaults.user = Some("channel_scheme_user".to_owned());
    let store = store_with(record).await;
    let service = service_with(&store);

    let member = service.get_member(MembershipScope::Channel, &key()).await;

    assert!(member.is_ok_and(|member| member.roles == "channel_scheme_user"));
}

#[tokio::test]
async fn get_member_reports_missing_rows() {
    let store = store_with(channel_member("", SchemeFlags::default())).await;
    let service = service_with(&store);

    let result = service
        .get_member(MembershipScope::Team, &MembershipKey::new("team1", "user1"))
        .await;

    assert!(matches!(result, Err(ref error) if error.kind() == ErrorKind::NotFound));
}

#[tokio::test]
async fn update_member_roles_splits_flags_from_explicit_roles() {
    let mut record = channel_member("", SchemeFlags::default());
    record.channel_scheme_defaults.user = Some("channel_scheme_user".to_owned());
    let store = store_with(record).await;
    let service = service_with(&store);

    let member = service
        .update_member_roles(
            MembershipScope::Channel,
            &key(),
            "channel_scheme_user channel_admin custom_role custom_role",
        )
        .await;

    let Ok(member) = member else {
        panic!("update should succeed");
    };
    assert!(member.scheme_user && member.scheme_admin);
    assert_eq!(member.explicit_roles, "custom_role");
    assert_eq!(member.roles, "custom_role channel_scheme_user channel_admin");

    let stored = store.members.lock().await.clone();
    assert_eq!(stored[0].roles, "custom_role");
    assert!(stored[0].flags.user && stored[0].flags.admin);
}

#[tokio::test]
async fn update_member_roles_rejects_guest_with_user() {
    let store = store_with(channel_member("custom_role", SchemeFlags::default())).await;
    let service = service_with(&store);

    let result = service
        .update_member_roles(MembershipScope::Channel, &key(), "channel_guest channel_user")
        .await;

    assert!(matches!(result, Err(ref error) if error.kind() == ErrorKind::InvalidInput));
    assert_eq!(store.members.lock().await[0].roles, "custom_role");
}

#[tokio::test]
async fn update_member_roles_rejects_scheme_managed_roles() {
    let store = store_with(channel_member("", SchemeFlags::default())).await;
    let mut managed = Role::new("other_scheme_user", "Channel User Role for Scheme x", ["create_post"]);
    managed.scheme_managed = true;
    store.seed_role(managed).await;
    let service = service_with(&store);

    let result = service
        .update_member_roles(MembershipScope::Channel, &key(), "other_scheme_user")
        .await;

    assert!(matches!(
        result,
        Err(ref error) if error.message_id() == "api.update_member_roles.scheme_role.app_error"
    ));
}

#[tokio::test]
async fn update_member_roles_rejects_unknown_roles() {
    let store = store_with(channel_member("", SchemeFlags::default())).await;
    let service = service_with(&store);

    let result = service
        .update_member_roles(MembershipScope::Channel, &key(), "channel_user no_such_role")
        .await;

    assert!(matches!(result, Err(ref error) if error.kind() == ErrorKind::NotFound));
}

#[tokio::test]
async fn update_member_scheme_roles_clears_legacy_admin_token() {
    let store = store_with(channel_member(
        "channel_admin custom_role",
        SchemeFlags {
            user: true,
            ..SchemeFlags::default()
        },
    ))
    .await;
    let service = service_with(&store);

    let member = service
        .update_member_scheme_roles(
            MembershipScope::Channel,
            &key(),
            SchemeFlags {
                user: true,
                ..SchemeFlags::default()
            },
        )
        .await;

    let Ok(member) = member else {
        panic!("update should succeed");
    };
    assert!(!member.scheme_admin);
    assert_eq!(member.roles, "custom_role channel_user");
}

#[tokio::test]
async fn update_member_scheme_roles_rejects_inconsistent_flags() {
    let store = store_with(channel_member("", SchemeFlags::default())).await;
    let service = service_with(&store);

    let result = service
        .update_member_scheme_roles(
            MembershipScope::Channel,
            &key(),
            SchemeFlags {
                guest: true,
                admin: true,
                user: false,
            },
        )
        .await;

    assert!(matches!(result, Err(ref error) if error.kind() == ErrorKind::InvalidInput));
}
