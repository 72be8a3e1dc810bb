use std::collections::HashMap;

use async_trait::async_trait;

use huddle_core::StoreResult;
use huddle_domain::{
    MembershipKey, MembershipRecord, MembershipScope, MembershipUpdate, PostEditSettings, Role,
    RolePermissions, Scheme, SystemEntry,
};

/// Repository port for persisted roles.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Loads a role by store id.
    async fn get(&self, role_id: &str) -> StoreResult<Role>;

    /// Loads a role by its unique name.
    async fn get_by_name(&self, name: &str) -> StoreResult<Role>;

    /// Loads every role whose name is listed. Missing names are skipped.
    async fn get_by_names(&self, names: &[String]) -> StoreResult<Vec<Role>>;

    /// Loads every role.
    async fn get_all(&self) -> StoreResult<Vec<Role>>;

    /// Inserts a role without id, or updates the role carrying `role.id`.
    ///
    /// Inserting a name that already exists returns `StoreError::Conflict`.
    async fn save(&self, role: Role) -> StoreResult<Role>;

    /// Returns, for each listed role backing a channel scheme, the permissions
    /// of the same slot one scope higher, keyed by role name.
    async fn channel_higher_scoped_permissions(
        &self,
        role_names: &[String],
    ) -> StoreResult<HashMap<String, RolePermissions>>;
}

/// Repository port for persisted schemes.
#[async_trait]
pub trait SchemeRepository: Send + Sync {
    /// Loads a scheme by store id.
    async fn get(&self, scheme_id: &str) -> StoreResult<Scheme>;

    /// Loads a scheme by its unique name.
    async fn get_by_name(&self, name: &str) -> StoreResult<Scheme>;

    /// Writes a new scheme together with its backing roles in one transaction.
    async fn save_new(&self, scheme: Scheme, backing_roles: Vec<Role>) -> StoreResult<Scheme>;

    /// Updates an existing scheme.
    async fn save(&self, scheme: Scheme) -> StoreResult<Scheme>;

    /// Soft-deletes a scheme and its backing roles.
    async fn delete(&self, scheme_id: &str) -> StoreResult<Scheme>;
}

/// Repository port for the flat system ledger.
#[async_trait]
pub trait SystemRepository: Send + Sync {
    /// Loads an entry, returning `StoreError::NotFound` when absent.
    async fn get_by_name(&self, name: &str) -> StoreResult<SystemEntry>;

    /// Writes an entry. Existing entries are left untouched.
    async fn save(&self, entry: SystemEntry) -> StoreResult<()>;
}

/// Repository port for team and channel memberships.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Loads one membership joined with the scheme defaults that apply to it.
    async fn get_member(
        &self,
        scope: MembershipScope,
        key: &MembershipKey,
    ) -> StoreResult<MembershipRecord>;

    /// Lists memberships ordered by key, strictly after `after`.
    async fn list_members_after(
        &self,
        scope: MembershipScope,
        after: Option<&MembershipKey>,
        limit: usize,
    ) -> StoreResult<Vec<MembershipRecord>>;

    /// Persists the role columns of one membership.
    async fn update_member(&self, update: MembershipUpdate) -> StoreResult<()>;
}

/// Repository port for server settings touched by migrations.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads the post editing settings.
    async fn post_edit_settings(&self) -> StoreResult<PostEditSettings>;

    /// Persists the post editing settings.
    async fn save_post_edit_settings(&self, settings: PostEditSettings) -> StoreResult<()>;
}
