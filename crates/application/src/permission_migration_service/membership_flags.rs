use huddle_domain::{MembershipKey, MembershipScope, MembershipUpdate};

use super::*;

impl PermissionMigrationService {
    /// Rewrites every membership so legacy global role tokens become scheme
    /// flags and the role column holds explicit roles only.
    pub async fn migrate_membership_scheme_flags(&self) -> AppResult<()> {
        for scope in [MembershipScope::Team, MembershipScope::Channel] {
            let mut after: Option<MembershipKey> = None;
            let mut rewritten = 0_usize;

            loop {
                let batch = self
                    .memberships
                    .list_members_after(scope, after.as_ref(), self.membership_batch_size)
                    .await
                    .map_err(|error| {
                        AppError::from_store(
                            "MigrateMembershipSchemeFlags",
                            "app.member.get.app_error",
                            error,
                        )
                    })?;

                let Some(last) = batch.last() else {
                    break;
                };
                after = Some(last.key.clone());

                for record in &batch {
                    let resolved = record.resolve();
                    let explicit_roles = resolved.explicit_roles_string();
                    if explicit_roles == record.roles && resolved.flags == record.flags {
                        continue;
                    }

                    self.memberships
                        .update_member(MembershipUpdate {
                            scope,
                            key: record.key.clone(),
                            explicit_roles,
                            flags: resolved.flags,
                        })
                        .await
                        .map_err(|error| {
                            AppError::from_store(
                                "MigrateMembershipSchemeFlags",
                                "app.member.update.app_error",
                                error,
                            )
                        })?;
                    rewritten += 1;
                }

                if batch.len() < self.membership_batch_size {
                    break;
                }
            }

            info!(scope = scope.as_str(), rewritten, "membership role columns reconciled");
        }

        Ok(())
    }
}
