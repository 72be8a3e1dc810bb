use huddle_domain::SchemeRoleSlot;

use super::*;

#[derive(Debug, FromRow)]
struct HigherScopedRow {
    guest_role: Option<String>,
    user_role: Option<String>,
    admin_role: Option<String>,
    higher_guest_role: String,
    higher_user_role: String,
    higher_admin_role: String,
    guest_permissions: Option<Vec<String>>,
    user_permissions: Option<Vec<String>>,
    admin_permissions: Option<Vec<String>>,
}

impl PostgresRoleRepository {
    /// Resolves, in one query, the permissions of the team scheme roles (or the
    /// system channel roles when the team has no scheme) sitting above each
    /// channel scheme whose slots name one of `role_names`.
    pub(super) async fn channel_higher_scoped_permissions_impl(
        &self,
        role_names: &[String],
    ) -> StoreResult<HashMap<String, RolePermissions>> {
        if role_names.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, HigherScopedRow>(
            r#"
            SELECT
                role_schemes.default_channel_guest_role AS guest_role,
                role_schemes.default_channel_user_role AS user_role,
                role_schemes.default_channel_admin_role AS admin_role,
                higher.guest_role AS higher_guest_role,
                higher.user_role AS higher_user_role,
                higher.admin_role AS higher_admin_role,
                guest_roles.permissions AS guest_permissions,
                user_roles.permissions AS user_permissions,
                admin_roles.permissions AS admin_permissions
            FROM schemes AS role_schemes
            LEFT JOIN LATERAL (
                SELECT
                    team_schemes.default_channel_guest_role,
                    team_schemes.default_channel_user_role,
                    team_schemes.default_channel_admin_role
                FROM channels
                INNER JOIN teams
                    ON teams.id = channels.team_id
                INNER JOIN schemes AS team_schemes
                    ON team_schemes.id = teams.scheme_id
                    AND team_schemes.delete_at = 0
                WHERE channels.scheme_id = role_schemes.id
                ORDER BY channels.id
                LIMIT 1
            ) AS parent_scheme ON TRUE
            CROSS JOIN LATERAL (
                SELECT
                    COALESCE(parent_scheme.default_channel_guest_role, 'channel_guest') AS guest_role,
                    COALESCE(parent_scheme.default_channel_user_role, 'channel_user') AS user_role,
                    COALESCE(parent_scheme.default_channel_admin_role, 'channel_admin') AS admin_role
            ) AS higher
            LEFT JOIN roles AS guest_roles
                ON guest_roles.name = higher.guest_role
            LEFT JOIN roles AS user_roles
                ON user_roles.name = higher.user_role
            LEFT JOIN roles AS admin_roles
                ON admin_roles.name = higher.admin_role
            WHERE role_schemes.scope = 'channel'
                AND role_schemes.delete_at = 0
                AND (
                    role_schemes.default_channel_guest_role = ANY($1)
                    OR role_schemes.default_channel_user_role = ANY($1)
                    OR role_schemes.default_channel_admin_role = ANY($1)
                )
            "#,
        )
        .bind(role_names)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_read_error(error, "failed to load higher scoped permissions"))?;

        let mut higher_scoped = HashMap::new();
        for row in rows {
            let slots = [
                (
                    row.guest_role,
                    SchemeRoleSlot::Guest,
                    row.higher_guest_role,
                    row.guest_permissions,
                ),
                (
                    row.user_role,
                    SchemeRoleSlot::User,
                    row.higher_user_role,
                    row.user_permissions,
                ),
                (
                    row.admin_role,
                    SchemeRoleSlot::Admin,
                    row.higher_admin_role,
                    row.admin_permissions,
                ),
            ];

            for (name, slot, higher_name, permissions) in slots {
                let permissions =
                    permissions.ok_or_else(|| StoreError::not_found("Role", higher_name))?;
                let Some(name) = name.filter(|name| role_names.contains(name)) else {
                    continue;
                };

                higher_scoped.insert(
                    name,
                    RolePermissions {
                        slot,
                        permissions: permissions.into_iter().collect(),
                    },
                );
            }
        }

        Ok(higher_scoped)
    }
}
