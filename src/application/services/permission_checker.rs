// src/application/services/permission_checker.rs
use crate::{
    application::{error::ApplicationResult, ports::database::Database},
    domain::scope,
};
use std::sync::Arc;
use tracing::debug;

pub struct PermissionChecker {
    database: Arc<dyn Database>,
}

impl PermissionChecker {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// True when the user holds the `resource:permission` scope directly or
    /// through a group. Unknown users, resources or permissions yield false.
    pub async fn user_has_scope_permission(
        &self,
        user_id: i64,
        scope_str: &str,
    ) -> ApplicationResult<bool> {
        let Some((resource_identifier, permission_identifier)) =
            scope::parse_resource_permission(scope_str)
        else {
            debug!(scope = %scope_str, "not a resource:permission scope");
            return Ok(false);
        };

        let Some(mut user) = self.database.get_user_by_id(user_id).await? else {
            return Ok(false);
        };
        self.database.user_load_permissions(&mut user).await?;
        self.database.user_load_groups(&mut user).await?;
        self.database
            .groups_load_permissions(&mut user.groups)
            .await?;

        let Some(resource) = self
            .database
            .get_resource_by_resource_identifier(resource_identifier)
            .await?
        else {
            return Ok(false);
        };

        let permissions = self
            .database
            .get_permissions_by_resource_id(resource.id)
            .await?;
        let Some(permission) = permissions
            .iter()
            .find(|p| p.permission_identifier == permission_identifier)
        else {
            return Ok(false);
        };

        let direct = user.permissions.iter().any(|p| p.id == permission.id);
        let via_group = user
            .groups
            .iter()
            .any(|g| g.permissions.iter().any(|p| p.id == permission.id));

        Ok(direct || via_group)
    }
}
