use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{DataService, Select, Table};
use crate::models::Role;

/// Decides whether the signed-in user acts as client or practitioner.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve(&self, user_id: Option<&str>) -> Role;
}

/// Always answers with the configured role.
pub struct FixedRole(pub Role);

#[async_trait]
impl RoleResolver for FixedRole {
    async fn resolve(&self, _user_id: Option<&str>) -> Role {
        self.0
    }
}

/// Reads `users.role` for the signed-in user.
pub struct StoredRoleResolver {
    data: Arc<dyn DataService>,
}

impl StoredRoleResolver {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl RoleResolver for StoredRoleResolver {
    async fn resolve(&self, user_id: Option<&str>) -> Role {
        let Some(user_id) = user_id else {
            return Role::Unknown;
        };

        let query = Select::from(Table::Users).column("role").eq("id", user_id);
        match self.data.select(&query).await {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get("role"))
                .and_then(|v| v.as_str())
                .map(Role::parse)
                .unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, user_id, "failed to resolve role");
                Role::Unknown
            }
        }
    }
}
