//! Tenant identity resolution.
//!
//! Every row is partitioned by tenant. A user acting inside an organization
//! works in the organization's tenant; a user without one works in a personal
//! tenant keyed by their own user id.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The authenticated caller as reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Option<String>,
    pub org_id: Option<String>,
}

impl Principal {
    pub fn new(user_id: Option<String>, org_id: Option<String>) -> Self {
        Self { user_id, org_id }
    }

    /// Resolve the tenant id: organization if present, otherwise the user.
    ///
    /// A caller without a user id is rejected even if an organization is set.
    pub fn tenant_id(&self) -> Result<&str, CoreError> {
        let user = non_blank(self.user_id.as_deref()).ok_or(CoreError::Unauthorized)?;
        Ok(non_blank(self.org_id.as_deref()).unwrap_or(user))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
