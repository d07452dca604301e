use serde::{Deserialize, Serialize};

use crate::shared::constants::{ROLE_ADMIN, ROLE_SUPER_ADMIN};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub account_id: String,
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_uid: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }

    /// Admin-level access: `admin` or `super_admin`
    pub fn has_admin_access(&self) -> bool {
        self.is_super_admin() || self.has_role(ROLE_ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use crate::shared::test_helpers::{
        create_admin_user, create_super_admin_user, create_user_with_roles,
    };

    #[test]
    fn test_super_admin_has_admin_access() {
        let user = create_super_admin_user();
        assert!(user.is_super_admin());
        assert!(user.has_admin_access());
    }

    #[test]
    fn test_admin_is_not_super_admin() {
        let user = create_admin_user();
        assert!(!user.is_super_admin());
        assert!(user.has_admin_access());
    }

    #[test]
    fn test_reader_has_no_admin_access() {
        let user = create_user_with_roles(&["reader"]);
        assert!(!user.has_admin_access());
        assert!(!user.has_role("admin"));
    }
}
