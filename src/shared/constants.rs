// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Super admin role - full access, including changing the default category
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Admin role - can manage blog categories
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// CATEGORY CONSTANTS
// =============================================================================

/// Maximum number of ids accepted in a comma separated query parameter
pub const MAX_ID_LIST_LENGTH: usize = 500;
