/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Teacher role - fills report submissions, never distributes
pub const ROLE_TEACHER: &str = "teacher";

/// Coordinator role - receives reports from the principal and hands them to teachers
pub const ROLE_COORDINATOR: &str = "coordinator";

/// Principal role - top of the distribution hierarchy
pub const ROLE_PRINCIPAL: &str = "principal";

/// Admin role - same distribution authority as the principal
pub const ROLE_ADMIN: &str = "admin";
