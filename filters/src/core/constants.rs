// =============================================================================
// Rule Tree Limits
// =============================================================================

/// Maximum size of filter JSON in bytes (64KB)
pub const DEFAULT_MAX_JSON_BYTES: usize = 64 * 1024;

/// Maximum number of rule nodes in one tree
pub const DEFAULT_MAX_RULES: usize = 50;

/// Maximum nesting of composite rules
pub const DEFAULT_MAX_DEPTH: usize = 8;

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable overriding the rule node limit
pub const ENV_MAX_RULES: &str = "HAS_FILTERS_MAX_RULES";

/// Environment variable overriding the nesting limit
pub const ENV_MAX_DEPTH: &str = "HAS_FILTERS_MAX_DEPTH";

/// Environment variable overriding the JSON size limit
pub const ENV_MAX_JSON_BYTES: &str = "HAS_FILTERS_MAX_JSON_BYTES";
