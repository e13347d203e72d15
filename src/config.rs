//! Runtime configuration for the listing layer.
//!
//! All knobs live on one [`ListConfig`] value that is passed into the
//! operations explicitly. Embedding applications construct it once at startup
//! (optionally from `CRUDLIST_*` environment variables) and hand it to their
//! [`ListOperations`](crate::ListOperations) implementation — there are no
//! ambient globals to override.

use serde::Deserialize;

/// Configuration and default-policy values for list and record operations.
///
/// The cache fields are declared for embedding applications that want to key
/// response caches consistently; the pipeline itself does not cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Page size used when the request does not specify `per_page`.
    pub default_per_page: u64,
    /// Effective page size ceiling; larger requests are clamped, not rejected.
    pub max_per_page: u64,
    /// Absolute `per_page` bound enforced by validation (422 above this).
    pub per_page_hard_cap: u64,
    /// Highest page number a request may address.
    pub max_page: u64,
    /// Sort direction applied when no sort is requested at all.
    pub default_sort_direction: String,
    /// Echo the sanitized request parameters back in failure envelopes.
    pub echo_request_data: bool,
    /// Duplicate the HTTP status code inside the envelope body.
    pub include_response_code: bool,
    /// Whether queries see soft-deleted rows unless the request says otherwise.
    pub include_trashed_by_default: bool,
    /// Whether deletions bypass soft delete unless the request says otherwise.
    pub force_delete_by_default: bool,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_prefix: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 100,
            per_page_hard_cap: 1000,
            max_page: 100_000,
            default_sort_direction: "DESC".to_string(),
            echo_request_data: false,
            include_response_code: false,
            include_trashed_by_default: false,
            force_delete_by_default: false,
            cache_enabled: false,
            cache_ttl_secs: 300,
            cache_prefix: "crudlist".to_string(),
        }
    }
}

impl ListConfig {
    /// Build a config from `CRUDLIST_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_u64("CRUDLIST_DEFAULT_PER_PAGE") {
            config.default_per_page = v;
        }
        if let Some(v) = env_u64("CRUDLIST_MAX_PER_PAGE") {
            config.max_per_page = v;
        }
        if let Some(v) = env_u64("CRUDLIST_PER_PAGE_HARD_CAP") {
            config.per_page_hard_cap = v;
        }
        if let Some(v) = env_u64("CRUDLIST_MAX_PAGE") {
            config.max_page = v;
        }
        if let Ok(v) = std::env::var("CRUDLIST_DEFAULT_SORT_DIRECTION") {
            let upper = v.to_uppercase();
            if upper == "ASC" || upper == "DESC" {
                config.default_sort_direction = upper;
            }
        }
        if let Some(v) = env_bool("CRUDLIST_ECHO_REQUEST_DATA") {
            config.echo_request_data = v;
        }
        if let Some(v) = env_bool("CRUDLIST_INCLUDE_RESPONSE_CODE") {
            config.include_response_code = v;
        }
        if let Some(v) = env_bool("CRUDLIST_INCLUDE_TRASHED") {
            config.include_trashed_by_default = v;
        }
        if let Some(v) = env_bool("CRUDLIST_FORCE_DELETE") {
            config.force_delete_by_default = v;
        }
        if let Some(v) = env_bool("CRUDLIST_CACHE_ENABLED") {
            config.cache_enabled = v;
        }
        if let Some(v) = env_u64("CRUDLIST_CACHE_TTL_SECS") {
            config.cache_ttl_secs = v;
        }
        if let Ok(v) = std::env::var("CRUDLIST_CACHE_PREFIX") {
            config.cache_prefix = v;
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    Some(crate::sanitize::parse_bool_str(&raw))
}
