//! Query-string coercion for the metrics endpoints
//!
//! Parameters are forgiving: anything that is not a positive integer falls
//! back to the default instead of failing the request.

use std::collections::HashMap;

/// A positive integer query parameter with a default and an upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    /// Parameter name in the query string
    pub name: &'static str,
    /// Value used when the parameter is absent or invalid
    pub default: u32,
    /// Largest accepted value; larger values are clamped
    pub max: u32,
}

/// `limit` on `/api/metrics/errors`
pub const ERRORS_LIMIT: QueryParam = QueryParam {
    name: "limit",
    default: 10,
    max: 500,
};

/// `days` on `/api/metrics/usage`
pub const USAGE_DAYS: QueryParam = QueryParam {
    name: "days",
    default: 30,
    max: 366,
};

/// `limit` on `/api/metrics/users`
pub const USERS_LIMIT: QueryParam = QueryParam {
    name: "limit",
    default: 10,
    max: 500,
};

/// `limit` on `/api/metrics/apps`
pub const APPS_LIMIT: QueryParam = QueryParam {
    name: "limit",
    default: 20,
    max: 500,
};

/// `limit` on `/api/metrics/actions`
pub const ACTIONS_LIMIT: QueryParam = QueryParam {
    name: "limit",
    default: 20,
    max: 500,
};

/// `minutes` on `/api/metrics/real-time`
pub const REAL_TIME_MINUTES: QueryParam = QueryParam {
    name: "minutes",
    default: 60,
    max: 60,
};

impl QueryParam {
    /// Read and coerce this parameter from a parsed query string
    #[must_use]
    pub fn read(&self, params: &HashMap<String, String>) -> u32 {
        coerce(params.get(self.name).map(String::as_str), self.default, self.max)
    }
}

/// Positive integer in `raw`, clamped to `max`, else `default`
#[must_use]
pub fn coerce(raw: Option<&str>, default: u32, max: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&value| value > 0)
        .map_or(default, |value| {
            u32::try_from(value.min(u64::from(max))).unwrap_or(max)
        })
}
