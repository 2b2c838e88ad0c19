//! Permission evaluation over the rule set carried inside a credential.
//!
//! A rule maps an HTTP method name to a list of path-prefix patterns.
//! Patterns may contain `{placeholder}` segments; those are stripped before
//! comparison, so `/api/v1/employees/{id}` authorizes every path under
//! `/api/v1/employees`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base prefix of the second-factor enrollment endpoints. Reachable on any
/// parsed credential, including the permissionless one issued before
/// enrollment completes.
pub const TWO_FACTOR_PREFIX: &str = "/2fa";

/// Method name -> allowed path-prefix patterns, wire-compatible with
/// `[{"GET": ["/api/v1/employees"]}, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionRule(pub BTreeMap<String, Vec<String>>);

/// Decide whether `method` on `path` is allowed by `rules`.
///
/// Rules are evaluated in caller order; the first pattern whose normalized
/// form is a string prefix of the normalized path wins. Method names match
/// exactly (case-sensitive). An empty rule set denies everything except the
/// two-factor endpoints.
pub fn has_permission(method: &str, path: &str, rules: &[PermissionRule]) -> bool {
    let normalized_path = normalize_path(path);

    if normalized_path.starts_with(TWO_FACTOR_PREFIX) {
        return true;
    }

    for rule in rules {
        let Some(patterns) = rule.0.get(method) else {
            continue;
        };
        for pattern in patterns {
            let normalized_pattern = normalize_pattern(pattern);
            if normalized_path.starts_with(&normalized_pattern) {
                tracing::debug!(
                    method = %method,
                    path = %normalized_path,
                    pattern = %normalized_pattern,
                    "Permission rule matched"
                );
                return true;
            }
        }
    }

    false
}

/// Ensure a leading slash and strip one trailing slash (root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Normalize a rule pattern: leading slash, `{...}` placeholder segments
/// removed, repeated slashes collapsed, trailing slash stripped.
fn normalize_pattern(pattern: &str) -> String {
    let segments: Vec<&str> = pattern
        .split('/')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !(segment.starts_with('{') && segment.ends_with('}')))
        .collect();
    format!("/{}", segments.join("/"))
}
