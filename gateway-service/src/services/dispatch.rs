use std::collections::HashMap;

use crate::config::UpstreamConfig;

/// Depth of the path prefix used as the dispatch key.
const KEY_SEGMENTS: usize = 3;

/// Derive the dispatch key for a request path: the first three non-empty
/// segments, rejoined with a leading slash. Identical for every verb.
pub fn dispatch_key(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(KEY_SEGMENTS)
        .collect();
    format!("/{}", segments.join("/"))
}

/// Static mapping from dispatch key to backend base address.
///
/// Built once at startup and never mutated; concurrent request tasks read it
/// without synchronization.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<String, String>,
}

impl DispatchTable {
    pub fn from_config(upstream: &UpstreamConfig) -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            "/api/v1/employees".to_string(),
            upstream.employees_url.trim_end_matches('/').to_string(),
        );
        routes.insert(
            "/api/v1/schedules".to_string(),
            upstream.schedules_url.trim_end_matches('/').to_string(),
        );
        routes.insert(
            "/api/v1/tracking".to_string(),
            upstream.tracking_url.trim_end_matches('/').to_string(),
        );
        Self { routes }
    }

    /// Base address of the backend configured for `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.routes.get(&dispatch_key(path)).map(String::as_str)
    }
}
