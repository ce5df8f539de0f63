use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::GateError;

/// RouteGroup
///
/// Partition of the navigable screens: `Public` (pre-authentication) and
/// `Protected` (requires a session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RouteGroup {
    Public,
    Protected,
}

/// segments
///
/// Splits a route path into its non-empty segments. Query strings and fragments
/// are not part of the route and are dropped.
///
/// `"/(public)/login?next=x"` → `["(public)", "login"]`
pub fn segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// RouteMap
///
/// Tells the gate which group a path belongs to and where each redirect lands.
/// Classification only ever looks at the first path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMap {
    public_root: String,
    protected_root: String,
    protected_segments: Vec<String>,
    // Empty means every non-protected path is public.
    public_segments: Vec<String>,
}

impl RouteMap {
    /// new
    ///
    /// Builds a route map and checks that each root lands in the group it is the
    /// redirect target for. A map that fails this check would let a redirect change
    /// the route without changing the decision, which is a redirect storm.
    pub fn new(
        public_root: impl Into<String>,
        protected_root: impl Into<String>,
        protected_segments: Vec<String>,
        public_segments: Vec<String>,
    ) -> Result<Self, GateError> {
        let map = Self {
            public_root: public_root.into(),
            protected_root: protected_root.into(),
            protected_segments,
            public_segments,
        };

        if map.group_of(&map.public_root) != Some(RouteGroup::Public) {
            return Err(GateError::UnstableRoot {
                path: map.public_root,
                expected: RouteGroup::Public,
            });
        }
        if map.group_of(&map.protected_root) != Some(RouteGroup::Protected) {
            return Err(GateError::UnstableRoot {
                path: map.protected_root,
                expected: RouteGroup::Protected,
            });
        }

        Ok(map)
    }

    /// The file-based app layout: `(public)` and `(protected)` route groups.
    /// Any screen outside `(protected)` counts as public.
    pub fn app() -> Self {
        Self {
            public_root: "/(public)".to_string(),
            protected_root: "/(protected)".to_string(),
            protected_segments: vec!["(protected)".to_string()],
            public_segments: vec![],
        }
    }

    /// The web layout: `/dashboard` and `/todos` need a session, `/login` is for
    /// signed-out visitors, everything else is left alone.
    pub fn web() -> Self {
        Self {
            public_root: "/login".to_string(),
            protected_root: "/dashboard".to_string(),
            protected_segments: vec!["dashboard".to_string(), "todos".to_string()],
            public_segments: vec!["login".to_string()],
        }
    }

    pub fn public_root(&self) -> &str {
        &self.public_root
    }

    pub fn protected_root(&self) -> &str {
        &self.protected_root
    }

    /// group_of
    ///
    /// Classifies a path by its first segment. `None` means the path is not gated.
    pub fn group_of(&self, path: &str) -> Option<RouteGroup> {
        let first = segments(path).first().copied().unwrap_or("");

        if self.protected_segments.iter().any(|s| s == first) {
            return Some(RouteGroup::Protected);
        }
        if self.public_segments.is_empty() || self.public_segments.iter().any(|s| s == first) {
            return Some(RouteGroup::Public);
        }
        None
    }
}
