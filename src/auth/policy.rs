//! Route-level access rules.
//!
//! The table is ordered and evaluated top to bottom; the first rule whose
//! method and path pattern match decides. Paths no rule covers require an
//! authenticated caller of any role.

use axum::http::Method;

use crate::types::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No principal on a protected route
    Unauthenticated,
    /// Principal present, role insufficient
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment
    Any,
    /// `**`: zero or more trailing segments
    Rest,
}

/// Slash-separated pattern. `*` matches one segment, a trailing `**` matches
/// any remainder including nothing. Empty segments are ignored on both
/// sides, so `/api/products/` and `/api/products` are the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();

        Self { segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if i >= parts.len() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
            }
            i += 1;
        }

        i == parts.len()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct Rule {
    /// `None` matches every method
    pub method: Option<Method>,
    pub pattern: PathPattern,
    pub access: Access,
}

impl Rule {
    pub fn new(method: Option<Method>, pattern: &str, access: Access) -> Self {
        Self {
            method,
            pattern: PathPattern::new(pattern),
            access,
        }
    }

    fn applies_to(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.matches(path)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<Rule>,
    default_access: Access,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            default_access: Access::Authenticated,
        }
    }

    /// The access table this service runs with.
    pub fn standard() -> Self {
        Self::new(vec![
            // Must precede the public /api/auth/** rule
            Rule::new(None, "/api/auth/me", Access::Authenticated),
            Rule::new(None, "/api/auth/**", Access::Public),
            Rule::new(Some(Method::GET), "/", Access::Public),
            Rule::new(Some(Method::GET), "/health", Access::Public),
            Rule::new(Some(Method::GET), "/api/products/**", Access::Public),
            Rule::new(Some(Method::POST), "/api/products/*/reviews", Access::Authenticated),
            Rule::new(None, "/api/admin/**", Access::Role(Role::Admin)),
        ])
    }

    pub fn required_access(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.applies_to(method, path))
            .map(|rule| rule.access)
            .unwrap_or(self.default_access)
    }

    pub fn decide(&self, method: &Method, path: &str, identity: &Identity) -> Decision {
        match (self.required_access(method, path), identity) {
            (Access::Public, _) => Decision::Allow,
            (_, Identity::Anonymous) => Decision::Unauthenticated,
            (Access::Authenticated, Identity::Authenticated(_)) => Decision::Allow,
            (Access::Role(required), Identity::Authenticated(principal)) => {
                if principal.role == required {
                    Decision::Allow
                } else {
                    Decision::Forbidden
                }
            }
        }
    }
}
