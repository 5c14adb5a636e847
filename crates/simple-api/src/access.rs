//! Request access rules
//!
//! An ordered list of (method, path pattern, access) rules evaluated before
//! dispatch. The first matching rule wins; requests no rule matches get the
//! default access.

use http::Method;

pub const API_PUBLIC: &str = "/api/public";
pub const API_PRIVATE: &str = "/api/private";
pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Dispatch without looking at credentials
    PermitAll,
    /// Dispatch only after the gate grants a verdict
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// Matches the prefix itself and everything below it
    Prefix(String),
    Any,
}

impl PathPattern {
    /// Parse `/exact`, `/prefix/**` or `/**`
    pub fn parse(pattern: &str) -> Self {
        if pattern == "/**" {
            return Self::Any;
        }

        match pattern.strip_suffix("/**") {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => {
                path == p
                    || path
                        .strip_prefix(p.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    /// `None` matches every method
    pub method: Option<Method>,
    pub path: PathPattern,
    pub access: Access,
}

impl AccessRule {
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map(|m| m == method).unwrap_or(true) && self.path.matches(path)
    }
}

#[derive(Debug, Clone)]
pub struct AccessRules {
    rules: Vec<AccessRule>,
    default: Access,
}

impl AccessRules {
    pub fn new(default: Access) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Append a rule; earlier rules take precedence.
    pub fn rule(mut self, method: Option<Method>, pattern: &str, access: Access) -> Self {
        self.rules.push(AccessRule {
            method,
            path: PathPattern::parse(pattern),
            access,
        });
        self
    }

    /// Rules for the service's endpoints. Anything not listed requires
    /// authentication.
    pub fn service_defaults(metrics_enabled: bool) -> Self {
        let rules = Self::new(Access::Authenticated)
            .rule(Some(Method::GET), API_PRIVATE, Access::Authenticated)
            .rule(Some(Method::GET), API_PUBLIC, Access::PermitAll);

        if metrics_enabled {
            rules.rule(Some(Method::GET), METRICS_PATH, Access::PermitAll)
        } else {
            rules
        }
    }

    pub fn evaluate(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.access)
            .unwrap_or(self.default)
    }
}
