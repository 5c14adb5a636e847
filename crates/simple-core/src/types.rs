//! Request-scoped authentication values
//!
//! None of these are persisted. Credentials live for one gate decision and
//! are dropped with the request.

use std::fmt;

// ============================================================================
// Credentials
// ============================================================================

/// Username/password pair taken from a Basic `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True when either half is empty or whitespace-only.
    ///
    /// Directories accept a bind with an empty password as an anonymous
    /// bind, so such credentials must never reach the directory.
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Distinguished Name
// ============================================================================

/// Directory entry identifier, e.g. `uid=bgates,dc=mycompany,dc=com`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistinguishedName(String);

impl DistinguishedName {
    pub fn new(dn: impl Into<String>) -> Self {
        Self(dn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Bind Result
// ============================================================================

/// Outcome of a simple bind the directory actually answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBindResult {
    pub success: bool,
    /// DN the session was established as
    pub principal: Option<String>,
    /// LDAP result code returned by the directory
    pub result_code: u32,
}

impl DirectoryBindResult {
    pub fn bound(dn: &DistinguishedName) -> Self {
        Self {
            success: true,
            principal: Some(dn.to_string()),
            result_code: 0,
        }
    }

    pub fn rejected(result_code: u32) -> Self {
        Self {
            success: false,
            principal: None,
            result_code,
        }
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Binary answer handed to the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthVerdict {
    pub authenticated: bool,
    pub principal: Option<String>,
}

impl AuthVerdict {
    pub fn granted(principal: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            principal: Some(principal.into()),
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }
}

impl<E> From<std::result::Result<String, E>> for AuthVerdict {
    fn from(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(principal) => Self::granted(principal),
            Err(_) => Self::denied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials() {
        assert!(Credentials::new("", "").is_blank());
        assert!(Credentials::new(" ", " ").is_blank());
        assert!(Credentials::new("bgates", "").is_blank());
        assert!(Credentials::new("\t", "123").is_blank());
        assert!(!Credentials::new("bgates", "123").is_blank());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("bgates", "123");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("bgates"));
        assert!(!printed.contains("123"));
    }

    #[test]
    fn test_verdict_from_result() {
        let ok: std::result::Result<String, ()> = Ok("bgates".to_string());
        let verdict = AuthVerdict::from(ok);
        assert!(verdict.authenticated);
        assert_eq!(verdict.principal.as_deref(), Some("bgates"));

        let err: std::result::Result<String, ()> = Err(());
        assert_eq!(AuthVerdict::from(err), AuthVerdict::denied());
    }

    #[test]
    fn test_bind_result_constructors() {
        let dn = DistinguishedName::new("uid=bgates,dc=mycompany,dc=com");
        let bound = DirectoryBindResult::bound(&dn);
        assert!(bound.success);
        assert_eq!(bound.principal.as_deref(), Some(dn.as_str()));

        let rejected = DirectoryBindResult::rejected(49);
        assert!(!rejected.success);
        assert!(rejected.principal.is_none());
    }
}
