//! LDAP configuration and user DN resolution

use simple_core::config::{validate_dn_pattern, LdapConfigSection};
use simple_core::types::DistinguishedName;
use simple_core::{Error, Result, DN_PLACEHOLDER};
use std::time::Duration;

// ============================================================================
// LDAP Configuration
// ============================================================================

/// Validated directory settings
///
/// Built once from [`LdapConfigSection`] at startup; every field the
/// section leaves optional but the service requires is resolved here.
#[derive(Debug, Clone)]
pub struct LdapConfig {
    /// Directory URL (ldap:// or ldaps://)
    pub url: String,

    /// Base DN user entries live under
    pub base_dn: String,

    /// Manager DN for connection checks; anonymous when unset
    pub manager_dn: Option<String>,

    pub manager_password: Option<String>,

    /// User DN pattern, e.g. "uid={0}"
    pub user_dn_pattern: String,

    /// Use STARTTLS for connection upgrade
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    pub skip_tls_verify: bool,

    /// Bound on a whole directory operation, connect included
    pub timeout_seconds: u64,
}

impl LdapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Build the DN resolver for this directory.
    pub fn dn_resolver(&self) -> Result<DnResolver> {
        DnResolver::new(&self.user_dn_pattern, Some(&self.base_dn))
    }
}

impl TryFrom<&LdapConfigSection> for LdapConfig {
    type Error = Error;

    fn try_from(section: &LdapConfigSection) -> Result<Self> {
        section.validate()?;

        let required = |value: &Option<String>, key: &str| {
            value
                .as_deref()
                .map(|v| v.trim().to_string())
                .ok_or_else(|| Error::Configuration(format!("{} is required", key)))
        };

        Ok(Self {
            url: required(&section.url, "ldap.url")?,
            base_dn: required(&section.base_dn, "ldap.base_dn")?,
            manager_dn: section.manager_dn.clone(),
            manager_password: section.manager_password.clone(),
            user_dn_pattern: required(&section.user_dn_pattern, "ldap.user_dn_pattern")?,
            start_tls: section.start_tls,
            skip_tls_verify: section.skip_tls_verify,
            timeout_seconds: section.timeout_seconds,
        })
    }
}

// ============================================================================
// DN Resolver
// ============================================================================

/// Maps a username onto a user DN
///
/// Pure string substitution of the `{0}` placeholder. Directory-special
/// characters in the username are not escaped here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnResolver {
    /// Fully qualified pattern, base DN already applied
    pattern: String,
}

impl DnResolver {
    /// Patterns are relative to the base DN unless they already end with it.
    pub fn new(pattern: &str, base_dn: Option<&str>) -> Result<Self> {
        validate_dn_pattern(pattern)?;

        let base = base_dn.map(str::trim).filter(|b| !b.is_empty());
        let pattern = match base {
            Some(base) if !is_under_base(pattern, base) => format!("{},{}", pattern, base),
            _ => pattern.to_string(),
        };

        Ok(Self { pattern })
    }

    pub fn resolve(&self, username: &str) -> DistinguishedName {
        DistinguishedName::new(self.pattern.replacen(DN_PLACEHOLDER, username, 1))
    }
}

/// `pattern` ends with `,<base>`, compared without regard to ASCII case.
fn is_under_base(pattern: &str, base: &str) -> bool {
    let suffix_len = base.len() + 1;
    if pattern.len() < suffix_len || !pattern.is_char_boundary(pattern.len() - suffix_len) {
        return false;
    }

    let (head, tail) = pattern.split_at(pattern.len() - suffix_len);
    head.contains(DN_PLACEHOLDER) && tail.starts_with(',') && tail[1..].eq_ignore_ascii_case(base)
}
