//! Configuration for Simple Service
//!
//! Loaded once at startup from a TOML file or from `SIMPLE_SERVICE_*`
//! environment variables, validated, then shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, DEFAULT_DIRECTORY_TIMEOUT_SECS, DEFAULT_REALM, DN_PLACEHOLDER};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ldap: LdapConfigSection,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// A variable that is set but does not parse is a configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("SIMPLE_SERVICE_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }
        if let Some(port) = lookup("SIMPLE_SERVICE_PORT") {
            config.server.port = parse_var("SIMPLE_SERVICE_PORT", &port)?;
        }

        // Directory
        if let Some(url) = lookup("SIMPLE_SERVICE_LDAP_URL") {
            config.ldap.url = Some(url);
        }
        if let Some(base) = lookup("SIMPLE_SERVICE_LDAP_BASE_DN") {
            config.ldap.base_dn = Some(base);
        }
        if let Some(dn) = lookup("SIMPLE_SERVICE_LDAP_MANAGER_DN") {
            config.ldap.manager_dn = Some(dn);
        }
        if let Some(password) = lookup("SIMPLE_SERVICE_LDAP_MANAGER_PASSWORD") {
            config.ldap.manager_password = Some(password);
        }
        if let Some(pattern) = lookup("SIMPLE_SERVICE_LDAP_USER_DN_PATTERN") {
            config.ldap.user_dn_pattern = Some(pattern);
        }
        if let Some(timeout) = lookup("SIMPLE_SERVICE_LDAP_TIMEOUT_SECS") {
            config.ldap.timeout_seconds =
                parse_var("SIMPLE_SERVICE_LDAP_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(start_tls) = lookup("SIMPLE_SERVICE_LDAP_START_TLS") {
            config.ldap.start_tls = parse_flag("SIMPLE_SERVICE_LDAP_START_TLS", &start_tls)?;
        }
        if let Some(skip) = lookup("SIMPLE_SERVICE_LDAP_SKIP_TLS_VERIFY") {
            config.ldap.skip_tls_verify =
                parse_flag("SIMPLE_SERVICE_LDAP_SKIP_TLS_VERIFY", &skip)?;
        }

        if let Some(realm) = lookup("SIMPLE_SERVICE_AUTH_REALM") {
            config.auth.realm = realm;
        }
        if let Some(enabled) = lookup("SIMPLE_SERVICE_METRICS_ENABLED") {
            config.metrics.enabled = parse_flag("SIMPLE_SERVICE_METRICS_ENABLED", &enabled)?;
        }
        if let Some(level) = lookup("SIMPLE_SERVICE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("SIMPLE_SERVICE_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Reject a configuration the service must not start with.
    pub fn validate(&self) -> Result<()> {
        self.ldap.validate()?;

        if self.auth.realm.contains('"') {
            return Err(Error::Configuration(
                "auth.realm must not contain double quotes".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Directory connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfigSection {
    /// Directory URL (ldap:// or ldaps://)
    #[serde(default)]
    pub url: Option<String>,

    /// Base DN appended to resolved user DNs
    #[serde(default)]
    pub base_dn: Option<String>,

    /// Manager DN used for connection checks
    #[serde(default)]
    pub manager_dn: Option<String>,

    #[serde(default)]
    pub manager_password: Option<String>,

    /// User DN pattern with a single {0} placeholder, e.g. "uid={0}"
    #[serde(default)]
    pub user_dn_pattern: Option<String>,

    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_tls_verify: bool,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_DIRECTORY_TIMEOUT_SECS
}

impl Default for LdapConfigSection {
    fn default() -> Self {
        Self {
            url: None,
            base_dn: None,
            manager_dn: None,
            manager_password: None,
            user_dn_pattern: None,
            start_tls: false,
            skip_tls_verify: false,
            timeout_seconds: default_timeout(),
        }
    }
}

impl LdapConfigSection {
    pub fn validate(&self) -> Result<()> {
        let url = required(&self.url, "ldap.url")?;
        if !url.starts_with("ldap://") && !url.starts_with("ldaps://") {
            return Err(Error::Configuration(
                "ldap.url must start with ldap:// or ldaps://".into(),
            ));
        }

        required(&self.base_dn, "ldap.base_dn")?;
        validate_dn_pattern(required(&self.user_dn_pattern, "ldap.user_dn_pattern")?)?;

        if self.manager_dn.is_some() && self.manager_password.is_none() {
            return Err(Error::Configuration(
                "ldap.manager_password is required when ldap.manager_dn is set".into(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(Error::Configuration(
                "ldap.timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Configuration(format!("{}={:?}: {}", key, value, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "{}={:?}: expected true or false",
            key, value
        ))),
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Configuration(format!("{} is required", key))),
    }
}

/// Check that a user DN pattern carries exactly one `{0}` placeholder.
pub fn validate_dn_pattern(pattern: &str) -> Result<()> {
    match pattern.matches(DN_PLACEHOLDER).count() {
        1 => Ok(()),
        0 => Err(Error::Configuration(format!(
            "User DN pattern must contain the {} placeholder: {}",
            DN_PLACEHOLDER, pattern
        ))),
        _ => Err(Error::Configuration(format!(
            "User DN pattern must contain exactly one {} placeholder: {}",
            DN_PLACEHOLDER, pattern
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Realm announced in WWW-Authenticate challenges
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics at /metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
