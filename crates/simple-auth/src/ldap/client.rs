//! LDAP Client implementation
//!
//! Every operation opens its own connection, performs a simple bind and
//! unbinds again. Supports LDAP, LDAPS (SSL) and STARTTLS connections.

use crate::ldap::types::LdapConfig;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use metrics::histogram;
use simple_core::types::{DirectoryBindResult, DistinguishedName};
use simple_core::{Error, Result};
use std::time::Instant;
use tracing::{debug, warn};

/// Metric recording how long a bind round trip took
pub const BIND_DURATION_SECONDS: &str = "simple_directory_bind_duration_seconds";

// LDAP result codes
const RC_SUCCESS: u32 = 0;
const RC_BUSY: u32 = 51;
const RC_UNAVAILABLE: u32 = 52;

/// Directory the gate delegates password checks to
///
/// `Ok` means the directory answered; `success` tells whether it accepted
/// the DN/password pair. `Err(Error::DirectoryUnavailable)` means it could
/// not be asked.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn bind(&self, dn: &DistinguishedName, password: &str) -> Result<DirectoryBindResult>;
}

/// LDAP client performing simple binds over `ldap3`
pub struct LdapClient {
    config: LdapConfig,
}

impl LdapClient {
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Bind as the manager DN (anonymously if none is configured) to check
    /// that the directory is reachable and the manager credentials work.
    pub async fn check_connection(&self) -> Result<()> {
        let dn = self.config.manager_dn.as_deref().unwrap_or("");
        let password = self.config.manager_password.as_deref().unwrap_or("");

        let result = self.timed_bind(dn, password).await?;
        if !result.success {
            return Err(Error::BindRejected(format!(
                "Manager bind failed with code: {}",
                result.result_code
            )));
        }

        Ok(())
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self) -> Result<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.timeout())
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.config.url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|e| {
                Error::DirectoryUnavailable(format!("Failed to connect to LDAP server: {}", e))
            })?;

        // The driver task ends once every `Ldap` handle is dropped
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        Ok(ldap)
    }

    async fn timed_bind(&self, dn: &str, password: &str) -> Result<DirectoryBindResult> {
        let started = Instant::now();

        let result = match tokio::time::timeout(self.config.timeout(), self.simple_bind(dn, password))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::DirectoryUnavailable(format!(
                "Bind timed out after {}s",
                self.config.timeout_seconds
            ))),
        };

        let outcome = match &result {
            Ok(r) if r.success => "bound",
            Ok(_) => "rejected",
            Err(_) => "unavailable",
        };
        histogram!(BIND_DURATION_SECONDS, "outcome" => outcome)
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn simple_bind(&self, dn: &str, password: &str) -> Result<DirectoryBindResult> {
        let mut ldap = self.create_connection().await?;

        let bind = ldap.simple_bind(dn, password).await;

        // Release the connection whatever the bind said
        if let Err(e) = ldap.unbind().await {
            debug!("LDAP unbind failed: {}", e);
        }

        let result = bind.map_err(|e| Error::DirectoryUnavailable(format!("Bind failed: {}", e)))?;

        match result.rc {
            RC_SUCCESS => Ok(DirectoryBindResult::bound(&DistinguishedName::new(dn))),
            RC_BUSY | RC_UNAVAILABLE => Err(Error::DirectoryUnavailable(format!(
                "Directory refused service with code: {}",
                result.rc
            ))),
            rc => {
                debug!(dn = %dn, rc = rc, text = %result.text, "Bind rejected");
                Ok(DirectoryBindResult::rejected(rc))
            }
        }
    }
}

#[async_trait]
impl DirectoryClient for LdapClient {
    async fn bind(&self, dn: &DistinguishedName, password: &str) -> Result<DirectoryBindResult> {
        self.timed_bind(dn.as_str(), password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(url: &str) -> LdapConfig {
        LdapConfig {
            url: url.to_string(),
            base_dn: "dc=mycompany,dc=com".to_string(),
            manager_dn: Some("cn=admin,dc=mycompany,dc=com".to_string()),
            manager_password: Some("admin".to_string()),
            user_dn_pattern: "uid={0}".to_string(),
            start_tls: false,
            skip_tls_verify: false,
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_unavailable() {
        // Nothing listens on port 1
        let client = LdapClient::new(config_for("ldap://127.0.0.1:1"));
        let dn = DistinguishedName::new("uid=bgates,dc=mycompany,dc=com");

        let result = client.bind(&dn, "123").await;
        assert!(matches!(result, Err(Error::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_check_connection_reports_unreachable() {
        let client = LdapClient::new(config_for("ldap://127.0.0.1:1"));
        assert!(matches!(
            client.check_connection().await,
            Err(Error::DirectoryUnavailable(_))
        ));
    }

    /// Needs a directory seeded with `bgates`/`123`, e.g. osixia/openldap
    /// loaded with the mycompany.com entries.
    #[tokio::test]
    #[ignore]
    async fn test_live_directory_bind() {
        let url = std::env::var("SIMPLE_SERVICE_TEST_LDAP_URL")
            .unwrap_or_else(|_| "ldap://localhost:389".to_string());
        let pattern = std::env::var("SIMPLE_SERVICE_TEST_LDAP_USER_DN_PATTERN")
            .unwrap_or_else(|_| "uid={0},ou=users".to_string());

        let mut config = config_for(&url);
        config.user_dn_pattern = pattern;
        let resolver = config.dn_resolver().unwrap();
        let client = LdapClient::new(config);

        client.check_connection().await.unwrap();

        let bound = client.bind(&resolver.resolve("bgates"), "123").await.unwrap();
        assert!(bound.success);

        let rejected = client
            .bind(&resolver.resolve("bgates"), "invalid_password")
            .await
            .unwrap();
        assert!(!rejected.success);
    }
}
