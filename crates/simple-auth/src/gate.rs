//! Authentication gate
//!
//! Credentials -> user DN -> directory bind -> verdict. Every request binds
//! independently; nothing is cached and nothing is retried.

use crate::ldap::{DirectoryClient, DnResolver};
use simple_core::types::{AuthVerdict, Credentials};
use simple_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decides whether a set of credentials authenticates against the directory
pub struct AuthGate {
    resolver: DnResolver,
    directory: Arc<dyn DirectoryClient>,
}

impl AuthGate {
    pub fn new(resolver: DnResolver, directory: Arc<dyn DirectoryClient>) -> Self {
        Self {
            resolver,
            directory,
        }
    }

    /// Authenticate and collapse every failure into a denied verdict
    pub async fn authenticate(&self, credentials: Credentials) -> AuthVerdict {
        AuthVerdict::from(self.evaluate(&credentials).await)
    }

    /// Authenticate, keeping the failure category for logs and metrics.
    ///
    /// Returns the authenticated principal (the username as supplied).
    pub async fn evaluate(&self, credentials: &Credentials) -> Result<String> {
        if credentials.is_blank() {
            debug!("Rejecting blank credentials");
            return Err(Error::CredentialsMalformed(
                "username and password must not be blank".into(),
            ));
        }

        let dn = self.resolver.resolve(&credentials.username);

        match self.directory.bind(&dn, &credentials.password).await {
            Ok(result) if result.success => {
                info!(username = %credentials.username, "User authenticated");
                Ok(credentials.username.clone())
            }
            Ok(result) => {
                debug!(
                    username = %credentials.username,
                    dn = %dn,
                    rc = result.result_code,
                    "Directory rejected credentials"
                );
                Err(Error::BindRejected(format!(
                    "{} (code {})",
                    dn, result.result_code
                )))
            }
            Err(e) => {
                warn!(
                    username = %credentials.username,
                    error = %e,
                    "Directory unavailable, denying request"
                );
                match e {
                    Error::DirectoryUnavailable(_) => Err(e),
                    other => Err(Error::DirectoryUnavailable(other.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use simple_core::types::{DirectoryBindResult, DistinguishedName};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INVALID_CREDENTIALS: u32 = 49;
    const NO_SUCH_OBJECT: u32 = 32;

    /// In-memory directory keyed by DN
    struct StaticDirectory {
        entries: HashMap<String, String>,
        binds: AtomicUsize,
    }

    impl StaticDirectory {
        fn with_bgates() -> Self {
            let mut entries = HashMap::new();
            entries.insert(
                "uid=bgates,ou=users,dc=mycompany,dc=com".to_string(),
                "123".to_string(),
            );
            Self {
                entries,
                binds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DirectoryClient for StaticDirectory {
        async fn bind(
            &self,
            dn: &DistinguishedName,
            password: &str,
        ) -> Result<DirectoryBindResult> {
            self.binds.fetch_add(1, Ordering::SeqCst);
            match self.entries.get(dn.as_str()) {
                Some(expected) if expected == password => Ok(DirectoryBindResult::bound(dn)),
                Some(_) => Ok(DirectoryBindResult::rejected(INVALID_CREDENTIALS)),
                None => Ok(DirectoryBindResult::rejected(NO_SUCH_OBJECT)),
            }
        }
    }

    struct UnreachableDirectory;

    #[async_trait]
    impl DirectoryClient for UnreachableDirectory {
        async fn bind(&self, _dn: &DistinguishedName, _password: &str) -> Result<DirectoryBindResult> {
            Err(Error::DirectoryUnavailable("connection refused".into()))
        }
    }

    fn resolver() -> DnResolver {
        DnResolver::new("uid={0},ou=users", Some("dc=mycompany,dc=com")).unwrap()
    }

    fn gate_with(directory: Arc<dyn DirectoryClient>) -> AuthGate {
        AuthGate::new(resolver(), directory)
    }

    #[tokio::test]
    async fn test_valid_credentials_authenticate() {
        let gate = gate_with(Arc::new(StaticDirectory::with_bgates()));

        let verdict = gate.authenticate(Credentials::new("bgates", "123")).await;
        assert!(verdict.authenticated);
        assert_eq!(verdict.principal.as_deref(), Some("bgates"));
    }

    #[tokio::test]
    async fn test_wrong_password_denied() {
        let gate = gate_with(Arc::new(StaticDirectory::with_bgates()));

        let verdict = gate.authenticate(Credentials::new("bgates", "wrong")).await;
        assert_eq!(verdict, AuthVerdict::denied());

        let err = gate
            .evaluate(&Credentials::new("bgates", "invalid_password"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BindRejected(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_denied() {
        let gate = gate_with(Arc::new(StaticDirectory::with_bgates()));

        let verdict = gate.authenticate(Credentials::new("nosuchuser", "123")).await;
        assert!(!verdict.authenticated);
        assert!(verdict.principal.is_none());
    }

    #[tokio::test]
    async fn test_username_with_base_dn_suffix_denied() {
        let directory = Arc::new(StaticDirectory::with_bgates());
        let gate = gate_with(directory.clone());

        for user in ["bgates,ou=users,dc=mycompany,dc=com", "bgates,dc=mycompany,dc=com"] {
            let verdict = gate.authenticate(Credentials::new(user, "123")).await;
            assert_eq!(verdict, AuthVerdict::denied(), "{:?} must be denied", user);
        }

        let verdict = gate.authenticate(Credentials::new("bgates", "123")).await;
        assert_eq!(verdict.principal.as_deref(), Some("bgates"));
    }

    #[tokio::test]
    async fn test_blank_credentials_never_reach_directory() {
        let directory = Arc::new(StaticDirectory::with_bgates());
        let gate = gate_with(directory.clone());

        for (user, pass) in [("", ""), (" ", " "), ("bgates", ""), ("", "123"), ("bgates", "  ")] {
            let verdict = gate.authenticate(Credentials::new(user, pass)).await;
            assert!(!verdict.authenticated, "{:?}/{:?} must be denied", user, pass);
        }

        assert_eq!(directory.binds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_credentials_denied_even_if_directory_down() {
        let gate = gate_with(Arc::new(UnreachableDirectory));

        let err = gate.evaluate(&Credentials::new("", "")).await.unwrap_err();
        assert!(matches!(err, Error::CredentialsMalformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_directory_fails_closed() {
        let gate = gate_with(Arc::new(UnreachableDirectory));

        let verdict = gate.authenticate(Credentials::new("bgates", "123")).await;
        assert!(!verdict.authenticated);

        let err = gate
            .evaluate(&Credentials::new("bgates", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DirectoryUnavailable(_)));
        assert_eq!(err.http_status(), 401);
    }

    #[tokio::test]
    async fn test_each_request_binds_once() {
        let directory = Arc::new(StaticDirectory::with_bgates());
        let gate = gate_with(directory.clone());

        gate.authenticate(Credentials::new("bgates", "123")).await;
        gate.authenticate(Credentials::new("bgates", "123")).await;
        gate.authenticate(Credentials::new("bgates", "wrong")).await;

        assert_eq!(directory.binds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_authentication() {
        let gate = Arc::new(gate_with(Arc::new(StaticDirectory::with_bgates())));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    let password = if i % 2 == 0 { "123" } else { "wrong" };
                    (i, gate.authenticate(Credentials::new("bgates", password)).await)
                })
            })
            .collect();

        for handle in handles {
            let (i, verdict) = handle.await.unwrap();
            assert_eq!(verdict.authenticated, i % 2 == 0);
        }
    }
}
