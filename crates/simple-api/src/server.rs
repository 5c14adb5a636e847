//! HTTP server implementation

use axum::{middleware, routing::get, Router};
use simple_auth::{AuthGate, DirectoryClient, LdapClient, LdapConfig};
use simple_core::{config::ServiceConfig, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{info, warn};

use crate::access::{AccessRules, API_PRIVATE, API_PUBLIC, METRICS_PATH};
use crate::metrics::{metrics_handler, metrics_middleware, MetricsRecorder};
use crate::middleware::access_gate;
use crate::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub gate: Arc<AuthGate>,
    pub rules: Arc<AccessRules>,
    pub metrics: Option<Arc<MetricsRecorder>>,
}

impl AppState {
    pub fn new(config: Arc<ServiceConfig>, gate: Arc<AuthGate>) -> Self {
        let rules = AccessRules::service_defaults(config.metrics.enabled);

        Self {
            config,
            gate,
            rules: Arc::new(rules),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// API Server
pub struct ApiServer {
    config: ServiceConfig,
}

impl ApiServer {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        // Configuration problems stop the process before it serves anything
        self.config.validate()?;
        let ldap_config = LdapConfig::try_from(&self.config.ldap)?;
        let resolver = ldap_config.dn_resolver()?;

        let client = LdapClient::new(ldap_config);
        match client.check_connection().await {
            Ok(()) => info!("Directory reachable at {}", client.config().url),
            Err(e) => warn!("Directory check failed, requests will be denied until it recovers: {}", e),
        }

        let directory: Arc<dyn DirectoryClient> = Arc::new(client);
        let gate = Arc::new(AuthGate::new(resolver, directory));

        let mut state = AppState::new(Arc::new(self.config.clone()), gate);
        if self.config.metrics.enabled {
            state = state.with_metrics(Arc::new(MetricsRecorder::install()?));
            info!("Prometheus metrics initialized");
        }

        let app = create_router(state);
        let addr = self.config.server.listen_address();
        let listener = TcpListener::bind(&addr).await?;

        info!("Simple Service listening on http://{}", addr);
        info!("Public endpoint: http://{}{}", addr, API_PUBLIC);
        info!("Private endpoint: http://{}{}", addr, API_PRIVATE);
        if self.config.metrics.enabled {
            info!("Prometheus metrics at http://{}{}", addr, METRICS_PATH);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Build the router: routes, access gate, metrics and tracing layers
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(API_PUBLIC, get(routes::public_string))
        .route(API_PRIVATE, get(routes::private_string));

    if state.metrics.is_some() {
        router = router.route(METRICS_PATH, get(metrics_handler));
    }

    let mut router = router
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate));

    if let Some(metrics) = state.metrics.clone() {
        router = router.layer(middleware::from_fn_with_state(metrics, metrics_middleware));
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
