//! Simple Service
//!
//! Serves a public endpoint and a private endpoint guarded by HTTP Basic
//! authentication against an LDAP directory.

use clap::{Parser, Subcommand};
use simple_api::ApiServer;
use simple_auth::{LdapClient, LdapConfig};
use simple_core::config::{LoggingConfig, ServiceConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "simple-service")]
#[command(author = "Simple Service Team")]
#[command(version = simple_core::VERSION)]
#[command(about = "Public and LDAP-protected demo endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Bind address
    #[arg(long, env = "SIMPLE_SERVICE_BIND_ADDRESS")]
    bind: Option<String>,

    /// Port number
    #[arg(short, long, env = "SIMPLE_SERVICE_PORT")]
    port: Option<u16>,

    /// Directory URL (ldap:// or ldaps://)
    #[arg(long, env = "SIMPLE_SERVICE_LDAP_URL")]
    ldap_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SIMPLE_SERVICE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server
    Server,

    /// Bind to the configured directory and report whether it answers
    CheckDirectory,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        ServiceConfig::from_file(config_path)?
    } else {
        ServiceConfig::from_env()?
    };
    apply_overrides(&cli, &mut config);

    init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Server) {
        Commands::Version => {
            println!("simple-service {}", simple_core::VERSION);
        }
        Commands::CheckDirectory => {
            check_directory(config).await?;
        }
        Commands::Server => {
            run_server(config).await?;
        }
    }

    Ok(())
}

/// Command-line flags win over file and environment settings
fn apply_overrides(cli: &Cli, config: &mut ServiceConfig) {
    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = &cli.ldap_url {
        config.ldap.url = Some(url.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    info!("Starting Simple Service {}...", simple_core::VERSION);
    if let Some(url) = &config.ldap.url {
        info!("Directory: {}", url);
    }

    let server = ApiServer::new(config);
    server.run().await?;

    Ok(())
}

async fn check_directory(config: ServiceConfig) -> anyhow::Result<()> {
    config.validate()?;
    let ldap_config = LdapConfig::try_from(&config.ldap)?;
    let url = ldap_config.url.clone();

    LdapClient::new(ldap_config).check_connection().await?;

    println!("Directory at {} is reachable", url);
    Ok(())
}
