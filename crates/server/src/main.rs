//! ledgerweb gateway binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use ledgerweb_core::config::AppConfig;
use ledgerweb_server::{AppState, create_router};
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "LEDGERWEB_";

/// ledgerweb - REST gateway for a network of ledger nodes
#[derive(Parser, Debug)]
#[command(name = "ledgerwebd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LEDGERWEB_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Layer the optional TOML file under `LEDGERWEB_` environment variables.
fn load_config(config_path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = Path::new(config_path).exists();

    if has_config_file {
        tracing::info!(config_path, "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!("No config file found at {config_path}");
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with(ENV_PREFIX) && key != "LEDGERWEB_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: ledgerwebd --config /path/to/config.toml\n  \
             2. Environment variables: LEDGERWEB_NODES__PARTYA__TYPE=rpc \
             LEDGERWEB_NODES__PARTYA__URL=http://localhost:10050/ ledgerwebd\n\n\
             See config/server.example.toml for example configuration.\n\
             Set LEDGERWEB_CONFIG env var to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ledgerweb v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    if config.server.metrics_enabled {
        ledgerweb_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    let state = AppState::from_config(config.clone()).context("failed to configure nodes")?;
    tracing::info!(
        nodes = state.nodes.len(),
        default_node = %state.nodes.default_node(),
        "Node services initialized"
    );

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerweb_core::NodeName;
    use ledgerweb_core::config::NodeConfig;
    use tempfile::tempdir;

    #[test]
    fn load_config_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
default_node = "partyB"

[server]
bind = "0.0.0.0:9000"
metrics_enabled = false

[nodes.partyA]
type = "rpc"
url = "http://localhost:10050/"
username = "user1"
password = "test"

[nodes.partyB]
type = "memory"
identity = "O=PartyB, L=New York, C=US"
peers = ["O=PartyA, L=London, C=GB"]
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(!config.server.metrics_enabled);
        assert_eq!(config.default_node, Some(NodeName::new("partyB").unwrap()));
        assert!(matches!(
            config.nodes.get(&NodeName::new("partyA").unwrap()),
            Some(NodeConfig::Rpc { timeout_secs: 30, .. })
        ));
        assert_eq!(
            config.nodes[&NodeName::new("partyB").unwrap()].backend_name(),
            "memory"
        );
    }

    #[test]
    fn load_config_rejects_unknown_default() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
default_node = "nobody"

[nodes.partyA]
type = "memory"
identity = "O=PartyA, L=London, C=GB"
"#,
        )
        .unwrap();

        let err = load_config(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("nobody"));
    }
}
