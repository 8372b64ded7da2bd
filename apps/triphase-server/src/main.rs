use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::prelude::*;
use triphase_core::TriphaseCore;
use triphase_core::config::core_config::TriphaseConfig;
use triphase_server::ServerConfig;
use triphase_server::router::start_server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "TRIPHASE_BIND_ADDRESS", default_value = "0.0.0.0:3000")]
    bind_address: SocketAddr,

    /// Directory holding `tps_config.properties`, takes precedence over `TRIPHASE_CONFIG_PATH`
    #[arg(short, long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[arg(long, env = "TRIPHASE_TRACE_LEVEL")]
    trace_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "TRIPHASE_TRACE_JSON")]
    trace_json: bool,

    #[arg(long, env = "TRIPHASE_HIDE_ERROR_RESPONSE_CAUSE")]
    hide_error_response_cause: bool,

    #[arg(long, env = "TRIPHASE_SESSION_PURGE_SECONDS", default_value_t = 60)]
    session_purge_seconds: u64,
}

fn main() {
    let cli = Cli::parse();

    let server_config = ServerConfig {
        trace_level: cli.trace_level,
        trace_json: cli.trace_json,
        hide_error_response_cause: cli.hide_error_response_cause,
        session_purge_interval: Duration::from_secs(cli.session_purge_seconds),
    };

    initialize_tracing(&server_config);

    let config = match cli.config_dir {
        Some(dir) => TriphaseConfig::load_from_dir(Some(&dir)),
        None => TriphaseConfig::load(),
    }
    .expect("Failed to load configuration");

    let core = TriphaseCore::new(config).expect("Failed to initialize core");

    let listener = TcpListener::bind(cli.bind_address).expect("Failed to bind to address");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
        .block_on(async { start_server(listener, core, server_config).await })
        .expect("Server terminated with an error");
}

fn initialize_tracing(config: &ServerConfig) {
    // Create a filter based on the log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(config.trace_level.as_deref().unwrap_or("info"))
        })
        .expect("Failed to create env filter");

    let tracing_layer = tracing_subscriber::registry().with(filter);

    if config.trace_json {
        tracing_layer
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_layer.with(tracing_subscriber::fmt::layer()).init();
    };
}
