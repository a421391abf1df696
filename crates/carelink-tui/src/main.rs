//! Carelink TUI entry point.
//!
//! # Usage
//!
//! ```bash
//! CARELINK_TOKEN=... carelink-tui --user-id 42 --role patient \
//!     --api-url http://localhost:5000 --ws-url ws://localhost:5000/ws
//! ```

use std::{fs::File, sync::Arc};

use carelink_app::{App, Runtime};
use carelink_client::{
    RosterConfig, SessionConfig, SessionContext,
    transport::{ApiClient, SystemEnv},
};
use carelink_proto::{Role, UserId};
use carelink_tui::TerminalDriver;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Carelink chat terminal client
#[derive(Parser, Debug)]
#[command(name = "carelink-tui")]
#[command(about = "Terminal client for Carelink doctor/patient chat")]
#[command(version)]
struct Args {
    /// Base URL of the REST API
    #[arg(long, default_value = "http://localhost:5000")]
    api_url: String,

    /// URL of the realtime socket endpoint
    #[arg(long, default_value = "ws://localhost:5000/ws")]
    ws_url: String,

    /// Bearer token of the signed-in user
    #[arg(long, env = "CARELINK_TOKEN", hide_env_values = true)]
    token: String,

    /// Id of the signed-in user
    #[arg(long)]
    user_id: String,

    /// Role of the signed-in user
    #[arg(long, value_enum)]
    role: RoleArg,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file; the terminal is owned by the UI
    #[arg(long, default_value = "carelink-tui.log")]
    log_file: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Doctor,
    Patient,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Doctor => Role::Doctor,
            RoleArg::Patient => Role::Patient,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let log_file = File::create(&args.log_file)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(log_file)))
        .with(filter)
        .init();

    let viewer = match args.user_id.parse::<u64>() {
        Ok(id) => UserId::from(id),
        Err(_) => UserId::from(args.user_id),
    };
    let ctx = SessionContext::new(viewer, args.role.into(), args.token)?;
    tracing::info!(viewer = %ctx.viewer(), role = ?ctx.role(), api = %args.api_url, "starting");

    let api = ApiClient::new(args.api_url, &ctx)?;
    let session_config = SessionConfig::default();
    let driver = TerminalDriver::new(api, args.ws_url, session_config.channel.connect_timeout)?;
    let app = App::new(ctx, RosterConfig::default(), session_config);

    Runtime::new(driver, SystemEnv::new(), app).run().await?;
    tracing::info!("exiting");
    Ok(())
}
