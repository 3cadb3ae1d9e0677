//! Headless client binary.
//!
//! Usage:
//!   cargo run -p zgog_client -- [--config client.json] [--url ws://127.0.0.1:2794/] [--name Player]
//!
//! Connects to the server, joins under the given name and runs the
//! synchronization loop. There is no window: frames are logged at `trace`
//! level instead of drawn, and the pointer stays at the screen centre.

use std::env;

use anyhow::Context;
use tracing::{error, info, trace};
use zgog_client::{
    session::run_session,
    transport,
    SyncDriver,
};
use zgog_shared::{
    config::ClientConfig,
    render::{FrameView, RenderBackend},
};

/// Renderer that logs what it would draw.
#[derive(Default)]
struct TraceRenderer {
    frames: u64,
}

impl RenderBackend for TraceRenderer {
    fn draw(&mut self, frame: &FrameView) {
        self.frames += 1;
        trace!(
            frame = self.frames,
            remotes = frame.remotes.len(),
            origin_x = frame.map_origin.x,
            origin_y = frame.map_origin.y,
            "Frame"
        );
    }
}

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();

    // Load the file first so flags override it.
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let text = std::fs::read_to_string(&args[i + 1])
                .with_context(|| format!("read config {}", args[i + 1]))?;
            ClientConfig::from_json_str(&text).context("parse config")?
        }
        _ => ClientConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" if i + 1 < args.len() => {
                cfg.server_url = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(url = %cfg.server_url, name = %cfg.player_name, "Starting client");

    let url = cfg.server_url.clone();
    let name = cfg.player_name.clone();
    let (outgoing, outgoing_rx) = transport::outgoing_channel();
    let mut driver = SyncDriver::new(cfg, outgoing);

    let mut incoming = match transport::connect(&url, outgoing_rx).await {
        Ok(incoming) => incoming,
        Err(e) => {
            driver.on_connection_failed();
            for event in driver.drain_ui_events() {
                info!(?event, "UI notification");
            }
            error!(error = %e, "Failed to connect to the server");
            return Err(e);
        }
    };

    driver.on_connected();
    // Nothing to load without a window.
    driver.on_resources_loaded();
    driver.join(&name, std::time::Duration::ZERO);

    let mut renderer = TraceRenderer::default();
    let end = run_session(&mut driver, &mut incoming, &mut renderer, |event| {
        info!(?event, "UI notification");
    })
    .await?;

    println!("Session ended: {end:?} after {} frames.", renderer.frames);
    Ok(())
}
