//! Session task.
//!
//! One task owns the [`SyncDriver`] for the lifetime of a connection and is
//! the only place it is mutated. Inbound frames and render ticks are
//! serialized through a single `select!`, so a snapshot is always applied
//! between two frames and never during one.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use zgog_shared::{net, render::RenderBackend};

use crate::{
    driver::{ClientState, FrameTick, SyncDriver},
    transport::Transport,
    ui::UiEvent,
};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The inbound channel closed.
    ServerClosed,
    /// The driver reached `Disconnected` on its own.
    Disconnected,
}

/// Drives `driver` from `incoming` and a frame ticker until the connection
/// goes away.
pub async fn run_session<T, R, F>(
    driver: &mut SyncDriver<T>,
    incoming: &mut mpsc::Receiver<String>,
    renderer: &mut R,
    mut on_ui: F,
) -> anyhow::Result<SessionEnd>
where
    T: Transport,
    R: RenderBackend,
    F: FnMut(UiEvent),
{
    let started = Instant::now();
    let frame_interval = Duration::from_secs_f32(driver.config().frame_ms() / 1000.0);
    let mut ticker = time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_frame = started;

    info!(frame_ms = driver.config().frame_ms(), "Session started");

    let end = loop {
        tokio::select! {
            frame = incoming.recv() => match frame {
                Some(text) => match net::decode(&text) {
                    Ok(msg) => {
                        driver.handle_message(msg, started.elapsed());
                    }
                    Err(e) => warn!(error = %e, "Dropping undecodable frame"),
                },
                None => {
                    driver.on_disconnected("server closed the connection");
                    break SessionEnd::ServerClosed;
                }
            },
            at = ticker.tick() => {
                let elapsed_ms = at.saturating_duration_since(last_frame).as_secs_f32() * 1000.0;
                last_frame = at;
                let tick = FrameTick::from_elapsed(elapsed_ms, at.saturating_duration_since(started));
                if let Some(view) = driver.frame(tick) {
                    renderer.draw(&view);
                }
            }
        }

        for event in driver.drain_ui_events() {
            debug!(?event, "UI event");
            on_ui(event);
        }

        if driver.state() == ClientState::Disconnected {
            break SessionEnd::Disconnected;
        }
    };

    for event in driver.drain_ui_events() {
        on_ui(event);
    }
    info!(?end, "Session ended");
    Ok(end)
}
