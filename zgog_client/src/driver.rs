//! Synchronization driver.
//!
//! The driver owns every [`Entity`] the client knows about and is the only
//! code that writes them. It is fed from two directions:
//! - network messages, via [`SyncDriver::handle_message`], which fold
//!   authoritative state in between frames;
//! - the render loop, via [`SyncDriver::frame`], which simulates the local
//!   character and then interpolates everyone else around it.
//!
//! Connection progress is an explicit state machine ([`ClientState`]); every
//! event has one transition method and events that arrive in the wrong state
//! are ignored rather than treated as errors.

use std::collections::{hash_map, HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};
use zgog_shared::{
    config::ClientConfig,
    map::WalkabilityMap,
    math::Vec2,
    net::{self, MapPayload, NetMsg, NewPlayer, PlayerId, PlayerPayload},
    render::{FrameView, SpritePlacement},
};

use crate::{
    entity::{Entity, Pose},
    input::{HitButton, Steering},
    interp::{displayed_pose, interpolate_remotes, Camera, NetworkCadence},
    motion::{LocalMotion, NOMINAL_FRAME_MS},
    transport::Transport,
    ui::{FailureLimiter, UiEvent},
};

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Socket not open yet.
    Connecting,
    /// Connected, waiting for the map.
    ResourcesLoading,
    /// Map received, waiting to be told which character is ours.
    MapLoaded,
    /// Local character assigned; frames are simulated.
    Active,
    /// Terminal.
    Disconnected,
}

/// Outcome of feeding an event to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

/// Timing of one render frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Frame delta in nominal 60 Hz frames.
    pub delta: f32,
    /// Wall time since the previous frame.
    pub elapsed_ms: f32,
    /// Time since the session started.
    pub now: Duration,
}

impl FrameTick {
    pub fn from_elapsed(elapsed_ms: f32, now: Duration) -> Self {
        Self {
            delta: elapsed_ms / NOMINAL_FRAME_MS,
            elapsed_ms,
            now,
        }
    }
}

/// Client-side motion synchronization.
pub struct SyncDriver<T> {
    cfg: ClientConfig,
    state: ClientState,
    transport: T,

    map: Option<WalkabilityMap>,
    local: Option<Entity>,
    /// `hero` that arrived before the map.
    pending_hero: Option<PlayerPayload>,
    remotes: HashMap<PlayerId, Entity>,

    cadence: NetworkCadence,
    motion: LocalMotion,
    steering: Steering,
    hit: HitButton,

    failures: FailureLimiter,
    resources_loaded: bool,
    ui_events: Vec<UiEvent>,
}

impl<T: Transport> SyncDriver<T> {
    pub fn new(cfg: ClientConfig, transport: T) -> Self {
        let motion = LocalMotion::new(cfg.report_interval_frames);
        let steering = Steering::from_config(&cfg);
        let failures = FailureLimiter::new(Duration::from_millis(cfg.failure_report_interval_ms));
        Self {
            cfg,
            state: ClientState::Connecting,
            transport,
            map: None,
            local: None,
            pending_hero: None,
            remotes: HashMap::new(),
            cadence: NetworkCadence::new(),
            motion,
            steering,
            hit: HitButton::default(),
            failures,
            resources_loaded: false,
            ui_events: Vec::new(),
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn map(&self) -> Option<&WalkabilityMap> {
        self.map.as_ref()
    }

    pub fn local(&self) -> Option<&Entity> {
        self.local.as_ref()
    }

    pub fn remote(&self, id: &PlayerId) -> Option<&Entity> {
        self.remotes.get(id)
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    pub fn cadence(&self) -> &NetworkCadence {
        &self.cadence
    }

    /// Pose a remote entity would be drawn at right now, without advancing
    /// time.
    pub fn displayed(&self, id: &PlayerId) -> Option<Pose> {
        self.remotes
            .get(id)
            .map(|e| displayed_pose(e, self.cadence.fraction()))
    }

    /// Takes the notifications queued for the UI.
    pub fn drain_ui_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.ui_events)
    }

    // ─── Connection lifecycle ───

    pub fn on_connected(&mut self) -> Transition {
        if self.state != ClientState::Connecting {
            return self.ignore("connected");
        }
        info!("Connected to server");
        self.state = ClientState::ResourcesLoading;
        Transition::Applied
    }

    pub fn on_connection_failed(&mut self) -> Transition {
        if self.state == ClientState::Disconnected {
            return self.ignore("connection_failed");
        }
        warn!(state = ?self.state, "Connection to server failed");
        self.state = ClientState::Disconnected;
        self.ui_events.push(UiEvent::ConnectionFailure);
        Transition::Applied
    }

    pub fn on_resources_loaded(&mut self) -> Transition {
        if self.resources_loaded || self.state == ClientState::Disconnected {
            return self.ignore("resources_loaded");
        }
        self.resources_loaded = true;
        self.ui_events.push(UiEvent::ResourcesLoaded);
        Transition::Applied
    }

    pub fn on_disconnected(&mut self, reason: &str) -> Transition {
        if self.state == ClientState::Disconnected {
            return self.ignore("disconnected");
        }
        info!(reason = %reason, "Disconnected from server");
        self.state = ClientState::Disconnected;
        Transition::Applied
    }

    /// Announces the player under `name`.
    pub fn join(&mut self, name: &str, now: Duration) -> Transition {
        if !matches!(
            self.state,
            ClientState::ResourcesLoading | ClientState::MapLoaded
        ) {
            return self.ignore("join");
        }
        info!(name = %name, "Joining game");
        self.send(
            &NetMsg::NewPlayer(NewPlayer {
                name: name.to_string(),
            }),
            now,
        );
        Transition::Applied
    }

    // ─── Network ───

    /// Dispatches one decoded server message.
    pub fn handle_message(&mut self, msg: NetMsg, now: Duration) -> Transition {
        match msg {
            NetMsg::Map(payload) => self.on_map(&payload),
            NetMsg::AllPlayers(players) => self.on_players(&players, now),
            NetMsg::PlayerUpdated(player) => self.on_players(std::slice::from_ref(&player), now),
            NetMsg::Hero(player) => self.on_hero(player),
            NetMsg::PlayerLeft(left) => self.on_player_left(&left.id),
            other => {
                debug!(tag = other.tag(), "Unhandled server message");
                Transition::Ignored
            }
        }
    }

    fn on_map(&mut self, payload: &MapPayload) -> Transition {
        if !matches!(
            self.state,
            ClientState::ResourcesLoading | ClientState::MapLoaded | ClientState::Active
        ) {
            return self.ignore("map");
        }

        self.map = Some(WalkabilityMap::from_payload(payload));
        if self.state == ClientState::ResourcesLoading {
            self.state = ClientState::MapLoaded;
        }
        info!(width = payload.width, height = payload.height, state = ?self.state, "Map loaded");

        if let Some(hero) = self.pending_hero.take() {
            self.activate(hero);
        }
        Transition::Applied
    }

    fn on_hero(&mut self, hero: PlayerPayload) -> Transition {
        match self.state {
            ClientState::MapLoaded | ClientState::Active => {
                self.activate(hero);
                Transition::Applied
            }
            ClientState::ResourcesLoading => {
                debug!(id = %hero.id, "Hero arrived before map, buffering");
                self.pending_hero = Some(hero);
                Transition::Applied
            }
            ClientState::Connecting | ClientState::Disconnected => self.ignore("hero"),
        }
    }

    fn activate(&mut self, hero: PlayerPayload) {
        // Our own character may already have been seen as a remote.
        self.remotes.remove(&hero.id);
        let local = Entity::from_payload(&hero);
        info!(id = %local.id, name = %local.name, x = local.position.x, y = local.position.y, "Local player assigned");
        self.local = Some(local);
        self.hit = HitButton::default();
        self.state = ClientState::Active;
    }

    /// Folds a batch of authoritative states in, then marks the batch
    /// arrival for the interpolator.
    ///
    /// The batch clock is shared: remotes missing from the batch are rebased
    /// on their drawn pose as well, so the elapsed reset never moves them.
    fn on_players(&mut self, players: &[PlayerPayload], now: Duration) -> Transition {
        if !matches!(self.state, ClientState::MapLoaded | ClientState::Active) {
            return self.ignore("players");
        }

        let mut touched = HashSet::new();
        for player in players {
            if let Some(local) = self.local.as_mut().filter(|l| l.id == player.id) {
                reconcile(local, player, self.cfg.reconcile_threshold);
                continue;
            }
            match self.remotes.entry(player.id.clone()) {
                hash_map::Entry::Occupied(mut slot) => slot.get_mut().apply_snapshot(player),
                hash_map::Entry::Vacant(slot) => {
                    info!(id = %player.id, name = %player.name, "Remote player appeared");
                    slot.insert(Entity::from_payload(player));
                }
            }
            touched.insert(player.id.clone());
        }

        // Only our own echo: no remote moved, the clock keeps running.
        if touched.is_empty() {
            trace!(count = players.len(), "Batch without remotes");
            return Transition::Applied;
        }

        for (id, entity) in self.remotes.iter_mut() {
            if !touched.contains(id) {
                entity.last_snapshot = entity.predicted;
            }
        }

        self.cadence.record_batch(now);
        trace!(count = players.len(), lag_ms = ?self.cadence.lag_ms(), "Snapshot batch applied");
        Transition::Applied
    }

    fn on_player_left(&mut self, id: &PlayerId) -> Transition {
        if !matches!(self.state, ClientState::MapLoaded | ClientState::Active) {
            return self.ignore("player_left");
        }
        match self.remotes.remove(id) {
            Some(_) => {
                info!(id = %id, "Remote player left");
                Transition::Applied
            }
            None => Transition::Ignored,
        }
    }

    // ─── Input ───

    /// Pointer moved to `cursor` (screen pixels): re-derive the local
    /// character's velocity and orientation.
    pub fn pointer_moved(&mut self, cursor: Vec2) -> Transition {
        let velocity = self.steering.velocity(cursor);
        let orientation = self.steering.orientation(cursor);
        let Some(local) = self.active_local() else {
            return self.ignore("pointer_moved");
        };
        local.velocity = velocity;
        local.orientation = orientation;
        Transition::Applied
    }

    pub fn hit_pressed(&mut self) -> Transition {
        if self.state != ClientState::Active || !self.hit.press() {
            return Transition::Ignored;
        }
        self.set_hitting(true)
    }

    pub fn hit_released(&mut self) -> Transition {
        if self.state != ClientState::Active || !self.hit.release() {
            return Transition::Ignored;
        }
        self.set_hitting(false)
    }

    fn set_hitting(&mut self, hitting: bool) -> Transition {
        match self.local.as_mut() {
            Some(local) => {
                local.hitting = hitting;
                debug!(hitting, "Local hit state changed");
                Transition::Applied
            }
            None => Transition::Ignored,
        }
    }

    // ─── Frame ───

    /// Runs one render frame: local simulation first, then remote
    /// interpolation around the freshly moved local character.
    ///
    /// Returns `None` until a local character is assigned.
    pub fn frame(&mut self, tick: FrameTick) -> Option<FrameView> {
        if self.state != ClientState::Active {
            return None;
        }
        let (Some(local), Some(map)) = (self.local.as_mut(), self.map.as_ref()) else {
            return None;
        };

        self.cadence.advance(tick.elapsed_ms);
        let report = self.motion.advance(local, tick.delta, map);

        let camera = Camera {
            screen_centre: self.steering.screen_centre(),
            tile_size: self.cfg.tile_size,
            focus: local.position,
        };
        let local_placement = SpritePlacement {
            id: local.id.clone(),
            screen: camera.screen_centre,
            rotation: local.orientation.sprite_rotation(),
            hitting: local.hitting,
        };
        let remotes = interpolate_remotes(&mut self.remotes, &self.cadence, &camera);

        if let Some(report) = report {
            self.send(&NetMsg::PlayerCoords(report), tick.now);
        }

        Some(FrameView {
            local: Some(local_placement),
            remotes,
            map_origin: camera.map_origin(),
            tile_size: self.cfg.tile_size,
        })
    }

    // ─── Helpers ───

    fn active_local(&mut self) -> Option<&mut Entity> {
        if self.state == ClientState::Active {
            self.local.as_mut()
        } else {
            None
        }
    }

    /// Fire-and-forget send. Failures never reach the caller; they are
    /// surfaced to the UI through the limiter.
    fn send(&mut self, msg: &NetMsg, now: Duration) {
        let text = match net::encode(msg) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Dropping outgoing message");
                return;
            }
        };
        match self.transport.send(text) {
            Ok(()) => self.failures.record_success(),
            Err(e) => {
                if self.failures.record_failure(now) {
                    warn!(error = %e, tag = msg.tag(), "Send failed");
                    self.ui_events.push(UiEvent::ConnectionFailure);
                } else {
                    trace!(error = %e, suppressed = self.failures.suppressed(), "Send failed");
                }
            }
        }
    }

    fn ignore(&self, event: &'static str) -> Transition {
        debug!(event, state = ?self.state, "Event ignored in current state");
        Transition::Ignored
    }
}

/// Snaps the local character onto the server's position when the two have
/// drifted further apart than `threshold` tiles.
fn reconcile(local: &mut Entity, server: &PlayerPayload, threshold: f32) {
    let drift = local.position.distance(server.position);
    if drift > threshold {
        warn!(id = %local.id, drift, "Local player corrected by server");
        local.position = server.position;
        local.predicted = local.pose();
    } else {
        trace!(drift, "Local player within tolerance");
    }
}
