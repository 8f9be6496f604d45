use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};

use super::{
    apply_intent, hover, resolve, step_naut, GameStateMachine, HoverTarget, MoveIntent,
    MoveOutcome, Naut, NautId, NautRegistry, NautStepContext, NautView, StateKind, TileCoord,
    TileMap, Vec2,
};

pub const DEFAULT_TICK_DURATION: Duration = Duration::from_millis(20);
pub const DEFAULT_INTERACTION_ANIMATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub tick_duration: Duration,
    pub interaction_animation: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_duration: DEFAULT_TICK_DURATION,
            interaction_animation: DEFAULT_INTERACTION_ANIMATION,
        }
    }
}

/// Discrete input delivered between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// Primary click at a world pixel position.
    Click { world: Vec2 },
    /// Leave the secondary mode.
    Cancel,
}

/// Everything a renderer reads for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: StateKind,
    pub tick: u64,
    pub animation_elapsed_ms: Option<u64>,
    pub player: NautId,
    pub nauts: Vec<NautView>,
}

/// One ship interior: the map, its crew, the scene state and the tick clock.
#[derive(Debug)]
pub struct GameSession {
    map: TileMap,
    nauts: NautRegistry,
    state: GameStateMachine,
    player: NautId,
    tick: u64,
    tick_duration: Duration,
}

impl GameSession {
    pub fn new(map: TileMap, config: SessionConfig) -> Self {
        let spawn = map.spawn_point().unwrap_or(TileCoord::new(0, 0));
        let mut nauts = NautRegistry::default();
        let player = nauts.spawn(tile_origin(spawn));
        nauts.apply_pending();
        let state =
            GameStateMachine::from_durations(config.interaction_animation, config.tick_duration);
        info!(
            width = map.width(),
            height = map.height(),
            spawn_x = spawn.x,
            spawn_y = spawn.y,
            animation_ticks = state.animation_ticks(),
            "session_started"
        );

        Self {
            map,
            nauts,
            state,
            player,
            tick: 0,
            tick_duration: config.tick_duration,
        }
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn nauts(&self) -> &NautRegistry {
        &self.nauts
    }

    pub fn state(&self) -> &GameStateMachine {
        &self.state
    }

    pub fn player_id(&self) -> NautId {
        self.player
    }

    pub fn player(&self) -> Option<&Naut> {
        self.nauts.get(self.player)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Queues a crew member at a tile; it joins the simulation on the next tick.
    /// Tiles outside the map or solid tiles are refused.
    pub fn spawn_naut(&mut self, tile: TileCoord) -> Option<NautId> {
        let walkable = self
            .map
            .class_at(tile)
            .is_some_and(|class| !class.blocks_movement());
        if !walkable {
            debug!(x = tile.x, y = tile.y, "spawn_rejected");
            return None;
        }
        Some(self.nauts.spawn(tile_origin(tile)))
    }

    /// The player cannot be removed.
    pub fn despawn_naut(&mut self, id: NautId) -> bool {
        if id == self.player {
            return false;
        }
        self.nauts.despawn(id)
    }

    /// Applies a discrete event. Returns true when the scene state changed.
    pub fn handle_event(&mut self, event: SimEvent) -> bool {
        match event {
            SimEvent::Click { world } => self.handle_click(world),
            SimEvent::Cancel => self.state.cancel(),
        }
    }

    fn handle_click(&mut self, world: Vec2) -> bool {
        if self.state.kind() != StateKind::Interior {
            return false;
        }
        let Some(player) = self.nauts.get(self.player) else {
            return false;
        };
        let Some(request) = resolve(world, player, &self.map) else {
            debug!(x = world.x, y = world.y, "interaction_rejected");
            return false;
        };
        let Some(player) = self.nauts.get_mut(self.player) else {
            return false;
        };
        self.state.begin_interaction(&request, player, self.tick)
    }

    /// Advances the whole session by one fixed tick.
    pub fn tick(&mut self, intent: MoveIntent) {
        self.nauts.apply_pending();
        self.tick = self.tick.saturating_add(1);

        match self.state.kind() {
            StateKind::Interior => {
                if let Some(player) = self.nauts.get_mut(self.player) {
                    apply_intent(player, intent);
                }
            }
            StateKind::InteractionAnimation => {
                let _ = self.state.advance(self.tick);
            }
            StateKind::SecondaryMode => {}
        }

        let context = NautStepContext {
            snap_idle_orientation: self.state.kind() == StateKind::Interior,
        };
        for naut in self.nauts.iter_mut() {
            if let Some(MoveOutcome::Blocked(direction)) = step_naut(naut, &self.map, context) {
                trace!(naut = naut.id.0, ?direction, "naut_bumped");
            }
        }
    }

    /// Console under the cursor while exploring, for the cursor affordance.
    pub fn hover(&self, cursor_world: Vec2) -> Option<HoverTarget> {
        if self.state.kind() != StateKind::Interior {
            return None;
        }
        hover(cursor_world, self.player()?, &self.map)
    }

    pub fn animation_elapsed(&self) -> Option<Duration> {
        let ticks = self.state.animation_elapsed_ticks(self.tick)?;
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        Some(self.tick_duration.saturating_mul(ticks))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.kind(),
            tick: self.tick,
            animation_elapsed_ms: self
                .animation_elapsed()
                .map(|elapsed| elapsed.as_millis() as u64),
            player: self.player,
            nauts: self.nauts.iter().map(Naut::view).collect(),
        }
    }
}

fn tile_origin(tile: TileCoord) -> Vec2 {
    Vec2 {
        x: tile.x as f32,
        y: tile.y as f32,
    }
}
