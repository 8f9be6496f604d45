mod interaction;
mod movement;
mod naut;
mod registry;
mod session;
mod state;
mod tilemap;


use serde::Serialize;

pub use interaction::{hover, resolve, HoverTarget, TransitionRequest, INTERACTION_RANGE_SQ};
pub use movement::{
    apply_intent, move_naut, normalize_angle, smooth_orientation, smooth_speed, step_naut,
    MoveIntent, MoveOutcome, NautStepContext, ProbeDirection,
};
pub use naut::{Naut, NautId, NautView};
pub use registry::NautRegistry;
pub use session::{GameSession, SessionConfig, SessionSnapshot, SimEvent};
pub use state::{GameState, GameStateMachine, StateKind};
pub use tilemap::{
    classify, tile_needs_floor_underlay, MapLoadError, TileClass, TileCoord, TileMap,
    TileMapError, CONSOLE_TILE, SPAWN_TILE, TILE_SIZE_PX,
};

/// Plain 2D vector in tile units unless a field says otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}
