use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::{Naut, TransitionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateKind {
    Interior,
    InteractionAnimation,
    SecondaryMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Exploring the ship interior; the player is controllable.
    Interior,
    /// Console zoom-in playing since `started_at_tick`.
    InteractionAnimation { started_at_tick: u64 },
    /// Galaxy view reached through the ship computer.
    SecondaryMode,
}

impl GameState {
    pub fn kind(&self) -> StateKind {
        match self {
            GameState::Interior => StateKind::Interior,
            GameState::InteractionAnimation { .. } => StateKind::InteractionAnimation,
            GameState::SecondaryMode => StateKind::SecondaryMode,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameStateMachine {
    state: GameState,
    animation_ticks: u64,
}

impl GameStateMachine {
    pub fn new(animation_ticks: u64) -> Self {
        Self {
            state: GameState::Interior,
            animation_ticks,
        }
    }

    /// Animation length rounded up to whole ticks.
    pub fn from_durations(animation: Duration, tick: Duration) -> Self {
        let tick_nanos = tick.as_nanos().max(1);
        let ticks = animation.as_nanos().div_ceil(tick_nanos);
        Self::new(u64::try_from(ticks).unwrap_or(u64::MAX))
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn animation_ticks(&self) -> u64 {
        self.animation_ticks
    }

    /// Starts the console animation and turns the player toward the console in
    /// the same step. Only valid from `Interior`.
    pub fn begin_interaction(
        &mut self,
        request: &TransitionRequest,
        player: &mut Naut,
        now_tick: u64,
    ) -> bool {
        if self.state != GameState::Interior {
            return false;
        }
        player.target_orientation = request.facing;
        self.transition(GameState::InteractionAnimation {
            started_at_tick: now_tick,
        });
        true
    }

    /// Fires the timed `InteractionAnimation -> SecondaryMode` transition.
    pub fn advance(&mut self, now_tick: u64) -> bool {
        let GameState::InteractionAnimation { started_at_tick } = self.state else {
            return false;
        };
        if now_tick.saturating_sub(started_at_tick) < self.animation_ticks {
            return false;
        }
        self.transition(GameState::SecondaryMode);
        true
    }

    pub fn cancel(&mut self) -> bool {
        if self.state != GameState::SecondaryMode {
            return false;
        }
        self.transition(GameState::Interior);
        true
    }

    pub fn animation_elapsed_ticks(&self, now_tick: u64) -> Option<u64> {
        match self.state {
            GameState::InteractionAnimation { started_at_tick } => {
                Some(now_tick.saturating_sub(started_at_tick))
            }
            _ => None,
        }
    }

    fn transition(&mut self, next: GameState) {
        info!(from = ?self.state.kind(), to = ?next.kind(), "state_changed");
        self.state = next;
    }
}
