use std::f32::consts::PI;

use serde::Serialize;

use super::Vec2;

const WALK_FRAME_FAST_SPEED: f32 = 0.8;
const WALK_FRAME_MID_SPEED: f32 = 0.5;
const FLIP_SPEED: f32 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NautId(pub u64);

/// Kinematic body of a crew member. `position` is the top-left of a one-tile body.
#[derive(Debug, Clone, PartialEq)]
pub struct Naut {
    pub id: NautId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Current facing in radians, kept in `[0, 2π)`.
    pub orientation: f32,
    pub target_orientation: f32,
    /// Walk-cycle phase; oscillates through roughly `[-1, 1]` while moving.
    pub speed: f32,
    pub target_speed: f32,
}

impl Naut {
    pub fn new(id: NautId, position: Vec2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            orientation: PI,
            target_orientation: PI,
            speed: 0.0,
            target_speed: 0.0,
        }
    }

    pub fn is_moving(&self) -> bool {
        !self.velocity.is_zero()
    }

    pub fn body_center(&self) -> Vec2 {
        Vec2 {
            x: self.position.x + 0.5,
            y: self.position.y + 0.5,
        }
    }

    pub fn view(&self) -> NautView {
        NautView {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
            speed: self.speed,
        }
    }
}

/// Read-only copy of the fields a renderer needs for sprite selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NautView {
    pub id: NautId,
    pub position: Vec2,
    pub orientation: f32,
    pub speed: f32,
}

impl NautView {
    /// Walk animation frame: 0 standing, 1 mid stride, 2 full stride.
    pub fn walk_frame(&self) -> u8 {
        let magnitude = self.speed.abs();
        if magnitude > WALK_FRAME_FAST_SPEED {
            2
        } else if magnitude > WALK_FRAME_MID_SPEED {
            1
        } else {
            0
        }
    }

    pub fn flipped(&self) -> bool {
        self.speed < FLIP_SPEED
    }
}
