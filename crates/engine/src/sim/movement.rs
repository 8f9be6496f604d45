use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::{classify, Naut, TileClass, TileMap, Vec2};

pub const ACCELERATION: f32 = 0.02;
/// Intent only accelerates an axis whose speed is below this.
pub const ACCELERATION_CUTOFF: f32 = 0.1;
pub const TURN_RATE_SHORT: f32 = 0.3;
pub const TURN_RATE_WRAP: f32 = 0.1;
pub const TURN_SNAP: f32 = 0.2;
pub const SPEED_TARGET: f32 = 1.0;
pub const SPEED_RATE: f32 = 0.06;
pub const FRICTION: f32 = 0.004;
pub const VELOCITY_SNAP: f32 = 0.01;
pub const PROBE_LEAD_ORTHOGONAL: f32 = 0.2;
pub const PROBE_LEAD_DIAGONAL: f32 = 0.1;
pub const BOUNCE_ORTHOGONAL: f32 = -0.7;
pub const BOUNCE_DIAGONAL: f32 = -0.5;

/// Per-tick directional request, each axis in `{-1, 0, 1}`. Screen axes: +y is down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    x: i8,
    y: i8,
}

impl MoveIntent {
    pub const NONE: MoveIntent = MoveIntent { x: 0, y: 0 };

    pub fn new(x: i8, y: i8) -> Self {
        Self {
            x: x.signum(),
            y: y.signum(),
        }
    }

    pub fn x(&self) -> i8 {
        self.x
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Collision probe directions in the order they are tested: clockwise from up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

const PROBE_ORDER: [ProbeDirection; 8] = [
    ProbeDirection::North,
    ProbeDirection::NorthEast,
    ProbeDirection::East,
    ProbeDirection::SouthEast,
    ProbeDirection::South,
    ProbeDirection::SouthWest,
    ProbeDirection::West,
    ProbeDirection::NorthWest,
];

impl ProbeDirection {
    fn unit_offset(self) -> (f32, f32) {
        match self {
            ProbeDirection::North => (0.0, -1.0),
            ProbeDirection::NorthEast => (1.0, -1.0),
            ProbeDirection::East => (1.0, 0.0),
            ProbeDirection::SouthEast => (1.0, 1.0),
            ProbeDirection::South => (0.0, 1.0),
            ProbeDirection::SouthWest => (-1.0, 1.0),
            ProbeDirection::West => (-1.0, 0.0),
            ProbeDirection::NorthWest => (-1.0, -1.0),
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            ProbeDirection::NorthEast
                | ProbeDirection::SouthEast
                | ProbeDirection::SouthWest
                | ProbeDirection::NorthWest
        )
    }

    fn lead(self) -> f32 {
        if self.is_diagonal() {
            PROBE_LEAD_DIAGONAL
        } else {
            PROBE_LEAD_ORTHOGONAL
        }
    }

    fn bounce(self, velocity: &mut Vec2) {
        match self {
            ProbeDirection::North | ProbeDirection::South => velocity.y *= BOUNCE_ORTHOGONAL,
            ProbeDirection::East | ProbeDirection::West => velocity.x *= BOUNCE_ORTHOGONAL,
            _ => {
                velocity.x *= BOUNCE_DIAGONAL;
                velocity.y *= BOUNCE_DIAGONAL;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Velocity was damped against the first solid probe; position unchanged.
    Blocked(ProbeDirection),
    /// Prospective position left the map; nothing changed.
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NautStepContext {
    /// Idle nauts face their target immediately (interior exploration only).
    pub snap_idle_orientation: bool,
}

pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

pub fn apply_intent(naut: &mut Naut, intent: MoveIntent) {
    if intent.is_zero() {
        return;
    }
    let x = f32::from(intent.x);
    let y = f32::from(intent.y);
    naut.target_orientation = normalize_angle(y.atan2(x) + FRAC_PI_2);

    if naut.velocity.x.abs() < ACCELERATION_CUTOFF {
        naut.velocity.x += x * ACCELERATION;
    }
    if naut.velocity.y.abs() < ACCELERATION_CUTOFF {
        naut.velocity.y += y * ACCELERATION;
    }
}

/// Turns toward the target: the short way when it does not cross the 0/2π seam,
/// otherwise the opposite way at a slower rate.
pub fn smooth_orientation(naut: &mut Naut) {
    let current = naut.orientation;
    let target = naut.target_orientation;
    if target != current {
        let step = if (target - current).abs() < PI {
            if current < target {
                TURN_RATE_SHORT
            } else {
                -TURN_RATE_SHORT
            }
        } else if current < target {
            -TURN_RATE_WRAP
        } else {
            TURN_RATE_WRAP
        };
        naut.orientation = normalize_angle(current + step);
    }

    let remaining = (naut.target_orientation - naut.orientation).abs();
    if remaining < TURN_SNAP || remaining >= TAU {
        naut.orientation = naut.target_orientation;
    }
}

pub fn smooth_speed(naut: &mut Naut, context: NautStepContext) {
    if naut.is_moving() {
        if naut.target_speed == 0.0 {
            naut.target_speed = SPEED_TARGET;
        }
        if naut.speed > SPEED_TARGET {
            naut.target_speed = -SPEED_TARGET;
        }
        if naut.speed < -SPEED_TARGET {
            naut.target_speed = SPEED_TARGET;
        }
    } else {
        naut.target_speed = 0.0;
        if context.snap_idle_orientation {
            naut.orientation = naut.target_orientation;
        }
    }

    if naut.speed > naut.target_speed {
        naut.speed -= SPEED_RATE;
    } else if naut.speed < naut.target_speed {
        naut.speed += SPEED_RATE;
    }
}

/// Attempts `position += velocity`, probing eight points around the prospective
/// body center. Only the first solid probe responds.
pub fn move_naut(naut: &mut Naut, map: &TileMap) -> MoveOutcome {
    let next = Vec2 {
        x: naut.position.x + naut.velocity.x,
        y: naut.position.y + naut.velocity.y,
    };
    let center = Vec2 {
        x: next.x + 0.5,
        y: next.y + 0.5,
    };
    if !map.contains_point(center) || !map.contains_point(next) {
        return MoveOutcome::OutOfBounds;
    }

    for direction in PROBE_ORDER {
        let (dx, dy) = direction.unit_offset();
        let lead = direction.lead();
        let probe_x = (center.x + dx * lead).floor() as i64;
        let probe_y = (center.y + dy * lead).floor() as i64;
        let solid = map
            .code_at_signed(probe_x, probe_y)
            .map(classify)
            .is_some_and(TileClass::blocks_movement);
        if solid {
            direction.bounce(&mut naut.velocity);
            return MoveOutcome::Blocked(direction);
        }
    }

    naut.position = next;
    MoveOutcome::Moved
}

fn apply_friction(component: &mut f32) {
    if *component < 0.0 {
        *component += FRICTION;
    } else if *component > 0.0 {
        *component -= FRICTION;
    }
    if component.abs() < VELOCITY_SNAP {
        *component = 0.0;
    }
}

/// Advances one naut by one tick. Returns `None` when the naut was not moving.
pub fn step_naut(naut: &mut Naut, map: &TileMap, context: NautStepContext) -> Option<MoveOutcome> {
    smooth_speed(naut, context);
    smooth_orientation(naut);

    if !naut.is_moving() {
        return None;
    }
    let outcome = move_naut(naut, map);
    apply_friction(&mut naut.velocity.x);
    apply_friction(&mut naut.velocity.y);
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{NautId, TileCoord};

    const EPS: f32 = 1e-5;

    fn open_map(width: u32, height: u32) -> TileMap {
        TileMap::new(width, height, vec![1; width as usize * height as usize]).expect("map")
    }

    fn map_with_walls(width: u32, height: u32, walls: &[(u32, u32)]) -> TileMap {
        let mut tiles = vec![1; width as usize * height as usize];
        for &(x, y) in walls {
            tiles[y as usize * width as usize + x as usize] = 2;
        }
        TileMap::new(width, height, tiles).expect("map")
    }

    fn naut_at(x: f32, y: f32) -> Naut {
        Naut::new(NautId(1), Vec2::new(x, y))
    }

    #[test]
    fn normalize_angle_wraps_into_range() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < EPS);
        assert_eq!(normalize_angle(TAU), 0.0);
        assert!((normalize_angle(TAU + 1.0) - 1.0).abs() < EPS);
        let tiny = normalize_angle(-1e-9);
        assert!((0.0..TAU).contains(&tiny));
    }

    #[test]
    fn intent_sets_target_orientation_per_direction() {
        let cases = [
            (MoveIntent::new(0, -1), 0.0),
            (MoveIntent::new(1, 0), FRAC_PI_2),
            (MoveIntent::new(0, 1), PI),
            (MoveIntent::new(-1, 0), 3.0 * FRAC_PI_2),
        ];
        for (intent, expected) in cases {
            let mut naut = naut_at(0.0, 0.0);
            apply_intent(&mut naut, intent);
            assert!(
                (naut.target_orientation - expected).abs() < EPS,
                "intent {intent:?} gave {}",
                naut.target_orientation
            );
        }
    }

    #[test]
    fn intent_accelerates_only_below_cutoff() {
        let mut naut = naut_at(0.0, 0.0);
        naut.velocity = Vec2::new(0.09, 0.1);
        apply_intent(&mut naut, MoveIntent::new(1, 1));

        assert!((naut.velocity.x - 0.11).abs() < EPS);
        assert_eq!(naut.velocity.y, 0.1);
    }

    #[test]
    fn zero_intent_changes_nothing() {
        let mut naut = naut_at(0.0, 0.0);
        let before = naut.clone();
        apply_intent(&mut naut, MoveIntent::NONE);
        assert_eq!(naut, before);
    }

    #[test]
    fn move_intent_clamps_to_unit_axes() {
        let intent = MoveIntent::new(5, -7);
        assert_eq!((intent.x(), intent.y()), (1, -1));
    }

    #[test]
    fn orientation_steps_short_way_then_snaps() {
        let mut naut = naut_at(0.0, 0.0);
        naut.orientation = 0.0;
        naut.target_orientation = 1.0;

        smooth_orientation(&mut naut);
        assert!((naut.orientation - 0.3).abs() < EPS);
        smooth_orientation(&mut naut);
        assert!((naut.orientation - 0.6).abs() < EPS);
        smooth_orientation(&mut naut);
        assert_eq!(naut.orientation, 1.0);
    }

    #[test]
    fn orientation_crossing_seam_turns_the_other_way_slowly() {
        let mut naut = naut_at(0.0, 0.0);
        naut.orientation = 0.1;
        naut.target_orientation = 6.0;

        smooth_orientation(&mut naut);
        assert!(naut.orientation.abs() < EPS);
        smooth_orientation(&mut naut);
        assert_eq!(naut.orientation, 6.0);
    }

    #[test]
    fn orientation_snaps_when_within_threshold() {
        let mut naut = naut_at(0.0, 0.0);
        naut.orientation = 1.0;
        naut.target_orientation = 1.15;
        smooth_orientation(&mut naut);
        assert_eq!(naut.orientation, 1.15);
    }

    #[test]
    fn moving_speed_oscillates_by_sign_reversal() {
        let mut naut = naut_at(0.0, 0.0);
        naut.velocity = Vec2::new(0.05, 0.0);
        let context = NautStepContext::default();
        let mut saw_positive_peak = false;
        let mut saw_negative = false;

        for _ in 0..80 {
            smooth_speed(&mut naut, context);
            assert!(naut.speed.abs() <= SPEED_TARGET + SPEED_RATE + EPS);
            saw_positive_peak |= naut.speed > SPEED_TARGET;
            saw_negative |= naut.speed < 0.0;
        }
        assert!(saw_positive_peak);
        assert!(saw_negative);
    }

    #[test]
    fn idle_naut_targets_zero_speed_and_snaps_orientation_in_interior() {
        let mut naut = naut_at(0.0, 0.0);
        naut.speed = 0.5;
        naut.target_speed = 1.0;
        naut.orientation = 0.0;
        naut.target_orientation = 2.0;

        smooth_speed(
            &mut naut,
            NautStepContext {
                snap_idle_orientation: true,
            },
        );
        assert_eq!(naut.target_speed, 0.0);
        assert!((naut.speed - 0.44).abs() < EPS);
        assert_eq!(naut.orientation, 2.0);
    }

    #[test]
    fn idle_naut_keeps_turning_outside_interior() {
        let mut naut = naut_at(0.0, 0.0);
        naut.orientation = 0.0;
        naut.target_orientation = 2.0;

        step_naut(&mut naut, &open_map(2, 2), NautStepContext::default());
        assert!((naut.orientation - 0.3).abs() < EPS);
    }

    #[test]
    fn eastward_wall_hit_reverses_and_damps_x_velocity() {
        let map = map_with_walls(4, 3, &[(2, 1)]);
        let mut naut = naut_at(1.3, 1.0);
        naut.velocity = Vec2::new(0.05, 0.0);

        let outcome = move_naut(&mut naut, &map);

        assert_eq!(outcome, MoveOutcome::Blocked(ProbeDirection::East));
        assert!((naut.velocity.x + 0.035).abs() < EPS);
        assert_eq!(naut.velocity.y, 0.0);
        assert_eq!(naut.position, Vec2::new(1.3, 1.0));
    }

    #[test]
    fn body_drifting_east_from_tile_origin_bounces_off_wall() {
        let map = map_with_walls(4, 3, &[(2, 1)]);
        let mut naut = naut_at(1.0, 1.0);
        naut.velocity = Vec2::new(0.05, 0.0);

        let mut bounced = false;
        for _ in 0..20 {
            let x_before = naut.position.x;
            if let MoveOutcome::Blocked(direction) = move_naut(&mut naut, &map) {
                assert_eq!(direction, ProbeDirection::East);
                assert!((naut.velocity.x + 0.035).abs() < EPS);
                assert_eq!(naut.position.x, x_before);
                bounced = true;
                break;
            }
        }
        assert!(bounced);
        assert!(naut.position.x < 1.35);
    }

    #[test]
    fn northward_wall_hit_reverses_and_damps_y_velocity() {
        let map = map_with_walls(3, 3, &[(1, 0)]);
        let mut naut = naut_at(1.0, 0.75);
        naut.velocity = Vec2::new(0.0, -0.06);

        let outcome = move_naut(&mut naut, &map);

        assert_eq!(outcome, MoveOutcome::Blocked(ProbeDirection::North));
        assert!(naut.velocity.y > 0.0);
        assert!(naut.velocity.y <= 0.7 * 0.06 + EPS);
        assert_eq!(naut.position, Vec2::new(1.0, 0.75));
    }

    #[test]
    fn diagonal_corner_hit_halves_and_reverses_both_axes() {
        let map = map_with_walls(3, 3, &[(2, 0)]);
        let mut naut = naut_at(1.4, 0.52);
        naut.velocity = Vec2::new(0.05, 0.05);

        let outcome = move_naut(&mut naut, &map);

        assert_eq!(outcome, MoveOutcome::Blocked(ProbeDirection::NorthEast));
        assert!((naut.velocity.x + 0.025).abs() < EPS);
        assert!((naut.velocity.y + 0.025).abs() < EPS);
    }

    #[test]
    fn console_tile_is_solid_for_movement() {
        let mut tiles = vec![1; 12];
        tiles[4 + 2] = crate::sim::CONSOLE_TILE;
        let map = TileMap::new(4, 3, tiles).expect("map");
        let mut naut = naut_at(1.3, 1.0);
        naut.velocity = Vec2::new(0.05, 0.0);

        assert_eq!(
            move_naut(&mut naut, &map),
            MoveOutcome::Blocked(ProbeDirection::East)
        );
    }

    #[test]
    fn move_leaving_map_is_rejected_without_damping() {
        let map = open_map(3, 3);
        let mut naut = naut_at(0.0, 1.0);
        naut.velocity = Vec2::new(-0.6, 0.0);

        assert_eq!(move_naut(&mut naut, &map), MoveOutcome::OutOfBounds);
        assert_eq!(naut.position, Vec2::new(0.0, 1.0));
        assert_eq!(naut.velocity, Vec2::new(-0.6, 0.0));

        naut.velocity = Vec2::new(-0.2, 0.0);
        assert_eq!(move_naut(&mut naut, &map), MoveOutcome::OutOfBounds);
    }

    #[test]
    fn probe_outside_map_is_not_a_collision() {
        let map = open_map(2, 1);
        let mut naut = naut_at(0.0, 0.38);
        naut.velocity = Vec2::new(0.02, 0.02);

        assert_eq!(move_naut(&mut naut, &map), MoveOutcome::Moved);
        assert!((naut.position.x - 0.02).abs() < EPS);
        assert!((naut.position.y - 0.4).abs() < EPS);
    }

    #[test]
    fn friction_brings_velocity_to_exact_zero() {
        let map = open_map(8, 8);
        let mut naut = naut_at(3.0, 3.0);
        naut.velocity = Vec2::new(0.1, -0.05);
        let context = NautStepContext {
            snap_idle_orientation: true,
        };

        let mut previous = naut.velocity.x.hypot(naut.velocity.y);
        let mut ticks = 0;
        while naut.is_moving() {
            step_naut(&mut naut, &map, context);
            let magnitude = naut.velocity.x.hypot(naut.velocity.y);
            assert!(magnitude < previous);
            previous = magnitude;
            ticks += 1;
            assert!(ticks <= 30, "velocity did not settle");
        }
        assert_eq!(naut.velocity, Vec2::ZERO);
        assert_eq!(step_naut(&mut naut, &map, context), None);
    }

    #[test]
    fn step_reports_move_outcome_for_moving_naut() {
        let map = open_map(4, 4);
        let mut naut = naut_at(1.0, 1.0);
        apply_intent(&mut naut, MoveIntent::new(1, 0));

        let outcome = step_naut(&mut naut, &map, NautStepContext::default());

        assert_eq!(outcome, Some(MoveOutcome::Moved));
        assert!((naut.position.x - 1.02).abs() < EPS);
        assert!((naut.velocity.x - 0.016).abs() < EPS);
        assert_eq!(map.class_at(TileCoord::new(1, 1)), Some(TileClass::Walkable));
    }
}
