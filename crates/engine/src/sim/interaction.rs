use std::f32::consts::FRAC_PI_2;

use serde::Serialize;

use super::{normalize_angle, Naut, TileClass, TileCoord, TileMap, Vec2};

/// Squared reach, in tile units, from the player's body center to a console center.
/// The body center is `(x + 0.5, y + 0.5)`, not the top-left corner of the naut.
pub const INTERACTION_RANGE_SQ: f32 = 1.6 * 1.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRequest {
    pub tile: TileCoord,
    /// Orientation that faces the console from the player's position.
    pub facing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HoverTarget {
    pub tile: TileCoord,
    pub in_range: bool,
}

/// Decides whether a click at `click_world` (world pixels) activates a console.
pub fn resolve(click_world: Vec2, player: &Naut, map: &TileMap) -> Option<TransitionRequest> {
    let tile = console_under(click_world, map)?;
    let (dx, dy) = offset_to_tile(player, map, tile);
    if dx * dx + dy * dy > INTERACTION_RANGE_SQ {
        return None;
    }
    Some(TransitionRequest {
        tile,
        facing: normalize_angle(dy.atan2(dx) + FRAC_PI_2),
    })
}

/// Console under the cursor, if any, and whether it is close enough to use.
pub fn hover(cursor_world: Vec2, player: &Naut, map: &TileMap) -> Option<HoverTarget> {
    let tile = console_under(cursor_world, map)?;
    let (dx, dy) = offset_to_tile(player, map, tile);
    Some(HoverTarget {
        tile,
        in_range: dx * dx + dy * dy <= INTERACTION_RANGE_SQ,
    })
}

fn console_under(world: Vec2, map: &TileMap) -> Option<TileCoord> {
    let tile = map.tile_at_world(world.x, world.y)?;
    (map.class_at(tile)? == TileClass::Interactive).then_some(tile)
}

fn offset_to_tile(player: &Naut, map: &TileMap, tile: TileCoord) -> (f32, f32) {
    let target = map.tile_center(tile);
    let origin = player.body_center();
    (target.x - origin.x, target.y - origin.y)
}
