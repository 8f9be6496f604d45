use crate::sim::{TileMap, Vec2, TILE_SIZE_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World-pixel position of the viewport's top-left corner when the map is centered.
pub fn map_view_offset_px(map: &TileMap, viewport: Viewport) -> (i32, i32) {
    let tile = TILE_SIZE_PX as i64;
    let x = map.width() as i64 * tile / 2 - viewport.width as i64 / 2;
    let y = map.height() as i64 * tile / 2 - viewport.height as i64 / 2;
    (clamp_i32(x), clamp_i32(y))
}

pub fn screen_to_world_px(screen: Vec2, map: &TileMap, viewport: Viewport) -> Vec2 {
    let (offset_x, offset_y) = map_view_offset_px(map, viewport);
    Vec2 {
        x: screen.x + offset_x as f32,
        y: screen.y + offset_y as f32,
    }
}

/// Screen pixel of a position given in tile units.
pub fn world_to_screen_px(world_tiles: Vec2, map: &TileMap, viewport: Viewport) -> (i32, i32) {
    let (offset_x, offset_y) = map_view_offset_px(map, viewport);
    let tile = TILE_SIZE_PX as f32;
    let x = world_tiles.x * tile - offset_x as f32;
    let y = world_tiles.y * tile - offset_y as f32;
    (x.round() as i32, y.round() as i32)
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
