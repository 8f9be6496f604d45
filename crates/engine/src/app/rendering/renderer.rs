use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::sim::{
    classify, tile_needs_floor_underlay, GameSession, HoverTarget, NautView, StateKind, TileClass,
    TileCoord, TileMap, Vec2, TILE_SIZE_PX,
};

use super::{map_view_offset_px, screen_to_world_px, world_to_screen_px, Viewport};

const CLEAR_COLOR: [u8; 4] = [10, 11, 16, 255];
const FLOOR_COLOR: [u8; 4] = [62, 66, 76, 255];
const FLOOR_DETAIL_COLOR: [u8; 4] = [84, 90, 104, 255];
const WALL_COLOR: [u8; 4] = [118, 124, 138, 255];
const FIXTURE_COLOR: [u8; 4] = [96, 108, 128, 255];
const CONSOLE_COLOR: [u8; 4] = [64, 190, 170, 255];
const PLAYER_COLORS: [[u8; 4]; 3] = [
    [230, 200, 90, 255],
    [240, 214, 120, 255],
    [250, 228, 150, 255],
];
const CREW_COLORS: [[u8; 4]; 3] = [
    [170, 120, 220, 255],
    [186, 140, 230, 255],
    [202, 160, 240, 255],
];
const FACING_MARKER_COLOR: [u8; 4] = [250, 250, 250, 255];
const STRIDE_MARKER_COLOR: [u8; 4] = [40, 40, 48, 255];
const CURSOR_COLOR: [u8; 4] = [220, 220, 240, 255];
const HOVER_IN_RANGE_COLOR: [u8; 4] = [255, 210, 70, 255];
const HOVER_OUT_OF_RANGE_COLOR: [u8; 4] = [128, 105, 35, 255];
const GALAXY_BACKDROP_COLOR: [u8; 4] = [6, 8, 26, 255];
const STAR_COLOR: [u8; 4] = [210, 215, 255, 255];
const STAR_COUNT: u32 = 160;

const NAUT_HALF_SIZE_PX: i32 = 14;
const FACING_MARKER_DISTANCE_PX: f32 = 16.0;
const FACING_MARKER_HALF_SIZE_PX: i32 = 4;
const STRIDE_MARKER_HALF_SIZE_PX: i32 = 3;
const TILE_INSET_PX: i32 = 10;
const CURSOR_HALF_SIZE_PX: i32 = 3;
const CONSOLE_ZOOM_INSET_PX: i32 = 32;
const CONSOLE_ZOOM_GROWTH_PER_MS: i64 = 5;
const CONSOLE_ZOOM_DRIFT_PER_MS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TilePaint {
    base: [u8; 4],
    inset: Option<[u8; 4]>,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_session(
        &mut self,
        session: &GameSession,
        cursor_px: Option<Vec2>,
    ) -> Result<(), Error> {
        let viewport = self.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Ok(());
        }

        let snapshot = session.snapshot();
        let frame = self.pixels.frame_mut();
        fill_frame(frame, CLEAR_COLOR);

        match snapshot.state {
            StateKind::Interior => {
                draw_tilemap(frame, viewport, session.map());
                for naut in &snapshot.nauts {
                    draw_naut(
                        frame,
                        viewport,
                        session.map(),
                        naut,
                        naut.id == snapshot.player,
                    );
                }
            }
            StateKind::InteractionAnimation => {
                let elapsed_ms = snapshot.animation_elapsed_ms.unwrap_or(0);
                draw_console_zoom(frame, viewport, elapsed_ms);
            }
            StateKind::SecondaryMode => draw_galaxy_backdrop(frame, viewport),
        }

        if let Some(cursor) = cursor_px {
            let hover = session.hover(screen_to_world_px(cursor, session.map(), viewport));
            draw_cursor(frame, viewport, session.map(), cursor, hover);
        }

        self.pixels.render()
    }
}

fn draw_tilemap(frame: &mut [u8], viewport: Viewport, map: &TileMap) {
    let (offset_x, offset_y) = map_view_offset_px(map, viewport);
    let tile = TILE_SIZE_PX as i32;

    for y in 0..map.height() {
        for x in 0..map.width() {
            let Some(code) = map.code_at(TileCoord::new(x, y)) else {
                continue;
            };
            let Some(paint) = tile_paint(code) else {
                continue;
            };
            let rect = ScreenRectPx {
                left: x as i32 * tile - offset_x,
                top: y as i32 * tile - offset_y,
                width: tile,
                height: tile,
            };
            if !rect_intersects_viewport(rect, viewport) {
                continue;
            }
            fill_rect(frame, viewport, rect, paint.base);
            if let Some(inset) = paint.inset {
                let inner = ScreenRectPx {
                    left: rect.left + TILE_INSET_PX,
                    top: rect.top + TILE_INSET_PX,
                    width: tile - 2 * TILE_INSET_PX,
                    height: tile - 2 * TILE_INSET_PX,
                };
                fill_rect(frame, viewport, inner, inset);
            }
        }
    }
}

/// Flat colors per tile class; decorations sit on a floor underlay.
fn tile_paint(code: i32) -> Option<TilePaint> {
    let class_color = match classify(code) {
        TileClass::Empty => return None,
        TileClass::Walkable => FLOOR_COLOR,
        TileClass::Blocking => WALL_COLOR,
        TileClass::Interactive => CONSOLE_COLOR,
    };
    if !tile_needs_floor_underlay(code) {
        return Some(TilePaint {
            base: class_color,
            inset: None,
        });
    }
    let inset = if classify(code).blocks_movement() {
        FIXTURE_COLOR
    } else {
        FLOOR_DETAIL_COLOR
    };
    Some(TilePaint {
        base: FLOOR_COLOR,
        inset: Some(inset),
    })
}

fn draw_naut(frame: &mut [u8], viewport: Viewport, map: &TileMap, naut: &NautView, player: bool) {
    let center = Vec2::new(naut.position.x + 0.5, naut.position.y + 0.5);
    let (cx, cy) = world_to_screen_px(center, map, viewport);
    let palette = if player { PLAYER_COLORS } else { CREW_COLORS };
    let body_color = palette[usize::from(naut.walk_frame().min(2))];
    draw_square(frame, viewport, cx, cy, NAUT_HALF_SIZE_PX, body_color);

    if naut.walk_frame() > 0 {
        let side = if naut.flipped() { -1 } else { 1 };
        draw_square(
            frame,
            viewport,
            cx + side * (NAUT_HALF_SIZE_PX - STRIDE_MARKER_HALF_SIZE_PX),
            cy + NAUT_HALF_SIZE_PX - STRIDE_MARKER_HALF_SIZE_PX,
            STRIDE_MARKER_HALF_SIZE_PX,
            STRIDE_MARKER_COLOR,
        );
    }

    let (dx, dy) = facing_marker_offset(naut.orientation);
    draw_square(
        frame,
        viewport,
        cx + dx,
        cy + dy,
        FACING_MARKER_HALF_SIZE_PX,
        FACING_MARKER_COLOR,
    );
}

/// Orientation 0 faces screen up and grows clockwise.
fn facing_marker_offset(orientation: f32) -> (i32, i32) {
    let x = orientation.sin() * FACING_MARKER_DISTANCE_PX;
    let y = -orientation.cos() * FACING_MARKER_DISTANCE_PX;
    (x.round() as i32, y.round() as i32)
}

/// Console screen that grows from near window size and slides down as the animation runs.
fn console_zoom_rect(viewport: Viewport, elapsed_ms: u64) -> ScreenRectPx {
    let width = viewport.width as i64;
    let height = viewport.height as i64;
    let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX / CONSOLE_ZOOM_GROWTH_PER_MS);
    let size = (height - CONSOLE_ZOOM_INSET_PX as i64)
        .saturating_add(elapsed.saturating_mul(CONSOLE_ZOOM_GROWTH_PER_MS));
    let left = width / 2 - size / 2;
    let top = (height - size) as f32 + elapsed as f32 * CONSOLE_ZOOM_DRIFT_PER_MS;
    ScreenRectPx {
        left: clamp_i32(left),
        top: clamp_i32(top as i64),
        width: clamp_i32(size),
        height: clamp_i32(size),
    }
}

fn draw_console_zoom(frame: &mut [u8], viewport: Viewport, elapsed_ms: u64) {
    let rect = console_zoom_rect(viewport, elapsed_ms);
    fill_rect(frame, viewport, rect, CONSOLE_COLOR);
    let inset = rect.width / 8;
    let screen = ScreenRectPx {
        left: rect.left.saturating_add(inset),
        top: rect.top.saturating_add(inset),
        width: rect.width.saturating_sub(2 * inset),
        height: rect.height.saturating_sub(2 * inset),
    };
    fill_rect(frame, viewport, screen, GALAXY_BACKDROP_COLOR);
}

fn draw_galaxy_backdrop(frame: &mut [u8], viewport: Viewport) {
    fill_frame(frame, GALAXY_BACKDROP_COLOR);
    for index in 0..STAR_COUNT {
        let (x, y) = star_position(index, viewport);
        write_pixel_rgba_clipped(frame, viewport, x, y, STAR_COLOR);
    }
}

/// Fixed pseudo-random star field so the backdrop is stable between frames.
fn star_position(index: u32, viewport: Viewport) -> (i32, i32) {
    let hash = index.wrapping_mul(2_654_435_761).rotate_left(13) ^ index.wrapping_mul(40_503);
    let x = hash % viewport.width.max(1);
    let y = (hash / viewport.width.max(1)) % viewport.height.max(1);
    (x as i32, y as i32)
}

fn draw_cursor(
    frame: &mut [u8],
    viewport: Viewport,
    map: &TileMap,
    cursor: Vec2,
    hover: Option<HoverTarget>,
) {
    if let Some(target) = hover {
        let color = if target.in_range {
            HOVER_IN_RANGE_COLOR
        } else {
            HOVER_OUT_OF_RANGE_COLOR
        };
        let center = map.tile_center(target.tile);
        let (cx, cy) = world_to_screen_px(center, map, viewport);
        let half_size = TILE_SIZE_PX as i32 / 2;
        draw_square_outline(frame, viewport, cx, cy, half_size, color);
        draw_square_outline(frame, viewport, cx, cy, half_size - 1, color);
    }
    draw_square(
        frame,
        viewport,
        cursor.x.round() as i32,
        cursor.y.round() as i32,
        CURSOR_HALF_SIZE_PX,
        CURSOR_COLOR,
    );
}

fn rect_intersects_viewport(rect: ScreenRectPx, viewport: Viewport) -> bool {
    rect.left < viewport.width as i32
        && rect.top < viewport.height as i32
        && rect.left.saturating_add(rect.width) > 0
        && rect.top.saturating_add(rect.height) > 0
}

fn fill_frame(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    if rect.width <= 0 || rect.height <= 0 {
        return;
    }
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.left.saturating_add(rect.width).min(viewport.width as i32);
    let bottom = rect.top.saturating_add(rect.height).min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(viewport.width as usize)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn draw_square(
    frame: &mut [u8],
    viewport: Viewport,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let rect = ScreenRectPx {
        left: cx - half_size,
        top: cy - half_size,
        width: half_size * 2 + 1,
        height: half_size * 2 + 1,
    };
    fill_rect(frame, viewport, rect, color);
}

fn draw_square_outline(
    frame: &mut [u8],
    viewport: Viewport,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let left = cx - half_size;
    let right = cx + half_size;
    let top = cy - half_size;
    let bottom = cy + half_size;

    for x in left..=right {
        write_pixel_rgba_clipped(frame, viewport, x, top, color);
        write_pixel_rgba_clipped(frame, viewport, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, viewport, left, y, color);
        write_pixel_rgba_clipped(frame, viewport, right, y, color);
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
