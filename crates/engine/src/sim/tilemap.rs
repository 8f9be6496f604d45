use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::Vec2;

/// Edge length of one tile in world pixels. Click positions arrive in this space.
pub const TILE_SIZE_PX: u32 = 48;
/// Ship-computer console.
pub const CONSOLE_TILE: i32 = 17;
/// Floor variant that also marks where the player starts.
pub const SPAWN_TILE: i32 = 7;

/// Behavioral category of a tile code, shared by collision and interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TileClass {
    Empty,
    Walkable,
    Blocking,
    Interactive,
}

impl TileClass {
    /// Whether a body may not enter a tile of this class. Consoles are solid fixtures.
    pub fn blocks_movement(self) -> bool {
        matches!(self, TileClass::Blocking | TileClass::Interactive)
    }
}

pub fn classify(code: i32) -> TileClass {
    match code {
        i32::MIN..=0 => TileClass::Empty,
        CONSOLE_TILE => TileClass::Interactive,
        2 | 3 | 5 | 8..=25 => TileClass::Blocking,
        _ => TileClass::Walkable,
    }
}

/// Decoration codes drawn on top of a plain floor tile.
pub fn tile_needs_floor_underlay(code: i32) -> bool {
    code == 4 || (6..=16).contains(&code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileMapError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("failed to read map file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map description is missing its {name}")]
    MissingDimension { name: &'static str },
    #[error("map {name} must be a positive integer, got '{token}'")]
    InvalidDimension { name: &'static str, token: String },
    #[error("tile {index} is not an integer: '{token}'")]
    InvalidTileCode { index: usize, token: String },
    #[error("map is truncated: expected {expected} tiles, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("map has {extra} unexpected token(s) after {expected} tiles")]
    TrailingTokens { expected: usize, extra: usize },
    #[error(transparent)]
    Grid(#[from] TileMapError),
}

/// Tile grid origin convention:
/// - tile (0,0) covers world tile units `[0,1) x [0,1)`, rows grow downward.
/// - The center of tile (x,y) is `(x + 0.5, y + 0.5)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<i32>,
}

impl TileMap {
    pub fn new(width: u32, height: u32, tiles: Vec<i32>) -> Result<Self, TileMapError> {
        if width == 0 || height == 0 {
            return Err(TileMapError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TileMapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn load(path: &Path) -> Result<Self, MapLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| MapLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parses `width height code*` with exactly `width * height` codes in row-major order.
    pub fn parse(source: &str) -> Result<Self, MapLoadError> {
        let mut tokens = source.split_whitespace();
        let width = parse_dimension(tokens.next(), "width")?;
        let height = parse_dimension(tokens.next(), "height")?;
        let expected = width as usize * height as usize;

        let mut tiles = Vec::with_capacity(expected);
        for (index, token) in tokens.by_ref().take(expected).enumerate() {
            let code = token
                .parse::<i32>()
                .map_err(|_| MapLoadError::InvalidTileCode {
                    index,
                    token: token.to_string(),
                })?;
            tiles.push(code);
        }
        if tiles.len() < expected {
            return Err(MapLoadError::Truncated {
                expected,
                actual: tiles.len(),
            });
        }
        let extra = tokens.count();
        if extra > 0 {
            return Err(MapLoadError::TrailingTokens { expected, extra });
        }

        Ok(Self::new(width, height, tiles)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    pub fn code_at(&self, coord: TileCoord) -> Option<i32> {
        self.index_of(coord)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn code_at_signed(&self, x: i64, y: i64) -> Option<i32> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        self.code_at(TileCoord { x, y })
    }

    pub fn class_at(&self, coord: TileCoord) -> Option<TileClass> {
        self.code_at(coord).map(classify)
    }

    /// Maps a world pixel position onto the tile containing it.
    pub fn tile_at_world(&self, world_x: f32, world_y: f32) -> Option<TileCoord> {
        if !world_x.is_finite() || !world_y.is_finite() || world_x < 0.0 || world_y < 0.0 {
            return None;
        }
        let tile_size = TILE_SIZE_PX as f32;
        let x = (world_x / tile_size).floor() as u64;
        let y = (world_y / tile_size).floor() as u64;
        let coord = TileCoord {
            x: u32::try_from(x).ok()?,
            y: u32::try_from(y).ok()?,
        };
        self.index_of(coord)?;
        Some(coord)
    }

    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        Vec2 {
            x: coord.x as f32 + 0.5,
            y: coord.y as f32 + 0.5,
        }
    }

    /// Last spawn marker found scanning each column top to bottom, columns left to right.
    pub fn spawn_point(&self) -> Option<TileCoord> {
        let mut found = None;
        for x in 0..self.width {
            for y in 0..self.height {
                let coord = TileCoord { x, y };
                if self.code_at(coord) == Some(SPAWN_TILE) {
                    found = Some(coord);
                }
            }
        }
        found
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }
}

fn parse_dimension(token: Option<&str>, name: &'static str) -> Result<u32, MapLoadError> {
    let token = token.ok_or(MapLoadError::MissingDimension { name })?;
    match token.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(MapLoadError::InvalidDimension {
            name,
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn two_by_one_description_loads_console_tile() {
        let map = TileMap::parse("2 1 0 17").expect("map");

        assert_eq!(map.width(), 2);
        assert_eq!(map.height(), 1);
        assert_eq!(map.class_at(TileCoord::new(0, 0)), Some(TileClass::Empty));
        assert_eq!(
            map.class_at(TileCoord::new(1, 0)),
            Some(TileClass::Interactive)
        );
    }

    #[test]
    fn parse_accepts_newlines_and_tabs_between_codes() {
        let map = TileMap::parse("3 2\n1 2 3\n\t4 5 6\n").expect("map");
        assert_eq!(map.tiles(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(map.code_at(TileCoord::new(2, 1)), Some(6));
    }

    #[test]
    fn parse_rejects_truncated_grid() {
        let error = TileMap::parse("2 2 1 1 1").expect_err("truncated");
        assert!(matches!(
            error,
            MapLoadError::Truncated {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn parse_rejects_trailing_tokens() {
        let error = TileMap::parse("1 1 1 9 9").expect_err("trailing");
        assert!(matches!(
            error,
            MapLoadError::TrailingTokens {
                expected: 1,
                extra: 2
            }
        ));
    }

    #[test]
    fn parse_rejects_missing_and_invalid_dimensions() {
        assert!(matches!(
            TileMap::parse("").expect_err("empty"),
            MapLoadError::MissingDimension { name: "width" }
        ));
        assert!(matches!(
            TileMap::parse("4").expect_err("no height"),
            MapLoadError::MissingDimension { name: "height" }
        ));
        assert!(matches!(
            TileMap::parse("0 3").expect_err("zero width"),
            MapLoadError::InvalidDimension { name: "width", .. }
        ));
        assert!(matches!(
            TileMap::parse("2 -1 0 0").expect_err("negative height"),
            MapLoadError::InvalidDimension { name: "height", .. }
        ));
    }

    #[test]
    fn parse_reports_index_of_bad_tile_code() {
        let error = TileMap::parse("3 1 1 x 1").expect_err("bad code");
        match error {
            MapLoadError::InvalidTileCode { index, token } => {
                assert_eq!(index, 1);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn new_rejects_length_mismatch() {
        assert_eq!(
            TileMap::new(2, 2, vec![1; 3]),
            Err(TileMapError::TileCountMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn load_reads_map_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "2 2\n1 2\n7 17\n").expect("write");

        let map = TileMap::load(file.path()).expect("load");
        assert_eq!(map.spawn_point(), Some(TileCoord::new(0, 1)));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.lvl");

        match TileMap::load(&missing).expect_err("missing") {
            MapLoadError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn classify_is_total_over_code_ranges() {
        assert_eq!(classify(-3), TileClass::Empty);
        assert_eq!(classify(0), TileClass::Empty);
        assert_eq!(classify(1), TileClass::Walkable);
        for code in [2, 3, 5, 8, 16, 18, 25] {
            assert_eq!(classify(code), TileClass::Blocking, "code {code}");
        }
        for code in [4, 6, 7, 26, 99] {
            assert_eq!(classify(code), TileClass::Walkable, "code {code}");
        }
        assert_eq!(classify(CONSOLE_TILE), TileClass::Interactive);
    }

    #[test]
    fn console_blocks_movement_but_floor_does_not() {
        assert!(TileClass::Interactive.blocks_movement());
        assert!(TileClass::Blocking.blocks_movement());
        assert!(!TileClass::Walkable.blocks_movement());
        assert!(!TileClass::Empty.blocks_movement());
    }

    #[test]
    fn floor_underlay_matches_decoration_codes() {
        assert!(tile_needs_floor_underlay(4));
        assert!(tile_needs_floor_underlay(6));
        assert!(tile_needs_floor_underlay(16));
        assert!(!tile_needs_floor_underlay(1));
        assert!(!tile_needs_floor_underlay(17));
    }

    #[test]
    fn tile_at_world_divides_by_tile_size_and_bounds_checks() {
        let map = TileMap::new(3, 2, vec![1; 6]).expect("map");

        assert_eq!(map.tile_at_world(0.0, 0.0), Some(TileCoord::new(0, 0)));
        assert_eq!(map.tile_at_world(47.9, 47.9), Some(TileCoord::new(0, 0)));
        assert_eq!(map.tile_at_world(48.0, 50.0), Some(TileCoord::new(1, 1)));
        assert_eq!(map.tile_at_world(143.0, 95.0), Some(TileCoord::new(2, 1)));
        assert_eq!(map.tile_at_world(144.0, 10.0), None);
        assert_eq!(map.tile_at_world(10.0, 96.0), None);
        assert_eq!(map.tile_at_world(-1.0, 10.0), None);
        assert_eq!(map.tile_at_world(f32::NAN, 10.0), None);
    }

    #[test]
    fn out_of_range_queries_return_none() {
        let map = TileMap::new(2, 2, vec![1; 4]).expect("map");
        assert_eq!(map.code_at(TileCoord::new(2, 0)), None);
        assert_eq!(map.code_at_signed(-1, 0), None);
        assert_eq!(map.code_at_signed(0, 5), None);
        assert_eq!(map.class_at(TileCoord::new(0, 2)), None);
    }

    #[test]
    fn spawn_point_prefers_last_marker_in_column_scan() {
        // Markers at (2,0) and (0,1): column scan visits (0,1) before (2,0).
        let map = TileMap::parse("3 2 1 1 7 7 1 1").expect("map");
        assert_eq!(map.spawn_point(), Some(TileCoord::new(2, 0)));

        let no_marker = TileMap::parse("1 1 1").expect("map");
        assert_eq!(no_marker.spawn_point(), None);
    }

    #[test]
    fn tile_center_is_offset_by_half_a_tile() {
        let map = TileMap::new(4, 4, vec![1; 16]).expect("map");
        assert_eq!(map.tile_center(TileCoord::new(3, 1)), Vec2::new(3.5, 1.5));
    }
}
