//! Projection between geographic coordinates and the global pixel grid, plus the packed keys that address tiles and blocks.
//!
//! The world is projected with spherical Mercator onto a square of [`MAP_WIDTH`] tiles. Nothing here clamps or wraps: callers
//! must keep latitudes inside the Mercator range, and the antimeridian is not handled.

use crate::constants::*;
use crate::units::{PixelUnits, TileUnits};

use fogmap_core::LngLat;
use std::f64::consts::PI;

/// Fractional tile coordinates of `p`.
pub fn lng_lat_to_tile_xy(p: LngLat) -> TileUnits<[f64; 2]> {
    let x = ((p.lng + 180.0) / 360.0) * MAP_WIDTH as f64;
    let y = ((PI - (p.lat / 180.0 * PI).tan().asinh()) * MAP_WIDTH as f64) / (2.0 * PI);
    TileUnits([x, y])
}

/// Inverse of [`lng_lat_to_tile_xy`].
pub fn tile_xy_to_lng_lat(TileUnits([x, y]): TileUnits<[f64; 2]>) -> LngLat {
    let lng = (x / MAP_WIDTH as f64) * 360.0 - 180.0;
    let lat = (PI - (2.0 * PI * y) / MAP_WIDTH as f64).sinh().atan() * 180.0 / PI;
    LngLat::new(lng, lat)
}

/// Fractional global pixel coordinates of `p`.
///
/// Scaling from tile units is by a power of two, so this is exact with respect to [`lng_lat_to_tile_xy`].
pub fn lng_lat_to_pixel_xy(p: LngLat) -> PixelUnits<[f64; 2]> {
    PixelUnits(lng_lat_to_tile_xy(p).into_inner().map(|c| c * TILE_PIXEL_WIDTH as f64))
}

/// The global pixel containing `p`.
pub fn lng_lat_to_global_xy(p: LngLat) -> PixelUnits<[i64; 2]> {
    lng_lat_to_pixel_xy(p).map(|xy| xy.map(|c| c.floor() as i64))
}

/// Geographic coordinates of the north-west corner of the global pixel `(x, y)`.
pub fn global_xy_to_lng_lat(PixelUnits([x, y]): PixelUnits<[i64; 2]>) -> LngLat {
    let scale = TILE_PIXEL_WIDTH as f64;
    tile_xy_to_lng_lat(TileUnits([x as f64 / scale, y as f64 / scale]))
}

/// Identifies a tile by its position in the world. `id = y * MAP_WIDTH + x`.
pub type TileId = u32;

/// Packed tile coordinates, `x << 9 | y`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TileKey(u32);

impl TileKey {
    const SHIFT: u32 = 9;
    const MASK: u32 = (1 << Self::SHIFT) - 1;

    /// Returns `None` if `(x, y)` is outside of the world.
    pub fn new(x: i64, y: i64) -> Option<Self> {
        let range = 0..MAP_WIDTH;
        (range.contains(&x) && range.contains(&y)).then(|| Self(((x as u32) << Self::SHIFT) | y as u32))
    }

    pub fn from_id(id: TileId) -> Option<Self> {
        let id = i64::from(id);
        Self::new(id % MAP_WIDTH, id / MAP_WIDTH)
    }

    /// The tile containing global pixel `p`.
    pub fn containing(PixelUnits([x, y]): PixelUnits<[i64; 2]>) -> Option<Self> {
        Self::new(x >> ALL_OFFSET, y >> ALL_OFFSET)
    }

    pub fn x(&self) -> i64 {
        i64::from(self.0 >> Self::SHIFT)
    }

    pub fn y(&self) -> i64 {
        i64::from(self.0 & Self::MASK)
    }

    pub fn id(&self) -> TileId {
        (self.y() * MAP_WIDTH + self.x()) as TileId
    }

    /// Global pixel coordinates of this tile's first pixel.
    pub fn pixel_origin(&self) -> PixelUnits<[i64; 2]> {
        PixelUnits([self.x() << ALL_OFFSET, self.y() << ALL_OFFSET])
    }
}

/// Packed block coordinates within a tile, `x << 7 | y`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct BlockSlot(u16);

impl BlockSlot {
    const SHIFT: u32 = TILE_WIDTH_OFFSET;
    const MASK: u16 = (1 << Self::SHIFT) - 1;

    /// Returns `None` if `(x, y)` is outside of a tile.
    pub fn new(x: i64, y: i64) -> Option<Self> {
        let range = 0..TILE_WIDTH;
        (range.contains(&x) && range.contains(&y)).then(|| Self(((x as u16) << Self::SHIFT) | y as u16))
    }

    /// The slot at position `index` of the tile file header.
    pub fn from_header_index(index: usize) -> Option<Self> {
        let index = index as i64;
        Self::new(index % TILE_WIDTH, index / TILE_WIDTH)
    }

    /// The block containing tile-local pixel `p`.
    pub fn containing(PixelUnits([x, y]): PixelUnits<[i64; 2]>) -> Option<Self> {
        Self::new(x >> BITMAP_WIDTH_OFFSET, y >> BITMAP_WIDTH_OFFSET)
    }

    pub fn x(&self) -> i64 {
        i64::from(self.0 >> Self::SHIFT)
    }

    pub fn y(&self) -> i64 {
        i64::from(self.0 & Self::MASK)
    }

    /// Position of this slot in the tile file header, which is ordered row by row.
    pub fn header_index(&self) -> usize {
        (self.x() + self.y() * TILE_WIDTH) as usize
    }

    /// Tile-local pixel coordinates of this block's first pixel.
    pub fn pixel_origin(&self) -> PixelUnits<[i64; 2]> {
        PixelUnits([self.x() << BITMAP_WIDTH_OFFSET, self.y() << BITMAP_WIDTH_OFFSET])
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
