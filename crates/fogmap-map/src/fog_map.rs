use crate::archive::{ArchiveEntry, ArchiveError, ArchiveWriter};
use crate::constants::*;
use crate::coordinates::{lng_lat_to_global_xy, lng_lat_to_pixel_xy, TileKey};
use crate::raster::LineRun;
use crate::tile::{Tile, TileError};
use crate::units::PixelUnits;
use crate::Change;

use fogmap_core::{Bbox, LngLat, Rect, SmallKeyHashMap};
use itertools::Itertools;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

pub type TileMap = SmallKeyHashMap<TileKey, Arc<Tile>>;

static EMPTY: Lazy<FogMap> = Lazy::new(|| FogMap {
    tiles: Arc::new(TileMap::default()),
});

/// # Fog Map
///
/// The explored area of the whole world, as a sparse map from [`TileKey`] to [`Tile`].
///
/// A `FogMap` is an immutable snapshot. Edits return a new snapshot that shares every [`Tile`] (and every
/// [`Block`](crate::Block)) that the edit did not change, and an edit that changes nothing returns the same snapshot, so
/// [`FogMap::ptr_eq`] tells whether anything happened. Cloning is cheap.
///
/// Tiles in a map are never empty; a tile that loses its last block is removed from the map.
#[derive(Clone)]
pub struct FogMap {
    tiles: Arc<TileMap>,
}

impl Default for FogMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for FogMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FogMap")
            .field("num_tiles", &self.tiles.len())
            .finish()
    }
}

/// What happened to the files given to [`FogMap::create_from_files`].
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub loaded: usize,
    /// Files that decoded to a tile without blocks.
    pub empty: usize,
    pub failed: Vec<(String, TileError)>,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.empty + self.failed.len()
    }
}

impl FogMap {
    /// The shared snapshot of a map where nothing is explored.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// Builds a map from decoded tiles. Empty tiles are dropped and every block is checked for consistency.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let tiles = tiles
            .into_iter()
            .filter(|tile| {
                tile.check();
                !tile.is_empty()
            })
            .map(|tile| (tile.key(), Arc::new(tile)))
            .collect();
        Self::with_tiles(tiles)
    }

    /// Decodes a batch of tile files. Files are decoded independently (in parallel when `parallel` is set), and a file that
    /// fails to decode is skipped instead of failing the whole batch.
    ///
    /// Only the last component of each entry name is used as the tile filename. When two files hold the same tile, the later
    /// one wins.
    pub fn create_from_files(files: Vec<ArchiveEntry>, parallel: bool) -> (Self, ImportSummary) {
        let decode = |entry: ArchiveEntry| {
            let result = Tile::decode(entry.file_name(), &entry.bytes);
            (entry.name, result)
        };
        let decoded: Vec<_> = if parallel {
            files.into_par_iter().map(decode).collect()
        } else {
            files.into_iter().map(decode).collect()
        };

        let mut tiles = TileMap::default();
        let mut summary = ImportSummary::default();
        for (name, result) in decoded {
            match result {
                Ok(tile) if tile.is_empty() => {
                    log::warn!("Skipping {}: the tile has no blocks", name);
                    summary.empty += 1;
                }
                Ok(tile) => {
                    if tiles.insert(tile.key(), Arc::new(tile)).is_some() {
                        log::warn!("{} replaces a tile loaded from an earlier file", name);
                    }
                    summary.loaded += 1;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    summary.failed.push((name, e));
                }
            }
        }
        log::info!(
            "Loaded {} tiles from {} files, skipped {}",
            tiles.len(),
            summary.loaded + summary.skipped(),
            summary.skipped()
        );

        (Self::with_tiles(tiles), summary)
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn tile(&self, key: TileKey) -> Option<&Arc<Tile>> {
        self.tiles.get(&key)
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether `a` and `b` are the same snapshot.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.tiles, &b.tiles)
    }

    /// Whether the global pixel `p` is explored.
    pub fn is_visited(&self, p: PixelUnits<[i64; 2]>) -> bool {
        TileKey::containing(p)
            .and_then(|key| self.tiles.get(&key))
            .map_or(false, |tile| {
                let PixelUnits([ox, oy]) = tile.key().pixel_origin();
                tile.is_visited(PixelUnits([p.0[0] - ox, p.0[1] - oy]))
            })
    }

    /// Marks the straight line from `start` to `end` as explored.
    pub fn add_line(&self, start: LngLat, end: LngLat) -> Self {
        self.add_pixel_line(lng_lat_to_global_xy(start), lng_lat_to_global_xy(end))
    }

    /// Marks every pixel of the line from `p0` to `p1` (global pixel coordinates, both inclusive) as explored.
    ///
    /// The line is rasterized once and handed from tile to tile. If it leaves the world, the rest of it is dropped.
    pub fn add_pixel_line(&self, p0: PixelUnits<[i64; 2]>, p1: PixelUnits<[i64; 2]>) -> Self {
        let mut run = LineRun::new(p0, p1);
        let mut edited: Option<TileMap> = None;
        while !run.is_finished() {
            let Some(key) = TileKey::containing(run.position()) else {
                log::warn!("Line from {:?} to {:?} leaves the map at {:?}", p0, p1, run.position());
                break;
            };
            log::debug!("Tile draw: tile {:?}, at {:?}", key, run.position());

            let tiles = edited.as_ref().unwrap_or(&*self.tiles);
            let new_tile = match tiles.get(&key) {
                Some(tile) => run.in_frame(key.pixel_origin(), |local| tile.add_line(local)),
                None => run.in_frame(key.pixel_origin(), |local| Tile::empty(key).add_line(local)),
            };
            if let Some(new_tile) = new_tile {
                edited
                    .get_or_insert_with(|| TileMap::clone(&self.tiles))
                    .insert(key, Arc::new(new_tile));
            }
        }
        edited.map_or_else(|| self.clone(), Self::with_tiles)
    }

    /// Clears every pixel that overlaps `bbox`. Pixels that only touch its east or south edge are kept. Tiles that become empty are removed.
    pub fn clear_bbox(&self, bbox: &Bbox) -> Self {
        let PixelUnits(min) = lng_lat_to_pixel_xy(bbox.north_west());
        let PixelUnits(max) = lng_lat_to_pixel_xy(bbox.south_east());
        let rect = Rect::new(min, max);
        if rect.is_empty() {
            return self.clone();
        }

        let tile_rect = rect.scaled(1.0 / TILE_PIXEL_WIDTH as f64);
        let (tile_xs, tile_ys) = (
            tile_rect.covered_cells(0, MAP_WIDTH),
            tile_rect.covered_cells(1, MAP_WIDTH),
        );

        let mut edited: Option<TileMap> = None;
        for (&key, tile) in self.tiles.iter() {
            if !tile_xs.contains(&key.x()) || !tile_ys.contains(&key.y()) {
                continue;
            }
            let PixelUnits([ox, oy]) = key.pixel_origin();
            let local = rect.translated([-ox as f64, -oy as f64]);
            log::debug!("Tile clear: tile {:?}, rect {:?}", key, local);

            if let Some(change) = tile.clear_rect(PixelUnits(local)) {
                let tiles = edited.get_or_insert_with(|| TileMap::clone(&self.tiles));
                match change.map(Arc::new) {
                    Change::Insert(new_tile) => {
                        tiles.insert(key, new_tile);
                    }
                    Change::Remove => {
                        tiles.remove(&key);
                    }
                }
            }
        }
        edited.map_or_else(|| self.clone(), Self::with_tiles)
    }

    /// Writes every tile into `writer` as `Sync/<filename>`, returning the number of files written.
    ///
    /// Tiles are compressed in parallel and written in key order.
    pub fn export_archive(&self, writer: &mut impl ArchiveWriter) -> Result<usize, ArchiveError> {
        let tiles: Vec<_> = self
            .tiles
            .values()
            .filter(|tile| !tile.is_empty())
            .sorted_by_key(|tile| tile.key())
            .collect();
        let files: Vec<_> = tiles
            .into_par_iter()
            .map(|tile| (tile.filename(), tile.dump()))
            .collect();

        writer.create_folder(SYNC_FOLDER)?;
        let num_files = files.len();
        for (filename, bytes) in files {
            let bytes = bytes.map_err(|source| ArchiveError::Tile {
                filename: filename.to_owned(),
                source,
            })?;
            writer.put(&format!("{}/{}", SYNC_FOLDER, filename), &bytes)?;
        }
        log::info!("Exported {} tiles", num_files);

        Ok(num_files)
    }

    fn with_tiles(tiles: TileMap) -> Self {
        if tiles.is_empty() {
            return Self::empty();
        }
        Self {
            tiles: Arc::new(tiles),
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
