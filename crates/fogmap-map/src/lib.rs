//! The fogmap data model.
//!
//! # Pixels
//!
//! The world is projected with a spherical Mercator projection onto a square grid of 2^22 x 2^22 pixels. A pixel is either
//! explored or not. Lines between consecutive positions of a track are rasterized into this grid with a single Bresenham run
//! (see [`LineRun`](crate::LineRun)), and rectangular regions can be cleared again.
//!
//! ## Blocks
//!
//! A [`Block`](crate::Block) is a 64x64 bitmap plus 3 bytes of metadata holding a population count checksum. Blocks are
//! allocated lazily; a pixel in a missing block is unexplored.
//!
//! ## Tiles
//!
//! A [`Tile`](crate::Tile) is a sparse 128x128 grid of blocks and the unit of persistence. Each tile is stored in its own
//! DEFLATE-compressed file with an obfuscated filename that encodes the tile's position.
//!
//! # Snapshots
//!
//! A [`FogMap`](crate::FogMap) is a sparse 512x512 grid of tiles. All three levels are immutable and shared with `Arc`, so an
//! edit copies only the path from the map to the blocks it touched. This makes it cheap to keep a [`History`](crate::History)
//! of snapshots for undo and redo.
//!
//! # Archives
//!
//! Tile files are exchanged through any container that implements [`ArchiveReader`](crate::ArchiveReader) and
//! [`ArchiveWriter`](crate::ArchiveWriter). Zip files, memory and a `sled` database are supported.

mod archive;
mod block;
mod change;
mod constants;
mod coordinates;
mod database;
mod fog_map;
mod history;
mod raster;
mod tile;
mod units;

pub use archive::*;
pub use block::*;
pub use change::*;
pub use constants::*;
pub use coordinates::*;
pub use database::*;
pub use fog_map::*;
pub use history::*;
pub use raster::*;
pub use tile::*;
pub use units::*;
