mod filename;

pub use filename::{decode_filename, encode_filename};

use crate::block::Block;
use crate::constants::*;
use crate::coordinates::{tile_xy_to_lng_lat, BlockSlot, TileId, TileKey};
use crate::raster::LineRun;
use crate::units::{PixelUnits, TileUnits};
use crate::Change;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, DecompressError, FlushDecompress, Status};
use fogmap_core::{Bbox, LngLat, Rect, SmallKeyHashMap};
use itertools::Itertools;
use std::io;
use std::sync::Arc;
use thiserror::Error;

pub type BlockMap = SmallKeyHashMap<BlockSlot, Arc<Block>>;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("{0:?} is not a valid tile filename")]
    BadFilename(String),
    #[error("tile id {0} is outside of the map")]
    IdOutOfRange(u64),
    #[error("corrupt tile data: {0}")]
    Corrupt(#[from] DecompressError),
    #[error("tile data ends before the end of its compressed stream")]
    TruncatedStream,
    #[error("tile data inflates to more than {limit} bytes")]
    TooLarge { limit: usize },
    #[error("tile data is {len} bytes, shorter than its header")]
    TruncatedHeader { len: usize },
    #[error("block #{index} for slot {slot:?} is past the end of the tile data ({len} bytes)")]
    TruncatedBlock {
        slot: BlockSlot,
        index: u16,
        len: usize,
    },
    #[error("failed to compress tile: {0}")]
    Io(#[from] io::Error),
}

/// A 128x128 grid of optional [`Block`]s; the unit of persistence.
///
/// Absent blocks are fully unexplored. A tile that is part of a [`FogMap`](crate::FogMap) always holds at least one block.
///
/// # File Format
///
/// A tile file is a zlib-wrapped DEFLATE stream of:
///
/// - a header of [`TILE_HEADER_LEN`] little-endian `u16`s, one per slot in row-major order, each either 0 (no block) or
///   the 1-based index of the slot's block record
/// - the block records ([`BLOCK_SIZE`] bytes each), ordered by slot
///
/// The filename encodes the tile id, see [`encode_filename`].
#[derive(Clone, Debug)]
pub struct Tile {
    key: TileKey,
    filename: String,
    blocks: BlockMap,
}

impl Tile {
    pub fn empty(key: TileKey) -> Self {
        log::debug!("Creating tile. id: {}, x: {}, y: {}", key.id(), key.x(), key.y());
        Self {
            key,
            filename: encode_filename(key.id()),
            blocks: BlockMap::default(),
        }
    }

    /// Parses a tile file. Blocks with a wrong checksum are kept, but reported with a warning.
    pub fn decode(filename: &str, bytes: &[u8]) -> Result<Self, TileError> {
        let key = decode_filename(filename)?;
        log::debug!("Loading tile. id: {}, x: {}, y: {}", key.id(), key.x(), key.y());

        let data = inflate(bytes)?;
        if data.len() < TILE_HEADER_SIZE {
            return Err(TileError::TruncatedHeader { len: data.len() });
        }
        let (header, payload) = data.split_at(TILE_HEADER_SIZE);

        let entries = header
            .chunks_exact(2)
            .map(|entry| u16::from_le_bytes([entry[0], entry[1]]))
            .enumerate()
            .filter(|&(_, index)| index > 0)
            .filter_map(|(i, index)| Some((BlockSlot::from_header_index(i)?, index)));

        let mut blocks = BlockMap::default();
        for (slot, index) in entries {
            let start = usize::from(index - 1) * BLOCK_SIZE;
            let record = payload
                .get(start..start + BLOCK_SIZE)
                .ok_or(TileError::TruncatedBlock {
                    slot,
                    index,
                    len: data.len(),
                })?;
            let block = Block::from_record(slot, record);
            block.check();
            blocks.insert(slot, Arc::new(block));
        }

        Ok(Self {
            key,
            filename: filename.to_owned(),
            blocks,
        })
    }

    /// Serializes and compresses this tile into the contents of its file.
    pub fn dump(&self) -> Result<Vec<u8>, TileError> {
        let mut data = vec![0; TILE_HEADER_SIZE + BLOCK_SIZE * self.blocks.len()];
        let (header, payload) = data.split_at_mut(TILE_HEADER_SIZE);

        let sorted_blocks = self
            .blocks
            .values()
            .sorted_by_key(|block| block.slot().header_index());
        for ((n, block), record) in sorted_blocks.enumerate().zip(payload.chunks_exact_mut(BLOCK_SIZE)) {
            let i = 2 * block.slot().header_index();
            header[i..i + 2].copy_from_slice(&(n as u16 + 1).to_le_bytes());
            record.copy_from_slice(&block.dump());
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        io::copy(&mut data.as_slice(), &mut encoder)?;
        Ok(encoder.finish()?)
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn id(&self) -> TileId {
        self.key.id()
    }

    pub fn x(&self) -> i64 {
        self.key.x()
    }

    pub fn y(&self) -> i64 {
        self.key.y()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn block(&self, slot: BlockSlot) -> Option<&Arc<Block>> {
        self.blocks.get(&slot)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Arc<Block>> {
        self.blocks.values()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Runs [`Block::check`] on every block, returning `true` if all of them are consistent.
    pub fn check(&self) -> bool {
        self.blocks.values().fold(true, |ok, block| block.check() && ok)
    }

    /// Whether the tile-local pixel `p` is explored.
    pub fn is_visited(&self, p: PixelUnits<[i64; 2]>) -> bool {
        BlockSlot::containing(p)
            .and_then(|slot| self.blocks.get(&slot))
            .map_or(false, |block| {
                let PixelUnits([ox, oy]) = block.slot().pixel_origin();
                block.is_visited(p.0[0] - ox, p.0[1] - oy)
            })
    }

    /// The corners of this tile in order north-west, north-east, south-east, south-west.
    pub fn bounds(&self) -> [LngLat; 4] {
        let (x, y) = (self.x() as f64, self.y() as f64);
        [
            tile_xy_to_lng_lat(TileUnits([x, y])),
            tile_xy_to_lng_lat(TileUnits([x + 1.0, y])),
            tile_xy_to_lng_lat(TileUnits([x + 1.0, y + 1.0])),
            tile_xy_to_lng_lat(TileUnits([x, y + 1.0])),
        ]
    }

    pub fn bbox(&self) -> Bbox {
        let [nw, _, se, _] = self.bounds();
        Bbox::new(nw.lng, se.lat, se.lng, nw.lat)
    }

    /// Marks pixels of `run` (in tile-local pixel coordinates) until it finishes or leaves this tile, visiting one block at
    /// a time.
    ///
    /// Returns `None` if no bit changed.
    pub fn add_line(&self, run: &mut LineRun) -> Option<Tile> {
        let mut edited: Option<BlockMap> = None;
        while !run.is_finished() {
            let Some(slot) = BlockSlot::containing(run.position()) else {
                break;
            };
            log::debug!("Block draw: tile {:?}, block {:?}, at {:?}", self.key, slot, run.position());

            let blocks = edited.as_ref().unwrap_or(&self.blocks);
            let new_block = match blocks.get(&slot) {
                Some(block) => run.in_frame(slot.pixel_origin(), |local| block.add_line(local)),
                None => run.in_frame(slot.pixel_origin(), |local| Block::empty(slot).add_line(local)),
            };
            if let Some(new_block) = new_block {
                edited
                    .get_or_insert_with(|| self.blocks.clone())
                    .insert(slot, Arc::new(new_block));
            }
        }
        edited.map(|blocks| self.with_blocks(blocks))
    }

    /// Clears every pixel that overlaps `rect`, given in tile-local pixel coordinates.
    ///
    /// Returns `None` if no bit changed, and [`Change::Remove`] if the tile no longer has any blocks.
    pub fn clear_rect(&self, PixelUnits(rect): PixelUnits<Rect>) -> Option<Change<Tile>> {
        if rect.is_empty() {
            return None;
        }
        let block_rect = rect.scaled(1.0 / BITMAP_WIDTH as f64);
        let (block_xs, block_ys) = (
            block_rect.covered_cells(0, TILE_WIDTH),
            block_rect.covered_cells(1, TILE_WIDTH),
        );

        let mut edited: Option<BlockMap> = None;
        for (&slot, block) in self.blocks.iter() {
            if !block_xs.contains(&slot.x()) || !block_ys.contains(&slot.y()) {
                continue;
            }
            let PixelUnits([ox, oy]) = slot.pixel_origin();
            let local = rect.translated([-ox as f64, -oy as f64]);
            let (xs, ys) = (
                local.covered_cells(0, BITMAP_WIDTH),
                local.covered_cells(1, BITMAP_WIDTH),
            );
            let change = block.clear_rect(
                *xs.start(),
                *ys.start(),
                xs.end() - xs.start() + 1,
                ys.end() - ys.start() + 1,
            );

            if let Some(change) = change {
                let blocks = edited.get_or_insert_with(|| self.blocks.clone());
                match change.map(Arc::new) {
                    Change::Insert(new_block) => {
                        blocks.insert(slot, new_block);
                    }
                    Change::Remove => {
                        blocks.remove(&slot);
                    }
                }
            }
        }

        edited.map(|blocks| {
            if blocks.is_empty() {
                Change::Remove
            } else {
                Change::Insert(self.with_blocks(blocks))
            }
        })
    }

    fn with_blocks(&self, blocks: BlockMap) -> Self {
        Self {
            key: self.key,
            filename: self.filename.clone(),
            blocks,
        }
    }
}

/// Inflates a zlib stream, failing if the stream ends early or inflates past [`MAX_TILE_DATA_SIZE`].
fn inflate(bytes: &[u8]) -> Result<Vec<u8>, TileError> {
    let mut decompress = Decompress::new(true);
    let mut data = Vec::with_capacity(TILE_HEADER_SIZE + 16 * BLOCK_SIZE);
    loop {
        if data.len() == data.capacity() {
            data.reserve(TILE_HEADER_SIZE);
        }
        let (total_in, total_out) = (decompress.total_in(), decompress.total_out());
        let input = &bytes[total_in as usize..];
        let status = decompress.decompress_vec(input, &mut data, FlushDecompress::None)?;
        if data.len() > MAX_TILE_DATA_SIZE {
            return Err(TileError::TooLarge {
                limit: MAX_TILE_DATA_SIZE,
            });
        }
        match status {
            Status::StreamEnd => return Ok(data),
            Status::Ok | Status::BufError => {
                if decompress.total_in() == total_in && decompress.total_out() == total_out {
                    return Err(TileError::TruncatedStream);
                }
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn tile_key() -> TileKey {
        TileKey::new(3, 7).unwrap()
    }

    fn draw(tile: &Tile, p0: [i64; 2], p1: [i64; 2]) -> Tile {
        let mut run = LineRun::new(PixelUnits(p0), PixelUnits(p1));
        let new_tile = tile.add_line(&mut run).unwrap();
        assert!(run.is_finished());
        new_tile
    }

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        io::copy(&mut &data[..], &mut encoder).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn line_across_block_seams_matches_reference() {
        let (p0, p1) = ([5, 100], [700, 301]);
        let tile = draw(&Tile::empty(tile_key()), p0, p1);

        let reference = LineRun::new(PixelUnits(p0), PixelUnits(p1)).collect_pixels();
        let total: u32 = tile.blocks().map(|b| b.population()).sum();
        assert_eq!(total as usize, reference.len());
        for p in reference {
            assert!(tile.is_visited(PixelUnits(p)), "{:?}", p);
        }
    }

    #[test]
    fn line_ending_on_first_pixel_of_next_block() {
        let tile = draw(&Tile::empty(tile_key()), [0, 0], [64, 0]);
        assert_eq!(tile.num_blocks(), 2);
        assert!(tile.is_visited(PixelUnits([64, 0])));
        let second = tile.block(BlockSlot::new(1, 0).unwrap()).unwrap();
        assert_eq!(second.population(), 1);
    }

    #[test]
    fn redraw_shares_tile() {
        let tile = draw(&Tile::empty(tile_key()), [10, 10], [300, 20]);
        let mut run = LineRun::new(PixelUnits([10, 10]), PixelUnits([300, 20]));
        assert!(tile.add_line(&mut run).is_none());
        assert!(run.is_finished());
    }

    #[test]
    fn add_line_shares_untouched_blocks() {
        let tile = draw(&Tile::empty(tile_key()), [0, 0], [10, 0]);
        let tile2 = draw(&tile, [500, 500], [510, 500]);
        let slot = BlockSlot::new(0, 0).unwrap();
        assert!(Arc::ptr_eq(tile.block(slot).unwrap(), tile2.block(slot).unwrap()));
    }

    #[test]
    fn dump_and_decode() {
        let tile = draw(&Tile::empty(tile_key()), [5, 100], [700, 301]);
        let tile = draw(&tile, [8000, 8000], [8191, 8191]);

        let bytes = tile.dump().unwrap();
        let decoded = Tile::decode(tile.filename(), &bytes).unwrap();
        assert_eq!(decoded.key(), tile.key());
        assert_eq!(decoded.num_blocks(), tile.num_blocks());
        assert!(decoded.check());
        for block in tile.blocks() {
            let other = decoded.block(block.slot()).unwrap();
            assert_eq!(other.bitmap(), block.bitmap());
            assert_eq!(other.count(), block.population());
        }
    }

    #[test]
    fn dump_header_is_sorted_by_slot() {
        let tile = draw(&Tile::empty(tile_key()), [8191, 0], [8191, 0]);
        let tile = draw(&tile, [0, 64], [0, 64]);
        let tile = draw(&tile, [64, 0], [64, 0]);

        let mut data = Vec::new();
        ZlibDecoder::new(&tile.dump().unwrap()[..])
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data.len(), TILE_HEADER_SIZE + 3 * BLOCK_SIZE);

        let header_entry = |slot: BlockSlot| {
            let i = 2 * slot.header_index();
            u16::from_le_bytes([data[i], data[i + 1]])
        };
        assert_eq!(header_entry(BlockSlot::new(1, 0).unwrap()), 1);
        assert_eq!(header_entry(BlockSlot::new(127, 0).unwrap()), 2);
        assert_eq!(header_entry(BlockSlot::new(0, 1).unwrap()), 3);
        assert_eq!(header_entry(BlockSlot::new(0, 0).unwrap()), 0);
    }

    #[test]
    fn decode_errors() {
        let name = encode_filename(tile_key().id());
        let tile = draw(&Tile::empty(tile_key()), [0, 0], [100, 100]);
        let bytes = tile.dump().unwrap();

        assert!(matches!(
            Tile::decode(&name, &bytes[..bytes.len() / 2]),
            Err(TileError::TruncatedStream)
        ));
        assert!(matches!(
            Tile::decode(&name, b"definitely not zlib"),
            Err(TileError::Corrupt(_))
        ));
        assert!(matches!(
            Tile::decode(&name, &compress(&[0; 100])),
            Err(TileError::TruncatedHeader { len: 100 })
        ));

        let mut data = vec![0; TILE_HEADER_SIZE + BLOCK_SIZE];
        data[0] = 2;
        assert!(matches!(
            Tile::decode(&name, &compress(&data)),
            Err(TileError::TruncatedBlock { index: 2, .. })
        ));

        assert!(matches!(
            Tile::decode("bogus", &bytes),
            Err(TileError::BadFilename(_))
        ));
    }

    #[test]
    fn decode_limits_inflated_size() {
        let name = encode_filename(tile_key().id());

        let largest = Tile::decode(&name, &compress(&vec![0; MAX_TILE_DATA_SIZE])).unwrap();
        assert!(largest.is_empty());

        assert!(matches!(
            Tile::decode(&name, &compress(&vec![0; MAX_TILE_DATA_SIZE + 1])),
            Err(TileError::TooLarge {
                limit: MAX_TILE_DATA_SIZE
            })
        ));
    }

    #[test]
    fn decode_keeps_bad_checksums() {
        let mut data = vec![0; TILE_HEADER_SIZE + BLOCK_SIZE];
        data[0] = 1;
        data[TILE_HEADER_SIZE] = 0xff;
        let tile = Tile::decode(&encode_filename(0), &compress(&data)).unwrap();
        assert!(!tile.check());
        assert_eq!(tile.num_blocks(), 1);
    }

    #[test]
    fn clear_rect_partial_and_full() {
        let tile = draw(&Tile::empty(tile_key()), [0, 10], [200, 10]);

        let cleared = tile
            .clear_rect(PixelUnits(Rect::new([0.0, 0.0], [63.5, 20.0])))
            .unwrap()
            .unwrap_insert();
        assert_eq!(cleared.num_blocks(), 3);
        assert!(!cleared.is_visited(PixelUnits([63, 10])));
        assert!(cleared.is_visited(PixelUnits([64, 10])));

        assert!(tile
            .clear_rect(PixelUnits(Rect::new([0.0, 11.0], [8192.0, 8192.0])))
            .is_none());
        assert!(matches!(
            tile.clear_rect(PixelUnits(Rect::new([0.0, 10.0], [200.5, 10.0]))),
            Some(Change::Remove)
        ));
    }

    #[test]
    fn clear_rect_keeps_block_touching_max_edge() {
        let tile = draw(&Tile::empty(tile_key()), [60, 10], [70, 10]);

        let cleared = tile
            .clear_rect(PixelUnits(Rect::new([0.0, 0.0], [64.0, 64.0])))
            .unwrap()
            .unwrap_insert();
        assert_eq!(cleared.num_blocks(), 1);
        assert!(cleared.block(BlockSlot::new(1, 0).unwrap()).is_some());
        assert!(!cleared.is_visited(PixelUnits([63, 10])));
        assert!(cleared.is_visited(PixelUnits([64, 10])));
    }

    #[test]
    fn bounds_order() {
        let tile = Tile::empty(tile_key());
        let [nw, ne, se, sw] = tile.bounds();
        assert!(nw.lng < ne.lng && nw.lat == ne.lat);
        assert!(se.lat < ne.lat && se.lng == ne.lng);
        assert!(sw.lng == nw.lng && sw.lat == se.lat);
        assert_eq!(tile.bbox(), Bbox::new(nw.lng, se.lat, se.lng, nw.lat));
    }
}
