use crate::constants::*;
use crate::coordinates::BlockSlot;
use crate::raster::LineRun;
use crate::Change;

use bytemuck::{bytes_of, Pod, Zeroable};
use fogmap_core::static_assertions::const_assert_eq;
use std::fmt;
use std::mem;

/// One bit per pixel, row-major, most significant bit first.
pub type Bitmap = [u8; BLOCK_BITMAP_SIZE];

/// The on-disk record of a [`Block`]: the bitmap followed by 3 bytes of metadata.
///
/// Metadata byte 0 and the top 2 bits of byte 1 hold a region marker that is carried through untouched. The remaining 14
/// bits of the big-endian `u16` in bytes 1..3 hold the checksum `(count << 1) | 1`.
#[derive(Clone, Copy, Eq, PartialEq)]
#[repr(C)]
pub struct BlockData {
    pub bitmap: Bitmap,
    pub extra: [u8; BLOCK_EXTRA_DATA],
}

unsafe impl Zeroable for BlockData {}
unsafe impl Pod for BlockData {}

const_assert_eq!(mem::size_of::<BlockData>(), BLOCK_SIZE);

const REGION_MASK: u16 = 0xc000;
const CHECKSUM_MASK: u16 = 0x3fff;

impl BlockData {
    fn checksum_field(&self) -> u16 {
        u16::from_be_bytes([self.extra[1], self.extra[2]])
    }

    fn set_checksum_field(&mut self, field: u16) {
        let [hi, lo] = field.to_be_bytes();
        self.extra[1] = hi;
        self.extra[2] = lo;
    }
}

/// The smallest unit of fog storage: 64x64 "explored" bits at some slot of a [`Tile`](crate::Tile).
///
/// Blocks are immutable. Edits copy the bitmap, and return a new block only if some bit actually changed.
#[derive(Clone, Eq, PartialEq)]
pub struct Block {
    slot: BlockSlot,
    data: BlockData,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("slot", &self.slot)
            .field("population", &self.population())
            .field("count", &self.count())
            .finish()
    }
}

impl Block {
    pub fn empty(slot: BlockSlot) -> Self {
        Self {
            slot,
            data: BlockData::zeroed(),
        }
    }

    /// Reads a block from its [`BLOCK_SIZE`]-byte record.
    ///
    /// # Panics
    ///
    /// If `record` is not exactly [`BLOCK_SIZE`] bytes long.
    pub fn from_record(slot: BlockSlot, record: &[u8]) -> Self {
        Self {
            slot,
            data: *bytemuck::from_bytes::<BlockData>(record),
        }
    }

    pub fn slot(&self) -> BlockSlot {
        self.slot
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.data.bitmap
    }

    /// The number of set bits in the bitmap.
    pub fn population(&self) -> u32 {
        self.data.bitmap.iter().map(|b| b.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.bitmap.iter().all(|&b| b == 0)
    }

    /// The population count stored in the metadata. Only refreshed by [`Block::dump`].
    pub fn count(&self) -> u32 {
        u32::from((self.data.checksum_field() & CHECKSUM_MASK) >> 1)
    }

    /// Returns `true` if the stored count matches the bitmap.
    pub fn check(&self) -> bool {
        let population = self.population();
        let is_correct = population == self.count();
        if !is_correct {
            log::warn!(
                "Block {:?} checksum mismatch: stored {}, actual {}",
                self.slot,
                self.count(),
                population
            );
        }
        is_correct
    }

    pub fn is_visited(&self, x: i64, y: i64) -> bool {
        let (i, mask) = bit_position(x, y);
        self.data.bitmap[i] & mask != 0
    }

    /// The record with a freshly computed checksum, as written to tile files.
    pub fn dump(&self) -> [u8; BLOCK_SIZE] {
        let mut data = self.data;
        let field = data.checksum_field();
        // The population of a full block is 4096, which still fits in 14 bits after the shift.
        let checksum = ((self.population() as u16) << 1) | 1;
        data.set_checksum_field((field & REGION_MASK) | checksum);

        let mut record = [0; BLOCK_SIZE];
        record.copy_from_slice(bytes_of(&data));
        record
    }

    /// Marks pixels of `run` until it finishes or leaves this block. The run must start inside of this block, and on return
    /// it is positioned at the first pixel that was not marked.
    ///
    /// Returns `None` if no bit changed.
    pub fn add_line(&self, run: &mut LineRun) -> Option<Block> {
        assert!(
            run.is_inside(BITMAP_WIDTH),
            "line run entered block {:?} out of bounds at {:?}",
            self.slot,
            run.position()
        );

        let mut bitmap = self.data.bitmap;
        let mut changed = false;
        loop {
            changed |= set_point(&mut bitmap, run.x(), run.y(), true);
            if run.at_end() {
                run.finish();
                break;
            }
            run.step();
            if !run.is_inside(BITMAP_WIDTH) {
                break;
            }
        }

        changed.then(|| self.with_bitmap(bitmap))
    }

    /// Clears the pixels in `[x, x + width) x [y, y + height)`, clipped to this block.
    ///
    /// Returns `None` if no bit changed, and [`Change::Remove`] if the block is now empty.
    pub fn clear_rect(&self, x: i64, y: i64, width: i64, height: i64) -> Option<Change<Block>> {
        let xs = x.max(0)..(x + width).min(BITMAP_WIDTH);
        let ys = y.max(0)..(y + height).min(BITMAP_WIDTH);

        let mut bitmap = self.data.bitmap;
        let mut changed = false;
        for j in ys {
            for i in xs.clone() {
                changed |= set_point(&mut bitmap, i, j, false);
            }
        }

        if bitmap.iter().all(|&b| b == 0) {
            Some(Change::Remove)
        } else if changed {
            Some(Change::Insert(self.with_bitmap(bitmap)))
        } else {
            None
        }
    }

    fn with_bitmap(&self, bitmap: Bitmap) -> Self {
        Self {
            slot: self.slot,
            data: BlockData {
                bitmap,
                extra: self.data.extra,
            },
        }
    }
}

fn bit_position(x: i64, y: i64) -> (usize, u8) {
    debug_assert!((0..BITMAP_WIDTH).contains(&x) && (0..BITMAP_WIDTH).contains(&y));
    let i = (x / 8 + y * 8) as usize;
    (i, 1 << (7 - x % 8))
}

/// Returns `true` if the bit changed.
fn set_point(bitmap: &mut Bitmap, x: i64, y: i64, value: bool) -> bool {
    let (i, mask) = bit_position(x, y);
    let old = bitmap[i];
    bitmap[i] = if value { old | mask } else { old & !mask };
    bitmap[i] != old
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
    use crate::units::PixelUnits;

    fn slot() -> BlockSlot {
        BlockSlot::new(0, 0).unwrap()
    }

    fn run(p0: [i64; 2], p1: [i64; 2]) -> LineRun {
        LineRun::new(PixelUnits(p0), PixelUnits(p1))
    }

    #[test]
    fn vertical_line_inside_one_block() {
        let mut line = run([0, 0], [0, 10]);
        let block = Block::empty(slot()).add_line(&mut line).unwrap();
        assert!(line.is_finished());

        for y in 0..BITMAP_WIDTH {
            for x in 0..BITMAP_WIDTH {
                assert_eq!(block.is_visited(x, y), x == 0 && y <= 10, "({}, {})", x, y);
            }
        }

        // The stored count is stale until the block is dumped.
        assert_eq!(block.count(), 0);
        let dumped = Block::from_record(slot(), &block.dump());
        assert_eq!(dumped.count(), 11);
        assert!(dumped.check());
    }

    #[test]
    fn bit_layout_is_msb_first() {
        let mut line = run([9, 2], [9, 2]);
        let block = Block::empty(slot()).add_line(&mut line).unwrap();
        // Byte 1 of row 2 holds x in 8..16, and x = 9 is the second most significant bit.
        assert_eq!(block.bitmap()[1 + 2 * 8], 0b0100_0000);
    }

    #[test]
    fn redrawing_returns_none() {
        let mut line = run([3, 4], [50, 30]);
        let block = Block::empty(slot()).add_line(&mut line).unwrap();
        let mut again = run([3, 4], [50, 30]);
        assert_eq!(block.add_line(&mut again), None);
        assert_eq!(again, line);
    }

    #[test]
    fn line_stops_at_block_edge_with_run_state() {
        let mut line = run([60, 0], [70, 0]);
        let block = Block::empty(slot()).add_line(&mut line).unwrap();
        assert!(!line.is_finished());
        assert_eq!(line.position(), PixelUnits([64, 0]));
        assert_eq!(block.population(), 4);
    }

    #[test]
    fn dump_preserves_region_bits() {
        let mut record = [0; BLOCK_SIZE];
        record[0] = 0x80;
        record[BLOCK_BITMAP_SIZE] = 0x5a;
        record[BLOCK_BITMAP_SIZE + 1] = 0xc0;
        let block = Block::from_record(slot(), &record);
        assert!(!block.check());

        let dumped = block.dump();
        assert_eq!(dumped[BLOCK_BITMAP_SIZE], 0x5a);
        // Region bits kept, population 1 stored as (1 << 1) | 1.
        assert_eq!(
            u16::from_be_bytes([dumped[BLOCK_BITMAP_SIZE + 1], dumped[BLOCK_BITMAP_SIZE + 2]]),
            0xc000 | 0b11
        );
        assert!(Block::from_record(slot(), &dumped).check());
    }

    #[test]
    fn full_block_count_fits() {
        let mut record = [0xff; BLOCK_SIZE];
        record[BLOCK_BITMAP_SIZE..].copy_from_slice(&[0, 0, 0]);
        let block = Block::from_record(slot(), &record);
        let dumped = Block::from_record(slot(), &block.dump());
        assert_eq!(dumped.count(), 4096);
        assert_eq!(dumped.data().extra[1] & 0xc0, 0);
    }

    #[test]
    fn clear_rect_outcomes() {
        let mut line = run([0, 5], [20, 5]);
        let block = Block::empty(slot()).add_line(&mut line).unwrap();

        assert_eq!(block.clear_rect(0, 6, 64, 58), None);

        let partial = block.clear_rect(0, 0, 10, 64).unwrap().unwrap_insert();
        assert_eq!(partial.population(), 11);
        assert!(!partial.is_visited(9, 5));
        assert!(partial.is_visited(10, 5));

        assert_eq!(block.clear_rect(-5, -5, 100, 100), Some(Change::Remove));
    }
}
