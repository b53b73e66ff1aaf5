use fogmap_core::static_assertions::const_assert_eq;

/// Alphabet that obfuscates the decimal digits of a tile id in its filename. This is the only channel decoded on import.
pub const FILENAME_MASK1: &[u8; 10] = b"olhwjsktri";
/// Second digit alphabet; only the last two characters end up in the filename.
pub const FILENAME_MASK2: &[u8; 10] = b"eizxdwknmo";

/// Edge length of the world in tiles.
pub const MAP_WIDTH: i64 = 512;

pub const TILE_WIDTH_OFFSET: u32 = 7;
/// Edge length of a tile in blocks.
pub const TILE_WIDTH: i64 = 1 << TILE_WIDTH_OFFSET;
pub const TILE_HEADER_LEN: usize = (TILE_WIDTH * TILE_WIDTH) as usize;
pub const TILE_HEADER_SIZE: usize = TILE_HEADER_LEN * 2;

pub const BITMAP_WIDTH_OFFSET: u32 = 6;
/// Edge length of a block in pixels.
pub const BITMAP_WIDTH: i64 = 1 << BITMAP_WIDTH_OFFSET;

pub const BLOCK_BITMAP_SIZE: usize = 512;
pub const BLOCK_EXTRA_DATA: usize = 3;
pub const BLOCK_SIZE: usize = BLOCK_BITMAP_SIZE + BLOCK_EXTRA_DATA;

/// Shift from global pixel coordinates to tile coordinates.
pub const ALL_OFFSET: u32 = TILE_WIDTH_OFFSET + BITMAP_WIDTH_OFFSET;
/// Size of the inflated contents of a tile file with every block present.
pub const MAX_TILE_DATA_SIZE: usize = TILE_HEADER_SIZE + TILE_HEADER_LEN * BLOCK_SIZE;

/// Edge length of a tile in pixels.
pub const TILE_PIXEL_WIDTH: i64 = 1 << ALL_OFFSET;
/// Edge length of the world in pixels.
pub const WORLD_PIXEL_WIDTH: i64 = MAP_WIDTH * TILE_PIXEL_WIDTH;

/// Folder that holds the tile files inside an exported archive.
pub const SYNC_FOLDER: &str = "Sync";

const_assert_eq!(BLOCK_BITMAP_SIZE as i64 * 8, BITMAP_WIDTH * BITMAP_WIDTH);
const_assert_eq!(TILE_HEADER_SIZE, 32768);
const_assert_eq!(WORLD_PIXEL_WIDTH, 4_194_304);
