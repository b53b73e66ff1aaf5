pub mod geometry;

pub use geometry::{Bbox, LngLat, Rect};

use ahash::AHashMap;
pub type SmallKeyHashMap<K, V> = AHashMap<K, V>;

// Re-exports.
pub use approx;
pub use static_assertions;
