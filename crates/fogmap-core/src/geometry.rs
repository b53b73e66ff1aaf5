/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// A geographic bounding box in degrees.
///
/// No antimeridian handling: a box is assumed to satisfy `west <= east`. A box with `west > east` covers nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The degenerate box containing only `p`.
    pub fn from_point(p: LngLat) -> Self {
        Self::new(p.lng, p.lat, p.lng, p.lat)
    }

    /// The smallest box containing all of `points`, or `None` if there are no points.
    pub fn from_points(points: impl IntoIterator<Item = LngLat>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), |bbox, p| bbox.extended(p)))
    }

    pub fn extended(self, p: LngLat) -> Self {
        Self {
            west: self.west.min(p.lng),
            south: self.south.min(p.lat),
            east: self.east.max(p.lng),
            north: self.north.max(p.lat),
        }
    }

    pub fn north_west(&self) -> LngLat {
        LngLat::new(self.west, self.north)
    }

    pub fn south_east(&self) -> LngLat {
        LngLat::new(self.east, self.south)
    }

    pub fn contains(&self, p: LngLat) -> bool {
        (self.west..=self.east).contains(&p.lng) && (self.south..=self.north).contains(&p.lat)
    }
}

/// An axis-aligned rectangle with fractional coordinates from `min` to `max`.
///
/// Used for clearing, where a cell is covered if it overlaps the rectangle (see [`Rect::covered_cells`]).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Rect {
    pub const fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    /// The inclusive range of unit cells along `axis` that overlap this rectangle, clipped to `0..len`.
    ///
    /// A cell that only touches the `max` edge is not covered. If the rectangle has no extent along `axis`, the cell
    /// containing it is covered.
    pub fn covered_cells(&self, axis: usize, len: i64) -> std::ops::RangeInclusive<i64> {
        let (min, max) = (self.min[axis], self.max[axis]);
        let first = (min.floor() as i64).max(0);
        let last = if max > min {
            max.ceil() as i64 - 1
        } else {
            max.floor() as i64
        };
        first..=last.min(len - 1)
    }

    pub fn translated(&self, offset: [f64; 2]) -> Self {
        Self {
            min: [self.min[0] + offset[0], self.min[1] + offset[1]],
            max: [self.max[0] + offset[0], self.max[1] + offset[1]],
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min: [self.min[0] * factor, self.min[1] * factor],
            max: [self.max[0] * factor, self.max[1] * factor],
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
