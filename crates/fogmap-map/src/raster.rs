use crate::units::PixelUnits;

/// The axis along which a line advances by exactly one pixel per step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MajorAxis {
    X,
    Y,
}

/// The state of one Bresenham rasterization, carried across block and tile boundaries.
///
/// A run is created once per line in global pixel coordinates. Each level of the map (map, tile, block) rebases the run into
/// its own frame with [`LineRun::in_frame`], advances it as far as its extent allows, and hands it back. The error term is
/// private and only [`LineRun::step`] changes it, so a line that crosses any number of seams is pixel-identical to the same
/// line rasterized in a single frame.
///
/// The major coordinate never decreases: endpoints are swapped on construction so that the run always moves in the positive
/// direction of [`MajorAxis`]. The minor coordinate moves up when `quadrants13` is set, and down otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineRun {
    x: i64,
    y: i64,
    error: i64,
    /// Major coordinate of the last pixel, in the current frame.
    end: i64,
    dx: i64,
    dy: i64,
    axis: MajorAxis,
    quadrants13: bool,
    finished: bool,
}

impl LineRun {
    pub fn new(PixelUnits(p0): PixelUnits<[i64; 2]>, PixelUnits(p1): PixelUnits<[i64; 2]>) -> Self {
        let [x0, y0] = p0;
        let [x1, y1] = p1;
        let (dx, dy) = (x1 - x0, y1 - y0);
        let (dx_abs, dy_abs) = (dx.abs(), dy.abs());
        let quadrants13 = (dx < 0 && dy < 0) || (dx > 0 && dy > 0);

        if dy_abs <= dx_abs {
            let ([x, y], end) = if dx >= 0 { (p0, x1) } else { (p1, x0) };
            Self {
                x,
                y,
                error: 2 * dy_abs - dx_abs,
                end,
                dx: dx_abs,
                dy: dy_abs,
                axis: MajorAxis::X,
                quadrants13,
                finished: false,
            }
        } else {
            let ([x, y], end) = if dy >= 0 { (p0, y1) } else { (p1, y0) };
            Self {
                x,
                y,
                error: 2 * dx_abs - dy_abs,
                end,
                dx: dx_abs,
                dy: dy_abs,
                axis: MajorAxis::Y,
                quadrants13,
                finished: false,
            }
        }
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }

    pub fn position(&self) -> PixelUnits<[i64; 2]> {
        PixelUnits([self.x, self.y])
    }

    pub fn error(&self) -> i64 {
        self.error
    }

    pub fn axis(&self) -> MajorAxis {
        self.axis
    }

    pub fn major(&self) -> i64 {
        match self.axis {
            MajorAxis::X => self.x,
            MajorAxis::Y => self.y,
        }
    }

    /// True once the last pixel has been marked.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True if the current pixel is the last pixel of the line.
    pub fn at_end(&self) -> bool {
        self.major() >= self.end
    }

    /// True if the current pixel is inside the square `[0, width)²` of the current frame.
    pub fn is_inside(&self, width: i64) -> bool {
        (0..width).contains(&self.x) && (0..width).contains(&self.y)
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    /// Advances to the next pixel of the line.
    ///
    /// The two axes break ties differently (`<` vs `<=`).
    pub(crate) fn step(&mut self) {
        debug_assert!(!self.finished);
        let minor_step = if self.quadrants13 { 1 } else { -1 };
        match self.axis {
            MajorAxis::X => {
                self.x += 1;
                if self.error < 0 {
                    self.error += 2 * self.dy;
                } else {
                    self.y += minor_step;
                    self.error += 2 * (self.dy - self.dx);
                }
            }
            MajorAxis::Y => {
                self.y += 1;
                if self.error <= 0 {
                    self.error += 2 * self.dx;
                } else {
                    self.x += minor_step;
                    self.error += 2 * (self.dx - self.dy);
                }
            }
        }
    }

    /// Runs `f` with the run expressed relative to `origin`, then moves it back.
    pub fn in_frame<T>(&mut self, PixelUnits(origin): PixelUnits<[i64; 2]>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.translate([-origin[0], -origin[1]]);
        let result = f(self);
        self.translate(origin);
        result
    }

    fn translate(&mut self, [ox, oy]: [i64; 2]) {
        self.x += ox;
        self.y += oy;
        self.end += match self.axis {
            MajorAxis::X => ox,
            MajorAxis::Y => oy,
        };
    }

    /// Collects every pixel of the line in a single frame, without any spatial subdivision.
    pub fn collect_pixels(mut self) -> Vec<[i64; 2]> {
        let mut pixels = Vec::new();
        loop {
            pixels.push([self.x, self.y]);
            if self.at_end() {
                self.finish();
                return pixels;
            }
            self.step();
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
