/// Grid model: the fractional divider positions laid over the source image
///
/// Lines are stored as fractions of the image size so they survive any
/// on-screen scaling. They may cross while the user drags; ordering is only
/// resolved when boundaries are requested.

/// Lowest position a line may take
pub const MIN_FRACTION: f64 = 0.01;
/// Highest position a line may take
pub const MAX_FRACTION: f64 = 0.99;
/// Upper bound on divisions per axis
pub const MAX_DIVISIONS: u32 = 64;

/// Which set of lines a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal lines, positioned along the image height
    Row,
    /// Vertical lines, positioned along the image width
    Col,
}

/// Row and column divider positions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridModel {
    row_lines: Vec<f64>,
    col_lines: Vec<f64>,
}

impl GridModel {
    /// Create a grid with evenly spaced lines
    pub fn new(rows: u32, cols: u32) -> Self {
        let mut grid = Self::default();
        grid.initialize(rows, cols);
        grid
    }

    /// Replace both axes with evenly spaced lines
    pub fn initialize(&mut self, rows: u32, cols: u32) {
        self.reset_axis(Axis::Row, rows);
        self.reset_axis(Axis::Col, cols);
    }

    /// Replace one axis with `count - 1` lines at `i / count`
    ///
    /// A count of 1 (or 0) leaves the axis without internal divisions.
    /// Manual adjustments on that axis are discarded.
    pub fn reset_axis(&mut self, axis: Axis, count: u32) {
        let count = count.clamp(1, MAX_DIVISIONS);
        let lines = (1..count)
            .map(|i| f64::from(i) / f64::from(count))
            .collect();

        *self.lines_mut(axis) = lines;
    }

    /// Store a clamped position for one line
    ///
    /// Returns false when `index` does not name an existing line.
    pub fn set_line(&mut self, axis: Axis, index: usize, fraction: f64) -> bool {
        match self.lines_mut(axis).get_mut(index) {
            Some(slot) => {
                *slot = clamp_fraction(fraction);
                true
            }
            None => false,
        }
    }

    /// Current line positions in storage order (unsorted)
    pub fn lines(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Row => &self.row_lines,
            Axis::Col => &self.col_lines,
        }
    }

    /// Number of cells along an axis
    #[cfg(test)]
    pub fn cell_count(&self, axis: Axis) -> usize {
        self.lines(axis).len() + 1
    }

    /// Sorted cut positions including both image edges
    pub fn boundaries(&self, axis: Axis) -> Vec<f64> {
        let mut sorted = self.lines(axis).to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut bounds = Vec::with_capacity(sorted.len() + 2);
        bounds.push(0.0);
        bounds.extend(sorted);
        bounds.push(1.0);
        bounds
    }

    fn lines_mut(&mut self, axis: Axis) -> &mut Vec<f64> {
        match axis {
            Axis::Row => &mut self.row_lines,
            Axis::Col => &mut self.col_lines,
        }
    }
}

/// Clamp a position into the draggable range
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return MIN_FRACTION;
    }
    fraction.clamp(MIN_FRACTION, MAX_FRACTION)
}
