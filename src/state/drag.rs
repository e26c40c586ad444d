/// Pointer-driven grid line dragging
///
/// The controller knows nothing about iced. The overlay canvas translates mouse
/// events into [`PointerInput`] values and the controller applies them to the
/// [`GridModel`], which keeps the whole state machine testable without a window.

use super::grid::{clamp_fraction, Axis, GridModel};

/// A single grid line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRef {
    pub axis: Axis,
    pub index: usize,
}

/// Screen rectangle the grid is drawn over, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl OverlayBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Screen coordinate of a line at `fraction` along `axis`
    pub fn line_position(&self, axis: Axis, fraction: f64) -> f32 {
        match axis {
            Axis::Row => self.top + fraction as f32 * self.height,
            Axis::Col => self.left + fraction as f32 * self.width,
        }
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl From<iced::Rectangle> for OverlayBounds {
    fn from(rect: iced::Rectangle) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

/// Input events the controller understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Pointer pressed on a rendered line
    Press(LineRef),
    /// Pointer moved anywhere on screen
    Move { x: f32, y: f32, bounds: OverlayBounds },
    /// Pointer released anywhere on screen
    Release,
}

/// Drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(LineRef),
}

/// Single-pointer drag state machine
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> DragState {
        self.state
    }

    /// The line being dragged, if any
    pub fn active(&self) -> Option<LineRef> {
        match self.state {
            DragState::Dragging(line) => Some(line),
            DragState::Idle => None,
        }
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.active().is_some()
    }

    /// Apply one input event
    ///
    /// Returns true when the overlay needs to be redrawn.
    pub fn handle(&mut self, input: PointerInput, grid: &mut GridModel) -> bool {
        match (self.state, input) {
            (DragState::Idle, PointerInput::Press(line)) => {
                if line.index >= grid.lines(line.axis).len() {
                    return false;
                }
                self.state = DragState::Dragging(line);
                true
            }
            (DragState::Dragging(line), PointerInput::Move { x, y, bounds }) => {
                if bounds.is_empty() {
                    return false;
                }
                let fraction = pointer_fraction(line.axis, x, y, bounds);
                grid.set_line(line.axis, line.index, fraction)
            }
            (DragState::Dragging(_), PointerInput::Release) => {
                self.state = DragState::Idle;
                true
            }
            // A second press mid-drag, or moves/releases with nothing held
            _ => false,
        }
    }

    /// Drop any drag in progress, e.g. when the grid is rebuilt underneath it
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Pointer position as a clamped fraction of the overlay along the line's
/// perpendicular axis
pub fn pointer_fraction(axis: Axis, x: f32, y: f32, bounds: OverlayBounds) -> f64 {
    let raw = match axis {
        Axis::Row => (y - bounds.top) / bounds.height,
        Axis::Col => (x - bounds.left) / bounds.width,
    };
    clamp_fraction(f64::from(raw))
}

/// Rectangle an image of `natural` size occupies when contain-fitted and
/// centered inside `container`
pub fn fit_contain(natural: (u32, u32), container: OverlayBounds) -> OverlayBounds {
    let (nat_w, nat_h) = (natural.0 as f32, natural.1 as f32);
    if nat_w <= 0.0 || nat_h <= 0.0 || container.is_empty() {
        return OverlayBounds::new(container.left, container.top, 0.0, 0.0);
    }

    let scale = (container.width / nat_w).min(container.height / nat_h);
    let width = nat_w * scale;
    let height = nat_h * scale;

    OverlayBounds::new(
        container.left + (container.width - width) / 2.0,
        container.top + (container.height - height) / 2.0,
        width,
        height,
    )
}

/// Find the line closest to a pointer, within `tolerance` pixels
pub fn hit_test(
    grid: &GridModel,
    bounds: OverlayBounds,
    x: f32,
    y: f32,
    tolerance: f32,
) -> Option<LineRef> {
    if bounds.is_empty() {
        return None;
    }

    let inside_x = x >= bounds.left - tolerance && x <= bounds.left + bounds.width + tolerance;
    let inside_y = y >= bounds.top - tolerance && y <= bounds.top + bounds.height + tolerance;
    if !inside_x || !inside_y {
        return None;
    }

    let mut best: Option<(f32, LineRef)> = None;
    for axis in [Axis::Row, Axis::Col] {
        let pointer = match axis {
            Axis::Row => y,
            Axis::Col => x,
        };
        for (index, &fraction) in grid.lines(axis).iter().enumerate() {
            let distance = (bounds.line_position(axis, fraction) - pointer).abs();
            if distance > tolerance {
                continue;
            }
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, LineRef { axis, index }));
            }
        }
    }

    best.map(|(_, line)| line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> OverlayBounds {
        OverlayBounds::new(100.0, 50.0, 200.0, 400.0)
    }

    fn row0() -> LineRef {
        LineRef { axis: Axis::Row, index: 0 }
    }

    #[test]
    fn test_press_move_release_cycle() {
        let mut grid = GridModel::new(2, 2);
        let mut drag = DragController::new();

        assert!(drag.handle(PointerInput::Press(row0()), &mut grid));
        assert_eq!(drag.state(), DragState::Dragging(row0()));

        // 25% of the way down the overlay
        let moved = drag.handle(
            PointerInput::Move { x: 0.0, y: 150.0, bounds: bounds() },
            &mut grid,
        );
        assert!(moved);
        assert_eq!(grid.lines(Axis::Row)[0], 0.25);

        assert!(drag.handle(PointerInput::Release, &mut grid));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_drag_single_divider_to_middle() {
        let mut grid = GridModel::new(2, 1);
        grid.set_line(Axis::Row, 0, 0.2);
        let mut drag = DragController::new();

        drag.handle(PointerInput::Press(row0()), &mut grid);
        // top + height / 2
        drag.handle(PointerInput::Move { x: 0.0, y: 250.0, bounds: bounds() }, &mut grid);
        drag.handle(PointerInput::Release, &mut grid);

        assert_eq!(grid.boundaries(Axis::Row), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_move_outside_overlay_is_clamped() {
        let mut grid = GridModel::new(1, 3);
        let mut drag = DragController::new();
        let col1 = LineRef { axis: Axis::Col, index: 1 };

        drag.handle(PointerInput::Press(col1), &mut grid);
        drag.handle(PointerInput::Move { x: 5_000.0, y: -20.0, bounds: bounds() }, &mut grid);
        assert_eq!(grid.lines(Axis::Col)[1], 0.99);

        drag.handle(PointerInput::Move { x: -5_000.0, y: 0.0, bounds: bounds() }, &mut grid);
        assert_eq!(grid.lines(Axis::Col)[1], 0.01);
    }

    #[test]
    fn test_move_while_idle_does_nothing() {
        let mut grid = GridModel::new(2, 2);
        let before = grid.clone();
        let mut drag = DragController::new();

        let moved = drag.handle(
            PointerInput::Move { x: 150.0, y: 150.0, bounds: bounds() },
            &mut grid,
        );
        assert!(!moved);
        assert!(!drag.handle(PointerInput::Release, &mut grid));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_second_press_ignored_while_dragging() {
        let mut grid = GridModel::new(3, 3);
        let mut drag = DragController::new();
        let col0 = LineRef { axis: Axis::Col, index: 0 };

        drag.handle(PointerInput::Press(row0()), &mut grid);
        assert!(!drag.handle(PointerInput::Press(col0), &mut grid));
        assert_eq!(drag.active(), Some(row0()));
    }

    #[test]
    fn test_press_on_missing_line_stays_idle() {
        let mut grid = GridModel::new(1, 1);
        let mut drag = DragController::new();
        assert!(!drag.handle(PointerInput::Press(row0()), &mut grid));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_zero_sized_overlay_ignores_moves() {
        let mut grid = GridModel::new(2, 2);
        let mut drag = DragController::new();
        drag.handle(PointerInput::Press(row0()), &mut grid);

        let empty = OverlayBounds::new(0.0, 0.0, 0.0, 0.0);
        assert!(!drag.handle(PointerInput::Move { x: 1.0, y: 1.0, bounds: empty }, &mut grid));
        assert_eq!(grid.lines(Axis::Row)[0], 0.5);
    }

    #[test]
    fn test_fit_contain_letterboxes() {
        let container = OverlayBounds::new(0.0, 0.0, 400.0, 400.0);
        let fitted = fit_contain((200, 100), container);
        assert_eq!(fitted, OverlayBounds::new(0.0, 100.0, 400.0, 200.0));

        let fitted = fit_contain((100, 200), container);
        assert_eq!(fitted, OverlayBounds::new(100.0, 0.0, 200.0, 400.0));
    }

    #[test]
    fn test_hit_test_picks_nearest_line() {
        // Row line at y = 250, column line at x = 200
        let grid = GridModel::new(2, 2);

        assert_eq!(hit_test(&grid, bounds(), 150.0, 253.0, 6.0), Some(row0()));
        assert_eq!(
            hit_test(&grid, bounds(), 198.0, 120.0, 6.0),
            Some(LineRef { axis: Axis::Col, index: 0 })
        );
        // Near the crossing, the closer line wins
        assert_eq!(
            hit_test(&grid, bounds(), 201.0, 246.0, 6.0),
            Some(LineRef { axis: Axis::Col, index: 0 })
        );
        assert_eq!(hit_test(&grid, bounds(), 150.0, 300.0, 6.0), None);
        // Outside the overlay entirely
        assert_eq!(hit_test(&grid, bounds(), 900.0, 250.0, 6.0), None);
    }
}
