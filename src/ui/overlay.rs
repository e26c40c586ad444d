use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::state::drag::{fit_contain, hit_test, LineRef, OverlayBounds, PointerInput};
use crate::state::grid::{Axis, GridModel};
use crate::Message;

const LINE_COLOR: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 0.85 };
const ACTIVE_COLOR: Color = Color { r: 1.0, g: 0.55, b: 0.1, a: 1.0 };
const BORDER_COLOR: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 0.35 };

/// Grid lines drawn over the contain-fitted source image
///
/// Translates mouse events into [`PointerInput`] messages. Moves and releases
/// are reported even when the cursor leaves the canvas, so a drag is never
/// lost on a fast flick.
pub struct GridOverlay<'a> {
    pub grid: &'a GridModel,
    /// Line currently being dragged
    pub active: Option<LineRef>,
    /// Natural image size (width, height)
    pub natural: (u32, u32),
    /// Grab distance around a line in logical pixels
    pub tolerance: f32,
}

impl GridOverlay<'_> {
    /// Where the image sits inside `bounds`, in the same coordinate space
    fn image_rect(&self, bounds: Rectangle) -> OverlayBounds {
        fit_contain(self.natural, bounds.into())
    }
}

impl Program<Message> for GridOverlay<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Frame coordinates start at the canvas origin
        let rect = fit_contain(
            self.natural,
            OverlayBounds::new(0.0, 0.0, bounds.width, bounds.height),
        );
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return vec![frame.into_geometry()];
        }

        frame.stroke(
            &Path::rectangle(Point::new(rect.left, rect.top), Size::new(rect.width, rect.height)),
            Stroke::default().with_color(BORDER_COLOR).with_width(1.0),
        );

        for axis in [Axis::Row, Axis::Col] {
            for (index, &fraction) in self.grid.lines(axis).iter().enumerate() {
                let position = rect.line_position(axis, fraction);
                let (from, to) = match axis {
                    Axis::Row => (
                        Point::new(rect.left, position),
                        Point::new(rect.left + rect.width, position),
                    ),
                    Axis::Col => (
                        Point::new(position, rect.top),
                        Point::new(position, rect.top + rect.height),
                    ),
                };

                let dragging = self.active == Some(LineRef { axis, index });
                let stroke = if dragging {
                    Stroke::default().with_color(ACTIVE_COLOR).with_width(3.0)
                } else {
                    Stroke::default().with_color(LINE_COLOR).with_width(2.0)
                };
                frame.stroke(&Path::line(from, to), stroke);
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Press on a line - start dragging it
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if self.active.is_some() {
                    return (canvas::event::Status::Ignored, None);
                }
                if let Some(pos) = cursor.position_over(bounds) {
                    let rect = self.image_rect(bounds);
                    if let Some(line) = hit_test(self.grid, rect, pos.x, pos.y, self.tolerance) {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Pointer(PointerInput::Press(line))),
                        );
                    }
                }
            }

            // Move anywhere - follow the pointer while dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if self.active.is_some() {
                    let input = PointerInput::Move {
                        x: position.x,
                        y: position.y,
                        bounds: self.image_rect(bounds),
                    };
                    return (canvas::event::Status::Captured, Some(Message::Pointer(input)));
                }
            }

            // Release anywhere - stop dragging
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if self.active.is_some() {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Pointer(PointerInput::Release)),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        let line = self.active.or_else(|| {
            let pos = cursor.position_over(bounds)?;
            hit_test(self.grid, self.image_rect(bounds), pos.x, pos.y, self.tolerance)
        });

        match line.map(|line| line.axis) {
            Some(Axis::Row) => mouse::Interaction::ResizingVertically,
            Some(Axis::Col) => mouse::Interaction::ResizingHorizontally,
            None => mouse::Interaction::default(),
        }
    }
}
