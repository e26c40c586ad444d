use std::collections::BTreeSet;
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info};

use super::config::SliceConfig;
use super::data::{SourceImage, Tile};
use super::drag::{DragController, PointerInput};
use super::grid::{Axis, GridModel};
use crate::error::{Result, SlicerError};
use crate::export::bundle::{bundle_name, ExportPlan};

/// Everything a slice pass needs, detached from the session
#[derive(Debug, Clone)]
pub struct SliceJob {
    pub image: Arc<DynamicImage>,
    pub grid: GridModel,
    pub base_name: String,
    pub start_index: usize,
    /// Results from an older generation are discarded
    pub generation: u64,
}

/// The Session owns all mutable state of one editing session:
/// the uploaded image, the grid over it, the drag controller, the tiles cut
/// so far and which of them are selected.
///
/// It is created on startup, replaced wholesale on reload, and only ever
/// touched from the UI thread.
#[derive(Debug)]
pub struct Session {
    config: SliceConfig,
    grid: GridModel,
    drag: DragController,
    image: Option<SourceImage>,
    tiles: Vec<Tile>,
    selection: BTreeSet<usize>,
    rows_input: String,
    cols_input: String,
    /// Base name of the most recent upload, used for bundle names
    last_base_name: String,
    /// Bumped by clear and reload; tags slice passes
    generation: u64,
    /// Bumped by reload only; tags image loads
    epoch: u64,
    slicing: bool,
}

impl Session {
    pub fn new(config: SliceConfig) -> Self {
        let grid = GridModel::new(config.default_rows, config.default_cols);

        Session {
            rows_input: config.default_rows.to_string(),
            cols_input: config.default_cols.to_string(),
            last_base_name: config.fallback_base_name.clone(),
            config,
            grid,
            drag: DragController::new(),
            image: None,
            tiles: Vec::new(),
            selection: BTreeSet::new(),
            generation: 0,
            epoch: 0,
            slicing: false,
        }
    }

    /// Start over with fresh state and settings
    ///
    /// Counters keep increasing so that work started before the reload is
    /// recognised as stale when it finishes.
    pub fn reload(&mut self, config: SliceConfig) {
        let generation = self.generation + 1;
        let epoch = self.epoch + 1;

        *self = Session::new(config);
        self.generation = generation;
        self.epoch = epoch;
        info!("🔄 Session reloaded");
    }

    /// Tag for image loads started now
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn rows_input(&self) -> &str {
        &self.rows_input
    }

    pub fn cols_input(&self) -> &str {
        &self.cols_input
    }

    pub fn is_slicing(&self) -> bool {
        self.slicing
    }

    /// Row count currently requested by the input field
    pub fn rows(&self) -> u32 {
        SliceConfig::parse_count(&self.rows_input, self.config.default_rows)
    }

    /// Column count currently requested by the input field
    pub fn cols(&self) -> u32 {
        SliceConfig::parse_count(&self.cols_input, self.config.default_cols)
    }

    /// Accept a decoded upload unless a reload happened since it started
    pub fn finish_load(&mut self, epoch: u64, image: SourceImage) -> bool {
        if epoch != self.epoch {
            debug!("Dropping {} loaded before a reload", image.base_name);
            return false;
        }

        self.load_image(image);
        true
    }

    /// Replace the source image and reset the grid from the count fields
    pub fn load_image(&mut self, image: SourceImage) {
        self.last_base_name = image.base_name.clone();
        self.image = Some(image);
        self.drag.cancel();
        self.grid.initialize(self.rows(), self.cols());
    }

    /// Update the row field; the row axis goes back to even spacing
    pub fn set_rows_input(&mut self, text: String) {
        self.rows_input = text;
        self.reset_axis(Axis::Row);
    }

    /// Update the column field; the column axis goes back to even spacing
    pub fn set_cols_input(&mut self, text: String) {
        self.cols_input = text;
        self.reset_axis(Axis::Col);
    }

    fn reset_axis(&mut self, axis: Axis) {
        let count = match axis {
            Axis::Row => self.rows(),
            Axis::Col => self.cols(),
        };
        self.drag.cancel();
        self.grid.reset_axis(axis, count);
        debug!("Grid {:?} axis reset to {} cells", axis, count);
    }

    /// Feed a pointer event to the drag controller
    ///
    /// Returns true when the overlay changed.
    pub fn pointer(&mut self, input: PointerInput) -> bool {
        self.drag.handle(input, &mut self.grid)
    }

    /// Number the next tile will get
    pub fn next_index(&self) -> usize {
        self.tiles.len() + 1
    }

    /// Snapshot what a slice pass needs and mark one as running
    pub fn begin_slice(&mut self) -> Result<SliceJob> {
        let image = self.image.as_ref().ok_or(SlicerError::NoImage)?;
        if self.slicing {
            return Err(SlicerError::Busy);
        }

        let job = SliceJob {
            image: Arc::clone(&image.pixels),
            grid: self.grid.clone(),
            base_name: image.base_name.clone(),
            start_index: self.next_index(),
            generation: self.generation,
        };
        self.slicing = true;
        Ok(job)
    }

    /// Append the tiles of a finished pass
    ///
    /// Returns false if the pass was abandoned by a clear or reload.
    pub fn finish_slice(&mut self, generation: u64, tiles: Vec<Tile>) -> bool {
        if generation != self.generation {
            debug!("Dropping {} tiles from an abandoned pass", tiles.len());
            return false;
        }

        self.slicing = false;
        self.tiles.extend(tiles);
        true
    }

    /// Mark a pass as failed; tiles from earlier passes stay
    pub fn fail_slice(&mut self, generation: u64) {
        if generation == self.generation {
            self.slicing = false;
        }
    }

    /// Flip selection of one tile; returns the new state
    pub fn toggle_selection(&mut self, index: usize) -> bool {
        if index >= self.tiles.len() {
            return false;
        }
        if self.selection.remove(&index) {
            false
        } else {
            self.selection.insert(index);
            true
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    /// Tiles to export: the selection in index order, or everything if
    /// nothing is selected. None when there are no tiles at all.
    pub fn export_plan(&self) -> Option<ExportPlan> {
        if self.tiles.is_empty() {
            return None;
        }

        let selected_only = !self.selection.is_empty();
        let entries = if selected_only {
            self.selection
                .iter()
                .filter_map(|&i| self.tiles.get(i).map(|tile| (i, tile.clone())))
                .collect()
        } else {
            self.tiles.iter().cloned().enumerate().collect()
        };

        Some(ExportPlan {
            file_name: bundle_name(&self.last_base_name, selected_only),
            entries,
            selected_only,
        })
    }

    /// Drop all tiles and the selection; numbering restarts at 1
    pub fn clear_results(&mut self) {
        info!("🧹 Cleared {} tiles", self.tiles.len());
        self.tiles.clear();
        self.selection.clear();
        self.generation += 1;
        self.slicing = false;
    }

    /// Forget the current image but keep the results
    pub fn return_to_upload(&mut self) {
        self.image = None;
        self.drag.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::engine::slice;
    use crate::state::drag::{LineRef, OverlayBounds};
    use image::{Rgba, RgbaImage};

    fn source(name: &str, size: u32) -> SourceImage {
        let pixels =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([9, 9, 9, 255])));
        SourceImage::new(pixels, name.to_string())
    }

    fn run_pass(session: &mut Session) -> usize {
        let job = session.begin_slice().unwrap();
        let tiles = slice(&job.image, &job.grid, &job.base_name, job.start_index).unwrap();
        let count = tiles.len();
        assert!(session.finish_slice(job.generation, tiles));
        count
    }

    fn two_by_two() -> Session {
        let mut session = Session::new(SliceConfig::default());
        session.set_rows_input("2".into());
        session.set_cols_input("2".into());
        session.load_image(source("pic", 100));
        session
    }

    #[test]
    fn test_slice_without_image() {
        let mut session = Session::new(SliceConfig::default());
        assert!(matches!(session.begin_slice(), Err(SlicerError::NoImage)));
    }

    #[test]
    fn test_second_pass_continues_numbering() {
        let mut session = two_by_two();
        assert_eq!(run_pass(&mut session), 4);
        assert_eq!(run_pass(&mut session), 4);

        let names: Vec<_> = session.tiles().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[4], "pic_5.png");
        assert_eq!(names[7], "pic_8.png");
    }

    #[test]
    fn test_concurrent_pass_rejected() {
        let mut session = two_by_two();
        let job = session.begin_slice().unwrap();
        assert!(matches!(session.begin_slice(), Err(SlicerError::Busy)));

        session.fail_slice(job.generation);
        assert!(session.begin_slice().is_ok());
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut session = two_by_two();
        run_pass(&mut session);
        session.toggle_selection(1);

        session.clear_results();
        assert!(session.tiles().is_empty());
        assert_eq!(session.selection_count(), 0);

        run_pass(&mut session);
        assert_eq!(session.tiles()[0].name, "pic_1.png");
    }

    #[test]
    fn test_abandoned_pass_is_dropped() {
        let mut session = two_by_two();
        let job = session.begin_slice().unwrap();
        session.clear_results();

        let tiles = slice(&job.image, &job.grid, &job.base_name, job.start_index).unwrap();
        assert!(!session.finish_slice(job.generation, tiles));
        assert!(session.tiles().is_empty());
    }

    #[test]
    fn test_export_all_when_nothing_selected() {
        let mut session = two_by_two();
        assert!(session.export_plan().is_none());
        run_pass(&mut session);

        let plan = session.export_plan().unwrap();
        assert!(!plan.selected_only);
        assert_eq!(plan.file_name, "pic_sliced.zip");
        let indices: Vec<_> = plan.entries.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_export_selection_in_index_order() {
        let mut session = two_by_two();
        run_pass(&mut session);
        session.toggle_selection(3);
        session.toggle_selection(0);
        session.toggle_selection(2);
        session.toggle_selection(2);

        let plan = session.export_plan().unwrap();
        assert!(plan.selected_only);
        assert_eq!(plan.file_name, "pic_selected.zip");
        let names: Vec<_> = plan.entries.iter().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, ["pic_1.png", "pic_4.png"]);
    }

    #[test]
    fn test_toggle_out_of_range_ignored() {
        let mut session = two_by_two();
        run_pass(&mut session);
        assert!(!session.toggle_selection(99));
        assert_eq!(session.selection_count(), 0);
    }

    #[test]
    fn test_reload_resets_everything() {
        let mut session = two_by_two();
        run_pass(&mut session);
        session.toggle_selection(2);

        session.reload(SliceConfig::default());
        assert!(session.image().is_none());
        assert!(session.tiles().is_empty());
        assert_eq!(session.selection_count(), 0);
        assert_eq!(session.rows_input(), "4");
        assert_eq!(session.grid(), &GridModel::new(4, 4));
        assert!(!session.is_slicing());

        session.load_image(source("fresh", 40));
        run_pass(&mut session);
        assert_eq!(session.tiles()[0].name, "fresh_1.png");
    }

    #[test]
    fn test_reload_drops_pass_in_flight() {
        let mut session = two_by_two();
        run_pass(&mut session);
        let job = session.begin_slice().unwrap();

        session.reload(SliceConfig::default());

        let tiles = slice(&job.image, &job.grid, &job.base_name, job.start_index).unwrap();
        assert!(!session.finish_slice(job.generation, tiles));
        assert!(session.tiles().is_empty());
        assert_eq!(session.next_index(), 1);
    }

    #[test]
    fn test_reload_drops_load_in_flight() {
        let mut session = Session::new(SliceConfig::default());
        let epoch = session.epoch();

        session.reload(SliceConfig::default());
        assert!(!session.finish_load(epoch, source("late", 10)));
        assert!(session.image().is_none());

        // Clearing results does not invalidate loads
        let epoch = session.epoch();
        session.clear_results();
        assert!(session.finish_load(epoch, source("ok", 10)));
        assert_eq!(session.image().unwrap().base_name, "ok");
    }

    #[test]
    fn test_return_to_upload_keeps_results() {
        let mut session = two_by_two();
        run_pass(&mut session);
        session.toggle_selection(0);

        session.return_to_upload();
        assert!(session.image().is_none());
        assert_eq!(session.tiles().len(), 4);
        assert!(session.is_selected(0));
        // Bundle still named after the last upload
        assert_eq!(session.export_plan().unwrap().file_name, "pic_selected.zip");
    }

    #[test]
    fn test_count_change_resets_only_that_axis() {
        let mut session = two_by_two();
        let bounds = OverlayBounds::new(0.0, 0.0, 100.0, 100.0);
        let col = LineRef { axis: Axis::Col, index: 0 };
        session.pointer(PointerInput::Press(col));
        session.pointer(PointerInput::Move { x: 25.0, y: 0.0, bounds });
        session.pointer(PointerInput::Release);
        assert_eq!(session.grid().lines(Axis::Col), &[0.25]);

        session.set_rows_input("3".into());
        assert_eq!(session.grid().lines(Axis::Row).len(), 2);
        assert_eq!(session.grid().lines(Axis::Col), &[0.25]);

        session.set_cols_input("oops".into());
        assert_eq!(session.grid().lines(Axis::Col).len(), 3);
    }

    #[test]
    fn test_new_image_resets_grid() {
        let mut session = two_by_two();
        session.pointer(PointerInput::Press(LineRef { axis: Axis::Row, index: 0 }));
        session.pointer(PointerInput::Move {
            x: 0.0,
            y: 10.0,
            bounds: OverlayBounds::new(0.0, 0.0, 100.0, 100.0),
        });

        session.load_image(source("other", 50));
        assert!(!session.drag().is_dragging());
        assert_eq!(session.grid().lines(Axis::Row), &[0.5]);
    }
}
