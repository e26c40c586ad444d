use iced::widget::image::Image;
use iced::widget::{
    button, canvas, column, container, row, scrollable, stack, text, text_input, Column,
};
use iced::{
    event, window, Alignment, ContentFit, Element, Event, Length, Subscription, Task, Theme,
};
use iced_aw::Wrap;
use rfd::FileDialog;
use std::path::PathBuf;
use tracing::{info, warn};

mod error;
mod export;
mod logging;
mod slice;
mod state;
mod ui;

use state::config::SliceConfig;
use state::data::{SourceImage, Tile};
use state::drag::PointerInput;
use state::session::Session;

/// Size of the result card previews
const CARD_SIZE: f32 = 96.0;

/// Main application state
struct GridSlicer {
    /// Image, grid, tiles and selection for this run
    session: Session,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Choose Image"
    PickFile,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// Background decode finished
    ImageLoaded {
        epoch: u64,
        result: Result<SourceImage, String>,
    },
    /// Row count field edited
    RowsChanged(String),
    /// Column count field edited
    ColsChanged(String),
    /// Press, move or release on the grid overlay
    Pointer(PointerInput),
    /// User clicked "Slice"
    Slice,
    /// Background slice pass finished
    SliceComplete {
        generation: u64,
        result: Result<Vec<Tile>, String>,
    },
    /// User clicked a result card
    ToggleTile(usize),
    /// User clicked the download button
    Export,
    /// Background export finished with the number of files written
    ExportComplete(Result<usize, String>),
    /// Drop all tiles and the selection
    ClearResults,
    /// Back to the upload screen, keeping results
    ReturnToUpload,
    /// Start over with a fresh session
    Reload,
}

impl GridSlicer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = SliceConfig::load();
        info!(
            "🎨 Grid Slicer started ({}x{} default grid)",
            config.default_rows, config.default_cols
        );

        (
            GridSlicer {
                session: Session::new(config),
                status: "Choose an image or drop one onto the window.".to_string(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select an Image to Slice")
                    .add_filter("Images", slice::loader::PICKER_EXTENSIONS)
                    .pick_file();

                match file {
                    Some(path) => self.start_load(path),
                    None => Task::none(),
                }
            }
            Message::FileDropped(path) => self.start_load(path),
            Message::ImageLoaded { epoch, result } => {
                match result {
                    Ok(image) => {
                        let (width, height) = image.dimensions();
                        let status =
                            format!("Loaded {} ({}x{}).", image.base_name, width, height);
                        if self.session.finish_load(epoch, image) {
                            self.status = status;
                        }
                    }
                    Err(e) if epoch == self.session.epoch() => {
                        self.status = format!("❌ {}", e);
                    }
                    Err(_) => {}
                }
                Task::none()
            }
            Message::RowsChanged(value) => {
                self.session.set_rows_input(value);
                Task::none()
            }
            Message::ColsChanged(value) => {
                self.session.set_cols_input(value);
                Task::none()
            }
            Message::Pointer(input) => {
                self.session.pointer(input);
                Task::none()
            }
            Message::Slice => match self.session.begin_slice() {
                Ok(job) => {
                    self.status = "Slicing...".to_string();
                    let generation = job.generation;

                    // Launch async slice task
                    Task::perform(
                        slice::engine::slice_async(
                            job.image,
                            job.grid,
                            job.base_name,
                            job.start_index,
                        ),
                        move |result| Message::SliceComplete { generation, result },
                    )
                }
                Err(e) => {
                    self.status = format!("⚠️  {}", e);
                    Task::none()
                }
            },
            Message::SliceComplete { generation, result } => {
                match result {
                    Ok(tiles) => {
                        let count = tiles.len();
                        if self.session.finish_slice(generation, tiles) {
                            self.status = format!("✅ Cut {} tiles.", count);
                        }
                    }
                    Err(e) => {
                        warn!("⚠️  Slice failed: {}", e);
                        self.session.fail_slice(generation);
                        self.status = format!("❌ Slice failed: {}", e);
                    }
                }
                Task::none()
            }
            Message::ToggleTile(index) => {
                self.session.toggle_selection(index);
                Task::none()
            }
            Message::Export => {
                let Some(plan) = self.session.export_plan() else {
                    return Task::none();
                };

                // Show the native save dialog
                let mut dialog = FileDialog::new()
                    .set_title("Save Tiles")
                    .set_file_name(plan.file_name.as_str())
                    .add_filter("Zip archive", &[export::bundle::BUNDLE_EXTENSION]);
                if let Some(dir) = &self.session.config().export_dir {
                    dialog = dialog.set_directory(dir);
                }

                match dialog.save_file() {
                    Some(path) => {
                        let scope = if plan.selected_only { "selected" } else { "all" };
                        self.status = format!(
                            "Exporting {} {} tiles to {}...",
                            plan.entries.len(),
                            scope,
                            path.display()
                        );
                        Task::perform(
                            export::bundle::export_async(plan, path),
                            Message::ExportComplete,
                        )
                    }
                    None => Task::none(),
                }
            }
            Message::ExportComplete(Ok(count)) => {
                self.status = format!("✅ Exported {} files.", count);
                Task::none()
            }
            Message::ExportComplete(Err(e)) => {
                warn!("⚠️  Export failed: {}", e);
                self.status = format!("❌ Export failed: {}", e);
                Task::none()
            }
            Message::ClearResults => {
                self.session.clear_results();
                self.status = "Results cleared.".to_string();
                Task::none()
            }
            Message::ReturnToUpload => {
                self.session.return_to_upload();
                self.status = "Choose an image or drop one onto the window.".to_string();
                Task::none()
            }
            Message::Reload => {
                self.session.reload(SliceConfig::load());
                self.status = "Choose an image or drop one onto the window.".to_string();
                Task::none()
            }
        }
    }

    /// Validate the file type up front, then decode in the background
    fn start_load(&mut self, path: PathBuf) -> Task<Message> {
        if let Err(e) = slice::loader::check_image_type(&path) {
            warn!("⚠️  Rejected upload: {}", e);
            self.status = format!("❌ Please choose an image file. {}", e);
            return Task::none();
        }

        self.status = format!("Loading {}...", path.display());
        let fallback = self.session.config().fallback_base_name.clone();
        let epoch = self.session.epoch();
        Task::perform(
            slice::loader::load_image(path, fallback),
            move |result| Message::ImageLoaded { epoch, result },
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let workspace = match self.session.image() {
            Some(image) => self.editor_view(image),
            None => self.upload_view(),
        };

        let content: Column<Message> = column![
            workspace,
            text(&self.status).size(14),
            self.results_view(),
        ]
        .spacing(16)
        .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn upload_view(&self) -> Element<Message> {
        let content = column![
            text("Grid Slicer").size(36),
            button("Choose Image")
                .on_press(Message::PickFile)
                .padding(10),
            text("or drop an image onto the window").size(14),
        ]
        .spacing(16)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::FillPortion(3))
            .center_x(Length::Fill)
            .center_y(Length::FillPortion(3))
            .into()
    }

    fn editor_view<'a>(&'a self, image: &'a SourceImage) -> Element<'a, Message> {
        let slice_button = button(if self.session.is_slicing() { "Slicing..." } else { "Slice" })
            .on_press_maybe((!self.session.is_slicing()).then_some(Message::Slice))
            .padding(8);

        let controls = row![
            text("Rows"),
            text_input("4", self.session.rows_input())
                .on_input(Message::RowsChanged)
                .width(60),
            text("Columns"),
            text_input("4", self.session.cols_input())
                .on_input(Message::ColsChanged)
                .width(60),
            slice_button,
            button("Choose Another").on_press(Message::ReturnToUpload).padding(8),
            button("Reload").on_press(Message::Reload).padding(8),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let overlay = ui::GridOverlay {
            grid: self.session.grid(),
            active: self.session.drag().active(),
            natural: image.dimensions(),
            tolerance: self.session.config().hit_tolerance,
        };

        let picture = stack![
            Image::new(image.preview.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Contain),
            canvas(overlay).width(Length::Fill).height(Length::Fill),
        ];

        column![
            controls,
            container(picture)
                .width(Length::Fill)
                .height(Length::FillPortion(3)),
        ]
        .spacing(12)
        .height(Length::FillPortion(3))
        .into()
    }

    fn results_view(&self) -> Element<Message> {
        let tiles = self.session.tiles();

        let mut header = row![text(format!("Results ({})", tiles.len())).size(20)]
            .spacing(12)
            .align_y(Alignment::Center);

        if !tiles.is_empty() {
            let selected = self.session.selection_count();
            let label = if selected > 0 {
                header = header.push(text(format!("{} selected", selected)));
                format!("Download selected ({})", selected)
            } else {
                "Download all".to_string()
            };
            header = header
                .push(button(text(label)).on_press(Message::Export).padding(6))
                .push(button("Clear Results").on_press(Message::ClearResults).padding(6));
        }

        let cards: Vec<Element<Message>> = tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| {
                let style = if self.session.is_selected(index) {
                    button::primary
                } else {
                    button::secondary
                };

                button(
                    column![
                        Image::new(tile.preview.clone())
                            .width(CARD_SIZE)
                            .height(CARD_SIZE),
                        text(&tile.name).size(12),
                        text(format!("{}×{}", tile.width, tile.height)).size(11),
                    ]
                    .spacing(4)
                    .align_x(Alignment::Center),
                )
                .on_press(Message::ToggleTile(index))
                .style(style)
                .padding(6)
                .into()
            })
            .collect();

        let body: Element<Message> = if cards.is_empty() {
            text("No results yet. Load an image and click Slice.").size(14).into()
        } else {
            scrollable(Wrap::with_elements(cards).spacing(8.0).line_spacing(8.0))
                .width(Length::Fill)
                .into()
        };

        column![header, body]
            .spacing(10)
            .height(Length::FillPortion(2))
            .into()
    }

    /// Listen for files dropped onto the window
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    logging::init();

    iced::application("Grid Slicer", GridSlicer::update, GridSlicer::view)
        .theme(GridSlicer::theme)
        .subscription(GridSlicer::subscription)
        .centered()
        .run_with(GridSlicer::new)
}
