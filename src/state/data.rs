/// Shared data structures for the session state
///
/// These structs represent the data model that flows between
/// the slicing engine and the UI layer.

use iced::widget::image::Handle;
use image::DynamicImage;
use std::sync::Arc;

/// The decoded upload every slice pass reads from
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Decoded pixels, shared with background slice tasks
    pub pixels: Arc<DynamicImage>,
    /// File name without its extension (e.g., "stickers" for "stickers.webp")
    pub base_name: String,
    /// Handle for displaying the image under the grid
    pub preview: Handle,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage, base_name: String) -> Self {
        let rgba = pixels.to_rgba8();
        let preview = Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw());

        Self {
            pixels: Arc::new(pixels),
            base_name,
            preview,
        }
    }

    /// Natural size in pixels (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }
}

/// One encoded slice of the source image
#[derive(Debug, Clone)]
pub struct Tile {
    /// Encoded PNG bytes
    pub data: Arc<Vec<u8>>,
    /// File name used for display and inside the bundle (e.g., "stickers_3.png")
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Handle for the result card preview
    pub preview: Handle,
}

impl Tile {
    pub fn new(data: Vec<u8>, name: String, width: u32, height: u32) -> Self {
        let data = Arc::new(data);
        let preview = Handle::from_bytes(data.as_ref().clone());

        Self {
            data,
            name,
            width,
            height,
            preview,
        }
    }
}
