/// Slicing engine
///
/// Turns the fractional grid into pixel rectangles and encodes each one as a
/// PNG tile. Every cell edge is rounded on its own (half away from zero), so
/// neighbouring tiles share their edge exactly and the tiles of one pass
/// always cover the whole image without seams or overlap.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

use crate::error::{Result, SlicerError};
use crate::state::data::Tile;
use crate::state::grid::{Axis, GridModel};

/// Extension of every tile file
pub const TILE_EXTENSION: &str = "png";

/// A cell of the grid in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Round a boundary fraction to a pixel edge
fn edge(fraction: f64, dimension: u32) -> i64 {
    let pixel = (fraction * f64::from(dimension)).round() as i64;
    pixel.clamp(0, i64::from(dimension))
}

/// Compute every non-empty cell in row-major order (rows outer, columns inner)
pub fn pixel_rects(grid: &GridModel, width: u32, height: u32) -> Vec<PixelRect> {
    let ys = grid.boundaries(Axis::Row);
    let xs = grid.boundaries(Axis::Col);
    let mut rects = Vec::with_capacity((ys.len() - 1) * (xs.len() - 1));

    for (row, band) in ys.windows(2).enumerate() {
        let y0 = edge(band[0], height);
        let y1 = edge(band[1], height);

        for (col, span) in xs.windows(2).enumerate() {
            let x0 = edge(span[0], width);
            let x1 = edge(span[1], width);

            if x1 - x0 <= 0 || y1 - y0 <= 0 {
                debug!("Skipping empty cell at row {}, col {}", row, col);
                continue;
            }

            rects.push(PixelRect {
                x: x0 as u32,
                y: y0 as u32,
                width: (x1 - x0) as u32,
                height: (y1 - y0) as u32,
            });
        }
    }

    rects
}

/// File name for the tile numbered `counter`
pub fn tile_name(base_name: &str, counter: usize) -> String {
    format!("{}_{}.{}", base_name, counter, TILE_EXTENSION)
}

/// Cut `image` along `grid` and encode each cell
///
/// Numbering starts at `start_index` and advances only for emitted tiles.
pub fn slice(
    image: &DynamicImage,
    grid: &GridModel,
    base_name: &str,
    start_index: usize,
) -> Result<Vec<Tile>> {
    let rects = pixel_rects(grid, image.width(), image.height());
    let mut tiles = Vec::with_capacity(rects.len());

    for (offset, rect) in rects.iter().enumerate() {
        let name = tile_name(base_name, start_index + offset);
        let data = encode_rect(image, rect).map_err(|source| SlicerError::Encode {
            name: name.clone(),
            source,
        })?;

        tiles.push(Tile::new(data, name, rect.width, rect.height));
    }

    Ok(tiles)
}

/// Crop one rectangle and encode it as PNG
fn encode_rect(image: &DynamicImage, rect: &PixelRect) -> image::ImageResult<Vec<u8>> {
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);

    // PNG has no float formats; 16-bit keeps the most precision losslessly available
    let cropped = match cropped {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba16(cropped.to_rgba16())
        }
        other => other,
    };

    let mut bytes = Vec::new();
    cropped.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Run a slice pass on the blocking pool
///
/// Errors are flattened to strings for the UI message.
pub async fn slice_async(
    image: Arc<DynamicImage>,
    grid: GridModel,
    base_name: String,
    start_index: usize,
) -> std::result::Result<Vec<Tile>, String> {
    // Spawn blocking because encoding many PNGs is CPU-intensive
    let tiles = task::spawn_blocking(move || slice(&image, &grid, &base_name, start_index))
        .await
        .map_err(|e| SlicerError::from(e).to_string())?
        .map_err(|e| e.to_string())?;

    info!(
        "✂️  Sliced {} tiles (#{}..#{})",
        tiles.len(),
        start_index,
        start_index + tiles.len().saturating_sub(1)
    );
    Ok(tiles)
}
