/// Upload loader
///
/// Checks that a picked or dropped file is a raster image, works out the base
/// name used for tile files, and decodes the pixels off the UI thread.

use image::ImageFormat;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{info, warn};

use crate::error::{Result, SlicerError};
use crate::state::data::SourceImage;

/// Extensions offered in the file picker
pub const PICKER_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico", "tga", "qoi",
];

/// Guess a MIME type from a file name
///
/// Only raster formats the decoder supports map to `image/*`.
pub fn guess_mime(path: &Path) -> String {
    match format_of(path) {
        Some(format) => format.to_mime_type().to_string(),
        None => "application/octet-stream".to_string(),
    }
}

/// Reject anything whose MIME type is not `image/*`
pub fn check_image_type(path: &Path) -> Result<()> {
    let mime = guess_mime(path);
    if mime.starts_with("image/") {
        return Ok(());
    }

    Err(SlicerError::UnsupportedFileType {
        name: display_name(path),
        mime,
    })
}

/// File name with its final extension stripped ("a.b.png" -> "a.b")
pub fn base_name(path: &Path) -> String {
    let name = display_name(path);
    match name.rfind('.') {
        Some(dot) => name[..dot].to_string(),
        None => name,
    }
}

/// Raster format implied by the name's final extension
///
/// Dotfiles such as ".png" count as having an extension here.
fn format_of(path: &Path) -> Option<ImageFormat> {
    let name = display_name(path);
    let dot = name.rfind('.')?;
    ImageFormat::from_extension(&name[dot + 1..])
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Decode an upload on the blocking pool
///
/// `fallback` replaces an empty base name. Errors are flattened to strings
/// for the UI message.
pub async fn load_image(
    path: PathBuf,
    fallback: String,
) -> std::result::Result<SourceImage, String> {
    // Spawn blocking because decoding large images is CPU-intensive
    task::spawn_blocking(move || load_image_blocking(&path, &fallback))
        .await
        .map_err(|e| SlicerError::from(e).to_string())?
        .map_err(|e| {
            warn!("⚠️  {}", e);
            e.to_string()
        })
}

/// Blocking implementation of image loading
pub fn load_image_blocking(path: &Path, fallback: &str) -> Result<SourceImage> {
    check_image_type(path)?;

    let mut reader = image::ImageReader::open(path)?;
    let pixels = match format_of(path) {
        Some(format) => {
            reader.set_format(format);
            reader.decode()?
        }
        None => reader.with_guessed_format()?.decode()?,
    };

    let stem = base_name(path);
    let base_name = if stem.is_empty() { fallback.to_string() } else { stem };

    info!(
        "🖼️  Loaded {} ({}x{})",
        path.display(),
        pixels.width(),
        pixels.height()
    );

    Ok(SourceImage::new(pixels, base_name))
}
