/// Zip packaging for exported tiles
///
/// Each tile becomes one entry named after the tile. The archive is built in
/// memory on the blocking pool and written out with tokio's fs API.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{Result, SlicerError};
use crate::state::data::Tile;

/// Extension of the exported archive
pub const BUNDLE_EXTENSION: &str = "zip";

/// What an export will contain
#[derive(Debug, Clone)]
pub struct ExportPlan {
    /// Suggested archive file name (e.g., "stickers_sliced.zip")
    pub file_name: String,
    /// Session tile index paired with the tile, in export order
    pub entries: Vec<(usize, Tile)>,
    /// Whether only the selected tiles are included
    pub selected_only: bool,
}

/// Archive name for a bundle of all tiles or only the selected ones
pub fn bundle_name(base_name: &str, selected_only: bool) -> String {
    let suffix = if selected_only { "selected" } else { "sliced" };
    format!("{}_{}.{}", base_name, suffix, BUNDLE_EXTENSION)
}

/// Entry names for the plan, made unique
///
/// Two uploads with the same base name produce clashing tile names; later
/// clashes get the 1-based session index appended, plus a counter if that
/// name is taken as well.
pub fn entry_names(entries: &[(usize, Tile)]) -> Vec<String> {
    let mut seen = HashSet::new();

    entries
        .iter()
        .map(|(index, tile)| {
            if seen.insert(tile.name.clone()) {
                return tile.name.clone();
            }

            let (stem, ext) = match tile.name.rfind('.') {
                Some(dot) => (&tile.name[..dot], &tile.name[dot..]),
                None => (tile.name.as_str(), ""),
            };
            let mut name = format!("{} ({}){}", stem, index + 1, ext);
            let mut attempt = 2;
            while !seen.insert(name.clone()) {
                name = format!("{} ({}-{}){}", stem, index + 1, attempt, ext);
                attempt += 1;
            }
            name
        })
        .collect()
}

/// Build the zip archive in memory
pub fn build_bundle(entries: &[(usize, Tile)]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for ((_, tile), name) in entries.iter().zip(entry_names(entries)) {
        zip.start_file(name, options)?;
        zip.write_all(&tile.data)?;
    }

    zip.finish()?;
    Ok(buffer)
}

/// Write a finished archive to disk
pub async fn write_bundle(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Package the plan and save it to `path`
///
/// Returns the number of entries written. Errors are flattened to strings
/// for the UI message.
pub async fn export_async(plan: ExportPlan, path: PathBuf) -> std::result::Result<usize, String> {
    let count = plan.entries.len();

    // Spawn blocking because deflating many tiles is CPU-intensive
    let bytes = task::spawn_blocking(move || build_bundle(&plan.entries))
        .await
        .map_err(|e| SlicerError::from(e).to_string())?
        .map_err(|e| e.to_string())?;

    write_bundle(&path, &bytes).await.map_err(|e| e.to_string())?;

    info!("📦 Exported {} tiles to {}", count, path.display());
    Ok(count)
}
