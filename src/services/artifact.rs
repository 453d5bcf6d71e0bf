//! Artifact bundle handling.
//!
//! A completed detection job returns a zip archive holding the annotated
//! image (and usually a JSON file with the boxes). The archive is written to
//! the job's scratch directory, extracted in place, and the image is located.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// File name the downloaded bundle is persisted under.
pub const ARCHIVE_FILE_NAME: &str = "output.zip";

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Persist `archive` into `destination`, extract every entry next to it and
/// return the path of the result image.
///
/// When the bundle holds several images the lexicographically smallest entry
/// name wins, so the choice does not depend on archive or directory order.
pub fn unpack(archive: &[u8], destination: &Path) -> Result<PathBuf, ArtifactError> {
    fs::create_dir_all(destination)?;
    fs::write(destination.join(ARCHIVE_FILE_NAME), archive)?;

    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut images: Vec<PathBuf> = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        // Rejects absolute paths and `..` components.
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "Skipping artifact entry with unsafe path");
            continue;
        };
        let dest_path = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!(entry = %relative.display(), size = entry.size(), "Extracted artifact entry");

        if is_image(&relative) {
            images.push(relative);
        }
    }

    images
        .into_iter()
        .min()
        .map(|relative| destination.join(relative))
        .ok_or(ArtifactError::NoImageArtifact)
}

/// Remove a job's scratch directory. A directory that is already gone is
/// not an error.
pub async fn discard(job_dir: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(job_dir).await {
        Ok(()) => {
            debug!(dir = %job_dir.display(), "Removed job scratch directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// MIME type for an extracted result image.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("No .jpg, .jpeg or .png file found in the artifact bundle")]
    NoImageArtifact,

    #[error("Artifact bundle is not a readable zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to write artifact files: {0}")]
    Io(#[from] io::Error),
}
