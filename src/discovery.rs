use crate::config::ConversionLimits;
use crate::constants::{OUTPUT_EXTENSION, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{ConvertError, Result};
use crate::pipeline::ImageTask;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of scanning the top level of a source directory.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Every regular file at the top level, images or not.
    pub total_entries: usize,
    pub image_files: Vec<PathBuf>,
}

/// Lists candidate image files directly inside `dir`. Subdirectories are not
/// entered. Results are sorted by path.
pub fn collect_image_files(dir: &Path) -> Result<ScanResult> {
    let discovery_error = |source: std::io::Error| ConvertError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(dir).map_err(discovery_error)?;
    if !metadata.is_dir() {
        return Err(discovery_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let mut scan = ScanResult::default();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
            discovery_error(source)
        })?;

        if !entry.path().is_file() {
            continue;
        }
        scan.total_entries += 1;

        if is_image_file(entry.path()) {
            scan.image_files.push(entry.into_path());
        }
    }

    scan.image_files.sort();
    Ok(scan)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// `dir/name.ext` maps to `output_dir/name.jpg`, whatever the extension.
///
/// Two sources that share a stem map to the same output; the later write wins.
pub fn generate_output_path(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file_stem = input_path.file_stem().ok_or_else(|| {
        ConvertError::Unexpected(format!("{} has no file name", input_path.display()))
    })?;

    let output_filename = format!("{}.{}", file_stem.to_string_lossy(), OUTPUT_EXTENSION);
    Ok(output_dir.join(output_filename))
}

/// Creates `output_dir` if needed.
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })
}

/// Turns scanned files into tasks sharing the same limits.
pub fn build_tasks(
    files: &[PathBuf],
    output_dir: &Path,
    limits: &ConversionLimits,
) -> Result<Vec<ImageTask>> {
    files
        .iter()
        .map(|source| {
            let output = generate_output_path(source, output_dir)?;
            Ok(ImageTask::new(source.clone(), output, limits))
        })
        .collect()
}
