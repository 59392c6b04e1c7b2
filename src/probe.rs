//! Trial JPEG encodes used to measure output size.
//!
//! A probe encodes the image into a scratch file, reads back its length and
//! lets the file go. [`NamedTempFile`] removes the scratch file when it drops,
//! so an encoder error halfway through a write still cleans up.

use crate::error::{ConvertError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Measures the encoded size of an image at a given JPEG quality.
pub trait SizeProbe {
    fn probe_size(&self, img: &DynamicImage, quality: u8) -> Result<u64>;
}

/// Probe that encodes into a throwaway file in a scratch directory.
#[derive(Debug, Clone, Default)]
pub struct TempFileProbe {
    scratch_dir: Option<PathBuf>,
}

impl TempFileProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places scratch files in `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: Some(dir.into()),
        }
    }

    fn scratch_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".img-fit-probe-").suffix(".jpg");
        match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

impl SizeProbe for TempFileProbe {
    fn probe_size(&self, img: &DynamicImage, quality: u8) -> Result<u64> {
        let scratch = self.scratch_file()?;
        let mut writer = BufWriter::new(scratch.as_file());
        encode_jpeg(img, quality, &mut writer)?;
        writer.flush()?;
        drop(writer);

        let size = scratch.as_file().metadata()?.len();
        tracing::debug!(quality, size, "probe");
        Ok(size)
    }
}

/// Encodes `img` as baseline JPEG at `quality` into `writer`.
///
/// The image must already be in a JPEG-compatible layout, see
/// [`to_jpeg_compatible`](crate::pipeline::to_jpeg_compatible).
pub fn encode_jpeg<W: Write>(img: &DynamicImage, quality: u8, writer: &mut W) -> Result<()> {
    let encoder = JpegEncoder::new_with_quality(writer, quality);
    img.write_with_encoder(encoder)
        .map_err(|source| ConvertError::Encode { quality, source })
}

/// Writes the final JPEG to `output` and returns its size on disk.
pub fn write_jpeg(img: &DynamicImage, quality: u8, output: &Path) -> Result<u64> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    encode_jpeg(img, quality, &mut writer)?;
    writer.flush()?;
    drop(writer);

    Ok(std::fs::metadata(output)?.len())
}
