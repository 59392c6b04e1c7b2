use crate::config::ConversionLimits;
use crate::constants::{BYTES_PER_MB, WARNING_PREFIX};
use crate::error::{ConvertError, Result};
use crate::probe::{write_jpeg, SizeProbe, TempFileProbe};
use crate::search::search_quality;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// One file to convert. Built by discovery, consumed once by [`convert`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTask {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_bytes: u64,
    pub max_dimension: u32,
}

impl ImageTask {
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        limits: &ConversionLimits,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            max_bytes: limits.budget_bytes(),
            max_dimension: limits.max_dimension,
        }
    }

    /// File name used in console messages.
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

#[derive(Debug)]
pub enum ConversionOutcome {
    /// Source was already a conforming JPEG and was copied byte for byte.
    Copied,
    Converted { quality: u8 },
    /// Written, but no quality in the search ranges met the byte budget.
    ConvertedWithWarning { quality: u8, achieved_bytes: u64 },
    Failed(ConvertError),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ConversionOutcome::Failed(_))
    }

    /// Advisory line for outcomes that missed the budget.
    pub fn warning_message(&self, display_name: &str) -> Option<String> {
        match self {
            ConversionOutcome::ConvertedWithWarning {
                quality,
                achieved_bytes,
            } => Some(format!(
                "{} Best achievable quality for {} is {} (size: {:.2}MB)",
                WARNING_PREFIX,
                display_name,
                quality,
                *achieved_bytes as f64 / BYTES_PER_MB
            )),
            _ => None,
        }
    }
}

/// A decoded source file with the metadata the pipeline decides on.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
    pub orientation: Orientation,
    pub file_size: u64,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Reads and decodes `path`, sniffing the format from the file contents and
/// falling back to the extension.
pub fn load_image(path: &Path) -> Result<DecodedImage> {
    let decode_error = |source: image::ImageError| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file_size = fs::metadata(path)?.len();
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();

    let mut decoder = reader.into_decoder().map_err(decode_error)?;
    let orientation = decoder.orientation().map_err(decode_error)?;
    let image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

    Ok(DecodedImage {
        image,
        format,
        orientation,
        file_size,
    })
}

/// True when the source can be copied through untouched.
pub fn qualifies_for_copy(decoded: &DecodedImage, max_bytes: u64, max_dimension: u32) -> bool {
    decoded.format == Some(ImageFormat::Jpeg)
        && decoded.file_size <= max_bytes
        && decoded.width() <= max_dimension
        && decoded.height() <= max_dimension
}

/// Shrinks `img` so neither side exceeds `max_dimension`, keeping the aspect
/// ratio. Never upscales. Returns whether a resize happened.
pub fn resize_to_fit(img: &mut DynamicImage, max_dimension: u32) -> bool {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        return false;
    }
    *img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    true
}

/// Converts to a pixel layout baseline JPEG can hold: 8-bit gray or RGB, no
/// alpha.
pub fn to_jpeg_compatible(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img,
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma8(img.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Converts one file using scratch files in the system temp directory.
pub fn convert(task: &ImageTask) -> ConversionOutcome {
    convert_with_probe(task, &TempFileProbe::new())
}

/// Converts one file, measuring candidate qualities with `probe`.
///
/// Never returns an error: decode, encode and I/O failures, and panics from
/// inside the codec, all become [`ConversionOutcome::Failed`]. A failure after
/// this task started writing its output removes that file; an output left by
/// an earlier task is not touched.
pub fn convert_with_probe<P: SizeProbe + ?Sized>(task: &ImageTask, probe: &P) -> ConversionOutcome {
    let mut writing = false;
    let error = match panic::catch_unwind(AssertUnwindSafe(|| try_convert(task, probe, &mut writing))) {
        Ok(Ok(outcome)) => return outcome,
        Ok(Err(e)) => e,
        Err(payload) => ConvertError::Unexpected(panic_message(payload.as_ref())),
    };

    if !writing {
        return ConversionOutcome::Failed(error);
    }
    match remove_partial_output(&task.output) {
        Ok(()) => ConversionOutcome::Failed(error),
        Err(cleanup) => ConversionOutcome::Failed(ConvertError::PartialOutput {
            path: task.output.clone(),
            error: Box::new(error),
            cleanup,
        }),
    }
}

/// `writing` flips to true right before the output path is first touched.
fn try_convert<P: SizeProbe + ?Sized>(
    task: &ImageTask,
    probe: &P,
    writing: &mut bool,
) -> Result<ConversionOutcome> {
    let mut decoded = load_image(&task.source)?;
    decoded.image.apply_orientation(decoded.orientation);

    if qualifies_for_copy(&decoded, task.max_bytes, task.max_dimension) {
        *writing = true;
        fs::copy(&task.source, &task.output)?;
        tracing::debug!(source = %task.source.display(), "copied without re-encoding");
        return Ok(ConversionOutcome::Copied);
    }

    let DecodedImage { mut image, .. } = decoded;
    let (width, height) = (image.width(), image.height());
    if resize_to_fit(&mut image, task.max_dimension) {
        tracing::debug!(
            source = %task.source.display(),
            from = %format!("{}x{}", width, height),
            to = %format!("{}x{}", image.width(), image.height()),
            "resized"
        );
    }
    let image = to_jpeg_compatible(image);

    let search = search_quality(probe, &image, task.max_bytes)?;
    *writing = true;
    let final_size = write_jpeg(&image, search.quality, &task.output)?;
    tracing::debug!(
        source = %task.source.display(),
        quality = search.quality,
        found = search.found,
        final_size,
        "written"
    );

    if !search.found || final_size > task.max_bytes {
        Ok(ConversionOutcome::ConvertedWithWarning {
            quality: search.quality,
            achieved_bytes: final_size,
        })
    } else {
        Ok(ConversionOutcome::Converted {
            quality: search.quality,
        })
    }
}

fn remove_partial_output(output: &Path) -> std::io::Result<()> {
    match fs::remove_file(output) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "codec panicked".to_string()
    }
}
