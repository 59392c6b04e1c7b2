use crate::config::ConversionLimits;
use crate::error::Result;
use crate::pipeline::{load_image, qualifies_for_copy, resize_to_fit, to_jpeg_compatible};
use crate::probe::SizeProbe;
use crate::report::format_file_size;
use crate::search::{search_quality, SearchOutcome};
use image::metadata::Orientation;
use image::{ColorType, ImageFormat};
use std::path::Path;

/// What a conversion would do with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Copy,
    Reencode {
        /// Dimensions after downscaling, when the source exceeds the limit.
        resized_to: Option<(u32, u32)>,
        search: SearchOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub format: Option<ImageFormat>,
    pub color: ColorType,
    pub orientation: Orientation,
    /// Dimensions after orientation is applied.
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub budget_bytes: u64,
    pub action: PlannedAction,
}

/// Runs the conversion decisions for `path` without writing any output.
pub fn analyze_image<P: SizeProbe + ?Sized>(
    path: &Path,
    limits: &ConversionLimits,
    probe: &P,
) -> Result<ImageAnalysis> {
    let mut decoded = load_image(path)?;
    decoded.image.apply_orientation(decoded.orientation);

    let budget_bytes = limits.budget_bytes();
    let mut analysis = ImageAnalysis {
        format: decoded.format,
        color: decoded.image.color(),
        orientation: decoded.orientation,
        width: decoded.width(),
        height: decoded.height(),
        file_size: decoded.file_size,
        budget_bytes,
        action: PlannedAction::Copy,
    };

    if qualifies_for_copy(&decoded, budget_bytes, limits.max_dimension) {
        return Ok(analysis);
    }

    let mut image = decoded.image;
    let resized_to = resize_to_fit(&mut image, limits.max_dimension)
        .then(|| (image.width(), image.height()));
    let image = to_jpeg_compatible(image);
    let search = search_quality(probe, &image, budget_bytes)?;

    analysis.action = PlannedAction::Reencode { resized_to, search };
    Ok(analysis)
}

pub fn print_analysis(input_path: &Path, analysis: &ImageAnalysis) {
    println!("Analyzing image: {}", input_path.display());
    println!("  Format:      {}", describe_format(analysis.format));
    println!("  Dimensions:  {}x{} pixels", analysis.width, analysis.height);
    println!("  Color type:  {:?}", analysis.color);
    if analysis.orientation != Orientation::NoTransforms {
        println!("  Orientation: {:?} (applied)", analysis.orientation);
    }
    println!(
        "  File size:   {} (budget {})",
        format_file_size(analysis.file_size),
        format_file_size(analysis.budget_bytes)
    );

    println!();
    match &analysis.action {
        PlannedAction::Copy => {
            println!("Planned action: copy unchanged (already a JPEG within both limits)");
        }
        PlannedAction::Reencode { resized_to, search } => {
            println!("Planned action: re-encode as JPEG");
            if let Some((w, h)) = resized_to {
                println!("  Resize to:   {}x{} pixels", w, h);
            }
            if search.found {
                println!(
                    "  Quality:     {} (about {})",
                    search.quality,
                    format_file_size(search.achieved_bytes)
                );
            } else {
                println!(
                    "  Quality:     {} (still {}, over budget)",
                    search.quality,
                    format_file_size(search.achieved_bytes)
                );
            }
        }
    }
}

fn describe_format(format: Option<ImageFormat>) -> String {
    match format {
        Some(format) => format!("{:?}", format),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::probe::{encode_jpeg, TempFileProbe};
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_small_jpeg_is_copied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, image::Rgb([200, 10, 10])));
        let mut file = std::fs::File::create(&path).unwrap();
        encode_jpeg(&img, 90, &mut file).unwrap();
        drop(file);

        let analysis =
            analyze_image(&path, &ConversionLimits::default(), &TempFileProbe::new()).unwrap();

        assert_eq!(analysis.format, Some(ImageFormat::Jpeg));
        assert_eq!((analysis.width, analysis.height), (40, 30));
        assert_eq!(analysis.action, PlannedAction::Copy);
    }

    #[test]
    fn test_png_is_reencoded_and_resized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(400, 100, image::Rgb([0, 128, 255]))
            .save(&path)
            .unwrap();
        let limits = ConversionLimits::new(None, Some(200)).unwrap();

        let analysis = analyze_image(&path, &limits, &TempFileProbe::new()).unwrap();

        assert_eq!(analysis.format, Some(ImageFormat::Png));
        match analysis.action {
            PlannedAction::Reencode { resized_to, search } => {
                assert_eq!(resized_to, Some((200, 50)));
                assert!(search.found);
                assert_eq!(search.quality, 100);
            }
            PlannedAction::Copy => panic!("png should not be copied"),
        }
    }

    #[test]
    fn test_analysis_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("only.png");
        RgbImage::from_pixel(16, 16, image::Rgb([1, 2, 3])).save(&path).unwrap();

        analyze_image(&path, &ConversionLimits::default(), &TempFileProbe::in_dir(dir.path()))
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();

        let result = analyze_image(&path, &ConversionLimits::default(), &TempFileProbe::new());

        assert!(matches!(result, Err(ConvertError::Decode { .. })));
    }

    #[test]
    fn test_describe_format() {
        assert_eq!(describe_format(Some(ImageFormat::WebP)), "WebP");
        assert_eq!(describe_format(None), "unknown");
    }
}
