pub const DEFAULT_MAX_SIZE_MB: f64 = 7.5;
pub const DEFAULT_MAX_DIMENSION: u32 = 7500;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub const OUTPUT_FOLDER_NAME: &str = "Converted";
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Quality ranges tried in order, best first.
pub const HIGH_QUALITY_RANGE: (u8, u8) = (91, 100);
pub const ACCEPTABLE_QUALITY_RANGE: (u8, u8) = (50, 90);

/// Quality used when no probe fits the budget.
pub const FALLBACK_QUALITY: u8 = ACCEPTABLE_QUALITY_RANGE.0;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";
pub const PROGRESS_CHARS: &str = "=>-";

/// Candidate extensions picked up during the directory scan. Decoding is left
/// to the `image` crate; anything it cannot read is reported as a per-file
/// failure.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &[
    "tif", "tiff", "jpg", "jpeg", "png", "bmp", "gif", "webp", //
    "heic", "heif", //
    "psd", "psb", //
    "svg", //
    "3fr", "ari", "arw", "bay", "crw", "cr2", "cr3", "cap", "dcs", "dcr", "dng", "drf", "eip",
    "erf", "fff", "gpr", "iiq", "k25", "kdc", "mdc", "mef", "mos", "mrw", "nef", "nrw", "obm",
    "orf", "pef", "ptx", "pxn", "r3d", "raf", "raw", "rwl", "rw2", "rwz", "sr2", "srf", "srw",
    "x3f",
];

// Common output message prefixes
pub const WARNING_PREFIX: &str = "[WARN]";
pub const ERROR_PREFIX: &str = "[ERROR]";
pub const CRITICAL_PREFIX: &str = "[CRITICAL ERROR]";
