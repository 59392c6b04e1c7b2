pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod info;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod runner;
pub mod search;

pub use config::{parse_dimension, parse_size_mb, ConversionLimits};
pub use discovery::{
    build_tasks, collect_image_files, generate_output_path, is_image_file, prepare_output_dir,
    ScanResult,
};
pub use error::{ConvertError, Result};
pub use info::{analyze_image, print_analysis, ImageAnalysis, PlannedAction};
pub use pipeline::{
    convert, convert_with_probe, load_image, qualifies_for_copy, resize_to_fit, to_jpeg_compatible,
    ConversionOutcome, DecodedImage, ImageTask,
};
pub use probe::{encode_jpeg, write_jpeg, SizeProbe, TempFileProbe};
pub use runner::{BatchRunner, ProgressSink, RunTally, TaskReport};
pub use search::{search_quality, SearchOutcome, SearchRange, QUALITY_RANGES};
