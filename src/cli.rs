use crate::config::{parse_dimension, parse_size_mb};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-fit",
    about = "Normalize a folder of images into size-limited JPEGs",
    long_about = "img-fit converts every image at the top level of a folder into a baseline JPEG \
                  that fits a byte budget and a maximum pixel dimension. Conforming JPEGs are copied \
                  unchanged; everything else is oriented, downscaled if needed and re-encoded at the \
                  highest quality that fits. Files are processed in parallel.",
    version,
    after_help = "EXAMPLES:\n  \
    img-fit                                  convert the current folder into ./Converted\n  \
    img-fit ./photos -s 5MB -d 2000px\n  \
    img-fit convert ./photos -o ./out -j 4\n  \
    img-fit info ./photos/IMG_0001.HEIC -s 2"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub convert: ConvertArgs,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Show debug logging",
        long_help = "Raise the log level to debug for img-fit. RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        help = "Hide the progress bar"
    )]
    pub quiet: bool,
}

impl Args {
    /// The subcommand to run. A bare invocation converts.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Convert(self.convert))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Convert every image in a folder",
        long_about = "Convert every image at the top level of INPUT_DIR into a JPEG that satisfies the \
                      size and dimension limits. Subfolders are not entered. Per-file failures are \
                      reported and do not stop the batch."
    )]
    Convert(ConvertArgs),

    #[command(
        about = "Show what a conversion would do with one image",
        long_about = "Decode a single image, print its properties and the action a conversion would \
                      take: copy, or resize and re-encode at the quality the search settles on. \
                      Nothing is written."
    )]
    Info {
        #[arg(help = "Image file to analyze")]
        input: PathBuf,

        #[arg(short = 's', long = "max-size", value_parser = parse_size_mb, help = "Maximum output size in MB (default: 7.5)")]
        max_size: Option<f64>,

        #[arg(short = 'd', long = "max-dimension", value_parser = parse_dimension, help = "Maximum width or height in pixels (default: 7500)")]
        max_dimension: Option<u32>,
    },
}

#[derive(ClapArgs, Debug, Default)]
pub struct ConvertArgs {
    #[arg(help = "Folder to convert (default: current directory)")]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Output folder (default: INPUT_DIR/Converted)",
        long_help = "Folder the converted JPEGs are written to. Created if missing. \
                     Must differ from the input folder."
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 's',
        long = "max-size",
        value_parser = parse_size_mb,
        help = "Maximum output size in MB (default: 7.5)",
        long_help = "Byte budget per output file, in megabytes of 1024*1024 bytes. \
                     Accepts a plain number or a value with an MB suffix, e.g. 5 or 5MB."
    )]
    pub max_size: Option<f64>,

    #[arg(
        short = 'd',
        long = "max-dimension",
        value_parser = parse_dimension,
        help = "Maximum width or height in pixels (default: 7500)",
        long_help = "Larger images are downscaled to fit, keeping their aspect ratio. \
                     Accepts a plain number or a value with a px suffix, e.g. 2000 or 2000px."
    )]
    pub max_dimension: Option<u32>,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel workers (default: auto)",
        long_help = "Number of files converted at the same time. \
                     If not specified, uses the number of logical CPU cores."
    )]
    pub threads: Option<usize>,
}
