use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use img_fit::cli::{Args, Commands, ConvertArgs};
use img_fit::constants::{CRITICAL_PREFIX, OUTPUT_FOLDER_NAME};
use img_fit::report::{cause_lines, format_summary, print_file_names, ConsoleReporter};
use img_fit::{
    analyze_image, build_tasks, collect_image_files, prepare_output_dir, print_analysis,
    BatchRunner, ConversionLimits, ConvertError, TempFileProbe,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    let quiet = args.quiet;

    let result = match args.into_command() {
        Commands::Convert(convert) => run_convert(convert, quiet),
        Commands::Info {
            input,
            max_size,
            max_dimension,
        } => run_info(&input, max_size, max_dimension),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_critical(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "img_fit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_convert(args: ConvertArgs, quiet: bool) -> Result<()> {
    let limits = ConversionLimits::new(args.max_size, args.max_dimension)?;

    let input_dir = match args.input {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not determine the current directory")?,
    };
    let output_dir = args
        .output
        .unwrap_or_else(|| input_dir.join(OUTPUT_FOLDER_NAME));
    ensure_distinct(&input_dir, &output_dir)?;

    println!("img-fit: normalizing images to JPEG");
    println!(
        "Limits: {:.2} MB per file, {} px per side",
        limits.max_size_mb, limits.max_dimension
    );
    println!();

    let scan = collect_image_files(&input_dir)?;
    println!(
        "Scanning '{}' (contains {} total items at the top level)...",
        input_dir.display(),
        scan.total_entries
    );

    if scan.image_files.is_empty() {
        println!(
            "No image files with supported extensions found in '{}'.",
            input_dir.display()
        );
        return Ok(());
    }

    println!("Found {} image files to process:", scan.image_files.len());
    if !quiet {
        print_file_names(&scan.image_files);
    }

    prepare_output_dir(&output_dir)?;
    let tasks = build_tasks(&scan.image_files, &output_dir, &limits)?;

    let runner = BatchRunner::new(args.threads);
    tracing::debug!(workers = runner.workers(), output = %output_dir.display(), "converting");

    let started = Instant::now();
    let mut reporter = ConsoleReporter::new(quiet);
    let tally = runner.run(&tasks, &mut reporter)?;

    println!("{}", format_summary(&tally, &output_dir, started.elapsed()));
    Ok(())
}

fn run_info(input: &Path, max_size: Option<f64>, max_dimension: Option<u32>) -> Result<()> {
    let limits = ConversionLimits::new(max_size, max_dimension)?;
    let analysis = analyze_image(input, &limits, &TempFileProbe::new())
        .with_context(|| format!("Could not analyze {}", input.display()))?;
    print_analysis(input, &analysis);
    Ok(())
}

/// Writing into the source folder itself would let a copy truncate its own
/// source, so the two must resolve to different paths.
fn ensure_distinct(input_dir: &Path, output_dir: &Path) -> Result<()> {
    let input = canonical_or_self(input_dir);
    let output = canonical_or_self(output_dir);
    if input == output {
        bail!(
            "Output folder '{}' is the same as the input folder",
            output_dir.display()
        );
    }
    Ok(())
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn print_critical(error: &anyhow::Error) {
    let mut lines = vec![format!("{} {}", CRITICAL_PREFIX, error)];
    let permission_denied = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ConvertError>())
        .any(ConvertError::is_permission_denied);
    if permission_denied {
        lines.push("  Insufficient permissions.".to_string());
    }
    lines.extend(cause_lines(&**error));

    for line in lines {
        eprintln!("{}", style(line).for_stderr().red().bold());
    }
}
