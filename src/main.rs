use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tribe_images::imaging::{ImageBackend, RustBackend};
use tribe_images::process::{self, Mode};
use tribe_images::upload;
use tribe_images::{config, data_url, output, validate};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "tribe-images")]
#[command(about = "Validate, resize and compress event images into JPEG data URLs")]
#[command(long_about = "\
Validate, resize and compress event images into JPEG data URLs

Every upload goes through the same four steps:

  validate   JPEG, PNG, GIF or WebP, no larger than max_size_mb
  decode     read the natural pixel size
  resize     fit within max_width x max_height, never upscale
  compress   lower JPEG quality by 0.1 until the data URL fits max_size_kb

Directories are searched recursively for image files. Results are written as
one .dataurl file per input with --output-dir, or printed one per line.

Run 'tribe-images gen-config' to generate a documented tribe-images.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when it does not exist)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Print one JSON object per line instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Files to check and the size ceiling to check them against.
#[derive(Args, Clone)]
struct InputArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Largest accepted upload in MB (overrides validation.max_size_mb)
    #[arg(long)]
    max_size_mb: Option<f64>,
}

/// Shared flags for commands that encode images.
#[derive(Args, Clone)]
struct EncodeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Write one .dataurl file per input into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Bounding box width
    #[arg(long)]
    max_width: Option<u32>,

    /// Bounding box height
    #[arg(long)]
    max_height: Option<u32>,

    /// JPEG quality factor, 0.1 to 1.0 (the starting point when compressing)
    #[arg(long)]
    quality: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// Check files against the upload rules without decoding them
    Validate(InputArgs),
    /// Fit images within the resize box and encode once
    Resize(EncodeArgs),
    /// Fit images within the compress box and search quality down to a size budget
    Compress {
        #[command(flatten)]
        encode: EncodeArgs,

        /// Target data URL size in KB (overrides compress.max_size_kb)
        #[arg(long)]
        max_size_kb: Option<u32>,
    },
    /// Show what a saved data URL contains
    Inspect {
        /// File holding a data URL
        file: PathBuf,
    },
    /// Print a stock tribe-images.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => {
            let mut cfg = config::load_config(&cli.config)?;
            apply_input_overrides(&mut cfg, &args);
            cfg.validate()?;
            let files = collect_inputs(&args.inputs)?;
            let mut all_valid = true;
            for (i, path) in files.iter().enumerate() {
                let result = validate::validate_path(path, cfg.validation.max_size_mb);
                match &result {
                    Ok(verdict) => {
                        all_valid &= verdict.is_valid;
                        if cli.json {
                            let report = output::ValidationReport::new(path, Ok(verdict));
                            println!("{}", report.to_json());
                        } else {
                            output::print_validation(i + 1, path, verdict);
                        }
                    }
                    Err(e) => {
                        all_valid = false;
                        let error = e.to_string();
                        if cli.json {
                            let report = output::ValidationReport::new(path, Err(error.as_str()));
                            println!("{}", report.to_json());
                        } else {
                            output::print_validation_error(i + 1, path, &error);
                        }
                    }
                }
            }
            if !all_valid {
                std::process::exit(1);
            }
        }
        Command::Resize(args) => {
            let mut cfg = config::load_config(&cli.config)?;
            apply_input_overrides(&mut cfg, &args.input);
            override_some(&mut cfg.resize.max_width, args.max_width);
            override_some(&mut cfg.resize.max_height, args.max_height);
            override_some(&mut cfg.resize.quality, args.quality);
            cfg.validate()?;
            run_batch(Mode::Resize, &cfg, &args, cli.json)?;
        }
        Command::Compress {
            encode,
            max_size_kb,
        } => {
            let mut cfg = config::load_config(&cli.config)?;
            apply_input_overrides(&mut cfg, &encode.input);
            override_some(&mut cfg.compress.max_width, encode.max_width);
            override_some(&mut cfg.compress.max_height, encode.max_height);
            override_some(&mut cfg.compress.quality, encode.quality);
            override_some(&mut cfg.compress.max_size_kb, max_size_kb);
            cfg.validate()?;
            run_batch(Mode::Compress, &cfg, &encode, cli.json)?;
        }
        Command::Inspect { file } => {
            let content = std::fs::read_to_string(&file)?;
            let parsed = data_url::parse(&content)?;
            let backend = RustBackend::new();
            let pixels = backend
                .decode(&parsed.bytes)
                .ok()
                .map(|bitmap| backend.dimensions(&bitmap));
            let url_len = content.trim().len();
            if cli.json {
                let line = serde_json::json!({
                    "path": file.display().to_string(),
                    "mime_type": parsed.mime_type,
                    "payload_bytes": parsed.bytes.len(),
                    "data_url_chars": url_len,
                    "width": pixels.map(|d| d.width),
                    "height": pixels.map(|d| d.height),
                });
                println!("{}", line);
            } else {
                output::print_inspection(
                    &file,
                    &parsed.mime_type,
                    parsed.bytes.len(),
                    url_len,
                    pixels,
                );
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn override_some<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn apply_input_overrides(cfg: &mut config::UploadConfig, args: &InputArgs) {
    override_some(&mut cfg.validation.max_size_mb, args.max_size_mb);
}

/// Run a resize or compress batch, report progress, and write results.
fn run_batch(
    mode: Mode,
    cfg: &config::UploadConfig,
    args: &EncodeArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&cfg.processing);
    let files = collect_inputs(&args.input.inputs)?;

    // Data URLs own stdout when there is no output directory.
    let progress_to_stderr = args.output_dir.is_none();
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            let lines = if json {
                vec![serde_json::to_string(&event).unwrap_or_default()]
            } else {
                output::format_process_event(&event)
            };
            for line in lines {
                if progress_to_stderr {
                    eprintln!("{}", line);
                } else {
                    println!("{}", line);
                }
            }
        }
    });

    let outcomes = process::process_files(&RustBackend::new(), &files, mode, cfg, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }
    for outcome in &outcomes {
        let Ok(encoded) = &outcome.result else {
            continue;
        };
        match &args.output_dir {
            Some(dir) => {
                let target = dataurl_path(dir, &outcome.path);
                std::fs::write(&target, &encoded.data_url)?;
                log::info!("wrote {}", target.display());
            }
            None => println!("{}", encoded.data_url),
        }
    }

    if !json {
        for line in output::format_batch_summary(&outcomes) {
            if progress_to_stderr {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }

    if outcomes.iter().any(|o| o.result.is_err()) {
        std::process::exit(1);
    }
    Ok(())
}

/// `<output_dir>/<file stem>.dataurl`
fn dataurl_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}.dataurl"))
}

/// Expand directories into the image files beneath them (sorted by name);
/// explicit file arguments are kept as given.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && upload::is_image_path(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
