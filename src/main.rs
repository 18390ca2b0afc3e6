use clap::{Parser, Subcommand};
use picker_resize::imaging::{ImageBackend, RustBackend};
use picker_resize::output::{self, BatchSummary};
use picker_resize::sources::collect_sources;
use picker_resize::{ImageResizer, ResizeRequest, config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "picker-resize")]
#[command(about = "Downscale picked images into a cache directory")]
#[command(long_about = "\
Downscale picked images into a cache directory

Each image is probed first. With no hints it is left alone. With any of
--max-width, --max-height or --quality it is scaled to fit (never upscaled),
written as <output-dir>/scaled_<name>, and whitelisted EXIF fields are copied
across. Images that cannot be read or decoded are reported unchanged.

Images with transparency are written as PNG; everything else as JPEG.

Run 'picker-resize gen-config' to generate a documented resize.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing resize.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log decisions and fallbacks (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scale images that exceed the given bounds
    Resize(ResizeArgs),
    /// Print image dimensions without decoding pixels
    Identify {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock resize.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Maximum output width in pixels
    #[arg(long)]
    max_width: Option<f64>,

    /// Maximum output height in pixels
    #[arg(long)]
    max_height: Option<f64>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u32>,

    /// Output directory (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Disable the resize cache and force re-encoding
    #[arg(long)]
    no_cache: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resize(args) => {
            let mut config = config::load_config(&cli.config_dir)?;
            if args.no_cache {
                config.cache.enabled = false;
            }
            init_thread_pool(&config.processing);

            let request = ResizeRequest::new(args.max_width, args.max_height, args.quality)?;
            let resizer = ImageResizer::from_config(&config, args.output_dir.as_deref())?;
            let sources = collect_sources(&args.paths, Some(resizer.output_dir()));

            let mut summary = BatchSummary::default();
            for (source, result) in resizer.resize_all(&sources, &request) {
                output::print_resize_result(&source, &result);
                summary.record(&result);
            }
            output::print_batch_summary(&summary);
        }
        Command::Identify { paths } => {
            let backend = RustBackend::new();
            for source in collect_sources(&paths, None) {
                output::print_identify(&source, &backend.identify(&source));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "picker_resize=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the core count: config can lower the thread count, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
