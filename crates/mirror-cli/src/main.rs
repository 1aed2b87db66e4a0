use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mirror_core::{HttpClient, MirrorConfig, MirrorRunner};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "build-mirror")]
#[command(about = "Mirror the Robust build manifest, its artifacts and the hub server list")]
#[command(version)]
struct Args {
    /// Configuration file (TOML). Defaults are used if it does not exist.
    #[arg(short, long, value_name = "FILE", default_value = "mirror.toml")]
    config: PathBuf,

    /// Directory relative local paths are resolved against
    #[arg(short = 'C', long, value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Only run one of the mirrors
    #[arg(long, value_enum)]
    only: Option<Target>,

    /// Override the minimum version to mirror (0 mirrors everything)
    #[arg(long, value_name = "N")]
    min_version: Option<i64>,

    /// Ignore MIRROR_* environment variables
    #[arg(long)]
    no_env: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Build manifest and artifacts
    Build,
    /// Hub server list
    Hub,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn load_config(args: &Args) -> Result<MirrorConfig> {
    let mut config = MirrorConfig::build(Some(args.config.as_path()), !args.no_env)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(min_version) = args.min_version {
        config.build.minimum_version = min_version;
    }

    let base_dir = match &args.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    Ok(config.with_base_dir(base_dir))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    log::debug!("Storage root: {}", config.build.storage_root.display());

    let client = HttpClient::with_config(config.http_client_config())
        .context("Failed to create HTTP client")?;

    let mut runner = MirrorRunner::new(&config, Arc::new(client));
    match args.only {
        Some(Target::Build) => runner = runner.without_hub(),
        Some(Target::Hub) => runner = runner.without_build(),
        None => {}
    }

    // Strictly sequential I/O; no need for more than one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let summary = runtime.block_on(runner.run());
    if !summary.is_clean() {
        log::warn!("Mirror run finished with errors");
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
