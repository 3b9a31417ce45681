use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use msminer_core::analysis::{analyze_file, CountSource, TopologyAnalysis};
use msminer_core::config::Config;
use msminer_core::dataset::{self, DatasetRow};
use msminer_core::discovery;
use msminer_core::keywords::KeywordSet;

use msminer_report::json::CountOutput;
use msminer_report::{json, text};

#[derive(Parser)]
#[command(name = "msminer")]
#[command(about = "Mine microservice topology metrics from docker-compose descriptors")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every topology descriptor found under a directory
    Analyze {
        /// Path to the repository snapshot
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
        /// Config file path (defaults to .msminer.toml in the snapshot or an ancestor)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List topology descriptors found under a directory
    Locate {
        /// Path to the repository snapshot
        path: PathBuf,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the microservice count of a repository snapshot
    Count {
        /// Path to the repository snapshot
        path: PathBuf,
        /// Graph supplying the count (overrides the config file)
        #[arg(long)]
        source: Option<CountSource>,
        /// Emit JSON instead of the bare number
        #[arg(long)]
        json: bool,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print one dataset CSV row for a repository snapshot
    Row {
        /// Path to the repository snapshot
        path: PathBuf,
        /// Repository URL for the REPO column
        #[arg(long)]
        repo: String,
        /// Commit hash for the COMMIT column
        #[arg(long)]
        commit: String,
        /// Additional column values, e.g. --set AUTHORS=4 --set NCLOC=1200
        #[arg(long = "set", value_name = "COLUMN=VALUE")]
        values: Vec<String>,
        /// Print the header line first
        #[arg(long)]
        header: bool,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .msminer.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            path,
            format,
            compact,
            config,
        } => cmd_analyze(&path, format, compact, config.as_deref()),
        Commands::Locate { path, config } => cmd_locate(&path, config.as_deref()),
        Commands::Count {
            path,
            source,
            json,
            config,
        } => cmd_count(&path, source, json, config.as_deref()),
        Commands::Row {
            path,
            repo,
            commit,
            values,
            header,
            config,
        } => cmd_row(&path, &repo, &commit, &values, header, config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Loaded configuration plus the keyword set it describes.
struct Settings {
    config: Config,
    keywords: KeywordSet,
}

fn load_settings(project_path: &Path, config_path: Option<&Path>) -> Result<Settings> {
    let (config, base) = match config_path {
        Some(p) => {
            let base = p
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (Config::load(p)?, base)
        }
        None => Config::load_or_default(project_path),
    };
    let keywords = config
        .keywords
        .build(&base)
        .context("failed to load keyword lists")?;
    Ok(Settings { config, keywords })
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("'{}' is not a directory", path.display());
    }
    Ok(())
}

fn cmd_analyze(
    path: &Path,
    format: OutputFormat,
    compact: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    ensure_dir(path)?;
    let settings = load_settings(path, config_path)?;
    let analyses = run_analysis(path, &settings)?;
    let report = match format {
        OutputFormat::Text => text::format_report(&analyses),
        OutputFormat::Json => json::format_report(&analyses, compact) + "\n",
    };
    print!("{report}");
    Ok(())
}

fn run_analysis(project_path: &Path, settings: &Settings) -> Result<Vec<TopologyAnalysis>> {
    let descriptors = discovery::locate_descriptors(project_path, &settings.config.discovery);
    debug!(count = descriptors.len(), "descriptors located");

    // Each descriptor is independent; collect keeps discovery order.
    descriptors
        .par_iter()
        .map(|rel| {
            analyze_file(project_path, rel, &settings.keywords)
                .with_context(|| format!("failed to analyze {rel}"))
        })
        .collect()
}

fn cmd_locate(path: &Path, config_path: Option<&Path>) -> Result<()> {
    ensure_dir(path)?;
    let settings = load_settings(path, config_path)?;
    for rel in discovery::locate_descriptors(path, &settings.config.discovery) {
        println!("{rel}");
    }
    Ok(())
}

fn cmd_count(
    path: &Path,
    source: Option<CountSource>,
    as_json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    ensure_dir(path)?;
    let settings = load_settings(path, config_path)?;
    let source = source.unwrap_or(settings.config.dataset.count_source);
    let count = dataset::snapshot_count(path, &settings.config, &settings.keywords, source)?;

    if as_json {
        let output = CountOutput {
            descriptor: count.descriptor.as_deref(),
            source: source.to_string(),
            microservices: count.microservices,
        };
        println!("{}", json::format_count(&output, false));
    } else {
        println!("{}", count.microservices);
    }
    Ok(())
}

fn cmd_row(
    path: &Path,
    repo: &str,
    commit: &str,
    values: &[String],
    header: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    ensure_dir(path)?;
    let settings = load_settings(path, config_path)?;
    let source = settings.config.dataset.count_source;

    let mut row = DatasetRow::new(repo, commit);
    for assignment in values {
        let (column, value) = assignment
            .split_once('=')
            .with_context(|| format!("expected COLUMN=VALUE, got '{assignment}'"))?;
        row.set(column.trim(), value)?;
    }
    let count = dataset::snapshot_count(path, &settings.config, &settings.keywords, source)?;
    row.set("MICROSERVICES", count.microservices.to_string())?;

    msminer_report::dataset::write_rows(std::io::stdout().lock(), &[row], header)
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(".msminer.toml");
    if target.exists() && !force {
        anyhow::bail!(".msminer.toml already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created .msminer.toml with default configuration.");
    Ok(())
}
