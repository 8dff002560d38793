use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pagemark_core::{load_json, RunConfig, TabularDocument};

mod pipeline;

/// Pagemark - export PDF annotations, text and bookmarks as JSON and a
/// styled spreadsheet report
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline: extract, normalize, report
    Run {
        /// Path to the source PDF
        source: PathBuf,

        /// Directory for output files (defaults to the source directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<usize>,

        /// Name for the raw JSON file
        #[arg(long)]
        raw_name: Option<String>,

        /// Name for the spreadsheet-ready JSON file
        #[arg(long)]
        tabular_name: Option<String>,

        /// Name for the spreadsheet report
        #[arg(long)]
        report_name: Option<String>,
    },

    /// Extract the raw record set and stop
    Extract {
        /// Path to the source PDF
        source: PathBuf,

        /// Directory for output files (defaults to the source directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<usize>,

        /// Name for the raw JSON file
        #[arg(long)]
        raw_name: Option<String>,
    },

    /// Normalize a previously extracted raw JSON file
    Normalize {
        /// Path to the raw JSON file
        raw_json: PathBuf,

        /// Path for the normalized JSON output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the spreadsheet report from a normalized JSON file
    Report {
        /// Path to the normalized JSON file
        tabular_json: PathBuf,

        /// Path for the spreadsheet report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            source,
            output_dir,
            max_pages,
            raw_name,
            tabular_name,
            report_name,
        } => {
            let config = build_config(
                source,
                output_dir,
                max_pages,
                raw_name,
                tabular_name,
                report_name,
            );
            let _guard = init_tracing(&config.output_dir());

            // The default entry point reports failure through the log
            // stream only.
            match pipeline::run(&config) {
                Ok(Some(outcome)) => {
                    println!(
                        "{} {}",
                        "raw json:".green(),
                        outcome.raw_json.display()
                    );
                    println!(
                        "{} {}",
                        "tabular json:".green(),
                        outcome.tabular_json.display()
                    );
                    println!("{} {}", "report:".green(), outcome.report.display());
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(error = %err, "pipeline failed");
                }
            }
            tracing::info!("run finished");
            Ok(())
        }

        Command::Extract {
            source,
            output_dir,
            max_pages,
            raw_name,
        } => {
            let config = build_config(source, output_dir, max_pages, raw_name, None, None);
            let _guard = init_tracing(&config.output_dir());
            if let Some(path) = pipeline::extract_stage(&config)? {
                println!("{} {}", "raw json:".green(), path.display());
            }
            Ok(())
        }

        Command::Normalize { raw_json, output } => {
            let output = output.unwrap_or_else(|| sibling_path(&raw_json, "_tabular.json"));
            let _guard = init_tracing(&log_dir_for(&output));
            pipeline::normalize_stage(&raw_json, &output)?;
            println!("{} {}", "tabular json:".green(), output.display());
            Ok(())
        }

        Command::Report { tabular_json, output } => {
            let output = output.unwrap_or_else(|| sibling_path(&tabular_json, "_report.xlsx"));
            let _guard = init_tracing(&log_dir_for(&output));
            let tabular: TabularDocument = load_json(&tabular_json)?;
            pipeline::report_stage(&tabular, &output)?;
            println!("{} {}", "report:".green(), output.display());
            Ok(())
        }
    }
}

/// Resolve configuration: CLI flags > environment variables > derived
/// defaults.
fn build_config(
    source: PathBuf,
    output_dir: Option<PathBuf>,
    max_pages: Option<usize>,
    raw_name: Option<String>,
    tabular_name: Option<String>,
    report_name: Option<String>,
) -> RunConfig {
    let mut config = RunConfig::new(source);
    config.output_dir =
        output_dir.or_else(|| std::env::var("PAGEMARK_OUTPUT_DIR").ok().map(PathBuf::from));
    config.max_pages = max_pages.or_else(|| {
        std::env::var("PAGEMARK_MAX_PAGES")
            .ok()
            .and_then(|value| value.parse().ok())
    });
    config.raw_json_name = raw_name;
    config.tabular_json_name = tabular_name;
    config.report_name = report_name;
    config
}

/// Console plus `pagemark.log` in the output directory. The level is a
/// static configuration choice: `RUST_LOG` if set, `info` otherwise.
fn init_tracing(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let _ = fs::create_dir_all(log_dir);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(log_dir, "pagemark.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

/// Derive a sibling output path: `<dir>/<stem-without-suffix><suffix>`.
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let base = stem.strip_suffix("_raw").unwrap_or(&stem);
    let base = base.strip_suffix("_tabular").unwrap_or(base);
    let name = format!("{base}{suffix}");
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

fn log_dir_for(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
