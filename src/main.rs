use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use covpage::chunk::CHUNK_SIZE;
use covpage::cli::{self, SortBy, SortColumn};
use covpage::context::WatermarkOverride;
use covpage::generate::ReportOptions;

/// covpage: self-contained single-file HTML coverage reports.
#[derive(Parser)]
#[command(name = "covpage", version, about)]
struct Cli {
    /// Log pipeline details (same as RUST_LOG=covpage=debug).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an HTML report from a coverage file.
    Generate {
        /// Path to the coverage file (LCOV or Istanbul JSON).
        file: PathBuf,

        /// Override format detection (lcov, istanbul).
        #[arg(long)]
        format: Option<String>,

        /// Directory the report is written to.
        #[arg(long, short, default_value = "coverage")]
        output_dir: PathBuf,

        /// File name of the report inside the output directory.
        #[arg(long, default_value = "index.html")]
        file_name: String,

        /// Leave files with nothing to cover out of the report.
        #[arg(long)]
        skip_empty: bool,

        /// Directory that relative source paths are resolved against.
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// Classification thresholds, e.g. `--watermarks lines=60,90`.
        /// May be repeated; unspecified metrics default to 50,80.
        #[arg(long, value_name = "KIND=LOW,HIGH")]
        watermarks: Vec<WatermarkOverride>,

        /// Maximum characters per embedded payload fragment (at least 3).
        #[arg(long, default_value_t = CHUNK_SIZE, value_parser = cli::parse_chunk_size)]
        chunk_size: usize,
    },

    /// Print the per-file table and totals stored in a report.
    Summary {
        /// Path to a generated report page.
        report: PathBuf,

        /// Column to sort by. Rows keep report order when omitted.
        #[arg(long, value_enum)]
        sort: Option<SortColumn>,

        /// Metric number to sort by when sorting on a metric column.
        #[arg(long, value_enum, default_value = "pct")]
        by: SortBy,

        /// Sort descending.
        #[arg(long)]
        desc: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("covpage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("covpage=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = match cli.command {
        Commands::Generate {
            file,
            format,
            output_dir,
            file_name,
            skip_empty,
            source_root,
            watermarks,
            chunk_size,
        } => {
            let options = ReportOptions {
                file: file_name,
                skip_empty,
                chunk_size,
                source_root,
            };
            cli::cmd_generate(&file, format.as_deref(), &output_dir, &watermarks, &options)?
        }
        Commands::Summary {
            report,
            sort,
            by,
            desc,
        } => cli::cmd_summary(&report, sort.map(|c| c.key(by)), desc)?,
    };

    print!("{output}");
    Ok(())
}
