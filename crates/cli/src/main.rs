// trf - shipped-volume calculation for warehouse exports

mod exit_codes;
mod run;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{volume_exit_code, EXIT_ERROR, EXIT_OUTPUT_WRITE, EXIT_SUCCESS, EXIT_USAGE};
use trf_volume::VolumeError;

#[derive(Parser)]
#[command(name = "trf")]
#[command(about = "Match warehouse product names against a catalog and total shipped volume")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Debug logging for trf crates (TRF_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute Volume / Total Volume for one or more warehouse files
    #[command(after_help = "\
Examples:
  trf run job.toml
  trf run job.toml outbound_march.xlsx outbound_april.csv
  trf run job.toml outbound.xlsx --output result.xlsx --workers 8
  trf run job.toml --catalog https://example.com/product_info.xlsx --json
  trf run job.toml --strict || echo 'some products are missing from the catalog'")]
    Run {
        /// Job file (.toml)
        job: PathBuf,

        /// Warehouse files; defaults to [warehouse] file in the job
        warehouses: Vec<PathBuf>,

        /// Catalog path or URL, overriding [catalog] source
        #[arg(long, value_name = "SRC")]
        catalog: Option<String>,

        /// Output file (single warehouse file only)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Worker threads, overriding [run] workers
        #[arg(long, short = 'w', env = "TRF_WORKERS")]
        workers: Option<usize>,

        /// Print a JSON summary to stdout
        #[arg(long)]
        json: bool,

        /// Exit with code 8 if any named row did not resolve
        #[arg(long)]
        strict: bool,
    },

    /// Check a job file, its catalog and its column positions without running
    #[command(after_help = "\
Examples:
  trf validate job.toml")]
    Validate {
        /// Job file (.toml)
        job: PathBuf,
    },

    /// Resolve product names against the job's catalog
    #[command(after_help = "\
Examples:
  trf lookup job.toml 'Widget A' 'widget a' 'Oak Desk'
  trf lookup job.toml 'Oak Desk' --json")]
    Lookup {
        /// Job file (.toml)
        job: PathBuf,

        /// Names to resolve
        #[arg(required = true)]
        names: Vec<String>,

        /// Print JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  trf-volume ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  trf-volume ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("TRF_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("trf=debug,trf_volume=debug,trf_io=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: trf <command> [options]");
            eprintln!("       trf --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            job,
            warehouses,
            catalog,
            output,
            workers,
            json,
            strict,
        }) => run::cmd_run(job, warehouses, catalog, output, workers, json, strict),
        Some(Commands::Validate { job }) => run::cmd_validate(job),
        Some(Commands::Lookup { job, names, json }) => run::cmd_lookup(job, names, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT_WRITE, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with its registered exit code.
    pub fn volume(err: VolumeError) -> Self {
        let code = volume_exit_code(&err);
        let hint = match &err {
            VolumeError::Schema { .. } => Some(
                "the catalog's first row must contain 'Product Name' and 'CBM' headers".to_string(),
            ),
            VolumeError::ConfigParse(_) => {
                Some("job files are TOML; unknown keys are rejected".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
