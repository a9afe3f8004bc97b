//! leads - command line front end for the leads database.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use leadsdb::report::{write_ranking, write_stats};
use leadsdb::{
    compute_stats, rank_records, run_dedup, run_remove, DedupConfig, DedupMode, DedupOutcome,
    LeadStore, LeadsResult, OutputFormat, RecordId, RemovalOutcome,
};

#[derive(Parser)]
#[command(name = "leads")]
#[command(version)]
#[command(about = "Score, rank and deduplicate the local leads database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the leads JSON store
    #[arg(long, short, global = true, env = "LEADS_STORE", default_value = "leads.json")]
    store: PathBuf,

    /// JSON file overriding scoring weights and tie-break
    #[arg(long, short, global = true, env = "LEADS_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find records sharing a company name and remove all but the best one
    Dedup {
        /// Show what would be removed without asking or writing
        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'o', default_value = "text", value_enum)]
        format: Format,
    },

    /// List records by priority score
    Rank {
        /// Only show the first N records
        #[arg(long, short = 'n')]
        top: Option<usize>,

        #[arg(long, short = 'o', default_value = "text", value_enum)]
        format: Format,
    },

    /// Show counts per tier, signal and source, and duplicate totals
    Stats {
        #[arg(long, short = 'o', default_value = "text", value_enum)]
        format: Format,
    },

    /// Delete records by id, after showing them and asking for confirmation
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Show what would be removed without asking or writing
        #[arg(long)]
        dry_run: bool,

        #[arg(long, short = 'o', default_value = "text", value_enum)]
        format: Format,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> LeadsResult<DedupConfig> {
    match path {
        Some(p) => DedupConfig::from_file(p),
        None => Ok(DedupConfig::default()),
    }
}

fn mode(dry_run: bool) -> DedupMode {
    if dry_run {
        DedupMode::DryRun
    } else {
        DedupMode::Interactive
    }
}

fn run(cli: Cli) -> LeadsResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Dedup { dry_run, format } => {
            let stdin = io::stdin();
            let outcome = run_dedup(
                &cli.store,
                &config,
                mode(dry_run),
                format.into(),
                &mut stdin.lock(),
                &mut out,
            )?;
            if let (DedupOutcome::Previewed { pending }, Format::Text) = (outcome, format) {
                writeln!(out, "Dry run: {pending} record(s) would be removed.")?;
            }
        }
        Commands::Rank { top, format } => {
            let store = LeadStore::load(&cli.store)?;
            let ranked = rank_records(store.records(), &config.weights, top);
            write_ranking(&mut out, &ranked, format.into())?;
        }
        Commands::Stats { format } => {
            let store = LeadStore::load(&cli.store)?;
            write_stats(&mut out, &compute_stats(&store), format.into())?;
        }
        Commands::Remove {
            ids,
            dry_run,
            format,
        } => {
            let ids = ids
                .into_iter()
                .map(|id| RecordId::parse(id))
                .collect::<Result<Vec<_>, _>>()?;
            let stdin = io::stdin();
            let outcome = run_remove(
                &cli.store,
                &ids,
                &config,
                mode(dry_run),
                format.into(),
                &mut stdin.lock(),
                &mut out,
            )?;
            if let (RemovalOutcome::Previewed { pending }, Format::Text) = (outcome, format) {
                writeln!(out, "Dry run: {pending} record(s) would be removed.")?;
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
