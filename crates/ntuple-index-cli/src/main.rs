mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, IndexArgs, ReportArgs, UserDirsArgs};
use dotenv::dotenv;
use ntuple_index_core::report::{collect_references, AuditReport};
use ntuple_index_core::sizes::{list_dir_sizes, natural_size};
use ntuple_index_core::{AppConfig, GitProvenance, IndexEngine, IndexResult};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match ntuple_index_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    lower_priority(config.niceness);

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Index(index_args)) => run_index(&config, index_args),
        Some(Commands::UserDirs(user_args)) => run_user_dirs(&config, user_args),
        Some(Commands::Sizes { input }) => run_sizes(&input),
        Some(Commands::Report(report_args)) => run_report(report_args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            Cli::command().print_long_help()?;
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }

    Ok(())
}

#[cfg(unix)]
fn lower_priority(niceness: i32) {
    if niceness == 0 {
        return;
    }
    // SAFETY: nice(2) only changes the scheduling priority of this process.
    let result = unsafe { libc::nice(niceness) };
    info!("Process niceness now {}", result);
}

#[cfg(not(unix))]
fn lower_priority(_niceness: i32) {}

/// Appending to a file that does not exist yet is the same as starting fresh.
fn effective_append(output: &str, append: bool) -> bool {
    if append && !Path::new(output).is_file() {
        warn!("Output {} does not exist, setting --append false", output);
        return false;
    }
    append
}

fn engine_for(config: &AppConfig, output: Option<String>) -> IndexEngine {
    let engine = IndexEngine::new(config.clone());
    match output {
        Some(path) => engine.with_db_path(&path),
        None => engine,
    }
}

fn log_result(result: &IndexResult) {
    info!(
        "{}: {} descriptors in {}, {} ntuple dirs in {}",
        result.git_src.cyan(),
        format!("{}", result.descriptor_rows).green(),
        format!("{:.2}s", result.descriptor_duration.as_secs_f64()).green(),
        format!("{}", result.ntuple_dir_rows).green(),
        format!("{:.2}s", result.ntuple_dir_duration.as_secs_f64()).green(),
    );
}

fn run_index(config: &AppConfig, args: IndexArgs) -> anyhow::Result<()> {
    let engine = engine_for(config, args.output);
    let append = effective_append(engine.db_path(), args.append);
    let reporter = CliReporter::new();

    if args.legacy {
        let results = engine.index_legacy(append, &reporter)?;
        for (_, result) in &results {
            log_result(result);
        }
        info!("Indexed {} legacy branches into {}", results.len(), engine.db_path());
        return Ok(());
    }

    let Some(root) = args.datasets_dir else {
        anyhow::bail!("either --datasets-dir or --legacy is required");
    };
    if !root.is_dir() {
        anyhow::bail!("{} does not exist", root.display());
    }
    let provenance = GitProvenance::discover(&root)
        .with_context(|| format!("reading git provenance of {}", root.display()))?;
    let result = engine.index_root(&root, append, &provenance, &reporter)?;
    log_result(&result);
    Ok(())
}

fn run_user_dirs(config: &AppConfig, args: UserDirsArgs) -> anyhow::Result<()> {
    let engine = engine_for(config, args.output);
    let append = effective_append(engine.db_path(), args.append);
    let reporter = CliReporter::new();
    let count = engine.index_user_dirs(&args.user, append, &reporter)?;
    info!(
        "{} task directories for {} written to {}",
        format!("{}", count).green(),
        args.user,
        engine.db_path()
    );
    Ok(())
}

fn run_sizes(input: &Path) -> anyhow::Result<()> {
    let listing = list_dir_sizes(input)?;
    let (total, unit) = natural_size(listing.total_kb);
    info!(
        "{} directories written to {}",
        listing.entries,
        listing.output.display()
    );
    println!("Total: {} {}", format!("{:.2}", total).green(), unit);
    Ok(())
}

fn run_report(args: ReportArgs) -> anyhow::Result<()> {
    let label = match args.label {
        Some(label) => label,
        None => args
            .root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "datasets".to_string()),
    };
    let references = collect_references(&args.root)?;
    let report = AuditReport::build(&references, args.check_missing);
    let written = report.write(&args.out_dir, &label)?;
    for path in written {
        info!("Wrote {}", path.display());
    }
    if args.check_missing {
        println!(
            "{} referenced ntuples missing",
            format!("{}", report.missing_count()).red()
        );
    }
    Ok(())
}
