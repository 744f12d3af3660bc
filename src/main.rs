mod cli;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{CommandFactory, Parser};
use cli::progress::CliReporter;
use cli::prompt::prompt_confirm;
use cli::{
    CheckArgs, Cli, Commands, ConvertArgs, DeleteArgs, MailPlanArgs, MoveArgs, SelectionArgs,
};
use colored::*;
use dotenv::dotenv;
use fileflow::engine::SofficeLauncher;
use fileflow::filter::{cutoff_days_before, ExtensionSet};
use fileflow::{batch, recipients, tidy, AppConfig, BatchCoordinator, BatchOptions};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let mut args = Cli::parse();
    let Some(command) = args.command.take() else {
        let _ = Cli::command().print_long_help();
        return;
    };

    let loaded = match &args.config {
        Some(path) => fileflow::config::load_from(path),
        None => fileflow::config::load_configuration(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let log_path = cli::logging::run_log_path(
        Path::new(&config.log_dir),
        command.target_dir().map(PathBuf::as_path),
        command.operation(),
        Local::now(),
    );
    let guard = cli::logging::init_logger(&log_path);

    let result = match command {
        Commands::Check(args) => run_check(&config, args),
        Commands::Convert(args) => run_convert(&config, args),
        Commands::MailPlan(args) => run_mail_plan(args),
        Commands::MoveConverted(args) => run_move(args),
        Commands::DeleteConverted(args) => run_delete(args),
        Commands::PrintConfig => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

/// Command-line values win over the configuration file.
fn batch_options(config: &AppConfig, selection: &SelectionArgs) -> anyhow::Result<BatchOptions> {
    let days = selection.days.unwrap_or(config.days);
    let cutoff = cutoff_days_before(Utc::now(), days)?;
    let types = if selection.types.is_empty() {
        &config.file_types
    } else {
        &selection.types
    };
    let extensions = ExtensionSet::parse(types)
        .context("choose file types with --types doc,xls or `file_types` in FileFlow.toml")?;

    Ok(BatchOptions::new(cutoff, extensions)
        .skip_converted(config.skip_converted)
        .delete_originals(config.delete_originals)
        .with_ignore_patterns(config.ignore_patterns.clone()))
}

fn run_check(config: &AppConfig, args: CheckArgs) -> anyhow::Result<()> {
    let options = batch_options(config, &args.selection)?;
    let reporter = CliReporter::new();
    // Detection never starts an engine.
    let mut launcher = SofficeLauncher::new(&config.soffice_path);
    let coordinator = BatchCoordinator::new(&mut launcher, &reporter);
    let report = coordinator.detect(&args.selection.dir, &options)?;

    info!(
        "{} files checked, {} legacy files detected",
        format!("{}", report.checked).green(),
        format!("{}", report.detected.len()).yellow(),
    );
    Ok(())
}

fn run_convert(config: &AppConfig, args: ConvertArgs) -> anyhow::Result<()> {
    let delay = batch::delay_from_secs(args.delay.unwrap_or(config.delay_secs))?;
    let mut options = batch_options(config, &args.selection)?.with_delay(delay);
    if args.delete_originals {
        options = options.delete_originals(true);
    }
    if args.overwrite {
        options = options.skip_converted(false);
    }

    let program = args
        .soffice
        .unwrap_or_else(|| PathBuf::from(&config.soffice_path));
    let mut launcher = SofficeLauncher::new(program);
    let reporter = CliReporter::new();
    let mut coordinator = BatchCoordinator::new(&mut launcher, &reporter);
    let result = coordinator.run(&args.selection.dir, &options)?;

    for outcome in &result.outcomes {
        if let Some(reason) = outcome.failure_reason() {
            warn!("Failed: {} ({})", outcome.job.source_path.display(), reason);
        }
    }

    println!();
    info!(
        "Scan: {}, Convert: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.convert_duration.as_secs_f64()).green(),
    );
    info!(
        "{} checked, {} converted, {} failed, {} skipped",
        format!("{}", result.summary.checked).cyan(),
        format!("{}", result.summary.converted).green(),
        format!("{}", result.summary.failed).red(),
        format!("{}", result.summary.skipped).yellow(),
    );
    Ok(())
}

fn run_mail_plan(args: MailPlanArgs) -> anyhow::Result<()> {
    let rows = recipients::read_rows_from_path(&args.csv)
        .with_context(|| format!("reading {}", args.csv.display()))?;
    let available = recipients::list_attachments(&args.folder, &args.extension)?;
    let matches = recipients::resolve(&rows, &available);

    let mut found = 0;
    let mut missing = 0;
    for attachment in &matches {
        for delivery in attachment.deliveries() {
            match delivery.file_path {
                Some(path) if delivery.found => {
                    found += 1;
                    println!("{}\t{}\t{}", delivery.identifier, delivery.recipient, path.display());
                }
                _ => {
                    missing += 1;
                    warn!(
                        "File not found for identifier {}; {} would get no attachment",
                        delivery.identifier, delivery.recipient
                    );
                }
            }
        }
    }

    info!(
        "{} rows, {} deliveries with attachment, {} without",
        rows.len(),
        format!("{}", found).green(),
        format!("{}", missing).red(),
    );
    Ok(())
}

fn run_move(args: MoveArgs) -> anyhow::Result<()> {
    let report = tidy::move_with_extension(&args.from, &args.to, &args.extension)?;
    info!(
        "{} matched, {} moved, {} failed",
        report.matched,
        format!("{}", report.succeeded).green(),
        format!("{}", report.failed).red(),
    );
    Ok(())
}

fn run_delete(args: DeleteArgs) -> anyhow::Result<()> {
    if !args.yes {
        let question = format!(
            "Delete every .{} file under {}?",
            args.extension,
            args.dir.display()
        );
        if !prompt_confirm(&question, Some(false))? {
            info!("Nothing deleted");
            return Ok(());
        }
    }
    let report = tidy::delete_with_extension(&args.dir, &args.extension)?;
    info!(
        "{} matched, {} deleted, {} failed",
        report.matched,
        format!("{}", report.succeeded).green(),
        format!("{}", report.failed).red(),
    );
    Ok(())
}
