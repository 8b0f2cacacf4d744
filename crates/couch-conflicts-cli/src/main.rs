mod commands;
mod credentials;
mod logging;
mod progress;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ScanArgs};
use couch_conflicts_core::design_doc::conflicts_design_document;
use couch_conflicts_core::gateway::obfuscate;
use couch_conflicts_core::{AppConfig, ConflictEngine, CouchGateway, RunOptions};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match couch_conflicts_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Scan(scan_args)) => run_scan(&config, &scan_args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        Some(Commands::PrintDesignDoc) => print_design_doc(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

fn run_scan(config: &AppConfig, args: &ScanArgs) -> Result<()> {
    let timestamp = commands::timestamp();
    let paths = args.output_paths(&timestamp);
    let config = AppConfig {
        threshold: args.threshold.unwrap_or(config.threshold),
        ..config.clone()
    };

    info!("Arguments:");
    info!("  Database Name: {}", args.database_name);
    info!("  Deletion Mode: {}", args.delete);
    info!("  Revision Threshold: {}", config.threshold);
    info!("  Results Directory: {}", paths.results_dir.display());
    info!("  Scan CSV File: {}", paths.scan_csv.display());
    info!("  Deletion CSV File: {}", paths.deletion_csv.display());
    info!("  Summary File: {}", paths.summary_file.display());

    let credentials = credentials::from_env()?;
    info!("Credentials:");
    info!("  Cloudant Account: {}", credentials.account);
    info!("  Cloudant API Key: {}", obfuscate(&credentials.api_key));
    info!("  Cloudant Password: {}", obfuscate(&credentials.password));

    if paths.results_dir.is_dir() {
        warn!(
            "Results directory already exists: {}. Existing files may be overwritten.",
            paths.results_dir.display()
        );
    }
    fs::create_dir_all(&paths.results_dir).with_context(|| {
        format!(
            "Failed to create results directory: {}",
            paths.results_dir.display()
        )
    })?;

    let account = credentials.account.clone();
    let mut gateway = CouchGateway::new(&config, credentials, &args.database_name)?;
    let engine = ConflictEngine::new(
        config,
        RunOptions {
            account,
            database: args.database_name.clone(),
            deletion_mode: args.delete,
            scan_csv: paths.scan_csv,
            deletion_csv: paths.deletion_csv,
            summary_file: paths.summary_file,
        },
    );
    let reporter = CliReporter::new();
    let outcome = engine.run(&mut gateway, &reporter)?;

    println!("{}", outcome.summary);

    if outcome.scan.total_conflicted_documents > 0 {
        info!(
            "{} conflicted documents, {} conflicted revisions",
            format!("{}", outcome.scan.total_conflicted_documents).red(),
            format!("{}", outcome.scan.total_conflicted_revisions).red(),
        );
    }
    if let Some(deletion) = &outcome.deletion {
        info!(
            "{} documents resolved, {} revisions deleted",
            format!("{}", deletion.total_resolved_documents).green(),
            format!("{}", deletion.total_deleted_revisions).green(),
        );
        if deletion.total_resolved_documents < deletion.total_conflicted_documents {
            warn!(
                "{}",
                "Some documents still have conflicts. Re-run to retry the remaining revisions."
                    .yellow()
            );
        }
    }
    if outcome.scan.total_omitted_documents > 0 {
        warn!(
            "{} documents exceeded the threshold and need manual resolution.",
            format!("{}", outcome.scan.total_omitted_documents).yellow()
        );
    }

    Ok(())
}

fn print_design_doc(config: &AppConfig) -> Result<()> {
    let document = conflicts_design_document(&config.design_document, &config.view_name);
    let rendered = serde_json::to_string_pretty(&document)?;
    println!("{}", rendered);
    Ok(())
}
