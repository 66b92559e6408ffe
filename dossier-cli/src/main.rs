//! dossier - Assemble per-client shipment dossiers from loose shipping PDFs.

mod cli;

use clap::Parser;
use std::process;

use crate::cli::Cli;
use dossier::RunSummary;
use dossier::error::DossierError;
use dossier::output::OutputFormatter;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    let json_output = cli.json_output;
    let output_folder = cli.output_folder.display().to_string();

    if let Err(err) = run(cli).await {
        if json_output {
            let summary = RunSummary::failure(err.to_string(), output_folder);
            println!("{}", summary.to_json_line());
        } else {
            eprintln!("Error: {err}");
        }
        process::exit(err.exit_code());
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), DossierError> {
    // Validate CLI arguments
    cli.validate()?;

    // Convert CLI to config
    let config = cli.to_config()?;

    // Create output formatter
    let formatter = OutputFormatter::from_config(&config);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", dossier::NAME, dossier::VERSION));
        if let Some(ref job_id) = config.job_id {
            formatter.detail("Job", job_id);
        }
        formatter.blank_line();
        formatter.info(&format!("Input folder:  {}", config.input_folder.display()));
        formatter.info(&format!("Output folder: {}", config.output_folder.display()));
        formatter.blank_line();
        formatter.info("Assembling dossiers...");
    }

    // Execute the run; fatal preconditions propagate to main
    let summary = dossier::run(&config).await?;

    if config.json_output {
        println!("{}", summary.to_json_line());
        return Ok(());
    }

    if formatter.should_print() {
        formatter.blank_line();
        if let Some(ref message) = summary.message {
            formatter.success(message);
        }

        formatter.detail(
            "Processed files",
            &summary.stats.processed_files.to_string(),
        );
        formatter.detail("Merged clients", &summary.stats.merged_clients.to_string());
        if let Some(ref optimization) = summary.stats.optimization {
            formatter.detail(
                "Files optimized",
                &optimization.files_optimized.to_string(),
            );
            formatter.detail(
                "Total savings",
                &format!("{:.2} MB", optimization.total_savings_mb),
            );
        }

        let flagged = summary
            .tax_alerts
            .iter()
            .filter(|group| !group.alerts.is_empty())
            .count();
        if flagged > 0 {
            formatter.blank_line();
            formatter.warning(&format!("{flagged} client(s) with tax-relevant keywords"));
        }

        if formatter.is_verbose() {
            formatter.blank_line();
            formatter.section("Reports");
            formatter.block(&summary.reports.compression);
            formatter.block(&summary.reports.tax_alerts);
        }
    }

    Ok(())
}
