//! jira-export - export a Jira Cloud project to PDF
//!
//! Lists every issue of a project, renders each one to PDF, downloads its
//! attachments into a per-issue folder and zips the export folder.

mod api;
mod archive;
mod cli;
mod config;
mod error;
mod export;
mod logging;
mod render;

#[cfg(test)]
mod test_support;

use std::process;

use clap::Parser;
use tracing::error;

use api::JiraClient;
use cli::Cli;
use error::AppError;
use export::Exporter;
use render::PdfRenderer;

fn main() {
    // A missing .env file is fine; variables may come from the shell.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, !cli.no_log_file) {
        eprintln!("Warning: file logging unavailable ({}), logging to stderr only", e);
        if let Err(e) = logging::init(cli.verbose, false) {
            eprintln!("Warning: logging unavailable: {}", e);
        }
    }

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Export failed");
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            e.exit_code()
        }
    };

    process::exit(code);
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let job = cli.resolve_job()?;
    tracing::debug!(?job, "Resolved export job");

    let client = JiraClient::from_job(&job)?;
    let report = Exporter::new(client, PdfRenderer::new()).run(&job)?;

    println!("{}", report);
    if !report.is_complete() {
        tracing::warn!("Some issues or attachments were skipped, see the summary above");
    }
    Ok(())
}
