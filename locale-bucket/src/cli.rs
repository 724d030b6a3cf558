///
/// This module implements the CLI interface for locale-bucket: command parsing,
/// the interactive spreadsheet prompt and the wiring of real collaborators
/// (Cloud Storage session, DNS probe, HTTP notifier) into the core pipeline.
///
/// All publication logic (reading, building, versioning, publishing) lives in
/// `locale-bucket-core`; this module is glue and user-visible output.
use crate::credentials::load_credentials;
use crate::load_config::{load_config, CliConfig};
use crate::upload::GcsClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use locale_bucket_core::contract::Notifier;
use locale_bucket_core::network::DnsProbe;
use locale_bucket_core::notify::HttpNotifier;
use locale_bucket_core::sheet::open_sheet;
use locale_bucket_core::synchronise::{synchronise, SynchroniseConfig, SynchroniseReport};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// CLI for locale-bucket: publish translation spreadsheets as versioned JSON.
#[derive(Parser)]
#[clap(
    name = "locale-bucket",
    version,
    about = "Convert a translations spreadsheet into per-language JSON and publish it to a bucket"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the per-language files from a spreadsheet and publish them as the next version
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Spreadsheet to publish; prompted for on stdin when omitted
        #[clap(long)]
        file: Option<PathBuf>,
        /// Directory for the local JSON files (defaults to the current directory)
        #[clap(long)]
        work_dir: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish {
            config,
            file,
            work_dir,
        } => {
            let config = load_config(config)?;
            let file = match file {
                Some(file) => file,
                None => {
                    let stdin = std::io::stdin();
                    read_file_path(stdin.lock(), std::io::stdout())?
                }
            };
            let work_dir = match work_dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("Cannot determine working directory")?,
            };
            tracing::info!(command = "publish", file = ?file, "Starting publication");
            match publish(&config, &file, work_dir).await {
                Ok(report) => {
                    print_summary(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Publication failed");
                    Err(e)
                }
            }
        }
    }
}

/// Asks for the spreadsheet path and reads one line. Empty input aborts the run.
pub fn read_file_path<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<PathBuf> {
    write!(output, "Path to the translations spreadsheet: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let path = line.trim();
    if path.is_empty() {
        anyhow::bail!("No spreadsheet path given, nothing to publish");
    }
    Ok(PathBuf::from(path))
}

async fn publish(
    config: &CliConfig,
    file: &std::path::Path,
    work_dir: PathBuf,
) -> Result<SynchroniseReport> {
    let credentials = load_credentials(&config.storage.credentials)?;
    let sheet = open_sheet(file, &config.sheet.name)?;

    let http = reqwest::Client::new();
    let store = GcsClient::connect(http.clone(), &credentials, &config.storage.scope.bucket)
        .await
        .context("Failed to open Cloud Storage session")?;
    let probe = DnsProbe::new(config.reachability_host.clone());
    let notifier = config
        .notify
        .enabled
        .then(|| HttpNotifier::new(http.clone(), &config.notify));

    let sync_config = SynchroniseConfig {
        languages: config.languages.clone(),
        header_row: config.sheet.header_row,
        header_column: config.sheet.header_column,
        scope: config.storage.scope.clone(),
        work_dir,
    };

    let report = synchronise(
        &sync_config,
        &sheet,
        &store,
        &probe,
        notifier.as_ref().map(|n| n as &dyn Notifier),
    )
    .await?;
    Ok(report)
}

fn print_summary(report: &SynchroniseReport) {
    let publish = &report.publish;
    println!("Publication finished ({}).", publish.stage);
    println!(
        "  version: {} -> {}",
        publish.old_version, publish.new_version
    );
    println!(
        "  deleted: {} (failed: {})",
        publish.deleted.deleted.len(),
        publish.deleted.failed.len()
    );
    println!(
        "  uploaded: {} (skipped: {}, failed: {}, not public: {})",
        publish.uploads.uploaded.len(),
        publish.uploads.skipped.len(),
        publish.uploads.failed.len(),
        publish.uploads.not_public.len()
    );
    println!("  local files purged: {}", publish.purged.len());
    if let Some(notified) = report.notified {
        println!("  version notification: {}", if notified { "sent" } else { "failed" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_trimmed_path_from_input() {
        let mut prompt = Vec::new();
        let path = read_file_path(Cursor::new("  ./sheets/i18n.xlsx \n"), &mut prompt).unwrap();

        assert_eq!(path, PathBuf::from("./sheets/i18n.xlsx"));
        assert!(String::from_utf8(prompt).unwrap().contains("spreadsheet"));
    }

    #[test]
    fn empty_input_aborts() {
        let err = read_file_path(Cursor::new(""), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No spreadsheet path"));
    }
}
