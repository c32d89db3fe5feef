//! Command implementations for the statcan CLI
//!
//! Sets up logging, resolves configuration (environment first, then flags)
//! and runs the search or download command, printing the result.

use crate::cli::args::{Args, Commands, DownloadArgs, GlobalArgs, OutputFormat, SearchArgs};
use crate::client::StatCan;
use crate::config::StatCanConfig;
use crate::error::StatCanError;
use crate::frame::{DataframeHandle, to_dataframe};
use crate::metadata::MetadataDatabase;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Main command runner
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args.global);
    debug!("Command line arguments: {:?}", args);

    let config = StatCanConfig::from_env().context("Failed to load configuration")?;

    match &args.command {
        Commands::Search(search) => run_search(&args.global, search, config),
        Commands::Download(download) => run_download(&args.global, download, config),
    }
}

/// One-line report of a failed command, led by the error kind when known
pub fn error_report(error: &anyhow::Error) -> String {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StatCanError>())
    {
        Some(cause) => format!("Error [{}]: {:#}", cause.kind(), error),
        None => format!("Error: {:#}", error),
    }
}

fn run_search(global: &GlobalArgs, args: &SearchArgs, mut config: StatCanConfig) -> Result<()> {
    if let Some(url) = &args.catalog_url {
        config = config.with_catalog_url(url.clone());
    }
    config.validate()?;

    let mut database = MetadataDatabase::from_config(&config)?;
    let spinner = create_spinner(global, "Loading catalog...")?;
    let loaded = database.load();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    loaded.with_context(|| format!("Failed to load catalog from {}", config.catalog_url))?;
    info!("Catalog loaded with {} entries", database.len());

    let keywords: Vec<&str> = args.keywords.iter().map(String::as_str).collect();
    let results = database.search(&keywords, args.language)?;

    let heading = if keywords.is_empty() {
        format!("{} catalog entries", results.height())
    } else {
        format!(
            "{} catalog entries matching '{}'",
            results.height(),
            keywords.join(" ")
        )
    };
    let frame = to_dataframe(&results, global.backend())?;
    print_frame(global, &heading, &frame)
}

fn run_download(global: &GlobalArgs, args: &DownloadArgs, mut config: StatCanConfig) -> Result<()> {
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.clone());
    }
    let client = StatCan::new(&config)?;

    let spinner = create_spinner(global, &format!("Downloading table {}...", args.table_number))?;
    let downloaded = client.download(&args.table_number, args.language, args.save_dir.as_deref());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let download = downloaded
        .with_context(|| format!("Failed to download table {}", args.table_number))?;

    let heading = match &download.title {
        Some(title) => format!("{} ({})", title, download.table_number),
        None => format!("Table {}", download.table_number),
    };
    let frame = download.to_dataframe(global.backend())?;
    print_frame(global, &heading, &frame)?;

    if let Some(path) = &download.saved_to {
        if global.output_format == OutputFormat::Human {
            println!("{} {}", "Saved to".bright_green().bold(), path.display());
        }
    }
    Ok(())
}

fn print_frame(global: &GlobalArgs, heading: &str, frame: &DataframeHandle) -> Result<()> {
    let shown = frame.head(global.return_rows);
    match global.output_format {
        OutputFormat::Human => {
            println!("{}", heading.bright_cyan().bold());
            println!(
                "{}",
                format!(
                    "showing {} of {} rows ({} backend)",
                    shown.height(),
                    frame.height(),
                    frame.backend()
                )
                .bright_black()
            );
            println!("{}", shown);
        }
        OutputFormat::Json => {
            let value = shown.to_json()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&value).context("Failed to serialize results")?
            );
        }
    }
    Ok(())
}

/// Spinner for network waits, `None` in quiet mode
fn create_spinner(global: &GlobalArgs, message: &str) -> Result<Option<ProgressBar>> {
    if !global.show_progress() {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

/// Set up structured logging based on CLI arguments
///
/// Logs go to stderr so JSON results on stdout stay parseable.
fn setup_logging(global: &GlobalArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = global.get_log_level();

    // RUST_LOG takes precedence over -v and -q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("statcan={}", log_level)));

    // Quiet mode only reports errors, so drop the timer
    let compact = global.quiet.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
    });
    let timed = (!global.quiet).then(|| {
        fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stderr)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(timed)
        .try_init();
    if installed.is_err() {
        debug!("Logging was already initialized");
        return;
    }

    debug!("Logging initialized at level: {}", log_level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_report_names_kind() {
        let error = anyhow::Error::new(StatCanError::DatasetNotFound {
            table_number: "99-99-9999-99".to_string(),
            url: "https://tables.example.test/99999999-eng.zip".to_string(),
        })
        .context("Failed to download table 99-99-9999-99");

        let report = error_report(&error);
        assert!(report.starts_with("Error [DatasetNotFound]: "), "{}", report);
        assert!(report.contains("Failed to download table 99-99-9999-99"));
        assert!(report.contains("Dataset not found: 99-99-9999-99"));
    }

    #[test]
    fn test_error_report_without_kind() {
        let report = error_report(&anyhow!("terminal closed"));
        assert_eq!(report, "Error: terminal closed");
    }
}
