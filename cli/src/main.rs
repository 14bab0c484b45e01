//! labelcheck CLI - verify alcohol-beverage label images against
//! application data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use labelcheck::{
    pair_batch, ApplicationData, BatchOptions, ExpectedFields, FieldStatus, LabelVerifier,
    OverallStatus, VerificationResult, VisionConfig, VisionExtractor,
};

#[derive(Parser)]
#[command(name = "labelcheck")]
#[command(version)]
#[command(about = "Verify alcohol-beverage label images against application data", long_about = None)]
struct Cli {
    /// API key for the vision extraction provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Vision model identifier
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// Print raw JSON instead of the verdict table
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a single label image
    Verify {
        /// Label image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Application data JSON file
        #[arg(value_name = "APPLICATION")]
        application: PathBuf,
    },

    /// Verify a directory of label images against a directory of
    /// application JSON files (paired by sorted file name)
    Batch {
        /// Directory of label images
        #[arg(value_name = "IMAGES_DIR")]
        images: PathBuf,

        /// Directory of application JSON files
        #[arg(value_name = "APPLICATIONS_DIR")]
        applications: PathBuf,

        /// Maximum concurrent verifications per wave
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,

        /// Attempts allowed per item before it is marked as an error
        #[arg(long, default_value_t = 12)]
        max_retries: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> labelcheck::Result<()> {
    let config = VisionConfig::new(cli.api_key.clone())
        .with_model(cli.model.clone())
        .with_base_url(cli.base_url.clone())
        .with_timeout(Duration::from_secs(60));
    let extractor = VisionExtractor::new(config)?;

    match cli.command {
        Commands::Verify {
            ref image,
            ref application,
        } => {
            let verifier = LabelVerifier::new(Arc::new(extractor));
            let image_bytes = fs::read(image)?;
            let expected = load_application(application)?;

            let spinner = spinner("Verifying label...");
            let result = verifier.verify(&image_bytes, &expected).await?;
            spinner.finish_and_clear();

            print_results(&[result], cli.json);
        }
        Commands::Batch {
            ref images,
            ref applications,
            concurrency,
            max_retries,
        } => {
            let verifier = LabelVerifier::new(Arc::new(extractor)).with_batch_options(
                BatchOptions::new()
                    .with_concurrency(concurrency)
                    .with_max_retries(max_retries),
            );

            let image_paths = sorted_files(images)?;
            let application_paths = sorted_files(applications)?;

            let mut image_bytes = Vec::with_capacity(image_paths.len());
            for path in &image_paths {
                image_bytes.push(fs::read(path)?);
            }
            let mut expected = Vec::with_capacity(application_paths.len());
            for path in &application_paths {
                expected.push(load_application(path)?);
            }

            // Cardinality is validated before any extraction work begins.
            let items = pair_batch(image_bytes, expected)?;
            log::info!("Processing batch of {} labels", items.len());

            let spinner = spinner(&format!("Verifying {} labels...", items.len()));
            let results = verifier.verify_batch(&items).await;
            spinner.finish_and_clear();

            print_results(&results, cli.json);
        }
    }

    Ok(())
}

/// Read an application JSON file and pre-combine amount+unit pairs.
fn load_application(path: &Path) -> labelcheck::Result<ExpectedFields> {
    let content = fs::read_to_string(path)?;
    let application: ApplicationData = serde_json::from_str(&content).map_err(|e| {
        labelcheck::Error::Validation(format!("{}: invalid application JSON: {e}", path.display()))
    })?;
    Ok(application.into_expected())
}

/// Regular files in a directory, sorted by file name.
fn sorted_files(dir: &Path) -> labelcheck::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(labelcheck::Error::Validation(format!(
            "no files found in {}",
            dir.display()
        )));
    }
    Ok(paths)
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn print_results(results: &[VerificationResult], json: bool) {
    if json {
        match serde_json::to_string_pretty(results) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("{} failed to serialize results: {err}", "error:".red()),
        }
        return;
    }

    for (index, result) in results.iter().enumerate() {
        if results.len() > 1 {
            println!("{}", format!("--- Label {} ---", index + 1).bold());
        }
        println!(
            "{} {}",
            overall_badge(result.overall_status),
            result.summary
        );
        for field in &result.fields {
            let line = format!(
                "  {:<12} {:<20} extracted: {:<28} expected: {}",
                status_badge(field.status),
                field.field,
                quoted(&field.extracted),
                quoted(&field.expected),
            );
            println!("{line}");
            if let Some(note) = &field.note {
                println!("               {}", note.dimmed());
            }
        }
        println!();
    }
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

fn overall_badge(status: OverallStatus) -> String {
    match status {
        OverallStatus::Approved => "APPROVED".green().bold().to_string(),
        OverallStatus::Review => "REVIEW".yellow().bold().to_string(),
        OverallStatus::Rejected => "REJECTED".red().bold().to_string(),
        OverallStatus::Error => "ERROR".red().bold().to_string(),
    }
}

fn status_badge(status: FieldStatus) -> String {
    match status {
        FieldStatus::Pass => "pass".green().to_string(),
        FieldStatus::Warning => "warning".yellow().to_string(),
        FieldStatus::Fail => "fail".red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_application_combines_pairs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "brand_name": "Old Crow",
                "class_type": "Straight Rye Whisky",
                "alcohol_content_amount": "45",
                "alcohol_content_format": "%",
                "net_contents_amount": "750",
                "net_contents_unit": "mL"
            }}"#
        )
        .unwrap();

        let expected = load_application(file.path()).unwrap();
        assert_eq!(expected.brand_name, "Old Crow");
        assert_eq!(expected.alcohol_content, "45 %");
        assert_eq!(expected.net_contents, "750 mL");
    }

    #[test]
    fn test_load_application_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_application(file.path()).unwrap_err();
        assert!(matches!(err, labelcheck::Error::Validation(_)));
    }

    #[test]
    fn test_sorted_files_orders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "c.json"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let paths = sorted_files(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_sorted_files_empty_dir_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sorted_files(dir.path()).unwrap_err();
        assert!(matches!(err, labelcheck::Error::Validation(_)));
    }
}
