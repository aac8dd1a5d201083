//! Dataset tool
//!
//! Downloads the images collected by the service and arranges them into
//! `normal/`, `cancer/` and `uncertain/` folders for retraining.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use oralscan::config::Config;
use oralscan::logic::dataset::{self, BinStats, DEFAULT_THRESHOLD};
use oralscan::logic::storage::auth::SCOPE_DRIVE_READONLY;
use oralscan::logic::storage::DriveClient;

#[derive(Debug, Parser)]
#[command(name = "organize_dataset")]
#[command(about = "Download and organize collected training images", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every stored image, write manifest.json, drop corrupt files
    Download {
        /// Output directory
        #[arg(short, long, default_value = "downloaded_dataset")]
        output: PathBuf,

        /// Remote folder (defaults to DRIVE_FOLDER_NAME)
        #[arg(long)]
        folder: Option<String>,

        /// Organize into label folders once downloaded
        #[arg(long)]
        organize: bool,

        /// Percentage threshold for --organize
        #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = clap::value_parser!(i64).range(0..=100))]
        threshold: i64,
    },

    /// Move images into normal/, cancer/ and uncertain/ by filename percentage
    Organize {
        dir: PathBuf,

        /// Percentage threshold; +/-20 around it is uncertain
        #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = clap::value_parser!(i64).range(0..=100))]
        threshold: i64,
    },

    /// Recursively remove images that fail to decode
    Validate {
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oralscan=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Download { output, folder, organize, threshold } => {
            let config = Config::from_env();
            let folder = folder.unwrap_or_else(|| config.drive_folder_name.clone());

            let credentials = config.credentials().context("Drive credentials")?;
            let client = DriveClient::new(config.drive_config(), credentials, SCOPE_DRIVE_READONLY)?;

            let report = dataset::download_all(&client, &folder, &output).await?;

            println!("{}", "=".repeat(50));
            println!("Listed:     {}", report.listed);
            println!("Downloaded: {}", report.downloaded);
            println!("Failed:     {}", report.failed.len());
            println!("Valid:      {}", report.validation.valid);
            println!("Removed:    {}", report.validation.removed.len());
            println!("Location:   {}", output.display());
            println!("{}", "=".repeat(50));

            if organize && report.downloaded > 0 {
                let stats = dataset::organize_dir(&output, threshold)?;
                print_stats(&stats);
            }
        }

        Command::Organize { dir, threshold } => {
            let stats = dataset::organize_dir(&dir, threshold)
                .with_context(|| format!("organizing {}", dir.display()))?;
            print_stats(&stats);
        }

        Command::Validate { dir } => {
            let report = dataset::validate_dir(&dir)
                .with_context(|| format!("validating {}", dir.display()))?;
            println!("Valid images:   {}", report.valid);
            println!("Corrupt images: {}", report.removed.len());
            for path in &report.removed {
                println!("  Removed: {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_stats(stats: &BinStats) {
    println!("{}", "=".repeat(50));
    println!("Dataset Organization Complete");
    println!("{}", "=".repeat(50));
    println!("Normal images:    {}", stats.normal);
    println!("Cancer images:    {}", stats.cancer);
    println!("Uncertain images: {}", stats.uncertain);
    println!("Total:            {}", stats.total());
    println!("{}", "=".repeat(50));
}
