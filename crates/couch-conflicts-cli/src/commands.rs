use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Parser, Subcommand};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Parser)]
#[command(name = "couch-conflicts")]
#[command(about = "Find and resolve document conflicts in a Cloudant database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a database for conflicted documents, optionally deleting losing revisions
    Scan(ScanArgs),
    /// Print configuration values
    PrintConfig,
    /// Print the design document that defines the conflicts view
    PrintDesignDoc,
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Cloudant database name
    #[arg(short = 'n', long)]
    pub database_name: String,

    /// Delete the losing revisions of documents at or under the threshold
    #[arg(short, long)]
    pub delete: bool,

    /// Maximum number of conflicting revisions a document may have to be resolved
    #[arg(short, long)]
    pub threshold: Option<usize>,

    /// Directory for the CSV and summary files
    #[arg(short, long)]
    pub results_dir: Option<PathBuf>,

    /// Scan results CSV file name
    #[arg(short, long)]
    pub csv_file: Option<String>,

    /// Deletion results CSV file name
    #[arg(short = 'x', long)]
    pub deletion_csv_file: Option<String>,

    /// Summary text file name
    #[arg(short, long)]
    pub summary_file: Option<String>,
}

/// Output locations for one run, with timestamped defaults filled in.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub results_dir: PathBuf,
    pub scan_csv: PathBuf,
    pub deletion_csv: PathBuf,
    pub summary_file: PathBuf,
}

impl ScanArgs {
    pub fn output_paths(&self, timestamp: &str) -> OutputPaths {
        let results_dir = self
            .results_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("results").join(format!("conflicts_results_{}", timestamp)));
        let name_or = |name: &Option<String>, prefix: &str, extension: &str| {
            name.clone()
                .unwrap_or_else(|| format!("{}_{}.{}", prefix, timestamp, extension))
        };

        OutputPaths {
            scan_csv: results_dir.join(name_or(&self.csv_file, "conflicts_details", "csv")),
            deletion_csv: results_dir.join(name_or(&self.deletion_csv_file, "conflicts_deletions", "csv")),
            summary_file: results_dir.join(name_or(&self.summary_file, "conflicts_summary", "txt")),
            results_dir,
        }
    }
}

pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
