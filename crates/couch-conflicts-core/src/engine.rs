use std::path::PathBuf;

use chrono::Local;
use tracing::{error, info};

use crate::audit::{summarize, write_summary, Overview};
use crate::config::AppConfig;
use crate::error::Error;
use crate::gateway::{self, Gateway};
use crate::model::{DeletionReport, ScanReport};
use crate::progress::ProgressReporter;
use crate::remediation::DeletionTask;
use crate::scanner::ScanTask;
use crate::task::Task;
use crate::timer::Stopwatch;

/// What to run against which database, and where the audit files go.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub account: String,
    pub database: String,
    pub deletion_mode: bool,
    pub scan_csv: PathBuf,
    pub deletion_csv: PathBuf,
    pub summary_file: PathBuf,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub scan: ScanReport,
    pub deletion: Option<DeletionReport>,
    pub summary: String,
}

pub struct ConflictEngine {
    config: AppConfig,
    options: RunOptions,
}

impl ConflictEngine {
    pub fn new(config: AppConfig, options: RunOptions) -> Self {
        Self { config, options }
    }

    /// Run the full pipeline inside one database session:
    /// 1. Check that the conflicts view exists and read the document count
    /// 2. Scan the view, writing the scan CSV
    /// 3. In deletion mode, delete the buffered losing revisions
    /// 4. Render the summary and write it next to the CSV files
    ///
    /// The session is closed on every path out of steps 1-3.
    pub fn run<G: Gateway + ?Sized>(
        &self,
        gateway: &mut G,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunOutcome, Error> {
        let stopwatch = Stopwatch::start();
        info!(
            "Processing database: {} (deletion mode: {}, threshold: {}).",
            self.options.database, self.options.deletion_mode, self.config.threshold
        );

        let (document_count, scan, deletion) = gateway::with_session(gateway, |gw| {
            gw.verify_conflicts_view()?;
            let document_count = gw.document_count()?;

            let mut scan = ScanTask::new(
                gw,
                &self.config,
                self.options.deletion_mode,
                &self.options.scan_csv,
            )
            .with_reporter(reporter)
            .run()?;

            let deletion = if self.options.deletion_mode {
                let records = std::mem::take(&mut scan.buffer);
                let report = DeletionTask::new(gw, records, &self.options.deletion_csv)
                    .with_reporter(reporter)
                    .run()?;
                Some(report)
            } else {
                info!("Deletion mode disabled. Skipping deletion phase.");
                None
            };

            Ok((document_count, scan, deletion))
        })?;

        let overview = Overview {
            account: self.options.account.clone(),
            database: self.options.database.clone(),
            document_count,
            deletion_mode: self.options.deletion_mode,
            threshold: self.config.threshold,
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            elapsed: stopwatch.elapsed(),
        };
        let summary = summarize(&overview, &scan, deletion.as_ref());

        if let Err(err) = write_summary(&self.options.summary_file, &summary) {
            error!(
                "Failed to create text file: {}. {}",
                self.options.summary_file.display(),
                err
            );
        }

        Ok(RunOutcome {
            scan,
            deletion,
            summary,
        })
    }
}
