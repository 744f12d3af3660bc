use crate::engine::EngineLauncher;
use crate::error::Error;
use crate::filter::{AgeFilter, ExtensionSet};
use crate::job::{BatchSummary, ConversionJob, ConversionOutcome, DocumentKind};
use crate::progress::{BatchEvent, ProgressReporter};
use crate::scanner::PathScanner;
use crate::session::ConversionSession;
use crate::worker::ConversionWorker;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything one run needs besides the root directory. The extension allow-list is
/// always explicit.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub cutoff: DateTime<Utc>,
    pub extensions: ExtensionSet,
    /// Pause after every attempted conversion, successful or not.
    pub delay: Duration,
    pub delete_originals: bool,
    pub skip_converted: bool,
    pub ignore_patterns: Vec<String>,
}

impl BatchOptions {
    pub fn new(cutoff: DateTime<Utc>, extensions: ExtensionSet) -> Self {
        Self {
            cutoff,
            extensions,
            delay: Duration::ZERO,
            delete_originals: false,
            skip_converted: true,
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delete_originals(mut self, delete: bool) -> Self {
        self.delete_originals = delete;
        self
    }

    pub fn skip_converted(mut self, skip: bool) -> Self {
        self.skip_converted = skip;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Parses a per-item delay given in seconds.
pub fn delay_from_secs(secs: f64) -> Result<Duration, Error> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        Error::InvalidSetting(format!(
            "delay must be a non-negative number of seconds (got {})",
            secs
        ))
    })
}

#[derive(Debug)]
pub struct BatchResult {
    pub scan_duration: Duration,
    pub convert_duration: Duration,
    pub summary: BatchSummary,
    /// In the order the filter yielded the jobs.
    pub outcomes: Vec<ConversionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionReport {
    pub checked: usize,
    pub detected: Vec<PathBuf>,
}

/// Drives scan, filter and conversion for one root, one job at a time.
pub struct BatchCoordinator<'a> {
    launcher: &'a mut dyn EngineLauncher,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(launcher: &'a mut dyn EngineLauncher, reporter: &'a dyn ProgressReporter) -> Self {
        Self { launcher, reporter }
    }

    /// Only scan and filter failures or an engine that will not start end the run
    /// with an error. Per-file failures are counted in the summary.
    pub fn run(&mut self, root: &Path, options: &BatchOptions) -> Result<BatchResult, Error> {
        info!("Starting conversion in directory: {}", root.display());
        info!(
            "Cutoff date for file modification: {}",
            options.cutoff.format("%Y-%m-%d")
        );

        let scan_start = Instant::now();
        let (checked, jobs) = collect_jobs(root, options, self.reporter)?;
        let scan_duration = scan_start.elapsed();

        let mut summary = BatchSummary {
            checked,
            detected: jobs.len(),
            ..Default::default()
        };
        let mut outcomes = Vec::with_capacity(jobs.len());

        let convert_start = Instant::now();
        if jobs.is_empty() {
            info!("No files to convert");
        } else {
            let worker = ConversionWorker::new(options.delete_originals, self.reporter)
                .skip_converted(options.skip_converted);
            let plan = plan_jobs(&worker, jobs);

            // Engines are only started for kinds that still have work.
            let kinds: BTreeSet<DocumentKind> = plan
                .iter()
                .filter(|(_, step)| matches!(step, Step::Convert))
                .map(|(job, _)| job.kind)
                .collect();
            let mut session = if kinds.is_empty() {
                None
            } else {
                let session = ConversionSession::open(&mut *self.launcher, kinds)?;
                self.reporter.report(&BatchEvent::SessionOpened {
                    kinds: session.kinds(),
                });
                Some(session)
            };

            let total = plan.len();
            for (index, (job, step)) in plan.into_iter().enumerate() {
                self.reporter.report(&BatchEvent::JobStarted {
                    index,
                    total,
                    source: job.source_path.clone(),
                });
                let attempted = matches!(step, Step::Convert);
                let outcome = match (step, session.as_mut()) {
                    (Step::Skip(reason), _) => worker.skip(job, reason),
                    (Step::Reject(reason), _) => worker.reject(job, reason),
                    (Step::Convert, Some(session)) => worker.process(job, session),
                    (Step::Convert, None) => worker.reject(job, "no conversion session".to_string()),
                };
                summary.record(&outcome);
                outcomes.push(outcome);

                if attempted && !options.delay.is_zero() {
                    debug!("Waiting {:?} before the next file", options.delay);
                    thread::sleep(options.delay);
                }
            }

            if let Some(session) = session {
                session.close();
                self.reporter.report(&BatchEvent::SessionClosed);
            }
        }
        let convert_duration = convert_start.elapsed();

        info!(
            "Conversion completed. Total files checked: {}, Files converted: {}, Failed: {}, Skipped: {}",
            summary.checked, summary.converted, summary.failed, summary.skipped
        );
        self.reporter.report(&BatchEvent::BatchCompleted { summary });

        Ok(BatchResult {
            scan_duration,
            convert_duration,
            summary,
            outcomes,
        })
    }

    /// Scan and filter only; no engine is started.
    pub fn detect(&self, root: &Path, options: &BatchOptions) -> Result<DetectionReport, Error> {
        info!("Starting detection in directory: {}", root.display());
        info!(
            "Cutoff date for file modification: {}",
            options.cutoff.format("%Y-%m-%d")
        );
        let (checked, jobs) = collect_jobs(root, options, self.reporter)?;
        let detected: Vec<PathBuf> = jobs.into_iter().map(|job| job.source_path).collect();
        info!(
            "Detection completed. Total files checked: {}, Files detected: {}",
            checked,
            detected.len()
        );
        Ok(DetectionReport { checked, detected })
    }
}

enum Step {
    Convert,
    Skip(String),
    Reject(String),
}

/// Decides up front what happens to each job. Only the first job that maps to a
/// given target may write it; later claimants are rejected so they can neither
/// overwrite that output nor have their original deleted.
fn plan_jobs(worker: &ConversionWorker<'_>, jobs: Vec<ConversionJob>) -> Vec<(ConversionJob, Step)> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    jobs.into_iter()
        .map(|job| {
            if let Some(first) = claimed.get(&job.target_path) {
                let reason = format!(
                    "target {} already produced by {}",
                    job.target_path.display(),
                    first.display()
                );
                return (job, Step::Reject(reason));
            }
            claimed.insert(job.target_path.clone(), job.source_path.clone());
            let step = match worker.skip_reason(&job) {
                Some(reason) => Step::Skip(reason),
                None => Step::Convert,
            };
            (job, step)
        })
        .collect()
}

/// Returns the number of files scanned and the in-scope jobs in scan order.
fn collect_jobs(
    root: &Path,
    options: &BatchOptions,
    reporter: &dyn ProgressReporter,
) -> Result<(usize, Vec<ConversionJob>), Error> {
    reporter.report(&BatchEvent::ScanStarted {
        root: root.to_path_buf(),
    });
    let candidates = PathScanner::new(root)
        .with_ignore_patterns(&options.ignore_patterns)
        .scan()?;
    debug!(
        "File types: {}",
        options
            .extensions
            .kinds()
            .map(|kind| kind.legacy_extension())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let filter = AgeFilter::new(options.cutoff, options.extensions.clone());

    let mut checked = 0;
    let mut jobs = Vec::new();
    for candidate in candidates {
        checked += 1;
        if !filter.accepts(&candidate) {
            continue;
        }
        info!("Detected file: {}", candidate.path.display());
        reporter.report(&BatchEvent::CandidateDetected {
            path: candidate.path.clone(),
            modified_at: candidate.modified_at,
        });
        if let Some(job) = ConversionJob::from_candidate(candidate) {
            jobs.push(job);
        }
    }

    reporter.report(&BatchEvent::ScanCompleted {
        checked,
        detected: jobs.len(),
    });
    Ok((checked, jobs))
}
