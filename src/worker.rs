use crate::error::{EngineError, JobError};
use crate::job::{ConversionJob, ConversionOutcome, JobState};
use crate::progress::{BatchEvent, ProgressReporter};
use crate::session::ConversionSession;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

/// Converts one job at a time through the session's engines.
pub struct ConversionWorker<'r> {
    delete_originals: bool,
    skip_converted: bool,
    reporter: &'r dyn ProgressReporter,
}

impl<'r> ConversionWorker<'r> {
    pub fn new(delete_originals: bool, reporter: &'r dyn ProgressReporter) -> Self {
        Self {
            delete_originals,
            skip_converted: false,
            reporter,
        }
    }

    /// Leave a source alone when its modern sibling is already at least as new.
    pub fn skip_converted(mut self, skip: bool) -> Self {
        self.skip_converted = skip;
        self
    }

    /// Why `job` needs no conversion, if it doesn't.
    pub fn skip_reason(&self, job: &ConversionJob) -> Option<String> {
        if self.skip_converted && is_already_converted(&job.source_path, &job.target_path) {
            Some(format!("already converted to {}", job.target_path.display()))
        } else {
            None
        }
    }

    pub fn skip(&self, job: ConversionJob, reason: String) -> ConversionOutcome {
        warn!("Skipping {}: {}", job.source_path.display(), reason);
        self.reporter.report(&BatchEvent::JobSkipped {
            source: job.source_path.clone(),
            reason: reason.clone(),
        });
        ConversionOutcome::skipped(job, reason)
    }

    /// Records `job` as failed without touching the engine or the filesystem.
    pub fn reject(&self, job: ConversionJob, reason: String) -> ConversionOutcome {
        error!("Not converting {}: {}", job.source_path.display(), reason);
        self.reporter.report(&BatchEvent::JobFailed {
            source: job.source_path.clone(),
            reason: reason.clone(),
        });
        ConversionOutcome::failed(job, reason)
    }

    /// Never fails: every engine or filesystem error ends up in the outcome.
    pub fn process(
        &self,
        job: ConversionJob,
        session: &mut ConversionSession<'_>,
    ) -> ConversionOutcome {
        if let Some(reason) = self.skip_reason(&job) {
            return self.skip(job, reason);
        }
        info!("Processing file: {}", job.source_path.display());

        let mut state = JobState::Pending;
        match self.convert(&job, session, &mut state) {
            Ok(original_deleted) => {
                advance(&job, &mut state, JobState::Done);
                info!("Saved file as: {}", job.target_path.display());
                self.reporter.report(&BatchEvent::JobConverted {
                    source: job.source_path.clone(),
                    target: job.target_path.clone(),
                    original_deleted,
                });
                ConversionOutcome::converted(job, original_deleted)
            }
            Err(err) => {
                let failed_in = state;
                advance(&job, &mut state, JobState::Failed);
                let reason = err.to_string();
                error!(
                    "Error processing file {} (while {}): {}",
                    job.source_path.display(),
                    failed_in,
                    reason
                );
                self.reporter.report(&BatchEvent::JobFailed {
                    source: job.source_path.clone(),
                    reason: reason.clone(),
                });
                ConversionOutcome::failed(job, reason)
            }
        }
    }

    /// Returns whether the original was deleted. The source is only removed after
    /// the engine confirmed the save and the target exists on disk.
    fn convert(
        &self,
        job: &ConversionJob,
        session: &mut ConversionSession<'_>,
        state: &mut JobState,
    ) -> Result<bool, JobError> {
        advance(job, state, JobState::Opening);
        let engine = session.engine_for(job.kind)?;
        let document = engine.open(&job.source_path).map_err(|source| JobError::Open {
            path: job.source_path.clone(),
            source,
        })?;
        info!("Opened file: {}", job.source_path.display());
        debug!("{} is document #{}", job.source_path.display(), document.id());
        self.reporter.report(&BatchEvent::JobOpened {
            source: job.source_path.clone(),
        });

        advance(job, state, JobState::Converting);
        info!("Converting to: {}", job.target_path.display());
        let saved = engine.save_as(&document, &job.target_path);
        if let Err(e) = engine.close_document(document) {
            warn!("Error closing {}: {}", job.source_path.display(), e);
        }
        saved.map_err(|source| JobError::Save {
            path: job.target_path.clone(),
            source,
        })?;

        if !job.target_path.is_file() {
            return Err(JobError::Save {
                path: job.target_path.clone(),
                source: EngineError::Save("target missing after save".to_string()),
            });
        }
        advance(job, state, JobState::Saved);

        if !self.delete_originals {
            return Ok(false);
        }

        advance(job, state, JobState::Deleting);
        fs::remove_file(&job.source_path).map_err(|source| JobError::Delete {
            path: job.source_path.clone(),
            source,
        })?;
        info!("Deleted original file: {}", job.source_path.display());
        Ok(true)
    }
}

/// Terminal states are final; a transition out of one is ignored.
fn advance(job: &ConversionJob, state: &mut JobState, next: JobState) {
    if state.is_terminal() {
        warn!(
            "{}: ignoring {} -> {}",
            job.source_path.display(),
            state,
            next
        );
        return;
    }
    trace!("{}: {} -> {}", job.source_path.display(), state, next);
    *state = next;
}

fn is_already_converted(source: &Path, target: &Path) -> bool {
    let (Ok(source_meta), Ok(target_meta)) = (fs::metadata(source), fs::metadata(target)) else {
        return false;
    };
    match (source_meta.modified(), target_meta.modified()) {
        (Ok(source_time), Ok(target_time)) => target_meta.is_file() && target_time >= source_time,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::DocumentKind;
    use std::path::PathBuf;

    #[test]
    fn test_advance_stops_at_terminal_states() {
        let job = ConversionJob::new(PathBuf::from("/data/a.xls"), DocumentKind::Spreadsheet);
        let mut state = JobState::Pending;
        advance(&job, &mut state, JobState::Opening);
        assert_eq!(state, JobState::Opening);

        advance(&job, &mut state, JobState::Failed);
        advance(&job, &mut state, JobState::Saved);
        assert_eq!(state, JobState::Failed);

        let mut done = JobState::Done;
        advance(&job, &mut done, JobState::Deleting);
        assert_eq!(done, JobState::Done);
    }
}
