use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which automation engine a legacy file needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    Spreadsheet,
    Document,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Spreadsheet, DocumentKind::Document];

    /// Lower-cased legacy extension, without the dot.
    pub fn legacy_extension(self) -> &'static str {
        match self {
            DocumentKind::Spreadsheet => "xls",
            DocumentKind::Document => "doc",
        }
    }

    pub fn modern_extension(self) -> &'static str {
        match self {
            DocumentKind::Spreadsheet => "xlsx",
            DocumentKind::Document => "docx",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.');
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.legacy_extension().eq_ignore_ascii_case(ext))
    }

    pub fn engine_name(self) -> &'static str {
        match self {
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Document => "word-processor",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.legacy_extension())
    }
}

/// A regular file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    /// Lower-cased suffix without the dot; empty when the file has none.
    pub extension: String,
    pub modified_at: DateTime<Utc>,
}

impl FileCandidate {
    pub fn new(path: PathBuf, modified_at: DateTime<Utc>) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            path,
            extension,
            modified_at,
        }
    }
}

/// An in-scope candidate with its target path and engine kind resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub kind: DocumentKind,
}

impl ConversionJob {
    pub fn from_candidate(candidate: FileCandidate) -> Option<Self> {
        let kind = DocumentKind::from_extension(&candidate.extension)?;
        Some(Self::new(candidate.path, kind))
    }

    pub fn new(source_path: PathBuf, kind: DocumentKind) -> Self {
        let target_path = target_path_for(&source_path, kind);
        Self {
            source_path,
            target_path,
            kind,
        }
    }
}

/// Same directory and stem, modern extension: `report.XLS` -> `report.xlsx`.
pub fn target_path_for(source: &Path, kind: DocumentKind) -> PathBuf {
    source.with_extension(kind.modern_extension())
}

/// Per-job progress. `Failed` and `Done` are terminal; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Opening,
    Converting,
    Saved,
    Deleting,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Pending => "pending",
            JobState::Opening => "opening",
            JobState::Converting => "converting",
            JobState::Saved => "saved",
            JobState::Deleting => "deleting",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Converted,
    Failed(String),
    Skipped(String),
}

/// Terminal result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub job: ConversionJob,
    pub status: OutcomeStatus,
    pub original_deleted: bool,
}

impl ConversionOutcome {
    pub fn converted(job: ConversionJob, original_deleted: bool) -> Self {
        Self {
            job,
            status: OutcomeStatus::Converted,
            original_deleted,
        }
    }

    pub fn failed(job: ConversionJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: OutcomeStatus::Failed(reason.into()),
            original_deleted: false,
        }
    }

    pub fn skipped(job: ConversionJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: OutcomeStatus::Skipped(reason.into()),
            original_deleted: false,
        }
    }

    pub fn is_converted(&self) -> bool {
        self.status == OutcomeStatus::Converted
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Counts accumulated over one batch. `checked` is every file the scanner yielded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub checked: usize,
    pub detected: usize,
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome.status {
            OutcomeStatus::Converted => self.converted += 1,
            OutcomeStatus::Failed(_) => self.failed += 1,
            OutcomeStatus::Skipped(_) => self.skipped += 1,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked, {} converted, {} failed",
            self.checked, self.converted, self.failed
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}
