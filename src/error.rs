use std::path::PathBuf;
use thiserror::Error;

/// Batch-level failures. Any of these stops the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Unsupported file type '{0}' (expected doc or xls)")]
    UnsupportedExtension(String),

    #[error("No file types selected")]
    NoFileTypes,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised by an automation engine while it handles a document.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine could not be started: {0}")]
    Unavailable(String),

    #[error("could not open document: {0}")]
    Open(String),

    #[error("could not save document: {0}")]
    Save(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable per-job failures. The worker turns these into `Failed` outcomes.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("no {0} engine in this session")]
    MissingEngine(&'static str),

    #[error("open failed for {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("save failed for {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("converted, but could not delete original {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
