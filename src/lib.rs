pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod job;
pub mod progress;
pub mod recipients;
pub mod scanner;
pub mod session;
pub mod tidy;
pub mod worker;

pub use batch::{BatchCoordinator, BatchOptions, BatchResult, DetectionReport};
pub use config::AppConfig;
pub use error::{EngineError, Error, JobError};
pub use filter::{AgeFilter, ExtensionSet};
pub use job::{BatchSummary, ConversionJob, ConversionOutcome, DocumentKind, FileCandidate, OutcomeStatus};
pub use progress::{BatchEvent, EventLog, ProgressReporter, SilentReporter};
pub use session::ConversionSession;
pub use worker::ConversionWorker;
