//! Automation engines that open a legacy file and save it in the modern format.
//!
//! An engine is acquired through an [`EngineLauncher`] and owned by a
//! [`ConversionSession`](crate::session::ConversionSession) for the whole batch.
//! Shutdown consumes the boxed engine, so only its owner can end it.

pub mod soffice;

use crate::error::EngineError;
use crate::job::DocumentKind;
use std::path::{Path, PathBuf};

pub use soffice::SofficeLauncher;

/// An open document inside an engine. Only the engine that issued it understands it.
#[derive(Debug, PartialEq, Eq)]
pub struct DocumentHandle {
    id: u64,
    source: PathBuf,
}

impl DocumentHandle {
    pub fn new(id: u64, source: impl Into<PathBuf>) -> Self {
        Self {
            id,
            source: source.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

pub trait Engine {
    fn kind(&self) -> DocumentKind;

    fn open(&mut self, source: &Path) -> Result<DocumentHandle, EngineError>;

    /// Writes `document` to `target` in the modern format for this engine's kind.
    fn save_as(&mut self, document: &DocumentHandle, target: &Path) -> Result<(), EngineError>;

    fn close_document(&mut self, document: DocumentHandle) -> Result<(), EngineError>;

    /// Ends the engine. Called exactly once, by the owning session.
    fn shutdown(self: Box<Self>) -> Result<(), EngineError>;
}

/// Starts engines. Interactive dialogs and alerts must be suppressed.
pub trait EngineLauncher {
    fn launch(&mut self, kind: DocumentKind) -> Result<Box<dyn Engine>, EngineError>;
}
