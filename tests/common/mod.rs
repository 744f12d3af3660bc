#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use fileflow::engine::{DocumentHandle, Engine, EngineLauncher};
use fileflow::{DocumentKind, EngineError};

/// Files whose content starts with this cannot be opened by the fake engine.
pub const CORRUPT: &str = "CORRUPT";
/// Files whose content starts with this open fine but fail to save.
pub const UNSAVEABLE: &str = "UNSAVEABLE";
/// Files whose content starts with this save fine, but the source is then replaced
/// by a directory of the same name so it can no longer be removed as a file.
pub const UNDELETABLE: &str = "UNDELETABLE";

#[derive(Debug, Default)]
pub struct Calls {
    pub launched: Vec<DocumentKind>,
    pub shut_down: Vec<DocumentKind>,
    pub opened: Vec<PathBuf>,
    pub saved: Vec<PathBuf>,
    pub closed: usize,
}

/// Engine double that "converts" by copying the source bytes to the target.
pub struct FakeLauncher {
    pub calls: Arc<Mutex<Calls>>,
    pub unavailable: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Calls::default())),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn launch_count(&self) -> usize {
        self.calls.lock().unwrap().launched.len()
    }

    pub fn shutdown_count(&self) -> usize {
        self.calls.lock().unwrap().shut_down.len()
    }
}

impl EngineLauncher for FakeLauncher {
    fn launch(&mut self, kind: DocumentKind) -> Result<Box<dyn Engine>, EngineError> {
        if self.unavailable {
            return Err(EngineError::Unavailable("fake engine disabled".to_string()));
        }
        self.calls.lock().unwrap().launched.push(kind);
        Ok(Box::new(FakeEngine {
            kind,
            calls: Arc::clone(&self.calls),
            next_id: 0,
        }))
    }
}

struct FakeEngine {
    kind: DocumentKind,
    calls: Arc<Mutex<Calls>>,
    next_id: u64,
}

impl Engine for FakeEngine {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn open(&mut self, source: &Path) -> Result<DocumentHandle, EngineError> {
        let content = fs::read_to_string(source).map_err(|e| EngineError::Open(e.to_string()))?;
        if content.starts_with(CORRUPT) {
            return Err(EngineError::Open("file is corrupt".to_string()));
        }
        self.calls.lock().unwrap().opened.push(source.to_path_buf());
        self.next_id += 1;
        Ok(DocumentHandle::new(self.next_id, source))
    }

    fn save_as(&mut self, document: &DocumentHandle, target: &Path) -> Result<(), EngineError> {
        let content = fs::read_to_string(document.source())?;
        if content.starts_with(UNSAVEABLE) {
            return Err(EngineError::Save("disk full".to_string()));
        }
        fs::write(target, format!("converted:{}", content))?;
        if content.starts_with(UNDELETABLE) {
            fs::remove_file(document.source())?;
            fs::create_dir(document.source())?;
        }
        self.calls.lock().unwrap().saved.push(target.to_path_buf());
        Ok(())
    }

    fn close_document(&mut self, _document: DocumentHandle) -> Result<(), EngineError> {
        self.calls.lock().unwrap().closed += 1;
        Ok(())
    }

    fn shutdown(self: Box<Self>) -> Result<(), EngineError> {
        self.calls.lock().unwrap().shut_down.push(self.kind);
        Ok(())
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Writes `content` and sets the modification time `days_ago` days in the past.
pub fn write_file_aged(path: &Path, content: &str, days_ago: u64) {
    write_file(path, content);
    let when = SystemTime::now() - Duration::from_secs(days_ago * 24 * 60 * 60);
    filetime::set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
}
