use crate::engine::{Engine, EngineLauncher};
use crate::error::{EngineError, Error, JobError};
use crate::job::DocumentKind;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Owns the automation engines for one batch.
///
/// Engines are acquired in [`ConversionSession::open`] and shut down exactly once,
/// either by [`ConversionSession::close`] or when the session is dropped. The
/// session borrows the launcher mutably for its whole lifetime, so a second session
/// cannot be opened on the same launcher while this one is live.
pub struct ConversionSession<'a> {
    _launcher: &'a mut dyn EngineLauncher,
    engines: BTreeMap<DocumentKind, Box<dyn Engine>>,
}

impl<'a> ConversionSession<'a> {
    /// Starts one engine per requested kind. If any engine fails to start, the ones
    /// already running are shut down before the error is returned.
    pub fn open(
        launcher: &'a mut dyn EngineLauncher,
        kinds: impl IntoIterator<Item = DocumentKind>,
    ) -> Result<Self, Error> {
        let mut engines: BTreeMap<DocumentKind, Box<dyn Engine>> = BTreeMap::new();
        for kind in kinds {
            if engines.contains_key(&kind) {
                continue;
            }
            let started = launcher.launch(kind).and_then(|engine| {
                if engine.kind() == kind {
                    return Ok(engine);
                }
                let reason = format!("launcher returned a {} engine", engine.kind().engine_name());
                if let Err(e) = engine.shutdown() {
                    error!("Error closing mismatched engine: {}", e);
                }
                Err(EngineError::Unavailable(reason))
            });
            match started {
                Ok(engine) => {
                    debug!("Opened {} engine", kind.engine_name());
                    engines.insert(kind, engine);
                }
                Err(err) => {
                    shutdown_all(engines);
                    let reason = match err {
                        EngineError::Unavailable(msg) => msg,
                        other => other.to_string(),
                    };
                    return Err(Error::EngineUnavailable(format!(
                        "{} engine: {}",
                        kind.engine_name(),
                        reason
                    )));
                }
            }
        }

        info!(
            "Conversion session opened ({})",
            engines
                .keys()
                .map(|k| k.engine_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            _launcher: launcher,
            engines,
        })
    }

    pub fn kinds(&self) -> Vec<DocumentKind> {
        self.engines.keys().copied().collect()
    }

    pub fn engine_for(&mut self, kind: DocumentKind) -> Result<&mut dyn Engine, JobError> {
        match self.engines.get_mut(&kind) {
            Some(engine) => Ok(engine.as_mut()),
            None => Err(JobError::MissingEngine(kind.engine_name())),
        }
    }

    /// Shuts every engine down. Shutdown errors are logged, not returned.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.engines.is_empty() {
            return;
        }
        shutdown_all(std::mem::take(&mut self.engines));
        info!("Conversion session closed");
    }
}

impl Drop for ConversionSession<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

fn shutdown_all(engines: BTreeMap<DocumentKind, Box<dyn Engine>>) {
    for (kind, engine) in engines {
        match engine.shutdown() {
            Ok(()) => debug!("Closed {} engine", kind.engine_name()),
            Err(e) => error!("Error closing {} engine: {}", kind.engine_name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DocumentHandle;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        launched: Vec<DocumentKind>,
        shut_down: Vec<DocumentKind>,
    }

    struct StubEngine {
        kind: DocumentKind,
        calls: Rc<RefCell<Calls>>,
    }

    impl Engine for StubEngine {
        fn kind(&self) -> DocumentKind {
            self.kind
        }
        fn open(&mut self, source: &Path) -> Result<DocumentHandle, EngineError> {
            Ok(DocumentHandle::new(1, source))
        }
        fn save_as(&mut self, _: &DocumentHandle, _: &Path) -> Result<(), EngineError> {
            Ok(())
        }
        fn close_document(&mut self, _: DocumentHandle) -> Result<(), EngineError> {
            Ok(())
        }
        fn shutdown(self: Box<Self>) -> Result<(), EngineError> {
            self.calls.borrow_mut().shut_down.push(self.kind);
            Ok(())
        }
    }

    struct StubLauncher {
        calls: Rc<RefCell<Calls>>,
        unavailable: Option<DocumentKind>,
        wrong_kind: bool,
    }

    impl EngineLauncher for StubLauncher {
        fn launch(&mut self, kind: DocumentKind) -> Result<Box<dyn Engine>, EngineError> {
            if self.unavailable == Some(kind) {
                return Err(EngineError::Unavailable("not installed".to_string()));
            }
            self.calls.borrow_mut().launched.push(kind);
            let kind = match (self.wrong_kind, kind) {
                (false, kind) => kind,
                (true, DocumentKind::Spreadsheet) => DocumentKind::Document,
                (true, DocumentKind::Document) => DocumentKind::Spreadsheet,
            };
            Ok(Box::new(StubEngine {
                kind,
                calls: Rc::clone(&self.calls),
            }))
        }
    }

    fn launcher(unavailable: Option<DocumentKind>) -> (StubLauncher, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        (
            StubLauncher {
                calls: Rc::clone(&calls),
                unavailable,
                wrong_kind: false,
            },
            calls,
        )
    }

    #[test]
    fn test_each_engine_shut_down_once_on_close() {
        let (mut launcher, calls) = launcher(None);
        let session = ConversionSession::open(
            &mut launcher,
            [DocumentKind::Document, DocumentKind::Spreadsheet, DocumentKind::Document],
        )
        .unwrap();
        assert_eq!(session.kinds().len(), 2);
        session.close();

        let calls = calls.borrow();
        assert_eq!(calls.launched.len(), 2);
        assert_eq!(calls.shut_down.len(), 2);
    }

    #[test]
    fn test_drop_releases_engines() {
        let (mut launcher, calls) = launcher(None);
        {
            let mut session =
                ConversionSession::open(&mut launcher, [DocumentKind::Spreadsheet]).unwrap();
            assert!(session.engine_for(DocumentKind::Spreadsheet).is_ok());
            assert!(matches!(
                session.engine_for(DocumentKind::Document),
                Err(JobError::MissingEngine(_))
            ));
        }
        assert_eq!(calls.borrow().shut_down, vec![DocumentKind::Spreadsheet]);
    }

    #[test]
    fn test_failed_open_releases_started_engines() {
        let (mut launcher, calls) = launcher(Some(DocumentKind::Document));
        let result = ConversionSession::open(
            &mut launcher,
            [DocumentKind::Spreadsheet, DocumentKind::Document],
        );
        assert!(matches!(result, Err(Error::EngineUnavailable(_))));
        assert_eq!(calls.borrow().shut_down, vec![DocumentKind::Spreadsheet]);
    }

    #[test]
    fn test_engine_of_wrong_kind_is_refused() {
        let (mut launcher, calls) = launcher(None);
        launcher.wrong_kind = true;
        let result = ConversionSession::open(&mut launcher, [DocumentKind::Spreadsheet]);
        match result {
            Err(Error::EngineUnavailable(reason)) => {
                assert!(reason.contains("word-processor"), "unexpected reason: {}", reason)
            }
            _ => panic!("expected EngineUnavailable"),
        }
        // The mismatched engine is still shut down.
        assert_eq!(calls.borrow().shut_down, vec![DocumentKind::Document]);
    }
}
