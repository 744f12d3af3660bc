use super::{DocumentHandle, Engine, EngineLauncher};
use crate::error::EngineError;
use crate::job::DocumentKind;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Launches LibreOffice in headless mode, one private user profile per engine kind.
pub struct SofficeLauncher {
    program: PathBuf,
    profile_root: PathBuf,
}

impl SofficeLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            profile_root: std::env::temp_dir(),
        }
    }

    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    fn probe(&self) -> Result<(), EngineError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                EngineError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;
        if !status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}

impl EngineLauncher for SofficeLauncher {
    fn launch(&mut self, kind: DocumentKind) -> Result<Box<dyn Engine>, EngineError> {
        self.probe()?;

        let profile_dir = self.profile_root.join(format!(
            "fileflow-{}-{}",
            kind.engine_name(),
            std::process::id()
        ));
        fs::create_dir_all(&profile_dir).map_err(|e| {
            EngineError::Unavailable(format!(
                "cannot create profile {}: {}",
                profile_dir.display(),
                e
            ))
        })?;
        debug!(
            "Started {} engine with profile {}",
            kind.engine_name(),
            profile_dir.display()
        );

        Ok(Box::new(SofficeEngine {
            program: self.program.clone(),
            kind,
            profile_dir,
            next_id: 0,
        }))
    }
}

pub struct SofficeEngine {
    program: PathBuf,
    kind: DocumentKind,
    profile_dir: PathBuf,
    next_id: u64,
}

impl Engine for SofficeEngine {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn open(&mut self, source: &Path) -> Result<DocumentHandle, EngineError> {
        let metadata =
            fs::metadata(source).map_err(|e| EngineError::Open(format!("{}", e)))?;
        if !metadata.is_file() {
            return Err(EngineError::Open("not a regular file".to_string()));
        }
        // Fail early on permission problems rather than inside the converter.
        fs::File::open(source).map_err(|e| EngineError::Open(format!("{}", e)))?;

        self.next_id += 1;
        Ok(DocumentHandle::new(self.next_id, source))
    }

    fn save_as(&mut self, document: &DocumentHandle, target: &Path) -> Result<(), EngineError> {
        let out_dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let output = Command::new(&self.program)
            .args(convert_args(
                self.kind,
                &self.profile_dir,
                document.source(),
                &out_dir,
            ))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                EngineError::Save(format!("cannot run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            return Err(EngineError::Save(format!(
                "converter exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // The converter names its output after the source stem.
        let produced = produced_path(document.source(), &out_dir, self.kind);
        if produced != target {
            fs::rename(&produced, target).map_err(|e| {
                EngineError::Save(format!(
                    "cannot move {} to {}: {}",
                    produced.display(),
                    target.display(),
                    e
                ))
            })?;
        }
        if !target.is_file() {
            return Err(EngineError::Save(format!(
                "converter reported success but {} was not written",
                target.display()
            )));
        }
        Ok(())
    }

    fn close_document(&mut self, _document: DocumentHandle) -> Result<(), EngineError> {
        // Every conversion runs to completion in its own process; nothing stays open.
        Ok(())
    }

    fn shutdown(self: Box<Self>) -> Result<(), EngineError> {
        match fs::remove_dir_all(&self.profile_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(
                    "Could not remove engine profile {}: {}",
                    self.profile_dir.display(),
                    e
                );
                Err(EngineError::Io(e))
            }
        }
    }
}

/// Output format argument understood by `--convert-to`.
fn filter_spec(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Spreadsheet => "xlsx:Calc MS Excel 2007 XML",
        DocumentKind::Document => "docx:MS Word 2007 XML",
    }
}

fn convert_args(
    kind: DocumentKind,
    profile_dir: &Path,
    source: &Path,
    out_dir: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--headless",
        "--invisible",
        "--nologo",
        "--nodefault",
        "--norestore",
        "--nolockcheck",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format!("-env:UserInstallation={}", file_url(profile_dir)).into());
    args.push("--convert-to".into());
    args.push(filter_spec(kind).into());
    args.push("--outdir".into());
    args.push(out_dir.as_os_str().to_owned());
    args.push(source.as_os_str().to_owned());
    args
}

fn produced_path(source: &Path, out_dir: &Path, kind: DocumentKind) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(kind.modern_extension());
    out_dir.join(name)
}

/// `file://` URL with every byte outside the unreserved set and `/` `:`
/// percent-encoded.
fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut url = String::from(if raw.starts_with('/') { "file://" } else { "file:///" });
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                url.push(byte as char)
            }
            _ => url.push_str(&format!("%{:02X}", byte)),
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_args_suppress_ui_and_target_modern_format() {
        let args = convert_args(
            DocumentKind::Spreadsheet,
            Path::new("/tmp/profile"),
            Path::new("/data/a.xls"),
            Path::new("/data"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--norestore".to_string()));
        assert!(args.contains(&"-env:UserInstallation=file:///tmp/profile".to_string()));
        let convert = args.iter().position(|a| a == "--convert-to").unwrap();
        assert_eq!(args[convert + 1], "xlsx:Calc MS Excel 2007 XML");
        assert_eq!(args.last().unwrap(), "/data/a.xls");
    }

    #[test]
    fn test_produced_path_uses_source_stem() {
        assert_eq!(
            produced_path(Path::new("/data/Letter.DOC"), Path::new("/out"), DocumentKind::Document),
            PathBuf::from("/out/Letter.docx")
        );
        assert_eq!(
            produced_path(Path::new("/data/q1.v2.xls"), Path::new("/data"), DocumentKind::Spreadsheet),
            PathBuf::from("/data/q1.v2.xlsx")
        );
    }

    #[test]
    fn test_file_url_for_windows_style_path() {
        assert_eq!(
            file_url(Path::new(r"C:\Temp\profile")),
            "file:///C:/Temp/profile"
        );
    }

    #[test]
    fn test_file_url_escapes_spaces_and_percent() {
        assert_eq!(
            file_url(Path::new(r"C:\Users\Jane Doe\AppData\Local\Temp\fileflow-spreadsheet-1")),
            "file:///C:/Users/Jane%20Doe/AppData/Local/Temp/fileflow-spreadsheet-1"
        );
        assert_eq!(file_url(Path::new("/tmp/100% é")), "file:///tmp/100%25%20%C3%A9");
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let mut launcher = SofficeLauncher::new(tmp.path().join("no-such-soffice"))
            .with_profile_root(tmp.path());
        let result = launcher.launch(DocumentKind::Document);
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }

    #[test]
    fn test_open_rejects_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let mut engine = SofficeEngine {
            program: PathBuf::from("soffice"),
            kind: DocumentKind::Spreadsheet,
            profile_dir: tmp.path().join("profile"),
            next_id: 0,
        };
        let result = engine.open(&tmp.path().join("gone.xls"));
        assert!(matches!(result, Err(EngineError::Open(_))));

        let present = tmp.path().join("here.xls");
        fs::write(&present, "x").unwrap();
        let handle = engine.open(&present).unwrap();
        assert_eq!(handle.source(), present.as_path());
        assert!(Box::new(engine).shutdown().is_ok());
    }
}
