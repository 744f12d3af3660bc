//! Joins mail-merge CSV rows to attachment files by identifier.
//!
//! The CSV has a header row; column 0 is the identifier and every further
//! non-empty column is a recipient address. A file matches a row when its name
//! without extension equals the identifier exactly (case-sensitive). Sending is
//! left to the caller, which walks [`AttachmentMatch::deliveries`].

use crate::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub identifier: String,
    pub recipients: Vec<String>,
}

impl CsvRow {
    pub fn new(identifier: impl Into<String>, recipients: &[&str]) -> Self {
        Self {
            identifier: identifier.into(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// One row resolved against the available files. A row without a matching file
/// still produces a match, with `found == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMatch {
    pub identifier: String,
    pub file_path: Option<PathBuf>,
    pub found: bool,
    pub recipients: Vec<String>,
}

/// A single send attempt: one recipient of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery<'a> {
    pub identifier: &'a str,
    pub file_path: Option<&'a Path>,
    pub recipient: &'a str,
    pub found: bool,
}

impl AttachmentMatch {
    pub fn deliveries(&self) -> impl Iterator<Item = Delivery<'_>> {
        self.recipients.iter().map(move |recipient| Delivery {
            identifier: &self.identifier,
            file_path: self.file_path.as_deref(),
            recipient,
            found: self.found,
        })
    }
}

/// Reads rows after the header. Rows may have any number of columns; blank cells
/// and rows with an empty identifier are dropped.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<CsvRow>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut fields = record.iter();
        let identifier = match fields.next() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => continue,
        };
        let recipients = fields
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        rows.push(CsvRow {
            identifier,
            recipients,
        });
    }
    debug!("Read {} mail-merge rows", rows.len());
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<CsvRow>, Error> {
    let file = fs::File::open(path)?;
    read_rows(file)
}

/// Regular files directly inside `folder` whose name ends with `.{extension}`,
/// sorted by name. The comparison is case-sensitive.
pub fn list_attachments(folder: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(|source| Error::Scan {
        path: folder.to_path_buf(),
        source,
    })? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(&suffix) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Produces, per row, one match for every available file whose stem equals the
/// identifier, or a single not-found match when there is none.
pub fn resolve(rows: &[CsvRow], available_files: &[PathBuf]) -> Vec<AttachmentMatch> {
    let mut matches = Vec::new();
    for row in rows {
        let mut found_any = false;
        for file in available_files {
            let stem = file.file_stem().map(|s| s.to_string_lossy());
            if stem.as_deref() == Some(row.identifier.as_str()) {
                found_any = true;
                matches.push(AttachmentMatch {
                    identifier: row.identifier.clone(),
                    file_path: Some(file.clone()),
                    found: true,
                    recipients: row.recipients.clone(),
                });
            }
        }
        if !found_any {
            warn!("No attachment found for identifier {}", row.identifier);
            matches.push(AttachmentMatch {
                identifier: row.identifier.clone(),
                file_path: None,
                found: false,
                recipients: row.recipients.clone(),
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_variable_length() {
        let data = "id,email1,email2\nINV1,a@x.com\nINV2, b@x.com ,c@x.com\n,orphan@x.com\nINV3,,d@x.com\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                CsvRow::new("INV1", &["a@x.com"]),
                CsvRow::new("INV2", &["b@x.com", "c@x.com"]),
                CsvRow::new("INV3", &["d@x.com"]),
            ]
        );
    }

    #[test]
    fn test_identifier_match_is_case_sensitive() {
        let rows = vec![CsvRow::new("inv1", &["a@x.com"])];
        let files = vec![PathBuf::from("/pdfs/INV1.pdf")];
        let matches = resolve(&rows, &files);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].found);
        assert_eq!(matches[0].file_path, None);
    }

    #[test]
    fn test_identifier_is_whole_stem() {
        let rows = vec![CsvRow::new("INV1", &["a@x.com"])];
        let files = vec![PathBuf::from("/pdfs/INV10.pdf"), PathBuf::from("/pdfs/XINV1.pdf")];
        assert!(!resolve(&rows, &files)[0].found);
    }
}
