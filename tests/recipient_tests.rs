mod common;

use std::path::PathBuf;

use common::write_file;
use fileflow::recipients::{list_attachments, read_rows_from_path, resolve, CsvRow};
use fileflow::Error;
use tempfile::tempdir;

#[test]
fn test_missing_attachment_is_reported_per_recipient() {
    let rows = vec![
        CsvRow::new("INV1", &["a@x.com"]),
        CsvRow::new("INV2", &["b@x.com", "c@x.com"]),
    ];
    let available = vec![PathBuf::from("out/INV1.pdf")];

    let matches = resolve(&rows, &available);
    assert_eq!(matches.len(), 2);

    assert!(matches[0].found);
    assert_eq!(matches[0].file_path, Some(PathBuf::from("out/INV1.pdf")));
    let first: Vec<_> = matches[0].deliveries().map(|d| d.recipient).collect();
    assert_eq!(first, vec!["a@x.com"]);

    assert!(!matches[1].found);
    assert_eq!(matches[1].file_path, None);
    let second: Vec<_> = matches[1].deliveries().collect();
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|d| !d.found && d.file_path.is_none()));
    assert_eq!(second[0].identifier, "INV2");
    assert_eq!(second[1].recipient, "c@x.com");
}

#[test]
fn test_csv_file_to_attachment_plan() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("recipients.csv");
    write_file(
        &csv_path,
        "Invoice,Email,Cc\nINV-001,ops@example.com,boss@example.com\ninv-002,late@example.com\nINV-003,third@example.com\n",
    );
    let folder = tmp.path().join("pdf");
    write_file(&folder.join("INV-001.pdf"), "%PDF");
    write_file(&folder.join("INV-002.pdf"), "%PDF");
    write_file(&folder.join("INV-003.PDF"), "%PDF");
    write_file(&folder.join("INV-003.docx"), "docx");
    write_file(&folder.join("nested").join("INV-003.pdf"), "%PDF");

    let rows = read_rows_from_path(&csv_path).unwrap();
    assert_eq!(rows.len(), 3);

    let available = list_attachments(&folder, "pdf").unwrap();
    assert_eq!(
        available,
        vec![folder.join("INV-001.pdf"), folder.join("INV-002.pdf")]
    );

    let matches = resolve(&rows, &available);
    let found: Vec<_> = matches.iter().map(|m| (m.identifier.as_str(), m.found)).collect();
    // Identifiers are matched case-sensitively and only against the listed folder.
    assert_eq!(
        found,
        vec![("INV-001", true), ("inv-002", false), ("INV-003", false)]
    );

    let deliveries: Vec<_> = matches.iter().flat_map(|m| m.deliveries()).collect();
    assert_eq!(deliveries.len(), 4);
    assert_eq!(deliveries[1].recipient, "boss@example.com");
    assert_eq!(
        deliveries[1].file_path,
        Some(folder.join("INV-001.pdf").as_path())
    );
}

#[test]
fn test_list_attachments_missing_folder() {
    let tmp = tempdir().unwrap();
    let result = list_attachments(&tmp.path().join("nope"), "pdf");
    assert!(matches!(result, Err(Error::Scan { .. })));
}
