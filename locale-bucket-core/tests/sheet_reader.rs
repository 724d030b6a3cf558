use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use zip::write::SimpleFileOptions;

use locale_bucket_core::config::LanguageSpec;
use locale_bucket_core::sheet::{extract_sheet_header, open_sheet, SheetError, TabularSource};
use locale_bucket_core::translation;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{sheet_name}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn column_letter(column: usize) -> char {
    (b'A' + column as u8) as char
}

/// Worksheet XML with inline strings; empty strings leave the cell out.
fn sheet_xml(rows: &[Vec<&str>]) -> String {
    let mut data = String::new();
    for (r, row) in rows.iter().enumerate() {
        data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            data.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                column_letter(c),
                r + 1,
                value
            ));
        }
        data.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
    )
}

fn write_xlsx(dir: &Path, sheet_name: &str, rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join("translations.xlsx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(sheet_name)),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn translation_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec![],
        vec![],
        vec!["", "", "key", "fr", "en", "de", "es", "it", "pt", "nl"],
        vec!["", "", "greeting", "Bonjour", "Hello", "Hallo", "Hola", "Ciao", "Olá", "Hallo"],
        vec!["", "", "farewell", "Au revoir", "Goodbye", "", "Adiós", "Ciao", "Adeus", "Dag"],
    ]
}

#[test]
fn opens_named_sheet_and_reads_cells() {
    let dir = tempdir().unwrap();
    let path = write_xlsx(dir.path(), "Translations", &translation_rows());

    let sheet = open_sheet(&path, "Translations").expect("sheet should open");

    assert_eq!(sheet.name(), "Translations");
    assert_eq!(sheet.row_count(), 5);
    assert_eq!(sheet.column_count(), 10);
    assert_eq!(sheet.cell(3, 3).to_text(), "Bonjour");

    let header = extract_sheet_header(&sheet, 2, 2);
    assert_eq!(header.column("key"), Some(2));
    assert_eq!(header.column("nl"), Some(9));
}

#[test]
fn workbook_rows_become_translation_sets() {
    let dir = tempdir().unwrap();
    let path = write_xlsx(dir.path(), "Translations", &translation_rows());
    let sheet = open_sheet(&path, "Translations").unwrap();

    let sets = translation::build(&sheet, &LanguageSpec::default(), 2);

    assert_eq!(sets.len(), 7);
    for set in &sets {
        assert_eq!(set.len(), 3, "{} should hold two keys plus the seed", set.locale());
    }
    assert_eq!(sets[0].get("greeting"), Some("Bonjour"));
    assert_eq!(sets[2].get("farewell"), Some(""));
    assert_eq!(sets[6].get("key"), Some("nl_NL"));
}

#[test]
fn unknown_sheet_name_is_reported() {
    let dir = tempdir().unwrap();
    let path = write_xlsx(dir.path(), "Translations", &translation_rows());

    let err = open_sheet(&path, "translations").unwrap_err();

    match err {
        SheetError::SheetNotFound { name, available } => {
            assert_eq!(name, "translations");
            assert_eq!(available, vec!["Translations".to_string()]);
        }
        other => panic!("expected SheetNotFound, got {other:?}"),
    }
}

#[test]
fn sheet_without_cells_is_empty() {
    let dir = tempdir().unwrap();
    let path = write_xlsx(dir.path(), "Translations", &[]);

    let err = open_sheet(&path, "Translations").unwrap_err();

    assert!(matches!(err, SheetError::EmptySheet(_)), "got {err:?}");
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();

    let err = open_sheet(dir.path().join("absent.xlsx"), "Translations").unwrap_err();

    assert!(matches!(err, SheetError::FileNotFound(_)));
}
