use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walker_core::{CellValue, Record};
use walker_logging::walker_info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::filename::export_filename;
use crate::persist::{AtomicFileWriter, PersistError};

const SHEET_NAME: &str = "Data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows written, not counting the header.
    pub row_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("no records to export")]
    NoRecords,
}

/// Writes `records` to `{dir}/{prefix}-{timestamp}.xlsx`.
pub fn export_records(
    dir: &Path,
    prefix: &str,
    records: &[Record],
    timestamp: DateTime<Utc>,
) -> Result<ExportSummary, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    let workbook = build_workbook(records)?;
    let filename = export_filename(prefix, timestamp);
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(&filename, workbook)?;
    walker_info!("Exported {} records to {:?}", records.len(), path);
    Ok(ExportSummary {
        path,
        row_count: records.len(),
    })
}

/// Builds a single-sheet workbook: a bold header row with the field labels,
/// then one row per record.
pub fn build_workbook(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(records, &mut strings);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/sharedStrings.xml", strings.to_xml()),
        ("xl/worksheets/sheet1.xml", sheet),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    ordered: Vec<String>,
    uses: usize,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        self.uses += 1;
        if let Some(&i) = self.index.get(text) {
            return i;
        }
        let i = self.ordered.len();
        self.ordered.push(text.to_string());
        self.index.insert(text.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.uses,
            self.ordered.len()
        );
        for text in &self.ordered {
            xml.push_str(r#"<si><t xml:space="preserve">"#);
            xml.push_str(&escape_xml(text));
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

fn sheet_xml(records: &[Record], strings: &mut SharedStrings) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(r#"<row r="1">"#);
    for (col, label) in Record::FIELD_NAMES.iter().enumerate() {
        let i = strings.intern(label);
        xml.push_str(&format!(
            r#"<c r="{}1" t="s" s="1"><v>{i}</v></c>"#,
            column_name(col)
        ));
    }
    xml.push_str("</row>");

    for (offset, record) in records.iter().enumerate() {
        let row = offset + 2;
        xml.push_str(&format!(r#"<row r="{row}">"#));
        for (col, (_, value)) in record.cells().iter().enumerate() {
            let cell_ref = format!("{}{row}", column_name(col));
            match value {
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
                }
                CellValue::Text(text) => {
                    let i = strings.intern(text);
                    xml.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{i}</v></c>"#));
                }
                CellValue::Empty => {
                    let i = strings.intern("");
                    xml.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{i}</v></c>"#));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Zero-based column index to spreadsheet letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

// xf 0 is the default cell format, xf 1 uses the bold font.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(16), "Q");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_xml(r#"PT <A&B> "x""#), "PT &lt;A&amp;B&gt; &quot;x&quot;");
        assert_eq!(escape_xml("a\u{1}b"), "ab");
    }

    #[test]
    fn shared_strings_are_deduplicated() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("a"), 0);
        assert_eq!(strings.intern("b"), 1);
        assert_eq!(strings.intern("a"), 0);
        let xml = strings.to_xml();
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
    }

    #[test]
    fn empty_export_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_records(dir.path(), "coretax-data", &[], Utc::now()).unwrap_err();
        assert!(matches!(err, ExportError::NoRecords));
    }
}
