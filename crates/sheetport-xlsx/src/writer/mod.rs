//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use log::warn;

use sheetport_core::{column_to_letters, CellRef, Table, Value, MAX_CELL_TEXT_LEN};

use crate::error::XlsxResult;
use crate::escape::escape_xml;
use crate::shared_strings::SharedStrings;
use crate::sheet_name::SheetNamer;

/// Location of the first truncated cell in an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationSite {
    /// Source table name
    pub table: String,
    /// Worksheet row (1-based; row 1 is the header)
    pub row: u32,
    /// Column (1-based)
    pub column: u32,
}

/// Outcome of a successful export.
///
/// Oversized cell text is never an error: it is clipped to the cell limit
/// and counted here instead.
#[derive(Debug, Default, Clone)]
pub struct ExportReport {
    /// Number of worksheets written
    pub sheets_written: usize,
    /// Number of cells whose text was clipped to the cell limit
    pub cells_truncated: u64,
    /// Where the first clip happened
    pub first_truncation: Option<TruncationSite>,
}

impl ExportReport {
    fn note_truncation(&mut self, table: &str, row: u32, column: u32) {
        self.cells_truncated += 1;
        if self.first_truncation.is_none() {
            self.first_truncation = Some(TruncationSite {
                table: table.to_string(),
                row,
                column,
            });
        }
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write tables to a file path, one worksheet per table
    pub fn write_file<P: AsRef<Path>>(tables: &[Table], path: P) -> XlsxResult<ExportReport> {
        let file = File::create(path)?;
        Self::write(tables, file)
    }

    /// Write tables to a writer, one worksheet per table
    pub fn write<W: Write + Seek>(tables: &[Table], writer: W) -> XlsxResult<ExportReport> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        let mut report = ExportReport::default();
        let mut strings = SharedStrings::new();
        let mut namer = SheetNamer::new();

        // Sheet bodies are built first: the shared-string table and the
        // name history must be complete before the workbook-level parts
        // can be serialized.
        let mut sheets: Vec<String> = Vec::with_capacity(tables.len());
        for table in tables {
            namer.assign(table.name())?;
            sheets.push(Self::worksheet_xml(table, &mut strings, &mut report));
        }

        let has_strings = !strings.is_empty();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml(sheets.len(), has_strings).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml(namer.names()).as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml(sheets.len(), has_strings).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES_XML.as_bytes())?;

        if has_strings {
            zip.start_file("xl/sharedStrings.xml", options)?;
            zip.write_all(strings.to_xml().as_bytes())?;
        }

        for (i, sheet) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet.as_bytes())?;
        }

        zip.finish()?;

        report.sheets_written = sheets.len();
        if report.cells_truncated > 0 {
            if let Some(site) = &report.first_truncation {
                warn!(
                    "{} cell(s) exceeded the {} character limit and were truncated \
                     (first: table '{}', row {}, column {})",
                    report.cells_truncated, MAX_CELL_TEXT_LEN, site.table, site.row, site.column
                );
            }
        }

        Ok(report)
    }

    /// Build one sheet's XML: bold header row, sparse data rows, autofilter.
    fn worksheet_xml(
        table: &Table,
        strings: &mut SharedStrings,
        report: &mut ExportReport,
    ) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheetData>"#,
        );

        // Header row: shared-string cells with the bold style.
        content.push_str("\n        <row r=\"1\">");
        for (col, name) in table.columns().iter().enumerate() {
            let (text, clipped) = clip_text(name);
            if clipped {
                report.note_truncation(table.name(), 1, col as u32 + 1);
            }
            let idx = strings.intern(text);
            let cell_ref = CellRef::new(0, col as u32).to_a1_string();
            content.push_str(&format!(
                "<c r=\"{}\" t=\"s\" s=\"1\"><v>{}</v></c>",
                cell_ref, idx
            ));
        }
        content.push_str("</row>");

        // Data rows. Null cells are never emitted: sparse absence is the
        // encoding for null.
        let mut row_num: u32 = 2;
        for row in table.rows() {
            content.push_str(&format!("\n        <row r=\"{}\">", row_num));
            for (col, value) in row.iter().enumerate() {
                let cell_ref = CellRef::new(row_num - 1, col as u32).to_a1_string();
                match value {
                    Value::Null => {}
                    Value::Int(i) => {
                        content.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell_ref, i));
                    }
                    Value::Float(f) if !f.is_finite() => {
                        // No numeric form in the file format; reads back
                        // as null, same as never written.
                    }
                    Value::Float(f) => {
                        content.push_str(&format!(
                            "<c r=\"{}\"><v>{}</v></c>",
                            cell_ref,
                            format_number(*f)
                        ));
                    }
                    Value::Text(s) => {
                        let (text, clipped) = clip_text(s);
                        if clipped {
                            report.note_truncation(table.name(), row_num, col as u32 + 1);
                        }
                        let idx = strings.intern(text);
                        content.push_str(&format!(
                            "<c r=\"{}\" t=\"s\"><v>{}</v></c>",
                            cell_ref, idx
                        ));
                    }
                    Value::Blob(bytes) => {
                        // Hex doubles the length, so clip the input first.
                        let keep = bytes.len().min(MAX_CELL_TEXT_LEN / 2);
                        if keep < bytes.len() {
                            report.note_truncation(table.name(), row_num, col as u32 + 1);
                        }
                        let hex = to_hex_upper(&bytes[..keep]);
                        let idx = strings.intern(&hex);
                        content.push_str(&format!(
                            "<c r=\"{}\" t=\"s\"><v>{}</v></c>",
                            cell_ref, idx
                        ));
                    }
                }
            }
            content.push_str("</row>");
            row_num += 1;
        }

        content.push_str("\n    </sheetData>");

        // Filter controls over header plus data; the body is buffered in
        // memory, so the final row count is known by now.
        let last_row = row_num - 1;
        if table.column_count() > 0 {
            let last_col = column_to_letters(table.column_count() as u32 - 1);
            content.push_str(&format!(
                "\n    <autoFilter ref=\"A1:{}{}\"/>",
                last_col, last_row
            ));
        }

        content.push_str("\n</worksheet>");
        content
    }

    fn content_types_xml(sheet_count: usize, has_strings: bool) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        if has_strings {
            content.push_str(
                r#"
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
            );
        }

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");
        content
    }

    fn workbook_xml(sheet_names: &[String]) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, name) in sheet_names.iter().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(name),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        content
    }

    fn workbook_rels_xml(sheet_count: usize, has_strings: bool) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        let styles_rid = sheet_count + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        if has_strings {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
                styles_rid + 1
            ));
        }

        content.push_str(
            r#"
</Relationships>"#,
        );

        content
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

// Two fonts and two cell formats: index 0 is the default, index 1 is bold
// and used by header rows.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="2">
        <font><sz val="11"/><name val="Calibri"/></font>
        <font><b/><sz val="11"/><name val="Calibri"/></font>
    </fonts>
    <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
    <borders count="1"><border/></borders>
    <cellStyleXfs count="1"><xf/></cellStyleXfs>
    <cellXfs count="2">
        <xf fontId="0" fillId="0" borderId="0" xfId="0"/>
        <xf fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
    </cellXfs>
</styleSheet>"#;

/// Clip text to the cell limit, counting characters the way the format does.
fn clip_text(s: &str) -> (&str, bool) {
    match s.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((pos, _)) => (&s[..pos], true),
        None => (s, false),
    }
}

fn to_hex_upper(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        hex.push_str(&format!("{:02X}", b));
    }
    hex
}

/// Format a float with 15 significant digits, the precision spreadsheet
/// applications use for serialized numbers.
fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }

    let exp = v.abs().log10().floor() as i32;
    if (-4..15).contains(&exp) {
        let decimals = (14 - exp).max(0) as usize;
        let s = format!("{:.*}", decimals, v);
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        }
    } else {
        let s = format!("{:.14e}", v);
        match s.split_once('e') {
            Some((mantissa, exponent)) => {
                let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
                format!("{}e{}", mantissa, exponent)
            }
            None => s,
        }
    }
}
