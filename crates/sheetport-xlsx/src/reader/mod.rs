//! XLSX reader

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use sheetport_core::{CellRef, Table, Value};

use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::SharedStrings;

/// One entry of the workbook index: a sheet's declared name and its
/// 1-based position in document order.
///
/// Position - never the declared sheetId attribute - locates the sheet's
/// part at `xl/worksheets/sheet{N}.xml`. The two can disagree, and only
/// position reliably maps to the physical part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// 1-based position in workbook order
    pub position: usize,
    /// Declared sheet name
    pub name: String,
}

/// Which sheets of a workbook to decode
#[derive(Debug, Clone, Default)]
pub enum SheetSelection {
    /// Every sheet, in workbook order
    #[default]
    All,
    /// Sheets matching any of the given names
    Names(Vec<String>),
    /// Sheets at the given 1-based positions
    Positions(Vec<usize>),
}

impl SheetSelection {
    fn matches(&self, entry: &SheetEntry) -> bool {
        match self {
            SheetSelection::All => true,
            SheetSelection::Names(names) => names.iter().any(|n| n == &entry.name),
            SheetSelection::Positions(positions) => positions.contains(&entry.position),
        }
    }
}

/// A sheet that failed to decode. The rest of the workbook is unaffected.
#[derive(Debug)]
pub struct SkippedSheet {
    /// Declared sheet name
    pub name: String,
    /// Why the sheet was skipped
    pub error: XlsxError,
}

/// Decoded workbook: one table per successfully decoded sheet, in workbook
/// order, plus the sheets that were skipped and why.
#[derive(Debug, Default)]
pub struct ImportedWorkbook {
    /// Successfully decoded sheets
    pub tables: Vec<Table>,
    /// Sheets that failed sheet-scoped decoding
    pub skipped: Vec<SkippedSheet>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read every sheet of a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<ImportedWorkbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read selected sheets of a workbook from a file path
    pub fn read_file_selected<P: AsRef<Path>>(
        path: P,
        selection: &SheetSelection,
    ) -> XlsxResult<ImportedWorkbook> {
        let file = File::open(path)?;
        Self::read_selected(file, selection)
    }

    /// Read every sheet of a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<ImportedWorkbook> {
        Self::read_selected(reader, &SheetSelection::All)
    }

    /// Read selected sheets of a workbook.
    ///
    /// Sheets are decoded independently: a malformed sheet is recorded in
    /// the result and skipped without disturbing the others. A missing
    /// workbook part is fatal; a missing shared-strings part is not (a
    /// workbook with only numeric or inline cells legitimately omits it).
    pub fn read_selected<R: Read + Seek>(
        reader: R,
        selection: &SheetSelection,
    ) -> XlsxResult<ImportedWorkbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let strings = Self::read_shared_strings(&mut archive)?;
        let index = Self::read_workbook_index(&mut archive)?;

        let mut imported = ImportedWorkbook::default();
        for entry in &index {
            if !selection.matches(entry) {
                continue;
            }

            let path = format!("xl/worksheets/sheet{}.xml", entry.position);
            debug!("decoding sheet '{}' from {}", entry.name, path);

            match Self::read_worksheet(&mut archive, &path, &entry.name, &strings) {
                Ok(Some(table)) => imported.tables.push(table),
                Ok(None) => {
                    warn!("sheet '{}' is empty, skipping", entry.name);
                }
                Err(e) => {
                    warn!("failed to decode sheet '{}': {}", entry.name, e);
                    imported.skipped.push(SkippedSheet {
                        name: entry.name.clone(),
                        error: e,
                    });
                }
            }
        }

        Ok(imported)
    }

    /// List the workbook's sheets without decoding any cells
    pub fn sheet_names<R: Read + Seek>(reader: R) -> XlsxResult<Vec<SheetEntry>> {
        let mut archive = zip::ZipArchive::new(reader)?;
        Self::read_workbook_index(&mut archive)
    }

    /// Read the shared strings table (if present)
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<SharedStrings> {
        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(SharedStrings::new()), // No shared strings is valid
        };
        SharedStrings::read(BufReader::new(file))
    }

    /// Read workbook.xml: sheet names in document order, positions assigned
    /// sequentially from 1
    fn read_workbook_index<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut entries = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            if let Ok(name) = attr.unescape_value() {
                                entries.push(SheetEntry {
                                    position: entries.len() + 1,
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(entries)
    }

    /// Decode one sheet part into a dense table.
    ///
    /// Returns `None` for a sheet with no rows or no columns.
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        sheet_name: &str,
        strings: &SharedStrings,
    ) -> XlsxResult<Option<Table>> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();

        // The grid under construction. Rows are materialized up to the
        // highest row number seen, even when entirely empty; a row's cell
        // count doubles as the column cursor for gap filling.
        let mut grid: Vec<Vec<Value>> = Vec::new();
        let mut current_row: usize = 0; // 1-based; 0 = outside any row

        // Current cell state
        let mut cell_ref: Option<String> = None;
        let mut cell_type: Option<String> = None;
        let mut payload: Option<String> = None;
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.name().as_ref() == b"row" =>
                {
                    let declared = e.attributes().flatten().find_map(|attr| {
                        if attr.key.as_ref() == b"r" {
                            attr.unescape_value().ok()?.parse::<usize>().ok()
                        } else {
                            None
                        }
                    });
                    // A row element with no cells still occupies its slot.
                    current_row = declared.unwrap_or(grid.len() + 1).max(1);
                    while grid.len() < current_row {
                        grid.push(Vec::new());
                    }
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"c" => {
                    in_cell = true;
                    cell_ref = None;
                    cell_type = None;
                    payload = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                cell_ref = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            b"t" => {
                                cell_type = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {
                    // Self-closing cell: address only, no payload.
                    let mut empty_ref: Option<String> = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            empty_ref = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                    }
                    if current_row > 0 {
                        let row = &mut grid[current_row - 1];
                        append_cell(row, empty_ref.as_deref(), None, None, strings)?;
                    }
                }
                Ok(Event::Start(e)) if in_cell => match e.name().as_ref() {
                    b"v" => {
                        in_value = true;
                        payload.get_or_insert_with(String::new);
                    }
                    b"is" => {
                        in_inline_str = true;
                    }
                    b"t" if in_inline_str => {
                        in_inline_text = true;
                        payload.get_or_insert_with(String::new);
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if current_row > 0 {
                            let row = &mut grid[current_row - 1];
                            append_cell(
                                row,
                                cell_ref.as_deref(),
                                cell_type.as_deref(),
                                payload.as_deref(),
                                strings,
                            )?;
                        }
                        in_cell = false;
                    }
                    b"v" => {
                        in_value = false;
                    }
                    b"is" => {
                        in_inline_str = false;
                    }
                    b"t" if in_inline_str => {
                        in_inline_text = false;
                    }
                    b"row" => {
                        current_row = 0;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Ok(text) = e.unescape() {
                        payload.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if grid.is_empty() {
            return Ok(None);
        }

        let width = grid.iter().map(|r| r.len()).max().unwrap_or(0);
        if width == 0 {
            return Ok(None);
        }

        let mut rows = grid.into_iter();
        let header = rows.next().unwrap_or_default();
        let columns = column_names(&header, width);

        let mut table = Table::new(sheet_name, columns);
        for row in rows {
            table.push_row(row);
        }
        Ok(Some(table))
    }
}

/// Gap-fill and append one decoded cell to its row.
///
/// The row's current length is the column cursor: the number of implicit
/// nulls between the cursor and the cell's column is `col - len`. A
/// negative gap means an out-of-order or duplicate reference, which is a
/// decode error for this sheet.
fn append_cell(
    row: &mut Vec<Value>,
    cell_ref: Option<&str>,
    cell_type: Option<&str>,
    payload: Option<&str>,
    strings: &SharedStrings,
) -> XlsxResult<()> {
    let col = match cell_ref {
        Some(r) => {
            CellRef::parse(r)
                .map_err(|_| XlsxError::MalformedReference(r.to_string()))?
                .col as usize
        }
        // No address: the cell lands in the next column.
        None => row.len(),
    };

    if col < row.len() {
        return Err(XlsxError::MalformedReference(format!(
            "cell reference '{}' is out of order",
            cell_ref.unwrap_or("?")
        )));
    }

    for _ in row.len()..col {
        row.push(Value::Null);
    }
    row.push(classify_cell(cell_type, payload, strings)?);
    Ok(())
}

/// Map a cell's type tag and payload to a typed value
fn classify_cell(
    cell_type: Option<&str>,
    payload: Option<&str>,
    strings: &SharedStrings,
) -> XlsxResult<Value> {
    let payload = match payload {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(Value::Null),
    };

    match cell_type {
        Some("s") => {
            let idx: u32 = payload.trim().parse().map_err(|_| {
                XlsxError::MalformedReference(format!(
                    "invalid shared string index '{}'",
                    payload
                ))
            })?;
            Ok(Value::Text(strings.resolve(idx)?.to_string()))
        }
        Some("inlineStr") | Some("str") => Ok(Value::Text(payload.to_string())),
        Some("b") => Ok(Value::Int(i64::from(payload.trim() != "0"))),
        _ => Ok(parse_number(payload)),
    }
}

/// Numbers keep their integer identity when they have one
fn parse_number(s: &str) -> Value {
    let t = s.trim();
    if let Ok(i) = t.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = t.parse::<f64>() {
        Value::Float(f)
    } else {
        // Not a number after all; some producers omit the type tag.
        Value::Text(s.to_string())
    }
}

/// Column names from the header row: resolved cell text, `col{N}` for empty
/// slots, and `_{n}` suffixes for duplicates of an earlier column.
///
/// Like sheet naming, disambiguation is sequential: column `i` only checks
/// against columns before it.
fn column_names(header: &[Value], width: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(width);

    for i in 0..width {
        let base = match header.get(i) {
            Some(Value::Text(s)) if !s.is_empty() => s.clone(),
            Some(Value::Int(n)) => n.to_string(),
            Some(Value::Float(f)) => f.to_string(),
            _ => format!("col{}", i + 1),
        };

        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        names.push(name);
    }

    names
}
