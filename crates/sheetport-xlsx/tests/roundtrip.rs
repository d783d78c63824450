//! Encode/decode round trips over in-memory workbooks.

use std::io::{Cursor, Read, Write};

use sheetport_core::{Table, Value, MAX_CELL_TEXT_LEN};
use sheetport_xlsx::{SheetSelection, XlsxError, XlsxReader, XlsxWriter};

fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
    let mut t = Table::new(name, columns.iter().map(|c| c.to_string()).collect());
    for row in rows {
        t.push_row(row);
    }
    t
}

fn write_to_buffer(tables: &[Table]) -> Cursor<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    XlsxWriter::write(tables, &mut buf).unwrap();
    buf.set_position(0);
    buf
}

fn roundtrip(tables: &[Table]) -> sheetport_xlsx::ImportedWorkbook {
    XlsxReader::read(write_to_buffer(tables)).unwrap()
}

/// Build an archive from raw (name, content) parts, for decode-only cases.
fn archive(parts: &[(&str, &str)]) -> Cursor<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut buf);
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(name.to_string(), options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buf.set_position(0);
    buf
}

fn read_part(buf: &mut Cursor<Vec<u8>>, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(buf).unwrap();
    let mut part = zip.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

const WORKBOOK_ONE_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="data" sheetId="1" r:id="rId1"/>
    </sheets>
</workbook>"#;

fn sheet_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{}</sheetData></worksheet>",
        body
    )
}

#[test]
fn basic_round_trip() {
    let people = table(
        "people",
        &["id", "name", "score"],
        vec![
            vec![Value::Int(1), Value::text("ada"), Value::Float(9.5)],
            vec![Value::Int(2), Value::text("grace"), Value::Float(7.25)],
        ],
    );
    let counts = table(
        "counts",
        &["n"],
        vec![vec![Value::Int(10)], vec![Value::Int(20)]],
    );

    let imported = roundtrip(&[people.clone(), counts.clone()]);

    assert!(imported.skipped.is_empty());
    assert_eq!(imported.tables.len(), 2);
    assert_eq!(imported.tables[0], people);
    assert_eq!(imported.tables[1], counts);
}

#[test]
fn nulls_survive_as_nulls() {
    let t = table(
        "t",
        &["a", "b", "c"],
        vec![vec![Value::Int(1), Value::Null, Value::text("x")]],
    );

    let imported = roundtrip(&[t]);
    let got = &imported.tables[0];

    // Null, not an empty string and not zero
    assert_eq!(got.value_at(0, 0), &Value::Int(1));
    assert_eq!(got.value_at(0, 1), &Value::Null);
    assert_eq!(got.value_at(0, 2), &Value::text("x"));
}

#[test]
fn null_cells_are_not_emitted() {
    let t = table(
        "t",
        &["a", "b"],
        vec![vec![Value::Int(1), Value::Null]],
    );

    let mut buf = write_to_buffer(&[t]);
    let sheet = read_part(&mut buf, "xl/worksheets/sheet1.xml");

    assert!(sheet.contains("<c r=\"A2\">"));
    assert!(!sheet.contains("<c r=\"B2\""));
}

#[test]
fn oversized_text_is_clipped_once() {
    let long = "x".repeat(40_000);
    let t = table("t", &["body"], vec![vec![Value::text(long.clone())]]);

    let mut out = Cursor::new(Vec::new());
    let report = XlsxWriter::write(&[t], &mut out).unwrap();
    assert_eq!(report.cells_truncated, 1);
    let site = report.first_truncation.as_ref().unwrap();
    assert_eq!((site.row, site.column), (2, 1));

    out.set_position(0);
    let imported = XlsxReader::read(out).unwrap();
    let got = imported.tables[0].value_at(0, 0).as_text().unwrap();

    // Exactly the first 32767 characters, unchanged on decode
    assert_eq!(got.len(), MAX_CELL_TEXT_LEN);
    assert_eq!(got, &long[..MAX_CELL_TEXT_LEN]);
}

#[test]
fn float_precision_round_trips() {
    let t = table(
        "t",
        &["v"],
        vec![
            vec![Value::Float(0.1)],
            vec![Value::Float(-2.25)],
            vec![Value::Float(1.0 / 3.0)],
            vec![Value::Float(1e20)],
        ],
    );

    let imported = roundtrip(&[t]);
    let got = &imported.tables[0];

    assert_eq!(got.value_at(0, 0), &Value::Float(0.1));
    assert_eq!(got.value_at(1, 0), &Value::Float(-2.25));
    let third = got.value_at(2, 0).as_float().unwrap();
    assert!((third - 1.0 / 3.0).abs() < 1e-14);
    assert_eq!(got.value_at(3, 0), &Value::Float(1e20));
}

#[test]
fn blobs_export_as_hex_text() {
    let t = table("bin", &["data"], vec![vec![Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF])]]);

    let imported = roundtrip(&[t]);
    assert_eq!(imported.tables[0].value_at(0, 0), &Value::text("DEADBEEF"));
}

#[test]
fn colliding_table_names_get_suffixes() {
    let a = table("Data", &["x"], vec![vec![Value::Int(1)]]);
    let b = table("Data", &["x"], vec![vec![Value::Int(2)]]);

    let mut buf = write_to_buffer(&[a, b]);
    let entries = XlsxReader::sheet_names(&mut buf).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Data");
    assert_eq!(entries[1].name, "Data (1)");

    buf.set_position(0);
    let imported = XlsxReader::read(buf).unwrap();
    assert_eq!(imported.tables[0].name(), "Data");
    assert_eq!(imported.tables[1].name(), "Data (1)");
}

#[test]
fn sanitized_sheet_names_round_trip() {
    let t = table("Sales/Q1:2024", &["x"], vec![vec![Value::Int(1)]]);

    let mut buf = write_to_buffer(&[t]);
    let entries = XlsxReader::sheet_names(&mut buf).unwrap();
    assert_eq!(entries[0].name, "SalesQ12024");
}

#[test]
fn selection_by_name_and_position() {
    let tables = [
        table("one", &["a"], vec![vec![Value::Int(1)]]),
        table("two", &["a"], vec![vec![Value::Int(2)]]),
        table("three", &["a"], vec![vec![Value::Int(3)]]),
    ];

    let mut buf = write_to_buffer(&tables);
    let by_name = XlsxReader::read_selected(
        &mut buf,
        &SheetSelection::Names(vec!["two".to_string()]),
    )
    .unwrap();
    assert_eq!(by_name.tables.len(), 1);
    assert_eq!(by_name.tables[0].name(), "two");

    buf.set_position(0);
    let by_position =
        XlsxReader::read_selected(&mut buf, &SheetSelection::Positions(vec![1, 3])).unwrap();
    assert_eq!(by_position.tables.len(), 2);
    assert_eq!(by_position.tables[0].name(), "one");
    assert_eq!(by_position.tables[1].name(), "three");
}

#[test]
fn header_is_bold_and_autofiltered() {
    let t = table(
        "t",
        &["a", "b", "c"],
        vec![vec![Value::Int(1)], vec![Value::Int(2)]],
    );

    let mut buf = write_to_buffer(&[t]);
    let sheet = read_part(&mut buf, "xl/worksheets/sheet1.xml");

    assert!(sheet.contains("<c r=\"A1\" t=\"s\" s=\"1\">"));
    assert!(sheet.contains("<c r=\"C1\" t=\"s\" s=\"1\">"));
    assert!(sheet.contains("<autoFilter ref=\"A1:C3\"/>"));
}

#[test]
fn shared_strings_are_deduplicated() {
    let t = table(
        "t",
        &["word"],
        vec![
            vec![Value::text("repeat")],
            vec![Value::text("repeat")],
            vec![Value::text("repeat")],
        ],
    );

    let mut buf = write_to_buffer(&[t]);
    let sst = read_part(&mut buf, "xl/sharedStrings.xml");

    // One header string + one data string; four referencing cells
    assert!(sst.contains("count=\"4\""));
    assert!(sst.contains("uniqueCount=\"2\""));
    assert_eq!(sst.matches("repeat").count(), 1);
}

#[test]
fn empty_workbook_round_trips() {
    let imported = roundtrip(&[]);
    assert!(imported.tables.is_empty());
    assert!(imported.skipped.is_empty());
}

#[test]
fn sparse_rows_gap_fill_to_dense() {
    let sheet = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="B1" t="inlineStr"><is><t>val</t></is></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="C2"><v>2</v></c><c r="F2"><v>3</v></c></row>"#,
    );
    let buf = archive(&[
        ("xl/workbook.xml", WORKBOOK_ONE_SHEET),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();
    let got = &imported.tables[0];

    assert_eq!(
        got.columns(),
        ["id", "val", "col3", "col4", "col5", "col6"]
    );
    let row: Vec<_> = (0..6).map(|c| got.value_at(0, c).clone()).collect();
    assert_eq!(
        row,
        vec![
            Value::Int(1),
            Value::Null,
            Value::Int(2),
            Value::Null,
            Value::Null,
            Value::Int(3),
        ]
    );
}

#[test]
fn empty_row_elements_keep_their_slot() {
    let sheet = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>n</t></is></c></row>
<row r="2"/>
<row r="4"><c r="A4"><v>5</v></c></row>"#,
    );
    let buf = archive(&[
        ("xl/workbook.xml", WORKBOOK_ONE_SHEET),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();
    let got = &imported.tables[0];

    // Rows 2 and 3 exist as all-null slots; row 4 carries the value
    assert_eq!(got.row_count(), 3);
    assert_eq!(got.value_at(0, 0), &Value::Null);
    assert_eq!(got.value_at(1, 0), &Value::Null);
    assert_eq!(got.value_at(2, 0), &Value::Int(5));
}

#[test]
fn duplicate_and_empty_headers_are_disambiguated() {
    let sheet = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="C1" t="inlineStr"><is><t>id</t></is></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>2</v></c><c r="C2"><v>3</v></c></row>"#,
    );
    let buf = archive(&[
        ("xl/workbook.xml", WORKBOOK_ONE_SHEET),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();
    assert_eq!(imported.tables[0].columns(), ["id", "col2", "id_1"]);
}

#[test]
fn out_of_order_cells_skip_only_that_sheet() {
    let bad = sheet_xml(
        r#"<row r="1"><c r="C1"><v>1</v></c><c r="B1"><v>2</v></c></row>"#,
    );
    let good = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>n</t></is></c></row>
<row r="2"><c r="A2"><v>7</v></c></row>"#,
    );
    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheets>
        <sheet name="bad" sheetId="1"/>
        <sheet name="good" sheetId="2"/>
    </sheets>
</workbook>"#;
    let buf = archive(&[
        ("xl/workbook.xml", workbook),
        ("xl/worksheets/sheet1.xml", &bad),
        ("xl/worksheets/sheet2.xml", &good),
    ]);

    let imported = XlsxReader::read(buf).unwrap();

    assert_eq!(imported.tables.len(), 1);
    assert_eq!(imported.tables[0].name(), "good");
    assert_eq!(imported.skipped.len(), 1);
    assert_eq!(imported.skipped[0].name, "bad");
    assert!(matches!(
        imported.skipped[0].error,
        XlsxError::MalformedReference(_)
    ));
}

#[test]
fn unresolvable_shared_string_skips_the_sheet() {
    let sheet = sheet_xml(r#"<row r="1"><c r="A1" t="s"><v>99</v></c></row>"#);
    let buf = archive(&[
        ("xl/workbook.xml", WORKBOOK_ONE_SHEET),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();

    assert!(imported.tables.is_empty());
    assert_eq!(imported.skipped.len(), 1);
    assert!(matches!(
        imported.skipped[0].error,
        XlsxError::SharedStringIndex(99, 0)
    ));
}

#[test]
fn missing_workbook_part_is_fatal() {
    let sheet = sheet_xml(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#);
    let buf = archive(&[("xl/worksheets/sheet1.xml", &sheet)]);

    assert!(matches!(
        XlsxReader::read(buf),
        Err(XlsxError::MissingPart(_))
    ));
}

#[test]
fn missing_shared_strings_part_is_not_fatal() {
    // Inline and numeric cells only; no xl/sharedStrings.xml anywhere
    let sheet = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>label</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>inline text</t></is></c></row>"#,
    );
    let buf = archive(&[
        ("xl/workbook.xml", WORKBOOK_ONE_SHEET),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();
    assert_eq!(imported.tables[0].value_at(0, 0), &Value::text("inline text"));
}

#[test]
fn position_locates_the_part_not_the_declared_id() {
    // The declared sheetId lies; document position still maps to sheet1.xml
    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheets>
        <sheet name="only" sheetId="42"/>
    </sheets>
</workbook>"#;
    let sheet = sheet_xml(
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>n</t></is></c></row>
<row r="2"><c r="A2"><v>9</v></c></row>"#,
    );
    let buf = archive(&[
        ("xl/workbook.xml", workbook),
        ("xl/worksheets/sheet1.xml", &sheet),
    ]);

    let imported = XlsxReader::read(buf).unwrap();
    assert_eq!(imported.tables.len(), 1);
    assert_eq!(imported.tables[0].value_at(0, 0), &Value::Int(9));
}

#[test]
fn file_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let t = table(
        "t",
        &["id", "note"],
        vec![vec![Value::Int(1), Value::text("on disk")]],
    );
    XlsxWriter::write_file(&[t.clone()], &path).unwrap();

    let imported = XlsxReader::read_file(&path).unwrap();
    assert_eq!(imported.tables[0], t);
}
