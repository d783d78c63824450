//! Workbook-level shared string table

use std::io::BufRead;

use ahash::AHashMap;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::escape_xml;

/// Deduplicating, insertion-ordered string table shared by every sheet in a
/// workbook.
///
/// Indices are stable for the lifetime of one export or one parsed import:
/// once [`SharedStrings::intern`] hands out an index, that index refers to
/// the same string until the table is dropped. Cells store the index, never
/// the string itself.
#[derive(Debug, Default)]
pub struct SharedStrings {
    entries: Vec<String>,
    index: AHashMap<String, u32>,
    /// Referencing cells, not unique entries; the two counts are
    /// serialized separately.
    total_refs: u64,
}

impl SharedStrings {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its stable index.
    ///
    /// Each call counts one cell reference, so the serialized `count`
    /// attribute reflects referencing cells rather than unique strings.
    pub fn intern(&mut self, s: &str) -> u32 {
        self.total_refs += 1;

        if let Some(&idx) = self.index.get(s) {
            return idx;
        }

        let idx = self.entries.len() as u32;
        self.entries.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    /// Look up a previously interned or parsed string.
    ///
    /// An out-of-range index means the source document is malformed.
    pub fn resolve(&self, idx: u32) -> XlsxResult<&str> {
        self.entries
            .get(idx as usize)
            .map(|s| s.as_str())
            .ok_or(XlsxError::SharedStringIndex(idx, self.entries.len()))
    }

    /// Number of distinct strings
    pub fn unique_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of cells that referenced the table
    pub fn total_references(&self) -> u64 {
        self.total_refs
    }

    /// Check if the table holds no strings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as the content of xl/sharedStrings.xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.entries.len() * 32);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        xml.push_str(&format!(
            "<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{}\" uniqueCount=\"{}\">",
            self.total_refs,
            self.entries.len()
        ));

        for entry in &self.entries {
            // Leading/trailing whitespace must survive an XML round trip.
            let preserve = entry.starts_with(char::is_whitespace)
                || entry.ends_with(char::is_whitespace);
            if preserve {
                xml.push_str("<si><t xml:space=\"preserve\">");
            } else {
                xml.push_str("<si><t>");
            }
            xml.push_str(&escape_xml(entry));
            xml.push_str("</t></si>");
        }

        xml.push_str("</sst>");
        xml
    }

    /// Parse xl/sharedStrings.xml
    pub fn read<R: BufRead>(reader: R) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"t" if in_si => {
                        in_t = true;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    b"t" => {
                        in_t = false;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        let mut table = Self::default();
        for s in strings {
            // Positions come from the document; a duplicate entry keeps its
            // first index in the lookup but still occupies its slot.
            let idx = table.entries.len() as u32;
            table.index.entry(s.clone()).or_insert(idx);
            table.entries.push(s);
        }
        Ok(table)
    }
}
