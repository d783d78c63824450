//! Sheet-name sanitization and uniqueness

use sheetport_core::MAX_SHEET_NAME_LEN;

use crate::error::{XlsxError, XlsxResult};

/// Characters Excel forbids in sheet names. They are removed outright, not
/// replaced with a placeholder.
const FORBIDDEN: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Upper bound on the " (n)" suffix search. Running off the end means the
/// caller is generating colliding names adversarially.
const MAX_SUFFIX: u32 = 10_000;

/// Assigns valid, workbook-unique tab names in sheet order.
///
/// Uniqueness is checked only against names assigned so far, so which sheet
/// receives which " (n)" suffix depends on assignment order. That ordering
/// is observable in the output workbook and must not be changed to a
/// whole-set check.
#[derive(Debug, Default)]
pub struct SheetNamer {
    assigned: Vec<String>,
}

impl SheetNamer {
    /// Create a namer with no names assigned
    pub fn new() -> Self {
        Self::default()
    }

    /// Names assigned so far, in sheet order
    pub fn names(&self) -> &[String] {
        &self.assigned
    }

    /// Sanitize `raw` and reserve a unique name for the next sheet.
    ///
    /// The result is non-empty, at most 31 characters, free of forbidden
    /// characters, and distinct from every previously assigned name.
    pub fn assign(&mut self, raw: &str) -> XlsxResult<String> {
        let mut name: String = raw
            .trim()
            .chars()
            .filter(|c| !FORBIDDEN.contains(c))
            .collect();

        // Tab names may not begin or end with an apostrophe.
        if name.starts_with('\'') {
            name.remove(0);
        }
        if name.ends_with('\'') {
            name.pop();
        }

        if name.is_empty() {
            name = format!("Sheet{}", self.assigned.len() + 1);
        }

        let name = truncate_chars(&name, MAX_SHEET_NAME_LEN);

        if !self.is_taken(&name) {
            self.assigned.push(name.clone());
            return Ok(name);
        }

        for n in 1..=MAX_SUFFIX {
            let suffix = format!(" ({})", n);
            let base = truncate_chars(&name, MAX_SHEET_NAME_LEN - suffix.chars().count());
            let candidate = format!("{}{}", base, suffix);
            if !self.is_taken(&candidate) {
                self.assigned.push(candidate.clone());
                return Ok(candidate);
            }
        }

        Err(XlsxError::SheetNameExhausted(raw.to_string()))
    }

    fn is_taken(&self, name: &str) -> bool {
        self.assigned.iter().any(|n| n == name)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_characters_removed() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("Sales/Q1:2024").unwrap(), "SalesQ12024");
        assert_eq!(namer.assign("a\\b?c*d[e]f").unwrap(), "abcdef");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("  orders  ").unwrap(), "orders");
    }

    #[test]
    fn test_apostrophes_stripped_at_ends() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("'quoted'").unwrap(), "quoted");
        assert_eq!(namer.assign("it's fine").unwrap(), "it's fine");
    }

    #[test]
    fn test_empty_name_gets_positional_default() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("first").unwrap(), "first");
        assert_eq!(namer.assign("").unwrap(), "Sheet2");
        assert_eq!(namer.assign("://").unwrap(), "Sheet3");
        assert_eq!(namer.assign("'").unwrap(), "Sheet4");
    }

    #[test]
    fn test_truncated_to_31_characters() {
        let mut namer = SheetNamer::new();
        let long = "a".repeat(40);
        let name = namer.assign(&long).unwrap();
        assert_eq!(name.chars().count(), 31);
        assert_eq!(name, "a".repeat(31));
    }

    #[test]
    fn test_collisions_get_numeric_suffixes() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("Data").unwrap(), "Data");
        assert_eq!(namer.assign("Data").unwrap(), "Data (1)");
        assert_eq!(namer.assign("Data").unwrap(), "Data (2)");
        // Different raw names can collide after sanitization too
        assert_eq!(namer.assign("Da:ta").unwrap(), "Data (3)");
    }

    #[test]
    fn test_suffix_respects_length_limit() {
        let mut namer = SheetNamer::new();
        let long = "b".repeat(31);
        assert_eq!(namer.assign(&long).unwrap(), "b".repeat(31));

        let second = namer.assign(&long).unwrap();
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with(" (1)"));
        assert!(second.starts_with(&"b".repeat(27)));
    }
}
