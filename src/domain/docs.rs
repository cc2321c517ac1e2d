//! Documentation presence check.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::traversal::InventoryEntry;

/// Interactive-input line, e.g. `>>> add(1, 2)`.
static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>>>(\s|$)").expect("prompt pattern is valid"));
/// Continuation of a multi-line example input.
static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\.\.\.(\s|$)").expect("continuation pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocPresence {
    pub has_doc: bool,
    pub has_example: bool,
}

impl DocPresence {
    pub fn of(docstring: Option<&str>) -> Self {
        match docstring {
            Some(doc) if !doc.trim().is_empty() => Self {
                has_doc: true,
                has_example: has_example(doc),
            },
            _ => Self::default(),
        }
    }
}

/// True when some `>>>` line is followed (after any `...` continuation
/// lines) by a non-blank line that is not another prompt.
pub fn has_example(docstring: &str) -> bool {
    let lines: Vec<&str> = docstring.lines().collect();
    lines.iter().enumerate().any(|(i, line)| {
        PROMPT.is_match(line)
            && lines[i + 1..]
                .iter()
                .find(|next| !CONTINUATION.is_match(next))
                .is_some_and(|next| !next.trim().is_empty() && !PROMPT.is_match(next))
    })
}

/// Map every entry's qualified name to its documentation presence.
pub fn check_documentation<'e, 'a: 'e, I>(entries: I) -> BTreeMap<String, DocPresence>
where
    I: IntoIterator<Item = &'e InventoryEntry<'a>>,
{
    entries
        .into_iter()
        .map(|entry| (entry.qualified_name.clone(), DocPresence::of(entry.docstring())))
        .collect()
}

/// Totals over a documentation report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocCoverage {
    pub total: usize,
    pub documented: usize,
    pub with_example: usize,
}

impl DocCoverage {
    pub fn from_report(report: &BTreeMap<String, DocPresence>) -> Self {
        report.values().fold(Self::default(), |mut acc, presence| {
            acc.total += 1;
            acc.documented += usize::from(presence.has_doc);
            acc.with_example += usize::from(presence.has_example);
            acc
        })
    }

    /// Share of documented symbols; an empty report counts as fully covered.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.documented as f64 * 100.0 / self.total as f64
        }
    }

    pub fn undocumented(&self) -> usize {
        self.total - self.documented
    }
}

impl fmt::Display for DocCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} documented ({:.1}%), {} with examples",
            self.documented,
            self.total,
            self.percent(),
            self.with_example
        )
    }
}

/// Normalise docstring indentation: the first line is trimmed, the common
/// indent of the remaining lines is removed, blank edge lines dropped.
pub fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or("").trim();
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = std::iter::once(first)
        .chain(rest.iter().map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or_else(|| l.trim_start()).trim_end()
            }
        }))
        .collect();

    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    let start = cleaned.iter().position(|l| !l.is_empty()).unwrap_or(cleaned.len());
    cleaned[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_prompt_followed_by_output_then_has_example() {
        assert!(has_example("Add.\n\n>>> add(1, 2)\n3\n"));
    }

    #[test]
    fn given_prompt_without_output_then_no_example() {
        assert!(!has_example("Add.\n\n>>> add(1, 2)\n"));
        assert!(!has_example(">>> a = 1\n\nmore prose"));
    }

    #[test]
    fn given_continuation_lines_then_output_after_them_counts() {
        assert!(has_example(">>> for i in range(2):\n...     print(i)\n0\n1"));
    }

    #[test]
    fn given_indented_docstring_when_cleaning_then_strips_common_indent() {
        let raw = "Summary line.\n\n        Details here.\n          nested\n    ";
        assert_eq!(
            clean_docstring(raw),
            "Summary line.\n\nDetails here.\n  nested"
        );
    }

    #[test]
    fn given_empty_report_then_coverage_is_full() {
        let coverage = DocCoverage::from_report(&BTreeMap::new());
        assert_eq!(coverage.total, 0);
        assert_eq!(coverage.percent(), 100.0);
    }
}
