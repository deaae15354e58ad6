#![forbid(unsafe_code)]

//! Similar-line grouping for summaries.
//!
//! Key extraction only, no similarity scoring:
//!
//! | Line                          | Key                               |
//! |-------------------------------|-----------------------------------|
//! | trimmed text under 10 chars   | `short_<kind>`                    |
//! | error/warning with file:line  | the `file:line` token             |
//! | other error/warning           | first two whitespace tokens       |
//! | anything else                 | first whitespace token            |

use std::collections::BTreeMap;

use readout_core::{OutputKind, OutputLine};

use crate::classifier::LineClassifier;

/// Lines shorter than this (in characters, after trimming) group by kind.
pub const SHORT_LINE_CHARS: usize = 10;

impl LineClassifier {
    /// Group lines by a coarse key. Groups keep input order.
    #[must_use]
    pub fn find_similar_lines<'a>(
        &self,
        lines: &'a [OutputLine],
    ) -> BTreeMap<String, Vec<&'a OutputLine>> {
        let mut groups: BTreeMap<String, Vec<&'a OutputLine>> = BTreeMap::new();
        for line in lines {
            groups.entry(self.similarity_key(line)).or_default().push(line);
        }
        groups
    }

    /// The grouping key [`find_similar_lines`](Self::find_similar_lines) uses.
    #[must_use]
    pub fn similarity_key(&self, line: &OutputLine) -> String {
        let text = line.text();
        if text.chars().count() < SHORT_LINE_CHARS {
            return format!("short_{}", line.kind);
        }
        let mut tokens = text.split_whitespace();
        match line.kind {
            OutputKind::Error | OutputKind::Warning => {
                if let Some(token) = self.file_line_token(text) {
                    return token;
                }
                match (tokens.next(), tokens.next()) {
                    (Some(a), Some(b)) => format!("{a} {b}"),
                    (Some(a), None) => a.to_string(),
                    _ => String::new(),
                }
            }
            _ => tokens.next().unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readout_core::LineContext;

    fn line(content: &str, kind: OutputKind) -> OutputLine {
        OutputLine::new(content, kind, LineContext::default())
    }

    #[test]
    fn short_lines_group_by_kind() {
        let c = LineClassifier::default();
        assert_eq!(c.similarity_key(&line("ok", OutputKind::Success)), "short_success");
        assert_eq!(c.similarity_key(&line("   boom!   ", OutputKind::Error)), "short_error");
    }

    #[test]
    fn errors_group_by_location() {
        let c = LineClassifier::default();
        let lines = vec![
            line("main.go:42: undefined variable x", OutputKind::Error),
            line("main.go:42: undefined variable y", OutputKind::Error),
            line("util.go:7: unused import", OutputKind::Warning),
        ];
        let groups = c.find_similar_lines(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["main.go:42"].len(), 2);
        assert_eq!(groups["util.go:7"].len(), 1);
    }

    #[test]
    fn errors_without_location_use_two_tokens() {
        let c = LineClassifier::default();
        assert_eq!(
            c.similarity_key(&line("npm ERR! code ENOENT", OutputKind::Error)),
            "npm ERR!"
        );
        assert_eq!(
            c.similarity_key(&line("segmentation_fault_in_worker", OutputKind::Error)),
            "segmentation_fault_in_worker"
        );
    }

    #[test]
    fn other_lines_use_first_token() {
        let c = LineClassifier::default();
        let lines = vec![
            line("   Compiling serde v1.0.200", OutputKind::Info),
            line("   Compiling regex v1.11.0", OutputKind::Info),
            line("Downloaded 12 crates", OutputKind::Info),
        ];
        let groups = c.find_similar_lines(&lines);
        assert_eq!(groups["Compiling"].len(), 2);
        assert_eq!(groups["Downloaded"].len(), 1);
    }

    #[test]
    fn groups_preserve_input_order() {
        let c = LineClassifier::default();
        let lines = vec![
            line("Compiling first crate", OutputKind::Info),
            line("Compiling second crate", OutputKind::Info),
        ];
        let groups = c.find_similar_lines(&lines);
        let contents: Vec<_> = groups["Compiling"].iter().map(|l| l.content.as_str()).collect();
        assert_eq!(contents, vec!["Compiling first crate", "Compiling second crate"]);
    }

    #[test]
    fn empty_input() {
        assert!(LineClassifier::default().find_similar_lines(&[]).is_empty());
    }
}
