//! Policy text segmentation.
//!
//! A corpus is split on `Section N:` markers. Each section contributes its
//! numbered points, or its sentences when it has none. A corpus that yields
//! nothing that way is segmented line by line instead.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, info};

use crate::clause::{Clause, ClauseKind};
use crate::error::{ClauseError, Result};

#[allow(clippy::expect_used)]
static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Section\s+(\d+):").expect("valid section marker pattern"));

#[allow(clippy::expect_used)]
static NUMBERED_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)\.\s*([^.]+)\.").expect("valid numbered point pattern")
});

#[allow(clippy::expect_used)]
static SECTION_HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Section\s+(\d+)[:.]\s*(.*)$").expect("valid section header pattern")
});

/// Label used by line segmentation before the first section header.
pub const GENERAL_REFERENCE: &str = "General";

/// Configuration for the clause parser.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Sentences must be strictly longer than this many characters.
    pub min_sentence_chars: usize,

    /// Lines must be strictly longer than this many characters.
    pub min_line_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: 20,
            min_line_chars: 30,
        }
    }
}

/// Parses policy text into clauses.
#[derive(Debug, Clone, Default)]
pub struct ClauseParser {
    config: ParserConfig,
}

impl ClauseParser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a policy file.
    ///
    /// Fails with [`ClauseError::NotFound`] when the file is missing and
    /// [`ClauseError::EmptyCorpus`] when no clause can be extracted.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Clause>> {
        if !path.exists() {
            return Err(ClauseError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let clauses = self.parse(&content);
        if clauses.is_empty() {
            return Err(ClauseError::EmptyCorpus(path.to_path_buf()));
        }

        info!("Parsed {} clauses from {}", clauses.len(), path.display());
        Ok(clauses)
    }

    /// Parse policy text.
    pub fn parse(&self, content: &str) -> Vec<Clause> {
        let clauses = self.parse_sections(content);
        if !clauses.is_empty() {
            return clauses;
        }

        debug!("No section clauses found, falling back to line segmentation");
        self.parse_lines(content)
    }

    fn parse_sections(&self, content: &str) -> Vec<Clause> {
        let markers: Vec<(usize, usize, String)> = SECTION_MARKER
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.get(1)?.as_str().to_string();
                Some((whole.start(), whole.end(), number))
            })
            .collect();

        let mut clauses = Vec::new();
        for (i, (_, body_start, number)) in markers.iter().enumerate() {
            let body_end = markers
                .get(i + 1)
                .map_or(content.len(), |(next_start, _, _)| *next_start);
            let body = &content[*body_start..body_end];
            let reference = format!("Section {number}");

            let points = self.extract_points(body, &reference);
            if points.is_empty() {
                clauses.extend(self.extract_sentences(body, &reference));
            } else {
                clauses.extend(points);
            }
        }

        clauses
    }

    fn extract_points(&self, body: &str, reference: &str) -> Vec<Clause> {
        NUMBERED_POINT
            .captures_iter(body)
            .filter_map(|caps| {
                let major = caps.get(1)?.as_str();
                let minor = caps.get(2)?.as_str();
                let text = collapse_whitespace(caps.get(3)?.as_str());
                if text.is_empty() {
                    return None;
                }
                Some(
                    Clause::new(format!("{text}."), reference, ClauseKind::PolicyPoint)
                        .with_point(format!("{major}.{minor}")),
                )
            })
            .collect()
    }

    fn extract_sentences(&self, body: &str, reference: &str) -> Vec<Clause> {
        split_sentences(body)
            .into_iter()
            .map(|sentence| collapse_whitespace(&sentence))
            .filter(|sentence| sentence.chars().count() > self.config.min_sentence_chars)
            .map(|sentence| Clause::new(sentence, reference, ClauseKind::Sentence))
            .collect()
    }

    fn parse_lines(&self, content: &str) -> Vec<Clause> {
        let mut reference = GENERAL_REFERENCE.to_string();
        let mut clauses = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = SECTION_HEADER_LINE.captures(line) {
                let number = caps.get(1).map_or("", |m| m.as_str());
                let title = caps.get(2).map_or("", |m| m.as_str().trim());
                reference = if title.is_empty() {
                    format!("Section {number}")
                } else {
                    format!("Section {number}: {title}")
                };
                continue;
            }

            if is_all_caps(line) || line.chars().count() <= self.config.min_line_chars {
                continue;
            }

            clauses.push(Clause::new(line, reference.as_str(), ClauseKind::Line));
        }

        clauses
    }
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|(_, next)| next.is_whitespace())
        {
            let end = i + c.len_utf8();
            sentences.push(text[start..end].to_string());
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(text[start..].to_string());
    }

    sentences
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && !line.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbered_points() {
        let parser = ClauseParser::new();
        let text = "Section 1: Data Use\n\
                    1.1. Consent must be obtained before processing personal data.\n\
                    1.2. Data must be deleted after thirty days.\n";

        let clauses = parser.parse(text);
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0].text,
            "Consent must be obtained before processing personal data."
        );
        assert_eq!(clauses[0].reference, "Section 1");
        assert_eq!(clauses[0].point.as_deref(), Some("1.1"));
        assert_eq!(clauses[0].kind, ClauseKind::PolicyPoint);
        assert_eq!(clauses[1].point.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_sentence_fallback_filters_short_segments() {
        let parser = ClauseParser::new();
        let text = "Section 2: Security\nBe safe. \
                    All production credentials are stored in the vault! \
                    Who approves access requests for contractors?";

        let clauses = parser.parse(text);
        let texts: Vec<&str> = clauses.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "All production credentials are stored in the vault!",
                "Who approves access requests for contractors?",
            ]
        );
        assert!(clauses.iter().all(|c| c.kind == ClauseKind::Sentence));
        assert!(clauses.iter().all(|c| c.reference == "Section 2"));
    }

    #[test]
    fn test_mixed_sections_choose_strategy_per_section() {
        let parser = ClauseParser::new();
        let text = "Section 1: Points\n1.1. Backups are encrypted at rest.\n\
                    Section 2: Prose\nVendors must sign the data processing agreement first.";

        let clauses = parser.parse(text);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].kind, ClauseKind::PolicyPoint);
        assert_eq!(clauses[1].kind, ClauseKind::Sentence);
        assert_eq!(clauses[1].reference, "Section 2");
    }

    #[test]
    fn test_line_fallback_tracks_headers() {
        let parser = ClauseParser::new();
        let text = "DATA GOVERNANCE POLICY\n\
                    This preamble line is long enough to be a clause.\n\
                    Section 3. Retention\n\
                    Logs are retained for ninety days and then purged.\n\
                    short line\n\
                    ALL CAPS LINES ARE HEADINGS AND ARE SKIPPED ENTIRELY\n";

        let clauses = parser.parse(text);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].reference, GENERAL_REFERENCE);
        assert_eq!(clauses[1].reference, "Section 3: Retention");
        assert_eq!(
            clauses[1].text,
            "Logs are retained for ninety days and then purged."
        );
        assert!(clauses.iter().all(|c| c.kind == ClauseKind::Line));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = ClauseParser::new();
        let text = "Section 1: A\n1.1. First point here.\n1.2. Second point here.";
        assert_eq!(parser.parse(text), parser.parse(text));
    }

    #[test]
    fn test_split_sentences_keeps_terminal_punctuation() {
        let sentences = split_sentences("One. Two! Three?Four");
        assert_eq!(sentences, vec!["One.", " Two!", " Three?Four"]);
    }

    #[test]
    fn test_is_all_caps() {
        assert!(is_all_caps("SECTION OVERVIEW 2024"));
        assert!(!is_all_caps("Section overview"));
        assert!(!is_all_caps("1234 5678"));
    }
}
