//! In-memory document and selection model
//!
//! The document is a single HTML string. Edits, imports and accepted
//! suggestions all replace it wholesale; there is no history beyond the
//! editor's own undo stack.

use std::fmt;

/// Where the current document came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentSource {
    #[default]
    Blank,
    Preset(String),
    Upload(String),
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Blank => write!(f, "Untitled"),
            DocumentSource::Preset(label) => write!(f, "{}", label),
            DocumentSource::Upload(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentState {
    html: String,
    pub source: DocumentSource,
    /// An import is running; the editor shows a loading indicator
    pub loading: bool,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Record an edit made through the editor
    pub fn set_html(&mut self, html: String) {
        self.html = html;
    }

    /// Replace the whole document with imported content
    pub fn load(&mut self, html: String, source: DocumentSource) {
        self.html = html;
        self.source = source;
        self.loading = false;
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Editor position as (row, column), column counted in chars
pub type Position = (usize, usize);

/// A range of the document source, start before end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: Position,
    pub end: Position,
}

impl SelectionRange {
    /// Build a range from two positions in either order
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte offsets of this range in `lines` joined with `\n`
    pub fn byte_range(&self, lines: &[String]) -> std::ops::Range<usize> {
        byte_offset(lines, self.start)..byte_offset(lines, self.end)
    }
}

/// Byte offset of a position in `lines` joined with `\n`, clamped to the text
pub fn byte_offset(lines: &[String], (row, col): Position) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let row = row.min(lines.len() - 1);
    let preceding: usize = lines[..row].iter().map(|line| line.len() + 1).sum();
    let line = &lines[row];
    let within = line
        .char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    preceding + within
}

/// Position of a byte offset in `lines` joined with `\n`, clamped to the text
pub fn position_at(lines: &[String], offset: usize) -> Position {
    let mut remaining = offset;
    for (row, line) in lines.iter().enumerate() {
        if remaining <= line.len() {
            let col = line
                .char_indices()
                .take_while(|(i, _)| *i < remaining)
                .count();
            return (row, col);
        }
        remaining -= line.len() + 1;
    }
    let last = lines.len().saturating_sub(1);
    (last, lines.last().map_or(0, |line| line.chars().count()))
}

/// The user's current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// What a reader sees: tags stripped, entities decoded, whitespace collapsed
    pub text: String,
    /// The selected source markup
    pub html: String,
    pub range: SelectionRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(String::from).collect()
    }

    #[test]
    fn test_load_replaces_content_and_clears_loading() {
        let mut doc = DocumentState::new();
        doc.set_html("<p>old</p>".to_string());
        doc.loading = true;

        doc.load("<p>new</p>".to_string(), DocumentSource::Preset("Sample Document".into()));

        assert_eq!(doc.html(), "<p>new</p>");
        assert!(!doc.loading);
        assert_eq!(doc.source.to_string(), "Sample Document");
    }

    #[test]
    fn test_blank_document_is_empty() {
        let doc = DocumentState::new();
        assert!(doc.is_empty());
        assert_eq!(doc.source.to_string(), "Untitled");
    }

    #[test]
    fn test_range_orders_positions() {
        let range = SelectionRange::new((2, 1), (0, 4));
        assert_eq!(range.start, (0, 4));
        assert_eq!(range.end, (2, 1));
    }

    #[test]
    fn test_byte_offset_across_lines() {
        let lines = lines("<p>a</p>\n<p>bc</p>");
        assert_eq!(byte_offset(&lines, (0, 0)), 0);
        assert_eq!(byte_offset(&lines, (1, 0)), 9);
        assert_eq!(byte_offset(&lines, (1, 4)), 13);
        // Past the end of the line clamps to its end
        assert_eq!(byte_offset(&lines, (0, 99)), 8);
    }

    #[test]
    fn test_byte_offset_counts_chars_not_bytes() {
        let lines = lines("héllo");
        assert_eq!(byte_offset(&lines, (0, 2)), 3);
    }

    #[test]
    fn test_position_at_inverts_byte_offset() {
        let lines = lines("<p>héllo</p>\n<p>bc</p>");
        for position in [(0, 0), (0, 5), (0, 12), (1, 0), (1, 4)] {
            assert_eq!(position_at(&lines, byte_offset(&lines, position)), position);
        }
        assert_eq!(position_at(&lines, 999), (1, 9));
    }

    #[test]
    fn test_byte_range_slices_joined_text() {
        let lines = lines("<p>Kesimpta\ndose</p>");
        let joined = lines.join("\n");
        let range = SelectionRange::new((0, 3), (1, 4)).byte_range(&lines);
        assert_eq!(&joined[range], "Kesimpta\ndose");
    }
}
