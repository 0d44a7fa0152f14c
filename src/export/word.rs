/// Wrap editor HTML so Word opens it as a document
///
/// The leading byte order mark makes Word pick UTF-8.
pub fn word_envelope(html: &str) -> String {
    format!("\u{feff}<html><body>{}</body></html>", html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_layout() {
        let doc = word_envelope("<p>Kesimpta</p>");
        assert!(doc.starts_with('\u{feff}'));
        assert_eq!(
            doc.trim_start_matches('\u{feff}'),
            "<html><body><p>Kesimpta</p></body></html>"
        );
    }

    #[test]
    fn test_envelope_bytes_start_with_utf8_bom() {
        let doc = word_envelope("");
        assert_eq!(&doc.as_bytes()[..3], &[0xEF, 0xBB, 0xBF]);
    }
}
