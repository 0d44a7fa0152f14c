//! Lightweight HTML scanning
//!
//! The document is kept as HTML source. These helpers tokenize it just far
//! enough to project a source range onto the plain text a reader sees, to
//! rewrap a correction for splicing back, to locate remote images and to
//! flatten the markup into text and image blocks for PDF layout. No tree is
//! built.

use memchr::memchr;

/// A piece of the HTML source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Character data, still entity-encoded. `start` is the byte offset.
    Text { text: &'a str, start: usize },
    /// A tag, comment or doctype spanning `start..end`
    Tag(Tag<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Lowercased element name; empty for comments and doctypes
    pub name: String,
    pub closing: bool,
    pub raw: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Tag<'_> {
    /// Value of an attribute and its byte range within the whole source
    pub fn attr(&self, attr: &str) -> Option<(&str, std::ops::Range<usize>)> {
        let (value, range) = attr_value(self.raw, attr)?;
        Some((value, self.start + range.start..self.start + range.end))
    }

    fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.name.as_str())
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "tr", "table", "blockquote",
    "pre", "section", "article", "header", "footer", "body",
];

const HIDDEN_TAGS: &[&str] = &["script", "style", "head", "title"];

/// Split HTML source into text and tag tokens
///
/// A `<` that starts an unterminated tag swallows the rest of the input, so a
/// selection ending inside a tag never leaks tag source into text.
pub fn tokenize(html: &str) -> Vec<Token<'_>> {
    let bytes = html.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(offset) = memchr(b'<', &bytes[pos..]) {
        let lt = pos + offset;
        let next = bytes.get(lt + 1).copied();
        let opens_tag = matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!');

        if !opens_tag {
            pos = lt + 1;
            continue;
        }

        if lt > text_start {
            tokens.push(Token::Text {
                text: &html[text_start..lt],
                start: text_start,
            });
        }

        let end = if html[lt..].starts_with("<!--") {
            html[lt + 4..].find("-->").map(|i| lt + 4 + i + 3)
        } else {
            memchr(b'>', &bytes[lt..]).map(|i| lt + i + 1)
        };

        let Some(end) = end else {
            return tokens;
        };

        tokens.push(Token::Tag(parse_tag(&html[lt..end], lt, end)));
        pos = end;
        text_start = end;
    }

    if text_start < html.len() {
        tokens.push(Token::Text {
            text: &html[text_start..],
            start: text_start,
        });
    }

    tokens
}

fn parse_tag(raw: &str, start: usize, end: usize) -> Tag<'_> {
    let inner = raw.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    let name = if inner.starts_with('!') {
        String::new()
    } else {
        inner
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase()
    };

    Tag {
        name,
        closing,
        raw,
        start,
        end,
    }
}

/// Find `name=value` inside a raw tag, returning the value and its range
fn attr_value<'a>(raw: &'a str, name: &str) -> Option<(&'a str, std::ops::Range<usize>)> {
    let lower = raw.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = lower[search_from..].find(&needle) {
        let at = search_from + found;
        search_from = at + needle.len();

        let preceded_by_space = lower[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_whitespace());
        if !preceded_by_space {
            continue;
        }

        let rest = &raw[at + needle.len()..];
        let trimmed = rest.trim_start();
        let Some(after_eq) = trimmed.strip_prefix('=') else {
            continue;
        };
        let value_part = after_eq.trim_start();
        let value_offset = raw.len() - value_part.len();

        return match value_part.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &value_part[1..];
                let close = body.find(quote)?;
                let start = value_offset + 1;
                Some((&raw[start..start + close], start..start + close))
            }
            Some(_) => {
                let len = value_part
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(value_part.len());
                Some((&raw[value_offset..value_offset + len], value_offset..value_offset + len))
            }
            None => None,
        };
    }

    None
}

/// Decode the common named entities and numeric references
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        let decoded = candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&candidate[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escape text for placement inside element content
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrap corrected text as an inline span for splicing into the document
pub fn wrap_in_span(text: &str) -> String {
    format!("<span>{}</span>", escape_text(text))
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Markup that replaces `selected` with `text` wrapped in a span
///
/// Closing tags whose opening tag lies before the selection are kept ahead
/// of the span, and opening tags whose closing tag lies after it are kept
/// behind it, so the surrounding elements stay balanced.
pub fn balanced_replacement(selected: &str, text: &str) -> String {
    let mut open: Vec<Tag<'_>> = Vec::new();
    let mut dangling_close = String::new();

    for token in tokenize(selected) {
        let Token::Tag(tag) = token else {
            continue;
        };
        if tag.name.is_empty()
            || VOID_TAGS.contains(&tag.name.as_str())
            || tag.raw.ends_with("/>")
        {
            continue;
        }

        if !tag.closing {
            open.push(tag);
        } else if let Some(at) = open.iter().rposition(|o| o.name == tag.name) {
            open.truncate(at);
        } else {
            dangling_close.push_str(tag.raw);
        }
    }

    let mut out = dangling_close;
    out.push_str(&wrap_in_span(text));
    for tag in open {
        out.push_str(tag.raw);
    }
    out
}

/// Shrink `range` so neither end falls inside a tag
///
/// A start inside a tag moves past it and an end inside a tag moves back to
/// its `<`.
pub fn range_outside_tags(html: &str, range: std::ops::Range<usize>) -> std::ops::Range<usize> {
    let mut start = range.start;
    let mut end = range.end;

    for token in tokenize(html) {
        let Token::Tag(tag) = token else {
            continue;
        };
        if tag.start < start && start < tag.end {
            start = tag.end;
        }
        if tag.start < end && end < tag.end {
            end = tag.start;
        }
    }

    start..end.max(start)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text a reader sees for a whole fragment
pub fn plain_text(html: &str) -> String {
    plain_text_in_range(html, 0..html.len())
}

/// Plain text a reader sees for the source bytes in `range`
///
/// The whole source is tokenized so a range that starts or ends inside a tag
/// only picks up character data. Block boundaries become single spaces.
pub fn plain_text_in_range(html: &str, range: std::ops::Range<usize>) -> String {
    let mut raw = String::new();
    let mut hidden_depth = 0usize;

    for token in tokenize(html) {
        match token {
            Token::Tag(tag) => {
                if HIDDEN_TAGS.contains(&tag.name.as_str()) {
                    if tag.closing {
                        hidden_depth = hidden_depth.saturating_sub(1);
                    } else {
                        hidden_depth += 1;
                    }
                } else if (tag.is_block() || tag.name == "br")
                    && tag.start >= range.start
                    && tag.start < range.end
                {
                    raw.push(' ');
                }
            }
            Token::Text { text, start } => {
                if hidden_depth > 0 {
                    continue;
                }
                let end = start + text.len();
                let from = start.max(range.start);
                let to = end.min(range.end);
                if from < to {
                    raw.push_str(&html[from..to]);
                }
            }
        }
    }

    collapse_whitespace(&decode_entities(&raw))
}

/// A remote `<img src>` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    /// Byte range of the attribute value in the source
    pub range: std::ops::Range<usize>,
}

/// All `<img>` sources that point at http(s) URLs, in document order
pub fn remote_images(html: &str) -> Vec<ImageRef> {
    tokenize(html)
        .into_iter()
        .filter_map(|token| match token {
            Token::Tag(tag) if tag.name == "img" && !tag.closing => {
                let (src, range) = tag.attr("src")?;
                let lower = src.to_ascii_lowercase();
                (lower.starts_with("http://") || lower.starts_with("https://")).then(|| ImageRef {
                    src: decode_entities(src),
                    range,
                })
            }
            _ => None,
        })
        .collect()
}

/// Replace byte ranges of `html`; ranges must not overlap
pub fn replace_ranges(html: &str, mut edits: Vec<(std::ops::Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&html[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&html[cursor..]);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
}

/// A run of text laid out as one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// A flattened piece of the document, in reading order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(TextBlock),
    /// An `<img>`; `src` is entity-decoded, `alt` falls back to "image"
    Image { src: String, alt: String },
}

/// Flatten markup into paragraphs, headings, list items and images
///
/// An image ends the paragraph it sits in; text after it starts a new one.
pub fn blocks(html: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut kind = BlockKind::Paragraph;
    let mut hidden_depth = 0usize;

    let flush = |current: &mut String, kind: BlockKind, blocks: &mut Vec<Block>| {
        let text = collapse_whitespace(&decode_entities(current));
        if !text.is_empty() {
            blocks.push(Block::Text(TextBlock { kind, text }));
        }
        current.clear();
    };

    for token in tokenize(html) {
        match token {
            Token::Text { text, .. } => {
                if hidden_depth == 0 {
                    current.push_str(text);
                }
            }
            Token::Tag(tag) => {
                let name = tag.name.as_str();
                if HIDDEN_TAGS.contains(&name) {
                    if tag.closing {
                        hidden_depth = hidden_depth.saturating_sub(1);
                    } else {
                        hidden_depth += 1;
                    }
                    continue;
                }

                if name == "img" && !tag.closing {
                    flush(&mut current, kind, &mut blocks);
                    let alt = tag
                        .attr("alt")
                        .map(|(alt, _)| collapse_whitespace(&decode_entities(alt)))
                        .filter(|alt| !alt.is_empty())
                        .unwrap_or_else(|| "image".to_string());
                    let src = tag
                        .attr("src")
                        .map(|(src, _)| decode_entities(src.trim()))
                        .unwrap_or_default();
                    blocks.push(Block::Image { src, alt });
                } else if name == "br" {
                    flush(&mut current, kind, &mut blocks);
                } else if tag.is_block() {
                    flush(&mut current, kind, &mut blocks);
                    kind = match (name, tag.closing) {
                        ("h1" | "h2" | "h3" | "h4" | "h5" | "h6", false) => BlockKind::Heading,
                        ("li", false) => BlockKind::ListItem,
                        _ => BlockKind::Paragraph,
                    };
                }
            }
        }
    }

    flush(&mut current, kind, &mut blocks);
    blocks
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod html_tests;
