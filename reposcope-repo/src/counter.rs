//! Text decoding and code/comment/blank line counting

use reposcope_core::CommentRules;

/// Leading bytes scanned for NUL when deciding a file is binary
pub const BINARY_PROBE_BYTES: usize = 8192;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decoded file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    Binary,
}

/// Decode file bytes as text, or report them as binary.
///
/// Tried in order: UTF-16 with a byte-order mark, a NUL probe, UTF-8 (BOM stripped), then
/// Latin-1 for content without stray control characters.
pub fn decode(bytes: &[u8]) -> Decoded {
    if let Some(decoded) = decode_utf16_bom(bytes) {
        return decoded;
    }

    if looks_binary(bytes) {
        return Decoded::Binary;
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Decoded::Text(text.to_owned()),
        Err(_) => decode_latin1(bytes),
    }
}

pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_PROBE_BYTES).any(|&b| b == 0)
}

fn decode_utf16_bom(bytes: &[u8]) -> Option<Decoded> {
    let little_endian = match bytes {
        [0xFF, 0xFE, ..] => true,
        [0xFE, 0xFF, ..] => false,
        _ => return None,
    };

    let units = bytes[2..].chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });

    Some(
        char::decode_utf16(units)
            .collect::<Result<String, _>>()
            .map(Decoded::Text)
            .unwrap_or(Decoded::Binary),
    )
}

fn decode_latin1(bytes: &[u8]) -> Decoded {
    // Tab, LF, VT, FF, CR and ESC are the only C0 controls expected in text
    let has_control = bytes
        .iter()
        .any(|&b| matches!(b, 0x00..=0x08 | 0x0E..=0x1A | 0x1C..=0x1F));
    if has_control {
        return Decoded::Binary;
    }
    Decoded::Text(bytes.iter().map(|&b| b as char).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Code,
    Comment,
    Blank,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineCounts {
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
}

impl LineCounts {
    pub fn total(&self) -> u64 {
        self.code + self.comment + self.blank
    }

    fn record(&mut self, kind: LineKind) {
        match kind {
            LineKind::Code => self.code += 1,
            LineKind::Comment => self.comment += 1,
            LineKind::Blank => self.blank += 1,
        }
    }
}

/// Stateful line classifier. Block-comment and multi-line string state carry across
/// lines, so feed the lines of one file in order and use a fresh counter per file.
///
/// A line is a comment when it starts inside a block comment or its first token opens a
/// comment. Text after a block closer on the same line does not make it code. Nested
/// block comments are not tracked. Lines inside a multi-line string are code.
#[derive(Debug, Clone)]
pub struct LineCounter {
    rules: CommentRules,
    open_block: Option<&'static str>,
    open_string: Option<&'static str>,
}

impl LineCounter {
    pub fn new(rules: CommentRules) -> Self {
        Self {
            rules,
            open_block: None,
            open_string: None,
        }
    }

    /// Count every line of `text`
    pub fn count(rules: CommentRules, text: &str) -> LineCounts {
        let mut counter = Self::new(rules);
        let mut counts = LineCounts::default();
        for line in text.lines() {
            counts.record(counter.classify(line));
        }
        counts
    }

    pub fn in_block_comment(&self) -> bool {
        self.open_block.is_some()
    }

    pub fn in_string(&self) -> bool {
        self.open_string.is_some()
    }

    pub fn classify(&mut self, line: &str) -> LineKind {
        if line.trim().is_empty() {
            return LineKind::Blank;
        }

        let started_in_block = self.open_block.is_some();
        let mut first_token = self.open_string.map(|_| LineKind::Code);
        let mut i = 0;

        while i < line.len() {
            let tail = &line[i..];

            if let Some(closer) = self.open_block.or(self.open_string) {
                match tail.find(closer) {
                    Some(pos) => {
                        i += pos + closer.len();
                        self.open_block = None;
                        self.open_string = None;
                        continue;
                    }
                    None => break,
                }
            }

            let Some(c) = tail.chars().next() else {
                break;
            };
            if c.is_whitespace() {
                i += c.len_utf8();
                continue;
            }

            if let Some(&marker) = self.rules.doc_strings.iter().find(|m| tail.starts_with(*m)) {
                if first_token.is_none() {
                    first_token = Some(LineKind::Comment);
                    self.open_block = Some(marker);
                } else {
                    self.open_string = Some(marker);
                }
                i += marker.len();
                continue;
            }

            if let Some(&(open, close)) = self
                .rules
                .block_comments
                .iter()
                .find(|(open, _)| tail.starts_with(open))
            {
                first_token.get_or_insert(LineKind::Comment);
                self.open_block = Some(close);
                i += open.len();
                continue;
            }

            if self.rules.line_comments.iter().any(|m| tail.starts_with(m)) {
                first_token.get_or_insert(LineKind::Comment);
                break;
            }

            first_token.get_or_insert(LineKind::Code);

            if self.rules.char_literals && c == '\'' {
                i += char_literal_len(tail).unwrap_or(1);
            } else if self.rules.string_delimiters.contains(&c) {
                let body = &tail[c.len_utf8()..];
                i += c.len_utf8() + string_span(body, c);
            } else {
                i += c.len_utf8();
            }
        }

        if started_in_block {
            LineKind::Comment
        } else {
            first_token.unwrap_or(LineKind::Code)
        }
    }
}

/// Bytes up to and including the closing delimiter; unterminated strings run to end of line
fn string_span(body: &str, delimiter: char) -> usize {
    let mut escaped = false;
    for (idx, ch) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delimiter {
            return idx + ch.len_utf8();
        }
    }
    body.len()
}

/// Length of a character literal such as `'x'`, `'\''` or `'\u{1F600}'` at the start of
/// `tail`. `None` for a lifetime or label like `'a`.
fn char_literal_len(tail: &str) -> Option<usize> {
    let mut chars = tail.char_indices().skip(1);
    let (_, first) = chars.next()?;
    if first == '\\' {
        // The escaped character itself may be a quote
        chars.next()?;
        return chars
            .take(10)
            .find(|&(_, ch)| ch == '\'')
            .map(|(idx, _)| idx + 1);
    }
    match chars.next()? {
        (idx, '\'') if first != '\'' => Some(idx + 1),
        _ => None,
    }
}
