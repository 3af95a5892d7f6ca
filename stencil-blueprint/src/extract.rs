//! Structural extractor.
//!
//! Generated files are not guaranteed to be valid code at all times, so
//! definitions are located with a narrow grammar instead of a parser:
//!
//! ```text
//! definition := IDENT ws* "=" ws* opener
//! opener     := "{"                              (dictionary body, brace depth)
//!             | ["dedent("] ('"""' | "'''") ["\" newline]   (blueprint string)
//! ```
//!
//! The header must start at column 0. Dictionary bodies close when brace depth
//! returns to zero, ignoring braces inside `"…"` / `'…'` strings and `#`
//! comments. String bodies close at the first unescaped matching triple
//! delimiter, followed by `)` when the body was wrapped in `dedent(`.
//!
//! A span always covers whole lines: from the start of the header line to the
//! end of the line holding the closing delimiter, newline included.

use std::ops::Range;

use stencil_core::BlueprintId;

use crate::error::BlueprintError;

const WRAPPER: &str = "dedent(";

/// Triple-quote flavour of a blueprint string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
}

impl Quote {
    pub fn delimiter(self) -> &'static str {
        match self {
            Quote::Double => "\"\"\"",
            Quote::Single => "'''",
        }
    }
}

/// How a definition body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStyle {
    /// `name = { ... }`: the body range includes both braces.
    Dict,
    /// `name = """..."""`, optionally `dedent(`-wrapped and with a `\`
    /// continuation right after the opening delimiter.
    Text {
        quote: Quote,
        wrapped: bool,
        continuation: bool,
    },
}

impl BodyStyle {
    /// Style used for definitions written by stencil.
    pub const BLUEPRINT: BodyStyle = BodyStyle::Text {
        quote: Quote::Double,
        wrapped: true,
        continuation: true,
    };

    /// Whether definitions in this style need the `dedent` import.
    pub fn needs_preamble(self) -> bool {
        matches!(self, BodyStyle::Text { wrapped: true, .. })
    }

    /// Render a complete definition (header, body, closer, newline).
    ///
    /// For [`BodyStyle::Dict`] the body must carry its own braces.
    pub fn render(self, id: &str, body: &str) -> String {
        match self {
            BodyStyle::Dict => format!("{id} = {body}\n"),
            BodyStyle::Text {
                quote,
                wrapped,
                continuation,
            } => {
                // A literal escaped for `"""` is not safe inside `'''`.
                let quote = if quote == Quote::Single
                    && (body.contains(Quote::Single.delimiter()) || body.ends_with('\''))
                {
                    Quote::Double
                } else {
                    quote
                };
                let delim = quote.delimiter();
                let (open, close) = if wrapped { (WRAPPER, ")") } else { ("", "") };
                let cont = if continuation { "\\\n" } else { "" };
                format!("{id} = {open}{delim}{cont}{body}{delim}{close}\n")
            }
        }
    }
}

/// Location of one definition inside a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSpan {
    pub id: BlueprintId,
    /// Byte offset of the start of the header line.
    pub start: usize,
    /// Byte offset just past the closing line (newline included).
    pub end: usize,
    /// Byte range of the body inside the text.
    pub body: Range<usize>,
    pub style: BodyStyle,
    /// 1-based line number of the header.
    pub line: usize,
}

impl DefinitionSpan {
    /// The full assignment text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// The body between the delimiters (braces included for dictionary bodies).
    pub fn body_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body.clone()]
    }
}

#[derive(Debug)]
struct Header {
    id: String,
    start: usize,
    line: usize,
    /// Offset of `{` for dict bodies, or of the first body byte for strings.
    body_start: usize,
    style: BodyStyle,
}

/// Find the first structurally closed definition of `id` in `text`.
///
/// Returns [`BlueprintError::Unterminated`] when every header for `id` runs
/// to end of file without a closing delimiter, and
/// [`BlueprintError::NotFound`] when there is no header at all.
pub fn extract(text: &str, id: &str) -> Result<DefinitionSpan, BlueprintError> {
    let mut unterminated: Option<usize> = None;
    let mut pos = 0;
    let mut line = 1;

    while pos < text.len() {
        let line_end = line_end(text, pos);
        if let Some(header) = parse_header(text, pos, line) {
            match close(text, &header) {
                Some(span) if span.id.as_str() == id => return Ok(span),
                Some(span) => {
                    line += text[pos..span.end].matches('\n').count();
                    pos = span.end;
                    continue;
                }
                None if header.id == id => {
                    unterminated.get_or_insert(header.line);
                }
                None => {}
            }
        }
        line += 1;
        pos = line_end;
    }

    match unterminated {
        Some(line) => Err(BlueprintError::Unterminated {
            id: id.to_string(),
            line,
        }),
        None => Err(BlueprintError::NotFound { id: id.to_string() }),
    }
}

/// List every top-level definition in `text`, in order.
///
/// Unlike [`extract`], an unterminated header is an error here: the rest of
/// the text cannot be trusted to be outside a body.
pub fn scan(text: &str) -> Result<Vec<DefinitionSpan>, BlueprintError> {
    let mut spans = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < text.len() {
        let line_end = line_end(text, pos);
        if let Some(header) = parse_header(text, pos, line) {
            let Some(span) = close(text, &header) else {
                return Err(BlueprintError::Unterminated {
                    id: header.id,
                    line: header.line,
                });
            };
            line += text[pos..span.end].matches('\n').count();
            pos = span.end;
            spans.push(span);
            continue;
        }
        line += 1;
        pos = line_end;
    }
    Ok(spans)
}

// ---------------------------------------------------------------------------
// Scanning helpers
// ---------------------------------------------------------------------------

/// Offset just past the newline ending the line that contains `pos`.
fn line_end(text: &str, pos: usize) -> usize {
    match text[pos..].find('\n') {
        Some(idx) => pos + idx + 1,
        None => text.len(),
    }
}

fn parse_header(text: &str, start: usize, line: usize) -> Option<Header> {
    let bytes = text.as_bytes();
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }

    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    let id = &text[start..i];

    i = skip_blanks(bytes, i);
    if bytes.get(i) != Some(&b'=') || bytes.get(i + 1) == Some(&b'=') {
        return None;
    }
    i = skip_blanks(bytes, i + 1);

    let rest = &bytes[i..];
    if rest.starts_with(b"{") {
        return Some(Header {
            id: id.to_string(),
            start,
            line,
            body_start: i,
            style: BodyStyle::Dict,
        });
    }

    let wrapped = rest.starts_with(WRAPPER.as_bytes());
    if wrapped {
        i += WRAPPER.len();
    }
    let quote = if bytes[i..].starts_with(Quote::Double.delimiter().as_bytes()) {
        Quote::Double
    } else if bytes[i..].starts_with(Quote::Single.delimiter().as_bytes()) {
        Quote::Single
    } else {
        return None;
    };
    i += 3;

    let continuation = bytes[i..].starts_with(b"\\\n");
    if continuation {
        i += 2;
    }

    Some(Header {
        id: id.to_string(),
        start,
        line,
        body_start: i,
        style: BodyStyle::Text {
            quote,
            wrapped,
            continuation,
        },
    })
}

fn skip_blanks(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

fn close(text: &str, header: &Header) -> Option<DefinitionSpan> {
    let (body, after) = match header.style {
        BodyStyle::Dict => close_dict(text, header.body_start)?,
        BodyStyle::Text { quote, wrapped, .. } => {
            close_text(text, header.body_start, quote, wrapped)?
        }
    };
    Some(DefinitionSpan {
        id: BlueprintId::from(header.id.as_str()),
        start: header.start,
        end: line_end_from(text, after),
        body,
        style: header.style,
        line: header.line,
    })
}

/// Like [`line_end`] but tolerates `pos == text.len()`.
fn line_end_from(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        text.len()
    } else {
        line_end(text, pos)
    }
}

/// Returns the body range (braces included) and the offset after `}`.
fn close_dict(text: &str, open: usize) -> Option<(Range<usize>, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_string {
            match b {
                b'\\' => i += 1,
                _ if b == q => in_string = None,
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => in_string = Some(b),
            b'#' => {
                i = line_end(text, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((open..i + 1, i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Returns the body range and the offset after the closing delimiter (and `)`).
fn close_text(
    text: &str,
    body_start: usize,
    quote: Quote,
    wrapped: bool,
) -> Option<(Range<usize>, usize)> {
    let bytes = text.as_bytes();
    let delim = quote.delimiter().as_bytes();
    let mut i = body_start;

    // Byte-wise: an escaped multi-byte char leaves `i` mid-char.
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(delim) {
            let mut after = i + delim.len();
            if wrapped {
                after = skip_blanks(bytes, after);
                if bytes.get(after) != Some(&b')') {
                    return None;
                }
                after += 1;
            }
            return Some((body_start..i, after));
        }
        i += 1;
    }
    None
}
