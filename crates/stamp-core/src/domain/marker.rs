//! Marker scanning.
//!
//! A marker region is a span of text bounded by a start delimiter that carries
//! an identifier and a later end delimiter that carries none:
//!
//! ```text
//! // GENERATOR:START
//! // GENERATOR:ID:imports
//! import Cart from 'checkout/Cart';      <- interior, owned by the engine
//! // GENERATOR:END
//! ```
//!
//! Delimiters are opaque strings. The scanner never parses the host language;
//! it only knows three tokens plus a short list of comment openers and closers
//! that may hug those tokens (`/*`, `*/}`, `<!--`, ...). This lets the same
//! code run over JSX, JSON-with-comments, YAML, HTML and shell files.
//!
//! ## Line mode and inline mode
//!
//! When nothing but whitespace follows the start delimiter on its line, the
//! interior begins on the next line. When nothing but whitespace precedes the
//! end delimiter on its line, the interior stops at the start of that line.
//! Otherwise the interior is the exact text between the two delimiters.

use std::collections::HashMap;
use std::fmt;

use crate::domain::error::DomainError;

/// Default token opening a region.
pub const DEFAULT_START_TOKEN: &str = "GENERATOR:START";
/// Default token preceding a region identifier.
pub const DEFAULT_ID_TOKEN: &str = "GENERATOR:ID:";
/// Default token closing a region.
pub const DEFAULT_END_TOKEN: &str = "GENERATOR:END";

const DEFAULT_OPENERS: &[&str] = &["{/*", "/*", "<!--", "//", "{{", "{#", "{%", "#"];
const DEFAULT_CLOSERS: &[&str] = &["*/}", "*/", "-->", "}}", "#}", "%}"];

/// The delimiter vocabulary used to find marker regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSyntax {
    start: String,
    id: String,
    end: String,
    /// Sorted longest first so `{/*` wins over `/*`.
    openers: Vec<String>,
    closers: Vec<String>,
}

impl MarkerSyntax {
    /// Build a syntax from custom tokens, keeping the default opener and
    /// closer lists.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidMarkerSyntax`] if a token is empty, or if
    /// one token contains another (the scanner could not tell them apart).
    pub fn new(
        start: impl Into<String>,
        id: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let syntax = Self {
            start: start.into(),
            id: id.into(),
            end: end.into(),
            openers: sorted(DEFAULT_OPENERS.iter().map(|s| s.to_string()).collect()),
            closers: sorted(DEFAULT_CLOSERS.iter().map(|s| s.to_string()).collect()),
        };
        syntax.validate()?;
        Ok(syntax)
    }

    /// Replace the recognised comment openers.
    pub fn with_openers<I, S>(mut self, openers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.openers = sorted(openers.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the recognised comment closers.
    pub fn with_closers<I, S>(mut self, closers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.closers = sorted(closers.into_iter().map(Into::into).collect());
        self
    }

    pub fn start_token(&self) -> &str {
        &self.start
    }

    pub fn id_token(&self) -> &str {
        &self.id
    }

    pub fn end_token(&self) -> &str {
        &self.end
    }

    /// First delimiter token that appears anywhere in `text`.
    pub fn token_in(&self, text: &str) -> Option<&str> {
        [&self.start, &self.id, &self.end]
            .into_iter()
            .find(|token| text.contains(token.as_str()))
            .map(String::as_str)
    }

    fn validate(&self) -> Result<(), DomainError> {
        let tokens = [
            ("start", &self.start),
            ("id", &self.id),
            ("end", &self.end),
        ];
        for (label, token) in tokens {
            if token.trim().is_empty() {
                return Err(DomainError::InvalidMarkerSyntax(format!(
                    "{label} token cannot be empty"
                )));
            }
        }
        for (a_label, a) in tokens {
            for (b_label, b) in tokens {
                if a_label != b_label && a.contains(b.as_str()) {
                    return Err(DomainError::InvalidMarkerSyntax(format!(
                        "{a_label} token '{a}' contains the {b_label} token '{b}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MarkerSyntax {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_TOKEN.into(),
            id: DEFAULT_ID_TOKEN.into(),
            end: DEFAULT_END_TOKEN.into(),
            openers: sorted(DEFAULT_OPENERS.iter().map(|s| s.to_string()).collect()),
            closers: sorted(DEFAULT_CLOSERS.iter().map(|s| s.to_string()).collect()),
        }
    }
}

fn sorted(mut items: Vec<String>) -> Vec<String> {
    items.retain(|s| !s.is_empty());
    items.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    items.dedup();
    items
}

/// Line terminator used by the start delimiter's line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// How a region's interior sits relative to its delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionLayout {
    /// Leading whitespace of the start delimiter's line.
    pub indent: String,
    /// The interior starts at the beginning of a line.
    pub start_on_own_line: bool,
    /// The interior ends at the beginning of the end delimiter's line.
    pub end_on_own_line: bool,
    pub line_ending: LineEnding,
}

impl RegionLayout {
    /// Lay synthesized content out the way it must appear between the
    /// delimiters.
    ///
    /// Inline regions get the content verbatim. Line-mode regions get one line
    /// per content line, indented like the start delimiter and terminated with
    /// the file's line ending.
    pub fn render(&self, content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }
        if !self.start_on_own_line && !self.end_on_own_line {
            return content.to_string();
        }

        let newline = self.line_ending.as_str();
        let mut out = String::with_capacity(content.len() + self.indent.len() * 4);
        for (i, line) in content.lines().enumerate() {
            if i > 0 {
                out.push_str(newline);
            }
            if !line.trim().is_empty() && (i > 0 || self.start_on_own_line) {
                out.push_str(&self.indent);
            }
            out.push_str(line);
        }
        if self.end_on_own_line {
            out.push_str(newline);
        }
        out
    }
}

/// One delimited region found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRegion {
    pub id: String,
    /// Byte offset where the interior begins.
    pub start_offset: usize,
    /// Byte offset where the interior ends (exclusive).
    pub end_offset: usize,
    pub raw_content: String,
    /// 1-based line of the start token.
    pub line: usize,
    pub layout: RegionLayout,
}

impl fmt::Display for MarkerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}..{}] (line {})",
            self.id, self.start_offset, self.end_offset, self.line
        )
    }
}

/// A piece of a scanned file: either text the engine never touches, or the
/// interior of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Untouched(&'a str),
    Region(&'a MarkerRegion),
}

/// Split `text` into untouched spans and region interiors, in document order.
///
/// Delimiters belong to the untouched spans.
pub fn segments<'a>(text: &'a str, regions: &'a [MarkerRegion]) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(regions.len() * 2 + 1);
    let mut cursor = 0;
    for region in regions {
        out.push(Segment::Untouched(&text[cursor..region.start_offset]));
        out.push(Segment::Region(region));
        cursor = region.end_offset;
    }
    out.push(Segment::Untouched(&text[cursor..]));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Start,
    End,
}

struct OpenRegion {
    id: String,
    line: usize,
    content_start: usize,
    layout: RegionLayout,
}

/// Scan `text` for marker regions.
///
/// # Errors
///
/// - [`DomainError::UnmatchedMarker`] for a start without an identifier, a
///   start while another region is open, a start never closed, or an end with
///   no open start.
/// - [`DomainError::DuplicateMarkerId`] when two regions share an id.
pub fn scan(text: &str, syntax: &MarkerSyntax) -> Result<Vec<MarkerRegion>, DomainError> {
    let mut tokens: Vec<(usize, TokenKind)> = text
        .match_indices(syntax.start.as_str())
        .map(|(i, _)| (i, TokenKind::Start))
        .chain(
            text.match_indices(syntax.end.as_str())
                .map(|(i, _)| (i, TokenKind::End)),
        )
        .collect();
    tokens.sort_by_key(|(offset, _)| *offset);

    let mut regions: Vec<MarkerRegion> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut open: Option<OpenRegion> = None;

    for (offset, kind) in tokens {
        match kind {
            TokenKind::Start => {
                if let Some(current) = &open {
                    return Err(DomainError::UnmatchedMarker {
                        line: current.line,
                        detail: format!(
                            "region '{}' is not closed before the next start marker at line {}",
                            current.id,
                            line_of(text, offset)
                        ),
                    });
                }
                open = Some(open_region(text, offset, syntax)?);
            }
            TokenKind::End => {
                let Some(current) = open.take() else {
                    return Err(DomainError::UnmatchedMarker {
                        line: line_of(text, offset),
                        detail: "end marker has no matching start marker".into(),
                    });
                };

                let (content_end, end_on_own_line) = end_delimiter_start(text, offset, syntax);
                if content_end < current.content_start {
                    return Err(DomainError::UnmatchedMarker {
                        line: line_of(text, offset),
                        detail: format!(
                            "end marker overlaps the start delimiter of region '{}'",
                            current.id
                        ),
                    });
                }

                if let Some(first_line) = seen.insert(current.id.clone(), current.line) {
                    return Err(DomainError::DuplicateMarkerId {
                        id: current.id,
                        first_line,
                        second_line: current.line,
                    });
                }

                regions.push(MarkerRegion {
                    raw_content: text[current.content_start..content_end].to_string(),
                    id: current.id,
                    start_offset: current.content_start,
                    end_offset: content_end,
                    line: current.line,
                    layout: RegionLayout {
                        end_on_own_line,
                        ..current.layout
                    },
                });
            }
        }
    }

    if let Some(current) = open {
        return Err(DomainError::UnmatchedMarker {
            line: current.line,
            detail: format!("region '{}' has no matching end marker", current.id),
        });
    }

    Ok(regions)
}

/// Resolve the identifier and interior start for the start token at `offset`.
fn open_region(
    text: &str,
    offset: usize,
    syntax: &MarkerSyntax,
) -> Result<OpenRegion, DomainError> {
    let line = line_of(text, offset);
    let after_start = offset + syntax.start.len();
    let next_end = text[after_start..]
        .find(syntax.end.as_str())
        .map_or(text.len(), |i| after_start + i);

    // Same line first, then the immediately following line. Never look past
    // the next end token.
    let eol = line_end(text, after_start);
    let mut ident_at = find_in(text, after_start, eol.min(next_end), &syntax.id);
    if ident_at.is_none() && next_end > eol && eol < text.len() {
        let next_line_end = line_end(text, eol + 1);
        ident_at = find_in(text, eol + 1, next_line_end.min(next_end), &syntax.id);
    }

    let Some(id_token_at) = ident_at else {
        return Err(DomainError::UnmatchedMarker {
            line,
            detail: format!("start marker carries no '{}' identifier", syntax.id),
        });
    };

    let ident_start = id_token_at + syntax.id.len();
    let ident_len: usize = text[ident_start..]
        .chars()
        .take_while(|c| is_ident_char(*c))
        .map(char::len_utf8)
        .sum();
    if ident_len == 0 {
        return Err(DomainError::UnmatchedMarker {
            line,
            detail: "start marker has an empty region identifier".into(),
        });
    }
    let ident_end = ident_start + ident_len;
    let id = text[ident_start..ident_end].to_string();

    // Optional comment closer right after the identifier.
    let after_ws = skip_inline_ws(text, ident_end);
    let delimiter_end = syntax
        .closers
        .iter()
        .find(|c| text[after_ws..].starts_with(c.as_str()))
        .map_or(ident_end, |c| after_ws + c.len());

    let delimiter_line_end = line_end(text, delimiter_end);
    let start_on_own_line = is_inline_ws(&text[delimiter_end..delimiter_line_end]);
    let line_ending = if text[..delimiter_line_end].ends_with('\r') {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    };
    let content_start = if start_on_own_line {
        (delimiter_line_end + 1).min(text.len())
    } else {
        delimiter_end
    };

    let start_line_begin = line_start(text, offset);
    let indent: String = text[start_line_begin..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();

    Ok(OpenRegion {
        id,
        line,
        content_start,
        layout: RegionLayout {
            indent,
            start_on_own_line,
            end_on_own_line: false,
            line_ending,
        },
    })
}

/// Where the end delimiter for the end token at `offset` begins, and whether
/// it owns its line.
fn end_delimiter_start(text: &str, offset: usize, syntax: &MarkerSyntax) -> (usize, bool) {
    let begin = line_start(text, offset);
    let before = text[begin..offset].trim_end_matches([' ', '\t']);
    let opener_at = syntax
        .openers
        .iter()
        .find(|o| before.ends_with(o.as_str()))
        .map_or(offset, |o| begin + before.len() - o.len());

    if is_inline_ws(&text[begin..opener_at]) {
        (begin, true)
    } else {
        (opener_at, false)
    }
}

fn find_in(text: &str, from: usize, to: usize, needle: &str) -> Option<usize> {
    if from >= to {
        return None;
    }
    text[from..to].find(needle).map(|i| from + i)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn is_inline_ws(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r'))
}

fn skip_inline_ws(text: &str, from: usize) -> usize {
    from + text[from..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the `\n` ending the line containing `offset`, or `text.len()`.
fn line_end(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len(), |i| offset + i)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
