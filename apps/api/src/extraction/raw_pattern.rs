//! Raw pattern extraction: recovers text from PDF bytes without parsing the object graph.
//!
//! The scanner lexes each chunk for three kinds of text-bearing tokens:
//! - operands of the text-show operators `Tj`, `'`, `"` and the string elements of `TJ` arrays,
//! - any remaining literal `( … )` strings (escapes and nesting handled),
//! - any remaining hex `< … >` strings, kept only where they decode to printable ASCII.
//!
//! Every string token is consumed exactly once, so a literal shown by `Tj` is not also
//! reported as a loose literal. Fragments keep their byte order, which follows the
//! content stream's reading order closely enough for an LLM prompt.
//!
//! Nothing here can fail to initialize, which is why this strategy runs before the
//! structured extractor.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::extraction::attempt::{ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
use crate::extraction::{ExtractionLimits, MIN_VIABLE_TEXT_CHARS};

const MAX_LITERAL_BYTES: usize = 2048;
const MAX_LITERAL_DEPTH: usize = 32;
const MAX_HEX_DIGITS: usize = 4096;
/// `TJ` adjustments below this (thousandths of text space) read as a word gap.
const TJ_WORD_GAP: f32 = -200.0;
/// Fragments with a lower share of printable characters are binary noise.
const MIN_PRINTABLE_RATIO: f32 = 0.7;
/// Runs of this many identical characters collapse to one.
const REPEAT_COLLAPSE_RUN: usize = 5;
const ALLOWED_PUNCTUATION: &str = "@.,;:!?'\"()-_/+#&%$";

// ────────────────────────────────────────────────────────────────────────────
// Strategy
// ────────────────────────────────────────────────────────────────────────────

pub struct RawPatternExtractor {
    limits: ExtractionLimits,
    threshold: usize,
}

impl RawPatternExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self {
            limits,
            threshold: MIN_VIABLE_TEXT_CHARS,
        }
    }
}

#[async_trait]
impl Extractor for RawPatternExtractor {
    fn strategy(&self) -> StrategyName {
        StrategyName::RawPattern
    }

    async fn extract(&self, bytes: Bytes) -> ExtractionAttemptResult {
        let limits = self.limits;
        let threshold = self.threshold;

        match tokio::task::spawn_blocking(move || extract_raw(&bytes, &limits, threshold)).await {
            Ok(attempt) => attempt,
            Err(e) => {
                warn!("raw pattern scan task failed: {e}");
                ExtractionAttemptResult::failure(
                    StrategyName::RawPattern,
                    FailureReason::RuntimeInitError,
                    format!("raw scan task failed: {e}"),
                )
            }
        }
    }
}

/// Synchronous body of the strategy. Scans at most `raw_scan_cap_bytes`.
pub fn extract_raw(bytes: &[u8], limits: &ExtractionLimits, threshold: usize) -> ExtractionAttemptResult {
    let scanned = bytes.len().min(limits.raw_scan_cap_bytes);
    let truncated = bytes.len() > scanned;
    let text = scan_text(&bytes[..scanned], limits.raw_chunk_bytes);

    debug!(
        scanned_bytes = scanned,
        truncated,
        characters = text.chars().count(),
        "raw pattern scan finished"
    );

    ExtractionAttemptResult::evaluate(
        StrategyName::RawPattern,
        text,
        threshold,
        FailureReason::MinimalTextFound,
    )
    .with_truncated(truncated)
}

/// Scans `bytes` chunk by chunk and returns cleaned, space-joined text.
/// Deterministic: identical input always yields identical output.
pub fn scan_text(bytes: &[u8], chunk_size: usize) -> String {
    let mut joined = String::new();
    let mut counts = [0usize; 3];

    for chunk in bytes.chunks(chunk_size.max(1)) {
        for fragment in scan_chunk(chunk) {
            counts[fragment.source as usize] += 1;
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(&fragment.text);
        }
    }

    debug!(
        shown = counts[FragmentSource::ShowOperator as usize],
        literal = counts[FragmentSource::Literal as usize],
        hex = counts[FragmentSource::Hex as usize],
        "raw pattern fragments accepted"
    );

    clean_text(&joined)
}

// ────────────────────────────────────────────────────────────────────────────
// Fragment assembly
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentSource {
    ShowOperator = 0,
    Literal = 1,
    Hex = 2,
}

#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    source: FragmentSource,
    text: String,
}

/// A string token that has not yet been claimed by an operator.
struct PendingString {
    text: String,
    source: FragmentSource,
}

fn scan_chunk(chunk: &[u8]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut pending: Option<PendingString> = None;
    let mut open_array: Option<String> = None;
    let mut closed_array: Option<String> = None;

    for token in Lexer::new(chunk) {
        match token {
            Token::Literal(raw) | Token::Hex(raw) if open_array.is_some() => {
                if let Some(array) = open_array.as_mut() {
                    array.push_str(&raw.text());
                }
            }
            Token::Literal(raw) | Token::Hex(raw) => {
                if let Some(prev) = pending.take() {
                    push(&mut fragments, &prev.text, prev.source);
                }
                let source = match raw {
                    RawString::Literal(_) => FragmentSource::Literal,
                    RawString::Hex(_) => FragmentSource::Hex,
                };
                pending = Some(PendingString {
                    text: raw.text(),
                    source,
                });
            }
            Token::Number(n) => {
                if let Some(array) = open_array.as_mut() {
                    if n < TJ_WORD_GAP {
                        array.push(' ');
                    }
                }
            }
            Token::ArrayOpen => {
                if let Some(prev) = pending.take() {
                    push(&mut fragments, &prev.text, prev.source);
                }
                open_array = Some(String::new());
            }
            Token::ArrayClose => {
                closed_array = open_array.take();
            }
            Token::Operator(op) => {
                match op {
                    b"Tj" | b"'" | b"\"" => {
                        if let Some(shown) = pending.take() {
                            push(&mut fragments, &shown.text, FragmentSource::ShowOperator);
                        }
                    }
                    b"TJ" => {
                        if let Some(array) = closed_array.take() {
                            push(&mut fragments, &array, FragmentSource::ShowOperator);
                        }
                    }
                    _ => {
                        if let Some(prev) = pending.take() {
                            push(&mut fragments, &prev.text, prev.source);
                        }
                    }
                }
                if let Some(array) = closed_array.take() {
                    push(&mut fragments, &array, FragmentSource::Literal);
                }
            }
        }
    }

    if let Some(prev) = pending.take() {
        push(&mut fragments, &prev.text, prev.source);
    }
    if let Some(array) = closed_array.or(open_array) {
        push(&mut fragments, &array, FragmentSource::Literal);
    }

    fragments
}

fn push(fragments: &mut Vec<Fragment>, text: &str, source: FragmentSource) {
    if let Some(text) = accept_fragment(text) {
        fragments.push(Fragment { source, text });
    }
}

/// Keeps a fragment only if it looks like words: at least two characters, at least one
/// letter, and mostly printable.
fn accept_fragment(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let total = trimmed.chars().count();
    if total < 2 || !trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let printable = trimmed
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .count();
    if (printable as f32) < (total as f32) * MIN_PRINTABLE_RATIO {
        return None;
    }
    Some(trimmed.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes scanned text: characters outside the allow-list become spaces, runs of
/// five or more identical characters collapse to one, whitespace collapses, and
/// single-character tokens without a letter are dropped.
pub fn clean_text(raw: &str) -> String {
    let allowed: String = raw
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    collapse_repeats(&allowed, REPEAT_COLLAPSE_RUN)
        .split_whitespace()
        .filter(|token| token.chars().count() > 1 || token.chars().any(|c| c.is_ascii_alphabetic()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c)
}

fn collapse_repeats(text: &str, run: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let mut len = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            len += 1;
        }
        let keep = if len >= run { 1 } else { len };
        out.extend(std::iter::repeat(c).take(keep));
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Lexer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum RawString {
    /// Unescaped literal bytes, decoded byte-for-byte (Latin-1).
    Literal(Vec<u8>),
    /// Decoded hex bytes.
    Hex(Vec<u8>),
}

impl RawString {
    fn text(&self) -> String {
        match self {
            RawString::Literal(bytes) => bytes.iter().map(|&b| b as char).collect(),
            RawString::Hex(bytes) => bytes
                .iter()
                .filter(|b| (0x20..=0x7e).contains(*b))
                .map(|&b| b as char)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Literal(RawString),
    Hex(RawString),
    ArrayOpen,
    ArrayClose,
    Number(f32),
    Operator(&'a [u8]),
}

struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.data.len() && pred(self.data[self.pos]) {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        while self.pos < self.data.len() {
            let start = self.pos;
            match self.data[start] {
                b'(' => {
                    if let Some((bytes, end)) = read_literal(self.data, start) {
                        self.pos = end;
                        return Some(Token::Literal(RawString::Literal(bytes)));
                    }
                    self.pos += 1;
                }
                b'<' => {
                    if self.data.get(start + 1) == Some(&b'<') {
                        self.pos += 2;
                        continue;
                    }
                    if let Some((bytes, end)) = read_hex(self.data, start) {
                        self.pos = end;
                        return Some(Token::Hex(RawString::Hex(bytes)));
                    }
                    self.pos += 1;
                }
                b'[' => {
                    self.pos += 1;
                    return Some(Token::ArrayOpen);
                }
                b']' => {
                    self.pos += 1;
                    return Some(Token::ArrayClose);
                }
                b'/' => {
                    self.pos += 1;
                    self.skip_while(is_regular);
                }
                b'\'' | b'"' => {
                    self.pos += 1;
                    return Some(Token::Operator(&self.data[start..start + 1]));
                }
                b'0'..=b'9' | b'-' | b'+' | b'.' => {
                    self.pos += 1;
                    self.skip_while(|b| b.is_ascii_digit() || b == b'.');
                    let number = std::str::from_utf8(&self.data[start..self.pos])
                        .ok()
                        .and_then(|s| s.parse::<f32>().ok());
                    if let Some(n) = number {
                        return Some(Token::Number(n));
                    }
                }
                b if b.is_ascii_alphabetic() => {
                    self.skip_while(|b| b.is_ascii_alphabetic() || b == b'*');
                    return Some(Token::Operator(&self.data[start..self.pos]));
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

fn is_regular(b: u8) -> bool {
    !b.is_ascii_whitespace() && !b"()<>[]{}/%".contains(&b)
}

/// Reads a literal string starting at the `(` at `start`. Returns the unescaped bytes
/// and the position after the closing `)`, or `None` if the string does not close
/// within the length and nesting bounds.
fn read_literal(data: &[u8], start: usize) -> Option<(Vec<u8>, usize)> {
    let limit = (start + MAX_LITERAL_BYTES).min(data.len());
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < limit {
        match data[i] {
            b'(' => {
                if depth > 0 {
                    out.push(b'(');
                }
                depth += 1;
                if depth > MAX_LITERAL_DEPTH {
                    return None;
                }
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some((out, i));
                }
                out.push(b')');
            }
            b'\\' => {
                i += 1;
                let &escaped = data.get(i)?;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'0'..=b'7' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 && i < data.len() && (b'0'..=b'7').contains(&data[i]) {
                            value = value * 8 + u32::from(data[i] - b'0');
                            i += 1;
                            digits += 1;
                        }
                        out.push((value & 0xff) as u8);
                        continue;
                    }
                    // Line continuation
                    b'\r' => {
                        if data.get(i + 1) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'\n' => {}
                    // \( \) \\ and unknown escapes keep the character itself
                    other => out.push(other),
                }
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    None
}

/// Reads a hex string starting at the `<` at `start`. An odd digit count is padded
/// with a trailing zero.
fn read_hex(data: &[u8], start: usize) -> Option<(Vec<u8>, usize)> {
    let limit = (start + 1 + MAX_HEX_DIGITS).min(data.len());
    let mut nibbles = Vec::new();
    let mut i = start + 1;

    while i < limit {
        let b = data[i];
        if b == b'>' {
            if nibbles.is_empty() {
                return None;
            }
            if nibbles.len() % 2 == 1 {
                nibbles.push(0);
            }
            let bytes = nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect();
            return Some((bytes, i + 1));
        }
        if let Some(n) = hex_value(b) {
            nibbles.push(n);
        } else if !b.is_ascii_whitespace() {
            return None;
        }
        i += 1;
    }
    None
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
