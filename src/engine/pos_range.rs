//! Position ranges and source lines
//!
//! Every diagnostic node covers a half-open [`PosRange`] of cursor offsets.
//! Offsets are byte offsets into the input; columns shown to humans are
//! counted in characters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitAnd;

/// A half-open interval `[start, end)` of input offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PosRange {
    /// First offset covered
    pub start: usize,
    /// One past the last offset covered
    pub end: usize,
}

impl PosRange {
    /// Create a new range; an `end` before `start` collapses to `start`
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A zero-width range at `offset`
    #[inline]
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Length of this range in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if this is a zero-width range
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if `offset` falls inside the range
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Check if `other` lies entirely within this range
    #[inline]
    pub fn covers(&self, other: &PosRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if the two ranges share any position
    ///
    /// A zero-width range overlaps a range when its offset lies within the
    /// other's closed bounds, so a position sitting at the end of a line
    /// still overlaps that line.
    pub fn overlaps(&self, other: &PosRange) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => self.start == other.start,
            (true, false) => other.start <= self.start && self.start <= other.end,
            (false, true) => self.start <= other.start && other.start <= self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }

    /// The part of both ranges, or `None` when they do not overlap
    pub fn intersection(&self, other: &PosRange) -> Option<PosRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(PosRange::new(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// Smallest range covering both
    pub fn merge(&self, other: &PosRange) -> PosRange {
        PosRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Draw this range as an ASCII underline relative to one source line
    ///
    /// `line` is the line's range without its terminator and `line_text`
    /// its contents. One extra column past the end of the line stands for
    /// the newline (or end of input). Zero-width ranges are drawn as `V`,
    /// single characters as `|`, wider ranges as `\--/`. A side that
    /// continues beyond the line is drawn with `-`. Returns an empty string
    /// when the range does not touch the line.
    pub fn render_in(&self, line: PosRange, line_text: &str) -> String {
        let line_end = line.end + 1;
        let column = |offset: usize| column_in(line_text, line.start, offset);

        if self.is_empty() {
            if self.start < line.start || self.start >= line_end {
                return String::new();
            }
            let mut out = " ".repeat(column(self.start));
            out.push('V');
            return out;
        }

        if !(self.start < line_end && line.start < self.end) {
            return String::new();
        }

        let clipped_left = self.start < line.start;
        let clipped_right = self.end > line_end;
        let from = column(self.start.max(line.start));
        let to = column(self.end.min(line_end)).max(from + 1);
        let width = to - from;

        let mut out = " ".repeat(from);
        if width == 1 {
            out.push(if clipped_left || clipped_right { '-' } else { '|' });
            return out;
        }
        out.push(if clipped_left { '-' } else { '\\' });
        out.push_str(&"-".repeat(width - 2));
        out.push(if clipped_right { '-' } else { '/' });
        out
    }
}

impl BitAnd for PosRange {
    type Output = Option<PosRange>;

    fn bitand(self, rhs: PosRange) -> Self::Output {
        self.intersection(&rhs)
    }
}

impl fmt::Display for PosRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Default for PosRange {
    fn default() -> Self {
        Self::at(0)
    }
}

/// Character column of `offset` within a line starting at `line_start`
///
/// Offsets past the end of the text count one column per byte.
fn column_in(line_text: &str, line_start: usize, offset: usize) -> usize {
    let rel = offset.saturating_sub(line_start);
    if rel <= line_text.len() {
        line_text
            .get(..rel)
            .map(|s| s.chars().count())
            .unwrap_or(rel)
    } else {
        line_text.chars().count() + (rel - line_text.len())
    }
}

/// One line of source text, as captured for a failure report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// Line number (1-based)
    pub number: usize,
    /// Offsets covered by the line, excluding its terminator
    pub range: PosRange,
    /// The line's text, excluding its terminator
    pub text: String,
}

impl SourceLine {
    /// Column (1-based, in characters) of `offset` on this line
    pub fn column_of(&self, offset: usize) -> usize {
        column_in(&self.text, self.range.start, offset) + 1
    }

    /// Underline `range` relative to this line
    pub fn underline(&self, range: &PosRange) -> String {
        range.render_in(self.range, &self.text)
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.number, self.text)
    }
}

/// Byte bounds `(start, end)` of the line containing `idx`, excluding the
/// terminating `\n`; a `\r` before it is also excluded
///
/// If the text ends before a newline is found, `end` is the text length.
pub fn line_bounds(text: &str, idx: usize) -> (usize, usize) {
    let bytes = text.as_bytes();
    let idx = idx.min(bytes.len());
    let start = memchr::memrchr(b'\n', &bytes[..idx])
        .map(|n| n + 1)
        .unwrap_or(0);
    let mut end = memchr::memchr(b'\n', &bytes[idx..])
        .map(|n| idx + n)
        .unwrap_or(bytes.len());
    if end > start && bytes[end - 1] == b'\r' && end < bytes.len() {
        end -= 1;
    }
    (start, end)
}

/// Number of newlines in `text`
#[inline]
pub fn count_newlines(text: &str) -> usize {
    memchr::memchr_iter(b'\n', text.as_bytes()).count()
}

/// Convert a byte offset in `input` to a 1-based (line, column) pair
pub fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let (start, _) = line_bounds(input, offset);
    let line = count_newlines(&input[..start]) + 1;
    (line, column_in(&input[start..], start, offset) + 1)
}
