//! Failure types and failure reports
//!
//! Two layers:
//! - [`Failure`] is what parslets return while parsing is in flight. Only
//!   [`Failure::Expected`] is recoverable; alternation and repetition absorb
//!   it and try something else.
//! - [`ParseError`] is what a top-level invocation returns. Its
//!   [`ParseError::Failed`] variant carries a [`ParseFailure`]: the attempt
//!   tree plus the report built from it.
//!
//! # Report format
//!
//! ```text
//! expected spaced "bar" at line 2, column 9
//! line 2:
//!   bar bar box
//!           V success: whitespace
//!           \-/ failure: "bar"
//!           \-/ failure: spaced "bar"
//!   ----------/ failure: repeat 3 spaced "bar"
//! ```
//!
//! Entries run innermost first. Each underline covers the entry's range on
//! the reported line; see [`PosRange::render_in`] for the glyphs.

use super::attempt_tree::{AttemptTree, NodeId};
use super::pos_range::{PosRange, SourceLine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;

/// Result of running a parslet
pub type PResult<T> = Result<T, Failure>;

/// Label used when a report has nothing better to say
pub const UNKNOWN_LABEL: &str = "<unknown>";

/// What a parser expected, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Offset the parser started at
    pub at: usize,
    /// Label of the parser that failed
    pub label: Arc<str>,
    /// Text found instead, when the parser looked at any
    pub found: Option<String>,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} at offset {}", self.label, self.at)?;
        if let Some(ref found) = self.found {
            write!(f, ", found {:?}", found)?;
        }
        Ok(())
    }
}

/// In-flight failure of a single parser invocation
#[derive(Debug)]
pub enum Failure {
    /// The parser did not match; alternation may try something else
    Expected(Expectation),

    /// The parser did not match inside a `cut`; nothing absorbs this
    Committed(Expectation),

    /// Nesting exceeded `ParseConfig::max_depth`
    DepthLimit {
        /// Depth reached
        depth: usize,
        /// Configured maximum
        max_depth: usize,
    },

    /// The underlying source failed
    Io(io::Error),
}

impl Failure {
    /// A recoverable failure at `at`
    pub fn expected(at: usize, label: impl Into<Arc<str>>) -> Self {
        Failure::Expected(Expectation {
            at,
            label: label.into(),
            found: None,
        })
    }

    /// A recoverable failure at `at` that saw `found`
    pub fn expected_found(at: usize, label: impl Into<Arc<str>>, found: impl Into<String>) -> Self {
        Failure::Expected(Expectation {
            at,
            label: label.into(),
            found: Some(found.into()),
        })
    }

    /// Whether alternation may absorb this failure
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Failure::Expected(_))
    }

    /// Turn a recoverable failure into a committed one
    pub fn commit(self) -> Self {
        match self {
            Failure::Expected(e) => Failure::Committed(e),
            other => other,
        }
    }

    /// The expectation behind an expected or committed failure
    pub fn expectation(&self) -> Option<&Expectation> {
        match self {
            Failure::Expected(e) | Failure::Committed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Expected(e) => write!(f, "{}", e),
            Failure::Committed(e) => write!(f, "{} (committed)", e),
            Failure::DepthLimit { depth, max_depth } => write!(
                f,
                "parser nesting depth {} exceeds maximum {}",
                depth, max_depth
            ),
            Failure::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Failure {
    fn from(e: io::Error) -> Self {
        Failure::Io(e)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Outcome of a reported attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The attempt matched
    Success,
    /// The attempt did not match
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

/// One attempt chosen for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Input the attempt covered
    pub range: PosRange,
    /// Label of the parser
    pub label: String,
    /// Whether it matched
    pub outcome: Outcome,
}

/// Renderer-independent description of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Label of the most relevant failed expectation
    pub expected: String,
    /// Offset of furthest progress
    pub furthest: usize,
    /// Column (1-based, in characters) of furthest progress
    pub column: usize,
    /// Line holding the furthest progress
    pub line: SourceLine,
    /// Attempts at the point of furthest progress, innermost first
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Build a report from a full attempt tree
    ///
    /// `line` must be the source line holding the tree's furthest start.
    pub fn from_tree(tree: &AttemptTree, line: SourceLine) -> Self {
        let furthest = tree.furthest_start();
        let at_furthest = tree.at_furthest();
        let trimmed = tree.trim_to(&at_furthest);

        let entries = trimmed
            .post_order()
            .into_iter()
            .map(|id| {
                let node = &trimmed[id];
                ReportEntry {
                    range: node.range,
                    label: node.label.to_string(),
                    outcome: if node.failed {
                        Outcome::Failure
                    } else {
                        Outcome::Success
                    },
                }
            })
            .collect::<Vec<_>>();

        let expected = headline(tree, &at_furthest)
            .or_else(|| {
                entries
                    .iter()
                    .find(|e| e.outcome == Outcome::Failure)
                    .map(|e| e.label.clone())
            })
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        Self {
            expected,
            furthest,
            column: line.column_of(furthest),
            line,
            entries,
        }
    }
}

/// The outermost failed node at the furthest start; the latest attempt
/// wins among equally deep nodes
fn headline(tree: &AttemptTree, at_furthest: &[NodeId]) -> Option<String> {
    at_furthest
        .iter()
        .filter(|&&id| tree[id].failed)
        .min_by_key(|&&id| (tree.depth(id), std::cmp::Reverse(id)))
        .map(|&id| tree[id].label.to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "expected {} at line {}, column {}",
            self.expected, self.line.number, self.column
        )?;
        writeln!(f, "line {}:", self.line.number)?;
        write!(f, "  {}", self.line.text)?;
        for entry in &self.entries {
            let underline = self.line.underline(&entry.range);
            if underline.is_empty() {
                write!(f, "\n  {}: {}", entry.outcome, entry.label)?;
            } else {
                write!(f, "\n  {} {}: {}", underline, entry.outcome, entry.label)?;
            }
        }
        Ok(())
    }
}

/// A failed top-level parse: the full attempt tree and its report
#[derive(Debug, Clone)]
pub struct ParseFailure {
    tree: AttemptTree,
    report: Report,
    committed: bool,
}

impl ParseFailure {
    pub(crate) fn new(tree: AttemptTree, line: SourceLine, committed: bool) -> Self {
        let report = Report::from_tree(&tree, line);
        Self {
            tree,
            report,
            committed,
        }
    }

    /// Line number (1-based) of the furthest progress
    pub fn line_number(&self) -> usize {
        self.report.line.number
    }

    /// Column (1-based, in characters) of the furthest progress
    pub fn column(&self) -> usize {
        self.report.column
    }

    /// Text of the line holding the furthest progress
    pub fn line_text(&self) -> &str {
        &self.report.line.text
    }

    /// The line holding the furthest progress
    pub fn line(&self) -> &SourceLine {
        &self.report.line
    }

    /// Offset of the furthest progress
    pub fn furthest(&self) -> usize {
        self.report.furthest
    }

    /// Label of the most relevant failed expectation
    pub fn expected(&self) -> &str {
        &self.report.expected
    }

    /// Attempts chosen for display, innermost first
    pub fn entries(&self) -> &[ReportEntry] {
        &self.report.entries
    }

    /// Whether the failure came from inside a `cut`
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// The full, untrimmed attempt tree
    pub fn tree(&self) -> &AttemptTree {
        &self.tree
    }

    /// The report, for custom renderers
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The multi-line ASCII report
    pub fn render(&self) -> String {
        self.report.to_string()
    }

    /// The report as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report)
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)
    }
}

impl std::error::Error for ParseFailure {}

/// Error returned by a top-level parse
#[derive(Debug)]
pub enum ParseError {
    /// The input did not match
    Failed(Box<ParseFailure>),

    /// Parser nesting exceeded the configured maximum
    DepthLimitExceeded {
        /// Depth reached
        depth: usize,
        /// Configured maximum
        max_depth: usize,
    },

    /// The underlying source failed
    Io(io::Error),
}

impl ParseError {
    /// The failure report, for [`ParseError::Failed`]
    pub fn failure(&self) -> Option<&ParseFailure> {
        match self {
            ParseError::Failed(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Failed(failure) => write!(f, "{}", failure),
            ParseError::DepthLimitExceeded { depth, max_depth } => {
                write!(
                    f,
                    "Parser nesting depth {} exceeds maximum {}",
                    depth, max_depth
                )
            }
            ParseError::Io(e) => write!(f, "I/O error while parsing: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Failed(failure) => Some(failure.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}
