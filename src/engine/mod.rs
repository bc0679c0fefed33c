//! Combinator engine
//!
//! # Module Organization
//!
//! ## Cursor
//! - [`backed_io`] - Backtracking cursor over strings and streams
//! - [`char_class`] - Character classes and UTF-8 helpers
//!
//! ## Positions
//! - [`pos_range`] - Half-open position ranges and source lines
//!
//! ## Diagnostics
//! - [`attempt_tree`] - Arena-backed tree of parser attempts
//! - [`error`] - In-flight failures, top-level errors and failure reports
//!
//! ## Parsers
//! - [`context`] - Per-invocation parsing state
//! - [`parser`] - The [`Parser`] type and the [`Parslet`] trait
//! - [`combinators`] - The combinator catalog

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// ============================================================================
// Module Declarations
// ============================================================================

pub mod attempt_tree;
pub mod backed_io;
pub mod char_class;
pub mod combinators;
pub mod context;
pub mod error;
pub mod parser;
pub mod pos_range;

// ============================================================================
// Core Types
// ============================================================================

pub use context::Context;
pub use parser::{ParseConfig, Parser, Parslet};

// ============================================================================
// Cursor
// ============================================================================

pub use backed_io::{BackedIo, DEFAULT_READ_CAPACITY};
pub use char_class::CharacterPattern;

// ============================================================================
// Positions
// ============================================================================

pub use pos_range::{offset_to_line_col, PosRange, SourceLine};

// ============================================================================
// Error Handling
// ============================================================================

pub use attempt_tree::{AttemptTree, NodeId, ParsedRange};
pub use error::{
    Expectation, Failure, Outcome, PResult, ParseError, ParseFailure, Report, ReportEntry,
};

// ============================================================================
// Combinators
// ============================================================================

pub use combinators::{
    any_char, between, char_class, char_in, char_matching, char_pattern, char_where, choice, cut,
    decimal, digits, eof, fail, hex_digit, join, lazy, lit, many, many1, optional, peek, pure,
    recursive, repeat, sep_by, sep_by1, spaced, string, whitespace, whitespace1, Fragment,
};
