//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types, traits and
//! combinators from retrace. Importing it with a wildcard import brings the
//! whole grammar-building surface into scope:
//!
//! ```
//! use retrace::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Parser`] - An immutable parser value
//! - [`Parslet`] - Trait for custom parsers
//! - [`Context`] - Per-invocation parsing state
//! - [`ParseConfig`] - Invocation configuration
//! - [`BackedIo`] - Backtracking cursor for persistent and streamed input
//!
//! ## Combinators
//! - [`string()`], [`any_char()`], [`char_in()`], [`char_class()`] - Leaves
//! - [`decimal()`], [`digits()`], [`whitespace()`], [`eof()`] - Common tokens
//! - [`many()`], [`many1()`], [`repeat()`], [`sep_by()`], [`optional()`] - Repetition
//! - [`choice()`], [`cut()`] - Alternation and commitment
//! - [`between()`], [`spaced()`], [`peek()`] - Grouping and lookahead
//! - [`lazy()`], [`recursive()`] - Self-referential grammars
//!
//! ## Error Handling
//! - [`Failure`] - In-flight failure
//! - [`ParseError`] - Top-level error
//! - [`ParseFailure`] - Failure report with the attempt tree

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{BackedIo, Context, ParseConfig, Parser, Parslet};

// ============================================================================
// Combinators
// ============================================================================

pub use crate::engine::combinators::{
    any_char, between, char_class, char_in, char_matching, char_pattern, char_where, choice, cut,
    decimal, digits, eof, fail, hex_digit, join, lazy, lit, many, many1, optional, peek, pure,
    recursive, repeat, sep_by, sep_by1, spaced, string, whitespace, whitespace1, Fragment,
};
pub use crate::engine::CharacterPattern;

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{Failure, Outcome, PResult, ParseError, ParseFailure, ReportEntry};

// ============================================================================
// Positions
// ============================================================================

pub use crate::engine::PosRange;
