//! Retrace - Backtracking Parser Combinators with Attempt-Tree Diagnostics
//!
//! Grammars are composed from small [`Parser`] values at construction time
//! and run against strings or byte streams. Every parser invocation is
//! recorded in an attempt tree, so a failure can point at the furthest
//! point of progress together with the nested expectations active there,
//! rather than only at the last shallow mismatch.
//!
//! It provides:
//! - A backtracking cursor with unbounded lookahead over non-seekable streams
//! - A closed combinator algebra: sequencing, alternation, repetition,
//!   lookahead, laziness and labelling
//! - Failure reports with clipped source underlines, plus structured access
//!   for custom renderers
//!
//! ## Quick Start
//!
//! ```rust
//! use retrace::prelude::*;
//!
//! let greeting = string("hello").then(spaced(string("world"))).before(eof());
//! assert_eq!(greeting.parse("hello world").unwrap(), "world");
//!
//! let err = greeting.parse("hello\nwurld").unwrap_err();
//! let failure = err.failure().unwrap();
//! assert_eq!(failure.line_number(), 2);
//! println!("{}", failure);
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

// Prelude module for convenient imports
pub mod prelude;

// Combinator engine
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    BackedIo, Context, Failure, PResult, ParseConfig, ParseError, ParseFailure, Parser, Parslet,
    PosRange, Report, ReportEntry,
};
