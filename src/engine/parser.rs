//! The parser type
//!
//! A [`Parser<T>`] is an immutable, cheaply cloned handle around a
//! [`Parslet<T>`], the single-method trait every parser implements. Parsers
//! are built once and run many times; running never mutates them.
//!
//! Every run goes through [`Parser::run`], which records an attempt-tree
//! node for the invocation and restores the cursor when the parslet fails.
//! Parslets themselves only read and report.

use super::attempt_tree::AttemptTree;
use super::backed_io::{BackedIo, DEFAULT_READ_CAPACITY};
use super::context::Context;
use super::error::{Failure, PResult, ParseError, ParseFailure, UNKNOWN_LABEL};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Default maximum nesting depth (0 = unlimited)
pub const DEFAULT_MAX_DEPTH: usize = 0;

/// Configuration for a top-level invocation
///
/// # Example
///
/// ```rust
/// use retrace::engine::parser::ParseConfig;
///
/// let config = ParseConfig::new()
///     .with_max_depth(256)
///     .with_read_capacity(64 * 1024);
/// assert_eq!(config.max_depth, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting of parser invocations (0 = unlimited)
    pub max_depth: usize,

    /// `BufReader` capacity used for stream sources
    pub read_capacity: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            read_capacity: DEFAULT_READ_CAPACITY,
        }
    }
}

impl ParseConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the stream read capacity
    pub fn with_read_capacity(mut self, bytes: usize) -> Self {
        self.read_capacity = bytes;
        self
    }
}

/// Something that can parse a `T` from a [`Context`]
///
/// Implement this for custom parsers, or pass a closure to [`Parser::new`].
/// Implementations may leave the cursor anywhere on failure: the
/// [`Parser`] wrapper restores it.
pub trait Parslet<T>: Send + Sync {
    /// Parse a value at the cursor
    fn parse(&self, ctx: &mut Context<'_, '_>) -> PResult<T>;
}

impl<T, F> Parslet<T> for F
where
    F: Fn(&mut Context<'_, '_>) -> PResult<T> + Send + Sync,
{
    #[inline]
    fn parse(&self, ctx: &mut Context<'_, '_>) -> PResult<T> {
        self(ctx)
    }
}

/// How a parser's attempt-tree node is shaped once it completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NodeShape {
    /// Replace the node with its children
    pub splice: bool,
    /// Bound `splice_end` dissolution
    pub anchor: bool,
    /// Dissolve ancestors up to the nearest anchor
    pub splice_end: bool,
    /// Drop the node's children
    pub primitive: bool,
}

impl NodeShape {
    pub(crate) const SPLICED: NodeShape = NodeShape {
        splice: true,
        anchor: false,
        splice_end: false,
        primitive: false,
    };
}

/// An immutable parser producing `T`
pub struct Parser<T> {
    parslet: Arc<dyn Parslet<T>>,
    label: Arc<str>,
    shape: NodeShape,
    /// Alternatives of an unlabelled choice, for flattening `a.or(b).or(c)`
    pub(crate) arms: Option<Arc<Vec<Parser<T>>>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            parslet: Arc::clone(&self.parslet),
            label: Arc::clone(&self.label),
            shape: self.shape,
            arms: self.arms.clone(),
        }
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("label", &self.label)
            .field("shape", &self.shape)
            .finish()
    }
}

impl<T: 'static> Parser<T> {
    /// Build a parser from a closure
    ///
    /// ```rust
    /// use retrace::prelude::*;
    ///
    /// let upper = Parser::new("uppercase letter", |ctx| {
    ///     let at = ctx.pos();
    ///     match ctx.read_char()? {
    ///         Some(c) if c.is_ascii_uppercase() => Ok(c),
    ///         _ => Err(Failure::expected(at, "uppercase letter")),
    ///     }
    /// });
    /// assert_eq!(upper.parse("Q").unwrap(), 'Q');
    /// assert!(upper.parse("q").is_err());
    /// ```
    pub fn new<F>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut Context<'_, '_>) -> PResult<T> + Send + Sync + 'static,
    {
        Self::from_parslet(label, f)
    }

    /// Build an unlabelled parser from a closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut Context<'_, '_>) -> PResult<T> + Send + Sync + 'static,
    {
        Self::from_parslet(UNKNOWN_LABEL, f)
    }

    /// Wrap a [`Parslet`] implementation
    pub fn from_parslet<P: Parslet<T> + 'static>(label: impl Into<Arc<str>>, parslet: P) -> Self {
        Self {
            parslet: Arc::new(parslet),
            label: label.into(),
            shape: NodeShape::default(),
            arms: None,
        }
    }

    pub(crate) fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    // ------------------------------------------------------------------
    // Labels and node shape
    // ------------------------------------------------------------------

    /// The diagnostic label
    pub fn name(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_arc(&self) -> &Arc<str> {
        &self.label
    }

    /// Attach a diagnostic name
    ///
    /// Labelling never changes what the parser accepts. A labelled parser
    /// always shows up as its own node in failure reports, even when it was
    /// built by a structural combinator such as [`Parser::then`].
    pub fn label(mut self, name: impl Into<Arc<str>>) -> Self {
        self.label = name.into();
        self.shape.splice = false;
        self.arms = None;
        self
    }

    /// Replace this parser's node with its children once it completes
    pub fn splice(mut self) -> Self {
        self.shape.splice = true;
        self
    }

    /// Mark this parser's node as the boundary for [`Parser::splice_end`]
    pub fn splice_start(mut self) -> Self {
        self.shape.anchor = true;
        self
    }

    /// On completion, splice out every enclosing node below the nearest
    /// [`Parser::splice_start`] node (or the root)
    ///
    /// Enclosing nodes still running are spliced when they complete.
    pub fn splice_end(mut self) -> Self {
        self.shape.splice_end = true;
        self
    }

    /// Report this parser as a leaf: its children are dropped from the
    /// attempt tree once it completes
    pub fn primitive(mut self) -> Self {
        self.shape.primitive = true;
        self
    }

    // ------------------------------------------------------------------
    // Running
    // ------------------------------------------------------------------

    /// Run this parser inside a context
    ///
    /// Records one attempt-tree node. On failure the node's end is the
    /// furthest position reached, and the cursor is restored to where this
    /// invocation started before the failure propagates.
    pub fn run(&self, ctx: &mut Context<'_, '_>) -> PResult<T> {
        let start = ctx.pos();
        let id = ctx.enter(&self.label, self.shape)?;
        let result = self.parslet.parse(ctx);
        let end = ctx.pos();
        let failed = result.is_err();
        if failed {
            ctx.restore_to(start);
        }
        ctx.exit(id, end, failed, self.shape);
        result
    }

    /// Parse an in-memory string
    pub fn parse(&self, input: &str) -> Result<T, ParseError> {
        self.parse_with_config(input, &ParseConfig::default())
    }

    /// Parse an in-memory string with an explicit configuration
    pub fn parse_with_config(&self, input: &str, config: &ParseConfig) -> Result<T, ParseError> {
        let mut io = BackedIo::from_text(input);
        self.parse_io_with_config(&mut io, config)
    }

    /// Parse from a byte stream
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<T, ParseError> {
        self.parse_reader_with_config(reader, &ParseConfig::default())
    }

    /// Parse from a byte stream with an explicit configuration
    pub fn parse_reader_with_config<R: Read>(
        &self,
        reader: R,
        config: &ParseConfig,
    ) -> Result<T, ParseError> {
        let mut io = BackedIo::from_reader_with_capacity(reader, config.read_capacity);
        self.parse_io_with_config(&mut io, config)
    }

    /// Parse from a persistent cursor, consuming what matched
    ///
    /// The cursor can be reused for further invocations. Text before the
    /// current line is released once the invocation ends, unless it runs
    /// nested inside another invocation on the same cursor.
    pub fn parse_io(&self, io: &mut BackedIo<'_>) -> Result<T, ParseError> {
        self.parse_io_with_config(io, &ParseConfig::default())
    }

    /// [`Parser::parse_io`] with an explicit configuration
    pub fn parse_io_with_config(
        &self,
        io: &mut BackedIo<'_>,
        config: &ParseConfig,
    ) -> Result<T, ParseError> {
        let out = self.invoke(io, config);
        io.release();
        out
    }

    /// Parse from a persistent cursor without consuming anything
    pub fn peek(&self, io: &mut BackedIo<'_>) -> Result<T, ParseError> {
        let start = io.pos();
        let out = self.invoke(io, &ParseConfig::default());
        io.restore_to(start);
        out
    }

    /// Check whether this parser matches the start of `input`
    pub fn would_succeed(&self, input: &str) -> bool {
        self.parse(input).is_ok()
    }

    /// Check whether this parser matches at the cursor, without consuming
    ///
    /// Only a non-matching input yields `Ok(false)`; I/O failures and depth
    /// limits are passed through.
    pub fn would_succeed_io(&self, io: &mut BackedIo<'_>) -> Result<bool, ParseError> {
        match self.peek(io) {
            Ok(_) => Ok(true),
            Err(ParseError::Failed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn invoke(&self, io: &mut BackedIo<'_>, config: &ParseConfig) -> Result<T, ParseError> {
        log_debug!("parsing {} at offset {}", self.label, io.pos());
        let mut tree = AttemptTree::new(io.pos());
        let result = io.speculate(|io| {
            let mut ctx = Context::new(io, config);
            let result = self.run(&mut ctx);
            tree = ctx.into_tree();
            result
        });

        match result {
            Ok(value) => {
                log_trace!("{} matched up to offset {}", self.label, io.pos());
                Ok(value)
            }
            Err(failure @ (Failure::Expected(_) | Failure::Committed(_))) => {
                let committed = !failure.is_recoverable();
                let line = io.line_at(tree.furthest_start())?;
                let failure = ParseFailure::new(tree, line, committed);
                log_debug!(
                    "{} failed: expected {} at line {}, column {}",
                    self.label,
                    failure.expected(),
                    failure.line_number(),
                    failure.column()
                );
                Err(ParseError::Failed(Box::new(failure)))
            }
            Err(Failure::DepthLimit { depth, max_depth }) => {
                log_debug!("{} exceeded depth limit {}", self.label, max_depth);
                Err(ParseError::DepthLimitExceeded { depth, max_depth })
            }
            Err(Failure::Io(e)) => Err(ParseError::Io(e)),
        }
    }
}
