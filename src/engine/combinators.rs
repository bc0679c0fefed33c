//! Combinator catalog
//!
//! Primitives (`string`, `any_char`, `char_in`, `decimal`, ...) and the ways
//! of composing parsers: sequencing, alternation, repetition, lookahead and
//! laziness.
//!
//! Structural combinators (`then`, `before`, `and`, `map`, `try_map`, `to`,
//! `concat`, `join`, `cut`, `lazy`) splice their node out of the attempt
//! tree, so reports show the parsers they combine instead. Repetition,
//! choice and lookahead keep their node.
//!
//! ```rust
//! use retrace::prelude::*;
//!
//! let word = many1(char_class("[a-z]").unwrap()).join();
//! let list = between(string("["), string("]"), sep_by(word, string(",")));
//! assert_eq!(list.parse("[ab,c]").unwrap(), vec!["ab", "c"]);
//! ```

use super::char_class::CharacterPattern;
use super::context::Context;
use super::error::{Failure, PResult};
use super::parser::{NodeShape, Parser};
use hashbrown::HashSet;
use regex::Regex;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};

// ============================================================================
// Primitives
// ============================================================================

/// Match a literal string
///
/// Labelled with the quoted literal, e.g. `"foo"`.
pub fn string(literal: impl Into<String>) -> Parser<String> {
    let literal: String = literal.into();
    let len = literal.chars().count();
    let label: Arc<str> = Arc::from(format!("{:?}", literal));
    let expected = Arc::clone(&label);
    Parser::new(label, move |ctx| {
        let at = ctx.pos();
        let found = ctx.read(len)?;
        if found == literal {
            Ok(literal.clone())
        } else {
            let found = found.to_owned();
            ctx.expected_found(at, &expected, &found)
        }
    })
}

/// Alias of [`string`]
#[inline]
pub fn lit(literal: impl Into<String>) -> Parser<String> {
    string(literal)
}

/// Match any single character
pub fn any_char() -> Parser<char> {
    char_where("any char", |_| true)
}

/// Match one character satisfying `pred`
pub fn char_where<F>(label: impl Into<Arc<str>>, pred: F) -> Parser<char>
where
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    let label: Arc<str> = label.into();
    let expected = Arc::clone(&label);
    Parser::new(label, move |ctx| {
        let at = ctx.pos();
        match ctx.read_char()? {
            Some(c) if pred(c) => Ok(c),
            Some(c) => ctx.expected_found(at, &expected, c.encode_utf8(&mut [0; 4])),
            None => ctx.expected(at, &expected),
        }
    })
}

/// Match one character the regex matches
///
/// The regex is tested against the character on its own, so anchors are
/// not needed.
pub fn char_matching(re: Regex) -> Parser<char> {
    let label = format!("char matching /{}/", re.as_str());
    char_where(label, move |c| re.is_match(c.encode_utf8(&mut [0; 4])))
}

/// Match one character from `set`
pub fn char_in(set: &str) -> Parser<char> {
    let label = format!("char in {:?}", set);
    let chars: HashSet<char> = set.chars().collect();
    char_where(label, move |c| chars.contains(&c))
}

/// Match one character of a [`CharacterPattern`] class
pub fn char_pattern(pattern: CharacterPattern) -> Parser<char> {
    char_where(pattern.name(), move |c| pattern.matches(c))
}

/// Match one character of a regex-style class such as `\d` or `[a-z]`
///
/// Well-known classes are matched without a regex; anything else is
/// compiled as a single-character regex.
pub fn char_class(pattern: &str) -> Result<Parser<char>, regex::Error> {
    if let Some(class) = CharacterPattern::from_pattern(pattern) {
        return Ok(char_pattern(class));
    }
    let re = Regex::new(&format!("^(?:{})$", pattern))?;
    Ok(char_where(format!("char matching /{}/", pattern), move |c| {
        re.is_match(c.encode_utf8(&mut [0; 4]))
    }))
}

/// Match a hexadecimal digit
pub fn hex_digit() -> Parser<char> {
    char_pattern(CharacterPattern::HexDigit)
}

/// Match one or more ASCII digits
pub fn digits() -> Parser<String> {
    many1(char_pattern(CharacterPattern::Digit))
        .join()
        .label("digits")
        .primitive()
}

/// Match an unsigned decimal integer
///
/// Signs are not part of this primitive. Values are limited to `u64`: an
/// overflowing literal fails with `number` at its first digit. For
/// arbitrarily large values, parse the text with [`digits`] and convert it
/// yourself:
///
/// ```rust
/// use retrace::prelude::*;
///
/// let big = digits().before(eof());
/// assert_eq!(big.parse("18446744073709551616").unwrap(), "18446744073709551616");
/// assert!(decimal().parse("18446744073709551616").is_err());
/// ```
pub fn decimal() -> Parser<u64> {
    digits()
        .try_map(|s| s.parse::<u64>())
        .label("number")
        .primitive()
}

/// Match zero or more whitespace characters
pub fn whitespace() -> Parser<String> {
    many(char_pattern(CharacterPattern::Space))
        .join()
        .label("whitespace")
        .primitive()
}

/// Match one or more whitespace characters
pub fn whitespace1() -> Parser<String> {
    many1(char_pattern(CharacterPattern::Space))
        .join()
        .label("whitespace")
        .primitive()
}

/// Match the end of input
pub fn eof() -> Parser<()> {
    let label: Arc<str> = Arc::from("eof");
    let expected = Arc::clone(&label);
    Parser::new(label, move |ctx| {
        let at = ctx.pos();
        if ctx.at_eof()? {
            return Ok(());
        }
        let found = ctx.peek(1)?;
        ctx.expected_found(at, &expected, &found)
    })
}

/// Succeed without consuming anything
pub fn pure<T>(value: T) -> Parser<T>
where
    T: Clone + Send + Sync + 'static,
{
    Parser::new("pure", move |_| Ok(value.clone())).with_shape(NodeShape::SPLICED)
}

/// Always fail with `label`
pub fn fail<T: 'static>(label: impl Into<Arc<str>>) -> Parser<T> {
    let label: Arc<str> = label.into();
    let expected = Arc::clone(&label);
    Parser::new(label, move |ctx| ctx.expected(ctx.pos(), &expected))
}

// ============================================================================
// Repetition
// ============================================================================

/// Apply `p` until it fails or input ends
///
/// Never fails on a mismatch. A `p` that succeeds without consuming input
/// before end of input loops forever.
pub fn many<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(format!("many {}", p.name()), move |ctx| {
        let mut out = Vec::new();
        repeat_into(&p, ctx, &mut out)?;
        Ok(out)
    })
}

/// Like [`many`], requiring at least one match
pub fn many1<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(format!("many1 {}", p.name()), move |ctx| {
        let mut out = vec![p.run(ctx)?];
        repeat_into(&p, ctx, &mut out)?;
        Ok(out)
    })
}

fn repeat_into<T: 'static>(
    p: &Parser<T>,
    ctx: &mut Context<'_, '_>,
    out: &mut Vec<T>,
) -> PResult<()> {
    while !ctx.at_eof()? {
        match p.run(ctx) {
            Ok(v) => out.push(v),
            Err(f) if f.is_recoverable() => break,
            Err(f) => return Err(f),
        }
    }
    Ok(())
}

/// Apply `p` exactly `n` times
pub fn repeat<T: 'static>(p: Parser<T>, n: usize) -> Parser<Vec<T>> {
    Parser::new(format!("repeat {} {}", n, p.name()), move |ctx| {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(p.run(ctx)?);
        }
        Ok(out)
    })
}

/// Try `p`, yielding `None` instead of failing
pub fn optional<T: 'static>(p: Parser<T>) -> Parser<Option<T>> {
    Parser::new(format!("optional {}", p.name()), move |ctx| match p.run(ctx) {
        Ok(v) => Ok(Some(v)),
        Err(f) if f.is_recoverable() => Ok(None),
        Err(f) => Err(f),
    })
}

/// Zero or more `p` separated by `sep`
///
/// A trailing separator is left unconsumed.
pub fn sep_by<T: 'static, S: 'static>(p: Parser<T>, sep: Parser<S>) -> Parser<Vec<T>> {
    let label = format!("{} separated by {}", p.name(), sep.name());
    Parser::new(label, move |ctx| {
        let mut out = Vec::new();
        if ctx.at_eof()? {
            return Ok(out);
        }
        match p.run(ctx) {
            Ok(v) => out.push(v),
            Err(f) if f.is_recoverable() => return Ok(out),
            Err(f) => return Err(f),
        }
        sep_tail(&p, &sep, ctx, &mut out)?;
        Ok(out)
    })
}

/// One or more `p` separated by `sep`
pub fn sep_by1<T: 'static, S: 'static>(p: Parser<T>, sep: Parser<S>) -> Parser<Vec<T>> {
    let label = format!("{} separated by {}", p.name(), sep.name());
    Parser::new(label, move |ctx| {
        let mut out = vec![p.run(ctx)?];
        sep_tail(&p, &sep, ctx, &mut out)?;
        Ok(out)
    })
}

fn sep_tail<T: 'static, S: 'static>(
    p: &Parser<T>,
    sep: &Parser<S>,
    ctx: &mut Context<'_, '_>,
    out: &mut Vec<T>,
) -> PResult<()> {
    while !ctx.at_eof()? {
        let mark = ctx.pos();
        match sep.run(ctx) {
            Ok(_) => {}
            Err(f) if f.is_recoverable() => break,
            Err(f) => return Err(f),
        }
        match p.run(ctx) {
            Ok(v) => out.push(v),
            Err(f) if f.is_recoverable() => {
                ctx.restore_to(mark);
                break;
            }
            Err(f) => return Err(f),
        }
    }
    Ok(())
}

// ============================================================================
// Alternation
// ============================================================================

/// Try each alternative in turn, from the same position
///
/// Fails with `one of <labels>` when every alternative fails.
pub fn choice<T: 'static>(arms: Vec<Parser<T>>) -> Parser<T> {
    let label: Arc<str> = Arc::from(format!(
        "one of {}",
        arms.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    ));
    let expected = Arc::clone(&label);
    let arms = Arc::new(arms);
    let tried = Arc::clone(&arms);
    let mut parser = Parser::new(label, move |ctx| {
        for arm in tried.iter() {
            match arm.run(ctx) {
                Ok(v) => return Ok(v),
                Err(f) if f.is_recoverable() => continue,
                Err(f) => return Err(f),
            }
        }
        ctx.expected(ctx.pos(), &expected)
    });
    parser.arms = Some(arms);
    parser
}

/// Commit to `p`: its failures can no longer be absorbed by alternation,
/// repetition, `optional` or lookahead
pub fn cut<T: 'static>(p: Parser<T>) -> Parser<T> {
    let label = Arc::clone(p.label_arc());
    Parser::new(label, move |ctx| p.run(ctx).map_err(Failure::commit))
        .with_shape(NodeShape::SPLICED)
}

// ============================================================================
// Grouping and lookahead
// ============================================================================

/// Parse `open`, then `p`, then `close`, yielding `p`'s value
pub fn between<O: 'static, C: 'static, T: 'static>(
    open: Parser<O>,
    close: Parser<C>,
    p: Parser<T>,
) -> Parser<T> {
    let label = format!("{} {} {}", open.name(), p.name(), close.name());
    Parser::new(label, move |ctx| {
        open.run(ctx)?;
        let value = p.run(ctx)?;
        close.run(ctx)?;
        Ok(value)
    })
}

/// `p` surrounded by optional whitespace
pub fn spaced<T: 'static>(p: Parser<T>) -> Parser<T> {
    let label = format!("spaced {}", p.name());
    between(whitespace(), whitespace(), p).label(label)
}

/// Run `p` and put the cursor back where it was, whatever the outcome
pub fn peek<T: 'static>(p: Parser<T>) -> Parser<T> {
    Parser::new(format!("peek {}", p.name()), move |ctx| {
        let at = ctx.pos();
        let result = p.run(ctx);
        ctx.restore_to(at);
        result
    })
}

// ============================================================================
// Laziness
// ============================================================================

/// Defer building a parser until it is first run
///
/// The built parser is kept for later runs.
pub fn lazy<T: 'static, F>(factory: F) -> Parser<T>
where
    F: Fn() -> Parser<T> + Send + Sync + 'static,
{
    let built: OnceLock<Parser<T>> = OnceLock::new();
    Parser::new("lazy", move |ctx| built.get_or_init(&factory).run(ctx))
        .with_shape(NodeShape::SPLICED)
}

/// Build a self-referential parser
///
/// `f` receives a handle standing for the parser being defined.
///
/// # Panics
///
/// The handle only holds a weak reference: running it (or anything built
/// from it) after the returned parser has been dropped panics.
///
/// ```rust
/// use retrace::prelude::*;
///
/// let nested = recursive(|nested| {
///     between(string("("), string(")"), optional(nested))
///         .map(|inner| inner.map_or(1, |depth: usize| depth + 1))
/// });
/// assert_eq!(nested.parse("((()))").unwrap(), 3);
/// ```
pub fn recursive<T: 'static, F>(f: F) -> Parser<T>
where
    F: FnOnce(Parser<T>) -> Parser<T>,
{
    let slot: Arc<OnceLock<Parser<T>>> = Arc::new(OnceLock::new());
    let weak = Arc::downgrade(&slot);
    let handle = Parser::new("recursive", move |ctx| {
        let Some(slot) = weak.upgrade() else {
            panic!("recursive parser handle used after its definition was dropped");
        };
        match slot.get() {
            Some(p) => p.run(ctx),
            None => panic!("recursive parser run before its definition completed"),
        }
    })
    .with_shape(NodeShape::SPLICED);

    let body = f(handle);
    let label = Arc::clone(body.label_arc());
    let _ = slot.set(body);
    Parser::new(label, move |ctx| match slot.get() {
        Some(p) => p.run(ctx),
        None => panic!("recursive parser run before its definition completed"),
    })
    .with_shape(NodeShape::SPLICED)
}

// ============================================================================
// Joining
// ============================================================================

/// Pieces of text that [`join`] can glue together
pub trait Fragment {
    /// Append this fragment to `out`
    fn push_onto(&self, out: &mut String);
}

impl Fragment for char {
    fn push_onto(&self, out: &mut String) {
        out.push(*self);
    }
}

impl Fragment for String {
    fn push_onto(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl Fragment for &'static str {
    fn push_onto(&self, out: &mut String) {
        out.push_str(self);
    }
}

/// Concatenate the fragments `p` yields into one string
pub fn join<F: Fragment + 'static>(p: Parser<Vec<F>>) -> Parser<String> {
    p.map(|parts| {
        let mut out = String::new();
        for part in &parts {
            part.push_onto(&mut out);
        }
        out
    })
}

impl<F: Fragment + 'static> Parser<Vec<F>> {
    /// See [`join`]
    pub fn join(self) -> Parser<String> {
        join(self)
    }
}

impl Parser<String> {
    /// Run `self` then `next`, concatenating their text
    pub fn concat(self, next: Parser<String>) -> Parser<String> {
        self.and(next).map(|(mut a, b)| {
            a.push_str(&b);
            a
        })
    }
}

// ============================================================================
// Composition methods
// ============================================================================

impl<T: 'static> Parser<T> {
    /// Run `self` then `next`, yielding `next`'s value
    pub fn then<U: 'static>(self, next: Parser<U>) -> Parser<U> {
        let label = format!("{} then {}", self.name(), next.name());
        Parser::new(label, move |ctx| {
            self.run(ctx)?;
            next.run(ctx)
        })
        .with_shape(NodeShape::SPLICED)
    }

    /// Run `self` then `next`, yielding `self`'s value
    pub fn before<U: 'static>(self, next: Parser<U>) -> Parser<T> {
        let label = format!("{} before {}", self.name(), next.name());
        Parser::new(label, move |ctx| {
            let value = self.run(ctx)?;
            next.run(ctx)?;
            Ok(value)
        })
        .with_shape(NodeShape::SPLICED)
    }

    /// Run `self` then `next`, yielding both values
    pub fn and<U: 'static>(self, next: Parser<U>) -> Parser<(T, U)> {
        let label = format!("{} and {}", self.name(), next.name());
        Parser::new(label, move |ctx| {
            let first = self.run(ctx)?;
            let second = next.run(ctx)?;
            Ok((first, second))
        })
        .with_shape(NodeShape::SPLICED)
    }

    /// Try `self`; if it fails, try `other` from the same position
    ///
    /// Chains flatten: `a.or(b).or(c)` is one choice of three.
    pub fn or(self, other: Parser<T>) -> Parser<T> {
        let mut arms = match self.arms.clone() {
            Some(arms) => arms.to_vec(),
            None => vec![self],
        };
        match other.arms.clone() {
            Some(more) => arms.extend(more.iter().cloned()),
            None => arms.push(other),
        }
        choice(arms)
    }

    /// Transform a successful value
    pub fn map<U: 'static, F>(self, f: F) -> Parser<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let label = Arc::clone(self.label_arc());
        Parser::new(label, move |ctx| self.run(ctx).map(&f)).with_shape(NodeShape::SPLICED)
    }

    /// Alias of [`Parser::map`]
    #[inline]
    pub fn fmap<U: 'static, F>(self, f: F) -> Parser<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map(f)
    }

    /// Transform a successful value, or reject it
    ///
    /// A rejection is a recoverable failure covering the text `self`
    /// matched, labelled with the error's `Display`.
    pub fn try_map<U: 'static, E: Display, F>(self, f: F) -> Parser<U>
    where
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        let label = Arc::clone(self.label_arc());
        Parser::new(label, move |ctx| {
            let at = ctx.pos();
            let value = self.run(ctx)?;
            f(value).map_err(|e| ctx.reject(at, e.to_string()))
        })
        .with_shape(NodeShape::SPLICED)
    }

    /// Replace a successful value
    pub fn to<U>(self, value: U) -> Parser<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.map(move |_| value.clone())
    }

    /// Succeed with `self`'s value only where `not` fails to match
    ///
    /// `not` is tried first, at the same position, and never consumes input.
    pub fn that_fails<U: 'static>(self, not: Parser<U>) -> Parser<T> {
        let label: Arc<str> = Arc::from(format!("{} but not {}", self.name(), not.name()));
        let expected = Arc::clone(&label);
        Parser::new(label, move |ctx| {
            let at = ctx.pos();
            match not.run(ctx) {
                Ok(_) => {
                    ctx.restore_to(at);
                    return ctx.expected(at, &expected);
                }
                Err(f) if f.is_recoverable() => {}
                Err(f) => return Err(f),
            }
            self.run(ctx)
        })
    }
}
