//! Integration tests for stream-backed parsing
//!
//! These tests cover:
//! - Parsing from non-seekable and seekable readers
//! - Reusing one cursor across several invocations
//! - Buffer release and line accounting
//! - I/O failures

use retrace::prelude::*;
use std::io::{self, Cursor, Read, SeekFrom};

/// Reader that hands out one byte per call, like a slow pipe
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match (self.0.split_first(), buf.first_mut()) {
            (Some((b, rest)), Some(slot)) => {
                *slot = *b;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// Reader that yields some bytes, then fails
struct Broken<'a>(&'a [u8]);

impl Read for Broken<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        }
        let n = self.0.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

fn setting() -> Parser<(String, u64)> {
    let key = many1(char_class("[a-z_]").unwrap()).join();
    key.before(spaced(string("=")))
        .and(decimal())
        .before(string("\n"))
}

// ============================================================================
// Readers
// ============================================================================

#[test]
fn test_parse_reader_matches_parse() {
    let p = sep_by1(decimal(), string(",")).before(eof());
    let input = "10,20,30";
    assert_eq!(
        p.parse_reader(Cursor::new(input.as_bytes())).unwrap(),
        p.parse(input).unwrap()
    );
}

#[test]
fn test_backtracking_over_trickled_input() {
    let p = string("abc").or(string("abd")).or(string("ab"));
    assert_eq!(p.parse_reader(Trickle(b"abd")).unwrap(), "abd");
    assert_eq!(p.parse_reader(Trickle(b"abx")).unwrap(), "ab");
}

#[test]
fn test_multibyte_characters_across_reads() {
    let p = many(any_char()).join().before(eof());
    let text = "grüße, 世界 🌍";
    assert_eq!(p.parse_reader(Trickle(text.as_bytes())).unwrap(), text);
}

#[test]
fn test_tiny_read_capacity() {
    let config = ParseConfig::new().with_read_capacity(1);
    let p = string("hello").then(spaced(string("world")));
    assert_eq!(
        p.parse_reader_with_config(Cursor::new(b"hello world"), &config)
            .unwrap(),
        "world"
    );
}

#[test]
fn test_failure_report_from_stream() {
    let p = many(setting()).before(eof());
    let err = p
        .parse_reader(Trickle(b"width = 80\nheight = tall\n"))
        .unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.line_number(), 2);
    assert_eq!(failure.line_text(), "height = tall");
    assert_eq!(failure.column(), 10);
}

// ============================================================================
// Persistent cursor
// ============================================================================

#[test]
fn test_sequential_invocations_share_cursor() {
    let mut io = BackedIo::from_reader(Trickle(b"width = 80\nheight = 24\n"));
    let first = setting().parse_io(&mut io).unwrap();
    let second = setting().parse_io(&mut io).unwrap();

    assert_eq!(first, ("width".to_string(), 80));
    assert_eq!(second, ("height".to_string(), 24));
    assert!(io.eof().unwrap());
    assert!(setting().parse_io(&mut io).is_err());
}

#[test]
fn test_release_keeps_line_numbers() {
    let mut io = BackedIo::from_reader(Trickle(b"a = 1\nb = 2\nc = x\n"));
    setting().parse_io(&mut io).unwrap();
    setting().parse_io(&mut io).unwrap();

    assert_eq!(io.buffer_start(), 12);
    assert_eq!(io.line_number(), 3);

    let err = setting().parse_io(&mut io).unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.line_number(), 3);
    assert_eq!(failure.line_text(), "c = x");
    assert_eq!(failure.furthest(), 16);
    assert_eq!(io.pos(), 12);
}

#[test]
fn test_nested_invocation_keeps_backtrack_point() {
    let nested = Parser::<String>::new("setting then marker", |ctx| {
        let at = ctx.pos();
        let _ = setting().parse_io(ctx.io());
        Err(Failure::expected(at, "marker"))
    });
    let p = nested.or(many1(any_char()).join());

    assert_eq!(p.parse("a = 1\nb").unwrap(), "a = 1\nb");

    let mut io = BackedIo::from_reader(Trickle(b"a = 1\nb = 2"));
    assert_eq!(p.parse_io(&mut io).unwrap(), "a = 1\nb = 2");
    assert_eq!(io.buffer_start(), 6);
}

#[test]
fn test_nested_invocations_consume_for_enclosing_parser() {
    let pair = Parser::new("two settings", |ctx| {
        let at = ctx.pos();
        let first = setting().parse_io(ctx.io());
        let second = setting().parse_io(ctx.io());
        match (first, second) {
            (Ok(a), Ok(b)) => Ok(vec![a, b]),
            _ => Err(Failure::expected(at, "two settings")),
        }
    });
    let p = pair.before(eof());

    let out = p.parse_reader(Trickle(b"a = 1\nb = 2\n")).unwrap();
    assert_eq!(out, vec![("a".to_string(), 1), ("b".to_string(), 2)]);

    let mut io = BackedIo::from_reader(Trickle(b"a = 1\nb = x\n"));
    let err = p.parse_io(&mut io).unwrap_err();
    assert_eq!(err.failure().unwrap().expected(), "two settings");
    assert_eq!(io.pos(), 0);
    assert_eq!(io.buffer_start(), 0);
}

#[test]
fn test_buffer_stays_bounded() {
    let mut input = Vec::new();
    for i in 0..2_000 {
        input.extend_from_slice(format!("k = {}\n", i).as_bytes());
    }
    let mut io = BackedIo::from_reader(Cursor::new(input));
    let p = setting();
    let mut count = 0;
    while !io.eof().unwrap() {
        let (_, value) = p.parse_io(&mut io).unwrap();
        assert_eq!(value, count);
        assert!(io.buffered() < 32);
        count += 1;
    }
    assert_eq!(count, 2_000);
    assert_eq!(io.line_number(), 2_001);
}

#[test]
fn test_peek_then_parse_from_stream() {
    let mut io = BackedIo::from_reader(Trickle(b"x = 1\n"));
    assert!(setting().would_succeed_io(&mut io).unwrap());
    assert!(!string("y").would_succeed_io(&mut io).unwrap());
    assert_eq!(io.pos(), 0);
    assert_eq!(setting().parse_io(&mut io).unwrap().1, 1);
}

#[test]
fn test_seek_within_buffer() {
    let mut io = BackedIo::from_reader(Trickle(b"header;payload"));
    string("header;").parse_io(&mut io).unwrap();
    assert_eq!(io.seek(SeekFrom::Current(-7)).unwrap(), 0);
    assert_eq!(string("header;payload").parse_io(&mut io).unwrap(), "header;payload");
}

// ============================================================================
// Seekable sources
// ============================================================================

#[test]
fn test_seekable_offsets_start_at_stream_position() {
    let mut cursor = Cursor::new(b"skip:value".to_vec());
    cursor.set_position(5);
    let mut io = BackedIo::from_seekable(cursor);

    assert_eq!(io.pos(), 5);
    let err = string("other").parse_io(&mut io).unwrap_err();
    assert_eq!(err.failure().unwrap().furthest(), 5);
    assert_eq!(string("value").parse_io(&mut io).unwrap(), "value");
    assert_eq!(io.pos(), 10);
}

// ============================================================================
// I/O failures
// ============================================================================

#[test]
fn test_invalid_utf8_is_io_error() {
    let err = string("ab").parse_reader(Cursor::new(b"a\xffb")).unwrap_err();
    match err {
        ParseError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn test_reader_error_is_not_absorbed_by_choice() {
    let p = string("abcdef").or(string("ab"));
    match p.parse_reader(Broken(b"abc")) {
        Err(ParseError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn test_would_succeed_io_passes_io_errors_through() {
    let mut io = BackedIo::from_reader(Broken(b""));
    assert!(string("a").would_succeed_io(&mut io).is_err());
}
