//! Backtracking cursor
//!
//! [`BackedIo`] gives character-level read access over an in-memory string
//! or any `std::io::Read` source, with arbitrary backtracking to any offset
//! still held in its buffer. Streams are pulled one UTF-8 character at a
//! time, so pipes and sockets can be parsed with unbounded lookahead.
//!
//! Offsets are absolute byte offsets. `read`, `peek` and `restore` count
//! characters.
//!
//! ```rust
//! use retrace::engine::backed_io::BackedIo;
//!
//! let mut io = BackedIo::from_text("foo\nbar");
//! assert_eq!(io.read(3).unwrap(), "foo");
//! io.restore(2);
//! assert_eq!(io.pos(), 1);
//! assert_eq!(io.peek(2).unwrap(), "oo");
//! assert_eq!(io.pos(), 1);
//! ```

use super::char_class::{is_utf8_continuation, utf8_char_len};
use super::pos_range::{count_newlines, line_bounds, PosRange, SourceLine};
use std::fmt;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};

/// Default `BufReader` capacity for stream sources
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// Buffered, backtrackable view over a string or a byte stream
pub struct BackedIo<'src> {
    /// Everything read from `origin` onwards, plus any read-ahead
    text: String,
    /// Read position, as an index into `text`
    cursor: usize,
    /// Absolute offset of `text[0]`
    origin: usize,
    /// Newlines dropped from the front of `text` by `release`
    base_line: usize,
    /// Open `speculate` scopes; `release` is a no-op while any is open
    scopes: usize,
    /// Remaining input; `None` once exhausted or for in-memory text
    source: Option<Box<dyn BufRead + 'src>>,
}

impl<'src> BackedIo<'src> {
    /// Cursor over an in-memory string
    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            cursor: 0,
            origin: 0,
            base_line: 0,
            scopes: 0,
            source: None,
        }
    }

    /// Cursor over a non-seekable stream; offsets count from 0
    pub fn from_reader<R: Read + 'src>(reader: R) -> Self {
        Self::from_reader_with_capacity(reader, DEFAULT_READ_CAPACITY)
    }

    /// Like [`BackedIo::from_reader`] with an explicit `BufReader` capacity
    pub fn from_reader_with_capacity<R: Read + 'src>(reader: R, capacity: usize) -> Self {
        Self::with_source(Box::new(BufReader::with_capacity(capacity.max(1), reader)), 0)
    }

    /// Cursor over a seekable stream
    ///
    /// Offsets start at the stream's current position. If the position
    /// cannot be queried they start at 0, counting buffered bytes.
    pub fn from_seekable<R: Read + Seek + 'src>(mut reader: R) -> Self {
        let origin = reader
            .stream_position()
            .ok()
            .and_then(|p| usize::try_from(p).ok())
            .unwrap_or(0);
        Self::with_source(
            Box::new(BufReader::with_capacity(DEFAULT_READ_CAPACITY, reader)),
            origin,
        )
    }

    fn with_source(source: Box<dyn BufRead + 'src>, origin: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            origin,
            base_line: 0,
            scopes: 0,
            source: Some(source),
        }
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read up to `n` characters; fewer are returned at end of input
    pub fn read(&mut self, n: usize) -> io::Result<&str> {
        let from = self.cursor;
        for _ in 0..n {
            if !self.step()? {
                break;
            }
        }
        Ok(&self.text[from..self.cursor])
    }

    /// Read a single character, or `None` at end of input
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        let from = self.cursor;
        if !self.step()? {
            return Ok(None);
        }
        Ok(self.text[from..self.cursor].chars().next())
    }

    /// Look at the next `n` characters without consuming them
    pub fn peek(&mut self, n: usize) -> io::Result<String> {
        let from = self.cursor;
        let out = self.read(n)?.to_owned();
        self.cursor = from;
        Ok(out)
    }

    /// Check for end of input without consuming anything
    pub fn eof(&mut self) -> io::Result<bool> {
        if self.cursor < self.text.len() {
            return Ok(false);
        }
        Ok(!self.fill_char()?)
    }

    /// Advance the cursor over one character, pulling from the source if
    /// needed. Returns `false` at end of input.
    fn step(&mut self) -> io::Result<bool> {
        if self.cursor == self.text.len() && !self.fill_char()? {
            return Ok(false);
        }
        self.cursor += utf8_char_len(self.text.as_bytes()[self.cursor]);
        Ok(true)
    }

    /// Append one decoded character from the source to the buffer
    fn fill_char(&mut self) -> io::Result<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        let first = match read_byte(&mut **source)? {
            Some(b) => b,
            None => {
                self.source = None;
                return Ok(false);
            }
        };

        let len = utf8_char_len(first);
        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            match read_byte(&mut **source)? {
                Some(b) if is_utf8_continuation(b) => *slot = b,
                _ => return Err(invalid_utf8(self.origin + self.text.len())),
            }
        }
        let ch = std::str::from_utf8(&bytes[..len])
            .map_err(|_| invalid_utf8(self.origin + self.text.len()))?;
        self.text.push_str(ch);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Positioning
    // ------------------------------------------------------------------

    /// Absolute offset of the cursor
    #[inline]
    pub fn pos(&self) -> usize {
        self.origin + self.cursor
    }

    /// Oldest offset that can still be restored to
    #[inline]
    pub fn buffer_start(&self) -> usize {
        self.origin
    }

    /// Number of bytes currently held in the buffer
    #[inline]
    pub fn buffered(&self) -> usize {
        self.text.len()
    }

    /// Un-read the last `n` characters
    ///
    /// # Panics
    ///
    /// Panics when asked to restore past the start of the buffer.
    pub fn restore(&mut self, n: usize) {
        for _ in 0..n {
            assert!(
                self.cursor > 0,
                "restore past the start of the backtracking buffer (offset {})",
                self.origin
            );
            self.cursor -= 1;
            while !self.text.is_char_boundary(self.cursor) {
                self.cursor -= 1;
            }
        }
    }

    /// Move the cursor back (or forward) to an already buffered offset
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the buffered region.
    pub fn restore_to(&mut self, pos: usize) {
        assert!(
            pos >= self.origin && pos - self.origin <= self.text.len(),
            "restore to offset {} outside buffered range {}..{}",
            pos,
            self.origin,
            self.origin + self.text.len()
        );
        self.cursor = pos - self.origin;
    }

    /// Seek to an absolute or relative offset
    ///
    /// Forward seeks read (and buffer) the skipped text and stop early at end
    /// of input. Backward seeks restore from the buffer; seeking before the
    /// oldest buffered offset is an `InvalidInput` error.
    pub fn seek(&mut self, target: SeekFrom) -> io::Result<usize> {
        let target = match target {
            SeekFrom::Start(off) => to_offset(off)?,
            SeekFrom::Current(delta) => offset_by(self.pos(), delta)?,
            SeekFrom::End(delta) => {
                while self.fill_char()? {}
                offset_by(self.origin + self.text.len(), delta)?
            }
        };

        if target < self.origin {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "cannot seek to {}: oldest buffered offset is {}",
                    target, self.origin
                ),
            ));
        }

        let rel = target - self.origin;
        if rel <= self.text.len() {
            if !self.text.is_char_boundary(rel) {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("offset {} is inside a character", target),
                ));
            }
            self.cursor = rel;
        } else {
            self.cursor = self.text.len();
            while self.pos() < target && self.step()? {}
        }
        Ok(self.pos())
    }

    /// Run `f`, restoring the cursor to its entry position if `f` fails
    ///
    /// Every parser invocation runs in one of these scopes. Scopes nest: an
    /// inner scope restores only what it consumed, and the enclosing scope
    /// can still restore further back.
    pub fn speculate<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let start = self.pos();
        self.scopes += 1;
        let out = f(self);
        self.scopes -= 1;
        if out.is_err() {
            self.restore_to(start);
        }
        out
    }

    /// Drop buffered text before the start of the current line
    ///
    /// Does nothing while a [`BackedIo::speculate`] scope is open. The
    /// current line is kept so failure reports can still show it.
    pub fn release(&mut self) {
        if self.scopes > 0 {
            return;
        }
        let (line_start, _) = line_bounds(&self.text, self.cursor);
        if line_start == 0 {
            return;
        }
        self.base_line += count_newlines(&self.text[..line_start]);
        self.text.drain(..line_start);
        self.cursor -= line_start;
        self.origin += line_start;
        log_trace!("released {} buffered bytes, buffer starts at {}", line_start, self.origin);
    }

    // ------------------------------------------------------------------
    // Line queries (used when rendering failures)
    // ------------------------------------------------------------------

    /// Line number (1-based) of the cursor
    pub fn line_number(&self) -> usize {
        self.line_number_at(self.pos())
    }

    /// Column (1-based, in characters) of the cursor
    pub fn col(&self) -> usize {
        let (start, _) = line_bounds(&self.text, self.cursor);
        self.text[start..self.cursor].chars().count() + 1
    }

    /// Line number (1-based) of an absolute buffered offset
    pub fn line_number_at(&self, pos: usize) -> usize {
        let rel = self.clamp_rel(pos);
        self.base_line + count_newlines(&self.text[..rel]) + 1
    }

    /// The line holding the cursor
    ///
    /// Reads ahead to the end of the line without moving the cursor.
    pub fn current_line(&mut self) -> io::Result<SourceLine> {
        self.line_at(self.pos())
    }

    /// The line holding an absolute buffered offset
    ///
    /// Offsets outside the buffer are clamped to it. Reads ahead to the end
    /// of the line without moving the cursor.
    pub fn line_at(&mut self, pos: usize) -> io::Result<SourceLine> {
        let rel = self.clamp_rel(pos);
        if memchr::memchr(b'\n', &self.text.as_bytes()[rel..]).is_none() {
            while self.fill_char()? {
                if self.text.ends_with('\n') {
                    break;
                }
            }
        }
        let (start, end) = line_bounds(&self.text, rel);
        Ok(SourceLine {
            number: self.line_number_at(pos),
            range: PosRange::new(self.origin + start, self.origin + end),
            text: self.text[start..end].to_owned(),
        })
    }

    fn clamp_rel(&self, pos: usize) -> usize {
        let mut rel = pos.saturating_sub(self.origin).min(self.text.len());
        while !self.text.is_char_boundary(rel) {
            rel -= 1;
        }
        rel
    }
}

impl fmt::Debug for BackedIo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackedIo")
            .field("pos", &self.pos())
            .field("buffer_start", &self.origin)
            .field("buffered", &self.text.len())
            .field("streaming", &self.source.is_some())
            .finish()
    }
}

impl<'src> From<&str> for BackedIo<'src> {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

fn read_byte(source: &mut dyn BufRead) -> io::Result<Option<u8>> {
    loop {
        match source.fill_buf() {
            Ok([]) => return Ok(None),
            Ok(buf) => {
                let byte = buf[0];
                source.consume(1);
                return Ok(Some(byte));
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn invalid_utf8(offset: usize) -> io::Error {
    io::Error::new(
        ErrorKind::InvalidData,
        format!("stream did not contain valid UTF-8 at offset {}", offset),
    )
}

fn to_offset(off: u64) -> io::Result<usize> {
    usize::try_from(off)
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "seek offset out of range"))
}

fn offset_by(base: usize, delta: i64) -> io::Result<usize> {
    let target = i128::try_from(base).unwrap_or(i128::MAX) + i128::from(delta);
    usize::try_from(target)
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "seek to a negative offset"))
}
