//! Buffered byte input with position tracking for parse errors.
//!
//! Reading goes through a statically sized refill buffer so that the
//! character fetch inlines into the integer parsing loops of the parsers,
//! which is where almost all of the parsing time is spent.

use std::fs::File;
use std::io::{self, Read};

use crate::TrimError;

/// Size of the refill and write-out buffers.
pub const BUFFER_SIZE: usize = 1 << 20;

/// Keep digit classification an ASCII range check.
///
/// The locale-aware library predicate defeats the inlining of the hot read
/// loop and costs a few percent of total parse time.
#[inline]
pub(crate) fn is_digit(ch: u8) -> bool {
    b'0' <= ch && ch <= b'9'
}

/// A block-buffered input stream counting lines and bytes.
pub struct Input {
    path: String,
    /// `None` for the `/dev/null` sentinel, which is never opened.
    source: Option<Box<dyn Read>>,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    /// First character, put back after format detection.
    saved: Option<u8>,
    /// Newlines read so far.
    pub lines: usize,
    /// Bytes read so far.
    pub bytes: usize,
    /// Most recent character.
    pub last: u8,
    /// Sticky once the source is exhausted.
    pub eof: bool,
}

impl Input {
    /// Open a path for reading. `-` reads from stdin and `/dev/null` is a
    /// hard-coded sentinel that always reads as empty.
    pub fn open(path: &str) -> Result<Input, TrimError> {
        let (path, source): (String, Option<Box<dyn Read>>) = match path {
            "/dev/null" => (path.into(), None),
            "-" => ("<stdin>".into(), Some(Box::new(io::stdin()))),
            _ => {
                let file = File::open(path).map_err(|source| TrimError::Read {
                    path: path.into(),
                    source,
                })?;
                (path.into(), Some(Box::new(file)))
            }
        };
        Ok(Input::from_read(path, source))
    }

    /// Read from an arbitrary stream, reporting `path` in errors.
    pub fn from_stream(path: impl Into<String>, source: impl Read + 'static) -> Input {
        Input::from_read(path.into(), Some(Box::new(source)))
    }

    fn from_read(path: String, source: Option<Box<dyn Read>>) -> Input {
        Input {
            path,
            source,
            buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            end: 0,
            saved: None,
            lines: 0,
            bytes: 0,
            last: 0,
            eof: false,
        }
    }

    /// Path shown in messages (`<stdin>` for standard input).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build a parse error at the current position.
    pub fn parse_error(&self, msg: impl Into<String>) -> TrimError {
        let mut line = self.lines + 1;
        if self.last == b'\n' {
            line -= 1;
        }
        TrimError::Parse {
            path: self.path.clone(),
            line,
            after: self.eof && self.last == b'\n',
            msg: msg.into(),
        }
    }

    fn fill(&mut self) -> Result<usize, TrimError> {
        self.pos = 0;
        self.end = match &mut self.source {
            Some(source) => source.read(&mut self.buf).map_err(|source| TrimError::Read {
                path: self.path.clone(),
                source,
            })?,
            None => 0,
        };
        Ok(self.end)
    }

    #[inline]
    fn read_byte(&mut self) -> Result<Option<u8>, TrimError> {
        if self.pos == self.end && self.fill()? == 0 {
            self.eof = true;
            return Ok(None);
        }
        let ch = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(ch))
    }

    #[inline]
    fn count(&mut self, ch: Option<u8>) {
        if let Some(ch) = ch {
            if ch == b'\n' {
                self.lines += 1;
            }
            self.bytes += 1;
            self.last = ch;
        }
    }

    /// Read one character. CRLF is folded into a single newline; a bare CR
    /// is a parse error.
    #[inline]
    pub fn read_char(&mut self) -> Result<Option<u8>, TrimError> {
        debug_assert!(self.saved.is_none());
        let mut res = self.read_byte()?;
        if res == Some(b'\r') {
            res = self.read_byte()?;
            if res != Some(b'\n') {
                return Err(self.parse_error("carriage-return without following new-line"));
            }
        }
        self.count(res);
        Ok(res)
    }

    /// First character of the stream, remembered for later parsing.
    ///
    /// Used to decide whether a file is in DIMACS format when exactly two
    /// file names were given. The counters are updated here and not again
    /// when parsing picks the character up through
    /// [`read_first_char`](Input::read_first_char).
    pub fn peek_first(&mut self) -> Result<Option<u8>, TrimError> {
        let ch = self.read_char()?;
        self.saved = ch;
        Ok(ch)
    }

    /// Read the first character of a parse, honoring a peeked character.
    pub fn read_first_char(&mut self) -> Result<Option<u8>, TrimError> {
        match self.saved.take() {
            Some(ch) => Ok(Some(ch)),
            None => self.read_char(),
        }
    }

    /// Consume the remaining digits of an oversized number so that the error
    /// message can cite it. The spill is bounded and terminated with an
    /// ellipsis; secondary read failures are ignored since an error is
    /// already being reported.
    pub(crate) fn overflow_digits(&mut self, value: i32, digit: u8) -> String {
        const LIMIT: usize = 27;
        let mut text = value.to_string();
        let mut digit = digit;
        loop {
            text.push(digit as char);
            if text.len() >= LIMIT {
                text.push_str("...");
                break;
            }
            match self.read_char() {
                Ok(Some(ch)) if is_digit(ch) => digit = ch,
                Ok(Some(ch)) => {
                    if ch == b'\n' {
                        // Keep the error on the line of the number.
                        self.lines -= 1;
                    }
                    break;
                }
                _ => break,
            }
        }
        text
    }
}

/// Outcome of scanning one decimal token.
pub(crate) enum Scanned {
    /// Complete number and the character that terminated it.
    Number { value: i32, next: Option<u8> },
    /// A digit followed a leading zero.
    LeadingZero { digit: u8 },
    /// The token exceeds `i32::MAX`; carries the spilled digits for the
    /// error message.
    Overflow { digits: String },
}

/// Scan the digits of a decimal number whose first digit was already read.
///
/// The overflow check precedes every multiply-and-add. The DIMACS header is
/// the one place where a leading zero may be extended by further digits.
pub(crate) fn read_number(
    input: &mut Input,
    first: u8,
    allow_leading_zero: bool,
) -> Result<Scanned, TrimError> {
    debug_assert!(is_digit(first));
    let mut value = i32::from(first - b'0');
    loop {
        let next = input.read_char()?;
        let ch = match next {
            Some(ch) if is_digit(ch) => ch,
            _ => return Ok(Scanned::Number { value, next }),
        };
        if value == 0 && !allow_leading_zero {
            return Ok(Scanned::LeadingZero { digit: ch });
        }
        if value > i32::MAX / 10 {
            let digits = input.overflow_digits(value, ch);
            return Ok(Scanned::Overflow { digits });
        }
        value *= 10;
        let digit = i32::from(ch - b'0');
        if value > i32::MAX - digit {
            let digits = input.overflow_digits(value / 10, ch);
            return Ok(Scanned::Overflow { digits });
        }
        value += digit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(bytes: &'static [u8]) -> Input {
        Input::from_stream("<test>", bytes)
    }

    #[test]
    fn counts_lines_and_bytes() {
        let mut input = input(b"ab\ncd\n");
        let mut text = vec![];
        while let Some(ch) = input.read_char().unwrap() {
            text.push(ch);
        }
        assert_eq!(text, b"ab\ncd\n");
        assert_eq!(input.lines, 2);
        assert_eq!(input.bytes, 6);
        assert!(input.eof);
    }

    #[test]
    fn folds_crlf_and_rejects_bare_cr() {
        let mut input1 = input(b"a\r\nb");
        assert_eq!(input1.read_char().unwrap(), Some(b'a'));
        assert_eq!(input1.read_char().unwrap(), Some(b'\n'));
        assert_eq!(input1.read_char().unwrap(), Some(b'b'));

        let mut input2 = input(b"a\rb");
        assert_eq!(input2.read_char().unwrap(), Some(b'a'));
        let err = input2.read_char().unwrap_err();
        assert!(err
            .to_string()
            .contains("carriage-return without following new-line"));
    }

    #[test]
    fn peeked_character_is_read_once() {
        let mut input = input(b"p cnf");
        assert_eq!(input.peek_first().unwrap(), Some(b'p'));
        assert_eq!(input.bytes, 1);
        assert_eq!(input.read_first_char().unwrap(), Some(b'p'));
        assert_eq!(input.bytes, 1);
        assert_eq!(input.read_char().unwrap(), Some(b' '));
    }

    #[test]
    fn scans_numbers_with_terminators() {
        let mut input = input(b"234 ");
        match read_number(&mut input, b'1', false).unwrap() {
            Scanned::Number { value, next } => {
                assert_eq!(value, 1234);
                assert_eq!(next, Some(b' '));
            }
            _ => panic!("expected a complete number"),
        }
    }

    #[test]
    fn rejects_digits_after_a_leading_zero() {
        let mut input1 = input(b"7 ");
        match read_number(&mut input1, b'0', false).unwrap() {
            Scanned::LeadingZero { digit } => assert_eq!(digit, b'7'),
            _ => panic!("expected a leading zero"),
        }

        let mut input2 = input(b"07 ");
        match read_number(&mut input2, b'0', true).unwrap() {
            Scanned::Number { value, .. } => assert_eq!(value, 7),
            _ => panic!("expected the header to tolerate leading zeros"),
        }
    }

    #[test]
    fn reports_the_digits_of_an_overflowing_number() {
        let mut input = input(b"9999999999 1 0\n");
        match read_number(&mut input, b'9', false).unwrap() {
            Scanned::Overflow { digits } => assert_eq!(digits, "99999999999"),
            _ => panic!("expected an overflow"),
        }
    }

    #[test]
    fn truncates_very_long_overflowing_numbers() {
        let mut input = Input::from_stream("<test>", io::Cursor::new(vec![b'9'; 64]));
        match read_number(&mut input, b'9', false).unwrap() {
            Scanned::Overflow { digits } => {
                assert!(digits.ends_with("..."));
                assert!(digits.len() <= 32);
            }
            _ => panic!("expected an overflow"),
        }
    }

    #[test]
    fn null_sentinel_reads_as_empty() {
        let mut input = Input::open("/dev/null").unwrap();
        assert_eq!(input.read_char().unwrap(), None);
        assert!(input.eof);
    }
}
