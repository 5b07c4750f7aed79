//! Buffered byte output for the proof emitter.
//!
//! Mirrors [`Input`](crate::input::Input): a fixed 1 MiB buffer flushed when
//! full and on close, with byte and line counters for the final size report.

use std::fs::File;
use std::io::{self, Write};

use crate::input::BUFFER_SIZE;
use crate::TrimError;

enum Sink {
    /// The `/dev/null` sentinel; bytes are counted and discarded.
    Null,
    Stream(Box<dyn Write>),
    /// In-memory capture, mainly for tests.
    Memory(Vec<u8>),
}

/// A block-buffered output stream counting lines and bytes.
pub struct Output {
    path: String,
    sink: Sink,
    buf: Box<[u8]>,
    pos: usize,
    /// Bytes written so far.
    pub bytes: usize,
    /// Newlines written so far.
    pub lines: usize,
}

impl Output {
    /// Open a path for writing. `-` writes to stdout and `/dev/null` is a
    /// hard-coded sentinel that is never opened.
    pub fn create(path: &str) -> Result<Output, TrimError> {
        let (path, sink) = match path {
            "/dev/null" => (path.into(), Sink::Null),
            "-" => (
                "<stdout>".to_string(),
                Sink::Stream(Box::new(io::stdout()) as Box<dyn Write>),
            ),
            _ => {
                let file = File::create(path).map_err(|source| TrimError::Write {
                    path: path.into(),
                    source,
                })?;
                (path.into(), Sink::Stream(Box::new(file) as Box<dyn Write>))
            }
        };
        Ok(Output::from_sink(path, sink))
    }

    /// An output that captures everything in memory.
    pub fn memory() -> Output {
        Output::from_sink("<memory>".into(), Sink::Memory(vec![]))
    }

    fn from_sink(path: String, sink: Sink) -> Output {
        Output {
            path,
            sink,
            buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            bytes: 0,
            lines: 0,
        }
    }

    /// Path shown in messages (`<stdout>` for standard output).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flush the buffer into the sink.
    pub fn flush(&mut self) -> Result<(), TrimError> {
        let bytes = self.pos;
        if bytes == 0 {
            return Ok(());
        }
        let chunk = &self.buf[..bytes];
        let result = match &mut self.sink {
            Sink::Null => Ok(()),
            Sink::Stream(stream) => stream.write_all(chunk),
            Sink::Memory(memory) => {
                memory.extend_from_slice(chunk);
                Ok(())
            }
        };
        result.map_err(|source| TrimError::Flush {
            path: self.path.clone(),
            bytes,
            source,
        })?;
        self.pos = 0;
        Ok(())
    }

    /// Flush and hand back everything captured by a memory output.
    pub fn take_memory(&mut self) -> Vec<u8> {
        self.flush().expect("memory outputs do not fail to flush");
        match &mut self.sink {
            Sink::Memory(memory) => std::mem::replace(memory, vec![]),
            _ => vec![],
        }
    }

    /// Flush all buffered bytes through to the underlying stream.
    pub fn close(&mut self) -> Result<(), TrimError> {
        self.flush()?;
        if let Sink::Stream(stream) = &mut self.sink {
            stream.flush().map_err(|source| TrimError::Flush {
                path: self.path.clone(),
                bytes: 0,
                source,
            })?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_char(&mut self, ch: u8) -> Result<(), TrimError> {
        if self.pos == BUFFER_SIZE {
            self.flush()?;
        }
        self.buf[self.pos] = ch;
        self.pos += 1;
        self.bytes += 1;
        if ch == b'\n' {
            self.lines += 1;
        }
        Ok(())
    }

    #[inline]
    pub fn write_space(&mut self) -> Result<(), TrimError> {
        self.write_char(b' ')
    }

    pub fn write_str(&mut self, text: &str) -> Result<(), TrimError> {
        for &ch in text.as_bytes() {
            self.write_char(ch)?;
        }
        Ok(())
    }

    /// Write a decimal integer through a fixed scratch buffer.
    pub fn write_int(&mut self, value: i32) -> Result<(), TrimError> {
        let mut scratch = [0u8; 16];
        let len = itoa::write(&mut scratch[..], value).expect("an i32 fits the scratch buffer");
        for &ch in &scratch[..len] {
            self.write_char(ch)?;
        }
        Ok(())
    }
}
