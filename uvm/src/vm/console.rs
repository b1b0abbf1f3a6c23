//! Console gateway: the machine's only link to the outside world.
//!
//! Reads and writes single bytes through any `Read`/`Write` pair. The writer
//! is flushed before every blocking read so prompts reach the user before the
//! guest waits for an answer.

use std::io::{self, ErrorKind, Read, Write};
use std::str::FromStr;

/// Value stored by IN once the input stream is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// 0xFFFFFFFF, the sign extension of an all-ones byte
    #[default]
    AllOnes,
    Zero,
}

impl EofPolicy {
    pub fn value(self) -> u32 {
        match self {
            EofPolicy::AllOnes => u32::MAX,
            EofPolicy::Zero => 0,
        }
    }
}

impl FromStr for EofPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all-ones" | "ones" | "-1" => Ok(EofPolicy::AllOnes),
            "zero" | "0" => Ok(EofPolicy::Zero),
            _ => Err(format!("Invalid end-of-input policy: {s} (expected 'all-ones' or 'zero')")),
        }
    }
}

#[derive(Debug)]
pub struct Console<R, W> {
    reader: R,
    writer: W,
    eof_policy: EofPolicy,
    bytes_in: u64,
    bytes_out: u64,
}

impl<R: Read, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_policy(reader, writer, EofPolicy::default())
    }

    pub fn with_policy(reader: R, writer: W, eof_policy: EofPolicy) -> Self {
        Self {
            reader,
            writer,
            eof_policy,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    pub fn set_eof_policy(&mut self, eof_policy: EofPolicy) {
        self.eof_policy = eof_policy;
    }

    /// Block for one byte and sign-extend it to a platter
    pub fn read_platter(&mut self) -> io::Result<u32> {
        self.writer.flush()?;
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(self.eof_policy.value()),
                Ok(_) => {
                    self.bytes_in += 1;
                    return Ok(byte[0] as i8 as i32 as u32);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.writer.write_all(&[byte])?;
        self.bytes_out += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
}
