//! SCRIPTING interface
//!
//! ONLY USED FOR DISPLAY AND ADDRESS DERIVATION
//!
//! Scripts are split into data pushes and opcodes; nothing is executed.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use itertools::Itertools;

use crate::util;

pub mod address;
pub mod opcode;

use self::opcode::*;


/// Maximum number of bytes to push to the stack at once
const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    UnexpectedEndOfScript,

    PushdataTooLarge
}

/// A single parsed instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op<'a> {
    Push(&'a [u8]),
    Code(u8),
}

/// Iterates over the instructions of a script
///
/// Stops after the first error.
pub struct Instructions<'a> {
    script: &'a [u8],
    ip:     usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(script: &'a [u8]) -> Self {
        Instructions {
            script: script,
            ip:     0,
            failed: false,
        }
    }

    /// Returns the next `count` bytes and moves the ip past them
    fn next_bytes(&mut self, count: usize) -> Result<&'a [u8], ScriptError> {
        if self.script.len() < self.ip + count {
            return Err(ScriptError::UnexpectedEndOfScript);
        }
        let bytes = &self.script[self.ip..self.ip + count];
        self.ip += count;
        Ok(bytes)
    }

    /// Pushes for OP_PUSHDATA1, OP_PUSHDATA2 and OP_PUSHDATA4 take their
    /// length from the next 1, 2 or 4 bytes
    fn next_pushdata(&mut self, size: usize) -> Result<Op<'a>, ScriptError> {
        let len = self.next_bytes(size)?;
        let count = match size {
            1 => len[0] as usize,
            2 => LittleEndian::read_u16(len) as usize,
            _ => LittleEndian::read_u32(len) as usize,
        };
        if count > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::PushdataTooLarge);
        }
        Ok(Op::Push(self.next_bytes(count)?))
    }

    fn next_op(&mut self, opcode: u8) -> Result<Op<'a>, ScriptError> {
        match opcode {
            0x01..=0x4b   => Ok(Op::Push(self.next_bytes(opcode as usize)?)),
            OP_PUSHDATA1  => self.next_pushdata(1),
            OP_PUSHDATA2  => self.next_pushdata(2),
            OP_PUSHDATA4  => self.next_pushdata(4),
            _             => Ok(Op::Code(opcode)),
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Op<'a>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.ip >= self.script.len() {
            return None;
        }

        let opcode = self.script[self.ip];
        self.ip += 1;

        let result = self.next_op(opcode);
        self.failed = result.is_err();
        Some(result)
    }
}

/// Parses all instructions of a script
pub fn parse(script: &[u8]) -> Result<Vec<Op>, ScriptError> {
    Instructions::new(script).collect()
}


/// Script wrapper that renders pushes as hex and opcodes by name
pub struct Script<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Script<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        const UNEXPECTED_EOS: &'static str = "[UNEXPECTED-END-OF-SCRIPT]";
        const PUSHDATA_TOO_LARGE: &'static str = "[PUSHDATA-TOO-LARGE]";

        let rendered = Instructions::new(self.0)
            .map(|op| match op {
                Ok(Op::Push(data))  => util::to_hex(data),
                Ok(Op::Code(code))  => name(code)
                    .unwrap_or_else(|| format!("OP_UNKNOWN_{:02x}", code)),
                Err(ScriptError::UnexpectedEndOfScript) => UNEXPECTED_EOS.to_string(),
                Err(ScriptError::PushdataTooLarge)      => PUSHDATA_TOO_LARGE.to_string(),
            })
            .join(" ");

        fmt.write_str(&rendered)
    }
}

impl<'a> fmt::Debug for Script<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, fmt)
    }
}
