//! Primitive wire encoders and the shared decode cursor.
//!
//! Every step payload is a concatenation of four primitives:
//!
//! - Integer: exactly 4 ASCII digits, `0000`..`9999`
//! - String: Integer length (UTF-16 code units) followed by the raw characters
//! - Boolean: `1` or `0`
//! - Identifier: the braced `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}` form, no prefix
//!
//! String lengths count UTF-16 code units because the native shell component
//! reading these strings works on wide strings. For text inside the BMP this
//! is the same as the character count.

use std::fmt;
use uuid::Uuid;

use super::{contract_violation, PipelineError};

/// Largest value an encoded Integer can hold.
pub(crate) const MAX_ENCODED_INT: u32 = 9999;

/// Width of the element count prefix.
const COUNT_WIDTH: usize = 2;

/// Width of an encoded Integer.
const INT_WIDTH: usize = 4;

/// Width of a braced identifier.
const IDENTIFIER_WIDTH: usize = 38;

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Append-only writer for the pipeline wire format.
#[derive(Debug, Default)]
pub(crate) struct Encoder {
    out: String,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Element count prefix: two zero-padded digits.
    pub(crate) fn count(&mut self, count: usize) -> Result<(), PipelineError> {
        if count >= 10usize.pow(COUNT_WIDTH as u32) {
            return Err(contract_violation(format!(
                "pipeline has {count} elements, at most 99 can be encoded"
            )));
        }
        self.out.push_str(&format!("{count:02}"));
        Ok(())
    }

    pub(crate) fn tag(&mut self, tag: char) {
        self.out.push(tag);
    }

    pub(crate) fn int(&mut self, value: u32) -> Result<(), PipelineError> {
        if value > MAX_ENCODED_INT {
            return Err(contract_violation(format!(
                "integer {value} does not fit in 4 digits"
            )));
        }
        self.out.push_str(&format!("{value:04}"));
        Ok(())
    }

    pub(crate) fn string(&mut self, value: &str) -> Result<(), PipelineError> {
        let len = value.encode_utf16().count();
        if len > MAX_ENCODED_INT as usize {
            return Err(contract_violation(format!(
                "string of {len} UTF-16 units is too long to encode"
            )));
        }
        self.int(len as u32)?;
        self.out.push_str(value);
        Ok(())
    }

    pub(crate) fn boolean(&mut self, value: bool) {
        self.out.push(if value { '1' } else { '0' });
    }

    pub(crate) fn identifier(&mut self, id: &Uuid) {
        self.out.push_str(&id.braced().to_string());
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Why a decode walk stopped, and where (character offset into the input).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DecodeError {
    pub(crate) offset: usize,
    pub(crate) reason: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.reason, self.offset)
    }
}

/// Cursor over an encoded pipeline. Every read either consumes exactly the
/// characters the matching encoder wrote or fails without panicking.
pub(crate) struct Decoder<'a> {
    input: &'a str,
    /// Byte position of the next unread character.
    pos: usize,
    /// Character offset of the next unread character, for diagnostics.
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            offset: 0,
        }
    }

    pub(crate) fn error(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn remaining_chars(&self) -> usize {
        self.input[self.pos..].chars().count()
    }

    fn next_char(&mut self, what: &str) -> Result<char, DecodeError> {
        let ch = self.input[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| self.error(format!("unexpected end of input while reading {what}")))?;
        self.pos += ch.len_utf8();
        self.offset += 1;
        Ok(ch)
    }

    fn digits(&mut self, width: usize, what: &str) -> Result<u32, DecodeError> {
        let start = self.offset;
        let mut value = 0u32;
        for _ in 0..width {
            let ch = self.next_char(what)?;
            let digit = ch.to_digit(10).ok_or_else(|| DecodeError {
                offset: start,
                reason: format!("expected {width} digits for {what}, found {ch:?}"),
            })?;
            value = value * 10 + digit;
        }
        Ok(value)
    }

    pub(crate) fn count(&mut self) -> Result<usize, DecodeError> {
        Ok(self.digits(COUNT_WIDTH, "element count")? as usize)
    }

    pub(crate) fn tag(&mut self) -> Result<char, DecodeError> {
        self.next_char("element tag")
    }

    pub(crate) fn int(&mut self) -> Result<u32, DecodeError> {
        self.digits(INT_WIDTH, "integer")
    }

    pub(crate) fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.int()? as usize;
        let mut value = String::new();
        let mut units = 0usize;
        while units < len {
            let ch = self.next_char("string contents")?;
            units += ch.len_utf16();
            if units > len {
                return Err(self.error("string length splits a surrogate pair"));
            }
            value.push(ch);
        }
        Ok(value)
    }

    pub(crate) fn boolean(&mut self) -> Result<bool, DecodeError> {
        match self.next_char("boolean")? {
            '1' => Ok(true),
            '0' => Ok(false),
            other => Err(DecodeError {
                offset: self.offset - 1,
                reason: format!("expected boolean '0' or '1', found {other:?}"),
            }),
        }
    }

    pub(crate) fn identifier(&mut self) -> Result<Uuid, DecodeError> {
        let start = self.offset;
        let mut text = String::with_capacity(IDENTIFIER_WIDTH);
        for _ in 0..IDENTIFIER_WIDTH {
            text.push(self.next_char("identifier")?);
        }
        if !(text.starts_with('{') && text.ends_with('}')) {
            return Err(DecodeError {
                offset: start,
                reason: format!("identifier {text:?} is not in braced form"),
            });
        }
        Uuid::parse_str(&text).map_err(|e| DecodeError {
            offset: start,
            reason: format!("invalid identifier {text:?}: {e}"),
        })
    }
}
