//! Sub-encodings for the push-to-stack and pop-from-stack steps.
//!
//! Both payloads start with an Integer code selecting the method (push) or
//! location (pop), followed by the fields that method needs. Codes are part
//! of the wire format and never change meaning.

use serde::{Deserialize, Serialize};

use super::codec::{DecodeError, Decoder, Encoder};
use super::PipelineError;

/// What part of the path gets pushed onto the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum PushMethod {
    /// The whole path.
    Entire,
    /// Characters `begin..end` of the path.
    Range { begin: u32, end: u32 },
    /// A capture group of a regex match against the path.
    Regex {
        pattern: String,
        ignore_case: bool,
        group: u32,
    },
    /// A fixed string, independent of the path.
    Fixed { value: String },
}

impl PushMethod {
    const ENTIRE: u32 = 1;
    const RANGE: u32 = 2;
    const REGEX: u32 = 3;
    const FIXED: u32 = 4;

    pub(crate) fn encode(&self, enc: &mut Encoder) -> Result<(), PipelineError> {
        match self {
            PushMethod::Entire => enc.int(Self::ENTIRE),
            PushMethod::Range { begin, end } => {
                enc.int(Self::RANGE)?;
                enc.int(*begin)?;
                enc.int(*end)
            }
            PushMethod::Regex {
                pattern,
                ignore_case,
                group,
            } => {
                enc.int(Self::REGEX)?;
                enc.string(pattern)?;
                enc.boolean(*ignore_case);
                enc.int(*group)
            }
            PushMethod::Fixed { value } => {
                enc.int(Self::FIXED)?;
                enc.string(value)
            }
        }
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        match dec.int()? {
            Self::ENTIRE => Ok(PushMethod::Entire),
            Self::RANGE => Ok(PushMethod::Range {
                begin: dec.int()?,
                end: dec.int()?,
            }),
            Self::REGEX => Ok(PushMethod::Regex {
                pattern: dec.string()?,
                ignore_case: dec.boolean()?,
                group: dec.int()?,
            }),
            Self::FIXED => Ok(PushMethod::Fixed {
                value: dec.string()?,
            }),
            other => Err(dec.error(format!("unknown push-to-stack method {other}"))),
        }
    }
}

/// Where the popped value is written back into the path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "location", rename_all = "kebab-case")]
pub enum PopLocation {
    /// Replace the whole path.
    Entire,
    /// Replace characters `begin..end`.
    Range { begin: u32, end: u32 },
    /// Replace the first regex match.
    Regex { pattern: String, ignore_case: bool },
    /// Insert before the path.
    Start,
    /// Append after the path.
    End,
    /// Discard the popped value.
    Nowhere,
}

impl PopLocation {
    const ENTIRE: u32 = 1;
    const RANGE: u32 = 2;
    const REGEX: u32 = 3;
    const START: u32 = 4;
    const END: u32 = 5;
    const NOWHERE: u32 = 6;

    pub(crate) fn encode(&self, enc: &mut Encoder) -> Result<(), PipelineError> {
        match self {
            PopLocation::Entire => enc.int(Self::ENTIRE),
            PopLocation::Range { begin, end } => {
                enc.int(Self::RANGE)?;
                enc.int(*begin)?;
                enc.int(*end)
            }
            PopLocation::Regex {
                pattern,
                ignore_case,
            } => {
                enc.int(Self::REGEX)?;
                enc.string(pattern)?;
                enc.boolean(*ignore_case);
                Ok(())
            }
            PopLocation::Start => enc.int(Self::START),
            PopLocation::End => enc.int(Self::END),
            PopLocation::Nowhere => enc.int(Self::NOWHERE),
        }
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        match dec.int()? {
            Self::ENTIRE => Ok(PopLocation::Entire),
            Self::RANGE => Ok(PopLocation::Range {
                begin: dec.int()?,
                end: dec.int()?,
            }),
            Self::REGEX => Ok(PopLocation::Regex {
                pattern: dec.string()?,
                ignore_case: dec.boolean()?,
            }),
            Self::START => Ok(PopLocation::Start),
            Self::END => Ok(PopLocation::End),
            Self::NOWHERE => Ok(PopLocation::Nowhere),
            other => Err(dec.error(format!("unknown pop-from-stack location {other}"))),
        }
    }
}
