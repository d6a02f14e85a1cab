//! Error kinds surfaced by the codec core.
//!
//! These are fatal to the *current* operation only: the handler is reusable
//! on the next call (decode errors reset the decode buffer before
//! surfacing; encode errors leave the write buffer untouched).

use thiserror::Error;

/// Errors produced while encoding a frame into the write buffer or decoding
/// one out of the decode buffer.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CodecError {
    /// The decoder read an opcode byte outside the recognised set.
    #[error("unrecognised opcode byte 0x{opcode:02x}")]
    BadOpcode {
        /// The offending byte.
        opcode: u8,
    },

    /// A payload length exceeded the configured cap.
    #[error("frame payload too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// The length the peer announced.
        len: u32,
        /// The configured cap.
        max: u32,
    },

    /// Growing a buffer failed.
    #[error("out of memory: failed to grow buffer to {requested} bytes")]
    OutOfMemory {
        /// The size the grow attempt targeted.
        requested: usize,
    },

    /// An encoder argument could not be materialised as bytes.
    #[error("bad input: {reason}")]
    BadInput {
        /// Human-readable detail.
        reason: &'static str,
    },
}
