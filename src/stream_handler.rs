//! Stream Handler — the public surface of the codec core (spec.md §4.5).
//!
//! One `StreamHandler` per connection endpoint. Not reentrant: every
//! operation is synchronous, completes before returning, and the session
//! layer above is responsible for exclusive access (spec.md §5). Two
//! handlers are fully independent.

use crate::buffer::{DecodeBuffer, DecodeStatus, WriteBuffer};
use crate::codec;
use crate::error::CodecError;
use crate::event::Event;
use crate::opcode::{Opcode, ENCODING_SEPARATOR, PROTOCOL_VERSION};

/// `512 KiB`: initial allocation for a freshly grown buffer.
pub const INITIAL_ALLOC: usize = 512 * 1024;

/// `2 MiB`: buffers at or above this capacity are freed (not just
/// truncated) when they drain, to bound long-term memory footprint.
pub const BIG_ALLOC_THRESHOLD: usize = 2 * 1024 * 1024;

/// `2^32 - 2`: sequence numbers wrap here back to `0`. `2^32 - 1` is never
/// emitted and `0` is the "no sequence" sentinel except immediately after
/// a wrap.
pub const SEQ_MAX: u32 = u32::MAX - 1;

/// Non-zero success sentinel returned by the `send_*` operations that
/// don't produce a sequence number (spec.md §4.5).
pub const SEND_OK: u8 = 1;

/// Construction-time parameters for a `StreamHandler` (spec.md §9:
/// "expose as compile-time or handler-construction parameters rather than
/// process globals").
#[derive(Debug, Clone, Copy)]
pub struct StreamHandlerConfig {
    /// Initial allocation used the first time a buffer grows.
    pub initial_alloc: usize,
    /// Capacity threshold above which a drained buffer is freed outright.
    pub big_alloc_threshold: usize,
    /// Maximum payload length accepted by the decoder; frames announcing
    /// a larger `payload_len` fail with [`CodecError::FrameTooLarge`].
    pub max_payload_len: u32,
}

impl Default for StreamHandlerConfig {
    fn default() -> Self {
        Self {
            initial_alloc: INITIAL_ALLOC,
            big_alloc_threshold: BIG_ALLOC_THRESHOLD,
            max_payload_len: 16 * 1024 * 1024,
        }
    }
}

/// The sans-I/O core of a duplex RPC connection: frame encode/decode,
/// sequence issuance, and the write/decode buffers (spec.md §2).
#[derive(Debug)]
pub struct StreamHandler {
    config: StreamHandlerConfig,
    seq: u32,
    write_buffer: WriteBuffer,
    decode_buffer: DecodeBuffer,
}

impl Default for StreamHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamHandler {
    /// Build a handler with the spec's default constants.
    pub fn new() -> Self {
        Self::with_config(StreamHandlerConfig::default())
    }

    /// Build a handler with explicit buffer/frame-size parameters.
    pub fn with_config(config: StreamHandlerConfig) -> Self {
        Self {
            write_buffer: WriteBuffer::new(config.initial_alloc, config.big_alloc_threshold),
            decode_buffer: DecodeBuffer::new(
                config.initial_alloc,
                config.big_alloc_threshold,
                config.max_payload_len,
            ),
            seq: 0,
            config,
        }
    }

    /// The last sequence number emitted (`0` if none has been allocated
    /// yet, or if the counter has just wrapped).
    pub fn current_seq(&self) -> u32 {
        self.seq
    }

    /// Pre-increment-and-wrap the sequence counter (spec.md §4.6). Only
    /// `send_ping` and `send_request` call this; responses echo a
    /// peer-supplied seq instead.
    fn next_seq(&mut self) -> u32 {
        self.seq += 1;
        if self.seq >= SEQ_MAX {
            self.seq = 0;
        }
        self.seq
    }

    /// Allocate a new seq and enqueue a PING frame.
    pub fn send_ping(&mut self) -> Result<u32, CodecError> {
        let seq = self.next_seq();
        self.write_buffer.append(&codec::encode_ping(seq))?;
        Ok(seq)
    }

    /// Enqueue a PONG echoing the peer-supplied `seq`.
    pub fn send_pong(&mut self, seq: u32) -> Result<u8, CodecError> {
        self.write_buffer.append(&codec::encode_pong(seq))?;
        Ok(SEND_OK)
    }

    /// Allocate a new seq and enqueue a REQUEST frame.
    pub fn send_request(&mut self, payload: &[u8]) -> Result<u32, CodecError> {
        let seq = self.next_seq();
        self.write_buffer.append(&codec::encode_request(seq, payload)?)?;
        Ok(seq)
    }

    /// Enqueue a PUSH frame (no sequence).
    pub fn send_push(&mut self, payload: &[u8]) -> Result<u8, CodecError> {
        self.write_buffer.append(&codec::encode_push(payload)?)?;
        Ok(SEND_OK)
    }

    /// Enqueue a RESPONSE echoing `seq`. Does not validate that `seq` was
    /// ever received.
    pub fn send_response(&mut self, seq: u32, payload: &[u8]) -> Result<u8, CodecError> {
        self.write_buffer.append(&codec::encode_response(seq, payload)?)?;
        Ok(SEND_OK)
    }

    /// Enqueue an ERROR frame; `payload` defaults to empty when `None`.
    pub fn send_error(&mut self, code: u8, seq: u32, payload: Option<&[u8]>) -> Result<u8, CodecError> {
        let payload = payload.unwrap_or(&[]);
        self.write_buffer.append(&codec::encode_error(code, seq, payload)?)?;
        Ok(SEND_OK)
    }

    /// Enqueue a HELLO frame. `encodings` is joined by `,` into the
    /// payload; an empty list yields an empty payload.
    pub fn send_hello(&mut self, ping_interval: u32, encodings: &[Vec<u8>]) -> Result<u8, CodecError> {
        let frame = codec::encode_hello(PROTOCOL_VERSION, ping_interval, encodings)?;
        self.write_buffer.append(&frame)?;
        Ok(SEND_OK)
    }

    /// Enqueue a SELECT_ENCODING frame.
    pub fn send_select_encoding(&mut self, encoding: &[u8]) -> Result<u8, CodecError> {
        self.write_buffer
            .append(&codec::encode_select_encoding(encoding)?)?;
        Ok(SEND_OK)
    }

    /// Enqueue a GOAWAY frame; `reason` defaults to empty when `None`.
    pub fn send_goaway(&mut self, code: u8, reason: Option<&[u8]>) -> Result<u8, CodecError> {
        let reason = reason.unwrap_or(&[]);
        self.write_buffer.append(&codec::encode_goaway(code, reason)?)?;
        Ok(SEND_OK)
    }

    /// Unread byte count in the write buffer.
    pub fn write_buffer_len(&self) -> usize {
        self.write_buffer.len()
    }

    /// Copy up to `n` unread bytes out of the write buffer; `consume`
    /// (default `true` at the call site) advances the cursor as a side
    /// effect.
    pub fn write_buffer_get_bytes(&mut self, n: usize, consume: bool) -> Option<Vec<u8>> {
        self.write_buffer.get_bytes(n, consume)
    }

    /// Advance the write buffer's cursor by up to `n` bytes; returns the
    /// remaining unread length.
    pub fn write_buffer_consume_bytes(&mut self, n: usize) -> usize {
        self.write_buffer.consume(n)
    }

    /// Feed received bytes to the decoder, returning every frame completed
    /// by this call in stream order (spec.md §4.5 behavioural contract).
    ///
    /// On a decode error, the decode buffer is reset and the error is
    /// raised without returning the events already assembled earlier in
    /// this same call — spec.md §9 preserves this as faithful-but-
    /// surprising source behavior.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> Result<Vec<Event>, CodecError> {
        let mut events = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            let outcome = match self.decode_buffer.feed(&bytes[offset..]) {
                Ok(outcome) => outcome,
                Err(feed_error) => {
                    offset += feed_error.consumed;
                    self.decode_buffer.reset();
                    tracing::debug!(error = %feed_error.error, "decode error, resetting decode buffer");
                    return Err(feed_error.error);
                }
            };
            offset += outcome.consumed;

            match outcome.status {
                DecodeStatus::NeedsMore => break,
                DecodeStatus::Complete => {
                    let event = self.extract_event();
                    self.decode_buffer.reset();
                    if let Event::Ping { seq } = event {
                        self.send_pong(seq)?;
                    }
                    events.push(event);
                }
            }
        }

        Ok(events)
    }

    /// Build the `Event` for the currently-complete decode buffer.
    fn extract_event(&self) -> Event {
        let opcode = self
            .decode_buffer
            .opcode()
            .expect("decode buffer reports complete only once an opcode is known");
        debug_assert!(self.decode_buffer.is_complete());

        match opcode {
            Opcode::Ping => Event::Ping {
                seq: self.decode_buffer.get_seq(),
            },
            Opcode::Pong => Event::Pong {
                seq: self.decode_buffer.get_seq(),
            },
            Opcode::Request => Event::Request {
                seq: self.decode_buffer.get_seq(),
                payload: self.decode_buffer.payload().to_vec(),
            },
            Opcode::Response => Event::Response {
                seq: self.decode_buffer.get_seq(),
                payload: self.decode_buffer.payload().to_vec(),
            },
            Opcode::Push => Event::Push {
                payload: self.decode_buffer.payload().to_vec(),
            },
            Opcode::Error => Event::Error {
                code: self.decode_buffer.get_code(),
                seq: self.decode_buffer.get_seq(),
                payload: self.decode_buffer.payload().to_vec(),
            },
            Opcode::GoAway => Event::GoAway {
                code: self.decode_buffer.get_code(),
                reason: self.decode_buffer.payload().to_vec(),
            },
            Opcode::SelectEncoding => Event::SelectEncoding {
                encoding: self.decode_buffer.payload().to_vec(),
            },
            Opcode::Hello => {
                let supported_encodings = self
                    .decode_buffer
                    .payload()
                    .split(|&b| b == ENCODING_SEPARATOR)
                    .map(|s| s.to_vec())
                    .collect();
                Event::Hello {
                    version: self.decode_buffer.get_version(),
                    ping_interval: self.decode_buffer.get_ping_interval(),
                    supported_encodings,
                }
            }
        }
    }
}
