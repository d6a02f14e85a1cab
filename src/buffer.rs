//! Write Buffer and Decode Buffer (spec.md §4.3, §4.4).
//!
//! Both buffers share the same growth/shrink discipline: grow by doubling
//! (or exactly to what's needed, whichever is larger) and release the
//! allocation entirely once it crosses `big_alloc_threshold` and drains.
//! That shared policy lives on [`GrowableBuffer`]; `WriteBuffer` adds the
//! position cursor and compaction, `DecodeBuffer` adds the parser state
//! machine.

use crate::codec::header_size;
use crate::error::CodecError;
use crate::opcode::Opcode;

/// A growable, contiguous byte region (spec.md §3 "Growable Buffer").
///
/// Backed by `Vec<u8>`: `length()` is the vector's `len()`, `allocated_size()`
/// is its `capacity()`. `grow_to` and `release_if_big` centralise the policy
/// both `WriteBuffer` and `DecodeBuffer` need.
#[derive(Debug, Clone)]
pub(crate) struct GrowableBuffer {
    buf: Vec<u8>,
    initial_alloc: usize,
}

impl GrowableBuffer {
    pub(crate) fn new(initial_alloc: usize) -> Self {
        Self {
            buf: Vec::new(),
            initial_alloc,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn allocated_size(&self) -> usize {
        self.buf.capacity()
    }

    /// Ensure capacity for `needed_total` bytes. A buffer growing from
    /// empty jumps straight to `max(initial_alloc, needed_total)`; any
    /// later growth doubles (`max(allocated_size * 2, needed_total)`)
    /// (spec.md §4.1 growth policy, §9 handler-construction parameters).
    /// Grows before anything is written, so a failure here never leaves
    /// the buffer partially mutated.
    pub(crate) fn grow_to(&mut self, needed_total: usize) -> Result<(), CodecError> {
        if needed_total <= self.buf.capacity() {
            return Ok(());
        }
        let target = if self.buf.capacity() == 0 {
            needed_total.max(self.initial_alloc)
        } else {
            (self.buf.capacity() * 2).max(needed_total)
        };
        let additional = target - self.buf.len();
        if self.buf.try_reserve(additional).is_err() {
            tracing::debug!(target, "buffer growth failed");
            return Err(CodecError::OutOfMemory { requested: target });
        }
        tracing::trace!(from = self.buf.capacity(), to = target, "grew buffer");
        Ok(())
    }

    /// Free the allocation if it has grown past `threshold`; otherwise
    /// just truncate the logical length to zero.
    pub(crate) fn release_if_big(&mut self, threshold: usize) {
        if self.buf.capacity() >= threshold {
            tracing::trace!(capacity = self.buf.capacity(), threshold, "releasing big buffer");
            self.buf = Vec::new();
        } else {
            self.buf.clear();
        }
    }
}

/// The outgoing byte queue: a growable buffer plus a `position` cursor
/// marking bytes already handed to the transport (spec.md §4.3).
#[derive(Debug)]
pub struct WriteBuffer {
    inner: GrowableBuffer,
    position: usize,
    big_alloc_threshold: usize,
}

impl WriteBuffer {
    pub(crate) fn new(initial_alloc: usize, big_alloc_threshold: usize) -> Self {
        Self {
            inner: GrowableBuffer::new(initial_alloc),
            position: 0,
            big_alloc_threshold,
        }
    }

    /// Append `bytes` to the buffer, growing first so the append is
    /// all-or-nothing.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.inner.grow_to(self.inner.len() + bytes.len())?;
        self.inner.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Unread byte count: `length - position`.
    pub fn len(&self) -> usize {
        self.inner.len() - self.position
    }

    /// True if there are no unread bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy up to `n` unread bytes starting at `position`, without
    /// advancing it.
    pub fn peek(&self, n: usize) -> Vec<u8> {
        let available = self.len();
        let take = n.min(available);
        self.inner.buf[self.position..self.position + take].to_vec()
    }

    /// Advance `position` by `min(n, len())`, compacting/freeing per
    /// `reset_or_compact`. Returns the remaining unread length.
    pub fn consume(&mut self, n: usize) -> usize {
        let take = n.min(self.len());
        self.position += take;
        self.reset_or_compact();
        self.len()
    }

    /// Copy up to `n` unread bytes; if `consume` is true, advance the
    /// cursor (and possibly compact) as a side effect. Returns `None` when
    /// there are no unread bytes at all.
    pub fn get_bytes(&mut self, n: usize, consume: bool) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }
        let data = self.peek(n);
        if consume {
            self.consume(data.len());
        }
        Some(data)
    }

    /// `reset_or_compact` (spec.md §4.3): drained buffers are freed once
    /// they cross the big-allocation threshold; a meaningfully-advanced
    /// cursor (past the midpoint of the allocation) triggers a shift back
    /// to offset zero; otherwise nothing moves.
    fn reset_or_compact(&mut self) {
        if self.position == self.inner.len() {
            self.inner.release_if_big(self.big_alloc_threshold);
            self.position = 0;
        } else if self.position > self.inner.allocated_size() / 2 && self.inner.len() > self.position
        {
            tracing::trace!(position = self.position, "compacting write buffer");
            self.inner.buf.drain(..self.position);
            self.position = 0;
        }
    }
}

/// Parser state for a frame under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingHeader,
    AwaitingPayload,
    Complete,
}

/// Outcome of feeding bytes into a `DecodeBuffer` (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeStatus {
    NeedsMore,
    Complete,
}

/// Result of a successful `DecodeBuffer::feed` call.
pub(crate) struct FeedOutcome {
    pub(crate) status: DecodeStatus,
    pub(crate) consumed: usize,
}

/// A `feed` call that hit a decode error; `consumed` is always populated
/// per spec.md §4.2's "`out_consumed` is always set ... even on error".
pub(crate) struct FeedError {
    pub(crate) error: CodecError,
    pub(crate) consumed: usize,
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// The incoming frame assembly area: a growable buffer plus parser state
/// (spec.md §4.4).
#[derive(Debug)]
pub struct DecodeBuffer {
    inner: GrowableBuffer,
    phase: Phase,
    opcode: Option<Opcode>,
    header_size: usize,
    seq: u32,
    code: u8,
    version: u8,
    ping_interval: u32,
    payload_len: u32,
    big_alloc_threshold: usize,
    max_payload_len: u32,
}

impl DecodeBuffer {
    pub(crate) fn new(initial_alloc: usize, big_alloc_threshold: usize, max_payload_len: u32) -> Self {
        Self {
            inner: GrowableBuffer::new(initial_alloc),
            phase: Phase::AwaitingHeader,
            opcode: None,
            header_size: 0,
            seq: 0,
            code: 0,
            version: 0,
            ping_interval: 0,
            payload_len: 0,
            big_alloc_threshold,
            max_payload_len,
        }
    }

    /// Feed as much of `input` as is needed to either complete the current
    /// frame or exhaust the input. Always reports how many bytes were
    /// absorbed, even on `NeedsMore` or error (spec.md §4.2).
    pub(crate) fn feed(&mut self, input: &[u8]) -> Result<FeedOutcome, FeedError> {
        let mut consumed = 0usize;
        loop {
            match self.phase {
                Phase::Complete => {
                    return Ok(FeedOutcome {
                        status: DecodeStatus::Complete,
                        consumed,
                    });
                }
                Phase::AwaitingHeader => {
                    if self.opcode.is_none() {
                        if consumed >= input.len() {
                            return Ok(FeedOutcome {
                                status: DecodeStatus::NeedsMore,
                                consumed,
                            });
                        }
                        let byte = input[consumed];
                        consumed += 1;
                        let opcode = match Opcode::from_byte(byte) {
                            Ok(opcode) => opcode,
                            Err(error) => {
                                tracing::debug!(opcode = byte, "bad opcode byte");
                                return Err(FeedError { error, consumed });
                            }
                        };
                        self.header_size = header_size(opcode);
                        if let Err(error) = self.inner.grow_to(self.header_size) {
                            return Err(FeedError { error, consumed });
                        }
                        self.inner.buf.push(byte);
                        self.opcode = Some(opcode);
                        continue;
                    }

                    let have = self.inner.len();
                    if have == self.header_size {
                        if let Err(error) = self.finish_header() {
                            return Err(FeedError { error, consumed });
                        }
                        continue;
                    }
                    let need = self.header_size - have;
                    let available = input.len() - consumed;
                    let take = need.min(available);
                    if take == 0 {
                        return Ok(FeedOutcome {
                            status: DecodeStatus::NeedsMore,
                            consumed,
                        });
                    }
                    self.inner.buf.extend_from_slice(&input[consumed..consumed + take]);
                    consumed += take;
                }
                Phase::AwaitingPayload => {
                    let target = self.header_size + self.payload_len as usize;
                    let have = self.inner.len();
                    if have == target {
                        self.phase = Phase::Complete;
                        return Ok(FeedOutcome {
                            status: DecodeStatus::Complete,
                            consumed,
                        });
                    }
                    let need = target - have;
                    let available = input.len() - consumed;
                    let take = need.min(available);
                    if take == 0 {
                        return Ok(FeedOutcome {
                            status: DecodeStatus::NeedsMore,
                            consumed,
                        });
                    }
                    if let Err(error) = self.inner.grow_to(have + take) {
                        return Err(FeedError { error, consumed });
                    }
                    self.inner.buf.extend_from_slice(&input[consumed..consumed + take]);
                    consumed += take;
                }
            }
        }
    }

    /// Parse the now-complete fixed header, set `payload_len`, and move to
    /// `AwaitingPayload` (or straight to `Complete` for PING/PONG, which
    /// have no payload field at all).
    fn finish_header(&mut self) -> Result<(), CodecError> {
        let opcode = self.opcode.expect("header byte already read");
        let buf = &self.inner.buf;
        let mut off = 1usize;

        match opcode {
            Opcode::Ping | Opcode::Pong => {
                self.seq = be_u32(&buf[off..off + 4]);
                self.payload_len = 0;
                self.phase = Phase::Complete;
                return Ok(());
            }
            Opcode::Request | Opcode::Response => {
                self.seq = be_u32(&buf[off..off + 4]);
                off += 4;
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
            Opcode::Push => {
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
            Opcode::Error => {
                self.code = buf[off];
                off += 1;
                self.seq = be_u32(&buf[off..off + 4]);
                off += 4;
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
            Opcode::GoAway => {
                self.code = buf[off];
                off += 1;
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
            Opcode::Hello => {
                self.version = buf[off];
                off += 1;
                self.ping_interval = be_u32(&buf[off..off + 4]);
                off += 4;
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
            Opcode::SelectEncoding => {
                self.payload_len = be_u32(&buf[off..off + 4]);
            }
        }
        if self.payload_len > self.max_payload_len {
            return Err(CodecError::FrameTooLarge {
                len: self.payload_len,
                max: self.max_payload_len,
            });
        }
        self.phase = Phase::AwaitingPayload;
        Ok(())
    }

    /// The opcode of the frame currently assembled (only meaningful once
    /// at least the opcode byte has arrived).
    pub(crate) fn opcode(&self) -> Option<Opcode> {
        self.opcode
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub(crate) fn get_seq(&self) -> u32 {
        self.seq
    }

    pub(crate) fn get_code(&self) -> u8 {
        self.code
    }

    pub(crate) fn get_version(&self) -> u8 {
        self.version
    }

    pub(crate) fn get_ping_interval(&self) -> u32 {
        self.ping_interval
    }

    /// The payload slice `[header_size, header_size + payload_len)`.
    pub(crate) fn payload(&self) -> &[u8] {
        &self.inner.buf[self.header_size..self.header_size + self.payload_len as usize]
    }

    /// Reset all parser fields and drop back to `AwaitingHeader`, freeing
    /// the allocation if it crossed the big-buffer threshold (spec.md
    /// §4.4).
    pub(crate) fn reset(&mut self) {
        self.inner.release_if_big(self.big_alloc_threshold);
        self.phase = Phase::AwaitingHeader;
        self.opcode = None;
        self.header_size = 0;
        self.seq = 0;
        self.code = 0;
        self.version = 0;
        self.ping_interval = 0;
        self.payload_len = 0;
    }
}
