//! duplex-frame-core: the sans-I/O core of a duplex RPC framing layer.
//!
//! This crate turns a stream of opaque bytes from a reliable transport into
//! a sequence of typed [`Event`]s, and turns locally produced events back
//! into bytes ready to be flushed to that transport. It is the hard part of
//! a duplex RPC protocol: message framing, per-direction sequence issuance,
//! incremental parsing with partial-input resumption, and buffer reuse for
//! both the outgoing write queue and the incoming assembly area.
//!
//! Everything else — sockets, retries, timeouts, ping cadence, encoding
//! negotiation policy — is deliberately out of scope. Those belong to a
//! **transport** (delivers/accepts byte chunks) and a **session layer**
//! (owns timers, correlates sequences, decides policy) built on top of
//! [`StreamHandler`].
//!
//! # Quick start
//!
//! ```rust
//! use duplex_frame_core::{StreamHandler, Event};
//!
//! let mut handler = StreamHandler::new();
//!
//! // Produce an event: allocate a seq and queue a REQUEST frame.
//! let seq = handler.send_request(b"hello").unwrap();
//! let bytes = handler.write_buffer_get_bytes(usize::MAX, true).unwrap();
//!
//! // Feed bytes back in (as if they arrived from a peer) and get events out.
//! let mut peer = StreamHandler::new();
//! let events = peer.on_bytes_received(&bytes).unwrap();
//! assert_eq!(events, vec![Event::Request { seq, payload: b"hello".to_vec() }]);
//! ```
//!
//! # Architecture
//!
//! - [`StreamHandler`] — the single stateful object per connection
//!   endpoint; owns both buffers and the sequence counter.
//! - [`Event`] — the decoded, owned representation of one frame.
//! - [`CodecError`] — fatal-to-the-operation, not-fatal-to-the-handler
//!   error kinds.
//! - `StreamHandlerConfig` — buffer/frame-size parameters, not process
//!   globals.
//!
//! It does NOT provide:
//! - Transport (you feed it bytes and drain its write buffer)
//! - Encryption, compression, or authentication
//! - Retry, timeout, or ordering-validation policy
//! - Multiplexed channel bookkeeping beyond raw sequence numbers

mod buffer;
mod codec;
mod error;
mod event;
mod opcode;
mod stream_handler;

pub use error::CodecError;
pub use event::Event;
pub use opcode::{Opcode, PROTOCOL_VERSION};
pub use stream_handler::{
    StreamHandler, StreamHandlerConfig, BIG_ALLOC_THRESHOLD, INITIAL_ALLOC, SEND_OK, SEQ_MAX,
};
