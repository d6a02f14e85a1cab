//! Decoded frame events (spec.md §3 Event table).

/// A decoded, in-memory representation of one complete frame.
///
/// Payload bytes are owned copies: resetting the decode buffer for the next
/// frame never invalidates an already-returned `Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request the peer wants answered, carrying a freshly allocated seq.
    Request {
        seq: u32,
        payload: Vec<u8>,
    },
    /// The answer to a previously issued `Request`, echoing its seq.
    Response {
        seq: u32,
        payload: Vec<u8>,
    },
    /// A fire-and-forget message; carries no sequence.
    Push {
        payload: Vec<u8>,
    },
    /// A liveness probe the handler has already auto-replied to with `Pong`.
    Ping {
        seq: u32,
    },
    /// A reply to a `Ping` this side sent earlier.
    Pong {
        seq: u32,
    },
    /// The peer's handshake: protocol version and encoding capabilities.
    Hello {
        version: u8,
        ping_interval: u32,
        supported_encodings: Vec<Vec<u8>>,
    },
    /// The peer is closing the connection (or the logical channel).
    GoAway {
        code: u8,
        reason: Vec<u8>,
    },
    /// The peer chose one of this side's advertised encodings.
    SelectEncoding {
        encoding: Vec<u8>,
    },
    /// An error response to a previously issued `Request`.
    Error {
        code: u8,
        seq: u32,
        payload: Vec<u8>,
    },
}
