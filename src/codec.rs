//! Frame Codec — pure byte-level encode routines and wire layout constants
//! (spec.md §4.1).
//!
//! Every `encode_*` function builds one complete frame (opcode byte, fixed
//! header, payload) into a private `Vec<u8>` and hands it to
//! [`crate::buffer::WriteBuffer::append`] in one call. Building the frame
//! off to the side before a single `append` is what makes each encoder
//! transactional: a failed append (buffer growth failure) never leaves a
//! half-written frame in the write buffer (spec.md §7).

use crate::error::CodecError;
use crate::opcode::Opcode;

/// Size, in bytes, of the fixed header that follows the opcode byte for a
/// given opcode (spec.md §4.1 table, "Fixed header after opcode byte").
pub(crate) fn fixed_header_len(opcode: Opcode) -> usize {
    match opcode {
        Opcode::Ping | Opcode::Pong => 4,                // seq
        Opcode::Request | Opcode::Response => 8,         // seq + payload_len
        Opcode::Push => 4,                               // payload_len
        Opcode::Error => 1 + 4 + 4,                       // code + seq + payload_len
        Opcode::GoAway => 1 + 4,                         // code + payload_len
        Opcode::Hello => 1 + 4 + 4,                       // version + ping_interval + payload_len
        Opcode::SelectEncoding => 4,                      // payload_len
    }
}

/// Total header size (opcode byte included) for a given opcode.
pub(crate) fn header_size(opcode: Opcode) -> usize {
    1 + fixed_header_len(opcode)
}

fn push_u32_be(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn payload_len_u32(payload: &[u8]) -> Result<u32, CodecError> {
    u32::try_from(payload.len()).map_err(|_| CodecError::BadInput {
        reason: "payload length does not fit in a u32",
    })
}

/// Encode a PING frame: `[opcode, seq]`.
pub(crate) fn encode_ping(seq: u32) -> Vec<u8> {
    let mut frame = Vec::with_capacity(header_size(Opcode::Ping));
    frame.push(Opcode::Ping.to_byte());
    push_u32_be(&mut frame, seq);
    frame
}

/// Encode a PONG frame: `[opcode, seq]`.
pub(crate) fn encode_pong(seq: u32) -> Vec<u8> {
    let mut frame = Vec::with_capacity(header_size(Opcode::Pong));
    frame.push(Opcode::Pong.to_byte());
    push_u32_be(&mut frame, seq);
    frame
}

/// Encode a REQUEST frame: `[opcode, seq, payload_len, payload]`.
pub(crate) fn encode_request(seq: u32, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(payload)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::Request) + payload.len());
    frame.push(Opcode::Request.to_byte());
    push_u32_be(&mut frame, seq);
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode a RESPONSE frame: `[opcode, seq, payload_len, payload]`.
pub(crate) fn encode_response(seq: u32, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(payload)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::Response) + payload.len());
    frame.push(Opcode::Response.to_byte());
    push_u32_be(&mut frame, seq);
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode a PUSH frame: `[opcode, payload_len, payload]`.
pub(crate) fn encode_push(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(payload)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::Push) + payload.len());
    frame.push(Opcode::Push.to_byte());
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode an ERROR frame: `[opcode, code, seq, payload_len, payload]`.
pub(crate) fn encode_error(code: u8, seq: u32, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(payload)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::Error) + payload.len());
    frame.push(Opcode::Error.to_byte());
    frame.push(code);
    push_u32_be(&mut frame, seq);
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Encode a GOAWAY frame: `[opcode, code, payload_len, reason]`.
pub(crate) fn encode_goaway(code: u8, reason: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(reason)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::GoAway) + reason.len());
    frame.push(Opcode::GoAway.to_byte());
    frame.push(code);
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(reason);
    Ok(frame)
}

/// Encode a HELLO frame: `[opcode, version, ping_interval, payload_len, payload]`,
/// where payload is `encodings` joined by `,` (spec.md §4.5).
pub(crate) fn encode_hello(
    version: u8,
    ping_interval: u32,
    encodings: &[Vec<u8>],
) -> Result<Vec<u8>, CodecError> {
    let mut payload = Vec::new();
    for (i, encoding) in encodings.iter().enumerate() {
        if i > 0 {
            payload.push(crate::opcode::ENCODING_SEPARATOR);
        }
        payload.extend_from_slice(encoding);
    }
    let len = payload_len_u32(&payload)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::Hello) + payload.len());
    frame.push(Opcode::Hello.to_byte());
    frame.push(version);
    push_u32_be(&mut frame, ping_interval);
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Encode a SELECT_ENCODING frame: `[opcode, payload_len, encoding]`.
pub(crate) fn encode_select_encoding(encoding: &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = payload_len_u32(encoding)?;
    let mut frame = Vec::with_capacity(header_size(Opcode::SelectEncoding) + encoding.len());
    frame.push(Opcode::SelectEncoding.to_byte());
    push_u32_be(&mut frame, len);
    frame.extend_from_slice(encoding);
    Ok(frame)
}
