//! Integration tests for write-buffer conservation, compaction, and
//! big-buffer reclamation (spec.md §8, properties 4-6), exercised through
//! `StreamHandler`'s public surface since the buffers themselves are not
//! part of the public API (spec.md §4.5: `StreamHandler` is the surface).

use duplex_frame_core::StreamHandler;

#[test]
fn test_write_buffer_conservation_across_appends_and_partial_consumes() {
    let mut handler = StreamHandler::new();
    handler.send_push(b"abcde").unwrap();
    let frame_len = handler.write_buffer_len();
    assert!(frame_len > 0);

    handler.send_push(b"fghij").unwrap();
    assert_eq!(handler.write_buffer_len(), frame_len * 2);

    let remaining = handler.write_buffer_consume_bytes(3);
    assert_eq!(remaining, frame_len * 2 - 3);
    assert_eq!(handler.write_buffer_len(), remaining);

    let rest = handler.write_buffer_get_bytes(usize::MAX, true).unwrap();
    assert_eq!(rest.len(), remaining);
    assert_eq!(handler.write_buffer_len(), 0);
}

#[test]
fn test_get_bytes_without_consume_does_not_advance() {
    let mut handler = StreamHandler::new();
    handler.send_push(b"hello").unwrap();
    let len = handler.write_buffer_len();

    let peeked = handler.write_buffer_get_bytes(3, false).unwrap();
    assert_eq!(peeked.len(), 3);
    assert_eq!(handler.write_buffer_len(), len, "peek must not consume");

    let all = handler.write_buffer_get_bytes(usize::MAX, true).unwrap();
    assert_eq!(all.len(), len);
    assert_eq!(handler.write_buffer_len(), 0);
}

#[test]
fn test_get_bytes_on_empty_buffer_returns_none() {
    let mut handler = StreamHandler::new();
    assert_eq!(handler.write_buffer_get_bytes(10, true), None);
}

#[test]
fn test_many_small_sends_then_full_drain_is_exact() {
    let mut handler = StreamHandler::new();
    let mut total = 0usize;
    for i in 0..200u32 {
        handler.send_ping().ok();
        let _ = i;
    }
    // Every PING frame is opcode(1) + seq(4) = 5 bytes.
    total += 200 * 5;
    assert_eq!(handler.write_buffer_len(), total);

    let mut drained = 0usize;
    while handler.write_buffer_len() > 0 {
        let chunk = handler.write_buffer_get_bytes(7, true).unwrap();
        drained += chunk.len();
    }
    assert_eq!(drained, total);
    assert_eq!(handler.write_buffer_len(), 0);
}

#[test]
fn test_decode_buffer_reclaims_after_large_payload_drains() {
    // A payload at/above BIG_ALLOC_THRESHOLD forces the decode buffer to
    // grow past the threshold; after the frame is extracted the buffer
    // must shrink back to unallocated rather than holding the allocation
    // forever (spec.md §8 property 6).
    let big_payload = vec![0x42u8; 2 * 1024 * 1024 + 1];
    let mut sender = StreamHandler::new();
    sender.send_push(&big_payload).unwrap();
    let bytes = sender.write_buffer_get_bytes(usize::MAX, true).unwrap();

    let mut receiver = StreamHandler::new();
    let events = receiver.on_bytes_received(&bytes).unwrap();
    assert_eq!(events.len(), 1);

    // Feeding a tiny frame afterwards must still work: the big buffer
    // was freed and is lazily reallocated on next use, not left corrupt.
    let mut pinger = StreamHandler::new();
    pinger.send_ping().unwrap();
    let ping_bytes = pinger.write_buffer_get_bytes(usize::MAX, true).unwrap();
    let events = receiver.on_bytes_received(&ping_bytes).unwrap();
    assert_eq!(events.len(), 1);
}

#[test]
fn test_write_buffer_reclaims_after_large_drain() {
    let big_payload = vec![0xAAu8; 2 * 1024 * 1024 + 100];
    let mut handler = StreamHandler::new();
    handler.send_push(&big_payload).unwrap();
    assert!(handler.write_buffer_len() > 2 * 1024 * 1024);

    // Fully drain: reset_or_compact frees the big allocation.
    let _ = handler.write_buffer_get_bytes(usize::MAX, true).unwrap();
    assert_eq!(handler.write_buffer_len(), 0);

    // The handler is still usable for small sends afterwards.
    handler.send_ping().unwrap();
    assert_eq!(handler.write_buffer_len(), 5);
}
