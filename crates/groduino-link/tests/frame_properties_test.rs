//! Property tests for the frame codec.
//!
//! Payloads are arbitrary non-empty text free of the framing control
//! characters, which is the only text the codec carries unescaped.

use groduino_link::{FrameCodec, FrameError, ETX};
use proptest::prelude::*;

/// Non-empty text with no SOH, STX, ETX or EOT.
fn payload() -> impl Strategy<Value = String> {
    "[^\\x01-\\x04]{1,200}"
}

/// Offset of the checksum token within an encoded frame.
fn token_range(frame: &[u8]) -> std::ops::Range<usize> {
    let etx = frame
        .iter()
        .rposition(|&b| b == ETX)
        .expect("encoded frames contain ETX");
    etx + 1..frame.len() - 1
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(text in payload()) {
        let frame = FrameCodec::encode(&text);
        prop_assert_eq!(FrameCodec::decode(&frame), Ok(text));
    }

    #[test]
    fn prop_checksum_token_mutation_is_detected(
        text in payload(),
        at in any::<prop::sample::Index>(),
        delta in 1..=255u8,
    ) {
        let mut frame = FrameCodec::encode(&text);
        let token = token_range(&frame);
        let i = token.start + at.index(token.len());
        frame[i] = frame[i].wrapping_add(delta);

        let result = FrameCodec::decode(&frame);
        prop_assert!(
            matches!(result, Err(FrameError::ChecksumMismatch { .. })),
            "mutated frame decoded as {:?}",
            result
        );
    }

    #[test]
    fn prop_truncated_frame_is_never_accepted(
        text in payload(),
        at in any::<prop::sample::Index>(),
    ) {
        let frame = FrameCodec::encode(&text);
        // Dropping only the EOT is allowed; anything shorter must fail.
        let cut = at.index(frame.len() - 1);
        prop_assert!(FrameCodec::decode(&frame[..cut]).is_err());
    }

    #[test]
    fn prop_truncated_before_etx_is_never_accepted(
        text in payload(),
        at in any::<prop::sample::Index>(),
    ) {
        let frame = FrameCodec::encode(&text);
        let etx = token_range(&frame).start - 1;
        let cut = at.index(etx + 1);
        prop_assert!(FrameCodec::decode(&frame[..cut]).is_err());
    }

    #[test]
    fn prop_split_stream_yields_every_frame(
        texts in prop::collection::vec(payload(), 1..8),
        at in any::<prop::sample::Index>(),
    ) {
        let stream: Vec<u8> = texts.iter().flat_map(|t| FrameCodec::encode(t)).collect();
        let split = at.index(stream.len() + 1);

        let mut codec = FrameCodec::new();
        let mut decoded = Vec::new();
        for chunk in [&stream[..split], &stream[split..]] {
            codec.push(chunk);
            while let Some(result) = codec.decode_next() {
                decoded.push(result.expect("intact frame"));
            }
        }

        prop_assert_eq!(decoded, texts);
        prop_assert_eq!(codec.buffered_len(), 0);
    }
}
