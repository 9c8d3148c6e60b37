//! Wire envelope shared by every topic.
//!
//! Each message on the bus is a self-describing envelope:
//!
//! ```text
//! ┌────┬───────────────┬─────────────────────────┐
//! │ NN │ type tag      │ payload (JSON document) │
//! └────┴───────────────┴─────────────────────────┘
//!  2 B   NN bytes        remaining bytes
//! ```
//!
//! `NN` is the byte length of the type tag written as two ASCII decimal
//! digits (`"07"`, `"11"`, ...). A fixed-width prefix means the payload can
//! contain any byte without escaping, at the cost of a hard ceiling of
//! [`MAX_TAG_LEN`] bytes for a type tag.
//!
//! # Example
//!
//! ```
//! use answers_core::envelope;
//!
//! let bytes = envelope::encode("userCreated", br#"{"id":"u1"}"#).unwrap();
//! assert_eq!(&bytes[..13], b"11userCreated");
//!
//! let (tag, payload) = envelope::decode(&bytes).unwrap();
//! assert_eq!(tag, "userCreated");
//! assert_eq!(payload, br#"{"id":"u1"}"#);
//! ```

use thiserror::Error;

/// Number of ASCII digits in the length prefix.
pub const PREFIX_LEN: usize = 2;

/// Longest type tag the two-digit prefix can describe.
pub const MAX_TAG_LEN: usize = 99;

/// Errors raised while framing or unframing an envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The type tag does not fit in the two-digit prefix.
    #[error("Type tag is {len} bytes long, the envelope allows at most {MAX_TAG_LEN}")]
    TagTooLong {
        /// Byte length of the rejected tag
        len: usize,
    },

    /// The message cannot be read as an envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
}

/// Encode a type tag and payload into a wire message.
///
/// # Errors
///
/// Returns [`EnvelopeError::TagTooLong`] if the tag exceeds 99 bytes.
pub fn encode(tag: &str, payload: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if tag.len() > MAX_TAG_LEN {
        return Err(EnvelopeError::TagTooLong { len: tag.len() });
    }
    Ok(frame(tag, payload))
}

/// Split a wire message into its type tag and payload, borrowing from
/// `message`.
///
/// # Errors
///
/// Returns [`EnvelopeError::MalformedEnvelope`] if the message is shorter
/// than the prefix, the prefix is not two decimal digits, the declared tag
/// length runs past the end of the message, or the tag is not UTF-8.
pub fn decode(message: &[u8]) -> Result<(&str, &[u8]), EnvelopeError> {
    let Some((prefix, rest)) = message.split_at_checked(PREFIX_LEN) else {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "message is {} bytes, shorter than the {PREFIX_LEN}-byte length prefix",
            message.len()
        )));
    };

    let mut tag_len = 0usize;
    for &digit in prefix {
        if !digit.is_ascii_digit() {
            return Err(EnvelopeError::MalformedEnvelope(format!(
                "length prefix {:?} is not two decimal digits",
                String::from_utf8_lossy(prefix)
            )));
        }
        tag_len = tag_len * 10 + usize::from(digit - b'0');
    }

    let Some((tag, payload)) = rest.split_at_checked(tag_len) else {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "declared tag length {tag_len} exceeds the {} bytes after the prefix",
            rest.len()
        )));
    };

    let tag = std::str::from_utf8(tag).map_err(|e| {
        EnvelopeError::MalformedEnvelope(format!("type tag is not valid UTF-8: {e}"))
    })?;

    Ok((tag, payload))
}

fn frame(tag: &str, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(PREFIX_LEN + tag.len() + payload.len());
    message.extend_from_slice(format!("{:02}", tag.len()).as_bytes());
    message.extend_from_slice(tag.as_bytes());
    message.extend_from_slice(payload);
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_two_digit_zero_padded_prefix() {
        let bytes = encode("abc", b"xyz").unwrap();
        assert_eq!(bytes, b"03abcxyz");
    }

    #[test]
    fn encodes_empty_tag_and_payload() {
        assert_eq!(encode("", b"").unwrap(), b"00");
        assert_eq!(decode(b"00").unwrap(), ("", &b""[..]));
    }

    #[test]
    fn answer_posted_matches_known_wire_bytes() {
        let bytes = encode("answerPosted", b"{}").unwrap();
        assert_eq!(bytes, b"12answerPosted{}");
    }

    #[test]
    fn accepts_tag_of_exactly_99_bytes() {
        let tag = "t".repeat(99);
        let bytes = encode(&tag, b"p").unwrap();
        assert_eq!(&bytes[..2], b"99");
        assert_eq!(decode(&bytes).unwrap(), (tag.as_str(), &b"p"[..]));
    }

    #[test]
    fn rejects_tag_longer_than_99_bytes() {
        let tag = "t".repeat(100);
        assert_eq!(
            encode(&tag, b""),
            Err(EnvelopeError::TagTooLong { len: 100 })
        );
        // 34 three-byte characters: 34 chars but 102 bytes
        let wide = "€".repeat(34);
        assert_eq!(
            encode(&wide, b""),
            Err(EnvelopeError::TagTooLong { len: 102 })
        );
    }

    #[test]
    fn rejects_messages_shorter_than_prefix() {
        assert!(matches!(decode(b""), Err(EnvelopeError::MalformedEnvelope(_))));
        assert!(matches!(decode(b"1"), Err(EnvelopeError::MalformedEnvelope(_))));
    }

    #[test]
    fn rejects_non_digit_prefix() {
        for message in [&b"a1tag"[..], b"1atag", b"+1t", b" 1t", b"-1t"] {
            assert!(
                matches!(decode(message), Err(EnvelopeError::MalformedEnvelope(_))),
                "{message:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_declared_length_past_end() {
        assert!(matches!(
            decode(b"05abc"),
            Err(EnvelopeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn rejects_non_utf8_tag() {
        assert!(matches!(
            decode(&[b'0', b'2', 0xff, 0xfe, b'{']),
            Err(EnvelopeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn payload_may_contain_digits_and_prefix_like_bytes() {
        let bytes = encode("userCreated", b"05abc99").unwrap();
        let (tag, payload) = decode(&bytes).unwrap();
        assert_eq!(tag, "userCreated");
        assert_eq!(payload, b"05abc99");
    }

    #[test]
    fn prefix_counts_bytes_not_characters() {
        let bytes = encode("réponse✓", b"{}").unwrap();
        assert_eq!(&bytes[..2], b"11");
        assert_eq!(decode(&bytes).unwrap(), ("réponse✓", &b"{}"[..]));
    }

    /// Printable UTF-8 tags, multi-byte characters included, trimmed to fit
    /// the prefix in bytes.
    fn utf8_tag() -> impl Strategy<Value = String> {
        "\\PC{0,99}".prop_map(|mut tag| {
            while tag.len() > MAX_TAG_LEN {
                tag.pop();
            }
            tag
        })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            tag in utf8_tag(),
            payload in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let bytes = encode(&tag, &payload).unwrap();
            let (decoded_tag, decoded_payload) = decode(&bytes).unwrap();
            prop_assert_eq!(decoded_tag, tag.as_str());
            prop_assert_eq!(decoded_payload, payload.as_slice());
        }

        #[test]
        fn truncated_tag_is_malformed(
            tag in "[a-z]{1,99}",
            cut in 1usize..99,
        ) {
            let bytes = encode(&tag, b"").unwrap();
            let cut = cut.min(tag.len());
            let truncated = &bytes[..bytes.len() - cut];
            prop_assert!(decode(truncated).is_err());
        }

        #[test]
        fn non_digit_first_byte_is_malformed(
            first in any::<u8>().prop_filter("not a digit", |b| !b.is_ascii_digit()),
            rest in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let mut message = vec![first];
            message.extend(rest);
            prop_assert!(decode(&message).is_err());
        }
    }
}
