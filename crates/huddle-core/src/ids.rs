//! Message-id encoding.
//!
//! A message id packs three fields into one integer: a container-kind tag
//! (`1` = channel, `2` = dm), the decimal digits of the container id, a
//! separator digit, and the decimal digits of a monotonically increasing
//! counter. The digit sequence is interpreted in base 16, with `0xA` as the
//! separator; the payload fields only ever use digits `0..=9`, so the
//! separator position is always recoverable.
//!
//! The scheme gives every message a globally unique id across both container
//! kinds, makes the owning container recoverable from the id alone, and
//! never reuses an id even after the message is deleted.

use crate::error::{CoreError, Result};

/// Separator digit between the container id and the counter.
const SEPARATOR: i64 = 0xA;

/// Which kind of container a message lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    Channel = 1,
    Dm = 2,
}

/// The fields recovered from a message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMessageId {
    pub kind: MsgKind,
    pub container_id: i64,
    pub message_id: i64,
}

/// Append the base-10 digits of `n` to `value` as base-16 digits.
fn push_decimal_digits(value: i64, n: i64) -> i64 {
    let mut digits = [0i64; 20];
    let mut len = 0;
    let mut rest = n;
    loop {
        digits[len] = rest % 10;
        len += 1;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    let mut out = value;
    for i in (0..len).rev() {
        out = out * 16 + digits[i];
    }
    out
}

/// Build a message id from its three fields.
pub fn encode(kind: MsgKind, container_id: i64, counter: i64) -> i64 {
    let mut value = kind as i64;
    value = push_decimal_digits(value, container_id);
    value = value * 16 + SEPARATOR;
    push_decimal_digits(value, counter)
}

/// Recover the container kind and id from a message id.
///
/// The id is re-rendered as base-16 digits and matched against the expected
/// layout; anything else is an invalid id.
pub fn decode(message_id: i64) -> Result<DecodedMessageId> {
    if message_id <= 0 {
        return Err(CoreError::MessageNotFound);
    }

    // Render base-16 digits, most significant first.
    let mut digits = Vec::new();
    let mut rest = message_id;
    while rest > 0 {
        digits.push(rest % 16);
        rest /= 16;
    }
    digits.reverse();

    let kind = match digits[0] {
        1 => MsgKind::Channel,
        2 => MsgKind::Dm,
        _ => return Err(CoreError::MessageNotFound),
    };

    let sep = match digits.iter().position(|&d| d == SEPARATOR) {
        Some(i) => i,
        None => return Err(CoreError::MessageNotFound),
    };

    // Layout: kind digit, >=1 container digit, separator, >=1 counter digit,
    // and every payload digit must be decimal.
    let container = &digits[1..sep];
    let counter = &digits[sep + 1..];
    if container.is_empty() || counter.is_empty() {
        return Err(CoreError::MessageNotFound);
    }
    if container.iter().chain(counter.iter()).any(|&d| d > 9) {
        return Err(CoreError::MessageNotFound);
    }

    let container_id = container.iter().fold(0i64, |acc, &d| acc * 10 + d);

    Ok(DecodedMessageId {
        kind,
        container_id,
        message_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_channel_ids() {
        let id = encode(MsgKind::Channel, 0, 0);
        let decoded = decode(id).unwrap();
        assert_eq!(decoded.kind, MsgKind::Channel);
        assert_eq!(decoded.container_id, 0);
        assert_eq!(decoded.message_id, id);
    }

    #[test]
    fn round_trips_dm_ids() {
        let id = encode(MsgKind::Dm, 17, 342);
        let decoded = decode(id).unwrap();
        assert_eq!(decoded.kind, MsgKind::Dm);
        assert_eq!(decoded.container_id, 17);
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let a = encode(MsgKind::Channel, 1, 5);
        let b = encode(MsgKind::Dm, 1, 5);
        assert_ne!(a, b);
    }

    #[test]
    fn large_container_ids_stay_unambiguous() {
        let id = encode(MsgKind::Channel, 123_456, 789);
        let decoded = decode(id).unwrap();
        assert_eq!(decoded.container_id, 123_456);
    }

    #[test]
    fn rejects_malformed_ids() {
        // Wrong kind digit.
        assert!(decode(encode(MsgKind::Channel, 3, 1) + 0x3_000_000).is_err());
        // No separator digit at all: 0x123.
        assert!(decode(0x123).is_err());
        // Hex digit outside 0..=9 in the payload: 0x1BA1.
        assert!(decode(0x1BA1).is_err());
        // Separator with an empty counter: 0x10A.
        assert!(decode(0x10A).is_err());
        // Non-positive.
        assert!(decode(0).is_err());
        assert!(decode(-4).is_err());
    }

    #[test]
    fn separator_digit_never_appears_in_payload() {
        // A separator right after the kind digit leaves an empty container
        // field and is rejected.
        assert!(decode(0x1A0A1).is_err());
    }
}
