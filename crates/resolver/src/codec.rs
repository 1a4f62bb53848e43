/// Inputs shorter than this are never treated as hex-encoded.
pub const MIN_ENCODED_LEN: usize = 30;

/// Decodes a possibly hex-encoded panorama identifier.
///
/// Returns `None` for empty or whitespace-only input. Input that is not all
/// hex digits, or is shorter than [`MIN_ENCODED_LEN`], comes back unchanged,
/// surrounding whitespace included. Otherwise every pair of hex digits becomes
/// one byte, mapped to the character with that code point. Any pair that does
/// not parse (an odd trailing digit included) also returns the input unchanged
/// rather than a partial result.
#[must_use]
pub fn decode_location_id(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    if raw.len() < MIN_ENCODED_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(raw.to_string());
    }

    match decode_hex_pairs(raw) {
        Some(decoded) => Some(decoded),
        None => {
            log::debug!("Keeping undecodable identifier as-is ({} chars)", raw.len());
            Some(raw.to_string())
        }
    }
}

fn decode_hex_pairs(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    if bytes.len() % 2 != 0 {
        return None;
    }
    bytes
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok().map(char::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_has_no_identifier() {
        assert_eq!(decode_location_id(""), None);
        assert_eq!(decode_location_id("   "), None);
    }

    #[test]
    fn canonical_ids_pass_through() {
        let canonical = "CAoSLEFGMVFpcE1fX2Jq";
        assert_eq!(decode_location_id(canonical).as_deref(), Some(canonical));
    }

    #[test]
    fn pass_through_keeps_surrounding_whitespace() {
        assert_eq!(decode_location_id(" abc123 ").as_deref(), Some(" abc123 "));
        let padded = format!(" {} ", "41".repeat(20));
        assert_eq!(decode_location_id(&padded).as_deref(), Some(padded.as_str()));
    }

    #[test]
    fn short_hex_is_not_decoded() {
        assert_eq!(decode_location_id("deadbeef").as_deref(), Some("deadbeef"));
    }

    #[test]
    fn decodes_hex_encoded_panorama() {
        let canonical = "abcDEF0123456789_-xyzQ";
        let encoded: String = canonical.bytes().map(|b| format!("{b:02x}")).collect();
        assert_eq!(encoded.len(), 44);
        assert_eq!(decode_location_id(&encoded).as_deref(), Some(canonical));
    }

    #[test]
    fn odd_length_hex_falls_back_to_raw() {
        let raw = "4".repeat(31);
        assert_eq!(decode_location_id(&raw).as_deref(), Some(raw.as_str()));
    }

    proptest! {
        #[test]
        fn proptest_decode_is_idempotent_on_canonical(value in "[g-zG-Z_\\-][A-Za-z0-9_\\-]{4,28}") {
            let once = decode_location_id(&value).expect("non-empty");
            let twice = decode_location_id(&once).expect("non-empty");
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn proptest_even_hex_halves_in_length(
            pairs in proptest::collection::vec("[0-9a-fA-F]{2}", 15..64)
        ) {
            let raw = pairs.concat();
            let decoded = decode_location_id(&raw).expect("non-empty");
            prop_assert_eq!(decoded.chars().count(), raw.len() / 2);
        }
    }
}
