//! Content encoding used by the contents API.

use crate::error::{Result, SyncError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

#[must_use]
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decodes base64 file content. The API wraps it at 60 columns, so all
/// whitespace is dropped first.
pub fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| SyncError::decode(path, err))?;
    String::from_utf8(bytes).map_err(|err| SyncError::decode(path, err))
}

/// Lowercase hex SHA-256 of `text`.
#[must_use]
pub(crate) fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    to_lower_hex(&digest)
}

fn to_lower_hex(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(LUT[(byte >> 4) as usize] as char);
        out.push(LUT[(byte & 0x0f) as usize] as char);
    }
    out
}
