//! # Base62 Codec
//!
//! Re-expresses a byte sequence as a compact string over a 62-symbol
//! alphabet (digits first, then uppercase, then lowercase).
//!
//! The input bytes are treated as one big-endian, arbitrary-precision
//! unsigned integer, so the round trip is **numeric**, not byte-preserving:
//! leading zero bytes are discarded by the conversion.
//! `decode_base62(encode_base62(b))` equals `b` as an integer but may be
//! shorter than `b`. This is the documented contract, not a defect; the
//! text codec guards the one case where it matters (see
//! [`crate::codec::encode_hert`]).

use crate::types::HertError;

/// The 62-symbol alphabet: `0-9`, `A-Z`, `a-z`, in that order.
pub const ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Numeric value of one alphabet symbol.
fn digit_value(ch: char) -> Result<u32, HertError> {
    match ch {
        '0'..='9' => Ok(ch as u32 - '0' as u32),
        'A'..='Z' => Ok(ch as u32 - 'A' as u32 + 10),
        'a'..='z' => Ok(ch as u32 - 'a' as u32 + 36),
        _ => Err(HertError::InvalidBase62Char(ch)),
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode bytes (big-endian integer) as a base62 string.
///
/// Empty or all-zero input encodes as `"0"`.
#[must_use]
pub fn encode_base62(bytes: &[u8]) -> String {
    // Working copy without leading zeros; they carry no numeric value.
    let mut num: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
    if num.is_empty() {
        return "0".to_string();
    }

    // Repeated divmod by 62 over the big-endian byte vector.
    let mut digits: Vec<u8> = Vec::new();
    while !num.is_empty() {
        let mut quotient: Vec<u8> = Vec::with_capacity(num.len());
        let mut rem: u32 = 0;
        for &b in &num {
            let acc = rem * 256 + u32::from(b);
            let q = (acc / 62) as u8;
            rem = acc % 62;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q);
            }
        }
        digits.push(ALPHABET[rem as usize]);
        num = quotient;
    }
    digits.reverse();
    // The alphabet is pure ASCII.
    String::from_utf8_lossy(&digits).into_owned()
}

/// Decode a base62 string back to its big-endian byte form.
///
/// The result carries no leading zero bytes; the numeric value zero decodes
/// to a single `0x00` byte. Fails on empty input and on any character
/// outside the alphabet.
pub fn decode_base62(s: &str) -> Result<Vec<u8>, HertError> {
    if s.is_empty() {
        return Err(HertError::EmptyBase62);
    }

    // Multiply-accumulate over a big-endian byte vector.
    let mut out: Vec<u8> = Vec::new();
    for ch in s.chars() {
        let mut carry = digit_value(ch)?;
        for byte in out.iter_mut().rev() {
            let acc = u32::from(*byte) * 62 + carry;
            *byte = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            out.insert(0, (carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    if out.is_empty() {
        out.push(0);
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================
