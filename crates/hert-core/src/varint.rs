//! # Varint Codec
//!
//! Variable-length unsigned-integer encoding, protobuf-style: 7 data bits
//! per byte, most significant bit as continuation marker, least significant
//! group first.
//!
//! ## Width cap
//!
//! The wire format caps varints at [`MAX_VARINT_BYTES`] (5) bytes, which
//! bounds decodable values at [`MAX_VARINT_VALUE`] (2^35 - 1). The cap is
//! enforced symmetrically: decoding fails with "varint too long" past the
//! fifth byte, and encoding refuses values the decoder could never read
//! back. EIDs (32-bit) and AIDs (24-bit) fit with room to spare.

use crate::types::HertError;

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum number of bytes a single wire varint may occupy.
pub const MAX_VARINT_BYTES: usize = 5;

/// Largest value a [`MAX_VARINT_BYTES`]-byte varint can carry (2^35 - 1).
pub const MAX_VARINT_VALUE: u64 = (1 << 35) - 1;

// =============================================================================
// SCALAR ENCODE / DECODE
// =============================================================================

/// Encode a value as a varint, appending to `buf`.
///
/// Fails with [`HertError::VarintOverflow`] for values above
/// [`MAX_VARINT_VALUE`]. Negative input is unrepresentable by type.
pub fn encode_varint_into(buf: &mut Vec<u8>, value: u64) -> Result<(), HertError> {
    if value > MAX_VARINT_VALUE {
        return Err(HertError::VarintOverflow(value));
    }
    let mut v = value;
    while v > 0x7F {
        buf.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8 & 0x7F);
    Ok(())
}

/// Encode a value as a fresh varint byte vector.
pub fn encode_varint(value: u64) -> Result<Vec<u8>, HertError> {
    let mut buf = Vec::with_capacity(MAX_VARINT_BYTES);
    encode_varint_into(&mut buf, value)?;
    Ok(buf)
}

/// Decode one varint from `bytes` starting at `offset`.
///
/// Returns `(value, bytes_read)`. Fails with [`HertError::IncompleteVarint`]
/// when the buffer ends mid-group and [`HertError::VarintTooLong`] when more
/// than [`MAX_VARINT_BYTES`] bytes carry continuation bits.
pub fn decode_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), HertError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut read: usize = 0;

    loop {
        if read >= MAX_VARINT_BYTES {
            return Err(HertError::VarintTooLong(offset));
        }
        let Some(&byte) = bytes.get(offset + read) else {
            return Err(HertError::IncompleteVarint(offset));
        };
        value |= u64::from(byte & 0x7F) << shift;
        read += 1;
        if byte & 0x80 == 0 {
            return Ok((value, read));
        }
        shift += 7;
    }
}

// =============================================================================
// ARRAY ENCODE / DECODE
// =============================================================================

/// Encode a slice of values as consecutive varints.
pub fn encode_varint_array(values: &[u64]) -> Result<Vec<u8>, HertError> {
    let mut buf = Vec::with_capacity(values.len() * 2);
    for &v in values {
        encode_varint_into(&mut buf, v)?;
    }
    Ok(buf)
}

/// Decode `count` consecutive varints from `bytes` starting at `offset`.
///
/// Returns `(values, total_bytes_read)`. Applies the scalar decode
/// sequentially; the first malformed entry aborts the whole read.
pub fn decode_varint_array(
    bytes: &[u8],
    offset: usize,
    count: usize,
) -> Result<(Vec<u64>, usize), HertError> {
    let mut values = Vec::with_capacity(count);
    let mut consumed = 0;
    for _ in 0..count {
        let (value, read) = decode_varint(bytes, offset + consumed)?;
        values.push(value);
        consumed += read;
    }
    Ok((values, consumed))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_values() {
        for v in [0u64, 1, 42, 127] {
            let bytes = encode_varint(v).expect("encode");
            assert_eq!(bytes.len(), 1);
            assert_eq!(decode_varint(&bytes, 0).expect("decode"), (v, 1));
        }
    }

    #[test]
    fn multi_byte_values() {
        let cases: &[(u64, usize)] = &[
            (128, 2),
            (300, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            (268_435_455, 4),
            (268_435_456, 5),
            (MAX_VARINT_VALUE, 5),
        ];
        for &(v, expected_len) in cases {
            let bytes = encode_varint(v).expect("encode");
            assert_eq!(bytes.len(), expected_len, "length for {v}");
            assert_eq!(decode_varint(&bytes, 0).expect("decode"), (v, expected_len));
        }
    }

    #[test]
    fn encode_rejects_overflow() {
        assert!(matches!(
            encode_varint(MAX_VARINT_VALUE + 1),
            Err(HertError::VarintOverflow(_))
        ));
        assert!(matches!(
            encode_varint(u64::MAX),
            Err(HertError::VarintOverflow(_))
        ));
    }

    #[test]
    fn decode_rejects_incomplete() {
        // Continuation bit set but buffer ends.
        let bytes = [0x80u8, 0x80];
        assert!(matches!(
            decode_varint(&bytes, 0),
            Err(HertError::IncompleteVarint(0))
        ));
    }

    #[test]
    fn decode_rejects_overlong() {
        // Six continuation bytes exceed the cap.
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            decode_varint(&bytes, 0),
            Err(HertError::VarintTooLong(0))
        ));
    }

    #[test]
    fn decode_respects_offset() {
        let mut buf = vec![0xFFu8, 0xFF]; // junk prefix
        encode_varint_into(&mut buf, 300).expect("encode");
        assert_eq!(decode_varint(&buf, 2).expect("decode"), (300, 2));
    }

    #[test]
    fn array_roundtrip_reports_total_bytes() {
        let values = [0u64, 127, 128, 16_384, MAX_VARINT_VALUE];
        let bytes = encode_varint_array(&values).expect("encode");
        let (decoded, consumed) = decode_varint_array(&bytes, 0, values.len()).expect("decode");
        assert_eq!(decoded, values);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn array_decode_propagates_failure() {
        let mut bytes = encode_varint(7).expect("encode");
        bytes.push(0x80); // incomplete second entry
        assert!(decode_varint_array(&bytes, 0, 2).is_err());
    }

    #[test]
    fn empty_array_consumes_nothing() {
        let (values, consumed) = decode_varint_array(&[], 0, 0).expect("decode");
        assert!(values.is_empty());
        assert_eq!(consumed, 0);
    }
}
