//! # HERT Binary & Text Codec
//!
//! Packs a [`Hert`] to its byte form and wraps that in the prefixed base62
//! text token. The binary layout is a frozen v1 wire format — tags already
//! in stores must keep decoding — so both directions agree on this exact
//! field order:
//!
//! ```text
//! 1. EID                varint
//! 2. SP                 count varint, then count entries (0 when absent)
//! 3. DID                8 bytes, little-endian
//! 4. FLAGS              1 byte (see HertFlags)
//! 5. AID                varint, only if alias_present
//! 6. key rotation       1 byte, only if encrypted
//! 7. LP                 [section?, chapter?, paragraph, start, length] varints
//! 8. META               count varint + up to 3 varints, only if any set
//! ```
//!
//! The trailing meta block tolerates truncation: missing trailing bytes
//! decode as "no metadata". On the wire a meta value of 0 means "unset";
//! `Some(0)` therefore normalizes to `None` across a round trip, as does an
//! empty (rather than absent) sense path.
//!
//! Text form: `HERTv1:<base62(binary)>`. The decoder also accepts the
//! reserved `HERTv1e:` prefix, which the encoder never emits.

use crate::base62::{decode_base62, encode_base62};
use crate::types::{Aid, Did, Eid, Encryption, Hert, HertError, HertFlags, HertMeta, LocationPath};
use crate::varint::{decode_varint, encode_varint_into};

// =============================================================================
// TOKEN PREFIXES
// =============================================================================

/// Prefix of every emitted token.
pub const TOKEN_PREFIX: &str = "HERTv1:";

/// Reserved encrypted-token prefix. Accepted by the decoder, never emitted.
pub const TOKEN_PREFIX_ENCRYPTED: &str = "HERTv1e:";

/// Width of the fixed DID field.
const DID_BYTES: usize = 8;

/// Number of defined metadata fields.
const META_FIELDS: u64 = 3;

// =============================================================================
// BINARY ENCODE
// =============================================================================

/// Encode a tag to its binary wire form.
///
/// Validates the flag/field consistency invariant first; an inconsistent
/// tag is a programmer error and fails, never silently reinterpreted.
pub fn encode_hert_binary(hert: &Hert) -> Result<Vec<u8>, HertError> {
    hert.validate()?;

    let mut buf = Vec::with_capacity(32);

    // 1. EID
    encode_varint_into(&mut buf, hert.eid.0)?;

    // 2. SP: count, then entries
    let sp = hert.sense_path();
    encode_varint_into(&mut buf, sp.len() as u64)?;
    for &entry in sp {
        encode_varint_into(&mut buf, entry)?;
    }

    // 3. DID
    buf.extend_from_slice(&hert.did.0.to_le_bytes());

    // 4. FLAGS
    buf.push(hert.flags.pack());

    // 5. AID
    if let Some(aid) = hert.aid {
        encode_varint_into(&mut buf, aid.0)?;
    }

    // 6. Key rotation
    if let Some(rotation) = hert.flags.encryption.key_rotation() {
        buf.push(rotation);
    }

    // 7. LP
    if let Some(section) = hert.lp.section {
        encode_varint_into(&mut buf, section)?;
    }
    if let Some(chapter) = hert.lp.chapter {
        encode_varint_into(&mut buf, chapter)?;
    }
    encode_varint_into(&mut buf, hert.lp.paragraph)?;
    encode_varint_into(&mut buf, hert.lp.token_start)?;
    encode_varint_into(&mut buf, hert.lp.token_length)?;

    // 8. META, only when something is set
    if let Some(meta) = &hert.meta {
        if !meta.is_empty() {
            encode_varint_into(&mut buf, META_FIELDS)?;
            encode_varint_into(&mut buf, meta.model_version.unwrap_or(0))?;
            encode_varint_into(&mut buf, meta.extractor_id.unwrap_or(0))?;
            encode_varint_into(&mut buf, meta.timestamp.unwrap_or(0))?;
        }
    }

    Ok(buf)
}

// =============================================================================
// BINARY DECODE
// =============================================================================

/// Decode a tag from its binary wire form.
///
/// Flag/field consistency is established by construction here and not
/// re-validated; truncation anywhere before the meta block is an error.
pub fn decode_hert_binary(bytes: &[u8]) -> Result<Hert, HertError> {
    let mut offset = 0;

    // 1. EID
    let (eid, read) = decode_varint(bytes, offset)?;
    offset += read;

    // 2. SP
    let (sp_count, read) = decode_varint(bytes, offset)?;
    offset += read;
    let sp = if sp_count == 0 {
        None
    } else {
        // Each entry takes at least one byte, so a count beyond the bytes
        // left is a truncated (or hostile) payload. Rejecting it up front
        // also keeps the pre-allocation bounded by the input size.
        let remaining = bytes.len().saturating_sub(offset);
        if sp_count > remaining as u64 {
            return Err(HertError::Truncated {
                needed: sp_count as usize,
                remaining,
            });
        }
        let mut entries = Vec::with_capacity(sp_count as usize);
        for _ in 0..sp_count {
            let (entry, read) = decode_varint(bytes, offset)?;
            offset += read;
            entries.push(entry);
        }
        Some(entries)
    };

    // 3. DID
    let remaining = bytes.len().saturating_sub(offset);
    if remaining < DID_BYTES {
        return Err(HertError::Truncated {
            needed: DID_BYTES,
            remaining,
        });
    }
    let mut did_bytes = [0u8; DID_BYTES];
    did_bytes.copy_from_slice(&bytes[offset..offset + DID_BYTES]);
    let did = Did(u64::from_le_bytes(did_bytes));
    offset += DID_BYTES;

    // 4. FLAGS
    let Some(&flag_byte) = bytes.get(offset) else {
        return Err(HertError::Truncated {
            needed: 1,
            remaining: 0,
        });
    };
    let mut flags = HertFlags::unpack(flag_byte);
    offset += 1;

    // 5. AID
    let aid = if flags.alias_present {
        let (aid, read) = decode_varint(bytes, offset)?;
        offset += read;
        Some(Aid(aid))
    } else {
        None
    };

    // 6. Key rotation
    if flags.encryption.is_encrypted() {
        let Some(&rotation) = bytes.get(offset) else {
            return Err(HertError::Truncated {
                needed: 1,
                remaining: 0,
            });
        };
        flags.encryption = Encryption::Encrypted {
            key_rotation: rotation,
        };
        offset += 1;
    }

    // 7. LP
    let section = if flags.has_section {
        let (v, read) = decode_varint(bytes, offset)?;
        offset += read;
        Some(v)
    } else {
        None
    };
    let chapter = if flags.has_chapter {
        let (v, read) = decode_varint(bytes, offset)?;
        offset += read;
        Some(v)
    } else {
        None
    };
    let (paragraph, read) = decode_varint(bytes, offset)?;
    offset += read;
    let (token_start, read) = decode_varint(bytes, offset)?;
    offset += read;
    let (token_length, read) = decode_varint(bytes, offset)?;
    offset += read;

    // 8. META — missing trailing bytes mean "no metadata", never an error.
    let meta = decode_meta_block(bytes, offset)?;

    Ok(Hert {
        eid: Eid(eid),
        aid,
        sp,
        did,
        lp: LocationPath {
            section,
            chapter,
            paragraph,
            token_start,
            token_length,
        },
        flags,
        meta,
    })
}

/// Decode the optional trailing meta block.
///
/// Truncation (running out of bytes mid-block) degrades to `None`; a count
/// outside `0..=3` is corruption and is rejected.
fn decode_meta_block(bytes: &[u8], offset: usize) -> Result<Option<HertMeta>, HertError> {
    if offset >= bytes.len() {
        return Ok(None);
    }
    let (count, read) = match decode_varint(bytes, offset) {
        Ok(ok) => ok,
        Err(HertError::IncompleteVarint(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    if count > META_FIELDS {
        return Err(HertError::InvalidMetaCount(count));
    }

    let mut cursor = offset + read;
    let mut values = [0u64; META_FIELDS as usize];
    for slot in values.iter_mut().take(count as usize) {
        match decode_varint(bytes, cursor) {
            Ok((v, read)) => {
                *slot = v;
                cursor += read;
            }
            Err(HertError::IncompleteVarint(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
    }

    let meta = HertMeta {
        model_version: (values[0] != 0).then_some(values[0]),
        extractor_id: (values[1] != 0).then_some(values[1]),
        timestamp: (values[2] != 0).then_some(values[2]),
    };
    Ok(if meta.is_empty() { None } else { Some(meta) })
}

// =============================================================================
// TEXT ENCODE / DECODE
// =============================================================================

/// Encode a tag as a text token: `HERTv1:<base62(binary)>`.
///
/// Always emits the `v1` tag regardless of the encrypted flag; every token
/// in the wild carries it and the `v1e` variant stays reserved. A payload
/// whose first byte is 0 (only EID 0 produces one) is rejected, since
/// base62 drops leading zero bytes and the token would decode to a
/// different record.
pub fn encode_hert(hert: &Hert) -> Result<String, HertError> {
    let binary = encode_hert_binary(hert)?;
    if binary.first() == Some(&0) {
        return Err(HertError::AmbiguousPayload);
    }
    Ok(format!("{TOKEN_PREFIX}{}", encode_base62(&binary)))
}

/// Decode a text token back to a tag.
///
/// Accepts both the `HERTv1:` and reserved `HERTv1e:` prefixes.
pub fn decode_hert(token: &str) -> Result<Hert, HertError> {
    let payload = token
        .strip_prefix(TOKEN_PREFIX_ENCRYPTED)
        .or_else(|| token.strip_prefix(TOKEN_PREFIX))
        .ok_or_else(|| HertError::MalformedToken(truncate_for_error(token)))?;
    if payload.is_empty() {
        return Err(HertError::MalformedToken(truncate_for_error(token)));
    }
    let binary = decode_base62(payload)?;
    decode_hert_binary(&binary)
}

/// Keep error messages bounded when fed arbitrary junk.
fn truncate_for_error(token: &str) -> String {
    let mut shown: String = token.chars().take(32).collect();
    if shown.len() < token.len() {
        shown.push('…');
    }
    shown
}

// =============================================================================
// HUMAN-READABLE FORM
// =============================================================================

/// Diagnostic rendering of a tag, e.g.
/// `4102.S2.1 @ d:Zf7qJ9 p:1.3.14 t:823+4`.
///
/// Purely for logs and debugging; there is no round-trip obligation.
#[must_use]
pub fn encode_hert_readable(hert: &Hert) -> String {
    let mut out = hert.eid.0.to_string();

    if let Some(sp) = &hert.sp {
        if !sp.is_empty() {
            out.push_str(".S");
            let dotted: Vec<String> = sp.iter().map(u64::to_string).collect();
            out.push_str(&dotted.join("."));
        }
    }
    if let Some(aid) = hert.aid {
        out.push_str(&format!(".A{}", aid.0));
    }

    out.push_str(" @ d:");
    out.push_str(&encode_base62(&hert.did.0.to_be_bytes()));

    out.push_str(" p:");
    let mut path: Vec<String> = Vec::with_capacity(3);
    if let Some(section) = hert.lp.section {
        path.push(section.to_string());
    }
    if let Some(chapter) = hert.lp.chapter {
        path.push(chapter.to_string());
    }
    path.push(hert.lp.paragraph.to_string());
    out.push_str(&path.join("."));

    out.push_str(&format!(
        " t:{}+{}",
        hert.lp.token_start, hert.lp.token_length
    ));
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_KEY_ROTATION;

    fn minimal_tag() -> Hert {
        Hert {
            eid: Eid(4102),
            aid: None,
            sp: None,
            did: Did(0x0123_4567_89AB_CDEF),
            lp: LocationPath::new(14, 823, 4),
            flags: HertFlags {
                confidence_bin: 6,
                ..HertFlags::default()
            },
            meta: None,
        }
    }

    fn full_tag() -> Hert {
        Hert {
            eid: Eid(4102),
            aid: Some(Aid(77)),
            sp: Some(vec![2, 1]),
            did: Did(u64::MAX),
            lp: LocationPath {
                section: Some(1),
                chapter: Some(3),
                paragraph: 14,
                token_start: 823,
                token_length: 4,
            },
            flags: HertFlags {
                has_section: true,
                has_chapter: true,
                alias_present: true,
                chain_next: true,
                encryption: Encryption::Encrypted {
                    key_rotation: MAX_KEY_ROTATION,
                },
                confidence_bin: 7,
            },
            meta: Some(HertMeta {
                model_version: Some(3),
                extractor_id: Some(12),
                timestamp: Some(1_756_000_000),
            }),
        }
    }

    #[test]
    fn binary_roundtrip_minimal() {
        let tag = minimal_tag();
        let bytes = encode_hert_binary(&tag).expect("encode");
        assert_eq!(decode_hert_binary(&bytes).expect("decode"), tag);
    }

    #[test]
    fn binary_roundtrip_full() {
        let tag = full_tag();
        let bytes = encode_hert_binary(&tag).expect("encode");
        assert_eq!(decode_hert_binary(&bytes).expect("decode"), tag);
    }

    #[test]
    fn binary_layout_field_order() {
        let tag = minimal_tag();
        let bytes = encode_hert_binary(&tag).expect("encode");
        // EID 4102 = 0x1006 -> varint [0x86, 0x20]
        assert_eq!(&bytes[..2], &[0x86, 0x20]);
        // SP count 0
        assert_eq!(bytes[2], 0);
        // DID little-endian
        assert_eq!(&bytes[3..11], &0x0123_4567_89AB_CDEF_u64.to_le_bytes());
        // flags: only confidence_bin = 6
        assert_eq!(bytes[11], 0b0000_0110);
        // LP: paragraph 14, token_start 823 (2 bytes), token_length 4
        assert_eq!(bytes[12], 14);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn text_roundtrip() {
        for tag in [minimal_tag(), full_tag()] {
            let token = encode_hert(&tag).expect("encode");
            assert!(token.starts_with(TOKEN_PREFIX));
            assert_eq!(decode_hert(&token).expect("decode"), tag);
        }
    }

    #[test]
    fn decoder_accepts_reserved_encrypted_prefix() {
        let tag = minimal_tag();
        let token = encode_hert(&tag).expect("encode");
        let payload = token.strip_prefix(TOKEN_PREFIX).expect("prefix");
        let v1e = format!("{TOKEN_PREFIX_ENCRYPTED}{payload}");
        assert_eq!(decode_hert(&v1e).expect("decode"), tag);
    }

    #[test]
    fn malformed_tokens_rejected() {
        for bad in ["", "HERTv1", "HERTv1:", "HERTv2:abc", "hertv1:abc", "garbage"] {
            assert!(
                matches!(decode_hert(bad), Err(HertError::MalformedToken(_))),
                "expected rejection for {bad:?}"
            );
        }
        // Valid prefix, junk payload.
        assert!(matches!(
            decode_hert("HERTv1:ab!cd"),
            Err(HertError::InvalidBase62Char('!'))
        ));
    }

    #[test]
    fn eid_zero_cannot_tokenize() {
        let mut tag = minimal_tag();
        tag.eid = Eid(0);
        // Binary form is fine,
        let bytes = encode_hert_binary(&tag).expect("encode");
        assert_eq!(bytes[0], 0);
        assert_eq!(decode_hert_binary(&bytes).expect("decode"), tag);
        // but the base62 text layer would drop the leading zero byte.
        assert!(matches!(
            encode_hert(&tag),
            Err(HertError::AmbiguousPayload)
        ));
    }

    #[test]
    fn inconsistent_flags_rejected_at_encode() {
        let mut tag = minimal_tag();
        tag.flags.has_section = true; // lp.section is None
        assert!(matches!(
            encode_hert_binary(&tag),
            Err(HertError::FlagMismatch("has_section"))
        ));
    }

    #[test]
    fn truncated_fixed_fields_rejected() {
        let bytes = encode_hert_binary(&minimal_tag()).expect("encode");
        // Cut into the DID.
        assert!(matches!(
            decode_hert_binary(&bytes[..6]),
            Err(HertError::Truncated { needed: 8, .. })
        ));
        // Cut the flags byte off.
        assert!(decode_hert_binary(&bytes[..11]).is_err());
    }

    #[test]
    fn hostile_sense_path_count_rejected_without_allocating() {
        // EID 1, then an SP count of 2^35 - 1 in a 6-byte buffer. The count
        // must be rejected against the remaining input, not handed to the
        // allocator.
        let bytes = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(
            decode_hert_binary(&bytes),
            Err(HertError::Truncated { remaining: 0, .. })
        ));
    }

    #[test]
    fn sense_path_count_beyond_buffer_rejected() {
        // Plausible-looking but truncated: count 100 with 3 bytes left.
        let bytes = [0x01, 100, 0x05, 0x06, 0x07];
        assert!(matches!(
            decode_hert_binary(&bytes),
            Err(HertError::Truncated { needed: 100, remaining: 3 })
        ));
    }

    #[test]
    fn truncated_meta_degrades_to_none() {
        let tag = full_tag();
        let bytes = encode_hert_binary(&tag).expect("encode");
        // Meta block: count varint + 3 values at the tail. Chop inside it.
        let meta_len = 1
            + crate::varint::encode_varint_array(&[3, 12, 1_756_000_000])
                .expect("encode")
                .len();
        let chopped = &bytes[..bytes.len() - meta_len + 2];

        let decoded = decode_hert_binary(chopped).expect("decode");
        assert_eq!(decoded.meta, None);
        // Everything before the meta block survives.
        assert_eq!(decoded.eid, tag.eid);
        assert_eq!(decoded.lp, tag.lp);
        assert_eq!(decoded.flags, tag.flags);
    }

    #[test]
    fn meta_zero_values_normalize_to_none() {
        let mut tag = minimal_tag();
        tag.meta = Some(HertMeta {
            model_version: Some(5),
            extractor_id: None,
            timestamp: None,
        });
        let decoded = decode_hert_binary(&encode_hert_binary(&tag).expect("encode"))
            .expect("decode");
        assert_eq!(
            decoded.meta,
            Some(HertMeta {
                model_version: Some(5),
                extractor_id: None,
                timestamp: None,
            })
        );
    }

    #[test]
    fn oversized_meta_count_is_corruption() {
        let mut bytes = encode_hert_binary(&minimal_tag()).expect("encode");
        bytes.push(9); // meta count far outside 0..=3
        assert!(matches!(
            decode_hert_binary(&bytes),
            Err(HertError::InvalidMetaCount(9))
        ));
    }

    #[test]
    fn empty_sense_path_normalizes_to_absent() {
        let mut tag = minimal_tag();
        tag.sp = Some(vec![]);
        let decoded = decode_hert_binary(&encode_hert_binary(&tag).expect("encode"))
            .expect("decode");
        assert_eq!(decoded.sp, None);
    }

    #[test]
    fn readable_form_matches_expected_shape() {
        let tag = full_tag();
        let readable = encode_hert_readable(&tag);
        assert!(readable.starts_with("4102.S2.1.A77 @ d:"));
        assert!(readable.contains(" p:1.3.14 "));
        assert!(readable.ends_with("t:823+4"));

        let minimal = encode_hert_readable(&minimal_tag());
        assert!(minimal.starts_with("4102 @ d:"));
        assert!(minimal.contains(" p:14 "));
    }
}
