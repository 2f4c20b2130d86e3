//! # Property-Based Tests
//!
//! Round-trip and determinism invariants over the full input space:
//! any flag-consistent tag must survive the binary and text codecs
//! bit-for-bit, and the leaf codecs must agree with their documented
//! numeric contracts.

use hert_core::varint::{MAX_VARINT_VALUE, decode_varint, encode_varint};
use hert_core::{
    Aid, Did, Eid, Encryption, Hert, HertFlags, HertMeta, HertStore, LocationPath, MentionInput,
    create_and_encode, create_hert, decode_base62, decode_hert, decode_hert_binary, encode_base62,
    encode_hert, encode_hert_binary, normalize_for_aliasing,
};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Optional metadata with non-zero values (zero means "unset" on the wire).
fn meta_strategy() -> impl Strategy<Value = Option<HertMeta>> {
    option::of((
        option::of(1u64..MAX_VARINT_VALUE),
        option::of(1u64..MAX_VARINT_VALUE),
        option::of(1u64..MAX_VARINT_VALUE),
    ))
    .prop_map(|fields| {
        fields.and_then(|(model_version, extractor_id, timestamp)| {
            let meta = HertMeta {
                model_version,
                extractor_id,
                timestamp,
            };
            (!meta.is_empty()).then_some(meta)
        })
    })
}

/// A flag-consistent tag. EID stays non-zero so the text layer applies too.
fn hert_strategy() -> impl Strategy<Value = Hert> {
    (
        (
            1u64..MAX_VARINT_VALUE,                  // eid
            option::of(0u64..MAX_VARINT_VALUE),      // aid
            option::of(vec(0u64..100_000, 1..6)),    // sp (non-empty when present)
            any::<u64>(),                            // did
        ),
        (
            option::of(0u64..10_000), // section
            option::of(0u64..10_000), // chapter
            0u64..1_000_000,          // paragraph
            0u64..MAX_VARINT_VALUE,   // token_start
            0u64..10_000,             // token_length
        ),
        (
            any::<bool>(),               // chain_next
            option::of(0u8..=31),        // key rotation (Some = encrypted)
            0u8..=7,                     // confidence_bin
        ),
        meta_strategy(),
    )
        .prop_map(|((eid, aid, sp, did), (section, chapter, paragraph, token_start, token_length), (chain_next, rotation, confidence_bin), meta)| {
            Hert {
                eid: Eid(eid),
                aid: aid.map(Aid),
                sp,
                did: Did(did),
                lp: LocationPath {
                    section,
                    chapter,
                    paragraph,
                    token_start,
                    token_length,
                },
                flags: HertFlags {
                    has_section: section.is_some(),
                    has_chapter: chapter.is_some(),
                    alias_present: aid.is_some(),
                    chain_next,
                    encryption: match rotation {
                        Some(key_rotation) => Encryption::Encrypted { key_rotation },
                        None => Encryption::Plaintext,
                    },
                    confidence_bin,
                },
                meta,
            }
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every representable value survives the varint round trip.
    #[test]
    fn varint_roundtrip(v in 0u64..=MAX_VARINT_VALUE) {
        let bytes = encode_varint(v).expect("encode");
        prop_assert!(bytes.len() <= 5);
        let (decoded, read) = decode_varint(&bytes, 0).expect("decode");
        prop_assert_eq!(decoded, v);
        prop_assert_eq!(read, bytes.len());
    }

    /// Base62 round trip preserves the numeric value; leading zero bytes
    /// are documented casualties of the number-base conversion.
    #[test]
    fn base62_roundtrip_is_numeric(bytes in vec(any::<u8>(), 0..40)) {
        let decoded = decode_base62(&encode_base62(&bytes)).expect("decode");

        let canonical: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
        let expected = if canonical.is_empty() { vec![0] } else { canonical };
        prop_assert_eq!(decoded, expected);
    }

    /// Flag-consistent tags survive the binary codec field-for-field.
    #[test]
    fn hert_binary_roundtrip(tag in hert_strategy()) {
        let bytes = encode_hert_binary(&tag).expect("encode");
        prop_assert_eq!(decode_hert_binary(&bytes).expect("decode"), tag);
    }

    /// And through the text layer too.
    #[test]
    fn hert_text_roundtrip(tag in hert_strategy()) {
        let token = encode_hert(&tag).expect("encode");
        prop_assert!(token.starts_with("HERTv1:"));
        prop_assert_eq!(decode_hert(&token).expect("decode"), tag);
    }

    /// Encoding is deterministic: one tag, one byte sequence, one token.
    #[test]
    fn encoding_deterministic(tag in hert_strategy()) {
        prop_assert_eq!(
            encode_hert_binary(&tag).expect("encode"),
            encode_hert_binary(&tag).expect("encode")
        );
        prop_assert_eq!(
            encode_hert(&tag).expect("encode"),
            encode_hert(&tag).expect("encode")
        );
    }

    /// The factory is idempotent over its document identity inputs.
    #[test]
    fn factory_did_deterministic(
        path in "[a-z/]{1,30}",
        hash in "[0-9a-f]{8,40}",
        version in 1u32..100
    ) {
        let a = create_hert(
            &MentionInput::new(Eid(7), path.clone(), hash.clone(), 1, 2, 3)
                .with_version(version),
        ).expect("create");
        let b = create_hert(
            &MentionInput::new(Eid(7), path, hash, 1, 2, 3).with_version(version),
        ).expect("create");
        prop_assert_eq!(a.did, b.did);
    }

    /// Alias normalization is idempotent.
    #[test]
    fn normalize_idempotent(s in "\\PC{0,40}") {
        let once = normalize_for_aliasing(&s);
        prop_assert_eq!(normalize_for_aliasing(&once), once.clone());
    }

    /// The store indexes exactly the well-formed tokens it is given.
    #[test]
    fn store_indexes_every_token(eids in vec(1u64..500, 1..30)) {
        let mut store = HertStore::in_memory();
        let tokens: Vec<String> = eids
            .iter()
            .map(|&eid| {
                create_and_encode(&MentionInput::new(Eid(eid), "/doc", "h", 1, 0, 1))
                    .expect("encode")
            })
            .collect();

        let indexed = store.add_many(tokens);
        prop_assert_eq!(indexed, eids.len());
        prop_assert_eq!(store.len(), eids.len());

        for &eid in &eids {
            let expected = eids.iter().filter(|&&e| e == eid).count();
            prop_assert_eq!(store.get_by_entity(Eid(eid)).len(), expected);
        }
    }
}
