//! # Document Fingerprints
//!
//! Deterministic hashing primitives consumed by the tag factory:
//! - [`generate_did`] — the 64-bit document ID baked into every tag
//! - [`hash_content`] — content digest for change detection
//! - [`normalize_for_aliasing`] — surface-form canonicalization used by
//!   alias-resolution collaborators (not by the codec)
//!
//! All three are pure functions of their input. Same input, same output,
//! on every platform — tags encode the DID, so any drift here would orphan
//! every stored reference.

use crate::types::Did;
use unicode_normalization::UnicodeNormalization;

// =============================================================================
// DOCUMENT ID
// =============================================================================

/// Domain separator so DIDs can never collide with plain content digests.
const DID_CONTEXT: &str = "hert-did-v1";

/// Compute the 64-bit document ID from `(document_path, content_hash,
/// version)`.
///
/// The three inputs are length-framed into a BLAKE3 keyed-context hash and
/// the first 8 digest bytes are taken little-endian. Identical inputs always
/// yield the identical DID; any change to the content hash or version
/// changes it with overwhelming probability.
#[must_use]
pub fn generate_did(document_path: &str, content_hash: &str, version: u32) -> Did {
    let mut hasher = blake3::Hasher::new_derive_key(DID_CONTEXT);
    // Length framing keeps ("ab", "c") distinct from ("a", "bc").
    hasher.update(&(document_path.len() as u64).to_le_bytes());
    hasher.update(document_path.as_bytes());
    hasher.update(&(content_hash.len() as u64).to_le_bytes());
    hasher.update(content_hash.as_bytes());
    hasher.update(&version.to_le_bytes());

    let digest = hasher.finalize();
    let mut first8 = [0u8; 8];
    first8.copy_from_slice(&digest.as_bytes()[..8]);
    Did(u64::from_le_bytes(first8))
}

// =============================================================================
// CONTENT DIGEST
// =============================================================================

/// Deterministic content digest: BLAKE3 hex of the text.
#[must_use]
pub fn hash_content(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

// =============================================================================
// ALIAS NORMALIZATION
// =============================================================================

/// Canonicalize a surface form for alias matching.
///
/// NFKD-decomposes, drops combining marks (diacritics), lowercases, and
/// collapses whitespace runs to single spaces with the ends trimmed.
/// `"  Fëanor   the\tSmith "` and `"feanor the smith"` normalize equal.
#[must_use]
pub fn normalize_for_aliasing(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Combining-mark check over the Unicode combining blocks.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'   // Combining Diacritical Marks
        | '\u{1AB0}'..='\u{1AFF}' // Extended
        | '\u{1DC0}'..='\u{1DFF}' // Supplement
        | '\u{20D0}'..='\u{20FF}' // For Symbols
        | '\u{FE20}'..='\u{FE2F}' // Half Marks
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_is_deterministic() {
        let a = generate_did("/library/faith.docx", "abc123", 1);
        let b = generate_did("/library/faith.docx", "abc123", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn did_changes_with_any_input() {
        let base = generate_did("/library/faith.docx", "abc123", 1);
        assert_ne!(base, generate_did("/library/faith.docx", "abc124", 1));
        assert_ne!(base, generate_did("/library/faith.docx", "abc123", 2));
        assert_ne!(base, generate_did("/library/hope.docx", "abc123", 1));
    }

    #[test]
    fn did_framing_disambiguates_boundaries() {
        assert_ne!(generate_did("ab", "c", 1), generate_did("a", "bc", 1));
    }

    #[test]
    fn content_hash_deterministic_and_sensitive() {
        assert_eq!(hash_content("call me ishmael"), hash_content("call me ishmael"));
        assert_ne!(hash_content("call me ishmael"), hash_content("Call me Ishmael"));
        assert_eq!(hash_content("x").len(), 64); // hex of 32 bytes
    }

    #[test]
    fn normalize_folds_case_and_whitespace() {
        assert_eq!(
            normalize_for_aliasing("  The   GREAT\tGatsby "),
            "the great gatsby"
        );
    }

    #[test]
    fn normalize_strips_diacritics() {
        assert_eq!(normalize_for_aliasing("Fëanor"), "feanor");
        assert_eq!(normalize_for_aliasing("José Martí"), "jose marti");
        assert_eq!(
            normalize_for_aliasing("Brontë"),
            normalize_for_aliasing("bronte")
        );
    }

    #[test]
    fn normalize_empty_and_space_only() {
        assert_eq!(normalize_for_aliasing(""), "");
        assert_eq!(normalize_for_aliasing("   \t\n "), "");
    }
}
