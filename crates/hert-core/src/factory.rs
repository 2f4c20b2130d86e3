//! # Tag Factory
//!
//! Builds structurally valid tags from the high-level inputs an extraction
//! pipeline has on hand: entity identity, the document's path and content
//! hash, a location, and a confidence score. The factory is the only place
//! flags are derived, so a factory-built tag always satisfies the
//! flag/field consistency invariant.

use crate::codec::encode_hert;
use crate::confidence::bin_confidence;
use crate::fingerprint::generate_did;
use crate::types::{Aid, Eid, Encryption, Hert, HertError, HertFlags, HertMeta, LocationPath, SensePath};

/// Default document version when the pipeline does not track one.
pub const DEFAULT_DOCUMENT_VERSION: u32 = 1;

// =============================================================================
// INPUT
// =============================================================================

/// High-level description of one entity mention.
///
/// Construct with [`MentionInput::new`] and refine with the `with_*`
/// builders; only the required fields have positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionInput {
    /// Canonical entity being mentioned.
    pub eid: Eid,
    /// Surface-form mapping, if the mention matched through an alias.
    pub aid: Option<Aid>,
    /// Sense disambiguation path, if any.
    pub sp: Option<SensePath>,
    /// Path of the containing document.
    pub document_path: String,
    /// Digest of the document content (see [`crate::fingerprint::hash_content`]).
    pub content_hash: String,
    /// Document version; defaults to [`DEFAULT_DOCUMENT_VERSION`].
    pub version: u32,
    /// Optional section index.
    pub section: Option<u64>,
    /// Optional chapter index.
    pub chapter: Option<u64>,
    /// Paragraph index.
    pub paragraph: u64,
    /// First token of the mention span.
    pub token_start: u64,
    /// Token count of the mention span.
    pub token_length: u64,
    /// Extraction confidence in `[0.0, 1.0]`; defaults to 1.0.
    pub confidence: f64,
    /// Optional extraction metadata.
    pub meta: Option<HertMeta>,
}

impl MentionInput {
    /// Create an input with the required fields; everything else defaults.
    #[must_use]
    pub fn new(
        eid: Eid,
        document_path: impl Into<String>,
        content_hash: impl Into<String>,
        paragraph: u64,
        token_start: u64,
        token_length: u64,
    ) -> Self {
        Self {
            eid,
            aid: None,
            sp: None,
            document_path: document_path.into(),
            content_hash: content_hash.into(),
            version: DEFAULT_DOCUMENT_VERSION,
            section: None,
            chapter: None,
            paragraph,
            token_start,
            token_length,
            confidence: 1.0,
            meta: None,
        }
    }

    /// Attach an alias ID.
    #[must_use]
    pub fn with_aid(mut self, aid: Aid) -> Self {
        self.aid = Some(aid);
        self
    }

    /// Attach a sense path.
    #[must_use]
    pub fn with_sp(mut self, sp: SensePath) -> Self {
        self.sp = Some(sp);
        self
    }

    /// Set the document version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the section index.
    #[must_use]
    pub fn with_section(mut self, section: u64) -> Self {
        self.section = Some(section);
        self
    }

    /// Set the chapter index.
    #[must_use]
    pub fn with_chapter(mut self, chapter: u64) -> Self {
        self.chapter = Some(chapter);
        self
    }

    /// Set the extraction confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Attach extraction metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: HertMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Build a flag-consistent, unencoded tag from a mention description.
///
/// Computes the DID from `(document_path, content_hash, version)` — identical
/// inputs always yield the identical DID — bins the confidence, and derives
/// the presence flags from the optional fields. New tags are always
/// [`Encryption::Plaintext`] with `chain_next` unset; those bits are
/// reserved for future writers.
pub fn create_hert(input: &MentionInput) -> Result<Hert, HertError> {
    let did = generate_did(&input.document_path, &input.content_hash, input.version);

    let flags = HertFlags {
        has_section: input.section.is_some(),
        has_chapter: input.chapter.is_some(),
        alias_present: input.aid.is_some(),
        chain_next: false,
        encryption: Encryption::Plaintext,
        confidence_bin: bin_confidence(input.confidence),
    };

    let hert = Hert {
        eid: input.eid,
        aid: input.aid,
        sp: input.sp.clone(),
        did,
        lp: LocationPath {
            section: input.section,
            chapter: input.chapter,
            paragraph: input.paragraph,
            token_start: input.token_start,
            token_length: input.token_length,
        },
        flags,
        meta: input.meta.filter(|m| !m.is_empty()),
    };
    // Factory-derived flags are consistent by construction; validate anyway
    // so a future field can't drift silently.
    hert.validate()?;
    Ok(hert)
}

/// Convenience: build a tag and encode it to its text token in one step.
pub fn create_and_encode(input: &MentionInput) -> Result<String, HertError> {
    encode_hert(&create_hert(input)?)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_hert;

    fn faith_mention() -> MentionInput {
        MentionInput::new(Eid(4102), "/library/faith.docx", "abc123", 14, 823, 4)
            .with_sp(vec![2, 1])
            .with_confidence(0.95)
    }

    #[test]
    fn worked_example_roundtrip() {
        let token = create_and_encode(&faith_mention()).expect("encode");
        assert!(token.starts_with("HERTv1:"));

        let decoded = decode_hert(&token).expect("decode");
        assert_eq!(decoded.eid, Eid(4102));
        assert_eq!(decoded.sp.as_deref(), Some(&[2, 1][..]));
        assert_eq!(decoded.lp.paragraph, 14);
        assert_eq!(decoded.lp.token_start, 823);
        assert_eq!(decoded.lp.token_length, 4);
        assert_eq!(decoded.flags.confidence_bin, 6);
    }

    #[test]
    fn did_is_idempotent() {
        let a = create_hert(&faith_mention()).expect("create");
        let b = create_hert(&faith_mention()).expect("create");
        assert_eq!(a.did, b.did);
        assert_eq!(a, b);
    }

    #[test]
    fn did_tracks_content_hash() {
        let base = create_hert(&faith_mention()).expect("create");
        let mut changed = faith_mention();
        changed.content_hash = "abc124".to_string();
        assert_ne!(base.did, create_hert(&changed).expect("create").did);

        let bumped = faith_mention().with_version(2);
        assert_ne!(base.did, create_hert(&bumped).expect("create").did);
    }

    #[test]
    fn presence_flags_track_inputs() {
        let plain = create_hert(&faith_mention()).expect("create");
        assert!(!plain.flags.has_section);
        assert!(!plain.flags.has_chapter);
        assert!(!plain.flags.alias_present);

        let rich = create_hert(
            &faith_mention()
                .with_section(2)
                .with_chapter(7)
                .with_aid(Aid(5)),
        )
        .expect("create");
        assert!(rich.flags.has_section);
        assert!(rich.flags.has_chapter);
        assert!(rich.flags.alias_present);
        assert_eq!(rich.lp.section, Some(2));
        assert_eq!(rich.lp.chapter, Some(7));
        assert_eq!(rich.aid, Some(Aid(5)));
    }

    #[test]
    fn defaults_applied() {
        let input = MentionInput::new(Eid(1), "/a", "h", 0, 0, 1);
        assert_eq!(input.version, DEFAULT_DOCUMENT_VERSION);
        let tag = create_hert(&input).expect("create");
        assert_eq!(tag.flags.confidence_bin, 7); // confidence defaults to 1.0
        assert_eq!(tag.flags.encryption, Encryption::Plaintext);
        assert!(!tag.flags.chain_next);
    }

    #[test]
    fn empty_meta_dropped() {
        let tag = create_hert(&faith_mention().with_meta(HertMeta::default())).expect("create");
        assert_eq!(tag.meta, None);
    }
}
