//! # Core Type Definitions
//!
//! This module contains all core types for the HERT subsystem:
//! - Identifier newtypes (`Eid`, `Aid`, `Did`)
//! - Location and sense paths (`LocationPath`, `SensePath`)
//! - The packed flags byte (`HertFlags`, `Encryption`)
//! - The tag itself (`Hert`) and its optional metadata (`HertMeta`)
//! - Error types (`HertError`)
//! - The `CipherStrategy` extension-point trait
//!
//! ## Immutability
//!
//! A `Hert` is a value object. It is constructed once (usually by
//! [`crate::factory::create_hert`]), then either discarded or encoded and
//! appended to the store. Nothing in this crate mutates a tag after
//! construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Entity ID — stable numeric identity of a canonical entity across
/// documents. Assigned by an external registry; this crate only consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Eid(pub u64);

/// Alias ID — identifies a specific surface-form-to-entity mapping.
/// Present on a tag only when `flags.alias_present` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Aid(pub u64);

/// Document ID — 64-bit fingerprint of `(document_path, content_hash,
/// version)`. Opaque to this crate beyond equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Did(pub u64);

/// Sense path — ordered sequence of small integers disambiguating which
/// sense of the entity a mention refers to.
pub type SensePath = Vec<u64>;

// =============================================================================
// LOCATION PATH
// =============================================================================

/// Hierarchical offset of a mention within a document.
///
/// `section` and `chapter` presence must exactly match the corresponding
/// flag bits — that consistency is enforced at encode time and assumed
/// (not re-validated) at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPath {
    /// Optional section index within the document.
    pub section: Option<u64>,
    /// Optional chapter index within the section (or document).
    pub chapter: Option<u64>,
    /// Paragraph index.
    pub paragraph: u64,
    /// First token of the mention span.
    pub token_start: u64,
    /// Number of tokens in the mention span.
    pub token_length: u64,
}

impl LocationPath {
    /// Create a location path with no section/chapter components.
    #[must_use]
    pub const fn new(paragraph: u64, token_start: u64, token_length: u64) -> Self {
        Self {
            section: None,
            chapter: None,
            paragraph,
            token_start,
            token_length,
        }
    }
}

// =============================================================================
// ENCRYPTION (reserved extension point)
// =============================================================================

/// Maximum key-rotation counter value (5 bits in the original schema).
pub const MAX_KEY_ROTATION: u8 = 31;

/// Encryption state of a tag's payload.
///
/// The `encrypted` wire flag is a **reserved extension point**: no cipher is
/// wired up in this crate. `Encrypted` carries the key-rotation byte that the
/// wire format serializes after the AID; actual sealing/opening is delegated
/// to an injected [`CipherStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Encryption {
    /// Payload is stored in the clear. This is the only variant the current
    /// encoder produces.
    #[default]
    Plaintext,
    /// Payload is (to be) sealed under the key identified by `key_rotation`
    /// (0..=31).
    Encrypted {
        /// Key-rotation counter, serialized as a separate byte on the wire.
        key_rotation: u8,
    },
}

impl Encryption {
    /// Whether the `encrypted` flag bit is set for this state.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted { .. })
    }

    /// The key-rotation counter, if encrypted.
    #[must_use]
    pub const fn key_rotation(&self) -> Option<u8> {
        match self {
            Self::Plaintext => None,
            Self::Encrypted { key_rotation } => Some(*key_rotation),
        }
    }
}

/// Extension point for payload encryption.
///
/// This trait is intentionally defined without in-crate implementations.
/// A host application that wants real encryption behind the reserved
/// `encrypted` flag injects an implementation; this crate never invents a
/// cipher. Implementors should be stateless and pure.
pub trait CipherStrategy: Send + Sync {
    /// Seal a binary payload under the key identified by `key_rotation`.
    fn seal(&self, key_rotation: u8, payload: &[u8]) -> Result<Vec<u8>, HertError>;

    /// Open a sealed payload.
    fn open(&self, key_rotation: u8, sealed: &[u8]) -> Result<Vec<u8>, HertError>;
}

// =============================================================================
// FLAGS
// =============================================================================

/// Highest valid confidence bin (3 bits).
pub const MAX_CONFIDENCE_BIN: u8 = 7;

/// The unpacked form of the single flags byte.
///
/// Wire layout of the byte (bit 7 = most significant):
///
/// ```text
/// bit 7: has_section      bit 4: chain_next
/// bit 6: has_chapter      bit 3: encrypted
/// bit 5: alias_present    bits 2-0: confidence_bin
/// ```
///
/// The key-rotation counter is logically part of the flags but travels as a
/// separate byte, emitted only when `encrypted` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HertFlags {
    /// Location path carries a section component.
    pub has_section: bool,
    /// Location path carries a chapter component.
    pub has_chapter: bool,
    /// Tag carries an alias ID.
    pub alias_present: bool,
    /// Tag participates in a mention chain (reserved; never cleared or set
    /// by the factory).
    pub chain_next: bool,
    /// Encryption state (reserved extension point).
    pub encryption: Encryption,
    /// Quantized confidence in `0..=7`.
    pub confidence_bin: u8,
}

impl HertFlags {
    /// Pack into the single wire byte. The key-rotation counter is NOT part
    /// of this byte; the codec emits it separately.
    #[must_use]
    pub fn pack(&self) -> u8 {
        let mut byte = self.confidence_bin & 0b0000_0111;
        if self.has_section {
            byte |= 1 << 7;
        }
        if self.has_chapter {
            byte |= 1 << 6;
        }
        if self.alias_present {
            byte |= 1 << 5;
        }
        if self.chain_next {
            byte |= 1 << 4;
        }
        if self.encryption.is_encrypted() {
            byte |= 1 << 3;
        }
        byte
    }

    /// Unpack a wire byte.
    ///
    /// When the encrypted bit is set the key-rotation counter is not yet
    /// known (it follows the AID on the wire), so `encryption` is returned
    /// as `Encrypted { key_rotation: 0 }` and the codec fills in the real
    /// counter once it has been read.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        let encryption = if byte & (1 << 3) != 0 {
            Encryption::Encrypted { key_rotation: 0 }
        } else {
            Encryption::Plaintext
        };
        Self {
            has_section: byte & (1 << 7) != 0,
            has_chapter: byte & (1 << 6) != 0,
            alias_present: byte & (1 << 5) != 0,
            chain_next: byte & (1 << 4) != 0,
            encryption,
            confidence_bin: byte & 0b0000_0111,
        }
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Optional trailing metadata describing how a tag was produced.
///
/// Emitted on the wire only when at least one field is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HertMeta {
    /// Version of the extraction model.
    pub model_version: Option<u64>,
    /// Identifier of the extractor that produced the mention.
    pub extractor_id: Option<u64>,
    /// Unix timestamp (seconds) of extraction.
    pub timestamp: Option<u64>,
}

impl HertMeta {
    /// True when no field is set; empty metadata is never serialized.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.model_version.is_none() && self.extractor_id.is_none() && self.timestamp.is_none()
    }
}

// =============================================================================
// HERT
// =============================================================================

/// A Hierarchical Entity Reference Tag: one specific mention of a canonical
/// entity at a precise location inside a fingerprinted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hert {
    /// The canonical entity being mentioned.
    pub eid: Eid,
    /// Surface-form mapping, present iff `flags.alias_present`.
    pub aid: Option<Aid>,
    /// Sense disambiguation path, if any.
    pub sp: Option<SensePath>,
    /// Fingerprint of the containing document version.
    pub did: Did,
    /// Location of the mention within the document.
    pub lp: LocationPath,
    /// Packed flag state.
    pub flags: HertFlags,
    /// Optional extraction metadata.
    pub meta: Option<HertMeta>,
}

impl Hert {
    /// Check the flag/field consistency invariant.
    ///
    /// The binary codec calls this before encoding; decoded tags satisfy it
    /// by construction.
    pub fn validate(&self) -> Result<(), HertError> {
        if self.flags.has_section != self.lp.section.is_some() {
            return Err(HertError::FlagMismatch("has_section"));
        }
        if self.flags.has_chapter != self.lp.chapter.is_some() {
            return Err(HertError::FlagMismatch("has_chapter"));
        }
        if self.flags.alias_present != self.aid.is_some() {
            return Err(HertError::FlagMismatch("alias_present"));
        }
        if self.flags.confidence_bin > MAX_CONFIDENCE_BIN {
            return Err(HertError::InvalidConfidenceBin(self.flags.confidence_bin));
        }
        if let Some(rotation) = self.flags.encryption.key_rotation() {
            if rotation > MAX_KEY_ROTATION {
                return Err(HertError::InvalidKeyRotation(rotation));
            }
        }
        Ok(())
    }

    /// The sense path, empty slice when absent.
    #[must_use]
    pub fn sense_path(&self) -> &[u64] {
        self.sp.as_deref().unwrap_or(&[])
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the HERT subsystem.
///
/// Hard failures (malformed input, programmer error) propagate as `Err`;
/// soft failures (corrupt optional data in the store) are logged and
/// degraded to skip/empty by the store, never surfaced from a batch.
#[derive(Debug, Error)]
pub enum HertError {
    /// Varint input ended before its final (continuation-clear) byte.
    #[error("incomplete varint at offset {0}")]
    IncompleteVarint(usize),

    /// Varint decoding consumed more than the maximum byte width.
    #[error("varint too long at offset {0}")]
    VarintTooLong(usize),

    /// Value exceeds the maximum a wire varint may carry.
    #[error("varint overflow: {0} exceeds the 5-byte encodable maximum")]
    VarintOverflow(u64),

    /// Character outside the 62-symbol alphabet.
    #[error("invalid base62 character {0:?}")]
    InvalidBase62Char(char),

    /// Empty base62 payload.
    #[error("empty base62 input")]
    EmptyBase62,

    /// Token does not match the `HERTv1[e]:<payload>` pattern.
    #[error("malformed HERT token: {0}")]
    MalformedToken(String),

    /// A flag bit disagrees with the presence of its field.
    #[error("flag/field mismatch: {0}")]
    FlagMismatch(&'static str),

    /// Confidence bin outside `0..=7`.
    #[error("confidence bin {0} out of range (max {MAX_CONFIDENCE_BIN})")]
    InvalidConfidenceBin(u8),

    /// Key-rotation counter outside `0..=31`.
    #[error("key rotation {0} out of range (max {MAX_KEY_ROTATION})")]
    InvalidKeyRotation(u8),

    /// Binary payload begins with a zero byte, which base62 cannot
    /// represent (only an EID of 0 produces this).
    #[error("payload begins with a zero byte and cannot round-trip through base62")]
    AmbiguousPayload,

    /// Buffer ended before a fixed-width field.
    #[error("truncated buffer: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the decoder needed.
        needed: usize,
        /// Bytes that were actually left.
        remaining: usize,
    },

    /// Metadata block count outside the defined `0..=3` range.
    #[error("invalid metadata count {0} (expected 0..=3)")]
    InvalidMetaCount(u64),

    /// An I/O error occurred while persisting or loading the store.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A serialization or deserialization error occurred (store file,
    /// config).
    #[error("serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// TESTS
// =============================================================================
