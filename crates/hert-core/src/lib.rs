//! # hert-core
//!
//! The deterministic HERT engine - THE LOGIC.
//!
//! A HERT (Hierarchical Entity Reference Tag) is a compact, versioned
//! binary/text encoding that identifies one specific mention of a canonical
//! entity at a precise location inside a fingerprinted document. This crate
//! implements the tag itself and everything around it:
//!
//! - the varint and base62 codecs the wire format is built from
//! - the binary layout and the `HERTv1:` text token
//! - document fingerprints (the 64-bit DID)
//! - the tag factory fed by extraction pipelines
//! - the indexed, JSON-persisted reference store
//!
//! ## Architectural Constraints
//!
//! - Pure Rust, fully synchronous: no async, no network dependencies
//! - Deterministic: BTreeMap indexes, stable tie-breaking, pure hashes
//! - Wire-stable: the v1 binary layout and token prefix are frozen;
//!   existing stored tokens must keep decoding byte-for-byte

// =============================================================================
// MODULES
// =============================================================================

pub mod base62;
pub mod codec;
pub mod confidence;
pub mod factory;
pub mod fingerprint;
pub mod store;
pub mod types;
pub mod varint;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Aid, CipherStrategy, Did, Eid, Encryption, Hert, HertError, HertFlags, HertMeta,
    LocationPath, SensePath,
};

// =============================================================================
// RE-EXPORTS: Codecs
// =============================================================================

pub use base62::{decode_base62, encode_base62};
pub use codec::{
    TOKEN_PREFIX, TOKEN_PREFIX_ENCRYPTED, decode_hert, decode_hert_binary, encode_hert,
    encode_hert_binary, encode_hert_readable,
};
pub use varint::{decode_varint, decode_varint_array, encode_varint, encode_varint_array};

// =============================================================================
// RE-EXPORTS: Factory & Fingerprints
// =============================================================================

pub use confidence::bin_confidence;
pub use factory::{MentionInput, create_and_encode, create_hert};
pub use fingerprint::{generate_did, hash_content, normalize_for_aliasing};

// =============================================================================
// RE-EXPORTS: Reference Store
// =============================================================================

pub use store::{HertStore, StoreStats};
