//! # Reference Store
//!
//! Durable, append-only collection of encoded tag tokens with three derived
//! lookup indexes (by entity, by document, by both). The flat token list is
//! the source of truth; the indexes are views rebuilt by decoding every
//! stored token and are never persisted directly.
//!
//! ## Lifecycle
//!
//! Construction is explicit — [`HertStore::open`] binds a store to a file
//! path, [`HertStore::in_memory`] skips persistence entirely. There is no
//! process-wide singleton and no ambient autosave timer: the host calls
//! [`HertStore::flush`] on its own schedule and [`HertStore::close`] at
//! shutdown. `Drop` performs one best-effort flush as a backstop.
//!
//! ## Failure posture
//!
//! Hard failures propagate; soft ones degrade. A malformed token inside a
//! batch is logged and skipped — one bad entry never aborts the batch — and
//! a corrupt or unparsable store file loads as an empty store with a
//! warning. Persistence is a full-file overwrite, not an atomic replace;
//! concurrent writers to one path are last-writer-wins.

use crate::codec::decode_hert;
use crate::types::{Did, Eid, Hert, HertError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk format version.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// How many entities `stats` ranks.
pub const TOP_ENTITY_COUNT: usize = 10;

// =============================================================================
// SOFT-FAILURE LOGGING
// =============================================================================

/// Log a skipped/degraded operation to stderr in a structured shape.
///
/// The core avoids a tracing dependency to stay minimal; the app layer
/// redirects stderr into its own subscriber if needed.
fn warn_soft(context: &str, detail: &str) {
    eprintln!(
        "{{\"level\":\"warn\",\"target\":\"hert_core::store\",\"message\":\"{}: {}\"}}",
        context, detail
    );
}

// =============================================================================
// PERSISTED FILE SHAPE
// =============================================================================

/// The JSON document written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    all: Vec<String>,
    metadata: StoreFileMetadata,
}

/// Denormalized counts carried alongside the token list for external
/// readers; rebuilt on every flush, never read back as truth.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFileMetadata {
    total_refs: usize,
    total_entities: usize,
    total_documents: usize,
    last_updated: DateTime<Utc>,
}

// =============================================================================
// STATS
// =============================================================================

/// Aggregate view over the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Stored token count, including any entries that no longer decode.
    pub total_refs: usize,
    /// Distinct entities with at least one decodable reference.
    pub total_entities: usize,
    /// Distinct documents with at least one decodable reference.
    pub total_documents: usize,
    /// Top entities by reference count, descending; ties break by
    /// ascending entity ID.
    pub top_entities: Vec<(Eid, usize)>,
}

// =============================================================================
// STORE
// =============================================================================

/// Append-only reference store with derived indexes.
#[derive(Debug, Default)]
pub struct HertStore {
    /// Backing file; `None` for in-memory stores.
    path: Option<PathBuf>,
    /// Flat token list — the durable source of truth.
    all: Vec<String>,
    by_eid: BTreeMap<Eid, Vec<String>>,
    by_did: BTreeMap<Did, Vec<String>>,
    by_eid_and_did: BTreeMap<(Eid, Did), Vec<String>>,
    dirty: bool,
}

impl HertStore {
    /// Create an empty store with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading existing contents.
    ///
    /// An absent file is a fresh, empty store. A corrupt or
    /// wrong-version file is logged and treated the same way — the spec's
    /// deliberate simplicity tradeoff — so this constructor never fails.
    /// Individual tokens that fail to decode are kept in the flat list
    /// (they persist across save/load) but excluded from the indexes.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        // Spelled out field by field: HertStore implements Drop, which rules
        // out `..Self::default()` functional update (E0509).
        let mut store = Self {
            path: Some(path.clone()),
            all: Vec::new(),
            by_eid: BTreeMap::new(),
            by_did: BTreeMap::new(),
            by_eid_and_did: BTreeMap::new(),
            dirty: false,
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return store,
            Err(e) => {
                warn_soft("load", &format!("cannot read {}: {}", path.display(), e));
                return store;
            }
        };

        let file: StoreFile = match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                warn_soft(
                    "load",
                    &format!("unparsable store file {}, starting empty: {}", path.display(), e),
                );
                return store;
            }
        };
        if file.version != STORE_FORMAT_VERSION {
            warn_soft(
                "load",
                &format!(
                    "unsupported store version {} (expected {}), starting empty",
                    file.version, STORE_FORMAT_VERSION
                ),
            );
            return store;
        }

        for token in file.all {
            if let Err(e) = store.index_token(&token) {
                warn_soft("load", &format!("skipping undecodable entry: {}", e));
            }
            store.all.push(token);
        }
        store
    }

    /// Decode a token and thread it through all three indexes.
    fn index_token(&mut self, token: &str) -> Result<Hert, HertError> {
        let hert = decode_hert(token)?;
        self.by_eid
            .entry(hert.eid)
            .or_default()
            .push(token.to_string());
        self.by_did
            .entry(hert.did)
            .or_default()
            .push(token.to_string());
        self.by_eid_and_did
            .entry((hert.eid, hert.did))
            .or_default()
            .push(token.to_string());
        Ok(hert)
    }

    // =========================================================================
    // APPEND
    // =========================================================================

    /// Append one encoded token.
    ///
    /// Returns `true` when the token decoded and was indexed; a malformed
    /// token is logged, dropped, and returns `false`. No deduplication:
    /// adding the same token twice produces two entries everywhere it
    /// matches.
    pub fn add(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        match self.index_token(&token) {
            Ok(_) => {
                self.all.push(token);
                self.dirty = true;
                true
            }
            Err(e) => {
                warn_soft("add", &format!("rejecting malformed token: {}", e));
                false
            }
        }
    }

    /// Append a batch of tokens, returning how many were indexed.
    ///
    /// Malformed entries are skipped individually; the batch always makes
    /// partial progress rather than failing atomically.
    pub fn add_many<I, S>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut indexed = 0;
        for token in tokens {
            if self.add(token) {
                indexed += 1;
            }
        }
        indexed
    }

    /// Encode a tag and append it, returning the stored token.
    ///
    /// Unlike [`add`](Self::add), an encode failure here is a hard error —
    /// the caller handed us a broken value, not corrupt stored data.
    pub fn add_hert(&mut self, hert: &Hert) -> Result<String, HertError> {
        let token = crate::codec::encode_hert(hert)?;
        // A token we just encoded always re-decodes.
        self.add(token.clone());
        Ok(token)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Encoded references to an entity, in insertion order.
    #[must_use]
    pub fn get_by_entity(&self, eid: Eid) -> &[String] {
        self.by_eid.get(&eid).map_or(&[], Vec::as_slice)
    }

    /// Encoded references within a document, in insertion order.
    #[must_use]
    pub fn get_by_document(&self, did: Did) -> &[String] {
        self.by_did.get(&did).map_or(&[], Vec::as_slice)
    }

    /// Encoded references to an entity within one document.
    #[must_use]
    pub fn get_by_entity_and_document(&self, eid: Eid, did: Did) -> &[String] {
        self.by_eid_and_did
            .get(&(eid, did))
            .map_or(&[], Vec::as_slice)
    }

    /// Decoded references to an entity; undecodable entries are skipped
    /// with a warning.
    #[must_use]
    pub fn get_decoded_by_entity(&self, eid: Eid) -> Vec<Hert> {
        Self::decode_all(self.get_by_entity(eid))
    }

    /// Decoded references within a document.
    #[must_use]
    pub fn get_decoded_by_document(&self, did: Did) -> Vec<Hert> {
        Self::decode_all(self.get_by_document(did))
    }

    /// Decoded references to an entity within one document.
    #[must_use]
    pub fn get_decoded_by_entity_and_document(&self, eid: Eid, did: Did) -> Vec<Hert> {
        Self::decode_all(self.get_by_entity_and_document(eid, did))
    }

    fn decode_all(tokens: &[String]) -> Vec<Hert> {
        tokens
            .iter()
            .filter_map(|t| match decode_hert(t) {
                Ok(hert) => Some(hert),
                Err(e) => {
                    warn_soft("decode", &format!("skipping undecodable entry: {}", e));
                    None
                }
            })
            .collect()
    }

    /// Every stored token, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[String] {
        &self.all
    }

    /// Total stored token count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the store holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Whether there are unflushed changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // STATS
    // =========================================================================

    /// Aggregate counts plus the top-[`TOP_ENTITY_COUNT`] entities by
    /// reference count.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut ranked: Vec<(Eid, usize)> = self
            .by_eid
            .iter()
            .map(|(eid, refs)| (*eid, refs.len()))
            .collect();
        // BTreeMap iteration is ascending by Eid; the stable sort keeps that
        // order within equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(TOP_ENTITY_COUNT);

        StoreStats {
            total_refs: self.all.len(),
            total_entities: self.by_eid.len(),
            total_documents: self.by_did.len(),
            top_entities: ranked,
        }
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Write the store to its backing file if anything changed.
    ///
    /// No-op when clean or in-memory. The write is a whole-file overwrite;
    /// the acceptable data-loss window is bounded by how often the host
    /// calls this.
    pub fn flush(&mut self) -> Result<(), HertError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = StoreFile {
            version: STORE_FORMAT_VERSION,
            all: self.all.clone(),
            metadata: StoreFileMetadata {
                total_refs: self.all.len(),
                total_entities: self.by_eid.len(),
                total_documents: self.by_did.len(),
                last_updated: Utc::now(),
            },
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| HertError::SerializationError(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| HertError::IoError(format!("cannot write {}: {}", path.display(), e)))?;

        self.dirty = false;
        Ok(())
    }

    /// Flush and consume the store — the explicit shutdown path.
    pub fn close(mut self) -> Result<(), HertError> {
        self.flush()
    }

    /// Remove every token and index entry, marking the store dirty.
    pub fn clear(&mut self) {
        self.all.clear();
        self.by_eid.clear();
        self.by_did.clear();
        self.by_eid_and_did.clear();
        self.dirty = true;
    }
}

impl Drop for HertStore {
    /// Best-effort backstop flush. A hard kill still loses the window since
    /// the last explicit flush; hosts that care call `close`.
    fn drop(&mut self) {
        if self.dirty && self.path.is_some() {
            if let Err(e) = self.flush() {
                warn_soft("drop", &format!("final flush failed: {}", e));
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
