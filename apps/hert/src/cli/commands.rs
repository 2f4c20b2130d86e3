//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::MentionArgs;
use hert_core::{
    Aid, Did, Eid, Hert, HertError, HertMeta, HertStore, MentionInput,
    codec::encode_hert_readable,
    confidence::approximate_confidence,
    create_hert, decode_hert, encode_hert,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (64 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_IMPORT_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HertError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HertError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HertError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// points at a regular file, so a path like "../../../etc/shadow" cannot
/// slip through unnoticed.
fn validate_file_path(path: &Path) -> Result<PathBuf, HertError> {
    let canonical = path.canonicalize().map_err(|e| {
        HertError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HertError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// MENTION ASSEMBLY
// =============================================================================

/// Turn parsed CLI arguments into a factory input.
fn mention_input(args: &MentionArgs) -> MentionInput {
    let mut input = MentionInput::new(
        Eid(args.eid),
        args.document_path.clone(),
        args.content_hash.clone(),
        args.paragraph,
        args.token_start,
        args.token_length,
    )
    .with_version(args.doc_version)
    .with_confidence(args.confidence);

    if let Some(aid) = args.aid {
        input = input.with_aid(Aid(aid));
    }
    if let Some(sp) = &args.sp {
        input = input.with_sp(sp.clone());
    }
    if let Some(section) = args.section {
        input = input.with_section(section);
    }
    if let Some(chapter) = args.chapter {
        input = input.with_chapter(chapter);
    }

    let meta = HertMeta {
        model_version: args.model_version,
        extractor_id: args.extractor_id,
        timestamp: args.timestamp,
    };
    if !meta.is_empty() {
        input = input.with_meta(meta);
    }

    input
}

/// Render a decoded tag as pretty JSON.
fn hert_json(hert: &Hert, token: Option<&str>) -> String {
    let mut output = serde_json::json!({
        "eid": hert.eid.0,
        "aid": hert.aid.map(|a| a.0),
        "sp": &hert.sp,
        "did": hert.did.0,
        "location": {
            "section": hert.lp.section,
            "chapter": hert.lp.chapter,
            "paragraph": hert.lp.paragraph,
            "token_start": hert.lp.token_start,
            "token_length": hert.lp.token_length,
        },
        "chain_next": hert.flags.chain_next,
        "encrypted": hert.flags.encryption.is_encrypted(),
        "confidence_bin": hert.flags.confidence_bin,
        "confidence_approx": approximate_confidence(hert.flags.confidence_bin),
        "meta": hert.meta,
    });
    if let (Some(token), Some(map)) = (token, output.as_object_mut()) {
        map.insert("token".to_string(), serde_json::json!(token));
    }
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

// =============================================================================
// ENCODE COMMAND
// =============================================================================

/// Encode a mention into a token, without touching the store.
pub fn cmd_encode(args: &MentionArgs, readable: bool, json_mode: bool) -> Result<(), HertError> {
    let hert = create_hert(&mention_input(args))?;
    let token = encode_hert(&hert)?;

    if json_mode {
        println!("{}", hert_json(&hert, Some(&token)));
        return Ok(());
    }

    println!("{}", token);
    if readable {
        println!("{}", encode_hert_readable(&hert));
    }
    Ok(())
}

// =============================================================================
// DECODE COMMAND
// =============================================================================

/// Decode a token and show its fields.
pub fn cmd_decode(token: &str, readable: bool, json_mode: bool) -> Result<(), HertError> {
    let hert = decode_hert(token)?;

    if json_mode {
        println!("{}", hert_json(&hert, Some(token)));
        return Ok(());
    }

    if readable {
        println!("{}", encode_hert_readable(&hert));
        return Ok(());
    }

    println!("Entity:     {}", hert.eid.0);
    if let Some(aid) = hert.aid {
        println!("Alias:      {}", aid.0);
    }
    if !hert.sense_path().is_empty() {
        let levels: Vec<String> = hert.sense_path().iter().map(u64::to_string).collect();
        println!("Sense:      {}", levels.join("."));
    }
    println!("Document:   {:#018x}", hert.did.0);
    if let Some(section) = hert.lp.section {
        println!("Section:    {}", section);
    }
    if let Some(chapter) = hert.lp.chapter {
        println!("Chapter:    {}", chapter);
    }
    println!("Paragraph:  {}", hert.lp.paragraph);
    println!(
        "Span:       tokens {}..{}",
        hert.lp.token_start,
        hert.lp.token_start + hert.lp.token_length
    );
    println!(
        "Confidence: bin {} (~{:.2})",
        hert.flags.confidence_bin,
        approximate_confidence(hert.flags.confidence_bin)
    );
    if hert.flags.chain_next {
        println!("Chain:      continues in next tag");
    }
    if let Some(rotation) = hert.flags.encryption.key_rotation() {
        println!("Encrypted:  key rotation {}", rotation);
    }
    if let Some(meta) = &hert.meta {
        println!(
            "Meta:       model={:?} extractor={:?} timestamp={:?}",
            meta.model_version, meta.extractor_id, meta.timestamp
        );
    }
    Ok(())
}

// =============================================================================
// ADD COMMAND
// =============================================================================

/// Encode a mention and append it to the store.
pub fn cmd_add(store_path: &Path, args: &MentionArgs, json_mode: bool) -> Result<(), HertError> {
    let hert = create_hert(&mention_input(args))?;

    let mut store = HertStore::open(store_path);
    let token = store.add_hert(&hert)?;
    let total = store.len();
    store.close()?;

    if json_mode {
        let output = serde_json::json!({
            "token": token,
            "total_refs": total,
            "store": store_path.to_string_lossy(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{}", token);
    println!("Stored ({} refs total)", total);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Bulk-append tokens from a file.
pub fn cmd_import(
    store_path: &Path,
    input: &Path,
    format: &str,
    json_mode: bool,
) -> Result<(), HertError> {
    tracing::info!("Importing from {:?} (format: {})", input, format);

    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let contents = std::fs::read_to_string(&validated_path)
        .map_err(|e| HertError::IoError(format!("Read file: {}", e)))?;

    let tokens: Vec<String> = match format {
        "json" => serde_json::from_str(&contents)
            .map_err(|e| HertError::SerializationError(format!("Parse token array: {}", e)))?,
        "text" => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        other => {
            return Err(HertError::SerializationError(format!(
                "Unknown import format '{}' (expected text or json)",
                other
            )));
        }
    };

    let total_input = tokens.len();
    let mut store = HertStore::open(store_path);
    let added = store.add_many(tokens);
    let total = store.len();
    store.close()?;

    let skipped = total_input - added;

    if json_mode {
        let output = serde_json::json!({
            "added": added,
            "skipped": skipped,
            "total_refs": total,
            "store": store_path.to_string_lossy(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Imported {} tokens ({} skipped)", added, skipped);
    println!("Store now holds {} refs", total);
    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Look up stored references by entity and/or document.
pub fn cmd_query(
    store_path: &Path,
    entity: Option<u64>,
    document: Option<u64>,
    decode: bool,
    json_mode: bool,
) -> Result<(), HertError> {
    let store = HertStore::open(store_path);

    let tokens: Vec<String> = match (entity, document) {
        (Some(eid), Some(did)) => store
            .get_by_entity_and_document(Eid(eid), Did(did))
            .to_vec(),
        (Some(eid), None) => store.get_by_entity(Eid(eid)).to_vec(),
        (None, Some(did)) => store.get_by_document(Did(did)).to_vec(),
        (None, None) => {
            return Err(HertError::IoError(
                "Query needs --entity and/or --document".to_string(),
            ));
        }
    };

    if json_mode {
        let output = if decode {
            let decoded: Vec<serde_json::Value> = tokens
                .iter()
                .filter_map(|t| decode_hert(t).ok())
                .map(|h| serde_json::to_value(&h).unwrap_or_default())
                .collect();
            serde_json::json!({ "count": tokens.len(), "refs": decoded })
        } else {
            serde_json::json!({ "count": tokens.len(), "refs": tokens })
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if tokens.is_empty() {
        println!("No matching references");
        return Ok(());
    }

    for token in &tokens {
        if decode {
            match decode_hert(token) {
                Ok(hert) => println!("{}", encode_hert_readable(&hert)),
                Err(e) => println!("{}  (undecodable: {})", token, e),
            }
        } else {
            println!("{}", token);
        }
    }
    println!();
    println!("{} matching refs", tokens.len());
    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show aggregate store statistics.
pub fn cmd_stats(store_path: &Path, json_mode: bool) -> Result<(), HertError> {
    let store = HertStore::open(store_path);
    let stats = store.stats();

    if json_mode {
        let output = serde_json::json!({
            "store": store_path.to_string_lossy(),
            "total_refs": stats.total_refs,
            "total_entities": stats.total_entities,
            "total_documents": stats.total_documents,
            "top_entities": stats.top_entities
                .iter()
                .map(|(eid, count)| serde_json::json!({ "eid": eid.0, "refs": count }))
                .collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("HERT Store Statistics");
    println!("=====================");
    println!("Store:     {:?}", store_path);
    println!();
    println!("Refs:      {}", stats.total_refs);
    println!("Entities:  {}", stats.total_entities);
    println!("Documents: {}", stats.total_documents);

    if !stats.top_entities.is_empty() {
        println!();
        println!("Top entities:");
        for (eid, count) in &stats.top_entities {
            println!("  {:>12}  {} refs", eid.0, count);
        }
    }
    Ok(())
}

// =============================================================================
// CLEAR COMMAND
// =============================================================================

/// Delete every stored reference.
pub fn cmd_clear(store_path: &Path, yes: bool) -> Result<(), HertError> {
    if !yes {
        println!("This deletes every stored reference. Re-run with --yes to confirm.");
        return Ok(());
    }

    let mut store = HertStore::open(store_path);
    let removed = store.len();
    store.clear();
    store.close()?;

    println!("Cleared {} refs from {:?}", removed, store_path);
    Ok(())
}
