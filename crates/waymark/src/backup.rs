//! Backup codec for the journal dataset.
//!
//! Serializes the full user dataset (entries, goals, preferences) to one
//! human-inspectable JSON document and restores it losslessly. Field names
//! and enumeration strings are stable across versions; unknown fields are
//! ignored on import, missing required sections are rejected before anything
//! is written.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::journal::{Entry, Goal};
use crate::prefs::{PreferenceStore, Preferences};
use crate::store::Store;

/// Version written into new backup documents.
pub const BACKUP_VERSION: u32 = 1;

fn default_version() -> u32 {
    BACKUP_VERSION
}

/// The interchange document: three required sections plus a version marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// All footprint entries, identifier included.
    pub entries: Vec<Entry>,
    /// All travel goals, identifier included.
    pub goals: Vec<Goal>,
    /// The preference record.
    pub preferences: Preferences,
}

/// What an import applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Number of entries upserted.
    pub entries: usize,
    /// Number of goals upserted.
    pub goals: usize,
}

/// Gather the entire current dataset into a backup document.
///
/// This is a pure read: entries and goals come from one consistent store
/// snapshot, preferences from the store's current value.
///
/// # Errors
///
/// Returns an error if reading the store fails.
pub fn export(store: &Store, prefs: &PreferenceStore) -> Result<BackupDocument> {
    let (entries, goals) = store.snapshot()?;
    Ok(BackupDocument {
        version: BACKUP_VERSION,
        entries,
        goals,
        preferences: prefs.current(),
    })
}

/// Serialize a backup document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(document: &BackupDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a backup document from JSON.
///
/// Unknown fields are ignored for forward compatibility; a missing required
/// section, an enumeration value outside its domain, or a malformed date is
/// a validation failure.
///
/// # Errors
///
/// Returns [`Error::BackupValidation`] if the document is malformed.
pub fn parse(json: &str) -> Result<BackupDocument> {
    let document: BackupDocument = serde_json::from_str(json)
        .map_err(|e| Error::backup_validation(format!("invalid document: {e}")))?;
    if document.version > BACKUP_VERSION {
        warn!(
            version = document.version,
            "backup document is from a newer version; importing known fields"
        );
    }
    Ok(document)
}

/// Restore a parsed document into the store and preferences.
///
/// Entries and goals merge by identifier inside one transaction: existing
/// identifiers are overwritten, new ones inserted, and a failure anywhere
/// rolls the whole restore back. Preferences are applied only after the
/// transaction commits. Out-of-range numerics are clamped per the data-model
/// invariants rather than rejected.
///
/// # Errors
///
/// Returns an error if the store transaction or preference write fails; the
/// store is unchanged in the former case.
pub fn import_document(
    store: &Store,
    prefs: &PreferenceStore,
    document: BackupDocument,
) -> Result<ImportStats> {
    store.apply_backup(&document.entries, &document.goals)?;
    prefs.apply(document.preferences)?;

    let stats = ImportStats {
        entries: document.entries.len(),
        goals: document.goals.len(),
    };
    info!(
        entries = stats.entries,
        goals = stats.goals,
        "backup imported"
    );
    Ok(stats)
}

/// Validate and restore a JSON backup document.
///
/// Validation happens entirely before the first write, so a rejected
/// document leaves both the store and the preferences untouched.
///
/// # Errors
///
/// Returns [`Error::BackupValidation`] for a malformed document, or a store
/// error if applying it fails.
pub fn import(store: &Store, prefs: &PreferenceStore, json: &str) -> Result<ImportStats> {
    let document = parse(json)?;
    import_document(store, prefs, document)
}
