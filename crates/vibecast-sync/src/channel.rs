//! Inbound snapshot bookkeeping: normalization, fingerprint dedup, and the
//! latest canonical state.
//!
//! Pure and synchronous; the background client task drives it with each
//! parsed `state` event in arrival order.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use vibecast_core::prelude::*;
use vibecast_core::{build_flat_tree, Snapshot};

/// Fill in a message tree for snapshots that only carry the flat list, so
/// nothing downstream has to special-case "tree absent".
pub fn normalize(mut snapshot: Snapshot) -> Snapshot {
    if snapshot.message_tree.is_none() {
        snapshot.message_tree = Some(build_flat_tree(&snapshot.messages));
    }
    snapshot
}

/// Structural fingerprint: SHA-256 over the stable JSON serialization.
///
/// Object keys serialize in a fixed order (struct field order, sorted maps),
/// so equal snapshots always produce equal fingerprints.
pub fn fingerprint(snapshot: &Snapshot) -> Result<String> {
    let bytes = serde_json::to_vec(snapshot)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Latest accepted snapshot plus connectivity
#[derive(Debug, Default)]
pub struct SyncChannel {
    latest: Option<Arc<Snapshot>>,
    last_fingerprint: Option<String>,
    connected: bool,
}

impl SyncChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and accept `snapshot` unless it is structurally identical to
    /// the last accepted one. Returns the accepted value.
    pub fn ingest(&mut self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let snapshot = normalize(snapshot);

        match fingerprint(&snapshot) {
            Ok(print) => {
                if self.last_fingerprint.as_deref() == Some(print.as_str()) {
                    trace!("Sync: dropping duplicate snapshot {}", &print[..12]);
                    return None;
                }
                self.last_fingerprint = Some(print);
            }
            Err(err) => {
                // unfingerprintable snapshots are never treated as duplicates
                warn!("Sync: could not fingerprint snapshot: {}", err);
                self.last_fingerprint = None;
            }
        }

        let snapshot = Arc::new(snapshot);
        self.latest = Some(Arc::clone(&snapshot));
        Some(snapshot)
    }

    pub fn latest(&self) -> Option<&Arc<Snapshot>> {
        self.latest.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns true if the flag changed
    pub fn set_connected(&mut self, connected: bool) -> bool {
        let changed = self.connected != connected;
        self.connected = connected;
        changed
    }
}
