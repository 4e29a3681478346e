use crate::fingerprint::{Fingerprint, Snapshot};
use serde::Serialize;

/// A file present in both snapshots whose fingerprint changed.
///
/// Sentinel fingerprints compare like any other value, so a file that became
/// unreadable after baselining shows up here with the sentinel as its
/// current hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedIncident {
    #[serde(rename = "file")]
    pub path: String,
    pub baseline_hash: Fingerprint,
    pub current_hash: Fingerprint,
}

/// A file present in the current snapshot but not in the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedIncident {
    #[serde(rename = "file")]
    pub path: String,
    pub current_hash: Fingerprint,
}

/// A file present in the baseline but missing from the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedIncident {
    #[serde(rename = "file")]
    pub path: String,
    pub baseline_hash: Fingerprint,
}

/// Every incident found by a single reconciliation, grouped by kind.
///
/// Each list is in path-sorted order. An empty batch is the success case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncidentBatch {
    pub modified: Vec<ModifiedIncident>,
    pub added: Vec<AddedIncident>,
    pub deleted: Vec<DeletedIncident>,
}

impl IncidentBatch {
    pub fn total(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Compares a baseline snapshot against a current one.
///
/// Every path in either snapshot is classified exactly once: equal
/// fingerprints produce no incident, differing ones a modification, paths
/// only in `current` an addition, paths only in `baseline` a deletion.
/// Pure: no I/O, no clock, deterministic for any pair of inputs.
pub fn reconcile(baseline: &Snapshot, current: &Snapshot) -> IncidentBatch {
    let mut batch = IncidentBatch::default();

    for (path, current_hash) in current {
        match baseline.get(path) {
            Some(baseline_hash) if baseline_hash != current_hash => {
                batch.modified.push(ModifiedIncident {
                    path: path.clone(),
                    baseline_hash: baseline_hash.clone(),
                    current_hash: current_hash.clone(),
                });
            }
            Some(_) => {}
            None => {
                batch.added.push(AddedIncident {
                    path: path.clone(),
                    current_hash: current_hash.clone(),
                });
            }
        }
    }

    for (path, baseline_hash) in baseline {
        if !current.contains_key(path) {
            batch.deleted.push(DeletedIncident {
                path: path.clone(),
                baseline_hash: baseline_hash.clone(),
            });
        }
    }

    batch
}
