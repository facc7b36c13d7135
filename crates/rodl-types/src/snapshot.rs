//! Editions (snapshots) of a research object version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::EditionId;

/// An edition is an immutable set of file versions representing the state of
/// a research object version at one point in time.
///
/// Only the `published` flag ever changes after creation. Multiple editions
/// may exist per version; the "current" one is chosen by the edition
/// selector, and zero or more may be marked published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: EditionId,
    pub published: bool,
    pub created: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(id: EditionId, published: bool, created: DateTime<Utc>) -> Self {
        Self {
            id,
            published,
            created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip() {
        let snap = Snapshot::new(EditionId(5), true, Utc::now());
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
