//! Query cache keys.

use serde::{Deserialize, Serialize};

/// Identifies one cached query: what kind of record, for which entity.
///
/// Keys for different ids never collide, so a response for an old id can
/// never land in a newer id's entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    kind: String,
    id: String,
}

impl QueryKey {
    /// Create a key from a kind (e.g. `"product"`) and an entity id.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Record kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Entity id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Flat string form, `kind:id`, used as a storage key.
    pub fn as_string(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
