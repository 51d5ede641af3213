//! Size availability data models.

use serde::{Deserialize, Serialize};

/// Every size a product comes in, and the ones in stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeAvailability {
    pub total: Vec<String>,
    pub available: Vec<String>,
}

impl SizeAvailability {
    pub fn is_available(&self, size: &str) -> bool {
        self.available.iter().any(|s| s == size)
    }
}
