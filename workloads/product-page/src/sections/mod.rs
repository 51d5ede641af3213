//! Section renderers for the product page.
//!
//! Every renderer is a pure function from fetched data (plus the size
//! selection) to HTML. Interpolated text goes through `escape_html`.

mod gallery;
mod layout;
mod picks;
mod placeholder;
mod price;
mod ratings;
mod reviews;
mod sizes;

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::QueryKind;

pub use gallery::*;
pub use layout::*;
pub use picks::*;
pub use placeholder::*;
pub use price::*;
pub use ratings::*;
pub use reviews::*;
pub use sizes::*;

/// The secondary sections, each streamed into its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Sizes,
    Recommended,
    Reviews,
}

impl SectionKind {
    /// Page order.
    pub const ALL: [SectionKind; 3] = [Self::Sizes, Self::Recommended, Self::Reviews];

    /// Slot name and fragment route segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sizes => "sizes",
            Self::Recommended => "recommended",
            Self::Reviews => "reviews",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Human name, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sizes => "available sizes",
            Self::Recommended => "recommended picks",
            Self::Reviews => "reviews",
        }
    }

    /// The query this section renders.
    pub fn query_kind(&self) -> QueryKind {
        match self {
            Self::Sizes => QueryKind::Sizes,
            Self::Recommended => QueryKind::Recommended,
            Self::Reviews => QueryKind::Reviews,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `2024-11-06` or an RFC 3339 timestamp.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
