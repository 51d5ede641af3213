//! Dependency tagging for semantic categorization.

/// Upstream dependency categories a storefront page reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Product catalog records.
    Catalog,
    /// Product recommendations.
    Recommendations,
    /// Inventory/size availability.
    Inventory,
    /// Reviews and comments.
    Reviews,
    /// Custom dependency with name.
    Custom(&'static str),
}

impl DependencyTag {
    /// Whether the page cannot render without this dependency.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Catalog)
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &str {
        match self {
            Self::Catalog => "catalog",
            Self::Recommendations => "recommendations",
            Self::Inventory => "inventory",
            Self::Reviews => "reviews",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
