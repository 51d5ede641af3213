//! The loaded product, handed to every section that needs it.

use edge_sdk::edge_cache::QueryHandle;

use crate::data::Product;
use crate::sections::SizeSelection;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("no product is in scope")]
    NoProduct,
}

/// The primary product query of a page. Always carries a product.
#[derive(Debug, Clone)]
pub struct ProductContext {
    product: Product,
    query: QueryHandle<Product>,
}

impl ProductContext {
    /// Wrap a settled product query. `None` when it has no data.
    pub fn provide(query: QueryHandle<Product>) -> Option<Self> {
        let product = query.data()?.clone();
        Some(Self { product, query })
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Loading and error state of the query the product came from. A product
    /// served stale after a failed refetch has both data and an error.
    pub fn query(&self) -> &QueryHandle<Product> {
        &self.query
    }

    pub fn id(&self) -> &str {
        &self.product.id
    }
}

/// The product a page renders and the size selection made for it.
///
/// Lookup for code that may run with or without a product loaded.
#[derive(Debug, Clone, Default)]
pub struct ProductScope {
    current: Option<ProductContext>,
    selection: SizeSelection,
}

impl ProductScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the size selection. It survives [`enter`](Self::enter) only for
    /// the product it was made for.
    pub fn with_selection(mut self, selection: SizeSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Replace the product in scope, returning the previous one.
    pub fn enter(&mut self, context: ProductContext) -> Option<ProductContext> {
        self.selection.sync(context.id());
        self.current.replace(context)
    }

    pub fn product(&self) -> Result<&ProductContext, ContextError> {
        self.current.as_ref().ok_or(ContextError::NoProduct)
    }

    pub fn selection(&self) -> &SizeSelection {
        &self.selection
    }
}
