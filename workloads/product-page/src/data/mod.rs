//! Catalog records as served by the product API.

mod pick;
mod product;
mod review;
mod sizes;

pub use pick::*;
pub use product::*;
pub use review::*;
pub use sizes::*;
