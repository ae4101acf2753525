//! Shared wire/value types for the cart aggregator.

use serde::{Deserialize, Serialize};

/// Catalog-enriched line item, as returned by `GET /user/{id}/cart` and
/// sent to OSS as an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku_id: i64,
    pub name: String,
    pub price: u32,
    pub count: u16,
}

/// The subset of catalog data the product client caches: everything
/// about a SKU except how many of it are in a particular cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub price: u32,
}
