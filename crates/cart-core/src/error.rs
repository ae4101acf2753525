//! Error taxonomy for the cart side of the system (spec.md §7): cart
//! storage errors, the out-of-stock precondition, and the catalog/OSS
//! upstream failure kinds a transport maps to an HTTP status.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("user is not found")]
    UserNotFound,

    #[error("products are not found")]
    UserCartEmpty,

    #[error("product is not found")]
    ProductNotFound,

    #[error("product is out of stock")]
    OutOfStock,

    #[error("product service is unavailable")]
    UpstreamUnavailable,

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
