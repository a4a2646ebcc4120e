//! Collaborators the reconciliation engine talks to, with in-memory and HTTP implementations.

pub mod cart;
pub mod http;
pub mod status;

pub use cart::{CartStore, CouponStore, InMemoryCart, InMemoryCouponStore};
pub use http::{FetcherConfig, HttpStatusFetcher};
pub use status::{
    ConfirmationHint, InMemoryStatusFetcher, StatusFetcher, StatusQuery, StatusResponse,
    StoreStatusFetcher,
};
