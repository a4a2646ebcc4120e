//! Payment return reconciliation.
//!
//! When a customer comes back from a payment gateway, the result page runs:
//! 1. Redirect interpretation: which provider sent the customer back, with
//!    which order reference and result code
//! 2. Status reconciliation: the backend record decides when it has an
//!    opinion, the provider's code is the fallback when it does not
//! 3. The effect gate: cart clearing and coupon removal happen at most once
//!    per page view
//!
//! [`ReconciliationSession`] ties the three together for one page view.

pub mod error;
pub mod gate;
pub mod reconciler;
pub mod redirect;
pub mod services;
pub mod session;
pub mod state;

pub use error::{FetchError, SessionError};
pub use gate::EffectGate;
pub use reconciler::{ReconciliationOutcome, Reconciler, Resolution};
pub use redirect::{NoSignalReason, ProviderSignal, RedirectOutcome, interpret};
pub use services::{
    CartStore, ConfirmationHint, CouponStore, FetcherConfig, HttpStatusFetcher, InMemoryCart,
    InMemoryCouponStore, InMemoryStatusFetcher, StatusFetcher, StatusQuery, StatusResponse,
    StoreStatusFetcher,
};
pub use session::{PollPolicy, ReconciliationSession};
pub use state::ReconciliationState;
