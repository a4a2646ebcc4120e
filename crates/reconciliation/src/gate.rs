//! One-shot checkout effects.

use crate::services::cart::{CartStore, CouponStore};
use crate::state::ReconciliationState;

/// Clears the cart and removes the applied coupon at most once.
///
/// The latch lives as long as the gate and is never reset. It guards this
/// page view only; the backend independently guarantees a payment is applied
/// to an order at most once.
#[derive(Debug, Default)]
pub struct EffectGate {
    fired: bool,
}

impl EffectGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the success effects if `state` is `Success` and they have not run yet.
    ///
    /// Returns true only on the call that actually ran them.
    pub fn apply_once<C, K>(&mut self, state: ReconciliationState, cart: &C, coupons: &K) -> bool
    where
        C: CartStore + ?Sized,
        K: CouponStore + ?Sized,
    {
        if state != ReconciliationState::Success || self.fired {
            return false;
        }

        cart.clear_cart();
        coupons.remove_applied_coupon();
        self.fired = true;

        metrics::counter!("reconciliation_effects_applied_total").increment(1);
        tracing::info!("cart cleared and applied coupon removed");
        true
    }

    /// Returns true once the effects have run.
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
