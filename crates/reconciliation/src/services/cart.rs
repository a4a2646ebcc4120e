//! Cart and coupon collaborators touched after a confirmed payment.

use std::sync::{Arc, Mutex, PoisonError};

/// The customer's cart.
pub trait CartStore: Send + Sync {
    /// Empties the cart.
    fn clear_cart(&self);
}

/// The coupon applied at checkout.
pub trait CouponStore: Send + Sync {
    /// Drops the applied coupon so it cannot be reused on the next order.
    fn remove_applied_coupon(&self);
}

impl<T: CartStore + ?Sized> CartStore for Arc<T> {
    fn clear_cart(&self) {
        (**self).clear_cart();
    }
}

impl<T: CouponStore + ?Sized> CouponStore for Arc<T> {
    fn remove_applied_coupon(&self) {
        (**self).remove_applied_coupon();
    }
}

#[derive(Debug, Default)]
struct CartState {
    items: Vec<(String, u32)>,
    clear_calls: usize,
}

/// In-memory cart for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCart {
    state: Arc<Mutex<CartState>>,
}

impl InMemoryCart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line to the cart.
    pub fn add_item(&self, sku: impl Into<String>, quantity: u32) {
        self.lock().items.push((sku.into(), quantity));
    }

    /// Returns the number of lines in the cart.
    pub fn item_count(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns how many times the cart was cleared.
    pub fn clear_calls(&self) -> usize {
        self.lock().clear_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore for InMemoryCart {
    fn clear_cart(&self) {
        let mut state = self.lock();
        state.items.clear();
        state.clear_calls += 1;
    }
}

#[derive(Debug, Default)]
struct CouponState {
    applied: Option<String>,
    remove_calls: usize,
}

/// In-memory coupon store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponStore {
    state: Arc<Mutex<CouponState>>,
}

impl InMemoryCouponStore {
    /// Creates a store with no coupon applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a coupon code.
    pub fn apply(&self, code: impl Into<String>) {
        self.lock().applied = Some(code.into());
    }

    /// Returns the applied coupon code, if any.
    pub fn applied(&self) -> Option<String> {
        self.lock().applied.clone()
    }

    /// Returns how many times the applied coupon was removed.
    pub fn remove_calls(&self) -> usize {
        self.lock().remove_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CouponState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CouponStore for InMemoryCouponStore {
    fn remove_applied_coupon(&self) {
        let mut state = self.lock();
        state.applied = None;
        state.remove_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_cart() {
        let cart = InMemoryCart::new();
        cart.add_item("PARA-500", 2);
        cart.add_item("VITC-1000", 1);
        assert_eq!(cart.item_count(), 2);

        cart.clear_cart();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.clear_calls(), 1);
    }

    #[test]
    fn test_remove_applied_coupon() {
        let coupons = InMemoryCouponStore::new();
        coupons.apply("WELCOME10");
        assert_eq!(coupons.applied().as_deref(), Some("WELCOME10"));

        coupons.remove_applied_coupon();
        assert!(coupons.applied().is_none());
        assert_eq!(coupons.remove_calls(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let cart = InMemoryCart::new();
        let shared = Arc::new(cart.clone());
        cart.add_item("PARA-500", 1);
        shared.clear_cart();
        assert_eq!(cart.item_count(), 0);
    }
}
