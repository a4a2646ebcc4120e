//! Per-page-view reconciliation session.

use std::time::Duration;

use common::SessionId;

use crate::error::{Result, SessionError};
use crate::gate::EffectGate;
use crate::reconciler::{ReconciliationOutcome, Reconciler};
use crate::redirect::{RedirectOutcome, interpret};
use crate::services::cart::{CartStore, CouponStore};
use crate::services::status::StatusFetcher;
use crate::state::ReconciliationState;

/// Bounded exponential backoff for re-checking a `Pending` payment.
///
/// The default policy is disabled: a pending payment stays pending until the
/// customer asks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl PollPolicy {
    /// A policy that never polls.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }

    /// Polls up to `max_attempts` times, doubling the delay each time.
    pub fn bounded(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Self::disabled()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before the zero-based `attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Everything the payment result page knows during one page view.
///
/// The return URL is interpreted once, on the first [`run`](Self::run).
/// Success effects go through a single [`EffectGate`] owned by the session,
/// so re-renders, retries and polling can never clear the cart twice.
pub struct ReconciliationSession<F, C, K>
where
    F: StatusFetcher,
    C: CartStore,
    K: CouponStore,
{
    id: SessionId,
    reconciler: Reconciler<F>,
    cart: C,
    coupons: K,
    gate: EffectGate,
    state: ReconciliationState,
    redirect: Option<RedirectOutcome>,
    outcome: Option<ReconciliationOutcome>,
}

impl<F, C, K> ReconciliationSession<F, C, K>
where
    F: StatusFetcher,
    C: CartStore,
    K: CouponStore,
{
    /// Creates a session in the `Checking` state.
    pub fn new(fetcher: F, cart: C, coupons: K) -> Self {
        Self {
            id: SessionId::new(),
            reconciler: Reconciler::new(fetcher),
            cart,
            coupons,
            gate: EffectGate::new(),
            state: ReconciliationState::Checking,
            redirect: None,
            outcome: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> ReconciliationState {
        self.state
    }

    /// The latest outcome, once the session has run.
    pub fn outcome(&self) -> Option<&ReconciliationOutcome> {
        self.outcome.as_ref()
    }

    /// The interpreted return URL, once the session has run.
    pub fn redirect(&self) -> Option<&RedirectOutcome> {
        self.redirect.as_ref()
    }

    /// Returns true once the cart and coupon effects have run.
    pub fn effects_applied(&self) -> bool {
        self.gate.has_fired()
    }

    pub fn cart(&self) -> &C {
        &self.cart
    }

    pub fn coupons(&self) -> &K {
        &self.coupons
    }

    /// Reconciles the payment for this page view.
    ///
    /// Once the payment is settled (`Success` or `Failed`), later calls
    /// return the same outcome without asking the backend again.
    #[tracing::instrument(skip(self, query), fields(session_id = %self.id))]
    pub async fn run(&mut self, query: &str) -> &ReconciliationOutcome {
        let outcome = match self.outcome.take() {
            Some(outcome) if self.state.is_terminal() => {
                tracing::debug!(state = %self.state, "payment already settled, reusing outcome");
                outcome
            }
            _ => {
                let redirect = self
                    .redirect
                    .get_or_insert_with(|| interpret(query))
                    .clone();
                self.resolve_redirect(redirect).await
            }
        };
        self.finish(outcome)
    }

    /// Checks a pending payment again, e.g. from a "track order" action.
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn retry(&mut self) -> Result<&ReconciliationOutcome> {
        if self.outcome.is_none() {
            return Err(SessionError::NotStarted);
        }
        if !self.state.can_retry() {
            return Err(SessionError::InvalidState {
                state: self.state,
                action: "retry",
            });
        }
        let Some(RedirectOutcome::Signal(signal)) = self.redirect.clone() else {
            return Err(SessionError::NotStarted);
        };

        self.enter(ReconciliationState::Checking);
        let outcome = self.reconciler.reconcile(&signal).await;
        Ok(self.finish(outcome))
    }

    /// Retries while the payment is pending, sleeping between attempts.
    ///
    /// Stops when the payment settles or the policy runs out of attempts.
    pub async fn poll_until_settled(
        &mut self,
        policy: &PollPolicy,
    ) -> Result<&ReconciliationOutcome> {
        if self.outcome.is_none() {
            return Err(SessionError::NotStarted);
        }

        let mut attempt = 0;
        while self.state.can_retry() && attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
            attempt += 1;
            tracing::debug!(session_id = %self.id, attempt, "polling pending payment");
            self.retry().await?;
        }

        self.outcome.as_ref().ok_or(SessionError::NotStarted)
    }

    async fn resolve_redirect(&mut self, redirect: RedirectOutcome) -> ReconciliationOutcome {
        match redirect {
            RedirectOutcome::Signal(signal) => {
                self.enter(ReconciliationState::Checking);
                self.reconciler.reconcile(&signal).await
            }
            RedirectOutcome::NoSignal(reason) => {
                tracing::warn!(%reason, "payment return URL has no usable signal");
                metrics::counter!("reconciliation_missing_signal_total").increment(1);
                ReconciliationOutcome::missing_signal(&reason)
            }
        }
    }

    fn finish(&mut self, outcome: ReconciliationOutcome) -> &ReconciliationOutcome {
        self.enter(outcome.state);
        self.gate
            .apply_once(outcome.state, &self.cart, &self.coupons);
        self.outcome.insert(outcome)
    }

    fn enter(&mut self, next: ReconciliationState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid reconciliation transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "reconciliation state changed");
        self.state = next;
    }
}
