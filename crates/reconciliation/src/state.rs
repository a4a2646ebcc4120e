//! Reconciliation state machine.

use serde::{Deserialize, Serialize};

/// What the payment result page currently believes about the payment.
///
/// State transitions:
/// ```text
/// Checking ──┬──► Success
///            ├──► Failed
///            └──► Pending ──► Checking (manual retry or poll)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationState {
    /// Waiting on the backend status call.
    #[default]
    Checking,

    /// Payment confirmed (terminal state).
    Success,

    /// Payment failed or could not be matched to an order (terminal state).
    Failed,

    /// Neither source could settle the payment yet.
    Pending,
}

impl ReconciliationState {
    /// Returns true if the state may move to `next`.
    pub fn can_transition_to(&self, next: ReconciliationState) -> bool {
        match self {
            ReconciliationState::Checking => true,
            ReconciliationState::Pending => next == ReconciliationState::Checking,
            ReconciliationState::Success | ReconciliationState::Failed => false,
        }
    }

    /// Returns true if a retry may be started from this state.
    pub fn can_retry(&self) -> bool {
        matches!(self, ReconciliationState::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReconciliationState::Success | ReconciliationState::Failed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationState::Checking => "checking",
            ReconciliationState::Success => "success",
            ReconciliationState::Failed => "failed",
            ReconciliationState::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_checking() {
        assert_eq!(ReconciliationState::default(), ReconciliationState::Checking);
    }

    #[test]
    fn test_checking_can_reach_every_state() {
        let checking = ReconciliationState::Checking;
        assert!(checking.can_transition_to(ReconciliationState::Success));
        assert!(checking.can_transition_to(ReconciliationState::Failed));
        assert!(checking.can_transition_to(ReconciliationState::Pending));
    }

    #[test]
    fn test_pending_only_returns_to_checking() {
        let pending = ReconciliationState::Pending;
        assert!(pending.can_transition_to(ReconciliationState::Checking));
        assert!(!pending.can_transition_to(ReconciliationState::Success));
        assert!(!pending.can_transition_to(ReconciliationState::Failed));
    }

    #[test]
    fn test_terminal_states_never_leave() {
        for terminal in [ReconciliationState::Success, ReconciliationState::Failed] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_retry());
            assert!(!terminal.can_transition_to(ReconciliationState::Checking));
            assert!(!terminal.can_transition_to(ReconciliationState::Pending));
        }
    }

    #[test]
    fn test_can_retry() {
        assert!(!ReconciliationState::Checking.can_retry());
        assert!(ReconciliationState::Pending.can_retry());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReconciliationState::Checking.to_string(), "checking");
        assert_eq!(ReconciliationState::Success.to_string(), "success");
        assert_eq!(ReconciliationState::Failed.to_string(), "failed");
        assert_eq!(ReconciliationState::Pending.to_string(), "pending");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&ReconciliationState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let state: ReconciliationState = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(state, ReconciliationState::Success);
    }
}
