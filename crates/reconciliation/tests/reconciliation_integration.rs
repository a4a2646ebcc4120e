//! Integration tests for payment return reconciliation.
//!
//! These tests drive a full result-page session from the raw return URL
//! through the backend lookup to the one-shot cart effects.

use std::time::Duration;

use async_trait::async_trait;
use common::OrderRef;
use domain::{
    AuthoritativeRecord, DomainError, InMemoryPaymentRecordStore, NewPaymentRecord,
    PaymentRecordStore, PaymentStatus, Provider,
};
use reconciliation::{
    InMemoryCart, InMemoryCouponStore, InMemoryStatusFetcher, PollPolicy, ReconciliationSession,
    ReconciliationState, RedirectOutcome, Resolution, StatusFetcher, StoreStatusFetcher,
    interpret,
};

fn order_ref(value: &str) -> OrderRef {
    OrderRef::parse(value).unwrap()
}

fn record(reference: &str, status: PaymentStatus) -> AuthoritativeRecord {
    let mut record = AuthoritativeRecord::pending(NewPaymentRecord::new(order_ref(reference)));
    record.payment_status = status;
    record
}

/// A cart with one line and a coupon, as left behind by checkout.
fn checkout_leftovers() -> (InMemoryCart, InMemoryCouponStore) {
    let cart = InMemoryCart::new();
    let coupons = InMemoryCouponStore::new();
    cart.add_item("PARA-500", 2);
    cart.add_item("VITC-1000", 1);
    coupons.apply("WELCOME10");
    (cart, coupons)
}

fn session<F: StatusFetcher>(
    fetcher: F,
) -> (
    ReconciliationSession<F, InMemoryCart, InMemoryCouponStore>,
    InMemoryCart,
    InMemoryCouponStore,
) {
    let (cart, coupons) = checkout_leftovers();
    let session = ReconciliationSession::new(fetcher, cart.clone(), coupons.clone());
    (session, cart, coupons)
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn vnpay_success_confirmed_by_backend() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_record(record("ORD123", PaymentStatus::Paid));
        let (mut session, cart, coupons) = session(fetcher.clone());

        let outcome = session
            .run("vnp_TxnRef=ORD123&vnp_ResponseCode=00")
            .await
            .clone();

        assert_eq!(outcome.state, ReconciliationState::Success);
        assert_eq!(outcome.resolution, Resolution::Backend);
        assert_eq!(outcome.provider, Some(Provider::Vnpay));
        assert_eq!(cart.item_count(), 0);
        assert!(coupons.applied().is_none());

        let queries = fetcher.queries();
        let hint = queries[0].confirmation_hint.as_ref().unwrap();
        assert_eq!(hint.provider, Provider::Vnpay);
        assert_eq!(hint.result_code, "00");
    }

    #[tokio::test]
    async fn momo_failure_without_record() {
        let fetcher = InMemoryStatusFetcher::new();
        let (mut session, cart, coupons) = session(fetcher.clone());

        let outcome = session
            .run("orderId=ORD9&resultCode=1006&message=User%20cancelled")
            .await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(outcome.message.as_deref(), Some("User cancelled"));
        assert_eq!(outcome.resolution, Resolution::ProviderFallback);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(coupons.applied().as_deref(), Some("WELCOME10"));
        assert!(fetcher.queries()[0].confirmation_hint.is_none());
    }

    #[tokio::test]
    async fn momo_success_while_record_stays_pending() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_record(record("ORD42", PaymentStatus::Pending));
        let (mut session, cart, coupons) = session(fetcher.clone());

        for _ in 0..3 {
            let outcome = session.run("orderId=ORD42&resultCode=0").await;
            assert_eq!(outcome.state, ReconciliationState::Success);
            assert_eq!(outcome.resolution, Resolution::ProviderFallback);
            assert_eq!(
                outcome.record.as_ref().map(|r| r.payment_status),
                Some(PaymentStatus::Pending)
            );
        }

        assert_eq!(cart.clear_calls(), 1);
        assert_eq!(coupons.remove_calls(), 1);
        let hint = fetcher.queries()[0].confirmation_hint.clone().unwrap();
        assert_eq!(hint.provider, Provider::Momo);
        assert_eq!(hint.result_code, "0");
    }

    #[tokio::test]
    async fn vnpay_cancelled_without_record() {
        let fetcher = InMemoryStatusFetcher::new();
        let (mut session, cart, coupons) = session(fetcher.clone());

        let outcome = session.run("vnp_TxnRef=ORD77&vnp_ResponseCode=24").await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(outcome.resolution, Resolution::ProviderFallback);
        assert!(outcome.record.is_none());
        assert_eq!(cart.clear_calls(), 0);
        assert_eq!(coupons.remove_calls(), 0);
        assert_eq!(cart.item_count(), 2);
        assert!(fetcher.queries()[0].confirmation_hint.is_none());
    }

    #[tokio::test]
    async fn backend_failure_beats_provider_success() {
        let fetcher = InMemoryStatusFetcher::new();
        let mut failed = record("ORD5", PaymentStatus::Failed);
        failed.message = Some("Amount mismatch".to_string());
        fetcher.set_record(failed);
        let (mut session, cart, _) = session(fetcher);

        let outcome = session.run("orderId=ORD5&resultCode=0").await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(outcome.message.as_deref(), Some("Amount mismatch"));
        assert_eq!(cart.clear_calls(), 0);
    }

    #[tokio::test]
    async fn missing_parameters_fail_without_fetch() {
        let fetcher = InMemoryStatusFetcher::new();
        let (mut session, cart, _) = session(fetcher.clone());

        let outcome = session.run("").await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(outcome.resolution, Resolution::MissingSignal);
        assert_eq!(fetcher.fetch_count(), 0);
        assert_eq!(cart.clear_calls(), 0);
    }
}

mod idempotency {
    use super::*;

    #[tokio::test]
    async fn repeated_runs_clear_cart_once() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_record(record("ORD123", PaymentStatus::Paid));
        let (mut session, cart, coupons) = session(fetcher);

        for _ in 0..10 {
            let outcome = session.run("vnp_TxnRef=ORD123&vnp_ResponseCode=00").await;
            assert!(outcome.is_success());
        }

        assert_eq!(cart.clear_calls(), 1);
        assert_eq!(coupons.remove_calls(), 1);
    }

    #[tokio::test]
    async fn pending_then_success_clears_cart_once() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_record(record("ORD7", PaymentStatus::Pending));
        let (mut session, cart, _) = session(fetcher.clone());

        session.run("orderId=ORD7&resultCode=7000").await;
        session.run("orderId=ORD7&resultCode=7000").await;
        assert_eq!(session.state(), ReconciliationState::Pending);
        assert_eq!(cart.clear_calls(), 0);

        fetcher.set_record(record("ORD7", PaymentStatus::Paid));
        session.retry().await.unwrap();
        session.run("orderId=ORD7&resultCode=7000").await;

        assert_eq!(session.state(), ReconciliationState::Success);
        assert_eq!(cart.clear_calls(), 1);
    }
}

mod precedence {
    use super::*;

    #[tokio::test]
    async fn settled_backend_record_always_decides() {
        let cases = [
            (PaymentStatus::Paid, "24", ReconciliationState::Success),
            (PaymentStatus::Paid, "07", ReconciliationState::Success),
            (PaymentStatus::Failed, "00", ReconciliationState::Failed),
            (PaymentStatus::Refunded, "00", ReconciliationState::Failed),
        ];

        for (status, code, expected) in cases {
            let fetcher = InMemoryStatusFetcher::new();
            fetcher.set_record(record("ORD1", status));
            let (mut session, _, _) = session(fetcher);

            let query = format!("vnp_TxnRef=ORD1&vnp_ResponseCode={code}");
            let outcome = session.run(&query).await;
            assert_eq!(outcome.state, expected, "{status} / {code}");
            assert_eq!(outcome.resolution, Resolution::Backend);
        }
    }

    #[tokio::test]
    async fn optimistic_fallback_when_backend_unreachable() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_fail_on_fetch(true);
        let (mut session, cart, _) = session(fetcher);

        let outcome = session.run("orderId=ORD2&resultCode=0").await;

        assert_eq!(outcome.state, ReconciliationState::Success);
        assert_eq!(outcome.resolution, Resolution::ProviderFallback);
        assert!(outcome.record.is_none());
        assert_eq!(cart.clear_calls(), 1);
    }

    #[tokio::test]
    async fn no_false_success_without_evidence() {
        for query in [
            "vnp_TxnRef=ORD3",
            "vnp_TxnRef=ORD3&vnp_ResponseCode=",
            "vnp_TxnRef=ORD3&vnp_ResponseCode=07",
            "orderId=ORD3&resultCode=abc",
            "orderId=ORD3&resultCode=9000",
        ] {
            let fetcher = InMemoryStatusFetcher::new();
            fetcher.set_fail_on_fetch(true);
            let (mut session, cart, _) = session(fetcher);

            let outcome = session.run(query).await;
            assert_eq!(outcome.state, ReconciliationState::Pending, "{query}");
            assert_eq!(cart.clear_calls(), 0, "{query}");
        }
    }

    #[tokio::test]
    async fn provider_codes_do_not_leak_across_providers() {
        let fetcher = InMemoryStatusFetcher::new();
        fetcher.set_fail_on_fetch(true);

        let (mut vnpay, _, _) = session(fetcher.clone());
        let outcome = vnpay.run("vnp_TxnRef=ORD4&vnp_ResponseCode=0").await;
        assert_ne!(outcome.state, ReconciliationState::Success);

        let (mut momo, _, _) = session(fetcher);
        let outcome = momo.run("orderId=ORD4&resultCode=00").await;
        // MoMo codes are numeric, so "00" is its success code 0.
        assert_eq!(outcome.state, ReconciliationState::Success);
    }

    #[test]
    fn vnpay_wins_when_both_parameter_sets_present() {
        let outcome = interpret("orderId=M1&resultCode=0&vnp_TxnRef=V1&vnp_ResponseCode=24");
        let RedirectOutcome::Signal(signal) = outcome else {
            panic!("expected a signal");
        };
        assert_eq!(signal.provider, Provider::Vnpay);
        assert_eq!(signal.transaction_ref.as_str(), "V1");
    }
}

mod backend_store {
    use super::*;

    /// Settles a pending payment as failed right after each read, like a
    /// webhook landing while the status lookup is in flight.
    struct WebhookAfterRead {
        inner: InMemoryPaymentRecordStore,
    }

    #[async_trait]
    impl PaymentRecordStore for WebhookAfterRead {
        async fn create(
            &self,
            new: NewPaymentRecord,
        ) -> Result<AuthoritativeRecord, DomainError> {
            self.inner.create(new).await
        }

        async fn get(
            &self,
            order_ref: &OrderRef,
        ) -> Result<Option<AuthoritativeRecord>, DomainError> {
            let record = self.inner.get(order_ref).await?;
            if record
                .as_ref()
                .is_some_and(|r| r.payment_status == PaymentStatus::Pending)
            {
                self.inner
                    .update_status(
                        order_ref,
                        PaymentStatus::Failed,
                        Some("Signature verification failed".to_string()),
                    )
                    .await?;
            }
            Ok(record)
        }

        async fn update_status(
            &self,
            order_ref: &OrderRef,
            status: PaymentStatus,
            message: Option<String>,
        ) -> Result<AuthoritativeRecord, DomainError> {
            self.inner.update_status(order_ref, status, message).await
        }
    }

    #[tokio::test]
    async fn webhook_failure_during_lookup_wins() {
        let inner = InMemoryPaymentRecordStore::new();
        inner
            .create(NewPaymentRecord::new(order_ref("ORD-1")))
            .await
            .unwrap();
        let store = WebhookAfterRead {
            inner: inner.clone(),
        };
        let (mut session, cart, coupons) = session(StoreStatusFetcher::new(store));

        let outcome = session.run("orderId=ORD-1&resultCode=0").await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(outcome.resolution, Resolution::Backend);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Signature verification failed")
        );
        assert_eq!(cart.clear_calls(), 0);
        assert_eq!(coupons.remove_calls(), 0);

        let stored = inner.get(&order_ref("ORD-1")).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn confirmation_hint_finalizes_pending_record() {
        let store = InMemoryPaymentRecordStore::new();
        store
            .create(NewPaymentRecord::new(order_ref("ORD100")).with_amount_cents(125_000))
            .await
            .unwrap();
        let (mut session, cart, _) = session(StoreStatusFetcher::new(store.clone()));

        let outcome = session
            .run("?vnp_TxnRef=ORD100&vnp_ResponseCode=00&vnp_Amount=12500000")
            .await;

        assert_eq!(outcome.state, ReconciliationState::Success);
        assert_eq!(outcome.resolution, Resolution::Backend);
        let shown = outcome.record.as_ref().unwrap();
        assert_eq!(shown.order_db_id.as_deref(), Some("1"));
        assert_eq!(cart.clear_calls(), 1);

        let stored = store.get(&order_ref("ORD100")).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn webhook_failure_is_not_overridden_by_return_url() {
        let store = InMemoryPaymentRecordStore::new();
        store
            .create(NewPaymentRecord::new(order_ref("ORD101")))
            .await
            .unwrap();
        store
            .update_status(
                &order_ref("ORD101"),
                PaymentStatus::Failed,
                Some("Signature verification failed".to_string()),
            )
            .await
            .unwrap();
        let (mut session, cart, _) = session(StoreStatusFetcher::new(store.clone()));

        let outcome = session.run("orderId=ORD101&resultCode=0").await;

        assert_eq!(outcome.state, ReconciliationState::Failed);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Signature verification failed")
        );
        assert_eq!(cart.clear_calls(), 0);
        let stored = store.get(&order_ref("ORD101")).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn polling_picks_up_webhook_confirmation() {
        let store = InMemoryPaymentRecordStore::new();
        store
            .create(NewPaymentRecord::new(order_ref("ORD102")))
            .await
            .unwrap();
        let (mut session, cart, _) = session(StoreStatusFetcher::new(store.clone()));

        let outcome = session.run("orderId=ORD102&resultCode=1000").await;
        assert_eq!(outcome.state, ReconciliationState::Pending);

        store
            .update_status(&order_ref("ORD102"), PaymentStatus::Paid, None)
            .await
            .unwrap();

        let policy = PollPolicy::bounded(3, Duration::from_millis(1));
        let outcome = session.poll_until_settled(&policy).await.unwrap();
        assert_eq!(outcome.state, ReconciliationState::Success);
        assert_eq!(outcome.resolution, Resolution::Backend);
        assert_eq!(cart.clear_calls(), 1);
    }
}
