//! Wallet funding and withdrawal tests: verified-before-credit,
//! reference idempotency, and the payout debit guard.

mod common;

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

use Datawave_backend::config::BusinessConfig;
use Datawave_backend::database::user_repository::Role;
use Datawave_backend::error::{AppErrorKind, DomainError, ErrorCode, WalletKind};
use Datawave_backend::services::{WalletService, WithdrawRequest};

use common::{paid, test_user, InMemoryOrders, InMemoryUsers, InMemoryWithdrawals, MockVerifier};

fn business() -> BusinessConfig {
    BusinessConfig {
        agent_upgrade_fee: BigDecimal::from_str("20.00").unwrap(),
        min_withdrawal: BigDecimal::from_str("10.00").unwrap(),
        session_ttl_hours: 168,
    }
}

struct Harness {
    users: Arc<InMemoryUsers>,
    orders: Arc<InMemoryOrders>,
    withdrawals: Arc<InMemoryWithdrawals>,
    service: WalletService,
}

fn harness(users: InMemoryUsers, verifier: MockVerifier) -> Harness {
    let users = Arc::new(users);
    let orders = Arc::new(InMemoryOrders::default());
    let withdrawals = Arc::new(InMemoryWithdrawals::default());
    let service = WalletService::new(
        users.clone(),
        orders.clone(),
        withdrawals.clone(),
        Arc::new(verifier),
        business(),
    );
    Harness {
        users,
        orders,
        withdrawals,
        service,
    }
}

fn withdraw_ghs(amount: &str) -> WithdrawRequest {
    WithdrawRequest {
        amount: BigDecimal::from_str(amount).unwrap(),
        account_number: "0241234567".to_string(),
        account_name: "Kofi Mensah".to_string(),
        network: "MTN".to_string(),
    }
}

#[tokio::test]
async fn top_up_credits_after_verification() {
    let user = test_user("ama", Role::Client, 1000, 0);
    let user_id = user.id;
    let h = harness(
        InMemoryUsers::with(vec![user]),
        MockVerifier::with(vec![paid("PSK-top-1", 5000)]),
    );

    let outcome = h
        .service
        .top_up(user_id, "PSK-top-1", BigDecimal::from_str("50.00").unwrap())
        .await
        .unwrap();

    assert_eq!(outcome.new_balance, 6000);
    assert_eq!(h.users.balance_of(user_id), 6000);
    assert_eq!(outcome.order.status, "topup_successful");
    assert_eq!(outcome.order.network, "WALLET");
    assert_eq!(outcome.order.plan_name, "Wallet Funding");
    assert_eq!(outcome.order.reference, "PSK-top-1");
}

#[tokio::test]
async fn top_up_replay_credits_only_once() {
    let user = test_user("ama", Role::Client, 0, 0);
    let user_id = user.id;
    let h = harness(
        InMemoryUsers::with(vec![user]),
        MockVerifier::with(vec![paid("PSK-top-2", 5000)]),
    );
    let amount = BigDecimal::from_str("50.00").unwrap();

    h.service
        .top_up(user_id, "PSK-top-2", amount.clone())
        .await
        .unwrap();
    let err = h
        .service
        .top_up(user_id, "PSK-top-2", amount)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::DuplicateReference);
    assert_eq!(h.users.balance_of(user_id), 5000);
    assert_eq!(h.orders.all().len(), 1);
}

// Two in-flight replays of the same callback; the verifier yields so
// both get past the reference pre-check before either writes.
#[tokio::test]
async fn concurrent_top_up_replays_credit_only_once() {
    let user = test_user("ama", Role::Client, 0, 0);
    let user_id = user.id;
    let users = Arc::new(InMemoryUsers::with(vec![user]));
    let orders = Arc::new(InMemoryOrders::default());
    let service = Arc::new(WalletService::new(
        users.clone(),
        orders.clone(),
        Arc::new(InMemoryWithdrawals::default()),
        Arc::new(MockVerifier::yielding_with(vec![paid("PSK-race", 5000)])),
        business(),
    ));
    let amount = BigDecimal::from_str("50.00").unwrap();

    let first = tokio::spawn({
        let service = service.clone();
        let amount = amount.clone();
        async move { service.top_up(user_id, "PSK-race", amount).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        let amount = amount.clone();
        async move { service.top_up(user_id, "PSK-race", amount).await }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    let rejected = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(rejected.error_code(), ErrorCode::DuplicateReference);
    assert_eq!(users.balance_of(user_id), 5000);
    assert_eq!(orders.all().len(), 1);
}

#[tokio::test]
async fn top_up_rejects_amount_the_payment_does_not_cover() {
    let user = test_user("ama", Role::Client, 0, 0);
    let user_id = user.id;
    let h = harness(
        InMemoryUsers::with(vec![user]),
        MockVerifier::with(vec![paid("PSK-top-3", 4000)]),
    );

    let err = h
        .service
        .top_up(user_id, "PSK-top-3", BigDecimal::from_str("50.00").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::VerificationFailed);
    assert_eq!(h.users.balance_of(user_id), 0);
    assert!(h.orders.all().is_empty());
}

#[tokio::test]
async fn top_up_with_unknown_reference_is_a_gateway_error() {
    let user = test_user("ama", Role::Client, 0, 0);
    let user_id = user.id;
    let h = harness(InMemoryUsers::with(vec![user]), MockVerifier::default());

    let err = h
        .service
        .top_up(user_id, "PSK-missing", BigDecimal::from_str("50.00").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::PaymentProviderError);
    assert_eq!(err.status_code(), 502);
    assert_eq!(h.users.balance_of(user_id), 0);
}

#[tokio::test]
async fn top_up_rejects_non_positive_amount() {
    let user = test_user("ama", Role::Client, 0, 0);
    let user_id = user.id;
    let h = harness(InMemoryUsers::with(vec![user]), MockVerifier::default());

    let err = h
        .service
        .top_up(user_id, "PSK-neg", BigDecimal::from_str("-5.00").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn withdrawal_reserves_funds_and_goes_pending() {
    let agent = test_user("kofi", Role::Agent, 0, 5000);
    let agent_id = agent.id;
    let h = harness(InMemoryUsers::with(vec![agent]), MockVerifier::default());

    let outcome = h
        .service
        .withdraw(agent_id, withdraw_ghs("20.00"))
        .await
        .unwrap();

    assert_eq!(outcome.new_payout_balance, 3000);
    assert_eq!(h.users.payout_of(agent_id), 3000);
    assert_eq!(outcome.withdrawal.status, "Pending");
    assert_eq!(
        outcome.withdrawal.amount,
        BigDecimal::from_str("20.00").unwrap()
    );
    assert_eq!(h.withdrawals.all().len(), 1);
}

#[tokio::test]
async fn withdrawal_below_minimum_is_rejected() {
    let agent = test_user("kofi", Role::Agent, 0, 5000);
    let agent_id = agent.id;
    let h = harness(InMemoryUsers::with(vec![agent]), MockVerifier::default());

    let err = h
        .service
        .withdraw(agent_id, withdraw_ghs("5.00"))
        .await
        .unwrap_err();

    match err.kind {
        AppErrorKind::Domain(DomainError::WithdrawalBelowMinimum { minimum, requested }) => {
            assert_eq!(minimum, 1000);
            assert_eq!(requested, 500);
        }
        other => panic!("expected WithdrawalBelowMinimum, got {:?}", other),
    }
    assert_eq!(h.users.payout_of(agent_id), 5000);
    assert!(h.withdrawals.all().is_empty());
}

#[tokio::test]
async fn withdrawal_guard_blocks_overdrawing_the_payout_wallet() {
    let agent = test_user("kofi", Role::Agent, 0, 500);
    let agent_id = agent.id;
    let h = harness(InMemoryUsers::with(vec![agent]), MockVerifier::default());

    let err = h
        .service
        .withdraw(agent_id, withdraw_ghs("10.00"))
        .await
        .unwrap_err();

    match err.kind {
        AppErrorKind::Domain(DomainError::InsufficientFunds {
            wallet, available, ..
        }) => {
            assert_eq!(wallet, WalletKind::Payout);
            assert_eq!(available, 500);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
    assert_eq!(h.users.payout_of(agent_id), 500);
    assert!(h.withdrawals.all().is_empty());
}

#[tokio::test]
async fn withdrawal_requires_account_details() {
    let agent = test_user("kofi", Role::Agent, 0, 5000);
    let agent_id = agent.id;
    let h = harness(InMemoryUsers::with(vec![agent]), MockVerifier::default());

    let mut request = withdraw_ghs("20.00");
    request.account_number = "  ".to_string();
    let err = h.service.withdraw(agent_id, request).await.unwrap_err();

    assert_eq!(err.error_code(), ErrorCode::ValidationError);
    assert_eq!(h.users.payout_of(agent_id), 5000);
}
