use core::time::Duration;

use astral_testkit::fixtures::{
    chain_id, dummy_address, NetworkConfig, TransferRequestConfig, JUNO, JUNO_BRIDGE, STARGAZE,
    TOKEN_ID,
};
use astral_testkit::relayer::MockRelayBackend;
use astral_transfer::executor::TransferExecutor;
use astral_transfer::types::error::TransferError;
use astral_transfer::types::state::{FailureKind, TransferState};
use tests_integration::Scenario;

/// Submits the default Stargaze to Juno transfer with no relayer running, so
/// the receipt poller gives up.
async fn stalled_transfer(scenario: &Scenario) -> TransferExecutor {
    let mut executor = scenario.executor(STARGAZE, TransferRequestConfig::builder().build());
    let view = executor.submit().await.expect("submit");
    assert_eq!(view.view, TransferState::RequiresSelfRelay);
    executor
}

#[test_log::test(tokio::test(start_paused = true))]
async fn self_relay_delivers_a_stalled_packet() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = stalled_transfer(&scenario).await;
    let backend =
        MockRelayBackend::new(scenario.network.clone()).with_relay_delay(Duration::from_secs(6));

    let view = executor.self_relay(&backend).await.expect("self relay");

    assert_eq!(view.view, TransferState::Complete);
    assert!(!view.can_self_relay);

    let sessions: Vec<_> = backend
        .sessions()
        .into_iter()
        .map(|session| session.chain_id)
        .collect();
    assert_eq!(sessions, vec![chain_id(STARGAZE), chain_id(JUNO)]);

    let juno = scenario.chain(JUNO);
    let voucher = juno
        .contract_for_class(
            JUNO_BRIDGE,
            &executor
                .plan()
                .and_then(|plan| plan.route.as_ref())
                .expect("route")
                .expected_class_id,
        )
        .expect("voucher contract");
    assert_eq!(view.next_url, Some(format!("/my-nfts/{voucher}/{TOKEN_ID}")));
    assert_eq!(
        juno.owner_of(&voucher, TOKEN_ID),
        Some(dummy_address("juno", 2))
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn setup_failure_can_be_retried() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = stalled_transfer(&scenario).await;

    let refusing =
        MockRelayBackend::new(scenario.network.clone()).with_failing_session(chain_id(JUNO));
    let view = executor.self_relay(&refusing).await.expect("self relay");

    assert_eq!(
        view.view,
        TransferState::Error(FailureKind::SelfRelaySetupFailed)
    );
    assert!(view.can_self_relay);
    assert!(view.errors.last().expect("error recorded").contains("juno-1"));

    let backend = MockRelayBackend::new(scenario.network.clone());
    let view = executor.self_relay(&backend).await.expect("second self relay");
    assert_eq!(view.view, TransferState::Complete);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn relay_failure_is_recoverable() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = stalled_transfer(&scenario).await;

    let failing = MockRelayBackend::new(scenario.network.clone()).with_failing_relay("out of gas");
    let view = executor.self_relay(&failing).await.expect("self relay");

    assert_eq!(view.view, TransferState::Error(FailureKind::SelfRelayFailed));
    assert!(view.accepts_self_relay());
    assert!(view.errors.last().expect("error recorded").contains("out of gas"));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn cancelling_self_relay_keeps_the_state() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = stalled_transfer(&scenario).await;
    let backend =
        MockRelayBackend::new(scenario.network.clone()).with_relay_delay(Duration::from_secs(60));

    let token = executor.cancellation_token();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        token.cancel();
    });
    let view = executor.self_relay(&backend).await.expect("self relay");
    canceller.await.expect("canceller task");

    assert_eq!(view.view, TransferState::RequiresSelfRelay);
    assert!(view.can_self_relay);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn self_relay_requires_a_stalled_transfer() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = scenario.executor(STARGAZE, TransferRequestConfig::builder().build());
    let backend = MockRelayBackend::new(scenario.network.clone());

    let err = executor
        .self_relay(&backend)
        .await
        .expect_err("nothing was submitted");

    assert!(matches!(err, TransferError::InvalidTransition { .. }));
    assert!(backend.sessions().is_empty());
}
