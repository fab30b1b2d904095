use core::time::Duration;

use astral_testkit::fixtures::{
    chain_id, dummy_address, dummy_directory, dummy_owner, NetworkConfig, TransferRequestConfig,
    COLLECTION, JUNO, JUNO_BRIDGE, STARGAZE,
};
use astral_transfer::cache::CachedDirectory;
use astral_transfer::config::TransferConfig;
use astral_transfer::context::NetworkDirectory;
use astral_transfer::provenance::reconstruct_provenance;
use astral_transfer::types::state::TransferState;
use tests_integration::Scenario;

#[test_log::test(tokio::test(start_paused = true))]
async fn provenance_follows_a_transferred_voucher() {
    let scenario = Scenario::new(NetworkConfig::builder().build());
    let mut executor = scenario.executor(STARGAZE, TransferRequestConfig::builder().build());
    let relayer = scenario.spawn_relayer(Duration::from_secs(1));
    let view = executor.submit().await.expect("submit");
    relayer.await.expect("relayer task");
    assert_eq!(view.view, TransferState::Complete);

    let voucher = executor
        .plan()
        .and_then(|plan| plan.route.as_ref())
        .and_then(|route| {
            scenario
                .chain(JUNO)
                .contract_for_class(JUNO_BRIDGE, &route.expected_class_id)
        })
        .expect("voucher contract");

    let entries = reconstruct_provenance(
        scenario.network.topology(),
        scenario.network.as_ref(),
        &chain_id(JUNO),
        &voucher,
    )
    .await
    .expect("provenance");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].chain_id, chain_id(JUNO));
    assert_eq!(entries[0].nft_contract, voucher);
    assert_eq!(entries[0].bridge.as_deref(), Some(JUNO_BRIDGE));
    assert_eq!(
        entries[0].channel_id.as_ref().map(ToString::to_string).as_deref(),
        Some("channel-93")
    );
    assert!(!entries[0].is_origin);

    assert_eq!(entries[1].chain_id, chain_id(STARGAZE));
    assert_eq!(entries[1].nft_contract, COLLECTION);
    assert!(entries[1].is_origin);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn native_collection_is_its_own_origin() {
    let scenario = Scenario::new(NetworkConfig::builder().build());

    let entries = reconstruct_provenance(
        scenario.network.topology(),
        scenario.network.as_ref(),
        &chain_id(STARGAZE),
        COLLECTION,
    )
    .await
    .expect("provenance");

    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_origin);
    assert_eq!(entries[0].nft_contract, COLLECTION);
    assert_eq!(entries[0].bridge, None);
}

#[tokio::test(start_paused = true)]
async fn cached_directory_resolves_each_prefix_once() {
    // the default configuration caches for five minutes
    let cached = CachedDirectory::from_config(dummy_directory(), &TransferConfig::default());

    let stargaze = cached.chain_for_address(&dummy_owner()).expect("stargaze");
    assert_eq!(stargaze.chain_id, chain_id(STARGAZE));
    cached.chain_for_address(&dummy_address("stars", 9));
    cached.chain_for_address(&dummy_address("juno", 2));
    assert_eq!(cached.inner().address_lookups(), 2);

    tokio::time::advance(Duration::from_secs(301)).await;
    cached.chain_for_address(&dummy_owner());
    assert_eq!(cached.inner().address_lookups(), 3);

    cached.invalidate();
    cached.chain_for_address(&dummy_address("juno", 2));
    assert_eq!(cached.inner().address_lookups(), 4);
}
