//! Shared wiring for the scenario tests: a mock network, executors signing on
//! one of its chains and a background relayer.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

use core::time::Duration;
use std::sync::Arc;

use astral_testkit::fixtures::{chain_id, TransferContextConfig};
use astral_testkit::hosts::{MockChain, MockNetwork};
use astral_transfer::config::TransferConfig;
use astral_transfer::executor::TransferExecutor;
use astral_transfer::types::request::TransferRequest;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Scenario {
    pub network: Arc<MockNetwork>,
}

impl Scenario {
    pub fn new(network: MockNetwork) -> Self {
        Self {
            network: Arc::new(network),
        }
    }

    pub fn chain(&self, id: &str) -> Arc<MockChain> {
        self.network
            .chain(&chain_id(id))
            .expect("chain is part of the scenario network")
    }

    pub fn executor(&self, signer_chain: &str, request: TransferRequest) -> TransferExecutor {
        self.executor_with(signer_chain, request, TransferConfig::default())
    }

    pub fn executor_with(
        &self,
        signer_chain: &str,
        request: TransferRequest,
        config: TransferConfig,
    ) -> TransferExecutor {
        let ctx = TransferContextConfig::builder()
            .network(self.network.clone())
            .signer_chain(chain_id(signer_chain))
            .config(config)
            .build();
        TransferExecutor::new(ctx, request)
    }

    /// Delivers every pending packet once `after` has elapsed, like a live
    /// relayer would.
    pub fn spawn_relayer(&self, after: Duration) -> JoinHandle<()> {
        let network = self.network.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            match network.relay_everything() {
                Ok(relayed) => info!(relayed, "background relayer delivered packets"),
                Err(e) => warn!(error = %e, "background relayer failed"),
            }
        })
    }
}
