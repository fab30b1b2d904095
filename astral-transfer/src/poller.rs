//! Confirms that a transferred NFT arrived on the destination chain.
use astral_types::class::PrefixedClassId;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::PollConfig;
use crate::context::ChainQueryClient;
use crate::query::{query_nft_contract, query_owner};

/// How receipt confirmation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Confirmed { contract: String, owner: String },
    /// The bridge never reported a contract for the class id.
    ContractNotFound { attempts: u32 },
    /// The contract exists but never reported an owner for the token.
    OwnerNotConfirmed { contract: String, attempts: u32 },
    Cancelled,
}

/// Polls the destination bridge for the class contract, then the contract for
/// the token owner. Each phase gets the full attempt budget; query errors
/// count as "not yet". Every query and sleep is raced against the
/// cancellation token, so a pending RPC call never outlives a cancel.
pub struct ReceiptConfirmationPoller<'a> {
    client: &'a dyn ChainQueryClient,
    bridge: &'a str,
    config: &'a PollConfig,
    cancel: &'a CancellationToken,
}

impl<'a> ReceiptConfirmationPoller<'a> {
    pub fn new(
        client: &'a dyn ChainQueryClient,
        bridge: &'a str,
        config: &'a PollConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            bridge,
            config,
            cancel,
        }
    }

    pub async fn confirm(&self, class_id: &PrefixedClassId, token_id: &str) -> ReceiptOutcome {
        let mut contract: Option<String> = None;
        let mut attempt = 0;

        while attempt < self.config.max_attempts {
            if self.cancel.is_cancelled() {
                return ReceiptOutcome::Cancelled;
            }
            attempt += 1;

            match &contract {
                None => {
                    let queried = self
                        .cancel
                        .run_until_cancelled(query_nft_contract(self.client, self.bridge, class_id))
                        .await;
                    match queried {
                        None => return ReceiptOutcome::Cancelled,
                        Some(Ok(Some(found))) => {
                            info!(%class_id, contract = %found, attempt, "destination contract found");
                            contract = Some(found);
                            attempt = 0;
                            continue;
                        }
                        Some(Ok(None)) => {
                            debug!(%class_id, attempt, "destination contract not found yet")
                        }
                        Some(Err(e)) => {
                            debug!(%class_id, attempt, error = %e, "nft_contract query failed")
                        }
                    }
                }
                Some(found) => {
                    let queried = self
                        .cancel
                        .run_until_cancelled(query_owner(self.client, found, token_id))
                        .await;
                    match queried {
                        None => return ReceiptOutcome::Cancelled,
                        Some(Ok(Some(owner))) => {
                            info!(contract = %found, token_id, %owner, attempt, "receipt confirmed");
                            return ReceiptOutcome::Confirmed {
                                contract: found.clone(),
                                owner,
                            };
                        }
                        Some(Ok(None)) => {
                            debug!(contract = %found, token_id, attempt, "owner not reported yet")
                        }
                        Some(Err(e)) => {
                            debug!(contract = %found, token_id, attempt, error = %e, "owner_of query failed")
                        }
                    }
                }
            }

            if attempt < self.config.max_attempts && !self.cancel.sleep(self.config.interval()).await {
                return ReceiptOutcome::Cancelled;
            }
        }

        match contract {
            None => ReceiptOutcome::ContractNotFound { attempts: attempt },
            Some(contract) => ReceiptOutcome::OwnerNotConfirmed {
                contract,
                attempts: attempt,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tokio::time::{Duration, Instant};

    use super::*;
    use crate::testing::FakeChain;

    const BRIDGE: &str = "juno1bridge";
    const CLASS_ID: &str = "wasm.juno1bridge/channel-93/stars1origin";

    fn contract_query() -> Value {
        json!({"nft_contract": {"class_id": CLASS_ID}})
    }

    fn owner_query() -> Value {
        json!({"owner_of": {"token_id": "7"}})
    }

    fn class_id() -> PrefixedClassId {
        CLASS_ID.parse().unwrap()
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_confirms_after_contract_appears() {
        let chain = FakeChain::default();
        chain.respond_after(BRIDGE, contract_query(), json!("juno1voucher"), 3);
        chain.respond_after("juno1voucher", owner_query(), json!({"owner": "juno1receiver", "approvals": []}), 2);

        let config = PollConfig::default();
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let outcome = ReceiptConfirmationPoller::new(&chain, BRIDGE, &config, &cancel)
            .confirm(&class_id(), "7")
            .await;

        assert_eq!(
            outcome,
            ReceiptOutcome::Confirmed {
                contract: "juno1voucher".to_string(),
                owner: "juno1receiver".to_string(),
            }
        );
        assert_eq!(chain.query_count(BRIDGE), 4);
        assert_eq!(chain.query_count("juno1voucher"), 3);
        // five misses in total, each followed by one interval
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_gives_up_when_contract_never_appears() {
        let chain = FakeChain::default();
        chain.respond(BRIDGE, contract_query(), Value::Null);

        let config = PollConfig::default();
        let cancel = CancellationToken::new();
        let outcome = ReceiptConfirmationPoller::new(&chain, BRIDGE, &config, &cancel)
            .confirm(&class_id(), "7")
            .await;

        assert_eq!(outcome, ReceiptOutcome::ContractNotFound { attempts: 60 });
        assert_eq!(chain.query_count(BRIDGE), 60);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_gives_up_when_owner_never_reported() {
        let chain = FakeChain::default();
        chain.respond(BRIDGE, contract_query(), json!("juno1voucher"));

        let config = PollConfig {
            interval_ms: 500,
            max_attempts: 5,
        };
        let cancel = CancellationToken::new();
        let outcome = ReceiptConfirmationPoller::new(&chain, BRIDGE, &config, &cancel)
            .confirm(&class_id(), "7")
            .await;

        assert_eq!(
            outcome,
            ReceiptOutcome::OwnerNotConfirmed {
                contract: "juno1voucher".to_string(),
                attempts: 5,
            }
        );
        assert_eq!(chain.query_count(BRIDGE), 1);
        assert_eq!(chain.query_count("juno1voucher"), 5);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_cancellation_stops_polling() {
        let chain = Arc::new(FakeChain::default());
        chain.respond(BRIDGE, contract_query(), Value::Null);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            canceller.cancel();
        });

        let config = PollConfig::default();
        let outcome = ReceiptConfirmationPoller::new(chain.as_ref(), BRIDGE, &config, &cancel)
            .confirm(&class_id(), "7")
            .await;

        assert_eq!(outcome, ReceiptOutcome::Cancelled);
        assert_eq!(chain.query_count(BRIDGE), 3);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_cancellation_interrupts_a_slow_query() {
        let chain = Arc::new(FakeChain::default());
        chain.respond(BRIDGE, contract_query(), json!("juno1voucher"));
        chain.respond("juno1voucher", owner_query(), json!({"owner": "juno1receiver"}));
        chain.set_query_delay(Duration::from_secs(30));

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let config = PollConfig::default();
        let started = Instant::now();
        let outcome = ReceiptConfirmationPoller::new(chain.as_ref(), BRIDGE, &config, &cancel)
            .confirm(&class_id(), "7")
            .await;

        // the bridge answers only after the cancel, so nothing is confirmed
        assert_eq!(outcome, ReceiptOutcome::Cancelled);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(chain.query_count(BRIDGE), 1);
        assert_eq!(chain.query_count("juno1voucher"), 0);
    }
}
