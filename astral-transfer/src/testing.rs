//! In-crate test doubles for the collaborator traits.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use astral_types::identifiers::ChainId;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::context::{ChainClients, ChainQueryClient, Coin, ExecuteResponse, FeeMode, Signer};
use crate::error::ClientError;

struct Scripted {
    response: Value,
    /// Queries answered with an error before `response` becomes visible.
    misses: usize,
}

/// A chain answering smart queries from a script and recording executions.
#[derive(Default)]
pub(crate) struct FakeChain {
    responses: Mutex<HashMap<(String, String), Scripted>>,
    queries: Mutex<Vec<(String, Value)>>,
    executions: Mutex<Vec<(String, Value)>>,
    failing_contracts: Mutex<Vec<String>>,
    /// Latency added to every smart query.
    query_delay: Mutex<Duration>,
}

impl FakeChain {
    pub(crate) fn respond(&self, contract: &str, msg: Value, response: Value) {
        self.respond_after(contract, msg, response, 0);
    }

    pub(crate) fn respond_after(&self, contract: &str, msg: Value, response: Value, misses: usize) {
        self.responses.lock().insert(
            (contract.to_string(), msg.to_string()),
            Scripted { response, misses },
        );
    }

    pub(crate) fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock() = delay;
    }

    pub(crate) fn fail_executions_on(&self, contract: &str) {
        self.failing_contracts.lock().push(contract.to_string());
    }

    pub(crate) fn query_count(&self, contract: &str) -> usize {
        self.queries
            .lock()
            .iter()
            .filter(|(queried, _)| queried == contract)
            .count()
    }

    pub(crate) fn executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().clone()
    }
}

#[async_trait]
impl ChainQueryClient for FakeChain {
    async fn query_contract_smart(
        &self,
        contract: &str,
        msg: &Value,
    ) -> Result<Value, ClientError> {
        self.queries.lock().push((contract.to_string(), msg.clone()));
        let delay = *self.query_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.responses.lock();
        match responses.get_mut(&(contract.to_string(), msg.to_string())) {
            Some(scripted) if scripted.misses == 0 => Ok(scripted.response.clone()),
            Some(scripted) => {
                scripted.misses -= 1;
                Err(ClientError::QueryFailed {
                    contract: contract.to_string(),
                    description: "not found".to_string(),
                })
            }
            None => Err(ClientError::QueryFailed {
                contract: contract.to_string(),
                description: format!("no response scripted for {msg}"),
            }),
        }
    }
}

#[async_trait]
impl Signer for FakeChain {
    async fn execute(
        &self,
        _sender: &str,
        contract: &str,
        msg: &Value,
        _fee: &FeeMode,
        _memo: Option<&str>,
        _funds: &[Coin],
    ) -> Result<ExecuteResponse, ClientError> {
        if self.failing_contracts.lock().iter().any(|c| c == contract) {
            return Err(ClientError::ExecuteFailed {
                contract: contract.to_string(),
                description: "rejected by wallet".to_string(),
            });
        }
        let mut executions = self.executions.lock();
        executions.push((contract.to_string(), msg.clone()));
        Ok(ExecuteResponse {
            tx_hash: format!("TX{}", executions.len()),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeClients(pub(crate) HashMap<ChainId, Arc<FakeChain>>);

impl FakeClients {
    pub(crate) fn with(mut self, chain_id: &str, chain: Arc<FakeChain>) -> Self {
        self.0.insert(chain_id.parse().unwrap(), chain);
        self
    }
}

impl ChainClients for FakeClients {
    fn query_client(&self, chain_id: &ChainId) -> Option<Arc<dyn ChainQueryClient>> {
        self.0
            .get(chain_id)
            .map(|chain| -> Arc<dyn ChainQueryClient> { chain.clone() })
    }
}
