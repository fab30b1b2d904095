use std::collections::{HashMap, HashSet};

use astral_transfer::context::{ChainQueryClient, Coin, ExecuteResponse, FeeMode, Signer};
use astral_transfer::error::ClientError;
use astral_transfer::msgs::IbcOutgoingMsg;
use astral_transfer::types::channel::ChannelEndpoint;
use astral_transfer::types::class::{derive_next_class_id, ClassId, PrefixedClassId};
use astral_transfer::types::identifiers::{ChainId, PortId};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::fixtures::dummy_address;

/// A packet committed by a bridge and not yet relayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingPacket {
    pub sequence: u64,
    pub source: ChannelEndpoint,
    pub class_id: PrefixedClassId,
    pub token_id: String,
    pub receiver: String,
}

/// A transaction the chain accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedTxn {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    pub memo: Option<String>,
    pub tx_hash: String,
}

#[derive(Debug, Default)]
struct Bridge {
    proxy: Option<String>,
    class_ids: HashMap<String, PrefixedClassId>,
    contracts: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct ChainState {
    owners: HashMap<(String, String), String>,
    approvals: HashSet<(String, String, String)>,
    bridges: HashMap<String, Bridge>,
    outbox: Vec<OutgoingPacket>,
    executions: Vec<ExecutedTxn>,
    queries: Vec<String>,
    rejected_contracts: HashSet<String>,
    query_outage: bool,
    next_sequence: u64,
    vouchers: u8,
}

/// An in-memory chain answering the cw721 and cw-ics721 messages the
/// orchestrator sends. Implements both [`Signer`] and [`ChainQueryClient`].
#[derive(Debug)]
pub struct MockChain {
    chain_id: ChainId,
    bech32_prefix: String,
    state: Mutex<ChainState>,
}

fn execute_failed(contract: &str, description: impl Into<String>) -> ClientError {
    ClientError::ExecuteFailed {
        contract: contract.to_string(),
        description: description.into(),
    }
}

fn query_failed(contract: &str, description: impl Into<String>) -> ClientError {
    ClientError::QueryFailed {
        contract: contract.to_string(),
        description: description.into(),
    }
}

/// Splits `{"action": {..}}` into its action name and body.
fn single_key<'a>(contract: &str, msg: &'a Value) -> Result<(&'a str, &'a Map<String, Value>), String> {
    let object = msg
        .as_object()
        .filter(|object| object.len() == 1)
        .ok_or_else(|| format!("{contract}: expected a single-key message, got {msg}"))?;
    object
        .iter()
        .next()
        .and_then(|(action, body)| body.as_object().map(|body| (action.as_str(), body)))
        .ok_or_else(|| format!("{contract}: message body must be an object"))
}

fn field<'a>(body: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    body.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing field `{name}`"))
}

impl MockChain {
    pub fn new(chain_id: ChainId, bech32_prefix: &str) -> Self {
        Self {
            chain_id,
            bech32_prefix: bech32_prefix.to_string(),
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn bech32_prefix(&self) -> &str {
        &self.bech32_prefix
    }

    /// Deploys a bridge contract, optionally guarded by an outgoing proxy.
    pub fn with_bridge(self, bridge: &str, proxy: Option<&str>) -> Self {
        self.state.lock().bridges.insert(
            bridge.to_string(),
            Bridge {
                proxy: proxy.map(ToString::to_string),
                ..Bridge::default()
            },
        );
        self
    }

    pub fn mint(&self, contract: &str, token_id: &str, owner: &str) {
        self.state
            .lock()
            .owners
            .insert((contract.to_string(), token_id.to_string()), owner.to_string());
    }

    /// Records `contract` as the contract `bridge` instantiated for `class_id`.
    pub fn register_class(&self, bridge: &str, contract: &str, class_id: PrefixedClassId) {
        let mut state = self.state.lock();
        let bridge = state.bridges.entry(bridge.to_string()).or_default();
        bridge
            .contracts
            .insert(class_id.to_string(), contract.to_string());
        bridge.class_ids.insert(contract.to_string(), class_id);
    }

    /// The contract `bridge` holds for `class_id`, if it instantiated or
    /// recorded one.
    pub fn contract_for_class(&self, bridge: &str, class_id: &PrefixedClassId) -> Option<String> {
        self.state
            .lock()
            .bridges
            .get(bridge)
            .and_then(|bridge| bridge.contracts.get(&class_id.to_string()))
            .cloned()
    }

    pub fn owner_of(&self, contract: &str, token_id: &str) -> Option<String> {
        self.state
            .lock()
            .owners
            .get(&(contract.to_string(), token_id.to_string()))
            .cloned()
    }

    /// Makes every execution against `contract` fail as if the wallet or the
    /// chain rejected it.
    pub fn reject_executions_on(&self, contract: &str) {
        self.state
            .lock()
            .rejected_contracts
            .insert(contract.to_string());
    }

    /// While set, every query fails.
    pub fn set_query_outage(&self, outage: bool) {
        self.state.lock().query_outage = outage;
    }

    pub fn executions(&self) -> Vec<ExecutedTxn> {
        self.state.lock().executions.clone()
    }

    pub fn query_count(&self, contract: &str) -> usize {
        self.state
            .lock()
            .queries
            .iter()
            .filter(|queried| *queried == contract)
            .count()
    }

    /// Packets committed through `source` and not yet relayed.
    pub fn pending_outgoing(&self, source: &ChannelEndpoint) -> Vec<OutgoingPacket> {
        self.state
            .lock()
            .outbox
            .iter()
            .filter(|packet| &packet.source == source)
            .cloned()
            .collect()
    }

    pub fn take_outgoing(&self, source: &ChannelEndpoint) -> Vec<OutgoingPacket> {
        let mut state = self.state.lock();
        let (taken, kept): (Vec<_>, Vec<_>) = state
            .outbox
            .drain(..)
            .partition(|packet| &packet.source == source);
        state.outbox = kept;
        taken
    }

    /// Applies `packet` arriving through `destination`, minting a voucher or
    /// releasing the escrowed original. Returns the receiving contract.
    pub fn receive_packet(
        &self,
        packet: &OutgoingPacket,
        destination: &ChannelEndpoint,
    ) -> Result<String, String> {
        let bridge_address = destination
            .bridge_address()
            .ok_or_else(|| format!("port `{}` is not bound to a bridge", destination.port))?;
        let source_prefix = packet.source.trace_prefix();
        let next = derive_next_class_id(&packet.class_id, &source_prefix, &destination.trace_prefix());

        let mut state = self.state.lock();
        let returning = packet.class_id.starts_with(&source_prefix);
        let contract = if returning && next.is_origin() {
            next.base_class_id.to_string()
        } else if returning {
            state
                .bridges
                .get(bridge_address)
                .and_then(|bridge| bridge.contracts.get(&next.to_string()))
                .cloned()
                .ok_or_else(|| format!("no contract for returning class `{next}`"))?
        } else {
            state.vouchers = state.vouchers.wrapping_add(1);
            let fresh = dummy_address(&self.bech32_prefix, state.vouchers.wrapping_add(100));
            let bridge = state
                .bridges
                .get_mut(bridge_address)
                .ok_or_else(|| format!("no bridge `{bridge_address}` on {}", self.chain_id))?;
            let contract = bridge
                .contracts
                .entry(next.to_string())
                .or_insert(fresh)
                .clone();
            bridge.class_ids.insert(contract.clone(), next.clone());
            contract
        };

        debug!(chain_id = %self.chain_id, %contract, class_id = %next, token_id = %packet.token_id, "received packet");
        state.owners.insert(
            (contract.clone(), packet.token_id.clone()),
            packet.receiver.clone(),
        );
        Ok(contract)
    }
}

impl ChainState {
    fn owned_by(&self, nft: &str, token_id: &str, sender: &str) -> Result<(), String> {
        match self.owners.get(&(nft.to_string(), token_id.to_string())) {
            Some(owner) if owner == sender => Ok(()),
            Some(_) => Err(format!("`{sender}` does not own token `{token_id}`")),
            None => Err(format!("token `{token_id}` not found")),
        }
    }

    fn proxied_bridge(&self, proxy: &str) -> Option<String> {
        self.bridges
            .iter()
            .find(|(_, bridge)| bridge.proxy.as_deref() == Some(proxy))
            .map(|(address, _)| address.clone())
    }

    /// Escrows or burns the token and queues the outgoing packet.
    fn send_through_bridge(
        &mut self,
        chain_id: &ChainId,
        bridge_address: &str,
        nft: &str,
        token_id: &str,
        encoded: &str,
    ) -> Result<(), String> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid binary: {e}"))?;
        let outgoing: IbcOutgoingMsg =
            serde_json::from_slice(&bytes).map_err(|e| format!("invalid outgoing msg: {e}"))?;

        let bridge = self
            .bridges
            .get_mut(bridge_address)
            .ok_or_else(|| format!("`{bridge_address}` is not a bridge"))?;
        // Native collections are recorded under their own address on first send.
        let class_id = match bridge.class_ids.get(nft) {
            Some(class_id) => class_id.clone(),
            None => {
                let origin =
                    PrefixedClassId::origin(nft.parse::<ClassId>().map_err(|e| e.to_string())?);
                bridge.contracts.insert(origin.to_string(), nft.to_string());
                bridge.class_ids.insert(nft.to_string(), origin.clone());
                origin
            }
        };
        let port = PortId::wasm(bridge_address).map_err(|e| e.to_string())?;
        let source = ChannelEndpoint::new(chain_id.clone(), port, outgoing.channel_id);

        let key = (nft.to_string(), token_id.to_string());
        if class_id.starts_with(&source.trace_prefix()) {
            self.owners.remove(&key);
        } else {
            self.owners.insert(key, bridge_address.to_string());
        }

        self.next_sequence += 1;
        self.outbox.push(OutgoingPacket {
            sequence: self.next_sequence,
            source,
            class_id,
            token_id: token_id.to_string(),
            receiver: outgoing.receiver,
        });
        Ok(())
    }

    fn apply(&mut self, chain_id: &ChainId, sender: &str, contract: &str, msg: &Value) -> Result<(), String> {
        let (action, body) = single_key(contract, msg)?;
        match action {
            "transfer_nft" => {
                let token_id = field(body, "token_id")?;
                self.owned_by(contract, token_id, sender)?;
                self.owners.insert(
                    (contract.to_string(), token_id.to_string()),
                    field(body, "recipient")?.to_string(),
                );
                Ok(())
            }
            "approve" => {
                let token_id = field(body, "token_id")?;
                self.owned_by(contract, token_id, sender)?;
                self.approvals.insert((
                    contract.to_string(),
                    token_id.to_string(),
                    field(body, "spender")?.to_string(),
                ));
                Ok(())
            }
            "send_nft" => match self.proxied_bridge(contract) {
                Some(bridge) => {
                    let nft = field(body, "cw721")?;
                    let token_id = field(body, "token_id")?;
                    self.owned_by(nft, token_id, sender)?;
                    let approval = (nft.to_string(), token_id.to_string(), contract.to_string());
                    if !self.approvals.remove(&approval) {
                        return Err(format!("proxy `{contract}` is not approved for `{token_id}`"));
                    }
                    self.send_through_bridge(chain_id, &bridge, nft, token_id, field(body, "msg")?)
                }
                None => {
                    let bridge = field(body, "contract")?;
                    let token_id = field(body, "token_id")?;
                    self.owned_by(contract, token_id, sender)?;
                    if self.bridges.get(bridge).map_or(false, |b| b.proxy.is_some()) {
                        return Err(format!("bridge `{bridge}` only accepts sends through its proxy"));
                    }
                    self.send_through_bridge(chain_id, bridge, contract, token_id, field(body, "msg")?)
                }
            },
            other => Err(format!("unsupported execute message `{other}`")),
        }
    }

    fn answer(&self, contract: &str, msg: &Value) -> Result<Value, String> {
        let (query, body) = single_key(contract, msg)?;
        let bridge = || {
            self.bridges
                .get(contract)
                .ok_or_else(|| format!("`{contract}` is not a bridge"))
        };
        match query {
            "proxy" => Ok(bridge()?.proxy.clone().map_or(Value::Null, Value::String)),
            "class_id" => Ok(bridge()?
                .class_ids
                .get(field(body, "contract")?)
                .map_or(Value::Null, |class_id| Value::String(class_id.to_string()))),
            "nft_contract" => Ok(bridge()?
                .contracts
                .get(field(body, "class_id")?)
                .cloned()
                .map_or(Value::Null, Value::String)),
            "owner_of" => {
                let token_id = field(body, "token_id")?;
                self.owners
                    .get(&(contract.to_string(), token_id.to_string()))
                    .map(|owner| json!({"owner": owner, "approvals": []}))
                    .ok_or_else(|| format!("token `{token_id}` not found"))
            }
            other => Err(format!("unsupported query `{other}`")),
        }
    }
}

#[async_trait]
impl Signer for MockChain {
    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        _fee: &FeeMode,
        memo: Option<&str>,
        _funds: &[Coin],
    ) -> Result<ExecuteResponse, ClientError> {
        let mut state = self.state.lock();
        if state.rejected_contracts.contains(contract) {
            return Err(execute_failed(contract, "transaction rejected"));
        }
        state
            .apply(&self.chain_id, sender, contract, msg)
            .map_err(|e| execute_failed(contract, e))?;

        let tx_hash = format!("{}-TX{}", self.chain_id, state.executions.len() + 1);
        state.executions.push(ExecutedTxn {
            sender: sender.to_string(),
            contract: contract.to_string(),
            msg: msg.clone(),
            memo: memo.map(ToString::to_string),
            tx_hash: tx_hash.clone(),
        });
        Ok(ExecuteResponse { tx_hash })
    }
}

#[async_trait]
impl ChainQueryClient for MockChain {
    async fn query_contract_smart(&self, contract: &str, msg: &Value) -> Result<Value, ClientError> {
        let mut state = self.state.lock();
        state.queries.push(contract.to_string());
        if state.query_outage {
            return Err(query_failed(contract, "rpc unavailable"));
        }
        state
            .answer(contract, msg)
            .map_err(|e| query_failed(contract, e))
    }
}
