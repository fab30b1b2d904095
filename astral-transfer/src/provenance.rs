//! Reconstructs the chain-by-chain history of an NFT class from its class id.
use astral_types::class::PrefixedClassId;
use astral_types::error::TransferError;
use astral_types::identifiers::ChainId;
use astral_types::provenance::ProvenanceEntry;
use tracing::debug;

use crate::context::ChainClients;
use crate::query::{query_class_id, query_nft_contract};
use crate::topology::ChannelTopology;

/// Lists the chains `nft_contract` passed through, newest first. The last
/// entry is the chain the class originates from.
pub async fn reconstruct_provenance(
    topology: &ChannelTopology,
    clients: &dyn ChainClients,
    chain_id: &ChainId,
    nft_contract: &str,
) -> Result<Vec<ProvenanceEntry>, TransferError> {
    let mut class_id = match lookup_class_id(topology, clients, chain_id, nft_contract).await? {
        Some(class_id) => class_id,
        None => return Ok(vec![origin_entry(chain_id.clone(), nft_contract.to_string())]),
    };

    let mut entries = Vec::with_capacity(class_id.trace_path.len() + 1);
    let mut chain_id = chain_id.clone();
    let mut contract = nft_contract.to_string();

    while let Some(hop) = class_id.trace_path.first().cloned() {
        let here = topology.endpoint_for_hop(&chain_id, &hop)?;
        let previous = topology.opposite_hop(&here)?;
        debug!(%chain_id, %contract, %class_id, from = %previous.chain_id, "walking class trace");

        entries.push(ProvenanceEntry {
            chain_id,
            nft_contract: contract,
            bridge: here.bridge_address().map(ToString::to_string),
            channel_id: Some(here.channel.clone()),
            is_origin: false,
        });

        class_id.remove_trace_prefix(&hop);
        chain_id = previous.chain_id;
        contract = contract_on_chain(clients, &chain_id, &class_id).await?;
    }

    entries.push(origin_entry(chain_id, contract));
    Ok(entries)
}

fn origin_entry(chain_id: ChainId, nft_contract: String) -> ProvenanceEntry {
    ProvenanceEntry {
        chain_id,
        nft_contract,
        bridge: None,
        channel_id: None,
        is_origin: true,
    }
}

/// Asks every bridge on `chain_id` for the class id of `nft_contract`.
async fn lookup_class_id(
    topology: &ChannelTopology,
    clients: &dyn ChainClients,
    chain_id: &ChainId,
    nft_contract: &str,
) -> Result<Option<PrefixedClassId>, TransferError> {
    let client = clients.client_for(chain_id)?;
    for bridge in topology.bridges_on_chain(chain_id) {
        if let Some(raw) = query_class_id(client.as_ref(), &bridge, nft_contract).await? {
            return Ok(Some(raw.parse()?));
        }
    }
    Ok(None)
}

/// The contract holding `class_id` on `chain_id`. An origin class id is the
/// contract address itself.
async fn contract_on_chain(
    clients: &dyn ChainClients,
    chain_id: &ChainId,
    class_id: &PrefixedClassId,
) -> Result<String, TransferError> {
    let Some(hop) = class_id.trace_path.first() else {
        return Ok(class_id.base_class_id.to_string());
    };
    let bridge = hop
        .port_id
        .contract_address()
        .ok_or_else(|| TransferError::UnsupportedChannel {
            port_id: hop.port_id.clone(),
        })?;

    let client = clients.client_for(chain_id)?;
    query_nft_contract(client.as_ref(), bridge, class_id)
        .await?
        .ok_or_else(|| TransferError::QueryFailed {
            description: format!("no contract for class `{class_id}` on `{chain_id}`"),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::testing::{FakeChain, FakeClients};
    use crate::topology::tests::topology;

    #[tokio::test]
    async fn test_origin_contract_has_single_entry() {
        let stargaze = FakeChain::default();
        stargaze.respond(
            "stars1bridge",
            json!({"class_id": {"contract": "stars1collection"}}),
            Value::Null,
        );
        let clients = FakeClients::default().with("stargaze-1", Arc::new(stargaze));

        let entries = reconstruct_provenance(
            &topology(),
            &clients,
            &"stargaze-1".parse().unwrap(),
            "stars1collection",
        )
        .await
        .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_origin);
        assert_eq!(entries[0].nft_contract, "stars1collection");
    }

    #[tokio::test]
    async fn test_walks_two_hops_back_to_origin() {
        // osmo1collection left osmosis for stargaze, then went on to juno
        let juno = FakeChain::default();
        juno.respond(
            "juno1bridge",
            json!({"class_id": {"contract": "juno1voucher"}}),
            json!("wasm.juno1bridge/channel-93/wasm.stars1bridge/channel-230/osmo1collection"),
        );
        let stargaze = FakeChain::default();
        stargaze.respond(
            "stars1bridge",
            json!({"nft_contract": {"class_id": "wasm.stars1bridge/channel-230/osmo1collection"}}),
            json!("stars1voucher"),
        );
        let clients = FakeClients::default()
            .with("juno-1", Arc::new(juno))
            .with("stargaze-1", Arc::new(stargaze));

        let entries = reconstruct_provenance(
            &topology(),
            &clients,
            &"juno-1".parse().unwrap(),
            "juno1voucher",
        )
        .await
        .unwrap();

        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.chain_id.as_str(), e.nft_contract.as_str(), e.is_origin))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("juno-1", "juno1voucher", false),
                ("stargaze-1", "stars1voucher", false),
                ("osmosis-1", "osmo1collection", true),
            ]
        );
        assert_eq!(entries[0].bridge.as_deref(), Some("juno1bridge"));
        assert_eq!(entries[1].channel_id.as_ref().map(|c| c.as_str()), Some("channel-230"));
    }

    #[tokio::test]
    async fn test_malformed_class_id_aborts() {
        let juno = FakeChain::default();
        juno.respond(
            "juno1bridge",
            json!({"class_id": {"contract": "juno1voucher"}}),
            json!("wasm.juno1bridge//stars1collection"),
        );
        let clients = FakeClients::default().with("juno-1", Arc::new(juno));

        let err = reconstruct_provenance(&topology(), &clients, &"juno-1".parse().unwrap(), "juno1voucher")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::MalformedClassId(_)));
    }

    #[tokio::test]
    async fn test_unknown_hop_aborts() {
        let juno = FakeChain::default();
        juno.respond(
            "juno1bridge",
            json!({"class_id": {"contract": "juno1voucher"}}),
            json!("wasm.juno1bridge/channel-1/stars1collection"),
        );
        let clients = FakeClients::default().with("juno-1", Arc::new(juno));

        let err = reconstruct_provenance(&topology(), &clients, &"juno-1".parse().unwrap(), "juno1voucher")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::UnknownChannel { .. }));
    }
}
