//! A [Ledger] backed by the JSON-RPC API of a GenLayer node.

use std::sync::OnceLock;

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    rlp::{Encodable, Header},
    sol,
    sol_types::SolCall,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use jsonrpsee::{
    core::client::ClientT,
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::{
    calldata,
    cfg::Network,
    ledger::{Connector, ContractCall, Ledger, TransactionStatus},
};

sol! {
    function addTransaction(
        address _sender,
        address _recipient,
        uint256 _numOfInitialValidators,
        uint256 _maxRotations,
        bytes _txData
    );
}

/// Name under which the node publishes the consensus contract that accepts new transactions.
const CONSENSUS_CONTRACT: &str = "ConsensusMain";

#[derive(Debug, Default, Clone, Copy)]
pub struct RpcConnector;

impl Connector for RpcConnector {
    type Ledger = RpcLedger;

    fn connect(&self, endpoint: &str, account: Address, network: &Network) -> Result<RpcLedger> {
        let client = HttpClientBuilder::default()
            .build(endpoint)
            .with_context(|| format!("invalid endpoint {endpoint:?}"))?;
        Ok(RpcLedger {
            client,
            account,
            network: network.clone(),
            consensus: OnceLock::new(),
        })
    }
}

pub struct RpcLedger {
    client: HttpClient,
    account: Address,
    network: Network,
    /// Set by [Ledger::initialize].
    consensus: OnceLock<Address>,
}

#[derive(Debug, Deserialize)]
struct ConsensusContract {
    address: Address,
}

impl RpcLedger {
    fn consensus(&self) -> Result<Address> {
        self.consensus
            .get()
            .copied()
            .ok_or_else(|| anyhow!("ledger connection has not been initialized"))
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn initialize(&self) -> Result<()> {
        let contract: ConsensusContract = self
            .client
            .request("sim_getConsensusContract", rpc_params![CONSENSUS_CONTRACT])
            .await?;
        debug!(address = %contract.address, network = %self.network.name, "found consensus contract");
        // A concurrent initialization may have got here first; both read the same address.
        let _ = self.consensus.set(contract.address);
        Ok(())
    }

    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash> {
        let data = transaction_data(self.account, call, &self.network);
        let request = json!({
            "from": self.account,
            "to": self.consensus()?,
            "data": format!("0x{}", hex::encode(&data)),
            "value": "0x0",
        });
        let tx: TxHash = self
            .client
            .request("eth_sendTransaction", rpc_params![request])
            .await?;
        Ok(tx)
    }

    async fn transaction_status(&self, tx: &TxHash) -> Result<TransactionStatus> {
        let transaction: Option<Value> = self
            .client
            .request("eth_getTransactionByHash", rpc_params![tx])
            .await?;
        trace!(?transaction, "fetched transaction");
        parse_status(transaction)
    }

    async fn read_contract(&self, call: &ContractCall) -> Result<Value> {
        let request = read_request(self.account, call);
        let result: String = self
            .client
            .request("gen_call", rpc_params![request])
            .await?;
        let bytes = hex::decode(result.strip_prefix("0x").unwrap_or(&result))
            .context("gen_call returned invalid hex")?;
        Ok(calldata::decode(&bytes)?.into_json())
    }
}

/// Encodes the method and string arguments of a call.
pub fn call_data(call: &ContractCall) -> Vec<u8> {
    calldata::encode(&calldata::Value::method_call(
        &call.function,
        call.args.iter().map(|a| calldata::Value::from(a.as_str())),
    ))
}

/// The call data of a call wrapped in an RLP list together with the leader-only flag, which is always off. Nodes
/// expect this framing for reads as well as writes.
pub fn serialized_call(call: &ContractCall) -> Vec<u8> {
    let call_data = call_data(call);
    let leader_only = false;

    let mut out = Vec::new();
    Header {
        list: true,
        payload_length: call_data.as_slice().length() + leader_only.length(),
    }
    .encode(&mut out);
    call_data.as_slice().encode(&mut out);
    leader_only.encode(&mut out);
    out
}

/// Builds the input of the consensus contract's `addTransaction` for a state-changing call.
pub fn transaction_data(sender: Address, call: &ContractCall, network: &Network) -> Vec<u8> {
    addTransactionCall {
        _sender: sender,
        _recipient: call.address,
        _numOfInitialValidators: U256::from(network.initial_validators),
        _maxRotations: U256::from(network.max_rotations),
        _txData: Bytes::from(serialized_call(call)),
    }
    .abi_encode()
}

/// The parameter of a `gen_call` read of `call` on behalf of `sender`.
pub fn read_request(sender: Address, call: &ContractCall) -> Value {
    json!({
        "type": "read",
        "from": sender,
        "to": call.address,
        "data": format!("0x{}", hex::encode(serialized_call(call))),
        "transaction_hash_variant": "latest-nonfinal",
    })
}

/// Reads the status out of a transaction object. Nodes report it either by name or by number, under a few
/// different keys. A missing transaction is [TransactionStatus::Unknown].
pub fn parse_status(transaction: Option<Value>) -> Result<TransactionStatus> {
    let Some(transaction) = transaction.filter(|t| !t.is_null()) else {
        return Ok(TransactionStatus::Unknown);
    };
    let status = ["status_name", "statusName", "status"]
        .iter()
        .find_map(|key| transaction.get(key).filter(|v| !v.is_null()));

    match status {
        Some(Value::String(s)) => s
            .parse::<TransactionStatus>()
            .ok()
            .or_else(|| s.parse::<u8>().ok().and_then(TransactionStatus::from_repr))
            .ok_or_else(|| anyhow!("unknown transaction status {s:?}")),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(TransactionStatus::from_repr)
            .ok_or_else(|| anyhow!("unknown transaction status {n}")),
        _ => Err(anyhow!("transaction has no status")),
    }
}
