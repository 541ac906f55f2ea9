//! The asynchronous boundary to a contract runtime.
//!
//! Everything the engine needs from the outside world sits behind
//! [`RuntimeClient`]: resolving hash-referenced continuations, loading a
//! contract's current state, and reading the runtime's tip of time. The
//! engine never retries; transport policy belongs to the implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use num_bigint::BigInt;

use covenant_core::{Contract, Label, State};

/// Failure reported by a runtime client implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("runtime transport error: {0}")]
    Transport(String),
    #[error("unknown contract: '{contract_id}'")]
    UnknownContract { contract_id: String },
    #[error("no continuation stored under '{label}'")]
    UnknownContinuation { label: Label },
}

/// Where a contract currently stands on the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractDetails {
    Closed,
    Active { state: State, contract: Contract },
}

/// Asynchronous supplier of runtime data for the applicable-actions
/// engine. Implementations may be network-bound with arbitrary latency;
/// callers cache continuation lookups per session.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Resolve a merkleized continuation by its hash.
    async fn get_contract_continuation(&self, label: &Label) -> Result<Contract, ClientError>;

    /// The current state and pending contract for `contract_id`.
    async fn get_contract_details(&self, contract_id: &str) -> Result<ContractDetails, ClientError>;

    /// The runtime's current tip, in milliseconds.
    async fn get_runtime_tip(&self) -> Result<BigInt, ClientError>;
}

/// A client backed by in-memory maps. Serves tests and scenarios where all
/// runtime data is known ahead of time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    tip: BigInt,
    contracts: BTreeMap<String, ContractDetails>,
    continuations: BTreeMap<Label, Contract>,
}

impl InMemoryClient {
    pub fn new(tip: impl Into<BigInt>) -> InMemoryClient {
        InMemoryClient {
            tip: tip.into(),
            contracts: BTreeMap::new(),
            continuations: BTreeMap::new(),
        }
    }

    pub fn with_contract(mut self, contract_id: impl Into<String>, details: ContractDetails) -> InMemoryClient {
        self.contracts.insert(contract_id.into(), details);
        self
    }

    pub fn with_continuation(mut self, label: Label, contract: Contract) -> InMemoryClient {
        self.continuations.insert(label, contract);
        self
    }
}

#[async_trait]
impl RuntimeClient for InMemoryClient {
    async fn get_contract_continuation(&self, label: &Label) -> Result<Contract, ClientError> {
        self.continuations
            .get(label)
            .cloned()
            .ok_or_else(|| ClientError::UnknownContinuation {
                label: label.clone(),
            })
    }

    async fn get_contract_details(&self, contract_id: &str) -> Result<ContractDetails, ClientError> {
        self.contracts
            .get(contract_id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownContract {
                contract_id: contract_id.to_string(),
            })
    }

    async fn get_runtime_tip(&self) -> Result<BigInt, ClientError> {
        Ok(self.tip.clone())
    }
}
