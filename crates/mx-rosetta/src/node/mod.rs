// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Access to the observer node.
//!
//! Services only talk to the node through [`NodeAccessor`], so that they can be
//! exercised against an in-memory node in tests.

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod proto;
pub mod types;

pub use types::*;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NodeError {
    #[error("node is not reachable in offline mode")]
    Offline,
    #[error("request to node failed: {0}")]
    Request(String),
    #[error("node returned an error: {0}")]
    Node(String),
    #[error("unable to decode node response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NodeError::Decode(err.to_string())
        } else {
            NodeError::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NodeError {
    fn from(err: url::ParseError) -> Self {
        NodeError::Request(err.to_string())
    }
}

#[async_trait]
pub trait NodeAccessor: Debug + Send + Sync {
    fn is_offline(&self) -> bool;

    async fn get_node_status(&self) -> Result<NodeStatus, NodeError>;

    /// Block with its transactions and logs
    async fn get_block_by_nonce(&self, nonce: u64) -> Result<RawBlock, NodeError>;

    async fn get_block_by_hash(&self, hash: &str) -> Result<RawBlock, NodeError>;

    async fn get_account(
        &self,
        address: &str,
        options: &AccountQueryOptions,
    ) -> Result<AccountOnBlock, NodeError>;

    async fn get_account_esdt_balance(
        &self,
        address: &str,
        token: &str,
        options: &AccountQueryOptions,
    ) -> Result<EsdtBalanceOnBlock, NodeError>;

    /// Balances of the genesis accounts, these never change
    async fn get_genesis_balances(&self) -> Result<Vec<GenesisBalance>, NodeError>;

    async fn get_transaction(&self, hash: &str) -> Result<RawTransaction, NodeError>;

    /// Broadcasts a signed transaction, returning its hash
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, NodeError>;

    /// Hash of a signed transaction, computed locally the same way the node does
    fn compute_transaction_hash(&self, tx: &SignedTransaction) -> Result<String, NodeError> {
        proto::transaction_hash(tx).map_err(|err| NodeError::Decode(err.to_string()))
    }
}
