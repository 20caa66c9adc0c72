// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::node::{
    AccountOnBlock, AccountQueryOptions, EsdtBalanceOnBlock, GenesisBalance, NodeAccessor,
    NodeError, NodeStatus, RawBlock, RawTransaction, SignedTransaction,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

/// Every node response is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct NodeResponse<T> {
    data: Option<T>,
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    metrics: NodeStatus,
}

#[derive(Debug, Deserialize)]
struct BlockData {
    block: RawBlock,
}

#[derive(Debug, Deserialize)]
struct GenesisBalancesData {
    balances: Vec<GenesisBalance>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    transaction: RawTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionData {
    tx_hash: String,
}

/// [`NodeAccessor`] backed by the REST API of an observer node
#[derive(Debug)]
pub struct HttpNodeAccessor {
    address: Url,
    inner: ReqwestClient,
    offline: bool,
    genesis_balances: OnceCell<Vec<GenesisBalance>>,
}

impl HttpNodeAccessor {
    pub fn new(address: Url, offline: bool) -> Self {
        HttpNodeAccessor {
            address,
            inner: ReqwestClient::new(),
            offline,
            genesis_balances: OnceCell::new(),
        }
    }

    fn ensure_online(&self) -> Result<(), NodeError> {
        if self.offline {
            Err(NodeError::Offline)
        } else {
            Ok(())
        }
    }

    async fn get<O: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<O, NodeError> {
        self.ensure_online()?;
        let url = self.address.join(path)?;
        debug!("GET {} {:?}", url, query);
        let response = self.inner.get(url).query(query).send().await?;
        Self::unwrap_envelope(response).await
    }

    async fn post<I: Serialize, O: DeserializeOwned>(
        &self,
        path: &str,
        request: &I,
    ) -> Result<O, NodeError> {
        self.ensure_online()?;
        let url = self.address.join(path)?;
        debug!("POST {}", url);
        let response = self.inner.post(url).json(request).send().await?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<O: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<O, NodeError> {
        let status = response.status();
        let envelope: NodeResponse<O> = response.json().await?;
        if !envelope.error.is_empty() {
            warn!("Node request failed: {} ({})", envelope.error, envelope.code);
            return Err(NodeError::Node(format!(
                "{} ({})",
                envelope.error, envelope.code
            )));
        }
        if !status.is_success() {
            warn!("Node request failed with status {}", status);
            return Err(NodeError::Node(format!("status {}", status)));
        }
        envelope
            .data
            .ok_or_else(|| NodeError::Decode("missing data in node response".to_string()))
    }
}

#[async_trait]
impl NodeAccessor for HttpNodeAccessor {
    fn is_offline(&self) -> bool {
        self.offline
    }

    async fn get_node_status(&self) -> Result<NodeStatus, NodeError> {
        let data: StatusData = self.get("node/status", &[]).await?;
        Ok(data.metrics)
    }

    async fn get_block_by_nonce(&self, nonce: u64) -> Result<RawBlock, NodeError> {
        let data: BlockData = self
            .get(&format!("block/by-nonce/{}", nonce), &block_query())
            .await?;
        Ok(data.block)
    }

    async fn get_block_by_hash(&self, hash: &str) -> Result<RawBlock, NodeError> {
        let data: BlockData = self
            .get(&format!("block/by-hash/{}", hash), &block_query())
            .await?;
        Ok(data.block)
    }

    async fn get_account(
        &self,
        address: &str,
        options: &AccountQueryOptions,
    ) -> Result<AccountOnBlock, NodeError> {
        self.get(&format!("address/{}", address), &options.query_params())
            .await
    }

    async fn get_account_esdt_balance(
        &self,
        address: &str,
        token: &str,
        options: &AccountQueryOptions,
    ) -> Result<EsdtBalanceOnBlock, NodeError> {
        self.get(
            &format!("address/{}/esdt/{}", address, token),
            &options.query_params(),
        )
        .await
    }

    async fn get_genesis_balances(&self) -> Result<Vec<GenesisBalance>, NodeError> {
        let balances = self
            .genesis_balances
            .get_or_try_init(|| async {
                let data: GenesisBalancesData = self.get("network/genesis-balances", &[]).await?;
                debug!("Fetched {} genesis balances", data.balances.len());
                Ok::<_, NodeError>(data.balances)
            })
            .await?;
        Ok(balances.clone())
    }

    async fn get_transaction(&self, hash: &str) -> Result<RawTransaction, NodeError> {
        let data: TransactionData = self.get(&format!("transaction/{}", hash), &[]).await?;
        let mut transaction = data.transaction;
        if transaction.hash.is_empty() {
            transaction.hash = hash.to_string();
        }
        Ok(transaction)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, NodeError> {
        let data: SendTransactionData = self.post("transaction/send", tx).await?;
        Ok(data.tx_hash)
    }
}

fn block_query() -> Vec<(&'static str, String)> {
    vec![
        ("withTxs", "true".to_string()),
        ("withLogs", "true".to_string()),
    ]
}
