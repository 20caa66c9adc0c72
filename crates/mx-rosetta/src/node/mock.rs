// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! In-memory node, used to exercise the services without a network

use crate::node::{
    AccountOnBlock, AccountQueryOptions, BlockInfo, EsdtBalance, EsdtBalanceOnBlock,
    GenesisBalance, NodeAccessor, NodeError, NodeStatus, RawAccount, RawBlock, RawTransaction,
    SignedTransaction,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

/// Shard 1
pub const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
/// Shard 0
pub const BOB: &str = "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";
/// Shard 2
pub const CAROL: &str = "erd1k2s324ww2g0yj38qn2ch2jwctdy8mnfxep94q9arncc6xecg3xaq6mjse8";
/// Shard 0
pub const DAN: &str = "erd1uv40ahysflse896x4ktnh6ecx43u7cmy9wnxnvcyp7deg299a4sq6vaywa";
/// Contract on shard 0
pub const CONTRACT: &str = "erd1qqqqqqqqqqqqqpgqfejaxfh4ktp8mh8s77pl90dq0uzvh2vk396qlcwepw";

#[derive(Debug, Default)]
pub struct MockNodeAccessor {
    pub offline: bool,
    pub status: NodeStatus,
    blocks: Vec<RawBlock>,
    accounts: HashMap<String, RawAccount>,
    esdt_balances: HashMap<(String, String), String>,
    genesis_balances: Vec<GenesisBalance>,
    transactions: HashMap<String, RawTransaction>,
    sent: Mutex<Vec<SignedTransaction>>,
}

impl MockNodeAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        MockNodeAccessor {
            offline: true,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, nonce: u64, highest_final_nonce: u64) -> Self {
        self.status = NodeStatus {
            nonce,
            highest_final_nonce,
            app_version: "v1.6.0".to_string(),
            public_key: "observer".to_string(),
            is_syncing: 0,
        };
        self
    }

    pub fn with_block(mut self, block: RawBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_account(mut self, address: &str, nonce: u64, balance: &str) -> Self {
        self.accounts.insert(address.to_string(), RawAccount {
            address: address.to_string(),
            nonce,
            balance: balance.to_string(),
            username: String::new(),
        });
        self
    }

    pub fn with_esdt_balance(mut self, address: &str, token: &str, balance: &str) -> Self {
        self.esdt_balances.insert(
            (address.to_string(), token.to_string()),
            balance.to_string(),
        );
        self
    }

    pub fn with_genesis_balance(mut self, address: &str, balance: &str) -> Self {
        self.genesis_balances.push(GenesisBalance {
            address: address.to_string(),
            supply: balance.to_string(),
            balance: balance.to_string(),
        });
        self
    }

    pub fn with_transaction(mut self, tx: RawTransaction) -> Self {
        self.transactions.insert(tx.hash.clone(), tx);
        self
    }

    /// Transactions broadcast so far
    pub fn sent(&self) -> Vec<SignedTransaction> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    fn ensure_online(&self) -> Result<(), NodeError> {
        if self.offline {
            Err(NodeError::Offline)
        } else {
            Ok(())
        }
    }

    /// Accounts are the same on every block, reported at the block the options point to
    fn block_info(&self, options: &AccountQueryOptions) -> Result<BlockInfo, NodeError> {
        let block = match options {
            AccountQueryOptions::OnFinalBlock => {
                self.find_block(|block| block.nonce == self.status.highest_final_nonce)
            },
            AccountQueryOptions::Latest => {
                self.find_block(|block| block.nonce == self.status.nonce)
            },
            AccountQueryOptions::BlockNonce(nonce) => {
                self.find_block(|block| block.nonce == *nonce)
            },
            AccountQueryOptions::BlockHash(hash) => self.find_block(|block| &block.hash == hash),
        }?;
        Ok(BlockInfo {
            nonce: block.nonce,
            hash: block.hash.clone(),
            root_hash: String::new(),
        })
    }

    fn find_block(&self, predicate: impl Fn(&RawBlock) -> bool) -> Result<&RawBlock, NodeError> {
        self.blocks
            .iter()
            .find(|block| predicate(block))
            .ok_or_else(|| NodeError::Node("block not found".to_string()))
    }
}

#[async_trait]
impl NodeAccessor for MockNodeAccessor {
    fn is_offline(&self) -> bool {
        self.offline
    }

    async fn get_node_status(&self) -> Result<NodeStatus, NodeError> {
        self.ensure_online()?;
        Ok(self.status.clone())
    }

    async fn get_block_by_nonce(&self, nonce: u64) -> Result<RawBlock, NodeError> {
        self.ensure_online()?;
        self.find_block(|block| block.nonce == nonce).cloned()
    }

    async fn get_block_by_hash(&self, hash: &str) -> Result<RawBlock, NodeError> {
        self.ensure_online()?;
        self.find_block(|block| block.hash == hash).cloned()
    }

    async fn get_account(
        &self,
        address: &str,
        options: &AccountQueryOptions,
    ) -> Result<AccountOnBlock, NodeError> {
        self.ensure_online()?;
        let account = self.accounts.get(address).cloned().unwrap_or(RawAccount {
            address: address.to_string(),
            nonce: 0,
            balance: "0".to_string(),
            username: String::new(),
        });
        Ok(AccountOnBlock {
            account,
            block_info: self.block_info(options)?,
        })
    }

    async fn get_account_esdt_balance(
        &self,
        address: &str,
        token: &str,
        options: &AccountQueryOptions,
    ) -> Result<EsdtBalanceOnBlock, NodeError> {
        self.ensure_online()?;
        let balance = self
            .esdt_balances
            .get(&(address.to_string(), token.to_string()))
            .cloned()
            .unwrap_or_else(|| "0".to_string());
        Ok(EsdtBalanceOnBlock {
            token_data: EsdtBalance {
                token_identifier: token.to_string(),
                balance,
            },
            block_info: self.block_info(options)?,
        })
    }

    async fn get_genesis_balances(&self) -> Result<Vec<GenesisBalance>, NodeError> {
        self.ensure_online()?;
        Ok(self.genesis_balances.clone())
    }

    async fn get_transaction(&self, hash: &str) -> Result<RawTransaction, NodeError> {
        self.ensure_online()?;
        self.transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| NodeError::Node("transaction not found".to_string()))
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, NodeError> {
        self.ensure_online()?;
        let hash = self.compute_transaction_hash(tx)?;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(tx.clone());
        }
        Ok(hash)
    }
}
