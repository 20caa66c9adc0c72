// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Blocks, transactions and accounts as reported by the observer node

use serde::{Deserialize, Deserializer, Serialize};

pub const MINIBLOCK_TYPE_TX: &str = "TxBlock";
pub const MINIBLOCK_TYPE_INVALID: &str = "InvalidBlock";
pub const MINIBLOCK_TYPE_SMART_CONTRACT_RESULT: &str = "SmartContractResultBlock";
pub const MINIBLOCK_TYPE_REWARDS: &str = "RewardsBlock";

pub const PROCESSING_TYPE_NORMAL: &str = "Normal";
pub const PROCESSING_TYPE_SCHEDULED: &str = "Scheduled";
pub const PROCESSING_TYPE_PROCESSED: &str = "Processed";

pub const CONSTRUCTION_STATE_FINAL: &str = "Final";

pub const TX_TYPE_NORMAL: &str = "normal";
pub const TX_TYPE_REWARD: &str = "reward";
pub const TX_TYPE_UNSIGNED: &str = "unsigned";
pub const TX_TYPE_INVALID: &str = "invalid";

pub const TX_STATUS_PENDING: &str = "pending";

/// A block as returned by `/block/by-nonce` and `/block/by-hash`
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub nonce: u64,
    #[serde(default)]
    pub round: u64,
    #[serde(default)]
    pub epoch: u32,
    #[serde(default)]
    pub shard: u32,
    pub hash: String,
    #[serde(default)]
    pub prev_block_hash: String,
    /// Seconds since the UNIX epoch
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mini_blocks: Vec<Miniblock>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Miniblock {
    #[serde(default)]
    pub hash: String,
    #[serde(rename = "type", default)]
    pub miniblock_type: String,
    #[serde(default)]
    pub processing_type: String,
    #[serde(default)]
    pub construction_state: String,
    #[serde(default)]
    pub source_shard: u32,
    #[serde(default)]
    pub destination_shard: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<RawTransaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receipts: Vec<RawReceipt>,
}

impl Miniblock {
    pub fn new(miniblock_type: &str, transactions: Vec<RawTransaction>) -> Self {
        Miniblock {
            miniblock_type: miniblock_type.to_string(),
            transactions,
            ..Default::default()
        }
    }

    pub fn is_normal(&self) -> bool {
        self.processing_type == PROCESSING_TYPE_NORMAL
    }

    pub fn is_scheduled(&self) -> bool {
        self.processing_type == PROCESSING_TYPE_SCHEDULED
    }

    pub fn is_processed(&self) -> bool {
        self.processing_type == PROCESSING_TYPE_PROCESSED
    }

    pub fn is_final(&self) -> bool {
        self.construction_state == CONSTRUCTION_STATE_FINAL
    }

    pub fn is_invalid(&self) -> bool {
        self.miniblock_type == MINIBLOCK_TYPE_INVALID
    }

    pub fn is_smart_contract_results(&self) -> bool {
        self.miniblock_type == MINIBLOCK_TYPE_SMART_CONTRACT_RESULT
    }

    pub fn is_cross_shard(&self) -> bool {
        self.source_shard != self.destination_shard
    }
}

/// A transaction of any kind: user transaction, reward, contract result or invalid transaction
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(rename = "type", default)]
    pub tx_type: String,
    #[serde(default)]
    pub processing_type_on_source: String,
    #[serde(default)]
    pub processing_type_on_destination: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub round: u64,
    #[serde(default)]
    pub epoch: u32,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub gas_price: u64,
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(default, with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    #[serde(default)]
    pub source_shard: u32,
    #[serde(default)]
    pub destination_shard: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub miniblock_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub miniblock_hash: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initially_paid_fee: String,
    #[serde(default)]
    pub is_refund: bool,
    #[serde(default, alias = "relayerAddress", skip_serializing_if = "String::is_empty")]
    pub relayer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relayer_signature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<TransactionLogs>,
}

impl RawTransaction {
    pub fn has_value(&self) -> bool {
        !crate::common::is_zero_value(&self.value)
    }

    pub fn data_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    pub fn events(&self) -> &[TransactionEvent] {
        self.logs
            .as_ref()
            .map(|logs| logs.events.as_slice())
            .unwrap_or(&[])
    }

    /// Relayed V3: the relayer pays the fee
    pub fn fee_payer(&self) -> &str {
        if !self.relayer.is_empty() && !self.relayer_signature.is_empty() {
            &self.relayer
        } else {
            &self.sender
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLogs {
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<TransactionEvent>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default, with = "base64_topics")]
    pub topics: Vec<Vec<u8>>,
    #[serde(default, with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// A receipt, e.g. the gas refund of a move balance transaction
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    /// Emitted as a JSON number of arbitrary size
    #[serde(default = "zero")]
    pub value: serde_json::Number,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub tx_hash: String,
}

impl Default for RawReceipt {
    fn default() -> Self {
        RawReceipt {
            value: zero(),
            sender: String::new(),
            data: String::new(),
            tx_hash: String::new(),
        }
    }
}

fn zero() -> serde_json::Number {
    serde_json::Number::from(0u8)
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(rename = "erd_nonce", default)]
    pub nonce: u64,
    #[serde(rename = "erd_highest_final_nonce", default)]
    pub highest_final_nonce: u64,
    #[serde(rename = "erd_app_version", default)]
    pub app_version: String,
    #[serde(rename = "erd_public_key_block_sign", default)]
    pub public_key: String,
    #[serde(rename = "erd_is_syncing", default)]
    pub is_syncing: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub address: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub username: String,
}

/// Block coordinates of an account query
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub nonce: u64,
    pub hash: String,
    #[serde(default)]
    pub root_hash: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOnBlock {
    pub account: RawAccount,
    pub block_info: BlockInfo,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EsdtBalance {
    #[serde(default)]
    pub token_identifier: String,
    #[serde(default)]
    pub balance: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EsdtBalanceOnBlock {
    pub token_data: EsdtBalance,
    pub block_info: BlockInfo,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBalance {
    pub address: String,
    #[serde(default)]
    pub supply: String,
    #[serde(default)]
    pub balance: String,
}

/// Where to read an account from
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccountQueryOptions {
    OnFinalBlock,
    Latest,
    BlockNonce(u64),
    BlockHash(String),
}

impl AccountQueryOptions {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            AccountQueryOptions::OnFinalBlock => vec![("onFinalBlock", "true".to_string())],
            AccountQueryOptions::Latest => vec![],
            AccountQueryOptions::BlockNonce(nonce) => vec![("blockNonce", nonce.to_string())],
            AccountQueryOptions::BlockHash(hash) => vec![("blockHash", hash.clone())],
        }
    }
}

/// The transaction to broadcast, in the node's JSON layout
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) mod base64_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => base64::decode(encoded).map_err(D::Error::custom),
            None => Ok(vec![]),
        }
    }
}

mod base64_topics {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(topics: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(topics.iter().map(base64::encode))
    }

    /// Empty topics may be reported as `null`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Option::<Vec<Option<String>>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(|topic| match topic {
                Some(encoded) => base64::decode(encoded).map_err(D::Error::custom),
                None => Ok(vec![]),
            })
            .collect()
    }
}
