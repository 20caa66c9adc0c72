// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    common::{decode_address, encode_address},
    error::{ApiError, ApiResult},
};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Account identifier, specified as a bech32 encoded address (`erd1...`)
///
/// [API Spec](https://www.rosetta-api.org/docs/models/AccountIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountIdentifier {
    /// Bech32 encoded address, human readable part `erd`
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<SubAccountIdentifier>,
}

impl AccountIdentifier {
    pub fn new(address: impl Into<String>) -> Self {
        AccountIdentifier {
            address: address.into(),
            sub_account: None,
        }
    }

    /// Convert [`AccountIdentifier`] to the raw 32 byte public key
    pub fn pubkey(&self) -> ApiResult<Vec<u8>> {
        decode_address(&self.address)
    }
}

impl TryFrom<&[u8]> for AccountIdentifier {
    type Error = ApiError;

    fn try_from(pubkey: &[u8]) -> Result<Self, Self::Error> {
        Ok(AccountIdentifier::new(encode_address(pubkey)?))
    }
}

/// Identifier for a block, the nonce of the block on the observed shard and its hash
///
/// [API Spec](https://www.rosetta-api.org/docs/models/BlockIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockIdentifier {
    /// Block nonce, usually known as height
    pub index: u64,
    /// Hex encoded block hash
    pub hash: String,
}

impl BlockIdentifier {
    pub fn new(index: u64, hash: impl Into<String>) -> Self {
        BlockIdentifier {
            index,
            hash: hash.into(),
        }
    }
}

impl TryFrom<&PartialBlockIdentifier> for BlockIdentifier {
    type Error = ApiError;

    fn try_from(block: &PartialBlockIdentifier) -> Result<Self, Self::Error> {
        match (block.index, block.hash.as_ref()) {
            (Some(index), Some(hash)) => Ok(BlockIdentifier::new(index, hash.clone())),
            _ => Err(ApiError::InvalidInputParam(Some(
                "Can't convert partial block identifier to block identifier".to_string(),
            ))),
        }
    }
}

/// Identifier for this specific network deployment
///
/// [API Spec](https://www.rosetta-api.org/docs/models/NetworkIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkIdentifier {
    /// Blockchain name, e.g. `MultiversX`
    pub blockchain: String,
    /// Network name, e.g. `mainnet`
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_network_identifier: Option<SubNetworkIdentifier>,
}

impl NetworkIdentifier {
    pub fn new(blockchain: impl Into<String>, network: impl Into<String>) -> Self {
        NetworkIdentifier {
            blockchain: blockchain.into(),
            network: network.into(),
            sub_network_identifier: None,
        }
    }
}

/// Identifies a specific [`crate::types::Operation`] within a [`crate::types::Transaction`]
///
/// [API Spec](https://www.rosetta-api.org/docs/models/OperationIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationIdentifier {
    /// The unique index of the operation within a transaction
    ///
    /// It must be 0 to n within the transaction.
    pub index: u64,
    /// Only necessary if operation order is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_index: Option<u64>,
}

/// Partial block identifier for querying by index or by hash.  Both should not be
/// provided at the same time.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/PartialBlockIdentifier.html)
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PartialBlockIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PartialBlockIdentifier {
    pub fn latest() -> Self {
        Self {
            index: None,
            hash: None,
        }
    }

    pub fn by_hash(hash: String) -> Self {
        Self {
            index: None,
            hash: Some(hash),
        }
    }

    pub fn by_index(index: u64) -> Self {
        Self {
            index: Some(index),
            hash: None,
        }
    }
}

impl From<&BlockIdentifier> for PartialBlockIdentifier {
    fn from(block: &BlockIdentifier) -> Self {
        PartialBlockIdentifier {
            index: Some(block.index),
            hash: Some(block.hash.clone()),
        }
    }
}

/// Sub account identifier if there are sub accounts
///
/// [API Spec](https://www.rosetta-api.org/docs/models/SubAccountIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubAccountIdentifier {
    pub address: String,
}

/// Sub network identifier if there are sub networks
///
/// [API Spec](https://www.rosetta-api.org/docs/models/SubNetworkIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubNetworkIdentifier {
    pub network: String,
}

/// TransactionIdentifier to represent a transaction by hash
///
/// [API Spec](https://www.rosetta-api.org/docs/models/TransactionIdentifier.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

impl From<&str> for TransactionIdentifier {
    fn from(hash: &str) -> Self {
        TransactionIdentifier {
            hash: hash.to_string(),
        }
    }
}
