// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Objects of the Rosetta API
//!
//! [Spec](https://www.rosetta-api.org/docs/api_objects.html)

use crate::{
    common::{is_zero_value, negate_value},
    error::{ApiError, ApiResult},
    types::{
        AccountIdentifier, BlockIdentifier, Error, OperationIdentifier, OperationStatus,
        OperationStatusType, OperationType, TransactionIdentifier,
    },
};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A description of all types used by the Rosetta implementation.
///
/// This is used to verify correctness of the implementation and to check things like
/// operation names, and error names.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Allow.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Allow {
    /// List of all possible operation statuses
    pub operation_statuses: Vec<OperationStatus>,
    /// List of all possible operation types
    pub operation_types: Vec<String>,
    /// List of all possible errors
    pub errors: Vec<Error>,
    /// If the server is allowed to lookup historical balances
    pub historical_balance_lookup: bool,
    /// All call methods supported
    pub call_methods: Vec<String>,
    /// A list of balance exemptions.  These should be as minimal as possible, otherwise it becomes
    /// more complicated for users
    pub balance_exemptions: Vec<BalanceExemption>,
    /// Determines if mempool can change the balance on an account
    /// This should be set to false
    pub mempool_coins: bool,
}

/// Amount of a [`Currency`] in atomic units
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Amount.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Amount {
    /// Value of transaction as a String representation of an integer
    pub value: String,
    /// [`Currency`]
    pub currency: Currency,
}

impl Amount {
    pub fn new(value: impl Into<String>, currency: &Currency) -> Amount {
        Amount {
            value: value.into(),
            currency: currency.clone(),
        }
    }

    /// Signed value of the amount, with arbitrary precision
    pub fn value(&self) -> ApiResult<BigInt> {
        BigInt::from_str(&self.value).map_err(|_| {
            ApiError::MalformedValue(Some(format!("Amount value is invalid: {}", self.value)))
        })
    }

    pub fn is_zero(&self) -> bool {
        is_zero_value(&self.value)
    }
}

/// [API Spec](https://www.rosetta-api.org/docs/models/BalanceExemption.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BalanceExemption {}

/// Representation of a Block for a blockchain.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Block.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Block {
    /// Block identifier of the current block
    pub block_identifier: BlockIdentifier,
    /// Block identifier of the previous block
    pub parent_block_identifier: BlockIdentifier,
    /// Timestamp in milliseconds to the block from the UNIX_EPOCH
    pub timestamp: u64,
    /// Transactions whose balance effects are attributed to this block
    pub transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BlockMetadata>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockMetadata {
    pub shard: u32,
    pub epoch: u32,
    pub round: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Currency represented as atomic units including decimals
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Currency.html)
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Currency {
    /// Symbol of currency, the token identifier for custom currencies
    pub symbol: String,
    /// Number of decimals to be considered in the currency
    #[serde(default)]
    pub decimals: u32,
}

impl Currency {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Currency {
        Currency {
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Signing curves as named by Rosetta.  Only [`CurveType::Edwards25519`] is accepted.
///
/// [API Spec](https://www.rosetta-api.org/docs/models/CurveType.html)
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    Secp256k1,
    Secp256r1,
    Edwards25519,
    Tweedle,
}

/// A representation of a single balance change in a transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Operation.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Operation {
    /// Identifier of an operation within a transaction
    pub operation_identifier: OperationIdentifier,
    /// Operations this one is paired with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_operations: Option<Vec<OperationIdentifier>>,
    /// Type of operation
    #[serde(rename = "type")]
    pub operation_type: String,
    /// Status of operation.  Must be populated if the transaction is in the past.  If submitting
    /// new transactions, it must NOT be populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// AccountIdentifier should be provided to point at which account the change is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    /// Amount in the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
}

impl Operation {
    pub fn new(operation_type: OperationType, address: &str, amount: Amount) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier {
                index: 0,
                network_index: None,
            },
            related_operations: None,
            operation_type: operation_type.to_string(),
            status: None,
            account: Some(AccountIdentifier::new(address)),
            amount: Some(amount),
        }
    }

    /// Balance increase of `value` for `address`
    pub fn credit(
        operation_type: OperationType,
        address: &str,
        value: &str,
        currency: &Currency,
    ) -> Operation {
        Operation::new(operation_type, address, Amount::new(value, currency))
    }

    /// Balance decrease of `value` for `address`
    pub fn debit(
        operation_type: OperationType,
        address: &str,
        value: &str,
        currency: &Currency,
    ) -> Operation {
        Operation::new(
            operation_type,
            address,
            Amount::new(negate_value(value), currency),
        )
    }

    pub fn with_status(mut self, status: OperationStatusType) -> Operation {
        self.status = Some(status.to_string());
        self
    }

    pub fn address(&self) -> Option<&str> {
        self.account.as_ref().map(|account| account.address.as_str())
    }

    pub fn has_zero_amount(&self) -> bool {
        self.amount.as_ref().map(Amount::is_zero).unwrap_or(true)
    }
}

/// Assigns contiguous operation indices, starting at 0
pub fn index_operations(operations: &mut [Operation]) {
    for (i, operation) in operations.iter_mut().enumerate() {
        operation.operation_identifier.index = i as u64;
    }
}

/// Public key used for a transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/models/PublicKey.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicKey {
    /// Hex encoded public key bytes
    pub hex_bytes: String,
    /// Curve type associated with the key
    pub curve_type: CurveType,
}

/// Signature containing the signed payload and the encoded signed payload
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Signature.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Signature {
    /// Payload to be signed
    pub signing_payload: SigningPayload,
    /// Public key related to the signature
    pub public_key: PublicKey,
    /// Cryptographic signature type
    pub signature_type: SignatureType,
    /// Hex bytes of the signature
    pub hex_bytes: String,
}

/// Cryptographic signature type used for signing transactions.  MultiversX only uses
/// [`SignatureType::Ed25519`]
///
/// [API Spec](https://www.rosetta-api.org/docs/models/SignatureType.html)
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureType {
    Ecdsa,
    EcdsaRecovery,
    Ed25519,
}

/// Signing payload should be signed by the client with their own private key
///
/// [API Spec](https://www.rosetta-api.org/docs/models/SigningPayload.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SigningPayload {
    /// Account identifier of the signer
    pub account_identifier: AccountIdentifier,
    /// Hex encoded string of payload bytes to be signed
    pub hex_bytes: String,
    /// Signature type to sign with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
}

/// A representation of a transaction by its balance changing operations
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Transaction.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Transaction {
    /// The identifying hash of the transaction
    pub transaction_identifier: TransactionIdentifier,
    /// Individual balance changes in a transaction
    pub operations: Vec<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TransactionMetadata>,
}

impl Transaction {
    pub fn new(hash: &str, operations: Vec<Operation>) -> Transaction {
        Transaction {
            transaction_identifier: hash.into(),
            operations,
            metadata: None,
        }
    }
}

/// Raw node fields of the transaction, useful to reconcile with explorers
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    #[serde(rename = "type")]
    pub transaction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    pub sender: String,
    pub receiver: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Base64 encoded data field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub source_shard: u32,
    pub destination_shard: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniblock_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniblock_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_type_on_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_type_on_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_transaction_hash: Option<String>,
    pub epoch: u32,
    pub round: u64,
    /// Seconds since the UNIX epoch
    pub timestamp: u64,
}
