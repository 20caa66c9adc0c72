// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Protobuf encodings the node hashes transactions and receipts over.
//!
//! Field tags follow the node's `Transaction` and `Receipt` messages.  Big
//! integers are prefixed by a sign byte, and zero is encoded as two zero bytes.

use crate::{
    common::{blake2b_256_hex, decode_address, decode_hex},
    error::{ApiError, ApiResult},
    node::{RawReceipt, SignedTransaction},
};
use num_bigint::BigUint;
use prost::Message;

#[derive(Clone, PartialEq, Message)]
struct TransactionMessage {
    #[prost(uint64, tag = "1")]
    nonce: u64,
    #[prost(bytes = "vec", tag = "2")]
    value: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    receiver: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    receiver_username: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    sender: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    sender_username: Vec<u8>,
    #[prost(uint64, tag = "7")]
    gas_price: u64,
    #[prost(uint64, tag = "8")]
    gas_limit: u64,
    #[prost(bytes = "vec", tag = "9")]
    data: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    chain_id: Vec<u8>,
    #[prost(uint32, tag = "11")]
    version: u32,
    #[prost(bytes = "vec", tag = "12")]
    signature: Vec<u8>,
    #[prost(uint32, tag = "13")]
    options: u32,
}

#[derive(Clone, PartialEq, Message)]
struct ReceiptMessage {
    #[prost(bytes = "vec", tag = "1")]
    value: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    sender: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    data: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    tx_hash: Vec<u8>,
}

/// Hash of a signed transaction, as the node computes it
pub fn transaction_hash(tx: &SignedTransaction) -> ApiResult<String> {
    Ok(blake2b_256_hex(&encode_transaction(tx)?))
}

/// Hash of a receipt, as the node would compute it
pub fn receipt_hash(receipt: &RawReceipt) -> ApiResult<String> {
    Ok(blake2b_256_hex(&encode_receipt(receipt)?))
}

fn encode_transaction(tx: &SignedTransaction) -> ApiResult<Vec<u8>> {
    let message = TransactionMessage {
        nonce: tx.nonce,
        value: encode_big_uint(&tx.value)?,
        receiver: decode_address(&tx.receiver)?,
        receiver_username: vec![],
        sender: decode_address(&tx.sender)?,
        sender_username: vec![],
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        data: tx.data.clone(),
        chain_id: tx.chain_id.as_bytes().to_vec(),
        version: tx.version,
        signature: decode_hex(&tx.signature)?,
        options: 0,
    };
    Ok(message.encode_to_vec())
}

fn encode_receipt(receipt: &RawReceipt) -> ApiResult<Vec<u8>> {
    let message = ReceiptMessage {
        value: encode_big_uint(&receipt.value.to_string())?,
        sender: decode_address(&receipt.sender)?,
        data: receipt.data.as_bytes().to_vec(),
        tx_hash: decode_hex(&receipt.tx_hash)?,
    };
    Ok(message.encode_to_vec())
}

fn encode_big_uint(value: &str) -> ApiResult<Vec<u8>> {
    if value.is_empty() {
        return Ok(vec![0, 0]);
    }
    let value: BigUint = value
        .parse()
        .map_err(|_| ApiError::MalformedValue(Some(format!("Invalid value: {}", value))))?;

    let mut bytes = vec![0];
    if value != BigUint::default() {
        bytes.extend(value.to_bytes_be());
    } else {
        bytes.push(0);
    }
    Ok(bytes)
}
