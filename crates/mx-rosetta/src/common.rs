// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{ApiError, ApiResult},
    types::NetworkIdentifier,
    RosettaContext,
};
use bech32::{FromBase32, ToBase32, Variant};
use blake2::{digest::consts::U32, Blake2b, Digest};
use futures::future::BoxFuture;
use std::{convert::Infallible, future::Future};
use tracing::debug;
use warp::{Filter, Reply};

/// Human readable part of MultiversX addresses
pub const ADDRESS_HRP: &str = "erd";
pub const PUBKEY_LENGTH: usize = 32;
pub const METACHAIN_SHARD_ID: u32 = u32::MAX;
pub const EMPTY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Smart contract addresses start with this many zero bytes
const NUM_ZERO_BYTES_OF_CONTRACT_ADDRESS: usize = 8;
const NUM_INIT_BYTES_OF_CONTRACT_ADDRESS: usize = 10;
const NUM_INIT_BYTES_OF_METACHAIN_CONTRACT: usize = 5;

type Blake2b256 = Blake2b<U32>;

/// Checks the request network matches the server network
pub fn check_network(
    network_identifier: NetworkIdentifier,
    server_context: &RosettaContext,
) -> ApiResult<()> {
    let expected = server_context.config.network_identifier();
    if network_identifier.blockchain == expected.blockchain
        && network_identifier.network == expected.network
    {
        Ok(())
    } else {
        Err(ApiError::BadNetwork(Some(format!(
            "Expected {}/{}, got {}/{}",
            expected.blockchain,
            expected.network,
            network_identifier.blockchain,
            network_identifier.network
        ))))
    }
}

/// Fails with [`ApiError::OfflineMode`] for endpoints that need the node
pub fn check_online(server_context: &RosettaContext) -> ApiResult<()> {
    if server_context.config.offline {
        Err(ApiError::OfflineMode)
    } else {
        Ok(())
    }
}

/// Provides the context to every handler
pub fn with_context(
    context: RosettaContext,
) -> impl Filter<Extract = (RosettaContext,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}

/// Wraps a handler so that both the response and the error are JSON replies
pub fn handle_request<F, R, Req, Resp>(
    handler: F,
) -> impl Fn(Req, RosettaContext) -> BoxFuture<'static, Result<Box<dyn Reply>, Infallible>> + Clone
where
    F: FnOnce(Req, RosettaContext) -> R + Clone + Copy + Send + 'static,
    R: Future<Output = ApiResult<Resp>> + Send + 'static,
    Req: Send + 'static,
    Resp: serde::Serialize + Send,
{
    move |request, server_context| {
        let fut = async move {
            match handler(request, server_context).await {
                Ok(response) => Ok(Box::new(warp::reply::json(&response)) as Box<dyn Reply>),
                Err(api_error) => {
                    debug!("Request failed: {}", api_error);
                    Ok(Box::new(api_error.into_response()) as Box<dyn Reply>)
                },
            }
        };
        Box::pin(fut)
    }
}

/// Encodes a 32 byte public key as a bech32 `erd1...` address
pub fn encode_address(pubkey: &[u8]) -> ApiResult<String> {
    if pubkey.len() != PUBKEY_LENGTH {
        return Err(ApiError::InvalidAccountAddress(Some(format!(
            "Public key must be {} bytes, got {}",
            PUBKEY_LENGTH,
            pubkey.len()
        ))));
    }

    bech32::encode(ADDRESS_HRP, pubkey.to_base32(), Variant::Bech32)
        .map_err(|err| ApiError::InvalidAccountAddress(Some(err.to_string())))
}

/// Decodes a bech32 `erd1...` address into its 32 byte public key
pub fn decode_address(address: &str) -> ApiResult<Vec<u8>> {
    let (hrp, data, _) = bech32::decode(address)
        .map_err(|err| ApiError::InvalidAccountAddress(Some(format!("{}: {}", address, err))))?;
    if hrp != ADDRESS_HRP {
        return Err(ApiError::InvalidAccountAddress(Some(format!(
            "Unexpected address prefix: {}",
            hrp
        ))));
    }

    let pubkey = Vec::<u8>::from_base32(&data)
        .map_err(|err| ApiError::InvalidAccountAddress(Some(err.to_string())))?;
    if pubkey.len() != PUBKEY_LENGTH {
        return Err(ApiError::InvalidAccountAddress(Some(format!(
            "Address must hold {} bytes, got {}",
            PUBKEY_LENGTH,
            pubkey.len()
        ))));
    }
    Ok(pubkey)
}

/// Smart contract public keys start with 8 zero bytes (the all-zero key included)
pub fn is_smart_contract_pubkey(pubkey: &[u8]) -> bool {
    pubkey.len() > NUM_INIT_BYTES_OF_CONTRACT_ADDRESS
        && pubkey[..NUM_ZERO_BYTES_OF_CONTRACT_ADDRESS]
            .iter()
            .all(|byte| *byte == 0)
}

/// Addresses that cannot be decoded (e.g. `metachain`) are not contracts
pub fn is_smart_contract_address(address: &str) -> bool {
    decode_address(address)
        .map(|pubkey| is_smart_contract_pubkey(&pubkey))
        .unwrap_or(false)
}

/// Assigns public keys to shards, the way the protocol does for a given number of shards
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShardCoordinator {
    num_shards: u32,
    mask_high: u32,
    mask_low: u32,
}

impl ShardCoordinator {
    pub fn new(num_shards: u32) -> Self {
        let num_shards = num_shards.max(1);
        // Number of bits needed to represent every shard
        let n = u32::BITS - (num_shards - 1).leading_zeros();
        let mask_high = (1u32 << n) - 1;
        let mask_low = if n > 0 { (1u32 << (n - 1)) - 1 } else { 0 };
        ShardCoordinator {
            num_shards,
            mask_high,
            mask_low,
        }
    }

    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    pub fn compute_shard(&self, pubkey: &[u8]) -> u32 {
        if pubkey.is_empty() {
            return 0;
        }
        if is_metachain_contract(pubkey) {
            return METACHAIN_SHARD_ID;
        }

        let last = u32::from(pubkey[pubkey.len() - 1]);
        let shard = last & self.mask_high;
        if shard > self.num_shards - 1 {
            last & self.mask_low
        } else {
            shard
        }
    }
}

/// System contracts live on the metachain
fn is_metachain_contract(pubkey: &[u8]) -> bool {
    if pubkey.len() <= NUM_INIT_BYTES_OF_CONTRACT_ADDRESS + NUM_INIT_BYTES_OF_METACHAIN_CONTRACT
        || !is_smart_contract_pubkey(pubkey)
    {
        return false;
    }

    pubkey[NUM_INIT_BYTES_OF_CONTRACT_ADDRESS
        ..NUM_INIT_BYTES_OF_CONTRACT_ADDRESS + NUM_INIT_BYTES_OF_METACHAIN_CONTRACT]
        .iter()
        .all(|byte| *byte == 0)
}

/// Hex encoded blake2b hash, 32 bytes long
pub fn blake2b_256_hex(bytes: &[u8]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn strip_hex_prefix(str: &str) -> &str {
    str.strip_prefix("0x").unwrap_or(str)
}

pub fn decode_hex(str: &str) -> ApiResult<Vec<u8>> {
    Ok(hex::decode(strip_hex_prefix(str))?)
}

/// Flips the sign of a decimal string
pub fn negate_value(value: &str) -> String {
    match value.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{}", value),
    }
}

/// Empty, zero and negative zero values carry no balance change
pub fn is_zero_value(value: &str) -> bool {
    let magnitude = value.strip_prefix('-').unwrap_or(value);
    magnitude.chars().all(|c| c == '0')
}

#[cfg(test)]
mod test {
    use super::*;

    fn pubkey_with_last_byte(last: u8) -> Vec<u8> {
        let mut pubkey = vec![0x42u8; PUBKEY_LENGTH];
        pubkey[PUBKEY_LENGTH - 1] = last;
        pubkey
    }

    #[test]
    fn test_address_round_trip() {
        let pubkey = pubkey_with_last_byte(0xe1);
        let address = encode_address(&pubkey).unwrap();
        assert!(address.starts_with("erd1"));
        assert_eq!(62, address.len());
        assert_eq!(pubkey, decode_address(&address).unwrap());

        let alice = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
        let decoded = decode_address(alice).unwrap();
        assert_eq!(alice, encode_address(&decoded).unwrap());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(decode_address("metachain").is_err());
        assert!(decode_address("").is_err());
        // Wrong checksum
        assert!(
            decode_address("erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6tt")
                .is_err()
        );
        assert!(encode_address(&[1u8; 20]).is_err());
    }

    #[test]
    fn test_smart_contract_address() {
        let contract = "erd1qqqqqqqqqqqqqpgqfejaxfh4ktp8mh8s77pl90dq0uzvh2vk396qlcwepw";
        assert!(is_smart_contract_address(contract));
        assert!(!is_smart_contract_address(
            "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th"
        ));
        assert!(!is_smart_contract_address("metachain"));
        assert!(is_smart_contract_pubkey(&[0u8; 32]));
    }

    #[test]
    fn test_shard_of_three_shards() {
        let coordinator = ShardCoordinator::new(3);
        assert_eq!(0, coordinator.compute_shard(&pubkey_with_last_byte(0x00)));
        assert_eq!(1, coordinator.compute_shard(&pubkey_with_last_byte(0x01)));
        assert_eq!(2, coordinator.compute_shard(&pubkey_with_last_byte(0x02)));
        // 0b11 doesn't exist, falls back on the low mask
        assert_eq!(1, coordinator.compute_shard(&pubkey_with_last_byte(0x03)));
        assert_eq!(1, coordinator.compute_shard(&pubkey_with_last_byte(0xe1)));
        assert_eq!(0, coordinator.compute_shard(&pubkey_with_last_byte(0xf8)));
        assert_eq!(2, coordinator.compute_shard(&pubkey_with_last_byte(0xba)));
    }

    #[test]
    fn test_shard_of_single_shard_and_metachain() {
        let coordinator = ShardCoordinator::new(1);
        assert_eq!(0, coordinator.compute_shard(&pubkey_with_last_byte(0xff)));

        let mut system_contract = vec![0u8; PUBKEY_LENGTH];
        system_contract[PUBKEY_LENGTH - 1] = 0xff;
        system_contract[PUBKEY_LENGTH - 2] = 0xff;
        assert_eq!(
            METACHAIN_SHARD_ID,
            ShardCoordinator::new(3).compute_shard(&system_contract)
        );
    }

    #[test]
    fn test_values() {
        assert_eq!("-10", negate_value("10"));
        assert_eq!("10", negate_value("-10"));
        assert!(is_zero_value(""));
        assert!(is_zero_value("0"));
        assert!(is_zero_value("-0"));
        assert!(!is_zero_value("-1"));
    }

    #[test]
    fn test_blake2b() {
        assert_eq!(64, blake2b_256_hex(b"").len());
        assert_ne!(blake2b_256_hex(b"a"), blake2b_256_hex(b"b"));
    }
}
