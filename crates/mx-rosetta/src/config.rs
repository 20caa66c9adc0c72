// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Server configuration, parsed once from the command line and shared read-only

use crate::{
    common::{decode_address, is_smart_contract_pubkey, ShardCoordinator},
    currency::{CurrencyRegistry, NATIVE_CURRENCY_DECIMALS, NATIVE_CURRENCY_SYMBOL},
    types::{BlockIdentifier, Currency, NetworkIdentifier},
};
use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};

pub const DEFAULT_GENESIS_BLOCK_HASH: &str =
    "cd229e4ad2753708e4bab01d7f249affe29441829524c9529e84d51b6d12f2a7";
pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1596117600;
pub const TRANSACTION_VERSION: u32 = 1;

/// MultiversX Rosetta API Server
///
/// Provides an implementation of [Rosetta](https://www.rosetta-api.org/docs/Reference.html)
/// on MultiversX.
#[derive(Debug, Parser)]
#[clap(name = "mx-rosetta", author, version, propagate_version = true)]
pub struct RosettaServerArgs {
    /// Listen address for the server. e.g. 127.0.0.1:8091
    #[clap(long, default_value = "127.0.0.1:8091")]
    pub listen_address: SocketAddr,
    /// Starts in offline mode, only the offline construction endpoints are usable
    #[clap(long)]
    pub offline: bool,
    /// Log filter, e.g. `info` or `mx_rosetta=debug`. `RUST_LOG` takes precedence
    #[clap(long, default_value = "info")]
    pub log_level: String,
    /// URL of the observer node
    #[clap(long, default_value = "http://localhost:8080")]
    pub observer_http_url: url::Url,
    /// Shard of the observer node
    #[clap(long, default_value_t = 0)]
    pub observer_actual_shard: u32,
    /// When set, only addresses whose last public key byte equals this value are observed
    #[clap(long)]
    pub observer_projected_shard: Option<u32>,
    /// Blockchain name e.g. MultiversX
    #[clap(long, default_value = "MultiversX")]
    pub blockchain: String,
    /// Chain ID, e.g. 1, D, T
    #[clap(long, default_value = "1")]
    pub network_id: String,
    /// Network name, e.g. mainnet, devnet, testnet
    #[clap(long, default_value = "mainnet")]
    pub network_name: String,
    /// Number of shards, metachain excluded
    #[clap(long, default_value_t = 3)]
    pub num_shards: u32,
    /// Hash of the genesis block
    #[clap(long, default_value = DEFAULT_GENESIS_BLOCK_HASH)]
    pub genesis_block: String,
    /// Timestamp of the genesis block, in seconds
    #[clap(long, default_value_t = DEFAULT_GENESIS_TIMESTAMP)]
    pub genesis_timestamp: u64,
    /// Minimum gas price for transaction construction
    #[clap(long, default_value_t = 1_000_000_000)]
    pub min_gas_price: u64,
    /// Minimum gas limit for transaction construction
    #[clap(long, default_value_t = 50_000)]
    pub min_gas_limit: u64,
    /// Gas required per data byte
    #[clap(long, default_value_t = 1_500)]
    pub gas_per_data_byte: u64,
    /// Gas price modifier applied to the execution gas
    #[clap(long, default_value_t = 0.01)]
    pub gas_price_modifier: f64,
    /// Gas limit needed to execute a custom currency transfer
    #[clap(long, default_value_t = 200_000)]
    pub gas_limit_custom_transfer: u64,
    /// Symbol of the native currency, EGLD on mainnet
    #[clap(long, default_value = NATIVE_CURRENCY_SYMBOL)]
    pub native_currency: String,
    /// JSON file listing custom currencies as `[{"symbol": "...", "decimals": 0}]`
    #[clap(long)]
    pub config_custom_currencies: Option<PathBuf>,
    /// Report balance changes of smart contracts
    #[clap(long)]
    pub handle_contracts: bool,
    /// Serve blocks that are not yet final
    #[clap(long)]
    pub observe_not_final_blocks: bool,
    /// Path to TLS cert for HTTPS support
    #[clap(long)]
    pub tls_cert_path: Option<PathBuf>,
    /// Path to TLS key for HTTPS support
    #[clap(long)]
    pub tls_key_path: Option<PathBuf>,
    /// Limit to content length on all requests
    #[clap(long)]
    pub content_length_limit: Option<u64>,
}

impl RosettaServerArgs {
    pub fn config(&self) -> RosettaConfig {
        RosettaConfig {
            blockchain: self.blockchain.clone(),
            network_name: self.network_name.clone(),
            network: NetworkConfig {
                chain_id: self.network_id.clone(),
                min_gas_price: self.min_gas_price,
                min_gas_limit: self.min_gas_limit,
                gas_per_data_byte: self.gas_per_data_byte,
                gas_price_modifier: self.gas_price_modifier,
                gas_limit_custom_transfer: self.gas_limit_custom_transfer,
            },
            num_shards: self.num_shards,
            observed_actual_shard: self.observer_actual_shard,
            observed_projected_shard: self.observer_projected_shard,
            genesis_block_hash: self.genesis_block.clone(),
            genesis_timestamp: self.genesis_timestamp,
            handle_contracts: self.handle_contracts,
            offline: self.offline,
            observe_not_final_blocks: self.observe_not_final_blocks,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            address: self.listen_address,
            tls_cert_path: self.tls_cert_path.clone(),
            tls_key_path: self.tls_key_path.clone(),
            content_length_limit: self.content_length_limit,
        }
    }

    pub fn currencies(&self) -> anyhow::Result<CurrencyRegistry> {
        let custom = match &self.config_custom_currencies {
            Some(path) => load_custom_currencies(path)?,
            None => vec![],
        };
        Ok(CurrencyRegistry::new(
            Currency::new(self.native_currency.clone(), NATIVE_CURRENCY_DECIMALS),
            custom,
        ))
    }
}

/// Where and how the HTTP server listens
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiConfig {
    pub address: SocketAddr,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub content_length_limit: Option<u64>,
}

impl ApiConfig {
    pub const DEFAULT_REQUEST_CONTENT_LENGTH_LIMIT: u64 = 8 * 1024 * 1024;

    pub fn content_length_limit(&self) -> u64 {
        self.content_length_limit
            .unwrap_or(Self::DEFAULT_REQUEST_CONTENT_LENGTH_LIMIT)
    }
}

/// Network parameters used for fee computation and transaction construction
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NetworkConfig {
    pub chain_id: String,
    pub min_gas_price: u64,
    pub min_gas_limit: u64,
    pub gas_per_data_byte: u64,
    pub gas_price_modifier: f64,
    pub gas_limit_custom_transfer: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            chain_id: "1".to_string(),
            min_gas_price: 1_000_000_000,
            min_gas_limit: 50_000,
            gas_per_data_byte: 1_500,
            gas_price_modifier: 0.01,
            gas_limit_custom_transfer: 200_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RosettaConfig {
    pub blockchain: String,
    pub network_name: String,
    pub network: NetworkConfig,
    pub num_shards: u32,
    pub observed_actual_shard: u32,
    pub observed_projected_shard: Option<u32>,
    pub genesis_block_hash: String,
    /// Seconds since the UNIX epoch
    pub genesis_timestamp: u64,
    pub handle_contracts: bool,
    pub offline: bool,
    pub observe_not_final_blocks: bool,
}

impl Default for RosettaConfig {
    fn default() -> Self {
        RosettaConfig {
            blockchain: "MultiversX".to_string(),
            network_name: "mainnet".to_string(),
            network: NetworkConfig::default(),
            num_shards: 3,
            observed_actual_shard: 0,
            observed_projected_shard: None,
            genesis_block_hash: DEFAULT_GENESIS_BLOCK_HASH.to_string(),
            genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP,
            handle_contracts: false,
            offline: false,
            observe_not_final_blocks: false,
        }
    }
}

impl RosettaConfig {
    pub fn network_identifier(&self) -> NetworkIdentifier {
        NetworkIdentifier::new(self.blockchain.clone(), self.network_name.clone())
    }

    pub fn genesis_block_identifier(&self) -> BlockIdentifier {
        BlockIdentifier::new(0, self.genesis_block_hash.clone())
    }

    pub fn shard_coordinator(&self) -> ShardCoordinator {
        ShardCoordinator::new(self.num_shards)
    }

    /// Whether balance changes of this address are reported.  Addresses that aren't
    /// valid (e.g. `metachain`) are never observed.
    pub fn is_address_observed(&self, address: &str) -> bool {
        let pubkey = match decode_address(address) {
            Ok(pubkey) => pubkey,
            Err(_) => return false,
        };

        if !self.handle_contracts && is_smart_contract_pubkey(&pubkey) {
            return false;
        }

        if let Some(projected_shard) = self.observed_projected_shard {
            return pubkey
                .last()
                .map(|byte| u32::from(*byte) == projected_shard)
                .unwrap_or(false);
        }

        self.shard_coordinator().compute_shard(&pubkey) == self.observed_actual_shard
    }
}

/// Reads the allow-list of custom currencies.  A missing `decimals` means 0.
pub fn load_custom_currencies(path: &std::path::Path) -> anyhow::Result<Vec<Currency>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read custom currencies from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse custom currencies from {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
    const BOB: &str = "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";
    const CONTRACT_SHARD_0: &str =
        "erd1qqqqqqqqqqqqqpgqagjekf5mxv86hy5c62vvtug5vc6jmgcsq6uq8reras";

    #[test]
    fn test_default_args() {
        let args = RosettaServerArgs::try_parse_from(["mx-rosetta"]).unwrap();
        let config = args.config();
        assert_eq!(RosettaConfig::default(), config);
        assert_eq!("127.0.0.1:8091", args.listen_address.to_string());
        assert_eq!(
            ApiConfig::DEFAULT_REQUEST_CONTENT_LENGTH_LIMIT,
            args.api_config().content_length_limit()
        );
        assert_eq!("EGLD", args.currencies().unwrap().native().symbol);
    }

    #[test]
    fn test_args_override() {
        let args = RosettaServerArgs::try_parse_from([
            "mx-rosetta",
            "--offline",
            "--network-id",
            "D",
            "--network-name",
            "devnet",
            "--native-currency",
            "XeGLD",
            "--observer-projected-shard",
            "2",
        ])
        .unwrap();
        let config = args.config();
        assert!(config.offline);
        assert_eq!("D", config.network.chain_id);
        assert_eq!(Some(2), config.observed_projected_shard);
        assert_eq!("devnet", config.network_identifier().network);
        assert_eq!("XeGLD", args.currencies().unwrap().native().symbol);
    }

    #[test]
    fn test_observed_addresses() {
        let config = RosettaConfig::default();
        assert!(config.is_address_observed(BOB));
        assert!(!config.is_address_observed(ALICE));
        assert!(!config.is_address_observed("metachain"));
        assert!(!config.is_address_observed(CONTRACT_SHARD_0));

        let config = RosettaConfig {
            handle_contracts: true,
            ..Default::default()
        };
        assert!(config.is_address_observed(CONTRACT_SHARD_0));

        let config = RosettaConfig {
            observed_actual_shard: 1,
            ..Default::default()
        };
        assert!(config.is_address_observed(ALICE));
        assert!(!config.is_address_observed(BOB));
    }

    #[test]
    fn test_load_custom_currencies() {
        let path = std::env::temp_dir().join(format!(
            "mx-rosetta-currencies-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"[{"symbol": "ROSETTA-3a2edf", "decimals": 2}, {"symbol": "TEST-abcdef"}]"#,
        )
        .unwrap();

        let currencies = load_custom_currencies(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            vec![
                Currency::new("ROSETTA-3a2edf", 2),
                Currency::new("TEST-abcdef", 0)
            ],
            currencies
        );

        assert!(load_custom_currencies(&path).is_err());
    }
}
