// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    account::AccountCommand, block::BlockCommand, construction::ConstructionCommand,
    mempool::MempoolCommand, network::NetworkCommand,
};
use clap::{Parser, Subcommand};
use mx_rosetta::{
    client::RosettaClient,
    types::{NetworkIdentifier, PartialBlockIdentifier},
};
use serde::{Deserialize, Serialize};

/// MultiversX Rosetta CLI
#[derive(Debug, Parser)]
#[clap(name = "mx-rosetta-cli", author, version, propagate_version = true)]
pub struct RosettaCliArgs {
    #[clap(subcommand)]
    pub(crate) command: RosettaCommand,
}

impl RosettaCliArgs {
    pub async fn execute(self) -> anyhow::Result<String> {
        self.command.execute().await
    }
}

#[derive(Debug, Subcommand)]
pub enum RosettaCommand {
    #[clap(subcommand)]
    Account(AccountCommand),
    #[clap(subcommand)]
    Block(BlockCommand),
    #[clap(subcommand)]
    Construction(ConstructionCommand),
    #[clap(subcommand)]
    Mempool(MempoolCommand),
    #[clap(subcommand)]
    Network(NetworkCommand),
}

impl RosettaCommand {
    pub async fn execute(self) -> anyhow::Result<String> {
        match self {
            RosettaCommand::Account(inner) => inner.execute().await,
            RosettaCommand::Block(inner) => inner.execute().await,
            RosettaCommand::Construction(inner) => inner.execute().await,
            RosettaCommand::Mempool(inner) => inner.execute().await,
            RosettaCommand::Network(inner) => inner.execute().await,
        }
    }
}

/// Error printed instead of a response
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorWrapper {
    pub error: String,
}

/// Pretty prints a successful response
pub fn format_output<T: Serialize>(input: anyhow::Result<T>) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&input?)?)
}

/// Arguments selecting the network to query
#[derive(Debug, Parser)]
pub struct NetworkArgs {
    /// Blockchain name, as reported by `network list`
    #[clap(long, default_value = "MultiversX")]
    pub blockchain: String,
    /// Network name e.g. mainnet, devnet
    #[clap(long, default_value = "mainnet")]
    pub network: String,
}

impl NetworkArgs {
    pub fn network_identifier(&self) -> NetworkIdentifier {
        NetworkIdentifier::new(self.blockchain.clone(), self.network.clone())
    }
}

/// Where the Rosetta server lives
#[derive(Debug, Parser)]
pub struct UrlArgs {
    /// URL of the Rosetta server e.g. http://localhost:8091
    #[clap(long, env = "ROSETTA_URL", default_value = "http://localhost:8091")]
    rosetta_api_url: url::Url,
}

impl UrlArgs {
    pub fn client(&self) -> RosettaClient {
        RosettaClient::new(self.rosetta_api_url.clone())
    }
}

/// Block to query, by index or by hash
#[derive(Debug, Parser)]
pub struct BlockArgs {
    /// Block index, also known as nonce
    #[clap(long = "index")]
    block_index: Option<u64>,
    /// Block hash
    #[clap(long = "hash")]
    block_hash: Option<String>,
}

impl From<BlockArgs> for PartialBlockIdentifier {
    fn from(args: BlockArgs) -> Self {
        PartialBlockIdentifier {
            index: args.block_index,
            hash: args.block_hash,
        }
    }
}

impl From<BlockArgs> for Option<PartialBlockIdentifier> {
    fn from(args: BlockArgs) -> Self {
        if args.block_index.is_none() && args.block_hash.is_none() {
            None
        } else {
            Some(args.into())
        }
    }
}
