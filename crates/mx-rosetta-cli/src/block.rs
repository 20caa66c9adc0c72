// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::common::{format_output, BlockArgs, NetworkArgs, UrlArgs};
use clap::{Parser, Subcommand};
use mx_rosetta::types::{BlockRequest, BlockResponse, NetworkRequest, PartialBlockIdentifier};

/// Block APIs
///
/// Blocks are the ones of the observed shard, by nonce or by hash.
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html)
#[derive(Debug, Subcommand)]
pub enum BlockCommand {
    Get(GetBlockCommand),
    Latest(LatestBlockCommand),
}

impl BlockCommand {
    pub async fn execute(self) -> anyhow::Result<String> {
        match self {
            BlockCommand::Get(inner) => format_output(inner.execute().await),
            BlockCommand::Latest(inner) => format_output(inner.execute().await),
        }
    }
}

/// Get a block by nonce or by hash
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html#block)
#[derive(Debug, Parser)]
pub struct GetBlockCommand {
    #[clap(flatten)]
    block_args: BlockArgs,
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
}

impl GetBlockCommand {
    pub async fn execute(self) -> anyhow::Result<BlockResponse> {
        let request = BlockRequest {
            network_identifier: self.network_args.network_identifier(),
            block_identifier: self.block_args.into(),
        };
        self.url_args.client().block(&request).await
    }
}

/// Get the latest block the server is willing to serve
///
/// This is the block reported by `network status`, which trails the final nonce.
#[derive(Debug, Parser)]
pub struct LatestBlockCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
}

impl LatestBlockCommand {
    pub async fn execute(self) -> anyhow::Result<BlockResponse> {
        let client = self.url_args.client();
        let network_identifier = self.network_args.network_identifier();
        let status = client
            .network_status(&NetworkRequest {
                network_identifier: network_identifier.clone(),
            })
            .await?;
        client
            .block(&BlockRequest {
                network_identifier,
                block_identifier: PartialBlockIdentifier::by_index(
                    status.current_block_identifier.index,
                ),
            })
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::{RosettaCliArgs, RosettaCommand};

    #[test]
    fn test_block_args() {
        let args =
            RosettaCliArgs::try_parse_from(["mx-rosetta-cli", "block", "get", "--index", "42"])
                .unwrap();
        match args.command {
            RosettaCommand::Block(BlockCommand::Get(command)) => {
                let block_identifier: PartialBlockIdentifier = command.block_args.into();
                assert_eq!(PartialBlockIdentifier::by_index(42), block_identifier);
            },
            other => panic!("unexpected command {:?}", other),
        }

        let args = RosettaCliArgs::try_parse_from(["mx-rosetta-cli", "block", "latest"]).unwrap();
        assert!(matches!(
            args.command,
            RosettaCommand::Block(BlockCommand::Latest(_))
        ));

        // The latest block is found through the network status, not by block arguments
        assert!(
            RosettaCliArgs::try_parse_from(["mx-rosetta-cli", "block", "latest", "--index", "1"])
                .is_err()
        );
    }
}
