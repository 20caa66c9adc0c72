// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::common::{format_output, NetworkArgs, UrlArgs};
use clap::{Parser, Subcommand};
use mx_rosetta::types::{
    MempoolResponse, MempoolTransactionRequest, MempoolTransactionResponse, NetworkRequest,
    TransactionIdentifier,
};

/// Mempool APIs
///
/// [API Spec](https://www.rosetta-api.org/docs/MempoolApi.html)
#[derive(Debug, Subcommand)]
pub enum MempoolCommand {
    List(MempoolListCommand),
    Transaction(MempoolTransactionCommand),
}

impl MempoolCommand {
    pub async fn execute(self) -> anyhow::Result<String> {
        match self {
            MempoolCommand::List(inner) => format_output(inner.execute().await),
            MempoolCommand::Transaction(inner) => format_output(inner.execute().await),
        }
    }
}

/// List pending transactions
#[derive(Debug, Parser)]
pub struct MempoolListCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
}

impl MempoolListCommand {
    pub async fn execute(self) -> anyhow::Result<MempoolResponse> {
        let request = NetworkRequest {
            network_identifier: self.network_args.network_identifier(),
        };
        self.url_args.client().mempool(&request).await
    }
}

/// Get a pending transaction by hash
#[derive(Debug, Parser)]
pub struct MempoolTransactionCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    /// Hex encoded transaction hash
    #[clap(long)]
    hash: String,
}

impl MempoolTransactionCommand {
    pub async fn execute(self) -> anyhow::Result<MempoolTransactionResponse> {
        let request = MempoolTransactionRequest {
            network_identifier: self.network_args.network_identifier(),
            transaction_identifier: TransactionIdentifier { hash: self.hash },
        };
        self.url_args.client().mempool_transaction(&request).await
    }
}
