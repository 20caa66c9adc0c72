// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::common::{format_output, BlockArgs, NetworkArgs, UrlArgs};
use clap::{Parser, Subcommand};
use mx_rosetta::types::{
    AccountBalanceRequest, AccountBalanceResponse, AccountIdentifier, Currency,
};

/// Account APIs
///
/// Used for pulling state of an account at a point in time
///
/// [API Spec](https://www.rosetta-api.org/docs/AccountApi.html)
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    Balance(AccountBalanceCommand),
}

impl AccountCommand {
    pub async fn execute(self) -> anyhow::Result<String> {
        match self {
            AccountCommand::Balance(inner) => format_output(inner.execute().await),
        }
    }
}

/// Retrieve the balance for an account
///
/// [API Spec](https://www.rosetta-api.org/docs/AccountApi.html#accountbalance)
#[derive(Debug, Parser)]
pub struct AccountBalanceCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    #[clap(flatten)]
    block_args: BlockArgs,
    /// Bech32 address of the account e.g. erd1...
    #[clap(long)]
    address: String,
    /// Currency symbols to report, the native currency when omitted
    #[clap(long = "currency")]
    currencies: Vec<String>,
}

impl AccountBalanceCommand {
    pub async fn execute(self) -> anyhow::Result<AccountBalanceResponse> {
        // The server only looks currencies up by symbol
        let currencies = if self.currencies.is_empty() {
            None
        } else {
            Some(
                self.currencies
                    .into_iter()
                    .map(|symbol| Currency::new(symbol, 0))
                    .collect(),
            )
        };

        self.url_args
            .client()
            .account_balance(&AccountBalanceRequest {
                network_identifier: self.network_args.network_identifier(),
                account_identifier: AccountIdentifier::new(self.address),
                block_identifier: self.block_args.into(),
                currencies,
            })
            .await
    }
}
