// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::common::{format_output, NetworkArgs, UrlArgs};
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use ed25519_dalek::{Keypair, PublicKey as Ed25519PublicKey, SecretKey};
use mx_rosetta::types::{
    ConstructionDeriveRequest, ConstructionDeriveResponse, ConstructionHashRequest,
    ConstructionParseRequest, ConstructionParseResponse, Currency, CurveType, PublicKey,
    TransactionIdentifier, TransactionIdentifierResponse,
};
use tracing::info;

/// Construction commands
///
/// At a high level, this provides the full E2E commands provided by the construction API for
/// Rosetta.  This can be used for testing to ensure everything works properly
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html)
#[derive(Debug, Subcommand)]
pub enum ConstructionCommand {
    Derive(DeriveCommand),
    Hash(HashCommand),
    Parse(ParseCommand),
    Transfer(TransferCommand),
}

impl ConstructionCommand {
    pub async fn execute(self) -> anyhow::Result<String> {
        use ConstructionCommand::*;
        match self {
            Derive(inner) => format_output(inner.execute().await),
            Hash(inner) => format_output(inner.execute().await),
            Parse(inner) => format_output(inner.execute().await),
            Transfer(inner) => format_output(inner.execute().await),
        }
    }
}

/// Derives the address of a hex encoded ed25519 public key
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionderive)
#[derive(Debug, Parser)]
pub struct DeriveCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    /// Hex encoded public key
    #[clap(long)]
    public_key: String,
}

impl DeriveCommand {
    pub async fn execute(self) -> anyhow::Result<ConstructionDeriveResponse> {
        self.url_args
            .client()
            .derive(&ConstructionDeriveRequest {
                network_identifier: self.network_args.network_identifier(),
                public_key: PublicKey {
                    hex_bytes: self.public_key,
                    curve_type: CurveType::Edwards25519,
                },
            })
            .await
    }
}

/// Computes the hash of a signed transaction, given as JSON
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionhash)
#[derive(Debug, Parser)]
pub struct HashCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    /// Signed transaction JSON
    #[clap(long)]
    signed_transaction: String,
}

impl HashCommand {
    pub async fn execute(self) -> anyhow::Result<TransactionIdentifierResponse> {
        self.url_args
            .client()
            .hash(&ConstructionHashRequest {
                network_identifier: self.network_args.network_identifier(),
                signed_transaction: self.signed_transaction,
            })
            .await
    }
}

/// Parses a transaction, given as JSON, back into operations
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionparse)
#[derive(Debug, Parser)]
pub struct ParseCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    /// Transaction JSON
    #[clap(long)]
    transaction: String,
    /// Whether the transaction carries a signature
    #[clap(long)]
    signed: bool,
}

impl ParseCommand {
    pub async fn execute(self) -> anyhow::Result<ConstructionParseResponse> {
        self.url_args
            .client()
            .parse(&ConstructionParseRequest {
                network_identifier: self.network_args.network_identifier(),
                signed: self.signed,
                transaction: self.transaction,
            })
            .await
    }
}

/// Transfer coins via Rosetta
///
/// Goes through preprocess, metadata, payloads, combine and submit, checking the parsed
/// transaction along the way
#[derive(Parser)]
pub struct TransferCommand {
    #[clap(flatten)]
    network_args: NetworkArgs,
    #[clap(flatten)]
    url_args: UrlArgs,
    /// Hex encoded ed25519 secret key of the sender
    #[clap(long, env = "MX_ROSETTA_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    /// The receiving account
    #[clap(long)]
    receiver: String,
    /// The amount to send, in the smallest unit
    #[clap(long)]
    amount: String,
    /// Custom currency symbol e.g. ROSETTA-3a2edf, the native currency when omitted
    #[clap(long)]
    currency: Option<String>,
    /// Decimals of the custom currency, as configured on the server
    #[clap(long, default_value_t = 0)]
    decimals: u32,
    #[clap(long)]
    gas_limit: Option<u64>,
    #[clap(long)]
    gas_price: Option<u64>,
}

impl std::fmt::Debug for TransferCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferCommand")
            .field("network_args", &self.network_args)
            .field("url_args", &self.url_args)
            .field("receiver", &self.receiver)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("decimals", &self.decimals)
            .field("gas_limit", &self.gas_limit)
            .field("gas_price", &self.gas_price)
            .finish()
    }
}

impl TransferCommand {
    pub async fn execute(self) -> anyhow::Result<TransactionIdentifier> {
        info!("Transfer {:?}", self);
        let keypair = parse_keypair(&self.private_key)?;
        let decimals = self.decimals;
        let currency = self.currency.map(|symbol| Currency::new(symbol, decimals));

        self.url_args
            .client()
            .transfer(
                &self.network_args.network_identifier(),
                &keypair,
                &self.receiver,
                &self.amount,
                currency,
                self.gas_limit,
                self.gas_price,
            )
            .await
    }
}

fn parse_keypair(private_key: &str) -> anyhow::Result<Keypair> {
    let bytes = hex::decode(private_key.trim())?;
    let secret = SecretKey::from_bytes(&bytes)
        .map_err(|err| anyhow!("Invalid private key: {}", err))?;
    let public = Ed25519PublicKey::from(&secret);
    Ok(Keypair { secret, public })
}
