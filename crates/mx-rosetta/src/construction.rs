// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Construction APIs
//!
//! The construction APIs break down transactions into composable parts that are
//! used to be generic across blockchains.  A flow of operations can be found
//! in the [specifications](https://www.rosetta-api.org/docs/construction_api_introduction.html)
//!
//! This is broken down in the following flow:
//!
//! * Preprocess (based on operations) gets the sender, receiver, amount and currency of a transfer
//! * Metadata fetches the sender's nonce and estimates gas and fee
//! * Payloads generates an unsigned transaction
//! * Application outside signs the payload from the transaction
//! * Combine puts the signature into the unsigned transaction
//! * Submit broadcasts the signed transaction through the observer
//!
//! There are also 2 other sometimes used APIs
//! * Derive (get an address from the public key)
//! * Hash (get a hash of the transaction to lookup in mempool)
//!
//! Note: there is an "online" mode and an "offline" mode.  Only metadata and submit
//! need a connection to the observer node.
//!
//! Transactions travel between these steps as their JSON representation, the same one
//! the node accepts on `/transaction/send`.  Transfers of custom currencies are native
//! transactions of value 0 whose data is `ESDTTransfer@<token>@<amount>`.

use crate::{
    common::{
        check_network, check_online, decode_address, decode_hex, encode_address,
        handle_request, with_context, PUBKEY_LENGTH,
    },
    config::TRANSACTION_VERSION,
    currency::CurrencyRegistry,
    error::{ApiError, ApiResult},
    fee::{estimate_fee, parse_max_fee, FeeRequest},
    node::{AccountQueryOptions, SignedTransaction},
    types::*,
    RosettaContext,
};
use ed25519_dalek::Verifier;
use num_bigint::BigUint;
use std::str::FromStr;
use tracing::debug;
use warp::Filter;

const ESDT_TRANSFER_FUNCTION: &str = "ESDTTransfer";
const ED25519_SIGNATURE_LENGTH: usize = 64;

pub fn combine_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "combine")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_combine))
}

pub fn derive_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "derive")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_derive))
}

pub fn hash_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "hash")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_hash))
}

pub fn metadata_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "metadata")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_metadata))
}

pub fn parse_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "parse")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_parse))
}

pub fn payloads_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "payloads")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_payloads))
}

pub fn preprocess_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "preprocess")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_preprocess))
}

pub fn submit_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("construction" / "submit")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(construction_submit))
}

/// Construction combine command (OFFLINE)
///
/// This combines signatures, and a raw txn
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructioncombine)
async fn construction_combine(
    request: ConstructionCombineRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionCombineResponse> {
    debug!("/construction/combine {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let mut tx: SignedTransaction = serde_json::from_str(&request.unsigned_transaction)?;

    if request.signatures.len() != 1 {
        return Err(ApiError::InvalidInputParam(Some(format!(
            "Expected exactly one signature, got {}",
            request.signatures.len()
        ))));
    }
    let signature = &request.signatures[0];
    if signature.signature_type != SignatureType::Ed25519 {
        return Err(ApiError::InvalidInputParam(Some(format!(
            "Unsupported signature type {:?}",
            signature.signature_type
        ))));
    }

    let signature_bytes = decode_hex(&signature.hex_bytes)?;
    if signature_bytes.len() != ED25519_SIGNATURE_LENGTH {
        return Err(ApiError::InvalidInputParam(Some(format!(
            "Signature must be {} bytes, got {}",
            ED25519_SIGNATURE_LENGTH,
            signature_bytes.len()
        ))));
    }

    verify_signature(
        &tx.sender,
        &signature.public_key,
        request.unsigned_transaction.as_bytes(),
        &signature_bytes,
    )?;

    tx.signature = hex::encode(&signature_bytes);
    Ok(ConstructionCombineResponse {
        signed_transaction: serde_json::to_string(&tx)?,
    })
}

/// Checks the signature was made by the sender, over the unsigned transaction
fn verify_signature(
    sender: &str,
    public_key: &PublicKey,
    message: &[u8],
    signature_bytes: &[u8],
) -> ApiResult<()> {
    if public_key.curve_type != CurveType::Edwards25519 {
        return Err(ApiError::UnsupportedCurveType(Some(format!(
            "{:?}",
            public_key.curve_type
        ))));
    }

    let pubkey_bytes = decode_hex(&public_key.hex_bytes)?;
    if encode_address(&pubkey_bytes)? != sender {
        return Err(ApiError::InvalidInputParam(Some(format!(
            "Signer is not the sender {}",
            sender
        ))));
    }

    let public_key = ed25519_dalek::PublicKey::from_bytes(&pubkey_bytes)
        .map_err(|err| ApiError::InvalidInputParam(Some(err.to_string())))?;
    let signature = ed25519_dalek::Signature::try_from(signature_bytes)
        .map_err(|err| ApiError::InvalidInputParam(Some(err.to_string())))?;
    public_key
        .verify(message, &signature)
        .map_err(|_| ApiError::InvalidInputParam(Some("Invalid signature".to_string())))
}

/// Construction derive command (OFFLINE)
///
/// Derive the address from the public key
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionderive)
async fn construction_derive(
    request: ConstructionDeriveRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionDeriveResponse> {
    debug!("/construction/derive {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let public_key = request.public_key;
    if public_key.curve_type != CurveType::Edwards25519 {
        return Err(ApiError::UnsupportedCurveType(Some(format!(
            "{:?}",
            public_key.curve_type
        ))));
    }

    let pubkey_bytes = decode_hex(&public_key.hex_bytes)?;
    if pubkey_bytes.len() != PUBKEY_LENGTH {
        return Err(ApiError::UnsupportedCurveType(Some(format!(
            "Edwards25519 keys must be {} bytes, got {}",
            PUBKEY_LENGTH,
            pubkey_bytes.len()
        ))));
    }

    Ok(ConstructionDeriveResponse {
        account_identifier: AccountIdentifier::new(encode_address(&pubkey_bytes)?),
    })
}

/// Construction hash command (OFFLINE)
///
/// Hash a signed transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionhash)
async fn construction_hash(
    request: ConstructionHashRequest,
    server_context: RosettaContext,
) -> ApiResult<TransactionIdentifierResponse> {
    debug!("/construction/hash {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let tx: SignedTransaction = serde_json::from_str(&request.signed_transaction)?;
    let hash = server_context
        .node
        .compute_transaction_hash(&tx)
        .map_err(|err| ApiError::MalformedValue(Some(err.to_string())))?;

    Ok(TransactionIdentifierResponse {
        transaction_identifier: hash.as_str().into(),
    })
}

/// Construction metadata command
///
/// Retrieve the sender's nonce, and estimate the gas and fee of the transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionmetadata)
async fn construction_metadata(
    request: ConstructionMetadataRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionMetadataResponse> {
    debug!("/construction/metadata {:?}", request);
    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let options = request.options;
    let transfer = Transfer::from_options(&options, &server_context.currencies)?;

    let account = server_context
        .node
        .get_account(&transfer.sender, &AccountQueryOptions::OnFinalBlock)
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetAccount))?
        .account;

    let data = if transfer.is_custom {
        custom_transfer_data(&transfer.currency_symbol, &transfer.amount)
    } else {
        options.data.clone().unwrap_or_default()
    };

    let fee_request = FeeRequest {
        gas_limit: options.gas_limit,
        gas_price: options.gas_price,
        max_fee: options.max_fee.as_deref().map(parse_max_fee).transpose()?,
        fee_multiplier: options.fee_multiplier,
        is_custom_transfer: transfer.is_custom,
    };
    let estimate = estimate_fee(&server_context.config.network, &fee_request, data.len())?;

    let metadata = ConstructionMetadata {
        sender: transfer.sender,
        receiver: transfer.receiver,
        nonce: account.nonce,
        amount: transfer.amount.to_string(),
        currency_symbol: transfer.currency_symbol,
        gas_limit: estimate.gas_limit,
        gas_price: estimate.gas_price,
        data,
        chain_id: server_context.config.network.chain_id.clone(),
        version: TRANSACTION_VERSION,
    };

    Ok(ConstructionMetadataResponse {
        metadata,
        suggested_fee: Some(vec![server_context
            .currencies
            .native_amount(estimate.fee.to_string())]),
    })
}

/// Construction parse command (OFFLINE)
///
/// Parses operations from an unsigned or signed transaction
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionparse)
async fn construction_parse(
    request: ConstructionParseRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionParseResponse> {
    debug!("/construction/parse {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let tx: SignedTransaction = serde_json::from_str(&request.transaction)?;

    let (operation_type, value, currency) =
        match parse_custom_transfer_data(&tx.data, &server_context.currencies)? {
            Some((currency, amount)) => {
                (OperationType::CustomTransfer, amount.to_string(), currency)
            },
            None => (
                OperationType::Transfer,
                tx.value.clone(),
                server_context.currencies.native().clone(),
            ),
        };

    let mut operations = vec![
        Operation::debit(operation_type, &tx.sender, &value, &currency),
        Operation::credit(operation_type, &tx.receiver, &value, &currency),
    ];
    index_operations(&mut operations);

    let account_identifier_signers = if request.signed {
        Some(vec![AccountIdentifier::new(tx.sender.clone())])
    } else {
        None
    };

    Ok(ConstructionParseResponse {
        operations,
        account_identifier_signers,
    })
}

/// Construction payloads command (OFFLINE)
///
/// Constructs payloads for given known operations
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionpayloads)
async fn construction_payloads(
    request: ConstructionPayloadsRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionPayloadsResponse> {
    debug!("/construction/payloads {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let metadata = request
        .metadata
        .ok_or_else(|| ApiError::Construction(Some("Metadata is required".to_string())))?;

    let is_custom = !server_context
        .currencies
        .is_native(&metadata.currency_symbol);
    let value = if is_custom {
        "0".to_string()
    } else {
        metadata.amount.clone()
    };

    let tx = SignedTransaction {
        nonce: metadata.nonce,
        value,
        receiver: metadata.receiver,
        sender: metadata.sender.clone(),
        gas_price: metadata.gas_price,
        gas_limit: metadata.gas_limit,
        data: metadata.data.into_bytes(),
        chain_id: metadata.chain_id,
        version: metadata.version,
        signature: String::new(),
    };
    let unsigned_transaction = serde_json::to_string(&tx)?;

    let signing_payload = SigningPayload {
        account_identifier: AccountIdentifier::new(metadata.sender),
        hex_bytes: hex::encode(unsigned_transaction.as_bytes()),
        signature_type: Some(SignatureType::Ed25519),
    };

    Ok(ConstructionPayloadsResponse {
        unsigned_transaction,
        payloads: vec![signing_payload],
    })
}

/// Construction preprocess command (OFFLINE)
///
/// This creates the request needed to fetch metadata
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionpreprocess)
async fn construction_preprocess(
    request: ConstructionPreprocessRequest,
    server_context: RosettaContext,
) -> ApiResult<ConstructionPreprocessResponse> {
    debug!("/construction/preprocess {:?}", request);
    check_network(request.network_identifier, &server_context)?;

    let options = fill_options_from_operations(
        request.metadata.unwrap_or_default(),
        &request.operations,
    );
    let transfer = Transfer::from_options(&options, &server_context.currencies)?;

    Ok(ConstructionPreprocessResponse {
        options,
        required_public_keys: Some(vec![AccountIdentifier::new(transfer.sender)]),
    })
}

/// Construction submit command
///
/// Submits a signed transaction to the network
///
/// [API Spec](https://www.rosetta-api.org/docs/ConstructionApi.html#constructionsubmit)
async fn construction_submit(
    request: ConstructionSubmitRequest,
    server_context: RosettaContext,
) -> ApiResult<TransactionIdentifierResponse> {
    debug!("/construction/submit {:?}", request);
    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let tx: SignedTransaction = serde_json::from_str(&request.signed_transaction)?;
    let hash = server_context
        .node
        .send_transaction(&tx)
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToSubmitTransaction))?;

    Ok(TransactionIdentifierResponse {
        transaction_identifier: hash.as_str().into(),
    })
}

/// A validated transfer, as described by construction options
#[derive(Clone, Debug, Eq, PartialEq)]
struct Transfer {
    sender: String,
    receiver: String,
    amount: BigUint,
    currency_symbol: String,
    is_custom: bool,
}

impl Transfer {
    fn from_options(
        options: &ConstructionOptions,
        currencies: &CurrencyRegistry,
    ) -> ApiResult<Transfer> {
        let sender = required(&options.sender, "sender")?;
        let receiver = required(&options.receiver, "receiver")?;
        decode_address(&sender)?;
        decode_address(&receiver)?;

        let amount = required(&options.amount, "amount")?;
        let amount = BigUint::from_str(&amount).map_err(|_| {
            ApiError::Construction(Some(format!("Invalid amount {}", amount)))
        })?;
        if amount == BigUint::default() {
            return Err(ApiError::Construction(Some(
                "Amount must not be zero".to_string(),
            )));
        }

        let currency_symbol = required(&options.currency_symbol, "currencySymbol")?;
        let is_custom = !currencies.is_native(&currency_symbol);
        if is_custom {
            if !currencies.has_custom(&currency_symbol) {
                return Err(ApiError::Construction(Some(format!(
                    "Unknown currency {}",
                    currency_symbol
                ))));
            }
            if options.data.as_deref().is_some_and(|data| !data.is_empty()) {
                return Err(ApiError::Construction(Some(
                    "Data is not allowed with custom currency transfers".to_string(),
                )));
            }
        }

        Ok(Transfer {
            sender,
            receiver,
            amount,
            currency_symbol,
            is_custom,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> ApiResult<String> {
    value
        .as_ref()
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| ApiError::Construction(Some(format!("Missing {}", name))))
}

/// The first operation is the debit of the sender, the second the credit of the receiver
fn fill_options_from_operations(
    mut options: ConstructionOptions,
    operations: &[Operation],
) -> ConstructionOptions {
    let debit = operations.first();
    let credit = operations.get(1);

    if options.sender.is_none() {
        options.sender = debit.and_then(Operation::address).map(str::to_string);
    }
    if options.receiver.is_none() {
        options.receiver = credit.and_then(Operation::address).map(str::to_string);
    }

    let debit_amount = debit.and_then(|operation| operation.amount.as_ref());
    if options.amount.is_none() {
        options.amount = debit_amount.map(|amount| {
            amount
                .value
                .strip_prefix('-')
                .unwrap_or(&amount.value)
                .to_string()
        });
    }
    if options.currency_symbol.is_none() {
        options.currency_symbol = debit_amount.map(|amount| amount.currency.symbol.clone());
    }
    options
}

fn custom_transfer_data(token: &str, amount: &BigUint) -> String {
    format!(
        "{}@{}@{}",
        ESDT_TRANSFER_FUNCTION,
        hex::encode(token),
        even_length_hex(amount)
    )
}

fn even_length_hex(value: &BigUint) -> String {
    let hex = value.to_str_radix(16);
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else {
        hex
    }
}

/// Token and amount of an `ESDTTransfer@<token>@<amount>` call, `None` for any other data.
/// Only tokens of the currency registry are accepted.
fn parse_custom_transfer_data(
    data: &[u8],
    currencies: &CurrencyRegistry,
) -> ApiResult<Option<(Currency, BigUint)>> {
    let Some((token, amount)) = split_custom_transfer_data(data) else {
        return Ok(None);
    };

    let currency = currencies.custom(&token).cloned().ok_or_else(|| {
        ApiError::Construction(Some(format!("Unsupported custom currency: {}", token)))
    })?;
    Ok(Some((currency, amount)))
}

fn split_custom_transfer_data(data: &[u8]) -> Option<(String, BigUint)> {
    let data = std::str::from_utf8(data).ok()?;
    let parts: Vec<&str> = data.split('@').collect();
    if parts.len() != 3 || parts[0] != ESDT_TRANSFER_FUNCTION {
        return None;
    }

    let token = String::from_utf8(hex::decode(parts[1]).ok()?).ok()?;
    let amount = BigUint::parse_bytes(parts[2].as_bytes(), 16)?;
    Some((token, amount))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::RosettaConfig,
        node::mock::{MockNodeAccessor, ALICE, BOB},
        node::{NodeAccessor, RawBlock},
    };
    use claims::{assert_matches, assert_none, assert_ok};
    use ed25519_dalek::{Keypair, SecretKey, Signer};
    use std::sync::Arc;

    fn currencies() -> CurrencyRegistry {
        CurrencyRegistry::new(Currency::new("EGLD", 18), vec![Currency::new(
            "ROSETTA-3a2edf",
            2,
        )])
    }

    fn context_with(node: MockNodeAccessor) -> RosettaContext {
        let config = RosettaConfig {
            offline: node.is_offline(),
            ..Default::default()
        };
        RosettaContext::new(config, currencies(), Arc::new(node))
    }

    fn online_context(sender: &str, nonce: u64) -> RosettaContext {
        let block = RawBlock {
            nonce: 10,
            hash: "aa".to_string(),
            ..Default::default()
        };
        context_with(
            MockNodeAccessor::new()
                .with_status(12, 10)
                .with_block(block)
                .with_account(sender, nonce, "1000000000000000000"),
        )
    }

    fn network() -> NetworkIdentifier {
        RosettaConfig::default().network_identifier()
    }

    fn keypair() -> Keypair {
        let secret = SecretKey::from_bytes(&[7u8; 32]).unwrap();
        let public = ed25519_dalek::PublicKey::from(&secret);
        Keypair { secret, public }
    }

    fn address_of(keypair: &Keypair) -> String {
        encode_address(keypair.public.as_bytes()).unwrap()
    }

    fn transfer_operations(
        operation_type: OperationType,
        sender: &str,
        receiver: &str,
        value: &str,
        currency: &Currency,
    ) -> Vec<Operation> {
        let mut operations = vec![
            Operation::debit(operation_type, sender, value, currency),
            Operation::credit(operation_type, receiver, value, currency),
        ];
        index_operations(&mut operations);
        operations
    }

    fn options(sender: &str, receiver: &str, amount: &str, symbol: &str) -> ConstructionOptions {
        ConstructionOptions {
            sender: Some(sender.to_string()),
            receiver: Some(receiver.to_string()),
            amount: Some(amount.to_string()),
            currency_symbol: Some(symbol.to_string()),
            ..Default::default()
        }
    }

    async fn preprocess(
        context: &RosettaContext,
        operations: Vec<Operation>,
        metadata: Option<ConstructionOptions>,
    ) -> ApiResult<ConstructionPreprocessResponse> {
        construction_preprocess(
            ConstructionPreprocessRequest {
                network_identifier: network(),
                operations,
                metadata,
            },
            context.clone(),
        )
        .await
    }

    async fn metadata(
        context: &RosettaContext,
        options: ConstructionOptions,
    ) -> ApiResult<ConstructionMetadataResponse> {
        construction_metadata(
            ConstructionMetadataRequest {
                network_identifier: network(),
                options,
                public_keys: None,
            },
            context.clone(),
        )
        .await
    }

    async fn payloads(
        context: &RosettaContext,
        operations: Vec<Operation>,
        metadata: ConstructionMetadata,
    ) -> ConstructionPayloadsResponse {
        construction_payloads(
            ConstructionPayloadsRequest {
                network_identifier: network(),
                operations,
                metadata: Some(metadata),
                public_keys: None,
            },
            context.clone(),
        )
        .await
        .unwrap()
    }

    async fn combine(
        context: &RosettaContext,
        unsigned_transaction: &str,
        signatures: Vec<Signature>,
    ) -> ApiResult<ConstructionCombineResponse> {
        construction_combine(
            ConstructionCombineRequest {
                network_identifier: network(),
                unsigned_transaction: unsigned_transaction.to_string(),
                signatures,
            },
            context.clone(),
        )
        .await
    }

    async fn parse(
        context: &RosettaContext,
        signed: bool,
        transaction: &str,
    ) -> ConstructionParseResponse {
        construction_parse(
            ConstructionParseRequest {
                network_identifier: network(),
                signed,
                transaction: transaction.to_string(),
            },
            context.clone(),
        )
        .await
        .unwrap()
    }

    fn sign(keypair: &Keypair, payload: &SigningPayload) -> Signature {
        let message = hex::decode(&payload.hex_bytes).unwrap();
        Signature {
            signing_payload: payload.clone(),
            public_key: PublicKey {
                hex_bytes: hex::encode(keypair.public.as_bytes()),
                curve_type: CurveType::Edwards25519,
            },
            signature_type: SignatureType::Ed25519,
            hex_bytes: hex::encode(keypair.sign(&message).to_bytes()),
        }
    }

    #[tokio::test]
    async fn test_preprocess_falls_back_to_operations() {
        let context = context_with(MockNodeAccessor::offline());
        let native = Currency::new("EGLD", 18);
        let operations = transfer_operations(OperationType::Transfer, ALICE, BOB, "1234", &native);

        let response = preprocess(&context, operations, None).await.unwrap();
        assert_eq!(Some(ALICE.to_string()), response.options.sender);
        assert_eq!(Some(BOB.to_string()), response.options.receiver);
        assert_eq!(Some("1234".to_string()), response.options.amount);
        assert_eq!(Some("EGLD".to_string()), response.options.currency_symbol);
        assert_eq!(
            Some(vec![AccountIdentifier::new(ALICE)]),
            response.required_public_keys
        );
    }

    #[tokio::test]
    async fn test_preprocess_prefers_explicit_metadata() {
        let context = context_with(MockNodeAccessor::offline());
        let native = Currency::new("EGLD", 18);
        let operations = transfer_operations(OperationType::Transfer, ALICE, BOB, "1234", &native);
        let explicit = ConstructionOptions {
            gas_limit: Some(70_000),
            data: Some("hello".to_string()),
            ..options(BOB, ALICE, "5", "EGLD")
        };

        let response = preprocess(&context, operations, Some(explicit.clone()))
            .await
            .unwrap();
        assert_eq!(explicit, response.options);
    }

    #[tokio::test]
    async fn test_preprocess_rejects_incomplete_transfers() {
        let context = context_with(MockNodeAccessor::offline());

        let result = preprocess(&context, vec![], None).await;
        assert_matches!(result, Err(ApiError::Construction(_)));

        let zero = options(ALICE, BOB, "0", "EGLD");
        let result = preprocess(&context, vec![], Some(zero)).await;
        assert_matches!(result, Err(ApiError::Construction(_)));

        let no_receiver = ConstructionOptions {
            receiver: None,
            ..options(ALICE, BOB, "10", "EGLD")
        };
        let result = preprocess(&context, vec![], Some(no_receiver)).await;
        assert_matches!(result, Err(ApiError::Construction(_)));

        let bad_address = options(ALICE, "erd1nope", "10", "EGLD");
        let result = preprocess(&context, vec![], Some(bad_address)).await;
        assert_matches!(result, Err(ApiError::InvalidAccountAddress(_)));
    }

    #[tokio::test]
    async fn test_preprocess_validates_custom_currencies() {
        let context = context_with(MockNodeAccessor::offline());

        let unknown = options(ALICE, BOB, "10", "UNKNOWN-000000");
        let result = preprocess(&context, vec![], Some(unknown)).await;
        assert_matches!(result, Err(ApiError::Construction(_)));

        let with_data = ConstructionOptions {
            data: Some("hello".to_string()),
            ..options(ALICE, BOB, "10", "ROSETTA-3a2edf")
        };
        let result = preprocess(&context, vec![], Some(with_data)).await;
        assert_matches!(result, Err(ApiError::Construction(_)));

        let custom = options(ALICE, BOB, "10", "ROSETTA-3a2edf");
        assert_ok!(preprocess(&context, vec![], Some(custom)).await);
    }

    #[tokio::test]
    async fn test_metadata_of_native_transfer() {
        let context = online_context(ALICE, 42);
        let options = ConstructionOptions {
            data: Some("hello".to_string()),
            ..options(ALICE, BOB, "1000", "EGLD")
        };

        let response = metadata(&context, options).await.unwrap();
        let metadata = response.metadata;
        assert_eq!(42, metadata.nonce);
        assert_eq!(57_500, metadata.gas_limit);
        assert_eq!(1_000_000_000, metadata.gas_price);
        assert_eq!("hello", metadata.data);
        assert_eq!("1000", metadata.amount);
        assert_eq!("1", metadata.chain_id);
        assert_eq!(TRANSACTION_VERSION, metadata.version);
        assert_eq!(
            Some(vec![Amount::new("57500000000000", &Currency::new("EGLD", 18))]),
            response.suggested_fee
        );
    }

    #[tokio::test]
    async fn test_metadata_of_custom_transfer() {
        let context = online_context(ALICE, 7);
        let response = metadata(&context, options(ALICE, BOB, "100", "ROSETTA-3a2edf"))
            .await
            .unwrap();

        let metadata = response.metadata;
        assert_eq!("ESDTTransfer@524f53455454412d336132656466@64", metadata.data);
        let movement_gas_limit = 50_000 + 1_500 * metadata.data.len() as u64;
        assert_eq!(movement_gas_limit + 200_000, metadata.gas_limit);
        assert_eq!("ROSETTA-3a2edf", metadata.currency_symbol);
    }

    #[tokio::test]
    async fn test_metadata_fee_bounds() {
        let context = online_context(ALICE, 0);

        let too_little_gas = ConstructionOptions {
            gas_limit: Some(10_000),
            ..options(ALICE, BOB, "1", "EGLD")
        };
        let result = metadata(&context, too_little_gas).await;
        assert_matches!(result, Err(ApiError::InsufficientGasLimit(_)));

        let cheap = ConstructionOptions {
            gas_price: Some(1),
            ..options(ALICE, BOB, "1", "EGLD")
        };
        let result = metadata(&context, cheap).await;
        assert_matches!(result, Err(ApiError::GasPriceTooLow(_)));

        let multiplied = ConstructionOptions {
            fee_multiplier: Some(2.0),
            ..options(ALICE, BOB, "1", "EGLD")
        };
        let response = metadata(&context, multiplied).await.unwrap();
        assert_eq!(2_000_000_000, response.metadata.gas_price);

        let capped = ConstructionOptions {
            fee_multiplier: Some(2.0),
            max_fee: Some("75000000000000".to_string()),
            ..options(ALICE, BOB, "1", "EGLD")
        };
        let response = metadata(&context, capped).await.unwrap();
        assert_eq!(1_500_000_000, response.metadata.gas_price);
    }

    #[tokio::test]
    async fn test_online_commands_fail_offline() {
        let context = context_with(MockNodeAccessor::offline());
        let result = metadata(&context, options(ALICE, BOB, "1", "EGLD")).await;
        assert_matches!(result, Err(ApiError::OfflineMode));

        let result = construction_submit(
            ConstructionSubmitRequest {
                network_identifier: network(),
                signed_transaction: "{}".to_string(),
            },
            context,
        )
        .await;
        assert_matches!(result, Err(ApiError::OfflineMode));
    }

    #[tokio::test]
    async fn test_bad_network() {
        let context = context_with(MockNodeAccessor::offline());
        let result = construction_preprocess(
            ConstructionPreprocessRequest {
                network_identifier: NetworkIdentifier::new("MultiversX", "devnet"),
                operations: vec![],
                metadata: None,
            },
            context,
        )
        .await;
        assert_matches!(result, Err(ApiError::BadNetwork(_)));
    }

    #[tokio::test]
    async fn test_native_transfer_round_trip() {
        let keypair = keypair();
        let sender = address_of(&keypair);
        let native = Currency::new("EGLD", 18);
        let operations =
            transfer_operations(OperationType::Transfer, &sender, BOB, "1000", &native);

        let online = online_context(&sender, 5);
        let offline = context_with(MockNodeAccessor::offline());

        let preprocessed = preprocess(&offline, operations.clone(), None).await.unwrap();
        let metadata = metadata(&online, preprocessed.options).await.unwrap().metadata;
        let payloads = payloads(&offline, operations.clone(), metadata).await;
        assert_eq!(1, payloads.payloads.len());
        assert_eq!(sender, payloads.payloads[0].account_identifier.address);
        assert_eq!(
            hex::encode(payloads.unsigned_transaction.as_bytes()),
            payloads.payloads[0].hex_bytes
        );

        let unsigned = parse(&offline, false, &payloads.unsigned_transaction).await;
        assert_eq!(operations, unsigned.operations);
        assert_none!(unsigned.account_identifier_signers);

        let signature = sign(&keypair, &payloads.payloads[0]);
        let signed = combine(&offline, &payloads.unsigned_transaction, vec![signature])
            .await
            .unwrap();
        let parsed = parse(&offline, true, &signed.signed_transaction).await;
        assert_eq!(operations, parsed.operations);
        assert_eq!(
            Some(vec![AccountIdentifier::new(sender.clone())]),
            parsed.account_identifier_signers
        );

        let tx: SignedTransaction = serde_json::from_str(&signed.signed_transaction).unwrap();
        assert_eq!(5, tx.nonce);
        assert_eq!("1000", tx.value);
        assert_eq!(128, tx.signature.len());
    }

    #[tokio::test]
    async fn test_custom_transfer_round_trip() {
        let keypair = keypair();
        let sender = address_of(&keypair);
        let token = Currency::new("ROSETTA-3a2edf", 2);
        let operations =
            transfer_operations(OperationType::CustomTransfer, &sender, BOB, "300", &token);

        let online = online_context(&sender, 1);
        let offline = context_with(MockNodeAccessor::offline());

        let preprocessed = preprocess(&offline, operations.clone(), None).await.unwrap();
        let metadata = metadata(&online, preprocessed.options).await.unwrap().metadata;
        let payloads = payloads(&offline, operations.clone(), metadata).await;

        let tx: SignedTransaction = serde_json::from_str(&payloads.unsigned_transaction).unwrap();
        assert_eq!("0", tx.value);
        assert_eq!(BOB, tx.receiver);
        assert_eq!(
            b"ESDTTransfer@524f53455454412d336132656466@012c".to_vec(),
            tx.data
        );

        let signature = sign(&keypair, &payloads.payloads[0]);
        let signed = combine(&offline, &payloads.unsigned_transaction, vec![signature])
            .await
            .unwrap();
        let parsed = parse(&offline, true, &signed.signed_transaction).await;
        assert_eq!(operations, parsed.operations);
    }

    #[tokio::test]
    async fn test_combine_rejects_bad_signatures() {
        let keypair = keypair();
        let sender = address_of(&keypair);
        let context = context_with(MockNodeAccessor::offline());
        let metadata = ConstructionMetadata {
            sender: sender.clone(),
            receiver: BOB.to_string(),
            nonce: 0,
            amount: "1".to_string(),
            currency_symbol: "EGLD".to_string(),
            gas_limit: 50_000,
            gas_price: 1_000_000_000,
            data: String::new(),
            chain_id: "1".to_string(),
            version: 1,
        };
        let payloads = payloads(&context, vec![], metadata).await;
        let signature = sign(&keypair, &payloads.payloads[0]);

        let result = combine(&context, &payloads.unsigned_transaction, vec![]).await;
        assert_matches!(result, Err(ApiError::InvalidInputParam(_)));

        let result = combine(&context, &payloads.unsigned_transaction, vec![
            signature.clone(),
            signature.clone(),
        ])
        .await;
        assert_matches!(result, Err(ApiError::InvalidInputParam(_)));

        let short = Signature {
            hex_bytes: "abcd".to_string(),
            ..signature.clone()
        };
        let result = combine(&context, &payloads.unsigned_transaction, vec![short]).await;
        assert_matches!(result, Err(ApiError::InvalidInputParam(_)));

        let mut tampered_bytes = hex::decode(&signature.hex_bytes).unwrap();
        tampered_bytes[0] ^= 0xff;
        let tampered = Signature {
            hex_bytes: hex::encode(tampered_bytes),
            ..signature.clone()
        };
        let result = combine(&context, &payloads.unsigned_transaction, vec![tampered]).await;
        assert_matches!(result, Err(ApiError::InvalidInputParam(_)));

        assert_ok!(combine(&context, &payloads.unsigned_transaction, vec![signature]).await);
    }

    #[tokio::test]
    async fn test_derive() {
        let context = context_with(MockNodeAccessor::offline());
        let pubkey = decode_address(ALICE).unwrap();

        let response = construction_derive(
            ConstructionDeriveRequest {
                network_identifier: network(),
                public_key: PublicKey {
                    hex_bytes: hex::encode(&pubkey),
                    curve_type: CurveType::Edwards25519,
                },
            },
            context.clone(),
        )
        .await
        .unwrap();
        assert_eq!(ALICE, response.account_identifier.address);

        let result = construction_derive(
            ConstructionDeriveRequest {
                network_identifier: network(),
                public_key: PublicKey {
                    hex_bytes: hex::encode(&pubkey),
                    curve_type: CurveType::Secp256k1,
                },
            },
            context.clone(),
        )
        .await;
        assert_matches!(result, Err(ApiError::UnsupportedCurveType(_)));

        let result = construction_derive(
            ConstructionDeriveRequest {
                network_identifier: network(),
                public_key: PublicKey {
                    hex_bytes: "0102".to_string(),
                    curve_type: CurveType::Edwards25519,
                },
            },
            context,
        )
        .await;
        assert_matches!(result, Err(ApiError::UnsupportedCurveType(_)));
    }

    #[tokio::test]
    async fn test_hash_and_submit() {
        let tx = SignedTransaction {
            nonce: 3,
            value: "10".to_string(),
            receiver: BOB.to_string(),
            sender: ALICE.to_string(),
            gas_price: 1_000_000_000,
            gas_limit: 50_000,
            data: vec![],
            chain_id: "1".to_string(),
            version: 1,
            signature: "ab".repeat(64),
        };
        let signed_transaction = serde_json::to_string(&tx).unwrap();

        let offline = context_with(MockNodeAccessor::offline());
        let hashed = construction_hash(
            ConstructionHashRequest {
                network_identifier: network(),
                signed_transaction: signed_transaction.clone(),
            },
            offline,
        )
        .await
        .unwrap();
        assert_eq!(64, hashed.transaction_identifier.hash.len());

        let node = Arc::new(MockNodeAccessor::new());
        let online = RosettaContext::new(RosettaConfig::default(), currencies(), node.clone());
        let submitted = construction_submit(
            ConstructionSubmitRequest {
                network_identifier: network(),
                signed_transaction,
            },
            online,
        )
        .await
        .unwrap();
        assert_eq!(hashed.transaction_identifier, submitted.transaction_identifier);
        assert_eq!(vec![tx], node.sent());

        let malformed = construction_hash(
            ConstructionHashRequest {
                network_identifier: network(),
                signed_transaction: "not json".to_string(),
            },
            context_with(MockNodeAccessor::offline()),
        )
        .await;
        assert_matches!(malformed, Err(ApiError::MalformedValue(_)));
    }

    #[test]
    fn test_custom_transfer_data() {
        let currencies = currencies();
        let data = custom_transfer_data("ROSETTA-3a2edf", &BigUint::from(4096u32));
        assert_eq!("ESDTTransfer@524f53455454412d336132656466@1000", data);

        let (currency, amount) = parse_custom_transfer_data(data.as_bytes(), &currencies)
            .unwrap()
            .unwrap();
        assert_eq!(Currency::new("ROSETTA-3a2edf", 2), currency);
        assert_eq!(BigUint::from(4096u32), amount);

        assert_none!(parse_custom_transfer_data(b"hello", &currencies).unwrap());
        assert_none!(parse_custom_transfer_data(b"ESDTTransfer@zz@01", &currencies).unwrap());
        assert_none!(parse_custom_transfer_data(
            b"ESDTTransfer@524f53455454412d336132656466@01@02",
            &currencies
        )
        .unwrap());

        let unknown = custom_transfer_data("UNKNOWN-abcdef", &BigUint::from(1u32));
        assert_matches!(
            parse_custom_transfer_data(unknown.as_bytes(), &currencies),
            Err(ApiError::Construction(_))
        );
    }

    #[tokio::test]
    async fn test_parse_rejects_unknown_token() {
        let tx = SignedTransaction {
            nonce: 3,
            value: "0".to_string(),
            receiver: BOB.to_string(),
            sender: ALICE.to_string(),
            gas_price: 1_000_000_000,
            gas_limit: 500_000,
            data: custom_transfer_data("UNKNOWN-abcdef", &BigUint::from(10u32)).into_bytes(),
            chain_id: "1".to_string(),
            version: 1,
            signature: String::new(),
        };
        let result = construction_parse(
            ConstructionParseRequest {
                network_identifier: network(),
                signed: false,
                transaction: serde_json::to_string(&tx).unwrap(),
            },
            context_with(MockNodeAccessor::offline()),
        )
        .await;
        assert_matches!(result, Err(ApiError::Construction(_)));
    }
}
