// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    currency::{NATIVE_CURRENCY_DECIMALS, NATIVE_CURRENCY_SYMBOL},
    types::{
        index_operations, AccountBalanceRequest, AccountBalanceResponse, AccountIdentifier,
        BlockRequest, BlockResponse, BlockTransactionRequest, BlockTransactionResponse,
        ConstructionCombineRequest, ConstructionCombineResponse, ConstructionDeriveRequest,
        ConstructionDeriveResponse, ConstructionHashRequest, ConstructionMetadataRequest,
        ConstructionMetadataResponse, ConstructionOptions, ConstructionParseRequest,
        ConstructionParseResponse, ConstructionPayloadsRequest, ConstructionPayloadsResponse,
        ConstructionPreprocessRequest, ConstructionPreprocessResponse,
        ConstructionSubmitRequest, Currency, CurveType, Error, MempoolResponse,
        MempoolTransactionRequest, MempoolTransactionResponse, MetadataRequest,
        NetworkIdentifier, NetworkListResponse, NetworkOptionsResponse, NetworkRequest,
        NetworkStatusResponse, Operation, OperationType, PublicKey, Signature, SignatureType,
        TransactionIdentifier, TransactionIdentifierResponse,
    },
};
use anyhow::anyhow;
use ed25519_dalek::{Keypair, Signer};
use reqwest::{header::CONTENT_TYPE, Client as ReqwestClient};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use url::Url;

const JSON: &str = "application/json";

/// Client for testing & interacting with a Rosetta service
#[derive(Debug, Clone)]
pub struct RosettaClient {
    address: Url,
    inner: ReqwestClient,
}

impl RosettaClient {
    pub fn new(address: Url) -> RosettaClient {
        RosettaClient {
            address,
            inner: ReqwestClient::new(),
        }
    }

    pub async fn account_balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> anyhow::Result<AccountBalanceResponse> {
        self.make_call("account/balance", request).await
    }

    pub async fn block(&self, request: &BlockRequest) -> anyhow::Result<BlockResponse> {
        self.make_call("block", request).await
    }

    pub async fn block_transaction(
        &self,
        request: &BlockTransactionRequest,
    ) -> anyhow::Result<BlockTransactionResponse> {
        self.make_call("block/transaction", request).await
    }

    pub async fn combine(
        &self,
        request: &ConstructionCombineRequest,
    ) -> anyhow::Result<ConstructionCombineResponse> {
        self.make_call("construction/combine", request).await
    }

    pub async fn derive(
        &self,
        request: &ConstructionDeriveRequest,
    ) -> anyhow::Result<ConstructionDeriveResponse> {
        self.make_call("construction/derive", request).await
    }

    pub async fn hash(
        &self,
        request: &ConstructionHashRequest,
    ) -> anyhow::Result<TransactionIdentifierResponse> {
        self.make_call("construction/hash", request).await
    }

    pub async fn metadata(
        &self,
        request: &ConstructionMetadataRequest,
    ) -> anyhow::Result<ConstructionMetadataResponse> {
        self.make_call("construction/metadata", request).await
    }

    pub async fn parse(
        &self,
        request: &ConstructionParseRequest,
    ) -> anyhow::Result<ConstructionParseResponse> {
        self.make_call("construction/parse", request).await
    }

    pub async fn payloads(
        &self,
        request: &ConstructionPayloadsRequest,
    ) -> anyhow::Result<ConstructionPayloadsResponse> {
        self.make_call("construction/payloads", request).await
    }

    pub async fn preprocess(
        &self,
        request: &ConstructionPreprocessRequest,
    ) -> anyhow::Result<ConstructionPreprocessResponse> {
        self.make_call("construction/preprocess", request).await
    }

    pub async fn submit(
        &self,
        request: &ConstructionSubmitRequest,
    ) -> anyhow::Result<TransactionIdentifierResponse> {
        self.make_call("construction/submit", request).await
    }

    pub async fn mempool(&self, request: &NetworkRequest) -> anyhow::Result<MempoolResponse> {
        self.make_call("mempool", request).await
    }

    pub async fn mempool_transaction(
        &self,
        request: &MempoolTransactionRequest,
    ) -> anyhow::Result<MempoolTransactionResponse> {
        self.make_call("mempool/transaction", request).await
    }

    pub async fn network_list(&self) -> anyhow::Result<NetworkListResponse> {
        self.make_call("network/list", &MetadataRequest {}).await
    }

    pub async fn network_options(
        &self,
        request: &NetworkRequest,
    ) -> anyhow::Result<NetworkOptionsResponse> {
        self.make_call("network/options", request).await
    }

    pub async fn network_status(
        &self,
        request: &NetworkRequest,
    ) -> anyhow::Result<NetworkStatusResponse> {
        self.make_call("network/status", request).await
    }

    async fn make_call<'a, I: Serialize + Debug, O: DeserializeOwned>(
        &'a self,
        path: &'static str,
        request: &'a I,
    ) -> anyhow::Result<O> {
        let response = self
            .inner
            .post(self.address.join(path)?)
            .header(CONTENT_TYPE, JSON)
            .body(serde_json::to_string(request)?)
            .send()
            .await?;
        if !response.status().is_success() {
            let error: Error = response.json().await?;
            return Err(anyhow!("Failed API with: {:?}", error));
        }

        Ok(response.json().await?)
    }

    /// Transfers `amount` of `currency` from the keypair's account to `receiver`, going
    /// through every construction step.  The native currency is used when `currency` is
    /// `None`.
    pub async fn transfer(
        &self,
        network_identifier: &NetworkIdentifier,
        keypair: &Keypair,
        receiver: &str,
        amount: &str,
        currency: Option<Currency>,
        gas_limit: Option<u64>,
        gas_price: Option<u64>,
    ) -> anyhow::Result<TransactionIdentifier> {
        let public_key = public_key(keypair);
        let sender = self
            .derive(&ConstructionDeriveRequest {
                network_identifier: network_identifier.clone(),
                public_key: public_key.clone(),
            })
            .await?
            .account_identifier;

        // A transfer is made up of a debit and a credit
        let (operation_type, currency) = match currency {
            Some(currency) => (OperationType::CustomTransfer, currency),
            None => (
                OperationType::Transfer,
                Currency::new(NATIVE_CURRENCY_SYMBOL, NATIVE_CURRENCY_DECIMALS),
            ),
        };
        let mut operations = vec![
            Operation::debit(operation_type, &sender.address, amount, &currency),
            Operation::credit(operation_type, receiver, amount, &currency),
        ];
        index_operations(&mut operations);

        let preprocess_response = self
            .preprocess(&ConstructionPreprocessRequest {
                network_identifier: network_identifier.clone(),
                operations: operations.clone(),
                metadata: Some(ConstructionOptions {
                    gas_limit,
                    gas_price,
                    ..Default::default()
                }),
            })
            .await?;
        if preprocess_response.required_public_keys != Some(vec![sender.clone()]) {
            return Err(anyhow!(
                "Unexpected signers required: {:?}",
                preprocess_response.required_public_keys
            ));
        }

        let metadata = self
            .metadata(&ConstructionMetadataRequest {
                network_identifier: network_identifier.clone(),
                options: preprocess_response.options,
                public_keys: Some(vec![public_key.clone()]),
            })
            .await?
            .metadata;

        let payloads = self
            .payloads(&ConstructionPayloadsRequest {
                network_identifier: network_identifier.clone(),
                operations: operations.clone(),
                metadata: Some(metadata),
                public_keys: Some(vec![public_key]),
            })
            .await?;
        self.verify_parse(
            network_identifier,
            &payloads.unsigned_transaction,
            None,
            &operations,
        )
        .await?;

        let signed_transaction = self
            .sign_transaction(network_identifier, keypair, payloads)
            .await?;
        self.verify_parse(
            network_identifier,
            &signed_transaction,
            Some(vec![sender]),
            &operations,
        )
        .await?;

        Ok(self
            .submit(&ConstructionSubmitRequest {
                network_identifier: network_identifier.clone(),
                signed_transaction,
            })
            .await?
            .transaction_identifier)
    }

    /// Signs every payload with the keypair and combines them with the unsigned transaction
    async fn sign_transaction(
        &self,
        network_identifier: &NetworkIdentifier,
        keypair: &Keypair,
        unsigned_response: ConstructionPayloadsResponse,
    ) -> anyhow::Result<String> {
        let mut signatures = Vec::with_capacity(unsigned_response.payloads.len());
        for payload in unsigned_response.payloads {
            let message = hex::decode(&payload.hex_bytes)?;
            let signature = keypair.sign(&message);
            signatures.push(Signature {
                signing_payload: payload,
                public_key: public_key(keypair),
                signature_type: SignatureType::Ed25519,
                hex_bytes: hex::encode(signature.to_bytes()),
            });
        }

        Ok(self
            .combine(&ConstructionCombineRequest {
                network_identifier: network_identifier.clone(),
                unsigned_transaction: unsigned_response.unsigned_transaction,
                signatures,
            })
            .await?
            .signed_transaction)
    }

    /// Parses the transaction back and checks it against what was requested
    async fn verify_parse(
        &self,
        network_identifier: &NetworkIdentifier,
        transaction: &str,
        signers: Option<Vec<AccountIdentifier>>,
        operations: &[Operation],
    ) -> anyhow::Result<()> {
        let response = self
            .parse(&ConstructionParseRequest {
                network_identifier: network_identifier.clone(),
                signed: signers.is_some(),
                transaction: transaction.to_string(),
            })
            .await?;

        if signers != response.account_identifier_signers {
            Err(anyhow!(
                "Signers don't match Expected: {:?} Got: {:?}",
                signers,
                response.account_identifier_signers
            ))
        } else if operations != response.operations.as_slice() {
            Err(anyhow!(
                "Operations were not parsed to be the same as input! Expected {:?} Got {:?}",
                operations,
                response.operations
            ))
        } else {
            Ok(())
        }
    }
}

fn public_key(keypair: &Keypair) -> PublicKey {
    PublicKey {
        hex_bytes: hex::encode(keypair.public.as_bytes()),
        curve_type: CurveType::Edwards25519,
    }
}
