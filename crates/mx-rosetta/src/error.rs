// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    node::NodeError,
    types::{self, ErrorDetails},
};
use hex::FromHexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warp::{http::StatusCode, reply::Reply};

pub type ApiResult<T> = Result<T, ApiError>;

/// Every error the server can return, with a stable numeric code.
///
/// The optional string carries the upstream error text, returned to the caller
/// as `details.originalError`.
#[derive(Debug, Deserialize, Serialize, Error)]
pub enum ApiError {
    #[error("unknown error: {0:?}")]
    Unknown(Option<String>),
    #[error("unable to get account: {0:?}")]
    UnableToGetAccount(Option<String>),
    #[error("invalid account address: {0:?}")]
    InvalidAccountAddress(Option<String>),
    #[error("unable to get block: {0:?}")]
    UnableToGetBlock(Option<String>),
    #[error("operation not implemented")]
    NotImplemented,
    #[error("unable to submit transaction: {0:?}")]
    UnableToSubmitTransaction(Option<String>),
    #[error("malformed value: {0:?}")]
    MalformedValue(Option<String>),
    #[error("unable to get node status: {0:?}")]
    UnableToGetNodeStatus(Option<String>),
    #[error("must query block by index or by hash")]
    MustQueryByIndexOrByHash,
    #[error("construction error: {0:?}")]
    Construction(Option<String>),
    #[error("unable to get network config: {0:?}")]
    UnableToGetNetworkConfig(Option<String>),
    #[error("unsupported curve type: {0:?}")]
    UnsupportedCurveType(Option<String>),
    #[error("insufficient gas limit: {0:?}")]
    InsufficientGasLimit(Option<String>),
    #[error("gas price is too low: {0:?}")]
    GasPriceTooLow(Option<String>),
    #[error("transaction is not in pool: {0:?}")]
    TransactionIsNotInPool(Option<String>),
    #[error("cannot parse pool transaction: {0:?}")]
    CannotParsePoolTransaction(Option<String>),
    #[error("invalid input param: {0:?}")]
    InvalidInputParam(Option<String>),
    #[error("rosetta server is in offline mode")]
    OfflineMode,
    #[error("unable to get genesis block: {0:?}")]
    UnableToGetGenesisBlock(Option<String>),
    #[error("network identifier is not supported: {0:?}")]
    BadNetwork(Option<String>),
    #[error("cannot recognize transaction event: {0:?}")]
    CannotRecognizeEvent(Option<String>),
    #[error("unknown transaction type: {0:?}")]
    UnknownTransactionType(Option<String>),
}

impl ApiError {
    pub fn all() -> Vec<ApiError> {
        use ApiError::*;
        vec![
            Unknown(None),
            UnableToGetAccount(None),
            InvalidAccountAddress(None),
            UnableToGetBlock(None),
            NotImplemented,
            UnableToSubmitTransaction(None),
            MalformedValue(None),
            UnableToGetNodeStatus(None),
            MustQueryByIndexOrByHash,
            Construction(None),
            UnableToGetNetworkConfig(None),
            UnsupportedCurveType(None),
            InsufficientGasLimit(None),
            GasPriceTooLow(None),
            TransactionIsNotInPool(None),
            CannotParsePoolTransaction(None),
            InvalidInputParam(None),
            OfflineMode,
            UnableToGetGenesisBlock(None),
            BadNetwork(None),
            CannotRecognizeEvent(None),
            UnknownTransactionType(None),
        ]
    }

    pub fn code(&self) -> u32 {
        use ApiError::*;
        match self {
            Unknown(_) => 1,
            UnableToGetAccount(_) => 2,
            InvalidAccountAddress(_) => 3,
            UnableToGetBlock(_) => 4,
            NotImplemented => 5,
            UnableToSubmitTransaction(_) => 6,
            MalformedValue(_) => 7,
            UnableToGetNodeStatus(_) => 8,
            MustQueryByIndexOrByHash => 9,
            Construction(_) => 10,
            UnableToGetNetworkConfig(_) => 11,
            UnsupportedCurveType(_) => 12,
            InsufficientGasLimit(_) => 13,
            GasPriceTooLow(_) => 14,
            TransactionIsNotInPool(_) => 15,
            CannotParsePoolTransaction(_) => 16,
            InvalidInputParam(_) => 17,
            OfflineMode => 18,
            UnableToGetGenesisBlock(_) => 19,
            BadNetwork(_) => 20,
            CannotRecognizeEvent(_) => 21,
            UnknownTransactionType(_) => 22,
        }
    }

    /// Upstream-unavailable errors are retriable; every other class requires the
    /// caller to fix its request or is a version mismatch.
    pub fn retriable(&self) -> bool {
        use ApiError::*;
        matches!(
            self,
            UnableToGetAccount(_)
                | UnableToGetBlock(_)
                | UnableToSubmitTransaction(_)
                | UnableToGetNodeStatus(_)
                | UnableToGetNetworkConfig(_)
                | TransactionIsNotInPool(_)
                | UnableToGetGenesisBlock(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn message(&self) -> String {
        use ApiError::*;
        match self {
            Unknown(_) => "unknown error",
            UnableToGetAccount(_) => "unable to get account",
            InvalidAccountAddress(_) => "invalid account address",
            UnableToGetBlock(_) => "unable to get block",
            NotImplemented => "operation not implemented",
            UnableToSubmitTransaction(_) => "unable to submit transaction",
            MalformedValue(_) => "malformed value",
            UnableToGetNodeStatus(_) => "unable to get node status",
            MustQueryByIndexOrByHash => "must query block by index or by hash",
            Construction(_) => "construction error",
            UnableToGetNetworkConfig(_) => "unable to get network config",
            UnsupportedCurveType(_) => "unsupported curve type",
            InsufficientGasLimit(_) => "insufficient gas limit",
            GasPriceTooLow(_) => "gas price is too low",
            TransactionIsNotInPool(_) => "transaction is not in pool",
            CannotParsePoolTransaction(_) => "cannot parse pool transaction",
            InvalidInputParam(_) => "invalid input param",
            OfflineMode => "rosetta server is in offline mode",
            UnableToGetGenesisBlock(_) => "unable to get genesis block",
            BadNetwork(_) => "network identifier is not supported",
            CannotRecognizeEvent(_) => "cannot recognize transaction event",
            UnknownTransactionType(_) => "unknown transaction type",
        }
        .to_string()
    }

    pub(crate) fn details(self) -> Option<ErrorDetails> {
        use ApiError::*;
        match self {
            Unknown(inner)
            | UnableToGetAccount(inner)
            | InvalidAccountAddress(inner)
            | UnableToGetBlock(inner)
            | UnableToSubmitTransaction(inner)
            | MalformedValue(inner)
            | UnableToGetNodeStatus(inner)
            | Construction(inner)
            | UnableToGetNetworkConfig(inner)
            | UnsupportedCurveType(inner)
            | InsufficientGasLimit(inner)
            | GasPriceTooLow(inner)
            | TransactionIsNotInPool(inner)
            | CannotParsePoolTransaction(inner)
            | InvalidInputParam(inner)
            | UnableToGetGenesisBlock(inner)
            | BadNetwork(inner)
            | CannotRecognizeEvent(inner)
            | UnknownTransactionType(inner) => inner,
            NotImplemented | MustQueryByIndexOrByHash | OfflineMode => None,
        }
        .map(|original_error| ErrorDetails { original_error })
    }

    pub fn into_error(self) -> types::Error {
        self.into()
    }
}

impl From<ApiError> for types::Error {
    fn from(error: ApiError) -> Self {
        let message = error.message();
        let code = error.code();
        let retriable = error.retriable();
        let details = error.details();
        types::Error {
            message,
            code,
            retriable,
            details,
        }
    }
}

impl From<FromHexError> for ApiError {
    fn from(err: FromHexError) -> Self {
        ApiError::MalformedValue(Some(err.to_string()))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedValue(Some(err.to_string()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Unknown(Some(err.to_string()))
    }
}

impl NodeError {
    /// Converts a node failure into the endpoint-specific error, keeping the
    /// upstream message as detail.  Offline mode always wins.
    pub fn into_api_error(self, variant: impl FnOnce(Option<String>) -> ApiError) -> ApiError {
        match self {
            NodeError::Offline => ApiError::OfflineMode,
            other => variant(Some(other.to_string())),
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl Reply for ApiError {
    fn into_response(self) -> warp::reply::Response {
        let status = self.status_code();
        warp::reply::with_status(warp::reply::json(&self.into_error()), status).into_response()
    }
}
