// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Errors that can be returned by the API
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Error.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Error {
    /// Error code
    pub code: u32,
    /// Message that always matches the error code
    pub message: String,
    /// Whether a call can retry on the error
    pub retriable: bool,
    /// Specific details of the error e.g. the upstream failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Error details that are specific to the instance
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorDetails {
    /// Upstream error text
    #[serde(rename = "originalError")]
    pub original_error: String,
}

/// Status of an operation
///
/// [API Spec](https://www.rosetta-api.org/docs/models/OperationStatus.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperationStatus {
    pub status: String,
    pub successful: bool,
}

/// Represents a Peer, used for discovery
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Peer.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Peer {
    pub peer_id: String,
}

/// [API Spec](https://www.rosetta-api.org/docs/models/SyncStatus.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SyncStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub synced: bool,
}

/// Version information for the current deployment to handle software version matching
///
/// [API Spec](https://www.rosetta-api.org/docs/models/Version.html)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Version {
    /// Rosetta version, this should be hardcoded
    pub rosetta_version: String,
    /// Node version, this should come from the node
    pub node_version: String,
    /// Middleware version, this should be the version of this software
    pub middleware_version: String,
}

/// An internal enum to support Operation typing
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum OperationType {
    GenesisBalanceMovement,
    Transfer,
    Fee,
    Reward,
    SmartContractResult,
    FeeRefundAsSmartContractResult,
    DeveloperRewardsAsSmartContractResult,
    FeeOfInvalidTransaction,
    FeeRefund,
    CustomTransfer,
}

impl OperationType {
    const CUSTOM_TRANSFER: &'static str = "CustomTransfer";
    const DEVELOPER_REWARDS_AS_SMART_CONTRACT_RESULT: &'static str =
        "DeveloperRewardsAsSmartContractResult";
    const FEE: &'static str = "Fee";
    const FEE_OF_INVALID_TRANSACTION: &'static str = "FeeOfInvalidTransaction";
    const FEE_REFUND: &'static str = "FeeRefund";
    const FEE_REFUND_AS_SMART_CONTRACT_RESULT: &'static str = "FeeRefundAsSmartContractResult";
    const GENESIS_BALANCE_MOVEMENT: &'static str = "GenesisBalanceMovement";
    const REWARD: &'static str = "Reward";
    const SMART_CONTRACT_RESULT: &'static str = "SmartContractResult";
    const TRANSFER: &'static str = "Transfer";

    pub fn all() -> Vec<OperationType> {
        use OperationType::*;
        vec![
            Transfer,
            Fee,
            Reward,
            SmartContractResult,
            FeeRefundAsSmartContractResult,
            DeveloperRewardsAsSmartContractResult,
            FeeOfInvalidTransaction,
            GenesisBalanceMovement,
            FeeRefund,
            CustomTransfer,
        ]
    }
}

impl FromStr for OperationType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            Self::GENESIS_BALANCE_MOVEMENT => Ok(OperationType::GenesisBalanceMovement),
            Self::TRANSFER => Ok(OperationType::Transfer),
            Self::FEE => Ok(OperationType::Fee),
            Self::REWARD => Ok(OperationType::Reward),
            Self::SMART_CONTRACT_RESULT => Ok(OperationType::SmartContractResult),
            Self::FEE_REFUND_AS_SMART_CONTRACT_RESULT => {
                Ok(OperationType::FeeRefundAsSmartContractResult)
            },
            Self::DEVELOPER_REWARDS_AS_SMART_CONTRACT_RESULT => {
                Ok(OperationType::DeveloperRewardsAsSmartContractResult)
            },
            Self::FEE_OF_INVALID_TRANSACTION => Ok(OperationType::FeeOfInvalidTransaction),
            Self::FEE_REFUND => Ok(OperationType::FeeRefund),
            Self::CUSTOM_TRANSFER => Ok(OperationType::CustomTransfer),
            _ => Err(ApiError::InvalidInputParam(Some(format!(
                "Invalid OperationType: {}",
                s
            )))),
        }
    }
}

impl Display for OperationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use OperationType::*;
        f.write_str(match self {
            GenesisBalanceMovement => Self::GENESIS_BALANCE_MOVEMENT,
            Transfer => Self::TRANSFER,
            Fee => Self::FEE,
            Reward => Self::REWARD,
            SmartContractResult => Self::SMART_CONTRACT_RESULT,
            FeeRefundAsSmartContractResult => Self::FEE_REFUND_AS_SMART_CONTRACT_RESULT,
            DeveloperRewardsAsSmartContractResult => {
                Self::DEVELOPER_REWARDS_AS_SMART_CONTRACT_RESULT
            },
            FeeOfInvalidTransaction => Self::FEE_OF_INVALID_TRANSACTION,
            FeeRefund => Self::FEE_REFUND,
            CustomTransfer => Self::CUSTOM_TRANSFER,
        })
    }
}

/// An internal type to support typing of Operation statuses
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OperationStatusType {
    /// Operation was part of a successfully committed transaction
    Success,
    /// Operation was not part of a successfully committed transaction
    Failure,
}

impl OperationStatusType {
    const FAILURE: &'static str = "Failure";
    const SUCCESS: &'static str = "Success";

    pub fn all() -> Vec<OperationStatusType> {
        vec![OperationStatusType::Success, OperationStatusType::Failure]
    }
}

impl From<OperationStatusType> for OperationStatus {
    fn from(status: OperationStatusType) -> Self {
        let successful = match status {
            OperationStatusType::Success => true,
            OperationStatusType::Failure => false,
        };

        OperationStatus {
            status: status.to_string(),
            successful,
        }
    }
}

impl TryFrom<OperationStatus> for OperationStatusType {
    type Error = ApiError;

    fn try_from(status: OperationStatus) -> Result<Self, Self::Error> {
        OperationStatusType::from_str(&status.status)
    }
}

impl FromStr for OperationStatusType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            Self::SUCCESS => Ok(OperationStatusType::Success),
            Self::FAILURE => Ok(OperationStatusType::Failure),
            _ => Err(ApiError::InvalidInputParam(Some(format!(
                "Invalid OperationStatusType: {}",
                s
            )))),
        }
    }
}

impl Display for OperationStatusType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationStatusType::Success => Self::SUCCESS,
            OperationStatusType::Failure => Self::FAILURE,
        })
    }
}
