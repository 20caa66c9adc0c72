// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Gas and fee rules, mirroring the ones applied by the node

use crate::{
    config::NetworkConfig,
    error::{ApiError, ApiResult},
    node::RawTransaction,
};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::str::FromStr;

/// Gas limit, gas price and fee suggested for a transaction
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeEstimate {
    pub gas_limit: u64,
    pub gas_price: u64,
    pub fee: BigUint,
}

/// What the caller asks for, every field being optional
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeeRequest {
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u64>,
    pub max_fee: Option<BigUint>,
    pub fee_multiplier: Option<f64>,
    pub is_custom_transfer: bool,
}

/// Gas needed to move the transaction and its data between nodes
pub fn compute_movement_gas_limit(network: &NetworkConfig, data_len: usize) -> u64 {
    network.min_gas_limit + network.gas_per_data_byte * data_len as u64
}

/// Gas needed to execute the transaction.
///
/// TODO: estimate the execution of custom currency transfers by simulating them on the node
pub fn estimate_execution_gas_limit(_network: &NetworkConfig, _request: &FeeRequest) -> u64 {
    0
}

/// Execution gas is discounted by the gas price modifier
pub fn compute_fee(
    movement_gas_limit: u64,
    execution_gas_limit: u64,
    gas_price: u64,
    gas_price_modifier: f64,
) -> BigUint {
    let execution_gas_price = (gas_price as f64 * gas_price_modifier) as u64;
    BigUint::from(movement_gas_limit) * BigUint::from(gas_price)
        + BigUint::from(execution_gas_limit) * BigUint::from(execution_gas_price)
}

/// Some invalid transactions only pay for data movement, whatever fee the node reports
pub fn compute_fee_of_data_movement(network: &NetworkConfig, tx: &RawTransaction) -> BigUint {
    let movement_gas_limit = compute_movement_gas_limit(network, tx.data.len());
    BigUint::from(movement_gas_limit) * BigUint::from(tx.gas_price)
}

/// Validates the requested gas, and computes the gas price and fee the transaction will pay
pub fn estimate_fee(
    network: &NetworkConfig,
    request: &FeeRequest,
    data_len: usize,
) -> ApiResult<FeeEstimate> {
    let movement_gas_limit = compute_movement_gas_limit(network, data_len);
    let execution_gas_limit = estimate_execution_gas_limit(network, request);
    let required_gas_limit = movement_gas_limit + execution_gas_limit;

    let gas_limit = match request.gas_limit {
        Some(gas_limit) if gas_limit < required_gas_limit => {
            return Err(ApiError::InsufficientGasLimit(Some(format!(
                "gas limit {} is below the required {}",
                gas_limit, required_gas_limit
            ))));
        },
        Some(gas_limit) => gas_limit,
        None if request.is_custom_transfer => {
            required_gas_limit.max(movement_gas_limit + network.gas_limit_custom_transfer)
        },
        None => required_gas_limit,
    };

    let mut gas_price = match request.gas_price {
        Some(gas_price) if gas_price < network.min_gas_price => {
            return Err(ApiError::GasPriceTooLow(Some(format!(
                "gas price {} is below the minimum {}",
                gas_price, network.min_gas_price
            ))));
        },
        Some(gas_price) => gas_price,
        None => network.min_gas_price,
    };

    if let Some(multiplier) = request.fee_multiplier {
        gas_price = ((multiplier * gas_price as f64) as u64).max(network.min_gas_price);
    }

    let mut fee = compute_fee(
        movement_gas_limit,
        execution_gas_limit,
        gas_price,
        network.gas_price_modifier,
    );

    if let Some(max_fee) = &request.max_fee {
        if &fee > max_fee {
            gas_price = max_gas_price_within(
                max_fee,
                movement_gas_limit,
                execution_gas_limit,
                network.gas_price_modifier,
            );
            if gas_price < network.min_gas_price {
                return Err(ApiError::GasPriceTooLow(Some(format!(
                    "max fee {} can't be met with the minimum gas price {}",
                    max_fee, network.min_gas_price
                ))));
            }
            fee = compute_fee(
                movement_gas_limit,
                execution_gas_limit,
                gas_price,
                network.gas_price_modifier,
            );
        }
    }

    Ok(FeeEstimate {
        gas_limit,
        gas_price,
        fee,
    })
}

/// Highest gas price whose fee stays within `max_fee`, fees being paid on the
/// movement gas plus the execution gas discounted by the modifier
fn max_gas_price_within(
    max_fee: &BigUint,
    movement_gas_limit: u64,
    execution_gas_limit: u64,
    gas_price_modifier: f64,
) -> u64 {
    let discounted_execution = (execution_gas_limit as f64 * gas_price_modifier).ceil() as u64;
    let fee_weighted_gas = (movement_gas_limit + discounted_execution).max(1);
    (max_fee / BigUint::from(fee_weighted_gas))
        .to_u64()
        .unwrap_or(u64::MAX)
}

pub fn parse_max_fee(max_fee: &str) -> ApiResult<BigUint> {
    BigUint::from_str(max_fee)
        .map_err(|_| ApiError::Construction(Some(format!("invalid max fee: {}", max_fee))))
}
