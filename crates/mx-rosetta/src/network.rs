// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Network API
//!
//! See: [Network API Spec](https://www.rosetta-api.org/docs/NetworkApi.html)

use crate::{
    block::{servable_nonce, timestamp_in_millis},
    common::{check_network, check_online, handle_request, with_context},
    error::{ApiError, ApiResult},
    types::{
        Allow, BlockIdentifier, MetadataRequest, NetworkListResponse, NetworkOptionsResponse,
        NetworkRequest, NetworkStatusResponse, OperationStatusType, OperationType, Peer,
        SyncStatus, Version,
    },
    RosettaContext, MIDDLEWARE_VERSION, ROSETTA_VERSION,
};
use tracing::{debug, trace};
use warp::Filter;

/// Node version reported when there is no node to ask
pub const OFFLINE_NODE_VERSION: &str = "N / A";

/// Network routes e.g. status
pub fn routes(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post().and(
        warp::path!("network" / "list")
            .and(warp::body::json())
            .and(with_context(server_context.clone()))
            .and_then(handle_request(network_list))
            .or(warp::path!("network" / "options")
                .and(warp::body::json())
                .and(with_context(server_context.clone()))
                .and_then(handle_request(network_options)))
            .or(warp::path!("network" / "status")
                .and(warp::body::json())
                .and(with_context(server_context))
                .and_then(handle_request(network_status))),
    )
}

/// List the single network served by this proxy
///
/// This should be able to run without a running node.
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networklist)
async fn network_list(
    _empty: MetadataRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkListResponse> {
    debug!("/network/list");
    trace!(server_context = ?server_context, "network_list");

    Ok(NetworkListResponse {
        network_identifiers: vec![server_context.config.network_identifier()],
    })
}

/// Get Network options, errors, and versions
///
/// This should be able to run without a running node.
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networkoptions)
async fn network_options(
    request: NetworkRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkOptionsResponse> {
    debug!("/network/options");
    trace!(
        request = ?request,
        server_context = ?server_context,
        "network_options",
    );

    check_network(request.network_identifier, &server_context)?;

    let node_version = if server_context.config.offline {
        OFFLINE_NODE_VERSION.to_string()
    } else {
        server_context
            .node
            .get_node_status()
            .await
            .map_err(|err| err.into_api_error(ApiError::UnableToGetNodeStatus))?
            .app_version
    };

    let version = Version {
        rosetta_version: ROSETTA_VERSION.to_string(),
        node_version,
        middleware_version: MIDDLEWARE_VERSION.to_string(),
    };

    let allow = Allow {
        operation_statuses: OperationStatusType::all()
            .into_iter()
            .map(|status| status.into())
            .collect(),
        operation_types: OperationType::all()
            .into_iter()
            .map(|operation_type| operation_type.to_string())
            .collect(),
        errors: ApiError::all()
            .into_iter()
            .map(|err| err.into_error())
            .collect(),
        historical_balance_lookup: true,
        call_methods: vec![],
        balance_exemptions: vec![],
        mempool_coins: false,
    };

    Ok(NetworkOptionsResponse { version, allow })
}

/// Get network status including the latest block, the genesis block and the observer's key
///
/// [API Spec](https://www.rosetta-api.org/docs/NetworkApi.html#networkstatus)
async fn network_status(
    request: NetworkRequest,
    server_context: RosettaContext,
) -> ApiResult<NetworkStatusResponse> {
    debug!("/network/status");
    trace!(
        request = ?request,
        server_context = ?server_context,
        "network_status",
    );

    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let node = &server_context.node;
    let status = node
        .get_node_status()
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetNodeStatus))?;

    let config = &server_context.config;
    let genesis_block_identifier = config.genesis_block_identifier();
    let latest_nonce = servable_nonce(config, &status);
    let (current_block_identifier, current_block_timestamp) = if latest_nonce == 0 {
        (
            genesis_block_identifier.clone(),
            timestamp_in_millis(config.genesis_timestamp),
        )
    } else {
        let latest_block = node
            .get_block_by_nonce(latest_nonce)
            .await
            .map_err(|err| err.into_api_error(ApiError::UnableToGetNodeStatus))?;
        (
            BlockIdentifier::new(latest_block.nonce, latest_block.hash),
            timestamp_in_millis(latest_block.timestamp),
        )
    };

    Ok(NetworkStatusResponse {
        current_block_identifier,
        current_block_timestamp,
        oldest_block_identifier: Some(genesis_block_identifier.clone()),
        genesis_block_identifier,
        sync_status: Some(SyncStatus {
            current_index: Some(status.nonce),
            target_index: None,
            stage: None,
            synced: status.is_syncing == 0,
        }),
        peers: vec![Peer {
            peer_id: status.public_key,
        }],
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::RosettaConfig,
        currency::CurrencyRegistry,
        node::{mock::MockNodeAccessor, NodeAccessor, RawBlock},
        types::NetworkIdentifier,
    };
    use claims::assert_matches;
    use std::sync::Arc;

    fn context_with(node: MockNodeAccessor) -> RosettaContext {
        let config = RosettaConfig {
            offline: node.is_offline(),
            ..Default::default()
        };
        RosettaContext::new(config, CurrencyRegistry::default(), Arc::new(node))
    }

    fn request() -> NetworkRequest {
        NetworkRequest {
            network_identifier: RosettaConfig::default().network_identifier(),
        }
    }

    #[tokio::test]
    async fn test_network_list() {
        let response = network_list(MetadataRequest {}, context_with(MockNodeAccessor::offline()))
            .await
            .unwrap();
        assert_eq!(
            vec![NetworkIdentifier::new("MultiversX", "mainnet")],
            response.network_identifiers
        );
    }

    #[tokio::test]
    async fn test_network_options() {
        let online = context_with(MockNodeAccessor::new().with_status(10, 10));
        let response = network_options(request(), online).await.unwrap();
        assert_eq!("v1.6.0", response.version.node_version);
        assert_eq!(ROSETTA_VERSION, response.version.rosetta_version);
        assert_eq!(2, response.allow.operation_statuses.len());
        assert!(response
            .allow
            .operation_types
            .contains(&"CustomTransfer".to_string()));
        assert_eq!(22, response.allow.errors.len());
        assert!(response.allow.historical_balance_lookup);

        let offline = context_with(MockNodeAccessor::offline());
        let response = network_options(request(), offline).await.unwrap();
        assert_eq!(OFFLINE_NODE_VERSION, response.version.node_version);
    }

    #[tokio::test]
    async fn test_network_status() {
        let node = MockNodeAccessor::new()
            .with_status(12, 10)
            .with_block(RawBlock {
                nonce: 9,
                hash: "block-9".to_string(),
                timestamp: 1_600_000_000,
                ..Default::default()
            });
        let response = network_status(request(), context_with(node)).await.unwrap();

        assert_eq!(BlockIdentifier::new(9, "block-9"), response.current_block_identifier);
        assert_eq!(1_600_000_000_000, response.current_block_timestamp);
        let genesis = RosettaConfig::default().genesis_block_identifier();
        assert_eq!(genesis, response.genesis_block_identifier);
        assert_eq!(Some(genesis), response.oldest_block_identifier);
        assert!(response.sync_status.unwrap().synced);
        assert_eq!("observer", response.peers[0].peer_id);
    }

    #[tokio::test]
    async fn test_network_status_errors() {
        let result = network_status(request(), context_with(MockNodeAccessor::offline())).await;
        assert_matches!(result, Err(ApiError::OfflineMode));

        let bad_network = NetworkRequest {
            network_identifier: NetworkIdentifier::new("MultiversX", "devnet"),
        };
        let online = context_with(MockNodeAccessor::new().with_status(12, 10));
        let result = network_status(bad_network, online.clone()).await;
        assert_matches!(result, Err(ApiError::BadNetwork(_)));

        // The latest block isn't known to the node
        let result = network_status(request(), online).await;
        assert_matches!(result, Err(ApiError::UnableToGetNodeStatus(_)));
    }
}
