// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! MultiversX Rosetta API
//!
//! [Rosetta API Spec](https://www.rosetta-api.org/docs/Reference.html)

use crate::{
    config::{ApiConfig, RosettaConfig},
    currency::CurrencyRegistry,
    error::ApiError,
    node::NodeAccessor,
    transformer::Transformer,
};
use std::{convert::Infallible, sync::Arc};
use tokio::task::JoinHandle;
use tracing::debug;
use warp::{
    http::{HeaderValue, Method},
    reject::{MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType},
    reply, Filter, Rejection, Reply,
};

mod account;
mod block;
mod construction;
mod mempool;
mod network;

pub mod client;
pub mod common;
pub mod config;
pub mod currency;
pub mod error;
pub mod events;
pub mod features;
pub mod fee;
pub mod node;
pub mod reconcile;
pub mod transformer;
pub mod types;

pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ROSETTA_VERSION: &str = "1.4.12";

/// Rosetta API context for use on all APIs
#[derive(Clone, Debug)]
pub struct RosettaContext {
    pub config: Arc<RosettaConfig>,
    pub currencies: Arc<CurrencyRegistry>,
    pub node: Arc<dyn NodeAccessor>,
}

impl RosettaContext {
    pub fn new(
        config: RosettaConfig,
        currencies: CurrencyRegistry,
        node: Arc<dyn NodeAccessor>,
    ) -> Self {
        RosettaContext {
            config: Arc::new(config),
            currencies: Arc::new(currencies),
            node,
        }
    }

    pub fn transformer(&self) -> Transformer<'_> {
        Transformer::new(&self.config, &self.currencies)
    }
}

/// Creates HTTP server (warp-based) for Rosetta
pub fn bootstrap(
    api_config: ApiConfig,
    context: RosettaContext,
) -> anyhow::Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("rosetta")
        .enable_all()
        .build()?;

    debug!("Starting up Rosetta server with {:?}", api_config);
    runtime.spawn(serve(api_config, context));
    Ok(runtime)
}

pub async fn bootstrap_async(
    api_config: ApiConfig,
    context: RosettaContext,
) -> anyhow::Result<JoinHandle<()>> {
    debug!("Starting up Rosetta server with {:?}", api_config);
    Ok(tokio::spawn(serve(api_config, context)))
}

async fn serve(api_config: ApiConfig, context: RosettaContext) {
    let routes = routes(context, api_config.content_length_limit());
    match (&api_config.tls_cert_path, &api_config.tls_key_path) {
        (Some(cert_path), Some(key_path)) => {
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .run(api_config.address)
                .await
        },
        _ => warp::serve(routes).run(api_config.address).await,
    }
}

/// Collection of all routes for the server
pub fn routes(
    context: RosettaContext,
    content_length_limit: u64,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    warp::body::content_length_limit(content_length_limit)
        .and(
            account::routes(context.clone())
                .or(block::block_route(context.clone()))
                .or(block::block_transaction_route(context.clone()))
                .or(construction::combine_route(context.clone()))
                .or(construction::derive_route(context.clone()))
                .or(construction::hash_route(context.clone()))
                .or(construction::metadata_route(context.clone()))
                .or(construction::parse_route(context.clone()))
                .or(construction::payloads_route(context.clone()))
                .or(construction::preprocess_route(context.clone()))
                .or(construction::submit_route(context.clone()))
                .or(mempool::routes(context.clone()))
                .or(network::routes(context)),
        )
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_methods(vec![Method::GET, Method::POST])
                .allow_headers(vec![warp::http::header::CONTENT_TYPE]),
        )
        .recover(handle_rejection)
}

/// Convert warp rejections into a Rosetta error.  Like every other Rosetta error they are
/// returned with status 500.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if err.is_not_found() {
        ApiError::InvalidInputParam(Some("Not Found".to_owned()))
    } else if let Some(cause) = err.find::<warp::cors::CorsForbidden>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else if let Some(cause) = err.find::<warp::body::BodyDeserializeError>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else if let Some(cause) = err.find::<warp::reject::LengthRequired>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else if let Some(cause) = err.find::<PayloadTooLarge>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else if let Some(cause) = err.find::<UnsupportedMediaType>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else if let Some(cause) = err.find::<MethodNotAllowed>() {
        ApiError::InvalidInputParam(Some(cause.to_string()))
    } else {
        ApiError::Unknown(Some(format!("unexpected error: {:?}", err)))
    };

    let status = error.status_code();
    let mut rep = reply::with_status(reply::json(&error.into_error()), status).into_response();
    rep.headers_mut()
        .insert("access-control-allow-origin", HeaderValue::from_static("*"));
    Ok(rep)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        node::mock::MockNodeAccessor,
        types::{Error, NetworkListResponse},
    };

    fn test_routes() -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let context = RosettaContext::new(
            RosettaConfig::default(),
            CurrencyRegistry::default(),
            Arc::new(MockNodeAccessor::offline()),
        );
        routes(context, 1024)
    }

    #[tokio::test]
    async fn test_network_list_route() {
        let response = warp::test::request()
            .method("POST")
            .path("/network/list")
            .json(&serde_json::json!({}))
            .reply(&test_routes())
            .await;

        assert_eq!(200, response.status().as_u16());
        let body: NetworkListResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(1, body.network_identifiers.len());
    }

    #[tokio::test]
    async fn test_errors_use_rosetta_envelope() {
        let routes = test_routes();

        // Offline handler error
        let response = warp::test::request()
            .method("POST")
            .path("/network/status")
            .json(&serde_json::json!({
                "network_identifier": {"blockchain": "MultiversX", "network": "mainnet"}
            }))
            .reply(&routes)
            .await;
        assert_eq!(500, response.status().as_u16());
        let error: Error = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(ApiError::OfflineMode.code(), error.code);

        // Unknown route
        let response = warp::test::request()
            .method("POST")
            .path("/nothing/here")
            .json(&serde_json::json!({}))
            .reply(&routes)
            .await;
        assert_eq!(500, response.status().as_u16());
        let error: Error = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(ApiError::InvalidInputParam(None).code(), error.code);

        // Body over the content length limit
        let response = warp::test::request()
            .method("POST")
            .path("/network/list")
            .body(vec![b' '; 2048])
            .reply(&routes)
            .await;
        let error: Error = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(ApiError::InvalidInputParam(None).code(), error.code);
    }
}
