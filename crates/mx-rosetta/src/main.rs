// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use mx_rosetta::{
    bootstrap, config::RosettaServerArgs, node::http::HttpNodeAccessor, RosettaContext,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args: RosettaServerArgs = RosettaServerArgs::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.config();
    let currencies = args
        .currencies()
        .context("Failed to load custom currencies")?;
    info!(
        network = %config.network_name,
        observer = %args.observer_http_url,
        shard = config.observed_actual_shard,
        offline = config.offline,
        custom_currencies = currencies.custom_currencies().len(),
        "Starting MultiversX Rosetta"
    );

    let node = HttpNodeAccessor::new(args.observer_http_url.clone(), config.offline);
    let context = RosettaContext::new(config, currencies, Arc::new(node));

    // Ensure runtime for Rosetta is up and running
    let _runtime = bootstrap(args.api_config(), context).context("Failed to bootstrap")?;

    // Run until there is an interrupt
    let term = Arc::new(AtomicBool::new(false));
    while !term.load(Ordering::Acquire) {
        std::thread::park();
    }
    Ok(())
}
