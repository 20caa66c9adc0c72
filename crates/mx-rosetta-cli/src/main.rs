// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! MultiversX Rosetta CLI
//!
//! A small tool for poking at a running Rosetta server by hand, without setting up the
//! upstream Rosetta CLI.  Every command prints the JSON response, or an `{"error": ...}`
//! object and a non-zero exit code.

#![forbid(unsafe_code)]

mod account;
mod block;
mod common;
mod construction;
mod mempool;
mod network;

use crate::common::{ErrorWrapper, RosettaCliArgs};
use clap::Parser;
use std::process::exit;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: RosettaCliArgs = RosettaCliArgs::parse();

    let result = args.execute().await;

    match result {
        Ok(value) => println!("{}", value),
        Err(error) => {
            let error = ErrorWrapper {
                error: error.to_string(),
            };
            match serde_json::to_string_pretty(&error) {
                Ok(output) => println!("{}", output),
                Err(_) => println!("{}", error.error),
            }
            exit(-1)
        },
    }
}
