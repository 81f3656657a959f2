// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use netsync::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    netsync::logging::init(cli.global.verbose);
    if let Err(e) = netsync::run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
