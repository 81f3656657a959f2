// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running event stream.

use super::{print_json, Runner};
use crate::cli::GlobalArgs;
use crate::error::Result;

/// Prints every event as a JSON line until interrupted or the client stops.
pub async fn watch(global: &GlobalArgs) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = stream(&mut runner).await;
    runner.finish(result).await
}

async fn stream(runner: &mut Runner) -> Result<()> {
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::debug!("interrupted");
                return Ok(());
            }
            event = runner.next_event() => {
                match event {
                    Some(event) => print_json(&event)?,
                    None => return Ok(()),
                }
            }
        }
    }
}
