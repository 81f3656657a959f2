// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Account commands: status, register, recover, availability checks, logout.

use serde_json::Value;

use super::{failed, output, print_json, Runner};
use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::sync::{reason, Operation, SyncEvent};

pub async fn status(global: &GlobalArgs) -> Result<()> {
    let runner = Runner::start(global)?;
    let result = show_status(&runner).await;
    runner.finish(result).await
}

async fn show_status(runner: &Runner) -> Result<()> {
    runner.wait_online().await?;
    let status = runner.status().await?;
    if runner.json() {
        print_json(&status)
    } else {
        println!("{}", output::format_status(runner.base_url(), &status));
        Ok(())
    }
}

pub async fn register(global: &GlobalArgs, handle: String, email: Option<String>) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_register(&mut runner, handle, email).await;
    runner.finish(result).await
}

async fn run_register(runner: &mut Runner, handle: String, email: Option<String>) -> Result<()> {
    runner.wait_online().await?;
    runner
        .submit("register", Operation::Register { handle, email })
        .await?;
    let event = runner
        .wait_for("registration", |e| {
            matches!(
                e,
                SyncEvent::Registered { .. } | SyncEvent::RegistrationFailed { .. }
            )
        })
        .await?;
    match &event {
        SyncEvent::Registered { payload } => report_account(runner, &event, payload),
        SyncEvent::RegistrationFailed { reason } => Err(failed("register", reason.clone())),
        _ => Ok(()),
    }
}

pub async fn recover(global: &GlobalArgs, code: String) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_recover(&mut runner, code).await;
    runner.finish(result).await
}

async fn run_recover(runner: &mut Runner, recovery_code: String) -> Result<()> {
    runner.wait_online().await?;
    runner
        .submit("recover", Operation::Recover { recovery_code })
        .await?;
    let event = runner
        .wait_for("recovery", |e| {
            matches!(
                e,
                SyncEvent::Recovered { .. } | SyncEvent::RecoveryFailed { .. }
            )
        })
        .await?;
    match &event {
        SyncEvent::Recovered { payload } => report_account(runner, &event, payload),
        SyncEvent::RecoveryFailed { reason } => Err(failed("recover", reason.clone())),
        _ => Ok(()),
    }
}

fn report_account(runner: &Runner, event: &SyncEvent, payload: &Value) -> Result<()> {
    if runner.json() {
        return print_json(event);
    }
    println!("{}", output::describe(event));
    if let Some(code) = payload.get("recovery_code").and_then(Value::as_str) {
        if !code.is_empty() {
            println!("Recovery code: {}", code);
            println!("  Keep it somewhere safe; it is the only way back into this identity.");
        }
    }
    Ok(())
}

pub async fn check_handle(global: &GlobalArgs, handle: String) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_check(&mut runner, Operation::CheckHandle { handle: handle.clone() }, |e| {
        matches!(e, SyncEvent::HandleAvailability { handle: h, .. } if *h == handle)
    })
    .await;
    runner.finish(result).await
}

pub async fn check_email(global: &GlobalArgs, email: String) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_check(
        &mut runner,
        Operation::CheckContact {
            contact: email.clone(),
        },
        |e| matches!(e, SyncEvent::ContactAvailability { contact, .. } if *contact == email),
    )
    .await;
    runner.finish(result).await
}

async fn run_check(
    runner: &mut Runner,
    op: Operation,
    done: impl Fn(&SyncEvent) -> bool,
) -> Result<()> {
    runner.wait_online().await?;
    runner.submit("availability check", op).await?;
    let event = runner.wait_for("availability", done).await?;
    match &event {
        SyncEvent::HandleAvailability {
            reason: Some(why),
            ..
        }
        | SyncEvent::ContactAvailability {
            reason: Some(why),
            ..
        } if why != reason::TAKEN => Err(failed("availability check", why.clone())),
        _ => runner.report(&event),
    }
}

pub async fn logout(global: &GlobalArgs) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_logout(&mut runner).await;
    runner.finish(result).await
}

async fn run_logout(runner: &mut Runner) -> Result<()> {
    runner.submit("logout", Operation::Logout).await?;
    let event = runner
        .wait_for("logout", |e| matches!(e, SyncEvent::LoggedOut))
        .await?;
    runner.report(&event)
}
