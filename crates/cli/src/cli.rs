// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Account:
  status       Show connectivity and session state
  register     Register a new handle
  recover      Recover an identity from its recovery code
  check-handle Check whether a handle is available
  check-email  Check whether an email is available
  logout       Forget the cached session

Files:
  put          Create or update a remote file
  rm           Delete a remote file
  mkdir        Create a remote directory
  rmdir        Remove a remote directory
  history      Show version history of a file
  restore      Restore a file to an earlier version
  sync         Request a full snapshot over the realtime channel
  push         Replace the remote filesystem with a local snapshot
  pull         Fetch the whole remote filesystem
  watch        Stream sync events as JSON lines";

const QUICKSTART_HELP: &str = "\
Get started:
  netsync status                      Check the backend is reachable
  netsync register NEO                Register a handle
  netsync put notes/a.txt -f a.txt    Upload a file
  netsync watch                       Follow remote changes";

#[derive(Parser)]
#[command(name = "netsync", version)]
#[command(about = "Network sync client with realtime push and request/reply fallback")]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Backend base url (overrides config and NETSYNC_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Print results and events as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Keep credentials in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Seconds to wait for the backend before giving up
    #[arg(long, short = 'w', global = true, default_value_t = 10, value_name = "SECS")]
    pub wait: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Account
    // ─────────────────────────────────────────────────────────────────────────
    /// Show connectivity and session state
    Status,

    /// Register a new handle
    #[command(arg_required_else_help = true)]
    Register {
        /// Handle to claim
        handle: String,

        /// Contact email attached to the account
        #[arg(long, short)]
        email: Option<String>,
    },

    /// Recover an identity from its recovery code
    #[command(arg_required_else_help = true)]
    Recover {
        /// Recovery code issued at registration
        code: String,
    },

    /// Check whether a handle is available
    #[command(arg_required_else_help = true)]
    CheckHandle {
        handle: String,
    },

    /// Check whether an email is available
    #[command(arg_required_else_help = true)]
    CheckEmail {
        email: String,
    },

    /// Forget the cached session
    Logout,

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────
    /// Create or update a remote file
    #[command(
        arg_required_else_help = true,
        after_help = "Examples:\n  \
        netsync put notes/a.txt -f a.txt               Upload a text file\n  \
        netsync put bin/run -f run.sh -t script -p sh  Upload with a program"
    )]
    Put {
        /// Remote path
        path: String,

        /// Local file whose contents are uploaded
        #[arg(long, short)]
        file: PathBuf,

        /// File type recorded with the change
        #[arg(long = "type", short = 't', default_value = "text")]
        file_type: String,

        /// Program associated with the file
        #[arg(long, short)]
        program: Option<String>,
    },

    /// Delete a remote file
    #[command(arg_required_else_help = true)]
    Rm {
        path: String,
    },

    /// Create a remote directory
    #[command(arg_required_else_help = true)]
    Mkdir {
        path: String,
    },

    /// Remove a remote directory
    #[command(arg_required_else_help = true)]
    Rmdir {
        path: String,
    },

    /// Show version history of a file
    #[command(arg_required_else_help = true)]
    History {
        path: String,
    },

    /// Restore a file to an earlier version
    #[command(arg_required_else_help = true)]
    Restore {
        path: String,

        /// Version number from `history`
        version: u64,
    },

    /// Request a full snapshot over the realtime channel
    Sync {
        /// Only changes after this point
        #[arg(long, short)]
        since: Option<String>,
    },

    /// Replace the remote filesystem with a local JSON snapshot
    #[command(arg_required_else_help = true)]
    Push {
        /// JSON file holding the snapshot
        file: PathBuf,
    },

    /// Fetch the whole remote filesystem
    Pull,

    /// Stream sync events as JSON lines until interrupted
    Watch,
}

#[cfg(test)]
#[path = "cli_tests/mod.rs"]
mod tests;
