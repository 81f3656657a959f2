// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        ("NETSYNC_URL", "NETSYNC_URL"),
        ("NETSYNC_CONFIG", "NETSYNC_CONFIG"),
        ("NETSYNC_STATE_DIR", "NETSYNC_STATE_DIR"),
        ("NETSYNC_LOG", "NETSYNC_LOG"),
        ("RUST_LOG", "RUST_LOG"),
    ];

    for (const_name, env_name) in &vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";")?;
    }

    Ok(())
}
