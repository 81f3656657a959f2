// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn test_verbose_overrides_env() {
    assert_eq!(
        filter_directive(true, Some("error".to_string())),
        VERBOSE_FILTER
    );
}

#[test]
fn test_env_used_when_not_verbose() {
    assert_eq!(filter_directive(false, Some("trace".to_string())), "trace");
}

#[test]
fn test_default_is_warn() {
    assert_eq!(filter_directive(false, None), "warn");
}

#[test]
fn test_directives_parse() {
    assert!(EnvFilter::try_new(VERBOSE_FILTER).is_ok());
    assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
}

#[test]
fn test_init_twice_is_harmless() {
    init(false);
    init(true);
}
