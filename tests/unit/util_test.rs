//! Tests for formatting helpers and telemetry

use compile_lane::util::{format_bytes, format_millis, init_tracing};

#[test]
fn test_format_millis_boundaries() {
    assert_eq!(format_millis(42), "42ms");
    assert_eq!(format_millis(59_999), "60s");
    assert_eq!(format_millis(60_000), "1m 00s");
}

#[test]
fn test_format_bytes_units() {
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1024), "1 KB");
    assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GB");
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialised twice without panicking");
}
