//! # Configuration Tests
//!
//! Defaults, plusarg parsing, JSON deserialization and `strtoull`-style numbers.

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use uio_memif::MemifError;
use uio_memif::config::{UioConfig, parse_size};

#[test]
fn test_config_default() {
    let config = UioConfig::default();
    assert_eq!(config.device, None);
    assert_eq!(config.uio_size, 0x4000_0000);
    assert_eq!(config.dram_size, 0x3fff_c000);
}

#[test]
fn test_plusargs_defaults_fill_unspecified_sizes() {
    let config = UioConfig::from_plusargs(["uio-mmio", "+uio=/dev/uio0"]).unwrap();
    assert_eq!(config.device_path().unwrap(), Path::new("/dev/uio0"));
    assert_eq!(config.uio_size, 0x4000_0000);
    assert_eq!(config.dram_size, 0x3fff_c000);
}

#[test]
fn test_plusargs_all_fields() {
    let config = UioConfig::from_plusargs([
        "+uio=/dev/uio3",
        "+uio_size=0x20000000",
        "+dram_size=268435456",
    ])
    .unwrap();
    assert_eq!(config.device.as_deref(), Some(Path::new("/dev/uio3")));
    assert_eq!(config.uio_size, 0x2000_0000);
    assert_eq!(config.dram_size, 0x1000_0000);
}

#[test]
fn test_plusargs_ignore_unrelated_arguments() {
    let config = UioConfig::from_plusargs([
        "+permissive",
        "+uio=/dev/uio1",
        "+permissive-off",
        "hello.riscv",
        "+signature=out.sig",
    ])
    .unwrap();
    assert_eq!(config.device.as_deref(), Some(Path::new("/dev/uio1")));
    assert_eq!(config.uio_size, 0x4000_0000);
}

#[test]
fn test_plusargs_later_value_wins() {
    let config =
        UioConfig::from_plusargs(["+uio_size=0x1000", "+uio=/dev/uio0", "+uio_size=0x2000"])
            .unwrap();
    assert_eq!(config.uio_size, 0x2000);
}

#[test]
fn test_zero_size_means_default() {
    let config =
        UioConfig::from_plusargs(["+uio=/dev/uio0", "+uio_size=0", "+dram_size=0"]).unwrap();
    assert_eq!(config.uio_size, 0x4000_0000);
    assert_eq!(config.dram_size, 0x3fff_c000);
}

#[test]
fn test_apply_plusargs_overrides_existing_fields() {
    let base = UioConfig {
        device: Some("/dev/uio0".into()),
        uio_size: 0x1000_0000,
        dram_size: 0,
    };
    let config = base
        .apply_plusargs(["+uio=/dev/uio7"])
        .unwrap()
        .resolved();
    assert_eq!(config.device.as_deref(), Some(Path::new("/dev/uio7")));
    assert_eq!(config.uio_size, 0x1000_0000);
    assert_eq!(config.dram_size, 0x3fff_c000);
}

#[test]
fn test_missing_device_is_an_error() {
    let config = UioConfig::from_plusargs(["+uio_size=0x1000"]).unwrap();
    assert!(matches!(config.device_path(), Err(MemifError::MissingDevice)));

    let empty = UioConfig::from_plusargs(["+uio="]).unwrap();
    assert!(matches!(empty.device_path(), Err(MemifError::MissingDevice)));
}

#[test]
fn test_invalid_size_plusarg() {
    let err = UioConfig::from_plusargs(["+uio=/dev/uio0", "+dram_size=lots"]).unwrap_err();
    assert!(matches!(err, MemifError::InvalidNumber { ref value } if value == "lots"));
}

#[test]
fn test_from_json_partial() {
    let config =
        UioConfig::from_json(r#"{ "device": "/dev/uio2", "dram_size": 16777216 }"#).unwrap();
    assert_eq!(config.device.as_deref(), Some(Path::new("/dev/uio2")));
    assert_eq!(config.uio_size, 0x4000_0000);
    assert_eq!(config.dram_size, 0x100_0000);
}

#[test]
fn test_from_json_zero_sizes_resolve_to_defaults() {
    let config = UioConfig::from_json(r#"{ "uio_size": 0, "dram_size": 0 }"#).unwrap();
    assert_eq!(config, UioConfig::default());
}

#[test]
fn test_from_json_malformed() {
    let err = UioConfig::from_json("{ \"uio_size\": \"big\" }").unwrap_err();
    assert!(matches!(err, MemifError::Config { .. }));
}

#[test]
fn test_window_size_conversion() {
    let config = UioConfig::default();
    assert_eq!(config.window_size().unwrap(), 0x4000_0000);
}

#[rstest]
#[case("0x3fffc000", 0x3fff_c000)]
#[case("0X10", 16)]
#[case("4096", 4096)]
#[case("010", 8)]
#[case("0", 0)]
#[case(" 0x40000000 ", 0x4000_0000)]
fn test_parse_size(#[case] text: &str, #[case] expected: u64) {
    assert_eq!(parse_size(text).unwrap(), expected);
}

#[rstest]
#[case("")]
#[case("0x")]
#[case("0x1g")]
#[case("09")]
#[case("12kb")]
#[case("-1")]
fn test_parse_size_rejects(#[case] text: &str) {
    assert!(matches!(parse_size(text), Err(MemifError::InvalidNumber { .. })));
}
