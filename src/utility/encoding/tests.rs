// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Encoding, bytes_to_utf8};

#[test]
fn test_utf8_passthrough() {
    assert_eq!(bytes_to_utf8(Encoding::Utf8, b"hello"), "hello");
    assert_eq!(bytes_to_utf8(Encoding::Unknown, b"hello"), "hello");
}

#[test]
fn test_cp1252_decode() {
    // 0xE9 is 'é' in Windows-1252
    assert_eq!(bytes_to_utf8(Encoding::Acp, b"caf\xe9"), "café");
}

#[test]
fn test_utf16_le_decode() {
    // "ok" as UTF-16 LE
    let bytes = [0x6F, 0x00, 0x6B, 0x00];
    assert_eq!(bytes_to_utf8(Encoding::Utf16Le, &bytes), "ok");
}

#[test]
fn test_utf16_le_odd_length_ignores_trailing_byte() {
    let bytes = [0x6F, 0x00, 0x6B];
    assert_eq!(bytes_to_utf8(Encoding::Utf16Le, &bytes), "o");
}

#[test]
fn test_invalid_utf8_replaced() {
    let decoded = bytes_to_utf8(Encoding::Utf8, b"a\xff");
    assert_eq!(decoded, "a\u{fffd}");
}
