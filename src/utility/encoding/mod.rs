// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Legacy Windows encoding conversion (UTF-8 ↔ CP1252/CP437).
//!
//! ```text
//! Compiler output      Internal
//! CP1252/CP437 --(decode)--> UTF-8
//! ```
//!
//! MSVC `cl.exe` writes diagnostics in the OEM code page; captured probe
//! output is decoded here before it reaches the evaluator. Uses
//! `encoding_rs`. Invalid sequences → U+FFFD.

use encoding_rs::{IBM866, WINDOWS_1252};
use std::borrow::Cow;

/// Encoding types for captured process output.
///
/// Maps to Windows code pages:
/// - `Utf8`: UTF-8 (65001)
/// - `Utf16Le`: UTF-16 LE (1200) - handled separately
/// - `Acp`: Active Code Page, typically Windows-1252 (1252)
/// - `Oem`: OEM Code Page, typically IBM437/866 (437/866)
/// - `Unknown`: Treat as ASCII/UTF-8 passthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Unknown encoding - treat as UTF-8 passthrough
    #[default]
    Unknown,
    /// UTF-8 (code page 65001)
    Utf8,
    /// UTF-16 Little Endian (code page 1200)
    Utf16Le,
    /// Active Code Page - typically Windows-1252
    Acp,
    /// OEM Code Page - typically IBM437 for US Windows
    Oem,
}

impl Encoding {
    /// The encoding a compiler driver writes its console output in.
    ///
    /// MSVC-style drivers emit the OEM code page on Windows; everything
    /// else is treated as UTF-8.
    #[must_use]
    pub const fn for_compiler_output(msvc_schema: bool) -> Self {
        if msvc_schema && cfg!(windows) {
            Self::Oem
        } else {
            Self::Utf8
        }
    }
}

/// Converts bytes from the given encoding to UTF-8.
///
/// # Arguments
/// * `encoding` - The source encoding of the bytes
/// * `bytes` - The raw bytes to convert
///
/// # Returns
/// A UTF-8 string. Invalid sequences are replaced with U+FFFD (replacement character).
///
/// # Example
/// ```
/// use nobify_rs::utility::encoding::{bytes_to_utf8, Encoding};
///
/// let cp1252_bytes = b"caf\xe9"; // "café" in Windows-1252
/// let utf8 = bytes_to_utf8(Encoding::Acp, cp1252_bytes);
/// assert_eq!(utf8, "café");
/// ```
#[must_use]
pub fn bytes_to_utf8(encoding: Encoding, bytes: &[u8]) -> Cow<'_, str> {
    match encoding {
        Encoding::Utf8 | Encoding::Unknown => String::from_utf8_lossy(bytes),
        Encoding::Utf16Le => utf16_le_to_utf8(bytes),
        Encoding::Acp => {
            let (result, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            result
        }
        Encoding::Oem => {
            let (result, _had_errors) = IBM866.decode_without_bom_handling(bytes);
            result
        }
    }
}

/// Converts UTF-16 LE bytes to UTF-8.
fn utf16_le_to_utf8(bytes: &[u8]) -> Cow<'static, str> {
    // Handle odd byte count by ignoring the last byte
    let len = bytes.len() & !1;
    if len == 0 {
        return Cow::Borrowed("");
    }

    let u16_slice: Vec<u16> = bytes[..len]
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    Cow::Owned(String::from_utf16_lossy(&u16_slice))
}

#[cfg(test)]
mod tests;
