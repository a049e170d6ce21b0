// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Digest dispatch shared by `file(HASH)` and `string(<HASH>)`.
//!
//! All algorithms are pure-Rust (RustCrypto), so results are identical on
//! every host.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

/// Algorithm names accepted by the `file()`/`string()` hash forms.
pub(crate) const ALGORITHMS: [&str; 10] = [
    "MD5",
    "SHA1",
    "SHA224",
    "SHA256",
    "SHA384",
    "SHA512",
    "SHA3_224",
    "SHA3_256",
    "SHA3_384",
    "SHA3_512",
];

/// True when `name` is a supported digest algorithm.
pub(crate) fn is_algorithm(name: &str) -> bool {
    ALGORITHMS
        .iter()
        .any(|algorithm| algorithm.eq_ignore_ascii_case(name))
}

fn hex_digest<D: Digest>(data: &[u8]) -> String {
    let mut hasher = D::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Lowercase hex digest of `data`, or `None` for unknown algorithms.
pub(crate) fn digest(algorithm: &str, data: &[u8]) -> Option<String> {
    let digest = match algorithm.to_ascii_uppercase().as_str() {
        "MD5" => hex_digest::<Md5>(data),
        "SHA1" => hex_digest::<Sha1>(data),
        "SHA224" => hex_digest::<Sha224>(data),
        "SHA256" => hex_digest::<Sha256>(data),
        "SHA384" => hex_digest::<Sha384>(data),
        "SHA512" => hex_digest::<Sha512>(data),
        "SHA3_224" => hex_digest::<Sha3_224>(data),
        "SHA3_256" => hex_digest::<Sha3_256>(data),
        "SHA3_384" => hex_digest::<Sha3_384>(data),
        "SHA3_512" => hex_digest::<Sha3_512>(data),
        _ => return None,
    };
    Some(digest)
}
