//! On-disk manifest for one published vector collection.
//!
//! A collection's version directory holds three files once published, plus
//! an optional fourth:
//!
//! - `manifest.json`  — this struct
//! - `matrix.bin`     — row-major, little-endian `f32`, `rows * dim` entries
//! - `ids.json`       — `Vec<String>`, row `i` is the vector for `ids[i]`
//! - `metadata.json`  — `Vec<serde_json::Value>`, parallel to `ids`; omitted
//!   entirely for collections with no per-row metadata (e.g. `user_sim`)
//!
//! The manifest's `sha256_hex` is computed over `matrix.bin` alone; `ids.json`
//! and `metadata.json` are trusted to match because they are written into the
//! same version directory as the matrix, in a single publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current on-disk schema version. Bumped when the manifest shape changes
/// in a way existing readers cannot tolerate.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub dim: usize,
    pub rows: usize,
    /// Always `"brute_force_cosine"` (exact search, no ANN index).
    pub algorithm: String,
    pub sha256_hex: String,
    pub schema_version: u32,
}

impl Manifest {
    pub fn new(name: impl Into<String>, dim: usize, rows: usize, sha256_hex: String) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            dim,
            rows,
            algorithm: "brute_force_cosine".to_string(),
            sha256_hex,
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// Hex-encoded SHA-256 of a byte buffer, used for `matrix.bin` checksums.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to a String cannot fail");
    }
    out
}
