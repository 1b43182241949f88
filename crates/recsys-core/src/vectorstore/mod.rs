//! Vector Store
//!
//! A directory-per-collection, file-based store. Each publish of a named
//! collection writes `manifest.json`, `matrix.bin`, `ids.json` and
//! `metadata.json` into a freshly named version directory under `root`,
//! then atomically repoints a small pointer file (`<name>.pointer`) at
//! that directory by writing to a temp file and renaming it over the
//! pointer. A reader resolves the pointer once and reads everything from
//! the directory it named; it is never blocked by, or exposed to, a
//! concurrent publish, and `name`'s pointer always resolves to either the
//! previous version directory or the new one, never to nothing
//! ("Durability"). The version directory that was current just before a
//! publish is kept one publish longer before being deleted, so a reader
//! that resolved the pointer moments before a swap still has its files on
//! disk to finish reading from ("Snapshot isolation").

mod manifest;
mod search;

pub use manifest::{sha256_hex, Manifest};
pub use search::{top_k, ScoredRow};

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum IntegrityError {
    #[error("collection not found: {0}")]
    NotFound(String),
    #[error("checksum mismatch for {name}: manifest says {expected}, computed {got}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        got: String,
    },
    #[error("dimension mismatch for {name}: manifest says {expected}, query was {got}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("corrupt collection {name}: {reason}")]
    Corrupt { name: String, reason: String },
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IntegrityError {
    fn from(e: std::io::Error) -> Self {
        IntegrityError::Io(e.to_string())
    }
}

/// An immutable, fully-loaded view of one collection as it existed at the
/// moment of `open()`. Safe to share across threads (`Send + Sync`); a
/// later publish to the same collection does not mutate an already-open
/// snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub manifest: Manifest,
    pub ids: Vec<String>,
    pub metadata: Option<Vec<Value>>,
    matrix: Vec<f32>,
}

impl Snapshot {
    pub fn dim(&self) -> usize {
        self.manifest.dim
    }

    pub fn rows(&self) -> usize {
        self.manifest.rows
    }

    pub fn vector(&self, row: usize) -> &[f32] {
        let start = row * self.manifest.dim;
        &self.matrix[start..start + self.manifest.dim]
    }

    /// `None` if this collection carries no metadata sidecar at all
    /// (e.g. `user_sim`, spec §6), or if `id` is not present.
    pub fn metadata_for(&self, id: &str) -> Option<&Value> {
        let row = self.ids.iter().position(|i| i == id)?;
        self.metadata.as_ref().map(|m| &m[row])
    }

    /// The row vector for `id`, if it is present in this snapshot.
    pub fn vector_for(&self, id: &str) -> Option<&[f32]> {
        self.ids.iter().position(|i| i == id).map(|row| self.vector(row))
    }

    /// Exact top-`k` cosine search against `query`. `filter`, if given, is
    /// applied to each row's metadata before scoring.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&dyn Fn(&str, &Value) -> bool>,
    ) -> Result<Vec<ScoredRow>, IntegrityError> {
        if query.len() != self.manifest.dim {
            return Err(IntegrityError::DimensionMismatch {
                name: self.manifest.name.clone(),
                expected: self.manifest.dim,
                got: query.len(),
            });
        }
        let null = Value::Null;
        let row_filter = filter.map(|f| {
            let ids = &self.ids;
            let metadata = &self.metadata;
            move |row: usize| f(&ids[row], metadata.as_ref().map(|m| &m[row]).unwrap_or(&null))
        });
        let row_filter_ref: Option<&dyn Fn(usize) -> bool> = row_filter
            .as_ref()
            .map(|f| f as &dyn Fn(usize) -> bool);
        Ok(top_k(query, self.manifest.dim, &self.ids, &self.matrix, k, row_filter_ref))
    }
}

/// A rows-to-be-written collection, before it is checksummed and published.
pub struct PendingCollection {
    pub ids: Vec<String>,
    /// `None` omits `metadata.json` from the published directory
    /// entirely. Used by `user_sim` (spec §6 on-disk layout), which has
    /// no per-row metadata to carry.
    pub metadata: Option<Vec<Value>>,
    pub vectors: Vec<Vec<f32>>,
}

/// Root directory holding one pointer file and one or two version
/// directories per published collection.
pub struct VectorStore {
    root: PathBuf,
}

impl VectorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pointer_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.pointer"))
    }

    fn version_prefix(name: &str) -> String {
        format!(".version-{name}-")
    }

    /// The on-disk directory `name`'s pointer currently names, or
    /// `NotFound` if `name` has never been published.
    fn resolve(&self, name: &str) -> Result<PathBuf, IntegrityError> {
        let raw = fs::read_to_string(self.pointer_path(name))
            .map_err(|_| IntegrityError::NotFound(name.to_string()))?;
        Ok(self.root.join(raw.trim()))
    }

    fn version_dirs(&self, name: &str) -> Vec<PathBuf> {
        let prefix = Self::version_prefix(name);
        fs::read_dir(&self.root)
            .into_iter()
            .flatten()
            .flatten()
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .map(|entry| entry.path())
            .collect()
    }

    /// The store's root directory, for callers that need to place
    /// ambient artifacts alongside the named collections (e.g. the
    /// Model Builder's `model_artifacts/` directory, §6).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|dir| dir.join("manifest.json").is_file())
    }

    /// The directory `name`'s pointer currently resolves to, for tests
    /// and operational tooling that need to reach the published files
    /// directly (e.g. to simulate on-disk corruption). Not meant for use
    /// by code that should instead call [`VectorStore::open`].
    pub fn current_dir(&self, name: &str) -> Result<PathBuf, IntegrityError> {
        self.resolve(name)
    }

    /// Load the manifest only, without reading `matrix.bin` into memory.
    pub fn stat(&self, name: &str) -> Result<Manifest, IntegrityError> {
        let dir = self.resolve(name)?;
        let bytes = fs::read(dir.join("manifest.json")).map_err(|_| IntegrityError::NotFound(name.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| IntegrityError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a collection's full snapshot, verifying the matrix checksum.
    pub fn open(&self, name: &str) -> Result<Snapshot, IntegrityError> {
        let dir = self.resolve(name)?;
        let manifest_path = dir.join("manifest.json");
        if !manifest_path.is_file() {
            return Err(IntegrityError::NotFound(name.to_string()));
        }

        let manifest: Manifest = serde_json::from_slice(&fs::read(&manifest_path)?)
            .map_err(|e| IntegrityError::Corrupt { name: name.to_string(), reason: e.to_string() })?;
        let matrix_bytes = fs::read(dir.join("matrix.bin"))?;

        let got = sha256_hex(&matrix_bytes);
        if got != manifest.sha256_hex {
            return Err(IntegrityError::ChecksumMismatch {
                name: name.to_string(),
                expected: manifest.sha256_hex.clone(),
                got,
            });
        }

        let ids: Vec<String> = serde_json::from_slice(&fs::read(dir.join("ids.json"))?)
            .map_err(|e| IntegrityError::Corrupt { name: name.to_string(), reason: e.to_string() })?;

        let metadata_path = dir.join("metadata.json");
        let metadata: Option<Vec<Value>> = if metadata_path.is_file() {
            let parsed: Vec<Value> = serde_json::from_slice(&fs::read(&metadata_path)?)
                .map_err(|e| IntegrityError::Corrupt { name: name.to_string(), reason: e.to_string() })?;
            if parsed.len() != manifest.rows {
                return Err(IntegrityError::Corrupt {
                    name: name.to_string(),
                    reason: format!(
                        "manifest declares {} rows, metadata.json has {}",
                        manifest.rows,
                        parsed.len()
                    ),
                });
            }
            Some(parsed)
        } else {
            None
        };

        if ids.len() != manifest.rows {
            return Err(IntegrityError::Corrupt {
                name: name.to_string(),
                reason: format!("manifest declares {} rows, ids.json has {}", manifest.rows, ids.len()),
            });
        }
        if matrix_bytes.len() != manifest.rows * manifest.dim * 4 {
            return Err(IntegrityError::Corrupt {
                name: name.to_string(),
                reason: "matrix.bin size does not match rows * dim * 4 bytes".to_string(),
            });
        }

        let matrix = bytes_to_f32(&matrix_bytes);

        Ok(Snapshot { manifest, ids, metadata, matrix })
    }

    /// Publish a new snapshot of `name`, replacing any previous one.
    /// Writes into a freshly named version directory, then atomically
    /// repoints `name`'s pointer file at it (temp-file write + rename),
    /// so a crash mid-write leaves the pointer untouched and a reader
    /// never sees `name` resolve to a half-written directory.
    pub fn publish(&self, name: &str, pending: PendingCollection) -> Result<Manifest, IntegrityError> {
        if pending.ids.len() != pending.vectors.len() {
            return Err(IntegrityError::Corrupt {
                name: name.to_string(),
                reason: "ids and vectors must have equal length".to_string(),
            });
        }
        if let Some(metadata) = &pending.metadata {
            if metadata.len() != pending.ids.len() {
                return Err(IntegrityError::Corrupt {
                    name: name.to_string(),
                    reason: "ids and metadata must have equal length".to_string(),
                });
            }
        }
        let dim = pending.vectors.first().map(|v| v.len()).unwrap_or(0);
        for v in &pending.vectors {
            if v.len() != dim {
                return Err(IntegrityError::Corrupt {
                    name: name.to_string(),
                    reason: "all vectors in a collection must share one dimension".to_string(),
                });
            }
        }

        fs::create_dir_all(&self.root)?;
        let previous_dir = self.resolve(name).ok();

        let version_dir = self.root.join(format!("{}{}", Self::version_prefix(name), uuid::Uuid::new_v4()));
        fs::create_dir_all(&version_dir)?;

        let matrix_bytes = f32_to_bytes(&pending.vectors);
        let checksum = sha256_hex(&matrix_bytes);
        let manifest = Manifest::new(name, dim, pending.ids.len(), checksum);

        fs::write(version_dir.join("matrix.bin"), &matrix_bytes)?;
        fs::write(version_dir.join("ids.json"), serde_json::to_vec(&pending.ids)?)?;
        if let Some(metadata) = &pending.metadata {
            fs::write(version_dir.join("metadata.json"), serde_json::to_vec(metadata)?)?;
        }
        fs::write(version_dir.join("manifest.json"), serde_json::to_vec_pretty(&manifest)?)?;

        let pointer_tmp = self.root.join(format!(".pointer-tmp-{}", uuid::Uuid::new_v4()));
        let version_name = version_dir
            .file_name()
            .and_then(|n| n.to_str())
            .expect("version directory name is valid utf-8");
        fs::write(&pointer_tmp, version_name)?;
        fs::rename(&pointer_tmp, self.pointer_path(name))?;

        // The directory the pointer named just before this swap may still
        // be mid-read by a caller that resolved it a moment ago; keep it
        // around for one more publish cycle and only reap older ones.
        for dir in self.version_dirs(name) {
            if dir != version_dir && Some(&dir) != previous_dir.as_ref() {
                let _ = fs::remove_dir_all(&dir);
            }
        }

        Ok(manifest)
    }
}

impl From<serde_json::Error> for IntegrityError {
    fn from(e: serde_json::Error) -> Self {
        IntegrityError::Io(e.to_string())
    }
}

fn f32_to_bytes(rows: &[Vec<f32>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows.iter().map(|r| r.len() * 4).sum());
    for row in rows {
        for x in row {
            out.extend_from_slice(&x.to_le_bytes());
        }
    }
    out
}

fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
