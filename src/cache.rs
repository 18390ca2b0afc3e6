//! Resize cache for repeated picks of the same image.
//!
//! Picking the same photo twice with the same hints should not decode and
//! re-encode it again. This module lets the resizer return an existing scaled
//! file when neither the source bytes nor the scale parameters changed.
//!
//! # Design
//!
//! The bounds probe always runs (it decides whether a resize is needed and
//! what the target size is). Only the expensive part (full decode, scale,
//! encode, EXIF rewrite) is skipped on a hit.
//!
//! ## Cache keys
//!
//! Lookups are **content-addressed** by `source_hash` + `params_hash`, not by
//! output name, so the same photo picked from two different paths (a gallery
//! copy and a download) is encoded once and copied for the second name.
//!
//! - **`source_hash`**: SHA-256 of the source file contents.
//! - **`params_hash`**: SHA-256 of target size, sample size, quality, filter
//!   and the EXIF whitelist. Changing any of them re-encodes.
//!
//! A hit requires a matching entry **and** the stored file still on disk.
//!
//! ## Storage
//!
//! The manifest is `<output_dir>/.resize-cache.json`, next to the scaled
//! files it describes. Clearing the output directory clears the cache.

use crate::imaging::{Filter, Quality};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".resize-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk manifest mapping output file names to their cache entries.
///
/// `content_index` is the reverse map (`"{source}:{params}"` → file name)
/// built at load time and kept in sync on insert.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl CacheManifest {
    /// Create an empty manifest (cache disabled or first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Missing, corrupt or outdated
    /// manifests all load as empty.
    pub fn load(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(manifest_path(output_dir)) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable resize cache");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = manifest
            .entries
            .iter()
            .map(|(name, entry)| {
                (
                    content_key(&entry.source_hash, &entry.params_hash),
                    name.clone(),
                )
            })
            .collect();
        manifest
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Look up a cached output by content hashes.
    ///
    /// `file_name` is the name the caller is about to write. It wins when it
    /// already holds this content; otherwise any other file with the same
    /// content is returned, and copying it over is the caller's job. The
    /// returned file must still exist in `output_dir`.
    pub fn find_cached(
        &self,
        file_name: &str,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let exists = |name: &str| output_dir.join(name).exists();

        if let Some(entry) = self.entries.get(file_name) {
            if entry.source_hash == source_hash
                && entry.params_hash == params_hash
                && exists(file_name)
            {
                return Some(file_name.to_string());
            }
        }

        let stored = self
            .content_index
            .get(&content_key(source_hash, params_hash))?;
        exists(stored).then(|| stored.clone())
    }

    /// Record a cache entry for an output file name.
    ///
    /// Any previous entry for the same name is replaced. The content index
    /// keeps pointing at the first name holding this content as long as that
    /// file survives, so copies share one source of truth.
    pub fn insert(&mut self, file_name: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);

        if let Some(previous) = self.entries.get(&file_name) {
            let old_key = content_key(&previous.source_hash, &previous.params_hash);
            if self.content_index.get(&old_key) == Some(&file_name) {
                self.content_index.remove(&old_key);
            }
        }

        self.content_index.entry(key).or_insert_with(|| file_name.clone());
        self.entries.insert(
            file_name,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Everything that shapes the bytes of a scaled file, apart from the source.
#[derive(Debug, Clone, Copy)]
pub struct ScaleKey<'a> {
    pub width: u32,
    pub height: u32,
    pub sample_size: u32,
    pub quality: Quality,
    pub filter: Filter,
    /// EXIF whitelist, `None` when EXIF copying is off.
    pub exif_tags: Option<&'a [String]>,
}

/// SHA-256 hash of the scale parameters.
pub fn hash_scale_params(key: &ScaleKey<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"scale\0");
    hasher.update(key.width.to_le_bytes());
    hasher.update(key.height.to_le_bytes());
    hasher.update(key.sample_size.to_le_bytes());
    hasher.update(key.quality.value().to_le_bytes());
    hasher.update(key.filter.name().as_bytes());
    hasher.update(b"\0");
    match key.exif_tags {
        Some(tags) => {
            hasher.update(b"\x01");
            for tag in tags {
                hasher.update(tag.as_bytes());
                hasher.update(b"\0");
            }
        }
        None => hasher.update(b"\x00"),
    }
    format!("{:x}", hasher.finalize())
}

/// How a scaled file came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Decoded and encoded on this call.
    Encoded,
    /// Already present under the same name.
    Cached,
    /// Present under another name and copied over.
    Copied,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Encoded => f.write_str("encoded"),
            CacheStatus::Cached => f.write_str("cached"),
            CacheStatus::Copied => f.write_str("copied"),
        }
    }
}

/// Summary of cache performance for a batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: CacheStatus) {
        match status {
            CacheStatus::Encoded => self.misses += 1,
            CacheStatus::Cached => self.hits += 1,
            CacheStatus::Copied => self.copies += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} encoded", self.misses);
        }
        write!(f, "{} cached, ", self.hits)?;
        if self.copies > 0 {
            write!(f, "{} copied, ", self.copies)?;
        }
        write!(f, "{} encoded ({} total)", self.misses, self.total())
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
