//! Content-addressed object store
//!
//! Persists framed object records zlib-compressed under
//! `objects/<2-hex>/<38-hex>`, the digest-derived sharded path. Writes are
//! idempotent and atomically visible; reads verify the record header
//! against the actual payload before decoding.
//!
//! Every operation is synchronous. Concurrent writers of the same logical
//! object agree on path and payload by construction, so no locking is
//! needed between independent digests.

use crate::object::{Object, ObjectId, ObjectKind};
use crate::repository::{Repository, RepositoryError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("reference {0:?} is ambiguous")]
    AmbiguousReference(String),

    #[error("malformed object {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("unknown object type {kind:?} for object {id}")]
    UnknownType { id: String, kind: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn malformed(id: &ObjectId, reason: impl Into<String>) -> Self {
        Self::Malformed {
            id: id.to_hex(),
            reason: reason.into(),
        }
    }
}

/// Content-addressed store over a repository's `objects/` directory
pub struct ObjectStore<'r> {
    repo: &'r Repository,
}

impl Repository {
    /// The content-addressed object store of this repository
    pub fn objects(&self) -> ObjectStore<'_> {
        ObjectStore::new(self)
    }
}

impl<'r> ObjectStore<'r> {
    /// Create a store view over `repo`
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    fn record_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.repo
            .metadata_path(&["objects", &hex[..2], &hex[2..]])
    }

    /// Whether a record exists for `id`
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.record_path(id).is_file()
    }

    /// Persist `object`, returning its digest.
    ///
    /// A record that already exists at the derived path is trusted and
    /// left untouched; otherwise the compressed record is written to a
    /// temp file in the target directory and renamed into place, so a
    /// concurrent reader never observes a partial record.
    pub fn write(&self, object: &Object) -> Result<ObjectId> {
        let id = object.id();
        let path = self.record_path(&id);
        if path.exists() {
            // Content-addressed: an existing record already holds exactly
            // these bytes.
            tracing::debug!(id = %id, "object already stored");
            return Ok(id);
        }

        let hex = id.to_hex();
        self.repo.metadata_dir(&["objects", &hex[..2]], true)?;
        let shard = self.repo.metadata_path(&["objects", &hex[..2]]);

        let compressed =
            compress(&object.to_record()).map_err(|e| StoreError::io(&path, e))?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(&shard).map_err(|e| StoreError::io(&shard, e))?;
        tmp.write_all(&compressed)
            .map_err(|e| StoreError::io(tmp.path().to_path_buf(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        tracing::debug!(id = %id, bytes = compressed.len(), "stored object");
        Ok(id)
    }

    /// Load and decode the object stored under `id`.
    ///
    /// A record whose declared length does not match its payload, whose
    /// compressed stream is invalid, or whose payload fails the variant
    /// decoder is reported as corrupt, never skipped.
    pub fn read(&self, id: &ObjectId) -> Result<Object> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_hex()));
        }
        let compressed = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let raw = decompress(&compressed)
            .map_err(|_| StoreError::malformed(id, "invalid compressed data"))?;
        let (kind, payload) = parse_record(&raw, id)?;
        Object::from_bytes(kind, payload).map_err(|e| StoreError::malformed(id, e.to_string()))
    }

    /// Resolve a name to a full digest.
    ///
    /// Accepted forms: `HEAD` (following one `ref:` indirection), a full
    /// 40-hex digest, a 4..40-hex prefix matched against the store, or a
    /// name under `refs/tags/` or `refs/heads/`. Zero matches fail with
    /// `NotFound`; several distinct matches with `AmbiguousReference`.
    pub fn resolve(&self, name: &str) -> Result<ObjectId> {
        let name = name.trim();
        let mut candidates: Vec<ObjectId> = Vec::new();

        if name == "HEAD" {
            if let Some(id) = self.resolve_head()? {
                candidates.push(id);
            }
        } else if !name.is_empty() {
            if is_hex_prefix(name) {
                candidates.extend(self.match_prefix(&name.to_ascii_lowercase())?);
            }
            for namespace in ["tags", "heads"] {
                if let Some(id) = self.read_ref(&["refs", namespace, name])? {
                    candidates.push(id);
                }
            }
        }

        candidates.sort();
        candidates.dedup();
        match candidates.as_slice() {
            [] => Err(StoreError::NotFound(name.to_string())),
            [id] => Ok(*id),
            _ => Err(StoreError::AmbiguousReference(name.to_string())),
        }
    }

    /// Digest HEAD points at, if its target exists yet
    fn resolve_head(&self) -> Result<Option<ObjectId>> {
        let path = self.repo.metadata_path(&["HEAD"]);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let target = text.trim();
        if let Some(refname) = target.strip_prefix("ref: ") {
            let segments: Vec<&str> = refname.trim().split('/').collect();
            return self.read_ref(&segments);
        }
        // Detached HEAD: the file holds a digest directly.
        Ok(ObjectId::from_hex(target).ok())
    }

    fn read_ref(&self, segments: &[&str]) -> Result<Option<ObjectId>> {
        let Some(path) = self.repo.metadata_file(segments, false)? else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(ObjectId::from_hex(text.trim()).ok())
    }

    /// All stored digests starting with `prefix` (lowercase hex, len >= 2)
    fn match_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let shard = &prefix[..2];
        let Some(dir) = self.repo.metadata_dir(&["objects", shard], false)? else {
            return Ok(Vec::new());
        };
        let mut matches = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let full = format!("{shard}{name}");
            if !full.starts_with(prefix) {
                continue;
            }
            if let Ok(id) = ObjectId::from_hex(&full) {
                matches.push(id);
            }
        }
        Ok(matches)
    }
}

/// Parse the `<tag> SP <decimal-length> NUL` header of an uncompressed
/// record, verifying the declared length against the actual payload.
fn parse_record<'a>(raw: &'a [u8], id: &ObjectId) -> Result<(ObjectKind, &'a [u8])> {
    let sp = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| StoreError::malformed(id, "missing type separator"))?;
    let tag = &raw[..sp];
    let nul = raw[sp + 1..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| i + sp + 1)
        .ok_or_else(|| StoreError::malformed(id, "missing length terminator"))?;

    let len_text = std::str::from_utf8(&raw[sp + 1..nul])
        .map_err(|_| StoreError::malformed(id, "non-ASCII length field"))?;
    let declared: usize = len_text
        .parse()
        .map_err(|_| StoreError::malformed(id, format!("invalid length {len_text:?}")))?;
    let payload = &raw[nul + 1..];
    if declared != payload.len() {
        return Err(StoreError::malformed(
            id,
            format!(
                "declared length {declared} but payload is {} bytes",
                payload.len()
            ),
        ));
    }

    let kind = ObjectKind::from_tag(tag).ok_or_else(|| StoreError::UnknownType {
        id: id.to_hex(),
        kind: String::from_utf8_lossy(tag).into_owned(),
    })?;
    Ok((kind, payload))
}

fn is_hex_prefix(name: &str) -> bool {
    (4..=40).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_hexdigit())
}

pub(crate) fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub(crate) fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
