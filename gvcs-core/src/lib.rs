//! Gvcs Core Library
//!
//! Core functionality for gvcs including:
//! - Object model (Blob, Tree, Commit, Tag) and canonical encodings
//! - Content-addressed object store (hash, compress, shard, verify)
//! - Repository layout, creation and discovery
//! - Ini-style repository configuration

pub mod config;
pub mod object;
pub mod repository;
pub mod store;


pub use config::{ConfigError, RepoConfig, SUPPORTED_FORMAT_VERSION};
pub use object::{
    Blob, Commit, DecodeError, Object, ObjectId, ObjectKind, Signature, Tag, Tree, TreeEntry,
};
pub use repository::{Repository, RepositoryError, DEFAULT_BRANCH, METADATA_DIR};
pub use store::{ObjectStore, StoreError};
