//! Repository root and metadata directory layout
//!
//! A repository is a worktree directory with a `.git` metadata directory
//! nested one level under it. This module validates and represents that
//! layout, creates it from scratch, discovers it from any subdirectory,
//! and resolves paths inside the metadata directory.

use crate::config::{ConfigError, RepoConfig, SUPPORTED_FORMAT_VERSION};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Name of the metadata directory nested under the worktree root
pub const METADATA_DIR: &str = ".git";

/// Branch that a freshly created HEAD points at
pub const DEFAULT_BRANCH: &str = "master";

const DESCRIPTION_PLACEHOLDER: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

/// Errors that can occur during repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("not a gvcs repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("config file missing in {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unsupported repository format version {0:?}")]
    UnsupportedFormatVersion(String),

    #[error("{} is not empty", .0.display())]
    NotEmpty(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no repository found above {}", .0.display())]
    NoRepositoryFound(PathBuf),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RepositoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validated repository root: worktree plus metadata directory
///
/// Immutable after construction. Strict construction (`open`) requires an
/// existing metadata directory and a supported format version; the
/// permissive path exists only so `create` can lay out a fresh skeleton.
#[derive(Debug)]
pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: RepoConfig,
}

impl Repository {
    /// Open an existing repository rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path.as_ref(), false)
    }

    fn load(path: &Path, permissive: bool) -> Result<Self> {
        let worktree = absolutize(path)?;
        let gitdir = worktree.join(METADATA_DIR);
        if !permissive && !gitdir.is_dir() {
            return Err(RepositoryError::NotARepository(worktree));
        }

        let config_path = gitdir.join("config");
        let config = match fs::read_to_string(&config_path) {
            Ok(text) => RepoConfig::parse(&text)?,
            // NotADirectory arises when the worktree or gitdir path is a
            // regular file; permissive construction leaves that for
            // `create` to diagnose.
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                if permissive {
                    RepoConfig::default_config()
                } else {
                    return Err(RepositoryError::ConfigMissing(gitdir));
                }
            }
            Err(err) => return Err(RepositoryError::io(config_path, err)),
        };

        if !permissive {
            let version = config.format_version().unwrap_or_default();
            if version.trim().parse::<u32>().ok() != Some(SUPPORTED_FORMAT_VERSION) {
                return Err(RepositoryError::UnsupportedFormatVersion(
                    version.to_string(),
                ));
            }
        }

        Ok(Self {
            worktree,
            gitdir,
            config,
        })
    }

    /// Create a fresh repository at `path`, laying out the metadata
    /// skeleton: `branches/`, `objects/`, `refs/tags/`, `refs/heads/`,
    /// `description`, `HEAD` and `config`.
    ///
    /// Concurrent creation of the same path is not serialized here;
    /// callers needing that guarantee must coordinate externally.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Self::load(path.as_ref(), true)?;

        if repo.worktree.exists() {
            if !repo.worktree.is_dir() {
                return Err(RepositoryError::NotADirectory(repo.worktree));
            }
            if repo.gitdir.exists() {
                let mut entries = fs::read_dir(&repo.gitdir)
                    .map_err(|e| RepositoryError::io(&repo.gitdir, e))?;
                if entries.next().is_some() {
                    return Err(RepositoryError::NotEmpty(repo.gitdir));
                }
            }
        } else {
            fs::create_dir_all(&repo.worktree)
                .map_err(|e| RepositoryError::io(&repo.worktree, e))?;
        }

        repo.metadata_dir(&["branches"], true)?;
        repo.metadata_dir(&["objects"], true)?;
        repo.metadata_dir(&["refs", "tags"], true)?;
        repo.metadata_dir(&["refs", "heads"], true)?;

        write_file(
            &repo.metadata_path(&["description"]),
            DESCRIPTION_PLACEHOLDER,
        )?;
        write_file(
            &repo.metadata_path(&["HEAD"]),
            &format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
        )?;
        write_file(&repo.metadata_path(&["config"]), &repo.config.serialize())?;

        tracing::info!(path = %repo.gitdir.display(), "initialized empty repository");
        Ok(repo)
    }

    /// Walk upward from `start` and open the first enclosing repository
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        Self::try_discover(start)?
            .ok_or_else(|| RepositoryError::NoRepositoryFound(start.to_path_buf()))
    }

    /// Like `discover`, but yields `None` instead of failing when the
    /// filesystem root is reached without finding a repository.
    pub fn try_discover(start: impl AsRef<Path>) -> Result<Option<Self>> {
        let mut current = absolutize(start.as_ref())?;
        loop {
            if current.join(METADATA_DIR).is_dir() {
                return Self::open(&current).map(Some);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Absolute path of the directory under version control
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// Absolute path of the metadata directory
    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    /// Repository configuration
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    // ==================== Path resolution ====================

    /// Join `segments` under the metadata directory. Pure, no I/O.
    pub fn metadata_path(&self, segments: &[&str]) -> PathBuf {
        let mut path = self.gitdir.clone();
        for segment in segments {
            path.push(segment);
        }
        path
    }

    /// Resolve a directory inside the metadata directory.
    ///
    /// Returns the path if it exists (or was created on request), `None`
    /// if absent and `create` is false, and `NotADirectory` if the path
    /// exists but is a regular file.
    pub fn metadata_dir(&self, segments: &[&str], create: bool) -> Result<Option<PathBuf>> {
        let path = self.metadata_path(segments);
        if path.exists() {
            if path.is_dir() {
                return Ok(Some(path));
            }
            return Err(RepositoryError::NotADirectory(path));
        }
        if create {
            fs::create_dir_all(&path).map_err(|e| match e.kind() {
                io::ErrorKind::NotADirectory => RepositoryError::NotADirectory(path.clone()),
                _ => RepositoryError::io(&path, e),
            })?;
            return Ok(Some(path));
        }
        Ok(None)
    }

    /// Resolve a file path inside the metadata directory, ensuring the
    /// parent directory chain exists when `create_parents` is set.
    ///
    /// `None` means a needed parent is absent and creation was not
    /// requested; the file itself is never created here.
    pub fn metadata_file(&self, segments: &[&str], create_parents: bool) -> Result<Option<PathBuf>> {
        let Some((_, parents)) = segments.split_last() else {
            return Ok(Some(self.gitdir.clone()));
        };
        match self.metadata_dir(parents, create_parents)? {
            Some(_) => Ok(Some(self.metadata_path(segments))),
            None => Ok(None),
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| RepositoryError::io(path, e))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| RepositoryError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_lays_out_skeleton() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("repo");
        let repo = Repository::create(&root).unwrap();

        assert_eq!(repo.worktree(), root.as_path());
        assert_eq!(repo.gitdir(), root.join(".git").as_path());
        for dir in ["branches", "objects", "refs/tags", "refs/heads"] {
            assert!(root.join(".git").join(dir).is_dir(), "{dir} missing");
        }
        let head = fs::read_to_string(root.join(".git/HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/master\n");
        let config = fs::read_to_string(root.join(".git/config")).unwrap();
        assert!(config.contains("repositoryformatversion = 0"));
        assert!(root.join(".git/description").is_file());
    }

    #[test]
    fn test_create_then_open() {
        let temp = TempDir::new().unwrap();
        Repository::create(temp.path()).unwrap();
        let repo = Repository::open(temp.path()).unwrap();
        assert_eq!(repo.config().get("core", "bare"), Some("false"));
    }

    #[test]
    fn test_create_on_nonempty_metadata_dir_fails() {
        let temp = TempDir::new().unwrap();
        let gitdir = temp.path().join(".git");
        fs::create_dir_all(&gitdir).unwrap();
        fs::write(gitdir.join("stray"), b"x").unwrap();

        let err = Repository::create(temp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotEmpty(_)));
        // The stray file is untouched and nothing else was written.
        assert!(gitdir.join("stray").is_file());
        assert!(!gitdir.join("objects").exists());
    }

    #[test]
    fn test_create_on_empty_metadata_dir_succeeds() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        Repository::create(temp.path()).unwrap();
        assert!(temp.path().join(".git/objects").is_dir());
    }

    #[test]
    fn test_create_over_file_fails() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("plainfile");
        fs::write(&target, b"x").unwrap();
        let err = Repository::create(&target).unwrap_err();
        assert!(matches!(err, RepositoryError::NotADirectory(_)));
    }

    #[test]
    fn test_open_plain_dir_fails() {
        let temp = TempDir::new().unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotARepository(_)));
    }

    #[test]
    fn test_open_missing_config_fails() {
        let temp = TempDir::new().unwrap();
        Repository::create(temp.path()).unwrap();
        fs::remove_file(temp.path().join(".git/config")).unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigMissing(_)));
    }

    #[test]
    fn test_open_unsupported_version_fails() {
        let temp = TempDir::new().unwrap();
        Repository::create(temp.path()).unwrap();
        fs::write(
            temp.path().join(".git/config"),
            "[core]\n\trepositoryformatversion = 1\n",
        )
        .unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        match err {
            RepositoryError::UnsupportedFormatVersion(v) => assert_eq!(v, "1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_open_malformed_config_fails() {
        let temp = TempDir::new().unwrap();
        Repository::create(temp.path()).unwrap();
        fs::write(temp.path().join(".git/config"), "not an ini file\n").unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::Config(_)));
    }

    #[test]
    fn test_discover_from_nested_subdirectory() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::create(temp.path()).unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = Repository::discover(&nested).unwrap();
        assert_eq!(found.worktree(), repo.worktree());
    }

    #[test]
    fn test_discover_without_repository_fails() {
        let temp = TempDir::new().unwrap();
        let err = Repository::discover(temp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::NoRepositoryFound(_)));
        assert!(Repository::try_discover(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_metadata_file_respects_create_parents() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::create(temp.path()).unwrap();

        // Parent chain absent, creation not requested.
        assert!(repo
            .metadata_file(&["objects", "ab", "cdef"], false)
            .unwrap()
            .is_none());

        // Creation requested: parents appear, file path is returned.
        let path = repo
            .metadata_file(&["objects", "ab", "cdef"], true)
            .unwrap()
            .unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_metadata_dir_conflicting_file_fails() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::create(temp.path()).unwrap();
        // "description" exists as a regular file.
        let err = repo.metadata_dir(&["description"], false).unwrap_err();
        assert!(matches!(err, RepositoryError::NotADirectory(_)));
    }
}
