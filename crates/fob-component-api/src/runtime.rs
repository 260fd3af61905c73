//! File access abstraction for component analysis.
//!
//! Extraction itself is pure text processing; the only suspension points are
//! the file reads performed through a [`Runtime`]. [`NativeRuntime`] reads from
//! disk on tokio's blocking pool, [`MemoryRuntime`] serves an in-memory file map
//! and counts reads so cache behavior can be observed.

// NativeRuntime is the one place allowed to touch std::fs
#![allow(clippy::disallowed_methods)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::task;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failures of a [`Runtime`] read.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("no such file: {0}")]
    FileNotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The blocking read task panicked or was cancelled.
    #[error("read task for {path} did not complete: {message}")]
    Interrupted { path: PathBuf, message: String },
}

/// Read-only file access used by the analyzer and the type resolver.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a UTF-8 file.
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String>;

    /// Check whether `path` is an existing file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Native filesystem runtime.
///
/// Reads run on tokio's blocking pool so they never stall the async executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let owned = path.to_path_buf();
        let read = task::spawn_blocking(move || match std::fs::read_to_string(&owned) {
            Ok(content) => Ok(content),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                Err(RuntimeError::FileNotFound(owned))
            }
            Err(source) => Err(RuntimeError::Io {
                path: owned,
                source,
            }),
        });

        read.await.map_err(|error| RuntimeError::Interrupted {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory runtime keyed by path.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    files: RwLock<FxHashMap<PathBuf, String>>,
    reads: AtomicUsize,
}

impl MemoryRuntime {
    /// Create an empty in-memory runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    /// Builder-style variant of [`MemoryRuntime::insert`].
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Number of successful and failed reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}
