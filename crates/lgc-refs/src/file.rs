//! Commit history persisted as a single JSON document.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lgc_types::StreamId;
use tracing::{debug, warn};

use crate::error::{RefError, Result};
use crate::state::Namespace;
use crate::traits::CommitService;
use crate::types::{BranchInfo, Commit, CommitCreateInput};

/// How long a writer waits for another writer's lock file by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_RETRY: Duration = Duration::from_millis(20);

/// A [`CommitService`] backed by a JSON file.
///
/// Nothing is cached between calls. Every mutation takes `<path>.lock`
/// (created exclusively, as git does for refs), re-reads the document,
/// applies the change and renames a temporary file over the target before
/// releasing the lock. Several services or processes can therefore share
/// one file: concurrent commits all land, and a guarded commit whose
/// expected head went stale fails with [`RefError::Conflict`].
///
/// File access runs on tokio's blocking pool.
#[derive(Clone, Debug)]
pub struct FileCommitService {
    path: Arc<PathBuf>,
    lock_timeout: Duration,
}

impl FileCommitService {
    /// Open the document at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        load(&path)?;
        Ok(Self {
            path: Arc::new(path),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Give up with [`RefError::Unavailable`] when the lock is held longer.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Namespace) -> Result<T> + Send + 'static,
    {
        let path = Arc::clone(&self.path);
        let timeout = self.lock_timeout;
        blocking(move || {
            let _lock = LockFile::acquire(&path, timeout)?;
            let mut state = load(&path)?;
            let out = op(&mut state)?;
            persist(&path, &state)?;
            Ok(out)
        })
        .await
    }

    async fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Namespace) -> Result<T> + Send + 'static,
    {
        let path = Arc::clone(&self.path);
        blocking(move || op(&load(&path)?)).await
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RefError::Unavailable(e.to_string()))?
}

fn load(path: &Path) -> Result<Namespace> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| RefError::Serialization(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Namespace::default()),
        Err(e) => Err(e.into()),
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn persist(path: &Path, state: &Namespace) -> Result<()> {
    let bytes =
        serde_json::to_vec_pretty(state).map_err(|e| RefError::Serialization(e.to_string()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "persisted commit history");
    Ok(())
}

/// Exclusive writer lock, removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(target: &Path, timeout: Duration) -> Result<Self> {
        fs::create_dir_all(parent_dir(target))?;
        let mut name = target.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);

        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        warn!(lock = %path.display(), "gave up waiting for commit history lock");
                        return Err(RefError::Unavailable(format!(
                            "{} is held by another writer",
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "cannot remove lock file");
        }
    }
}

#[async_trait]
impl CommitService for FileCommitService {
    async fn create_stream(&self, stream: &StreamId) -> Result<()> {
        let stream = stream.clone();
        self.mutate(move |ns| ns.create_stream(&stream)).await
    }

    async fn create_branch(&self, stream: &StreamId, branch: &str) -> Result<()> {
        let (stream, branch) = (stream.clone(), branch.to_string());
        self.mutate(move |ns| ns.create_branch(&stream, &branch)).await
    }

    async fn list_branches(&self, stream: &StreamId) -> Result<Vec<BranchInfo>> {
        let stream = stream.clone();
        self.read(move |ns| ns.list_branches(&stream)).await
    }

    async fn get_head(&self, stream: &StreamId, branch: &str) -> Result<Option<Commit>> {
        let (stream, branch) = (stream.clone(), branch.to_string());
        self.read(move |ns| ns.head(&stream, &branch)).await
    }

    async fn create_commit(&self, input: CommitCreateInput) -> Result<Commit> {
        self.mutate(move |ns| ns.commit(input)).await
    }

    async fn log(&self, stream: &StreamId, branch: &str, limit: usize) -> Result<Vec<Commit>> {
        let (stream, branch) = (stream.clone(), branch.to_string());
        self.read(move |ns| ns.log(&stream, &branch, limit)).await
    }
}
