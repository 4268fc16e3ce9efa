//! Block store handle owned by the node for its whole run.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::DbType;

pub const LOCK_FILENAME: &str = "LOCK";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("block database {} is in use by another process", .0.display())]
    Locked(PathBuf),

    #[error("block database {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Directory of the block database inside the data directory.
pub fn block_db_path(data_dir: &Path, db_type: DbType) -> PathBuf {
    data_dir.join(format!("blocks_{}", db_type.name()))
}

/// An open block database.
///
/// `leveldb` lives on disk and is guarded by an exclusive `LOCK` file;
/// `memdb` keeps nothing on disk.
#[derive(Debug)]
pub struct BlockStore {
    db_type: DbType,
    path: Option<PathBuf>,
    lock: Option<File>,
}

impl BlockStore {
    pub fn open(data_dir: &Path, db_type: DbType) -> Result<Self, StorageError> {
        let (path, lock) = match db_type {
            DbType::MemDb => {
                tracing::info!("Creating block database in memory");
                (None, None)
            }
            DbType::LevelDb => {
                let path = block_db_path(data_dir, db_type);
                tracing::info!(path = %path.display(), "Loading block database");
                fs::create_dir_all(&path).map_err(|e| StorageError::io(&path, e))?;
                let lock = acquire_lock(&path)?;
                (Some(path), Some(lock))
            }
        };

        Ok(Self {
            db_type,
            path,
            lock,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the database and its lock file.
    pub fn rollback_close(mut self) -> Result<(), StorageError> {
        drop(self.lock.take());
        if let Some(path) = &self.path {
            let lock_path = path.join(LOCK_FILENAME);
            match fs::remove_file(&lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&lock_path, e)),
            }
        }
        tracing::info!(db_type = %self.db_type, "Block database closed");
        Ok(())
    }
}

fn acquire_lock(dir: &Path) -> Result<File, StorageError> {
    let lock_path = dir.join(LOCK_FILENAME);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&lock_path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::Locked(dir.to_path_buf()),
            _ => StorageError::io(&lock_path, e),
        })?;
    writeln!(file, "{}", std::process::id()).map_err(|e| StorageError::io(&lock_path, e))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leveldb_layout_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::open(dir.path(), DbType::LevelDb).unwrap();
        let db_path = dir.path().join("blocks_leveldb");
        assert_eq!(store.path(), Some(db_path.as_path()));
        assert!(db_path.join(LOCK_FILENAME).exists());

        let err = BlockStore::open(dir.path(), DbType::LevelDb).unwrap_err();
        assert!(matches!(err, StorageError::Locked(_)));

        store.rollback_close().unwrap();
        assert!(!db_path.join(LOCK_FILENAME).exists());

        let reopened = BlockStore::open(dir.path(), DbType::LevelDb).unwrap();
        reopened.rollback_close().unwrap();
    }

    #[test]
    fn test_memdb_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::open(dir.path(), DbType::MemDb).unwrap();
        assert!(store.path().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        store.rollback_close().unwrap();
    }
}
