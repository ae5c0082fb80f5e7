//! SQLite cache store for persistent storage.

use super::{CacheStats, CacheStore, FingerprintRecord};
use crate::core::hasher::Fingerprint;
use crate::error::CacheError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// SQLite-backed persistent cache
///
/// Uses WAL (Write-Ahead Logging) mode so other processes can read the
/// database while a scan writes to it. Within the process, one connection is
/// shared behind a mutex.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCache {
    /// Open or create a cache database at the given path
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CacheError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| CacheError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                path TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                algorithm TEXT NOT NULL,
                file_size INTEGER,
                file_modified INTEGER,
                computed_at INTEGER NOT NULL,
                file_modified_ns INTEGER
            )",
            [],
        )
        .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Self::add_nanosecond_column(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    /// Convert SystemTime to Unix timestamp
    fn to_timestamp(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64
    }

    /// Convert Unix timestamp to SystemTime
    fn from_timestamp(timestamp: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64)
    }

    fn to_nanos(time: SystemTime) -> i64 {
        let nanos = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_nanos();
        i64::try_from(nanos).unwrap_or(i64::MAX)
    }

    fn from_nanos(nanos: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(nanos.max(0) as u64)
    }

    /// Databases created before mtimes were kept in nanoseconds lack the
    /// `file_modified_ns` column; their rows keep second precision.
    fn add_nanosecond_column(conn: &Connection) -> Result<(), CacheError> {
        let mut stmt = conn
            .prepare("PRAGMA table_info(fingerprints)")
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(1))
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);

        if !columns.iter().any(|c| c == "file_modified_ns") {
            conn.execute("ALTER TABLE fingerprints ADD COLUMN file_modified_ns INTEGER", [])
                .map_err(|e| CacheError::QueryFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &Path) -> Result<Option<FingerprintRecord>, CacheError> {
        let conn = self.lock()?;
        let key_str = key.to_string_lossy();

        let row = conn
            .query_row(
                "SELECT hash, algorithm, file_size, file_modified, computed_at, file_modified_ns
                 FROM fingerprints WHERE path = ?",
                [&key_str],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let Some((hash, algorithm, file_size, modified_secs, computed_at, modified_nanos)) = row
        else {
            return Ok(None);
        };

        let (file_modified, modified_in_seconds) = match (modified_nanos, modified_secs) {
            (Some(nanos), _) => (Some(Self::from_nanos(nanos)), false),
            (None, Some(secs)) => (Some(Self::from_timestamp(secs)), true),
            (None, None) => (None, false),
        };

        let hash: Fingerprint = hash.parse().map_err(|_| CacheError::InvalidFingerprint {
            path: key.to_path_buf(),
            value: hash.clone(),
        })?;

        Ok(Some(FingerprintRecord {
            path: key.to_path_buf(),
            hash,
            algorithm,
            file_size: file_size.map(|v| v as u64),
            file_modified,
            modified_in_seconds,
            computed_at: Self::from_timestamp(computed_at),
        }))
    }

    fn set(&self, record: FingerprintRecord) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let path_str = record.path.to_string_lossy();

        conn.execute(
            "INSERT OR REPLACE INTO fingerprints
             (path, hash, algorithm, file_size, file_modified, computed_at, file_modified_ns)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                path_str,
                record.hash.to_string(),
                record.algorithm,
                record.file_size.map(|v| v as i64),
                record.file_modified.map(Self::to_timestamp),
                Self::to_timestamp(record.computed_at),
                record
                    .file_modified
                    .filter(|_| !record.modified_in_seconds)
                    .map(Self::to_nanos),
            ],
        )
        .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn invalidate(&self, key: &Path) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let key_str = key.to_string_lossy();

        conn.execute("DELETE FROM fingerprints WHERE path = ?", [&key_str])
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM fingerprints", [])
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.lock()?;

        let (total_entries, oldest, newest) = conn
            .query_row(
                "SELECT COUNT(*), MIN(computed_at), MAX(computed_at) FROM fingerprints",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)? as usize,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        Ok(CacheStats {
            total_entries,
            oldest_entry: oldest.map(Self::from_timestamp),
            newest_entry: newest.map(Self::from_timestamp),
        })
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT path FROM fingerprints")
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?;

        let paths: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| CacheError::QueryFailed(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        drop(stmt);

        let mut count = 0;
        for path in paths {
            if !Path::new(&path).exists() {
                conn.execute("DELETE FROM fingerprints WHERE path = ?", [&path])
                    .map_err(|e| CacheError::QueryFailed(e.to_string()))?;
                count += 1;
            }
        }

        Ok(count)
    }
}
