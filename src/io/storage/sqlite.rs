// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SQLite storage engine (`storage_identifier: sqlite3`).
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE topics (
//!     id INTEGER PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     type TEXT NOT NULL,
//!     serialization_format TEXT NOT NULL,
//!     offered_qos_profiles TEXT NOT NULL,  -- absent before Foxy
//!     type_description_hash TEXT NOT NULL  -- Iron and later
//! );
//! CREATE TABLE messages (
//!     id INTEGER PRIMARY KEY,
//!     topic_id INTEGER NOT NULL,
//!     timestamp INTEGER NOT NULL,
//!     data BLOB NOT NULL
//! );
//! ```
//!
//! Databases are opened read-only, either from a file on disk or from the
//! file's bytes loaded into an in-memory connection (bags that are not on a
//! local disk). Record streams fetch one page at a
//! time with keyset pagination on `(timestamp, id)`, so no statement stays
//! open between pulls and a unit can serve several streams at once.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::serialize::OwnedData;
use rusqlite::{params_from_iter, Connection, DatabaseName, OpenFlags};
use tracing::debug;

use crate::core::{BagError, Result, Time};
use crate::io::filter::RecordFilter;
use crate::io::metadata::{ChannelDefinition, RawRecord};
use crate::io::traits::{RecordStream, StorageUnit};
use crate::manifest::parse_qos_profiles;

/// Storage file extension written by the SQLite plugin.
pub const SQLITE_EXTENSION: &str = "db3";

/// Tuning for the SQLite engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Rows fetched per page while streaming
    pub batch_size: usize,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self { batch_size: 1024 }
    }
}

impl SqliteConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

struct DbContext {
    conn: Mutex<Connection>,
    channels: Vec<ChannelDefinition>,
    id_to_channel: HashMap<i64, Arc<ChannelDefinition>>,
    name_to_id: HashMap<String, i64>,
}

impl DbContext {
    fn lock(&self, path: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BagError::storage(path, "connection mutex poisoned"))
    }
}

enum DbSource {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A single `.db3` file.
pub struct SqliteUnit {
    relative_path: String,
    source: DbSource,
    config: SqliteConfig,
    context: Option<Arc<DbContext>>,
}

impl SqliteUnit {
    pub fn new(relative_path: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self::with_source(relative_path.into(), DbSource::File(file_path.into()))
    }

    /// A unit backed by the complete contents of a `.db3` file.
    pub fn from_bytes(relative_path: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::with_source(relative_path.into(), DbSource::Bytes(data.into()))
    }

    fn with_source(relative_path: String, source: DbSource) -> Self {
        Self {
            relative_path,
            source,
            config: SqliteConfig::default(),
            context: None,
        }
    }

    pub fn with_config(mut self, config: SqliteConfig) -> Self {
        self.config = config;
        self
    }

    fn context(&self, operation: &'static str) -> Result<&Arc<DbContext>> {
        self.context.as_ref().ok_or_else(|| {
            BagError::storage(
                &self.relative_path,
                format!("storage unit must be opened before it can {operation}"),
            )
        })
    }

    fn err(&self) -> impl Fn(rusqlite::Error) -> BagError + '_ {
        move |e| BagError::storage(&self.relative_path, e.to_string())
    }

    fn connect(&self) -> Result<Connection> {
        match &self.source {
            DbSource::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(self.err()),
            DbSource::Bytes(data) => self.deserialize(data),
        }
    }

    fn deserialize(&self, data: &[u8]) -> Result<Connection> {
        if data.is_empty() {
            return Err(BagError::storage(&self.relative_path, "database file is empty"));
        }
        let mut conn = Connection::open_in_memory().map_err(self.err())?;
        let len = data.len();
        // SAFETY: the buffer comes from sqlite3_malloc64 with room for `len`
        // bytes; OwnedData hands it to SQLite, which frees it on close.
        let owned = unsafe {
            let raw = rusqlite::ffi::sqlite3_malloc64(len as u64).cast::<u8>();
            let ptr = NonNull::new(raw)
                .ok_or_else(|| BagError::storage(&self.relative_path, "out of memory"))?;
            let buf = std::slice::from_raw_parts_mut(ptr.as_ptr(), len);
            buf.copy_from_slice(data);
            // A WAL-mode header would make SQLite look for a -wal file.
            if len > 19 && buf[18] == 2 && buf[19] == 2 {
                buf[18] = 1;
                buf[19] = 1;
            }
            OwnedData::from_raw_nonnull(ptr, len)
        };
        conn.deserialize(DatabaseName::Main, owned, true)
            .map_err(self.err())?;
        Ok(conn)
    }

    fn load_channels(&self, conn: &Connection) -> Result<Vec<(i64, ChannelDefinition)>> {
        let mut pragma = conn
            .prepare("PRAGMA table_info(topics)")
            .map_err(self.err())?;
        let columns = pragma
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(self.err())?
            .collect::<rusqlite::Result<HashSet<String>>>()
            .map_err(self.err())?;

        let qos = if columns.contains("offered_qos_profiles") {
            "offered_qos_profiles"
        } else {
            "NULL"
        };
        let hash = if columns.contains("type_description_hash") {
            "type_description_hash"
        } else {
            "NULL"
        };
        let sql = format!(
            "SELECT id, name, type, serialization_format, {qos}, {hash} FROM topics ORDER BY id"
        );

        let mut stmt = conn.prepare(&sql).map_err(self.err())?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })
            .map_err(self.err())?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(self.err())?;

        Ok(rows
            .into_iter()
            .map(|(id, name, schema_type, format, qos, hash)| {
                let mut channel = ChannelDefinition::new(name, schema_type)
                    .with_serialization_format(format)
                    .with_qos_profiles(qos.as_deref().map(parse_qos_profiles).unwrap_or_default());
                if let Some(hash) = hash.filter(|h| !h.is_empty()) {
                    channel = channel.with_type_description_hash(hash);
                }
                (id, channel)
            })
            .collect())
    }
}

impl StorageUnit for SqliteUnit {
    fn path(&self) -> &str {
        &self.relative_path
    }

    fn open(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }

        let conn = self.connect()?;
        let loaded = self.load_channels(&conn)?;
        let mut channels = Vec::with_capacity(loaded.len());
        let mut id_to_channel = HashMap::with_capacity(loaded.len());
        let mut name_to_id = HashMap::with_capacity(loaded.len());
        for (id, channel) in loaded {
            name_to_id.insert(channel.name.clone(), id);
            id_to_channel.insert(id, Arc::new(channel.clone()));
            channels.push(channel);
        }
        debug!(
            path = %self.relative_path,
            channels = channels.len(),
            "opened sqlite storage unit"
        );

        self.context = Some(Arc::new(DbContext {
            conn: Mutex::new(conn),
            channels,
            id_to_channel,
            name_to_id,
        }));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.context.take().is_some() {
            debug!(path = %self.relative_path, "closed sqlite storage unit");
        }
        Ok(())
    }

    fn read_channels(&self) -> Result<Vec<ChannelDefinition>> {
        Ok(self.context("read channels")?.channels.clone())
    }

    fn read_records(&self, filter: &RecordFilter) -> Result<Box<dyn RecordStream>> {
        let context = Arc::clone(self.context("read records")?);

        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        if let Some(start) = filter.start_time {
            conditions.push("timestamp >= ?".to_string());
            binds.push(start.to_nanos());
        }
        if let Some(end) = filter.end_time {
            conditions.push("timestamp < ?".to_string());
            binds.push(end.to_nanos());
        }
        let mut exhausted = false;
        if let Some(topics) = &filter.topics {
            let ids: Vec<i64> = topics
                .iter()
                .filter_map(|name| context.name_to_id.get(name).copied())
                .collect();
            if ids.is_empty() {
                exhausted = true;
            } else {
                let placeholders = vec!["?"; ids.len()].join(",");
                conditions.push(format!("topic_id IN ({placeholders})"));
                binds.extend(ids);
            }
        }
        conditions.push("(timestamp > ? OR (timestamp = ? AND id > ?))".to_string());

        let sql = format!(
            "SELECT topic_id, timestamp, id, data FROM messages WHERE {} \
             ORDER BY timestamp, id LIMIT ?",
            conditions.join(" AND ")
        );

        Ok(Box::new(SqliteRecordStream {
            path: self.relative_path.clone(),
            context,
            sql,
            binds,
            batch_size: self.config.batch_size,
            position: None,
            buffer: VecDeque::new(),
            exhausted,
            pending_error: None,
        }))
    }

    fn time_range(&self) -> Result<Option<(Time, Time)>> {
        let context = self.context("query the time range")?;
        let conn = context.lock(&self.relative_path)?;
        let (start, end) = conn
            .query_row(
                "SELECT MIN(timestamp), MAX(timestamp) FROM messages",
                [],
                |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .map_err(self.err())?;
        Ok(start
            .zip(end)
            .map(|(start, end)| (Time::from_nanos(start), Time::from_nanos(end))))
    }

    fn channel_counts(&self) -> Result<HashMap<String, u64>> {
        let context = self.context("count messages")?;
        let conn = context.lock(&self.relative_path)?;
        let mut stmt = conn
            .prepare(
                "SELECT topics.name, COUNT(*) FROM messages \
                 INNER JOIN topics ON messages.topic_id = topics.id \
                 GROUP BY topics.id",
            )
            .map_err(self.err())?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(self.err())?;

        let mut counts = HashMap::new();
        for row in rows {
            let (name, count) = row.map_err(self.err())?;
            *counts.entry(name).or_insert(0) += count.max(0) as u64;
        }
        Ok(counts)
    }
}

/// Paged cursor over the `messages` table.
struct SqliteRecordStream {
    path: String,
    context: Arc<DbContext>,
    sql: String,
    binds: Vec<i64>,
    batch_size: usize,
    /// `(timestamp, id)` of the last row fetched
    position: Option<(i64, i64)>,
    buffer: VecDeque<RawRecord>,
    exhausted: bool,
    /// Failure hit mid-page, yielded once the rows before it are drained
    pending_error: Option<BagError>,
}

impl SqliteRecordStream {
    fn fetch_page(&mut self) -> Result<()> {
        let (after_ts, after_id) = self.position.unwrap_or((i64::MIN, i64::MIN));
        let mut binds = self.binds.clone();
        binds.extend([after_ts, after_ts, after_id, self.batch_size as i64]);

        let conn = self.context.lock(&self.path)?;
        let path = &self.path;
        let storage_err = |e: rusqlite::Error| BagError::storage(path, e.to_string());
        let mut stmt = conn.prepare_cached(&self.sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(binds.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })
            .map_err(storage_err)?;

        let mut fetched = 0usize;
        let mut failure = None;
        for row in rows {
            let (topic_id, timestamp, id, data) = match row {
                Ok(row) => row,
                Err(e) => {
                    failure = Some(storage_err(e));
                    break;
                }
            };
            let Some(channel) = self.context.id_to_channel.get(&topic_id) else {
                failure = Some(BagError::storage(
                    path,
                    format!(
                        "Cannot find topic_id {topic_id} in {} topics",
                        self.context.id_to_channel.len()
                    ),
                ));
                break;
            };
            self.buffer.push_back(RawRecord::new(
                Arc::clone(channel),
                Time::from_nanos(timestamp),
                data,
            ));
            self.position = Some((timestamp, id));
            fetched += 1;
        }

        // Rows buffered before a bad row are still yielded.
        if failure.is_some() || fetched < self.batch_size {
            self.exhausted = true;
        }
        self.pending_error = failure;
        Ok(())
    }
}

impl Iterator for SqliteRecordStream {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.release();
                return Some(Err(err));
            }
        }
        match self.buffer.pop_front() {
            Some(record) => Some(Ok(record)),
            None => self.pending_error.take().map(Err),
        }
    }
}

impl RecordStream for SqliteRecordStream {
    fn release(&mut self) {
        self.buffer.clear();
        self.exhausted = true;
        self.pending_error = None;
    }
}
