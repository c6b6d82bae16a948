// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.
//!
//! Bags are generated on the fly in a temporary directory: SQLite storage
//! files with the rosbag2 schema, a `metadata.yaml`, and CDR payloads built
//! by hand.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::TempDir;

/// QoS profile YAML as written by a Humble recorder for a reliable,
/// transient-local publisher with infinite deadline and lifespan.
pub const QOS_YAML: &str = "- history: 3
  depth: 0
  reliability: 1
  durability: 1
  deadline:
    sec: 2147483647
    nsec: 4294967295
  lifespan:
    sec: 10
    nsec: 0
  liveliness: 1
  liveliness_lease_duration:
    sec: 0
    nsec: 0
  avoid_ros_namespace_conventions: false";

// ============================================================================
// Storage files
// ============================================================================

/// One SQLite storage file under construction.
pub struct DbFixture {
    conn: Connection,
}

impl DbFixture {
    /// Create a database with the current rosbag2 schema.
    pub fn create(path: &Path) -> Self {
        let conn = Connection::open(path).expect("create db3");
        conn.execute_batch(
            "CREATE TABLE schema (schema_version INTEGER PRIMARY KEY, ros_distro TEXT NOT NULL);
             INSERT INTO schema VALUES (4, 'humble');
             CREATE TABLE topics (id INTEGER PRIMARY KEY, name TEXT NOT NULL, type TEXT NOT NULL,
                serialization_format TEXT NOT NULL, offered_qos_profiles TEXT NOT NULL,
                type_description_hash TEXT NOT NULL);
             CREATE TABLE messages (id INTEGER PRIMARY KEY, topic_id INTEGER NOT NULL,
                timestamp INTEGER NOT NULL, data BLOB NOT NULL);
             CREATE INDEX timestamp_idx ON messages (timestamp ASC);",
        )
        .expect("create tables");
        Self { conn }
    }

    /// Create a database from before QoS profiles were recorded.
    pub fn create_legacy(path: &Path) -> Self {
        let conn = Connection::open(path).expect("create db3");
        conn.execute_batch(
            "CREATE TABLE topics (id INTEGER PRIMARY KEY, name TEXT NOT NULL, type TEXT NOT NULL,
                serialization_format TEXT NOT NULL);
             CREATE TABLE messages (id INTEGER PRIMARY KEY, topic_id INTEGER NOT NULL,
                timestamp INTEGER NOT NULL, data BLOB NOT NULL);",
        )
        .expect("create tables");
        Self { conn }
    }

    pub fn topic(self, id: i64, name: &str, schema_type: &str) -> Self {
        self.topic_with_qos(id, name, schema_type, QOS_YAML)
    }

    pub fn topic_with_qos(self, id: i64, name: &str, schema_type: &str, qos: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO topics VALUES (?1, ?2, ?3, 'cdr', ?4, '')",
                params![id, name, schema_type, qos],
            )
            .expect("insert topic");
        self
    }

    pub fn legacy_topic(self, id: i64, name: &str, schema_type: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO topics VALUES (?1, ?2, ?3, 'cdr')",
                params![id, name, schema_type],
            )
            .expect("insert topic");
        self
    }

    pub fn message(self, topic_id: i64, timestamp: i64, data: &[u8]) -> Self {
        self.conn
            .execute(
                "INSERT INTO messages (topic_id, timestamp, data) VALUES (?1, ?2, ?3)",
                params![topic_id, timestamp, data],
            )
            .expect("insert message");
        self
    }
}

// ============================================================================
// Bag directories
// ============================================================================

/// A bag directory that is removed when dropped.
pub struct BagFixture {
    dir: TempDir,
}

impl BagFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Start a storage file; drop the returned fixture to flush it.
    pub fn db(&self, relative: &str) -> DbFixture {
        DbFixture::create(&self.file(relative))
    }

    pub fn manifest(&self, text: &str) -> &Self {
        std::fs::write(self.file("metadata.yaml"), text).expect("write manifest");
        self
    }

    pub fn path_str(&self) -> &str {
        self.path().to_str().expect("utf-8 temp path")
    }
}

/// A version 4 manifest listing `files`.
pub fn manifest_yaml(files: &[&str], message_count: u64) -> String {
    let mut text = String::from(
        "rosbag2_bagfile_information:\n  version: 4\n  storage_identifier: sqlite3\n  relative_file_paths:\n",
    );
    for file in files {
        text.push_str(&format!("    - {file}\n"));
    }
    text.push_str(&format!(
        "  duration:\n    nanoseconds: 20\n  starting_time:\n    nanoseconds_since_epoch: 5\n  message_count: {message_count}\n  topics_with_message_count: []\n  compression_format: \"\"\n  compression_mode: \"\"\n"
    ));
    text
}

// ============================================================================
// CDR payloads
// ============================================================================

/// Little-endian CDR payload builder with alignment relative to the body.
#[derive(Default)]
pub struct Cdr {
    body: Vec<u8>,
}

impl Cdr {
    pub fn new() -> Self {
        Self::default()
    }

    fn align(&mut self, size: usize) {
        while self.body.len() % size != 0 {
            self.body.push(0);
        }
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.body.push(v);
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.align(4);
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.align(4);
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.align(8);
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn string(self, s: &str) -> Self {
        let mut this = self.u32(s.len() as u32 + 1);
        this.body.extend_from_slice(s.as_bytes());
        this.body.push(0);
        this
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend(self.body);
        data
    }
}

/// `std_msgs/msg/String` payload.
pub fn string_msg(s: &str) -> Vec<u8> {
    Cdr::new().string(s).build()
}
