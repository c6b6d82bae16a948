// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag
//!
//! Reader for ROS 2 rosbag2 recordings.
//!
//! A rosbag2 bag is a directory holding a `metadata.yaml` manifest and one
//! or more storage files (SQLite `.db3` by default). This library reads
//! the manifest, opens every storage unit, and streams messages as raw CDR
//! bytes or as decoded field trees.
//!
//! ## Architecture
//!
//! - `core/` - errors, timestamps, decoded values
//! - `manifest/` - `metadata.yaml` and QoS profile parsing
//! - `io/` - file systems, storage units (SQLite, in-memory), record iterators
//! - `schema/` - `.msg` parsing and the message type registry
//! - `encoding/` - CDR decoding and the per-bag decoder cache
//! - `bag/` - the [`Bag`] orchestrator and [`BagBuilder`]
//!
//! ## Example: Reading a bag
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robobag::{Bag, ReadOptions, Time};
//!
//! let mut bag = Bag::open_path("recordings/talker")?;
//! let (start, end) = bag.time_range()?;
//! println!("{start} .. {end}");
//!
//! let options = ReadOptions::new()
//!     .with_topics(["/chatter"])
//!     .with_start_time(Time::new(start.sec + 1, 0));
//! for message in bag.read_messages(&options)? {
//!     let message = message?;
//!     if let Some(value) = message.decoded() {
//!         println!("{}: {:?}", message.topic(), value.get("data"));
//!     }
//! }
//! bag.close()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use crate::core::{BagError, CodecValue, DecodedMessage, Duration, Result, Time};

// Manifest and QoS
pub mod manifest;

pub use manifest::{Manifest, QosProfile};

// I/O: file systems, storage engines, iterators
pub mod io;

pub use io::{
    BagFileSystem, ChannelDefinition, LocalFileSystem, MemoryFileSystem, Message, MessageIter,
    RawRecord, ReadOptions, RecordStream, SqliteConfig, StorageFactory, StorageUnit, TopicFilter,
};

// Schema parsing
pub mod schema;

pub use schema::MsgRegistry;

// Decoding
pub mod encoding;

pub use encoding::{DecoderCache, MessageDecoder, SchemaRegistry};

// Bag orchestration
pub mod bag;

pub use bag::{Bag, BagBuilder, BagState};
