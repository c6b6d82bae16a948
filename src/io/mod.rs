// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: bag files, storage units and record streams.

pub mod filter;
pub mod fs;
pub mod iter;
pub mod metadata;
pub mod storage;
pub mod traits;

pub use filter::{ReadOptions, RecordFilter, TopicFilter};
pub use fs::{BagFileSystem, FileLike, LocalFileSystem, MemoryFileSystem};
pub use iter::{MessageIter, MultiUnitIter};
pub use metadata::{ChannelDefinition, Message, RawRecord};
pub use storage::{
    memory_factory, sqlite_bytes_factory, sqlite_factory, MemoryUnit, SqliteConfig, SqliteUnit,
    StorageFactory,
};
pub use traits::{RecordStream, StorageUnit};
