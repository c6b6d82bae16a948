// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage engines and the factory that builds them.

pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::{BagError, Result};
use crate::io::fs::{normalize_relative, BagFileSystem};
use crate::io::traits::StorageUnit;

pub use memory::MemoryUnit;
pub use sqlite::{SqliteConfig, SqliteUnit, SQLITE_EXTENSION};

/// Builds an unopened storage unit for a path relative to the bag root.
pub type StorageFactory =
    Arc<dyn Fn(&dyn BagFileSystem, &str) -> Result<Box<dyn StorageUnit>> + Send + Sync>;

/// Factory for SQLite `.db3` units.
///
/// Files with an on-disk path are opened in place; anything else is read
/// through the file system and loaded into memory.
pub fn sqlite_factory(config: SqliteConfig) -> StorageFactory {
    Arc::new(move |fs: &dyn BagFileSystem, relative_path: &str| {
        let unit = match fs.local_path(relative_path) {
            Some(file_path) => SqliteUnit::new(relative_path, file_path),
            None => SqliteUnit::from_bytes(relative_path, read_file(fs, relative_path)?),
        };
        Ok(Box::new(unit.with_config(config.clone())) as Box<dyn StorageUnit>)
    })
}

/// Factory for SQLite `.db3` units that always loads the file into memory.
pub fn sqlite_bytes_factory(config: SqliteConfig) -> StorageFactory {
    Arc::new(move |fs: &dyn BagFileSystem, relative_path: &str| {
        let unit = SqliteUnit::from_bytes(relative_path, read_file(fs, relative_path)?)
            .with_config(config.clone());
        Ok(Box::new(unit) as Box<dyn StorageUnit>)
    })
}

fn read_file(fs: &dyn BagFileSystem, relative_path: &str) -> Result<Vec<u8>> {
    let mut file = fs.open(relative_path)?;
    let size = file.size()?;
    let len = usize::try_from(size).map_err(|_| {
        BagError::storage(relative_path, format!("file of {size} bytes exceeds address space"))
    })?;
    debug!(path = relative_path, bytes = len, "loading storage file into memory");
    file.read(0, len)
}

/// Factory serving prepared in-memory units keyed by relative path.
pub fn memory_factory<I>(units: I) -> StorageFactory
where
    I: IntoIterator<Item = MemoryUnit>,
{
    let units: HashMap<String, MemoryUnit> = units
        .into_iter()
        .map(|unit| (normalize_relative(unit.path()), unit))
        .collect();
    Arc::new(move |_fs: &dyn BagFileSystem, relative_path: &str| {
        units
            .get(&normalize_relative(relative_path))
            .cloned()
            .map(|unit| Box::new(unit) as Box<dyn StorageUnit>)
            .ok_or_else(|| BagError::storage(relative_path, "no in-memory unit registered"))
    })
}
