// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder for [`Bag`].

use std::path::Path;
use std::sync::Arc;

use crate::core::{BagError, Result};
use crate::encoding::SchemaRegistry;
use crate::io::fs::{BagFileSystem, LocalFileSystem};
use crate::io::storage::{sqlite_factory, SqliteConfig, StorageFactory};
use crate::schema::MsgRegistry;

use super::Bag;

/// Fluent configuration for a [`Bag`].
///
/// Only the location is required. By default storage units are read with
/// the SQLite engine and messages are decoded with a [`MsgRegistry`] holding
/// the predefined types plus anything found under `AMENT_PREFIX_PATH`.
///
/// ```rust,no_run
/// use robobag::{BagBuilder, SqliteConfig};
///
/// let mut bag = BagBuilder::new()
///     .path("recordings/run_42")
///     .sqlite_config(SqliteConfig::default().with_batch_size(256))
///     .build()?;
/// bag.open()?;
/// # Ok::<(), robobag::BagError>(())
/// ```
#[derive(Default)]
pub struct BagBuilder {
    file_system: Option<Arc<dyn BagFileSystem>>,
    storage_factory: Option<StorageFactory>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
    sqlite_config: SqliteConfig,
}

impl BagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the bag directory at `path` from the local disk.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file_system = Some(Arc::new(LocalFileSystem::new(path.as_ref())));
        self
    }

    /// Read the bag through a custom file system.
    pub fn file_system(mut self, file_system: Arc<dyn BagFileSystem>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Replace the storage engine. Overrides [`sqlite_config`](Self::sqlite_config).
    pub fn storage_factory(mut self, factory: StorageFactory) -> Self {
        self.storage_factory = Some(factory);
        self
    }

    pub fn schema_registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.schema_registry = Some(registry);
        self
    }

    pub fn sqlite_config(mut self, config: SqliteConfig) -> Self {
        self.sqlite_config = config;
        self
    }

    /// Build an unopened bag.
    ///
    /// # Errors
    ///
    /// Fails when no location was given. Unreadable `AMENT_PREFIX_PATH`
    /// entries are skipped with a warning.
    pub fn build(self) -> Result<Bag> {
        let fs = self
            .file_system
            .ok_or_else(|| BagError::Other("bag location not set".to_string()))?;
        let factory = self
            .storage_factory
            .unwrap_or_else(|| sqlite_factory(self.sqlite_config));
        let registry = match self.schema_registry {
            Some(registry) => registry,
            None => Arc::new(MsgRegistry::from_ament_prefix_path()?),
        };
        Ok(Bag::new(fs, factory, registry))
    }
}
