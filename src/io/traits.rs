// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage unit contract.
//!
//! A bag is split into one or more storage units (one per `.db3` file for
//! the SQLite engine). The bag talks to each through [`StorageUnit`], so
//! engines are interchangeable and selected by an injected factory.

use std::collections::HashMap;

use crate::core::{Result, Time};

use super::filter::RecordFilter;
use super::metadata::{ChannelDefinition, RawRecord};

/// One physical storage file.
///
/// Every method except `open` requires a prior successful `open`.
/// `open` is idempotent.
///
/// # Example
///
/// ```no_run
/// use robobag::io::traits::StorageUnit;
///
/// fn describe(unit: &dyn StorageUnit) -> robobag::Result<()> {
///     for channel in unit.read_channels()? {
///         println!("{} [{}]", channel.name, channel.schema_type);
///     }
///     Ok(())
/// }
/// ```
pub trait StorageUnit: Send + Sync {
    /// Path of the unit relative to the bag root.
    fn path(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    /// Release the engine handle. Closing an unopened unit is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Channels declared by this unit, in declaration order.
    fn read_channels(&self) -> Result<Vec<ChannelDefinition>>;

    /// Lazily stream the records matching `filter`.
    ///
    /// Records come in the unit's native order, which for the shipped
    /// engines is ascending timestamp.
    fn read_records(&self, filter: &RecordFilter) -> Result<Box<dyn RecordStream>>;

    /// Earliest and latest record time, or `None` if the unit holds no
    /// records.
    fn time_range(&self) -> Result<Option<(Time, Time)>>;

    /// Record count per channel name. Channels without records may be
    /// omitted.
    fn channel_counts(&self) -> Result<HashMap<String, u64>>;
}

/// Lazy sequence of raw records from a single storage unit.
pub trait RecordStream: Iterator<Item = Result<RawRecord>> + Send {
    /// Free cursor resources before the stream is exhausted.
    ///
    /// After `release` the stream yields `None`. Exhausted streams have
    /// already released everything, so calling it again is harmless.
    fn release(&mut self);
}
