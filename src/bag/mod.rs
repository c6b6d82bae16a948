// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! rosbag2 bag orchestration.
//!
//! A [`Bag`] ties the pieces together: it reads the `metadata.yaml`
//! manifest, opens one storage unit per recorded file, and answers
//! channel, count and time-range queries by combining the units. Messages
//! are streamed unit by unit and decoded lazily through a per-bag
//! [`DecoderCache`].

mod builder;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{BagError, Result, Time};
use crate::encoding::{DecoderCache, SchemaRegistry};
use crate::io::filter::ReadOptions;
use crate::io::fs::BagFileSystem;
use crate::io::iter::{MessageIter, MultiUnitIter};
use crate::io::metadata::ChannelDefinition;
use crate::io::storage::{StorageFactory, SQLITE_EXTENSION};
use crate::io::traits::StorageUnit;
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};

pub use builder::BagBuilder;

/// Lifecycle of a [`Bag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagState {
    Unopened,
    Open,
    Closed,
}

struct OpenBag {
    manifest: Option<Manifest>,
    paths: Vec<String>,
    units: Vec<Box<dyn StorageUnit>>,
    decoders: Arc<DecoderCache>,
}

enum State {
    Unopened,
    Open(OpenBag),
    Closed,
}

/// A rosbag2 recording.
///
/// Reads require [`open`](Bag::open) first and fail with
/// [`BagError::NotOpen`] before it or after [`close`](Bag::close). A closed
/// bag cannot be reopened.
///
/// ```rust,no_run
/// use robobag::{Bag, ReadOptions};
///
/// let mut bag = Bag::open_path("recordings/run_42")?;
/// for channel in bag.read_channels()? {
///     println!("{} [{}]", channel.name, channel.schema_type);
/// }
/// for message in bag.read_messages(&ReadOptions::new().with_topics(["/rosout"]))? {
///     let message = message?;
///     println!("{} {}", message.timestamp, message.topic());
/// }
/// bag.close()?;
/// # Ok::<(), robobag::BagError>(())
/// ```
pub struct Bag {
    fs: Arc<dyn BagFileSystem>,
    factory: StorageFactory,
    registry: Arc<dyn SchemaRegistry>,
    state: State,
}

impl Bag {
    pub fn new(
        fs: Arc<dyn BagFileSystem>,
        factory: StorageFactory,
        registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            fs,
            factory,
            registry,
            state: State::Unopened,
        }
    }

    pub fn builder() -> BagBuilder {
        BagBuilder::new()
    }

    /// Build a bag for a local directory with default settings and open it.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut bag = BagBuilder::new().path(path).build()?;
        bag.open()?;
        Ok(bag)
    }

    pub fn location(&self) -> String {
        self.fs.location()
    }

    pub fn state(&self) -> BagState {
        match self.state {
            State::Unopened => BagState::Unopened,
            State::Open(_) => BagState::Open,
            State::Closed => BagState::Closed,
        }
    }

    /// Parsed manifest, when the bag is open and had a readable one.
    pub fn manifest(&self) -> Option<&Manifest> {
        match &self.state {
            State::Open(open) => open.manifest.as_ref(),
            _ => None,
        }
    }

    /// Relative paths of the opened storage units, in read order.
    pub fn storage_paths(&self) -> &[String] {
        match &self.state {
            State::Open(open) => &open.paths,
            _ => &[],
        }
    }

    /// Open the bag: read the manifest, then open every storage unit.
    ///
    /// Calling `open` on an open bag does nothing. Any unit failing to open
    /// fails the whole call and leaves the bag unopened.
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            State::Open(_) => return Ok(()),
            State::Closed => return Err(BagError::Closed),
            State::Unopened => {}
        }

        let manifest = self.load_manifest();
        if let Some(manifest) = &manifest {
            if manifest.is_compressed() {
                return Err(BagError::unsupported(format!(
                    "compression format '{}'",
                    manifest.compression_format.as_deref().unwrap_or_default()
                )));
            }
        }

        let paths = self.storage_paths_for(manifest.as_ref())?;
        if paths.is_empty() {
            return Err(BagError::NoStorageUnits {
                location: self.fs.location(),
            });
        }

        let mut units: Vec<Box<dyn StorageUnit>> = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.open_unit(path) {
                Ok(unit) => units.push(unit),
                Err(err) => {
                    close_units(&mut units);
                    return Err(err);
                }
            }
        }

        debug!(
            location = %self.fs.location(),
            units = units.len(),
            "Opened bag"
        );
        self.state = State::Open(OpenBag {
            manifest,
            paths,
            units,
            decoders: Arc::new(DecoderCache::new(Arc::clone(&self.registry))),
        });
        Ok(())
    }

    fn open_unit(&self, path: &str) -> Result<Box<dyn StorageUnit>> {
        let mut unit = (self.factory)(self.fs.as_ref(), path)?;
        unit.open()?;
        debug!(path, "Opened storage unit");
        Ok(unit)
    }

    /// Manifest problems degrade to directory discovery, never fail the open.
    fn load_manifest(&self) -> Option<Manifest> {
        if !self.fs.contains(MANIFEST_FILE_NAME) {
            debug!(location = %self.fs.location(), "No manifest");
            return None;
        }
        let text = match self
            .fs
            .open(MANIFEST_FILE_NAME)
            .and_then(|mut file| file.read_to_string())
        {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Failed to read bag manifest");
                return None;
            }
        };
        let manifest = Manifest::parse(&text);
        if manifest.is_none() {
            warn!(
                location = %self.fs.location(),
                "Bag manifest is not a rosbag2 manifest, ignoring it"
            );
        }
        manifest
    }

    fn storage_paths_for(&self, manifest: Option<&Manifest>) -> Result<Vec<String>> {
        if let Some(manifest) = manifest {
            let paths: Vec<String> = manifest
                .storage_unit_paths
                .iter()
                .filter_map(|path| self.resolve_unit_path(path))
                .collect();
            if !paths.is_empty() {
                return Ok(paths);
            }
            warn!(
                location = %self.fs.location(),
                "Manifest lists no existing storage files, scanning the bag directory"
            );
        }

        let suffix = format!(".{SQLITE_EXTENSION}");
        let paths: Vec<String> = self
            .fs
            .list_files()?
            .into_iter()
            .filter(|path| path.ends_with(&suffix))
            .collect();
        if manifest.is_none() && !paths.is_empty() {
            warn!(
                location = %self.fs.location(),
                count = paths.len(),
                "Reading storage files found by directory scan"
            );
        }
        Ok(paths)
    }

    /// Older recorders prefix each path with the bag directory name.
    fn resolve_unit_path(&self, path: &str) -> Option<String> {
        if self.fs.contains(path) {
            return Some(path.to_string());
        }
        if let Some((_, stripped)) = path.trim_start_matches("./").split_once('/') {
            if self.fs.contains(stripped) {
                return Some(stripped.to_string());
            }
        }
        warn!(path, "Storage file listed in manifest not found");
        None
    }

    fn open_state(&self, operation: &'static str) -> Result<&OpenBag> {
        match &self.state {
            State::Open(open) => Ok(open),
            _ => Err(BagError::not_open(operation)),
        }
    }

    /// Channels recorded in the bag, as reported by the first storage unit.
    pub fn read_channels(&self) -> Result<Vec<ChannelDefinition>> {
        let open = self.open_state("read channels")?;
        match open.units.first() {
            Some(unit) => unit.read_channels(),
            None => Ok(Vec::new()),
        }
    }

    /// Stream messages matching `options`.
    ///
    /// Messages come unit by unit in each unit's native order (timestamp,
    /// then insertion order for SQLite). There is no merge across units, so
    /// a split recording whose files overlap in time is not globally sorted.
    ///
    /// Unless `raw_messages` is set, each payload is decoded as it is pulled;
    /// a channel whose type cannot be resolved yields
    /// [`BagError::UnknownMessageType`] and ends the stream.
    pub fn read_messages(&self, options: &ReadOptions) -> Result<MessageIter> {
        let open = self.open_state("read messages")?;
        let filter = options.record_filter();
        let streams = open
            .units
            .iter()
            .map(|unit| unit.read_records(&filter))
            .collect::<Result<Vec<_>>>()?;
        let decoders = (!options.raw_messages).then(|| Arc::clone(&open.decoders));
        Ok(MessageIter::new(MultiUnitIter::new(streams), decoders))
    }

    /// Earliest and latest message timestamps over all units.
    ///
    /// `(Time::ZERO, Time::ZERO)` when the bag holds no messages.
    pub fn time_range(&self) -> Result<(Time, Time)> {
        let open = self.open_state("query the time range")?;
        let mut range: Option<(Time, Time)> = None;
        for unit in &open.units {
            if let Some((start, end)) = unit.time_range()? {
                range = Some(match range {
                    Some((lo, hi)) => (lo.min(start), hi.max(end)),
                    None => (start, end),
                });
            }
        }
        Ok(range.unwrap_or((Time::ZERO, Time::ZERO)))
    }

    /// Message count per topic name, summed over all units.
    pub fn message_counts(&self) -> Result<HashMap<String, u64>> {
        let open = self.open_state("count messages")?;
        let mut counts = HashMap::new();
        for unit in &open.units {
            for (topic, count) in unit.channel_counts()? {
                *counts.entry(topic).or_insert(0) += count;
            }
        }
        Ok(counts)
    }

    /// Close every storage unit and release the manifest and decoders.
    ///
    /// The bag is closed even if a unit fails to close; the first such
    /// failure is returned.
    pub fn close(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Closed);
        let State::Open(mut open) = state else {
            return Ok(());
        };
        let mut first_error = None;
        for unit in open.units.iter_mut() {
            if let Err(err) = unit.close() {
                warn!(path = unit.path(), error = %err, "Failed to close storage unit");
                first_error.get_or_insert(err);
            }
        }
        open.decoders.clear();
        debug!(location = %self.fs.location(), "Closed bag");
        first_error.map_or(Ok(()), Err)
    }
}

fn close_units(units: &mut [Box<dyn StorageUnit>]) {
    for unit in units.iter_mut() {
        if let Err(err) = unit.close() {
            debug!(path = unit.path(), error = %err, "Failed to close storage unit");
        }
    }
}
