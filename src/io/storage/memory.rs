// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory storage engine.
//!
//! Holds channels and records in insertion order. Useful for bags
//! assembled in memory and for exercising the bag without a database.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{BagError, Result, Time};
use crate::io::filter::RecordFilter;
use crate::io::metadata::{ChannelDefinition, RawRecord};
use crate::io::traits::{RecordStream, StorageUnit};

#[derive(Debug, Clone)]
pub struct MemoryUnit {
    path: String,
    channels: Vec<Arc<ChannelDefinition>>,
    records: Vec<RawRecord>,
    open: bool,
}

impl MemoryUnit {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            channels: Vec::new(),
            records: Vec::new(),
            open: false,
        }
    }

    pub fn with_channel(mut self, channel: ChannelDefinition) -> Self {
        self.channels.push(Arc::new(channel));
        self
    }

    /// Append a record on a previously added channel.
    ///
    /// Records are yielded in the order they were added.
    pub fn with_record(mut self, topic: &str, timestamp_nanos: i64, data: impl Into<Vec<u8>>) -> Self {
        self.push_record(topic, timestamp_nanos, data);
        self
    }

    /// Returns `false` if `topic` has not been added as a channel.
    pub fn push_record(&mut self, topic: &str, timestamp_nanos: i64, data: impl Into<Vec<u8>>) -> bool {
        match self.channels.iter().find(|c| c.name == topic) {
            Some(channel) => {
                self.records.push(RawRecord::new(
                    Arc::clone(channel),
                    Time::from_nanos(timestamp_nanos),
                    data.into(),
                ));
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(BagError::storage(
                &self.path,
                format!("storage unit must be opened before it can {operation}"),
            ))
        }
    }
}

impl StorageUnit for MemoryUnit {
    fn path(&self) -> &str {
        &self.path
    }

    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn read_channels(&self) -> Result<Vec<ChannelDefinition>> {
        self.ensure_open("read channels")?;
        Ok(self.channels.iter().map(|c| c.as_ref().clone()).collect())
    }

    fn read_records(&self, filter: &RecordFilter) -> Result<Box<dyn RecordStream>> {
        self.ensure_open("read records")?;
        Ok(Box::new(MemoryRecordStream {
            records: self.records.clone().into_iter(),
            filter: filter.clone(),
        }))
    }

    fn time_range(&self) -> Result<Option<(Time, Time)>> {
        self.ensure_open("query the time range")?;
        let start = self.records.iter().map(|r| r.timestamp).min();
        let end = self.records.iter().map(|r| r.timestamp).max();
        Ok(start.zip(end))
    }

    fn channel_counts(&self) -> Result<HashMap<String, u64>> {
        self.ensure_open("count messages")?;
        let mut counts = HashMap::new();
        for record in &self.records {
            *counts.entry(record.channel.name.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

struct MemoryRecordStream {
    records: std::vec::IntoIter<RawRecord>,
    filter: RecordFilter,
}

impl Iterator for MemoryRecordStream {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.records
            .find(|r| filter.accepts(&r.channel.name, r.timestamp))
            .map(Ok)
    }
}

impl RecordStream for MemoryRecordStream {
    fn release(&mut self) {
        self.records = Vec::new().into_iter();
    }
}
