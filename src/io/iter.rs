// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Iterators stitching per-unit record streams into one message sequence.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::Result;
use crate::encoding::DecoderCache;

use super::metadata::{Message, RawRecord};
use super::traits::RecordStream;

/// Drains storage-unit streams one after another.
///
/// The first stream is exhausted before the second is polled. There is no
/// timestamp merge across units: a bag split into several files whose
/// time ranges overlap comes out in file order, not time order.
///
/// Single pass. After an error the remaining streams are released and the
/// iterator yields `None`.
pub struct MultiUnitIter {
    streams: VecDeque<Box<dyn RecordStream>>,
}

impl MultiUnitIter {
    pub fn new(streams: Vec<Box<dyn RecordStream>>) -> Self {
        Self {
            streams: streams.into(),
        }
    }

    /// Streams not yet exhausted, including the one being drained.
    pub fn remaining_units(&self) -> usize {
        self.streams.len()
    }

    /// Release every remaining stream without draining it.
    pub fn release(&mut self) {
        for stream in self.streams.iter_mut() {
            stream.release();
        }
        self.streams.clear();
    }
}

impl Iterator for MultiUnitIter {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let front = self.streams.front_mut()?;
            match front.next() {
                Some(Ok(record)) => return Some(Ok(record)),
                Some(Err(err)) => {
                    self.release();
                    return Some(Err(err));
                }
                None => {
                    self.streams.pop_front();
                }
            }
        }
    }
}

impl Drop for MultiUnitIter {
    fn drop(&mut self) {
        self.release();
    }
}

/// Messages returned by [`Bag::read_messages`](crate::Bag::read_messages).
///
/// Decodes each record lazily through the bag's decoder cache unless raw
/// messages were requested.
pub struct MessageIter {
    records: MultiUnitIter,
    decoders: Option<Arc<DecoderCache>>,
}

impl MessageIter {
    pub fn new(records: MultiUnitIter, decoders: Option<Arc<DecoderCache>>) -> Self {
        Self { records, decoders }
    }

    /// Stop early and free every storage cursor.
    pub fn release(&mut self) {
        self.records.release();
    }

    pub fn is_raw(&self) -> bool {
        self.decoders.is_none()
    }
}

impl Iterator for MessageIter {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err)),
        };
        let Some(decoders) = &self.decoders else {
            return Some(Ok(Message::from(record)));
        };
        match decoders.decode(&record) {
            Ok(value) => {
                let mut message = Message::from(record);
                message.value = Some(value);
                Some(Ok(message))
            }
            Err(err) => {
                self.records.release();
                Some(Err(err))
            }
        }
    }
}
