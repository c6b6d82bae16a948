// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoder resolution and per-bag decoder caching.
//!
//! A [`SchemaRegistry`] turns a schema identifier such as
//! `sensor_msgs/msg/Imu` into a [`MessageDecoder`]. Resolution can be
//! expensive (parsing definitions, walking dependencies), so each bag keeps a
//! [`DecoderCache`] that resolves every distinct type at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::core::{DecodedMessage, Result};
use crate::io::metadata::RawRecord;

/// Decodes the payload of one message type.
pub trait MessageDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DecodedMessage>;
}

impl<F> MessageDecoder for F
where
    F: Fn(&[u8]) -> Result<DecodedMessage> + Send + Sync,
{
    fn decode(&self, data: &[u8]) -> Result<DecodedMessage> {
        self(data)
    }
}

/// Source of decoders, keyed by schema identifier.
pub trait SchemaRegistry: Send + Sync {
    /// Build a decoder for `schema_type`.
    ///
    /// Fails with [`BagError::UnknownMessageType`](crate::BagError::UnknownMessageType)
    /// when the type (or one of its dependencies) is not known.
    fn resolve(&self, schema_type: &str) -> Result<Box<dyn MessageDecoder>>;
}

/// Memoizes decoders by schema type.
///
/// Failed resolutions are not cached, so a type registered after a failure
/// can still be resolved on a later read.
pub struct DecoderCache {
    registry: Arc<dyn SchemaRegistry>,
    decoders: Mutex<HashMap<String, Arc<dyn MessageDecoder>>>,
}

impl DecoderCache {
    pub fn new(registry: Arc<dyn SchemaRegistry>) -> Self {
        Self {
            registry,
            decoders: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn MessageDecoder>>> {
        self.decoders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached decoder for `schema_type`, resolving it on first use.
    pub fn decoder(&self, schema_type: &str) -> Result<Arc<dyn MessageDecoder>> {
        // Held across resolve so concurrent readers never resolve twice.
        let mut decoders = self.lock();
        if let Some(decoder) = decoders.get(schema_type) {
            return Ok(Arc::clone(decoder));
        }
        debug!(schema_type, "resolving decoder");
        let decoder: Arc<dyn MessageDecoder> = Arc::from(self.registry.resolve(schema_type)?);
        decoders.insert(schema_type.to_string(), Arc::clone(&decoder));
        Ok(decoder)
    }

    /// Decode a record with the decoder for its channel's schema type.
    pub fn decode(&self, record: &RawRecord) -> Result<DecodedMessage> {
        let decoder = self.decoder(&record.channel.schema_type)?;
        decoder.decode(&record.data)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BagError, CodecValue, Time};
    use crate::io::metadata::ChannelDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRegistry {
        resolved: AtomicUsize,
    }

    impl SchemaRegistry for CountingRegistry {
        fn resolve(&self, schema_type: &str) -> Result<Box<dyn MessageDecoder>> {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            if schema_type != "std_msgs/msg/UInt8" {
                return Err(BagError::unknown_type(schema_type));
            }
            Ok(Box::new(|data: &[u8]| -> Result<DecodedMessage> {
                let mut msg = DecodedMessage::new();
                msg.insert("len".into(), CodecValue::UInt64(data.len() as u64));
                Ok(msg)
            }))
        }
    }

    fn record(schema_type: &str) -> RawRecord {
        let channel = Arc::new(ChannelDefinition::new("/t", schema_type));
        RawRecord::new(channel, Time::ZERO, vec![1, 2, 3])
    }

    #[test]
    fn test_resolves_each_type_once() {
        let registry = Arc::new(CountingRegistry::default());
        let cache = DecoderCache::new(registry.clone());
        for _ in 0..5 {
            let msg = cache.decode(&record("std_msgs/msg/UInt8")).unwrap();
            assert_eq!(msg["len"], CodecValue::UInt64(3));
        }
        assert_eq!(registry.resolved.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_not_cached() {
        let registry = Arc::new(CountingRegistry::default());
        let cache = DecoderCache::new(registry.clone());
        for _ in 0..2 {
            let err = cache.decode(&record("pkg/msg/Nope")).unwrap_err();
            assert!(matches!(err, BagError::UnknownMessageType { ref type_name } if type_name == "pkg/msg/Nope"));
        }
        assert_eq!(registry.resolved.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = DecoderCache::new(Arc::new(CountingRegistry::default()));
        cache.decoder("std_msgs/msg/UInt8").unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
