// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Channel and record types shared by storage units and the bag.

use std::sync::Arc;

use serde::Serialize;

use crate::core::{DecodedMessage, Time};
use crate::manifest::QosProfile;

/// A recorded channel ("topic" in ROS terminology).
///
/// Uniquely identified by `name` within a bag. Storage units hand these out
/// behind an `Arc` so every record of a channel shares one definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDefinition {
    /// Topic name (e.g., "/joint_states", "/tf")
    pub name: String,
    /// Message type name (e.g., "sensor_msgs/msg/JointState")
    pub schema_type: String,
    /// Wire encoding, "cdr" for every rosbag2 recording in practice
    pub serialization_format: String,
    /// QoS profiles offered by the publishers at record time
    pub qos_profiles: Vec<QosProfile>,
    /// RIHS01 type hash, recorded from Iron onwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_description_hash: Option<String>,
}

impl ChannelDefinition {
    pub fn new(name: impl Into<String>, schema_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_type: schema_type.into(),
            serialization_format: "cdr".to_string(),
            qos_profiles: Vec::new(),
            type_description_hash: None,
        }
    }

    pub fn with_serialization_format(mut self, format: impl Into<String>) -> Self {
        self.serialization_format = format.into();
        self
    }

    pub fn with_qos_profiles(mut self, profiles: Vec<QosProfile>) -> Self {
        self.qos_profiles = profiles;
        self
    }

    pub fn with_type_description_hash(mut self, hash: impl Into<String>) -> Self {
        self.type_description_hash = Some(hash.into());
        self
    }
}

/// One undecoded record as produced by a storage unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub channel: Arc<ChannelDefinition>,
    /// Receive time recorded by the bag writer
    pub timestamp: Time,
    /// Serialized payload in the channel's `serialization_format`
    pub data: Vec<u8>,
}

impl RawRecord {
    pub fn new(channel: Arc<ChannelDefinition>, timestamp: Time, data: Vec<u8>) -> Self {
        Self {
            channel,
            timestamp,
            data,
        }
    }

    /// Get the data length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the record has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A record as handed to the caller of `Bag::read_messages`.
///
/// `value` is `None` when raw messages were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub channel: Arc<ChannelDefinition>,
    pub timestamp: Time,
    pub data: Vec<u8>,
    pub value: Option<DecodedMessage>,
}

impl Message {
    /// Topic name of the record.
    pub fn topic(&self) -> &str {
        &self.channel.name
    }

    /// Decoded value, if decoding was requested.
    pub fn decoded(&self) -> Option<&DecodedMessage> {
        self.value.as_ref()
    }
}

impl From<RawRecord> for Message {
    fn from(raw: RawRecord) -> Self {
        Self {
            channel: raw.channel,
            timestamp: raw.timestamp,
            data: raw.data,
            value: None,
        }
    }
}
