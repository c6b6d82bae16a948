// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The `metadata.yaml` manifest written next to the storage files.
//!
//! ```yaml
//! rosbag2_bagfile_information:
//!   version: 5
//!   storage_identifier: sqlite3
//!   relative_file_paths:
//!     - talker_0.db3
//!   duration:
//!     nanoseconds: 4531096768
//!   starting_time:
//!     nanoseconds_since_epoch: 1585866235112411371
//!   message_count: 20
//!   topics_with_message_count:
//!     - topic_metadata:
//!         name: /topic
//!         type: std_msgs/msg/String
//!         serialization_format: cdr
//!         offered_qos_profiles: "- history: 3\n  depth: 0\n ..."
//!       message_count: 10
//!   compression_format: ""
//!   compression_mode: ""
//! ```
//!
//! Parsing is lenient: fields with the wrong type are reported as absent,
//! never as zero, and malformed list entries are dropped.

pub mod qos;
pub(crate) mod yaml;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;

use crate::core::Time;
use crate::io::metadata::ChannelDefinition;

pub use qos::{
    parse_qos_profiles, qos_profiles_from_value, Durability, History, Liveliness, QosProfile,
    Reliability,
};

/// Well-known manifest file name inside a bag directory.
pub const MANIFEST_FILE_NAME: &str = "metadata.yaml";

const ROOT_KEY: &str = "rosbag2_bagfile_information";

/// A channel entry of `topics_with_message_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelWithCount {
    pub channel: ChannelDefinition,
    pub count: u64,
}

/// A per-file entry of `files` (manifest version 5 and later).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub starting_time_nanos: Option<i64>,
    pub duration_nanos: Option<i64>,
    pub message_count: Option<u64>,
}

/// Parsed bag manifest. Absent fields are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    pub version: Option<i64>,
    pub storage_identifier: Option<String>,
    pub storage_unit_paths: Vec<String>,
    /// Recording length in nanoseconds
    pub duration_nanos: Option<i64>,
    /// First message time in nanoseconds since the epoch
    pub starting_time_nanos: Option<i64>,
    pub message_count: Option<u64>,
    pub channels_with_counts: Vec<ChannelWithCount>,
    pub compression_format: Option<String>,
    pub compression_mode: Option<String>,
    pub files: Vec<FileInfo>,
    pub ros_distro: Option<String>,
    pub custom_data: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse manifest text.
    ///
    /// Returns `None` when the document is not a mapping or lacks the
    /// `rosbag2_bagfile_information` root.
    pub fn parse(text: &str) -> Option<Manifest> {
        Self::from_value(&yaml::parse(text)?)
    }

    pub fn from_value(document: &Value) -> Option<Manifest> {
        let root = yaml::field(document, ROOT_KEY)?;
        if !root.is_mapping() {
            return None;
        }

        Some(Manifest {
            version: yaml::int(root, "version"),
            storage_identifier: yaml::string(root, "storage_identifier"),
            storage_unit_paths: string_list(yaml::field(root, "relative_file_paths")),
            duration_nanos: yaml::nested_int(root, "duration", "nanoseconds"),
            starting_time_nanos: yaml::nested_int(root, "starting_time", "nanoseconds_since_epoch"),
            message_count: yaml::uint(root, "message_count"),
            channels_with_counts: sequence(yaml::field(root, "topics_with_message_count"))
                .filter_map(channel_with_count)
                .collect(),
            compression_format: yaml::string(root, "compression_format"),
            compression_mode: yaml::string(root, "compression_mode"),
            files: sequence(yaml::field(root, "files"))
                .filter_map(file_info)
                .collect(),
            ros_distro: yaml::string(root, "ros_distro"),
            custom_data: custom_data(yaml::field(root, "custom_data")),
        })
    }

    pub fn starting_time(&self) -> Option<Time> {
        self.starting_time_nanos.map(Time::from_nanos)
    }

    /// Start plus duration, when both are recorded and the sum fits.
    pub fn end_time(&self) -> Option<Time> {
        self.starting_time()?.checked_add_nanos(self.duration_nanos?)
    }

    /// True when the recording declares a compression format.
    pub fn is_compressed(&self) -> bool {
        self.compression_format
            .as_deref()
            .is_some_and(|format| !format.is_empty())
    }

    /// Channel entry by topic name.
    pub fn channel(&self, name: &str) -> Option<&ChannelWithCount> {
        self.channels_with_counts
            .iter()
            .find(|entry| entry.channel.name == name)
    }
}

fn sequence(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    sequence(value)
        .filter_map(|item| item.as_str().map(str::to_owned))
        .collect()
}

fn channel_with_count(entry: &Value) -> Option<ChannelWithCount> {
    let metadata = yaml::field(entry, "topic_metadata")?;
    let name = yaml::string(metadata, "name")?;
    let schema_type = yaml::string(metadata, "type")?;

    let mut channel = ChannelDefinition::new(name, schema_type)
        .with_serialization_format(
            yaml::string(metadata, "serialization_format").unwrap_or_default(),
        )
        .with_qos_profiles(
            yaml::field(metadata, "offered_qos_profiles")
                .map(qos_profiles_from_value)
                .unwrap_or_default(),
        );
    if let Some(hash) = yaml::string(metadata, "type_description_hash") {
        channel = channel.with_type_description_hash(hash);
    }

    Some(ChannelWithCount {
        channel,
        count: yaml::uint(entry, "message_count").unwrap_or(0),
    })
}

fn file_info(entry: &Value) -> Option<FileInfo> {
    Some(FileInfo {
        path: yaml::string(entry, "path")?,
        starting_time_nanos: yaml::nested_int(entry, "starting_time", "nanoseconds_since_epoch"),
        duration_nanos: yaml::nested_int(entry, "duration", "nanoseconds"),
        message_count: yaml::uint(entry, "message_count"),
    })
}

fn custom_data(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_mapping)
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| Some((key.as_str()?.to_owned(), value.as_str()?.to_owned())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TALKER: &str = r#"
rosbag2_bagfile_information:
  version: 4
  storage_identifier: sqlite3
  relative_file_paths:
    - talker_0.db3
  duration:
    nanoseconds: 4531096768
  starting_time:
    nanoseconds_since_epoch: 1585866235112411371
  message_count: 20
  topics_with_message_count:
    - topic_metadata:
        name: /rosout
        type: rcl_interfaces/msg/Log
        serialization_format: cdr
        offered_qos_profiles: "- history: 3\n  depth: 0\n  reliability: 1\n  durability: 1\n  deadline:\n    sec: 2147483647\n    nsec: 4294967295\n  lifespan:\n    sec: 10\n    nsec: 0\n  liveliness: 1\n  liveliness_lease_duration:\n    sec: 2147483647\n    nsec: 4294967295\n  avoid_ros_namespace_conventions: false"
      message_count: 10
    - topic_metadata:
        name: /topic
        type: std_msgs/msg/String
        serialization_format: cdr
        offered_qos_profiles: ""
      message_count: 10
  compression_format: ""
  compression_mode: ""
"#;

    #[test]
    fn test_parse_known_fields() {
        let manifest = Manifest::parse(TALKER).unwrap();
        assert_eq!(manifest.version, Some(4));
        assert_eq!(manifest.storage_identifier.as_deref(), Some("sqlite3"));
        assert_eq!(manifest.storage_unit_paths, vec!["talker_0.db3"]);
        assert_eq!(manifest.duration_nanos, Some(4_531_096_768));
        assert_eq!(manifest.starting_time_nanos, Some(1_585_866_235_112_411_371));
        assert_eq!(manifest.message_count, Some(20));
        assert_eq!(manifest.compression_format.as_deref(), Some(""));
        assert!(!manifest.is_compressed());

        assert_eq!(manifest.channels_with_counts.len(), 2);
        let rosout = &manifest.channels_with_counts[0];
        assert_eq!(rosout.channel.name, "/rosout");
        assert_eq!(rosout.channel.schema_type, "rcl_interfaces/msg/Log");
        assert_eq!(rosout.count, 10);
        let qos = &rosout.channel.qos_profiles[0];
        assert_eq!(qos.durability, Durability::TransientLocal);
        assert_eq!(qos.deadline, None);
        assert_eq!(qos.lifespan, Some(crate::core::Duration::new(10, 0)));

        let topic = manifest.channel("/topic").unwrap();
        assert!(topic.channel.qos_profiles.is_empty());
    }

    #[test]
    fn test_end_time() {
        let manifest = Manifest::parse(TALKER).unwrap();
        assert_eq!(
            manifest.end_time(),
            Some(Time::from_nanos(1_585_866_235_112_411_371 + 4_531_096_768))
        );
    }

    #[test]
    fn test_missing_root_is_none() {
        assert!(Manifest::parse("version: 4").is_none());
        assert!(Manifest::parse("- a\n- b").is_none());
        assert!(Manifest::parse("rosbag2_bagfile_information: 3").is_none());
        assert!(Manifest::parse("{{{").is_none());
    }

    #[test]
    fn test_absent_fields_are_none() {
        let manifest = Manifest::parse("rosbag2_bagfile_information: {}").unwrap();
        assert_eq!(manifest, Manifest::default());
        assert!(manifest.end_time().is_none());
    }

    #[test]
    fn test_wrong_types_are_absent() {
        let manifest = Manifest::parse(
            r#"
rosbag2_bagfile_information:
  version: "4"
  duration:
    nanoseconds: 1.5
  starting_time:
    nanoseconds_since_epoch: "1585866235112411371"
  message_count: -1
  relative_file_paths: [a.db3, 7, ~, b.db3]
"#,
        )
        .unwrap();
        assert_eq!(manifest.version, None);
        assert_eq!(manifest.duration_nanos, None);
        assert_eq!(manifest.starting_time_nanos, None);
        assert_eq!(manifest.message_count, None);
        assert_eq!(manifest.storage_unit_paths, vec!["a.db3", "b.db3"]);
    }

    #[test]
    fn test_incomplete_channels_dropped() {
        let manifest = Manifest::parse(
            r#"
rosbag2_bagfile_information:
  topics_with_message_count:
    - topic_metadata:
        name: /no_type
      message_count: 1
    - topic_metadata:
        type: std_msgs/msg/Empty
      message_count: 1
    - message_count: 3
    - topic_metadata:
        name: /ok
        type: std_msgs/msg/Empty
"#,
        )
        .unwrap();
        assert_eq!(manifest.channels_with_counts.len(), 1);
        let entry = &manifest.channels_with_counts[0];
        assert_eq!(entry.channel.name, "/ok");
        assert_eq!(entry.channel.serialization_format, "");
        assert_eq!(entry.count, 0);
    }

    #[test]
    fn test_version_eight_fields() {
        let manifest = Manifest::parse(
            r#"
rosbag2_bagfile_information:
  version: 8
  storage_identifier: sqlite3
  relative_file_paths: [rec_0.db3, rec_1.db3]
  files:
    - path: rec_0.db3
      starting_time:
        nanoseconds_since_epoch: 100
      duration:
        nanoseconds: 50
      message_count: 3
    - path: rec_1.db3
      message_count: 2
    - starting_time:
        nanoseconds_since_epoch: 1
  topics_with_message_count:
    - topic_metadata:
        name: /chatter
        type: std_msgs/msg/String
        serialization_format: cdr
        offered_qos_profiles:
          - history: keep_last
            depth: 7
        type_description_hash: RIHS01_df668c740482bbd48fb39d76a70dfd4bd59db1288021743503259e948f6b1a18
      message_count: 5
  compression_format: zstd
  compression_mode: FILE
  ros_distro: jazzy
  custom_data:
    operator: alice
    ignored: 3
"#,
        )
        .unwrap();
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(
            manifest.files[0],
            FileInfo {
                path: "rec_0.db3".into(),
                starting_time_nanos: Some(100),
                duration_nanos: Some(50),
                message_count: Some(3),
            }
        );
        assert_eq!(manifest.files[1].starting_time_nanos, None);
        assert!(manifest.is_compressed());
        assert_eq!(manifest.compression_mode.as_deref(), Some("FILE"));
        assert_eq!(manifest.ros_distro.as_deref(), Some("jazzy"));
        assert_eq!(manifest.custom_data.len(), 1);
        assert_eq!(manifest.custom_data["operator"], "alice");

        let chatter = &manifest.channels_with_counts[0].channel;
        assert_eq!(chatter.qos_profiles[0].depth, 7);
        assert_eq!(chatter.qos_profiles[0].history, History::KeepLast);
        assert!(chatter
            .type_description_hash
            .as_deref()
            .is_some_and(|h| h.starts_with("RIHS01_")));
    }

    #[test]
    fn test_oversized_integers_keep_precision() {
        let manifest = Manifest::parse(
            "rosbag2_bagfile_information:\n  starting_time:\n    nanoseconds_since_epoch: 9007199254740993\n  duration:\n    nanoseconds: 9223372036854775807",
        )
        .unwrap();
        assert_eq!(manifest.starting_time_nanos, Some(9_007_199_254_740_993));
        assert_eq!(manifest.duration_nanos, Some(i64::MAX));
        assert_eq!(manifest.end_time(), None);
    }
}
