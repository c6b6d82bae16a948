// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! QoS profiles recorded per topic.
//!
//! rosbag2 stores the publishers' offered QoS as a YAML list, either embedded
//! as a string (`offered_qos_profiles` column / manifest field) or inline.
//! Decoding never fails: anything absent or out of range falls back to the
//! recorder's override defaults:
//!
//! ```yaml
//! history: keep_last
//! depth: 10
//! reliability: reliable
//! durability: volatile
//! deadline: unspecified
//! lifespan: unspecified
//! liveliness: system_default
//! liveliness_lease_duration: unspecified
//! avoid_ros_namespace_conventions: false
//! ```

use serde::Serialize;
use serde_yaml::Value;

use super::yaml;
use crate::core::Duration;

macro_rules! qos_policy {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:literal => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            /// Map the rmw integer value to a known member.
            pub fn from_i64(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Map the symbolic name written by newer recorders.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn from_yaml(value: Option<&Value>) -> Option<Self> {
                match value? {
                    Value::Number(n) => n.as_i64().and_then(Self::from_i64),
                    Value::String(s) => Self::from_name(s),
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

qos_policy! {
    /// Sample retention policy.
    History {
        SystemDefault = 0 => "system_default",
        KeepLast = 1 => "keep_last",
        KeepAll = 2 => "keep_all",
        Unknown = 3 => "unknown",
    }
}

qos_policy! {
    /// Delivery guarantee.
    Reliability {
        SystemDefault = 0 => "system_default",
        Reliable = 1 => "reliable",
        BestEffort = 2 => "best_effort",
        Unknown = 3 => "unknown",
    }
}

qos_policy! {
    /// Whether late joiners receive earlier samples.
    Durability {
        SystemDefault = 0 => "system_default",
        TransientLocal = 1 => "transient_local",
        Volatile = 2 => "volatile",
        Unknown = 3 => "unknown",
    }
}

qos_policy! {
    /// How publisher liveness is asserted.
    Liveliness {
        SystemDefault = 0 => "system_default",
        Automatic = 1 => "automatic",
        ManualByNode = 2 => "manual_by_node",
        ManualByTopic = 3 => "manual_by_topic",
        Unknown = 4 => "unknown",
    }
}

/// One offered QoS profile.
///
/// Duration fields are `None` when unspecified; both the zero span and the
/// infinite sentinel mean "unspecified" to the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QosProfile {
    pub history: History,
    pub depth: u64,
    pub reliability: Reliability,
    pub durability: Durability,
    pub deadline: Option<Duration>,
    pub lifespan: Option<Duration>,
    pub liveliness: Liveliness,
    pub liveliness_lease_duration: Option<Duration>,
    pub avoid_ros_namespace_conventions: bool,
}

impl Default for QosProfile {
    fn default() -> Self {
        Self {
            history: History::KeepLast,
            depth: 10,
            reliability: Reliability::Reliable,
            durability: Durability::Volatile,
            deadline: None,
            lifespan: None,
            liveliness: Liveliness::SystemDefault,
            liveliness_lease_duration: None,
            avoid_ros_namespace_conventions: false,
        }
    }
}

impl QosProfile {
    /// Decode one list entry. Non-mapping entries yield the defaults.
    pub fn from_yaml(entry: &Value) -> Self {
        let defaults = Self::default();
        Self {
            history: History::from_yaml(yaml::field(entry, "history")).unwrap_or(defaults.history),
            depth: yaml::uint(entry, "depth").unwrap_or(defaults.depth),
            reliability: Reliability::from_yaml(yaml::field(entry, "reliability"))
                .unwrap_or(defaults.reliability),
            durability: Durability::from_yaml(yaml::field(entry, "durability"))
                .unwrap_or(defaults.durability),
            deadline: duration(entry, "deadline"),
            lifespan: duration(entry, "lifespan"),
            liveliness: Liveliness::from_yaml(yaml::field(entry, "liveliness"))
                .unwrap_or(defaults.liveliness),
            liveliness_lease_duration: duration(entry, "liveliness_lease_duration"),
            avoid_ros_namespace_conventions: boolean(entry, "avoid_ros_namespace_conventions")
                .unwrap_or(defaults.avoid_ros_namespace_conventions),
        }
    }
}

/// Decode an `offered_qos_profiles` YAML string.
///
/// Empty text, invalid YAML or a document that is not a list all yield an
/// empty list.
pub fn parse_qos_profiles(text: &str) -> Vec<QosProfile> {
    yaml::parse(text)
        .map(|value| qos_profiles_from_value(&value))
        .unwrap_or_default()
}

/// Decode an already-parsed `offered_qos_profiles` node.
///
/// Accepts an inline sequence, or a string holding the embedded YAML.
pub fn qos_profiles_from_value(value: &Value) -> Vec<QosProfile> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .filter(|entry| !entry.is_null())
            .map(QosProfile::from_yaml)
            .collect(),
        Value::String(embedded) => parse_qos_profiles(embedded),
        _ => Vec::new(),
    }
}

fn duration(entry: &Value, key: &str) -> Option<Duration> {
    let value = yaml::field(entry, key)?;
    let sec = yaml::int(value, "sec")?;
    let nsec = u32::try_from(yaml::int(value, "nsec")?).ok()?;
    let duration = Duration::new(sec, nsec);
    if duration.is_zero() || duration.is_infinite() {
        return None;
    }
    Some(duration)
}

fn boolean(entry: &Value, key: &str) -> Option<bool> {
    match yaml::field(entry, key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        _ => None,
    }
}
