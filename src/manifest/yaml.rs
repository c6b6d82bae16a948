// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Lenient accessors over `serde_yaml::Value` trees.
//!
//! Every accessor returns `None` on a missing key or a type mismatch, so the
//! manifest and QoS decoders never fail on malformed input. Integers are
//! read only from integer scalars: `serde_yaml` keeps them as exact 64-bit
//! values, and floats are rejected rather than truncated.

use serde_yaml::Value;

/// Parse YAML text, logging and discarding syntax errors.
pub(crate) fn parse(text: &str) -> Option<Value> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "discarding unparsable YAML");
            None
        }
    }
}

pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_mapping()?.get(key).filter(|v| !v.is_null())
}

pub(crate) fn int(value: &Value, key: &str) -> Option<i64> {
    field(value, key)?.as_i64()
}

pub(crate) fn uint(value: &Value, key: &str) -> Option<u64> {
    field(value, key)?.as_u64()
}

pub(crate) fn string(value: &Value, key: &str) -> Option<String> {
    field(value, key)?.as_str().map(str::to_owned)
}

/// Read `value[outer][inner]` as an exact signed 64-bit integer.
pub(crate) fn nested_int(value: &Value, outer: &str, inner: &str) -> Option<i64> {
    int(field(value, outer)?, inner)
}
