// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoded message values.
//!
//! Every decoder produces a [`DecodedMessage`]: a field-name to
//! [`CodecValue`] mapping. Values serialize untagged, so a decoded message
//! renders as plain JSON (`{"data": "hello"}`).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> value mapping for one decoded message.
///
/// Ordered by field name so printed output is stable.
pub type DecodedMessage = BTreeMap<String, CodecValue>;

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodecValue {
    Bool(bool),

    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    Float32(f32),
    Float64(f64),

    String(String),

    // uint8[]/byte[] payloads (images, point clouds) stay packed
    Bytes(Vec<u8>),

    Array(Vec<CodecValue>),

    Struct(DecodedMessage),
}

impl CodecValue {
    /// Check if this value is a numeric type.
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Try to convert this value to f64 (for numeric values only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Int8(v) => Some(f64::from(*v)),
            CodecValue::Int16(v) => Some(f64::from(*v)),
            CodecValue::Int32(v) => Some(f64::from(*v)),
            CodecValue::Int64(v) => Some(*v as f64),
            CodecValue::UInt8(v) => Some(f64::from(*v)),
            CodecValue::UInt16(v) => Some(f64::from(*v)),
            CodecValue::UInt32(v) => Some(f64::from(*v)),
            CodecValue::UInt64(v) => Some(*v as f64),
            CodecValue::Float32(v) => Some(f64::from(*v)),
            CodecValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to convert this value to i64 (for integer types only).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CodecValue::Int8(v) => Some(i64::from(*v)),
            CodecValue::Int16(v) => Some(i64::from(*v)),
            CodecValue::Int32(v) => Some(i64::from(*v)),
            CodecValue::Int64(v) => Some(*v),
            CodecValue::UInt8(v) => Some(i64::from(*v)),
            CodecValue::UInt16(v) => Some(i64::from(*v)),
            CodecValue::UInt32(v) => Some(i64::from(*v)),
            CodecValue::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get the inner string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CodecValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CodecValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the inner struct.
    pub fn as_struct(&self) -> Option<&DecodedMessage> {
        match self {
            CodecValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner array.
    pub fn as_array(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Look up a dotted field path such as `header.stamp.sec`.
    pub fn get_path(&self, path: &str) -> Option<&CodecValue> {
        path.split('.')
            .try_fold(self, |value, part| value.as_struct()?.get(part))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Bool(_) => "bool",
            CodecValue::Int8(_) => "int8",
            CodecValue::Int16(_) => "int16",
            CodecValue::Int32(_) => "int32",
            CodecValue::Int64(_) => "int64",
            CodecValue::UInt8(_) => "uint8",
            CodecValue::UInt16(_) => "uint16",
            CodecValue::UInt32(_) => "uint32",
            CodecValue::UInt64(_) => "uint64",
            CodecValue::Float32(_) => "float32",
            CodecValue::Float64(_) => "float64",
            CodecValue::String(_) => "string",
            CodecValue::Bytes(_) => "bytes",
            CodecValue::Array(_) => "array",
            CodecValue::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for CodecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecValue::Bool(v) => write!(f, "{v}"),
            CodecValue::Int8(v) => write!(f, "{v}"),
            CodecValue::Int16(v) => write!(f, "{v}"),
            CodecValue::Int32(v) => write!(f, "{v}"),
            CodecValue::Int64(v) => write!(f, "{v}"),
            CodecValue::UInt8(v) => write!(f, "{v}"),
            CodecValue::UInt16(v) => write!(f, "{v}"),
            CodecValue::UInt32(v) => write!(f, "{v}"),
            CodecValue::UInt64(v) => write!(f, "{v}"),
            CodecValue::Float32(v) => write!(f, "{v}"),
            CodecValue::Float64(v) => write!(f, "{v}"),
            CodecValue::String(v) => write!(f, "\"{v}\""),
            CodecValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            CodecValue::Array(v) => write!(f, "[{} elements]", v.len()),
            CodecValue::Struct(v) => write!(f, "{{{} fields}}", v.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped() -> CodecValue {
        let mut stamp = DecodedMessage::new();
        stamp.insert("sec".into(), CodecValue::Int32(7));
        stamp.insert("nanosec".into(), CodecValue::UInt32(9));
        let mut header = DecodedMessage::new();
        header.insert("stamp".into(), CodecValue::Struct(stamp));
        header.insert("frame_id".into(), CodecValue::String("map".into()));
        let mut msg = DecodedMessage::new();
        msg.insert("header".into(), CodecValue::Struct(header));
        CodecValue::Struct(msg)
    }

    #[test]
    fn test_get_path() {
        let msg = stamped();
        assert_eq!(
            msg.get_path("header.stamp.sec").and_then(CodecValue::as_i64),
            Some(7)
        );
        assert_eq!(
            msg.get_path("header.frame_id").and_then(CodecValue::as_str),
            Some("map")
        );
        assert!(msg.get_path("header.missing").is_none());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(CodecValue::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(CodecValue::Int16(-3).as_i64(), Some(-3));
        assert_eq!(CodecValue::Float32(1.5).as_f64(), Some(1.5));
        assert!(!CodecValue::String("x".into()).is_numeric());
    }

    #[test]
    fn test_serializes_untagged() {
        let json = serde_json::to_string(&stamped()).unwrap();
        assert_eq!(
            json,
            r#"{"header":{"frame_id":"map","stamp":{"nanosec":9,"sec":7}}}"#
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CodecValue::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(CodecValue::String("hi".into()).to_string(), "\"hi\"");
    }
}
