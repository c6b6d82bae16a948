// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AST types for parsed ROS 2 `.msg` definitions.

use std::collections::HashMap;
use std::fmt;

/// A root message type together with every type it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /// Canonical root type name (e.g., "std_msgs/msg/Header")
    pub name: String,
    /// All types defined in this schema (root + dependencies), by canonical name
    pub types: HashMap<String, MessageType>,
}

impl MessageSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    pub fn add_type(&mut self, msg_type: MessageType) {
        self.types.insert(msg_type.name.clone(), msg_type);
    }

    pub fn get_type(&self, name: &str) -> Option<&MessageType> {
        self.types.get(name)
    }

    pub fn root(&self) -> Option<&MessageType> {
        self.types.get(&self.name)
    }
}

/// A message type definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageType {
    pub name: String,
    /// Fields in wire order
    pub fields: Vec<Field>,
    pub constants: Vec<Constant>,
}

impl MessageType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical names of the message types referenced by fields.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.field_type.nested_name())
    }
}

/// A field in a message type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Default value text, as written after the field name
    pub default_value: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: None,
        }
    }
}

/// A constant declaration (`byte DEBUG=10`). Not part of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub type_name: String,
    pub value: String,
}

/// Sequence/array shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// `T[N]`, serialized without a length prefix
    Fixed(usize),
    /// `T[<=N]`, length-prefixed with at most N elements
    Bounded(usize),
    /// `T[]`, length-prefixed
    Unbounded,
}

/// Field type: primitive, nested message, or array of either.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive(PrimitiveType),
    /// Canonical name of a message type
    Nested(String),
    Array {
        element: Box<FieldType>,
        kind: ArrayKind,
    },
}

impl FieldType {
    /// The referenced message type, looking through arrays.
    pub fn nested_name(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Nested(name) => Some(name),
            FieldType::Array { element, .. } => element.nested_name(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{p}"),
            FieldType::Nested(name) => write!(f, "{name}"),
            FieldType::Array { element, kind } => match kind {
                ArrayKind::Fixed(n) => write!(f, "{element}[{n}]"),
                ArrayKind::Bounded(n) => write!(f, "{element}[<={n}]"),
                ArrayKind::Unbounded => write!(f, "{element}[]"),
            },
        }
    }
}

/// Primitive ROS 2 interface types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    /// Opaque octet
    Byte,
    /// Unsigned 8-bit character
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    WString,
}

impl PrimitiveType {
    /// CDR alignment in bytes; strings align on their length prefix.
    pub fn alignment(self) -> usize {
        match self {
            PrimitiveType::Bool
            | PrimitiveType::Byte
            | PrimitiveType::Char
            | PrimitiveType::Int8
            | PrimitiveType::UInt8 => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32
            | PrimitiveType::UInt32
            | PrimitiveType::Float32
            | PrimitiveType::String
            | PrimitiveType::WString => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }

    /// Whether arrays of this type decode to packed bytes.
    pub fn is_octet(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::UInt8
        )
    }

    pub fn try_from_str(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => PrimitiveType::Bool,
            "byte" => PrimitiveType::Byte,
            "char" => PrimitiveType::Char,
            "int8" => PrimitiveType::Int8,
            "uint8" => PrimitiveType::UInt8,
            "int16" => PrimitiveType::Int16,
            "uint16" => PrimitiveType::UInt16,
            "int32" => PrimitiveType::Int32,
            "uint32" => PrimitiveType::UInt32,
            "int64" => PrimitiveType::Int64,
            "uint64" => PrimitiveType::UInt64,
            "float32" => PrimitiveType::Float32,
            "float64" => PrimitiveType::Float64,
            "string" => PrimitiveType::String,
            "wstring" => PrimitiveType::WString,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::String => "string",
            PrimitiveType::WString => "wstring",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package part of a type name (`geometry_msgs/msg/Pose` -> `geometry_msgs`).
pub fn package_of(type_name: &str) -> Option<&str> {
    type_name.split_once('/').map(|(package, _)| package)
}

/// Canonical `package/msg/Name` form of a type reference.
///
/// `pkg/Name` gains the `msg` namespace; a bare `Name` is resolved against
/// `context_package` when one is given.
pub fn canonical_type_name(name: &str, context_package: Option<&str>) -> String {
    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        [bare] => match context_package {
            Some(package) => format!("{package}/msg/{bare}"),
            None => (*bare).to_string(),
        },
        [package, bare] => format!("{package}/msg/{bare}"),
        _ => name.to_string(),
    }
}
