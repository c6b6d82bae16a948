// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS 2 `.msg` schemas.
//!
//! - [`ast`] - parsed type definitions
//! - [`parser`] - `.msg` text (including concatenated dependency blocks)
//! - [`builtin_types`] - predefined common interfaces
//! - [`registry`] - [`MsgRegistry`], the default [`SchemaRegistry`](crate::encoding::SchemaRegistry)

pub mod ast;
pub mod builtin_types;
pub mod parser;
pub mod registry;

pub use ast::{
    canonical_type_name, ArrayKind, Constant, Field, FieldType, MessageSchema, MessageType,
    PrimitiveType,
};
pub use parser::parse as parse_schema;
pub use registry::{MsgRegistry, AMENT_PREFIX_PATH};
