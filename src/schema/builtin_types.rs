// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Predefined ROS 2 message types.
//!
//! Definitions for the interfaces that nearly every recording references,
//! so common bags decode without a ROS installation:
//!
//! - `builtin_interfaces`: Time, Duration
//! - `std_msgs`: Header, String, Bool, Empty, ColorRGBA and the numeric wrappers
//! - `geometry_msgs`: Vector3, Point, Quaternion, Pose, PoseStamped,
//!   Transform, TransformStamped, Twist
//! - `tf2_msgs`: TFMessage
//! - `rcl_interfaces`: Log (the `/rosout` type)

use crate::core::Result;
use crate::schema::ast::MessageType;
use crate::schema::parser;

const TIME: &str = "int32 sec\nuint32 nanosec\n";

const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("builtin_interfaces/msg/Time", TIME),
    ("builtin_interfaces/msg/Duration", TIME),
    (
        "std_msgs/msg/Header",
        "builtin_interfaces/Time stamp\nstring frame_id\n",
    ),
    ("std_msgs/msg/String", "string data\n"),
    ("std_msgs/msg/Bool", "bool data\n"),
    ("std_msgs/msg/Byte", "byte data\n"),
    ("std_msgs/msg/Char", "char data\n"),
    ("std_msgs/msg/Int8", "int8 data\n"),
    ("std_msgs/msg/UInt8", "uint8 data\n"),
    ("std_msgs/msg/Int16", "int16 data\n"),
    ("std_msgs/msg/UInt16", "uint16 data\n"),
    ("std_msgs/msg/Int32", "int32 data\n"),
    ("std_msgs/msg/UInt32", "uint32 data\n"),
    ("std_msgs/msg/Int64", "int64 data\n"),
    ("std_msgs/msg/UInt64", "uint64 data\n"),
    ("std_msgs/msg/Float32", "float32 data\n"),
    ("std_msgs/msg/Float64", "float64 data\n"),
    ("std_msgs/msg/Empty", ""),
    (
        "std_msgs/msg/ColorRGBA",
        "float32 r\nfloat32 g\nfloat32 b\nfloat32 a\n",
    ),
    ("geometry_msgs/msg/Vector3", "float64 x\nfloat64 y\nfloat64 z\n"),
    ("geometry_msgs/msg/Point", "float64 x\nfloat64 y\nfloat64 z\n"),
    (
        "geometry_msgs/msg/Quaternion",
        "float64 x 0\nfloat64 y 0\nfloat64 z 0\nfloat64 w 1\n",
    ),
    ("geometry_msgs/msg/Pose", "Point position\nQuaternion orientation\n"),
    (
        "geometry_msgs/msg/PoseStamped",
        "std_msgs/Header header\nPose pose\n",
    ),
    (
        "geometry_msgs/msg/Transform",
        "Vector3 translation\nQuaternion rotation\n",
    ),
    (
        "geometry_msgs/msg/TransformStamped",
        "std_msgs/Header header\nstring child_frame_id\nTransform transform\n",
    ),
    ("geometry_msgs/msg/Twist", "Vector3 linear\nVector3 angular\n"),
    (
        "tf2_msgs/msg/TFMessage",
        "geometry_msgs/TransformStamped[] transforms\n",
    ),
    (
        "rcl_interfaces/msg/Log",
        "byte DEBUG=10\n\
         byte INFO=20\n\
         byte WARN=30\n\
         byte ERROR=40\n\
         byte FATAL=50\n\
         builtin_interfaces/Time stamp\n\
         uint8 level\n\
         string name\n\
         string msg\n\
         string file\n\
         string function\n\
         uint32 line\n",
    ),
];

/// Names of all predefined types.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN_DEFINITIONS.iter().map(|(name, _)| *name)
}

/// Parse every predefined type.
pub fn get_all() -> Result<Vec<MessageType>> {
    let mut types = Vec::with_capacity(BUILTIN_DEFINITIONS.len());
    for (name, definition) in BUILTIN_DEFINITIONS {
        let mut schema = parser::parse(name, definition)?;
        if let Some(root) = schema.types.remove(*name) {
            types.push(root);
        }
    }
    Ok(types)
}
