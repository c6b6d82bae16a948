// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR (Common Data Representation) decoding for ROS 2 payloads.

pub mod cursor;
pub mod decoder;

pub use cursor::{CdrCursor, CDR_HEADER_SIZE};
pub use decoder::CdrDecoder;
