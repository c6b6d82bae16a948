// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message decoding.
//!
//! - [`cdr`] - schema-driven CDR decoding
//! - [`registry`] - decoder resolution and the per-bag decoder cache

pub mod cdr;
pub mod registry;

pub use cdr::CdrDecoder;
pub use registry::{DecoderCache, MessageDecoder, SchemaRegistry};
