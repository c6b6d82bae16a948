// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout robobag.
//!
//! - [`BagError`] - error taxonomy and [`Result`] alias
//! - [`Time`] / [`Duration`] - nanosecond-exact instants and QoS spans
//! - [`CodecValue`] - decoded field values

pub mod error;
pub mod time;
pub mod value;

pub use error::{BagError, Result};
pub use time::{Duration, Time};
pub use value::{CodecValue, DecodedMessage};
