// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Instants and spans as `{sec, nsec}` pairs.
//!
//! Storage units record 64-bit nanosecond timestamps; all conversions go
//! through integer arithmetic so epoch-scale values keep full precision.

use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A point in time, normalized so that `nsec < 1_000_000_000`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time {
    pub sec: i64,
    pub nsec: u32,
}

impl Time {
    pub const ZERO: Time = Time { sec: 0, nsec: 0 };

    /// Whole seconds in `nsec` carry into `sec`, saturating at `i64::MAX`.
    pub fn new(sec: i64, nsec: u32) -> Self {
        let carry = i64::from(nsec) / NANOS_PER_SEC;
        Self {
            sec: sec.saturating_add(carry),
            nsec: (i64::from(nsec) % NANOS_PER_SEC) as u32,
        }
    }

    /// Split a nanosecond count into seconds and the sub-second remainder.
    /// Negative inputs keep `nsec` positive, so `-1ns` is `{-1, 999_999_999}`.
    pub fn from_nanos(nanos: i64) -> Self {
        Self {
            sec: nanos.div_euclid(NANOS_PER_SEC),
            nsec: nanos.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }

    /// Total nanoseconds, saturating at the `i64` limits.
    pub fn to_nanos(&self) -> i64 {
        self.sec
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(i64::from(self.nsec))
    }

    /// `self + duration`, or `None` on overflow.
    pub fn checked_add_nanos(&self, nanos: i64) -> Option<Time> {
        let total = (self.sec as i128) * (NANOS_PER_SEC as i128) + self.nsec as i128 + nanos as i128;
        i64::try_from(total).ok().map(Time::from_nanos)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

/// A raw `{sec, nsec}` span as recorded in QoS policies.
///
/// Unlike [`Time`] this is not normalized: the "infinite" sentinel
/// `{2147483647, 4294967295}` must survive decoding unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub sec: i64,
    pub nsec: u32,
}

impl Duration {
    /// rmw's `RMW_DURATION_INFINITE` as written by the recorder.
    pub const INFINITE: Duration = Duration {
        sec: 2_147_483_647,
        nsec: 4_294_967_295,
    };

    pub fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nsec == 0
    }

    pub fn is_infinite(&self) -> bool {
        *self == Self::INFINITE
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s {}ns", self.sec, self.nsec)
    }
}
