// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use robobag::{Bag, MsgRegistry, Time};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the level from `warn`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open a bag directory, adding `.msg` definitions from `msg_paths`.
///
/// Each path is a `share`-style directory (`<pkg>/msg/<Type>.msg`).
pub fn open_bag(path: &Path, msg_paths: &[PathBuf]) -> Result<Bag> {
    let registry = MsgRegistry::from_ament_prefix_path()?;
    for dir in msg_paths {
        registry
            .load_directory(dir)
            .with_context(|| format!("loading message definitions from {}", dir.display()))?;
    }
    let mut bag = Bag::builder()
        .path(path)
        .schema_registry(Arc::new(registry))
        .build()?;
    bag.open()
        .with_context(|| format!("opening bag {}", path.display()))?;
    Ok(bag)
}

/// Format a duration in nanoseconds to human-readable string.
pub fn format_duration(nanos: u64) -> String {
    let secs = nanos / 1_000_000_000;
    let millis = (nanos % 1_000_000_000) / 1_000_000;

    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{secs}.{millis:03}s")
    } else {
        format!("{millis}ms")
    }
}

/// Format a timestamp as UTC wall-clock time.
pub fn format_timestamp(time: Time) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp(time.sec, time.nsec) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => format!("{time} s"),
    }
}

/// Parse a time bound.
///
/// Accepts:
/// - seconds: "1585866235" or "1585866235.5"
/// - nanoseconds: "1585866235112411371"
/// - RFC 3339: "2020-04-02T22:23:55Z"
pub fn parse_time(s: &str) -> CliResult<Time> {
    if let Ok(n) = s.parse::<i64>() {
        // Anything below year 3000 in seconds is taken as seconds.
        return Ok(if n.abs() < 32_503_680_000 {
            Time::new(n, 0)
        } else {
            Time::from_nanos(n)
        });
    }

    if let Some((sec, frac)) = s.split_once('.') {
        let (negative, sec) = match sec.strip_prefix('-') {
            Some(magnitude) => (true, magnitude),
            None => (false, sec),
        };
        let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if digits(sec) && digits(frac) && frac.len() <= 9 {
            let sec: i64 = sec.parse()?;
            let nsec: u32 = format!("{frac:0<9}").parse()?;
            if !negative {
                return Ok(Time::new(sec, nsec));
            }
            // The sign applies to the whole value: "-0.5" is half a second before 0.
            let nanos = sec
                .checked_mul(1_000_000_000)
                .and_then(|n| n.checked_add(i64::from(nsec)))
                .ok_or_else(|| anyhow!("Time out of range: {s}"))?;
            return Ok(Time::from_nanos(-nanos));
        }
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(Time::new(dt.timestamp(), dt.timestamp_subsec_nanos()));
    }

    Err(anyhow!("Invalid time: {s}"))
}
