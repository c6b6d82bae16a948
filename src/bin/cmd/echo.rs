// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Echo command - print messages from a bag.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use robobag::{CodecValue, Message, ReadOptions, TopicFilter};

use crate::common::{open_bag, parse_time, Result};

/// Print messages, decoded or raw.
#[derive(Args, Clone, Debug)]
pub struct EchoCmd {
    /// Bag directory
    #[arg(value_name = "BAG")]
    input: PathBuf,

    /// Topic to print (repeatable; default: all topics)
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// Print topics whose name matches this regex
    #[arg(long, conflicts_with = "topics")]
    topic_regex: Option<String>,

    /// Inclusive start time (seconds, nanoseconds or RFC 3339)
    #[arg(long)]
    start: Option<String>,

    /// Exclusive end time (seconds, nanoseconds or RFC 3339)
    #[arg(long)]
    end: Option<String>,

    /// Stop after this many messages
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print payloads as hex instead of decoding
    #[arg(long)]
    raw: bool,

    /// Print one JSON object per message
    #[arg(long)]
    json: bool,

    /// Extra `share`-style directory of .msg definitions (repeatable)
    #[arg(long = "msg-path", value_name = "DIR")]
    msg_paths: Vec<PathBuf>,
}

impl EchoCmd {
    pub fn run(self) -> Result<()> {
        let mut bag = open_bag(&self.input, &self.msg_paths)?;

        let filter = match (&self.topic_regex, self.topics.is_empty()) {
            (Some(pattern), _) => TopicFilter::regex_include(pattern)
                .with_context(|| format!("invalid topic regex '{pattern}'"))?,
            (None, false) => TopicFilter::Include(self.topics.clone()),
            (None, true) => TopicFilter::All,
        };

        let mut options = ReadOptions::new().with_raw_messages(self.raw);
        options.topics = filter.resolve(&bag.read_channels()?);
        if let Some(start) = &self.start {
            options = options.with_start_time(parse_time(start)?);
        }
        if let Some(end) = &self.end {
            options = options.with_end_time(parse_time(end)?);
        }

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut messages = bag.read_messages(&options)?;
        let limit = self.limit.unwrap_or(usize::MAX);
        let mut printed = 0;

        while printed < limit {
            let Some(message) = messages.next() else {
                break;
            };
            let message = message?;
            if self.json {
                print_json(&mut out, &message)?;
            } else if self.raw {
                writeln!(
                    out,
                    "{} {} {}",
                    message.timestamp,
                    message.topic(),
                    hex::encode(&message.data)
                )?;
            } else {
                print_text(&mut out, &message)?;
            }
            printed += 1;
        }
        messages.release();
        out.flush()?;
        drop(out);

        bag.close()?;
        Ok(())
    }
}

fn print_json(out: &mut impl Write, message: &Message) -> Result<()> {
    let data = match message.decoded() {
        Some(value) => serde_json::to_value(value)?,
        None => serde_json::Value::String(hex::encode(&message.data)),
    };
    let record = serde_json::json!({
        "timestamp": message.timestamp.to_nanos(),
        "topic": message.topic(),
        "type": message.channel.schema_type,
        "data": data,
    });
    writeln!(out, "{record}")?;
    Ok(())
}

fn print_text(out: &mut impl Write, message: &Message) -> Result<()> {
    writeln!(
        out,
        "--- {} {} [{}]",
        message.timestamp,
        message.topic(),
        message.channel.schema_type
    )?;
    if let Some(fields) = message.decoded() {
        for (name, value) in fields {
            print_field(out, 1, name, value)?;
        }
    }
    Ok(())
}

fn print_field(out: &mut impl Write, depth: usize, name: &str, value: &CodecValue) -> Result<()> {
    let indent = "  ".repeat(depth);
    match value {
        CodecValue::Struct(fields) => {
            writeln!(out, "{indent}{name}:")?;
            for (child, value) in fields {
                print_field(out, depth + 1, child, value)?;
            }
        }
        CodecValue::Array(items) if items.iter().any(|v| v.as_struct().is_some()) => {
            writeln!(out, "{indent}{name}:")?;
            for (i, item) in items.iter().enumerate() {
                print_field(out, depth + 1, &format!("[{i}]"), item)?;
            }
        }
        CodecValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
            writeln!(out, "{indent}{name}: [{}]", rendered.join(", "))?;
        }
        CodecValue::Bytes(bytes) => writeln!(out, "{indent}{name}: 0x{}", hex::encode(bytes))?,
        other => writeln!(out, "{indent}{name}: {other}")?,
    }
    Ok(())
}
