// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show bag information, topics, message counts.

use std::path::PathBuf;

use clap::Subcommand;

use crate::common::{format_duration, format_timestamp, open_bag, Result};

/// Inspect bag contents.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// Show manifest summary, storage files and time range
    Info {
        /// Bag directory
        #[arg(value_name = "BAG")]
        input: PathBuf,
    },

    /// List channels with their types
    Topics {
        /// Bag directory
        #[arg(value_name = "BAG")]
        input: PathBuf,

        /// Filter topics by substring of name or type
        #[arg(short, long)]
        filter: Option<String>,

        /// Show offered QoS profiles
        #[arg(long)]
        qos: bool,
    },

    /// Show message counts per topic
    Counts {
        /// Bag directory
        #[arg(value_name = "BAG")]
        input: PathBuf,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Info { input } => cmd_info(input),
            InspectCmd::Topics { input, filter, qos } => cmd_topics(input, filter, qos),
            InspectCmd::Counts { input } => cmd_counts(input),
        }
    }
}

/// Cmd: Show bag info
fn cmd_info(input: PathBuf) -> Result<()> {
    let mut bag = open_bag(&input, &[])?;
    let channels = bag.read_channels()?;
    let counts = bag.message_counts()?;
    let (start, end) = bag.time_range()?;

    println!("=== {} ===", input.display());
    if let Some(manifest) = bag.manifest() {
        if let Some(version) = manifest.version {
            println!("Version: {version}");
        }
        if let Some(storage) = &manifest.storage_identifier {
            println!("Storage: {storage}");
        }
        if let Some(distro) = &manifest.ros_distro {
            println!("ROS distro: {distro}");
        }
    } else {
        println!("Manifest: none");
    }
    println!("Files: {}", bag.storage_paths().join(", "));
    println!("Channels: {}", channels.len());
    println!("Messages: {}", counts.values().sum::<u64>());

    if end > start || counts.values().any(|&c| c > 0) {
        let span = end.to_nanos().saturating_sub(start.to_nanos()).max(0) as u64;
        println!("Start: {}", format_timestamp(start));
        println!("End: {}", format_timestamp(end));
        println!("Duration: {}", format_duration(span));
    }

    println!();
    println!("Channels:");
    for channel in &channels {
        println!(
            "  {} | {} | {} | {} messages",
            channel.name,
            channel.schema_type,
            channel.serialization_format,
            counts.get(&channel.name).copied().unwrap_or(0)
        );
    }

    bag.close()?;
    Ok(())
}

/// Cmd: List topics
fn cmd_topics(input: PathBuf, filter: Option<String>, show_qos: bool) -> Result<()> {
    let mut bag = open_bag(&input, &[])?;
    let pattern = filter.map(|p| p.to_lowercase());

    for channel in bag.read_channels()? {
        if let Some(pattern) = &pattern {
            if !channel.name.to_lowercase().contains(pattern)
                && !channel.schema_type.to_lowercase().contains(pattern)
            {
                continue;
            }
        }

        println!("Topic: {}", channel.name);
        println!("  Type: {}", channel.schema_type);
        if let Some(hash) = &channel.type_description_hash {
            println!("  Type hash: {hash}");
        }
        if show_qos {
            for (i, qos) in channel.qos_profiles.iter().enumerate() {
                println!(
                    "  QoS[{i}]: {} depth={} {} {} liveliness={}",
                    qos.history, qos.depth, qos.reliability, qos.durability, qos.liveliness
                );
                for (label, duration) in [
                    ("deadline", qos.deadline),
                    ("lifespan", qos.lifespan),
                    ("lease", qos.liveliness_lease_duration),
                ] {
                    if let Some(duration) = duration {
                        println!("    {label}: {duration}");
                    }
                }
            }
        }
    }

    bag.close()?;
    Ok(())
}

/// Cmd: Show counts
fn cmd_counts(input: PathBuf) -> Result<()> {
    let mut bag = open_bag(&input, &[])?;
    let mut counts: Vec<(String, u64)> = bag.message_counts()?.into_iter().collect();
    counts.sort();

    let width = counts.iter().map(|(t, _)| t.len()).max().unwrap_or(0);
    for (topic, count) in &counts {
        println!("{topic:<width$}  {count}");
    }

    bag.close()?;
    Ok(())
}
