// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag CLI
//!
//! Command-line tool for ROS 2 rosbag2 recordings.
//!
//! ## Usage
//!
//! ```sh
//! # Show bag information
//! robobag inspect info recordings/talker
//!
//! # List topics with their QoS profiles
//! robobag inspect topics recordings/talker --qos
//!
//! # Message counts per topic
//! robobag inspect counts recordings/talker
//!
//! # Print decoded messages
//! robobag echo recordings/talker --topic /chatter --limit 10
//!
//! # Raw payloads as JSON lines
//! robobag echo recordings/talker --raw --json
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{EchoCmd, InspectCmd};
use common::Result;

/// Robobag - ROS 2 bag reader
///
/// Reads rosbag2 directories (metadata.yaml plus SQLite storage files).
#[derive(Parser, Clone)]
#[command(name = "robobag")]
#[command(about = "Reader for ROS 2 rosbag2 recordings", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Inspect bag contents (info, topics, counts)
    #[command(subcommand)]
    Inspect(InspectCmd),

    /// Print messages
    Echo(EchoCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(),
        Commands::Echo(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
