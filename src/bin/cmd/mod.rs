// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod echo;
mod inspect;

pub use echo::EchoCmd;
pub use inspect::InspectCmd;
