// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Decode packets from the target capture file or UDP port.  If target
    /// is an existing pcap file it will be replayed, otherwise it is tried
    /// as a UDP port to listen on.
    #[arg(env)]
    pub target: String,

    /// Path to the per-laser correction angles file for this unit.
    #[arg(long, env)]
    pub calibration: PathBuf,

    /// Coordinate frame identifier attached to every batch.
    #[arg(long, env, default_value = "velodyne")]
    pub frame_id: String,

    /// Packets per dispatched batch.  The default is roughly one sensor
    /// revolution at 10 Hz.
    #[arg(long, env, default_value = "260")]
    pub batch: usize,

    /// Project decoded scans into Cartesian points.
    #[arg(long, env)]
    pub xyz: bool,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}
