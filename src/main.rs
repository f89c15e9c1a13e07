// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Replay and live-decode tool for HDL-64E packet streams.
//!
//! Loads a correction angles file, acquires packets from a pcap capture or
//! a UDP socket, groups them into batches and runs a dispatcher over them,
//! logging decode statistics. SIGINT stops processing at the next packet
//! boundary.

mod args;

use args::Args;
use clap::Parser;
use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info};
use velodyne_driver::{
    calibration::Calibration,
    dispatcher::{ScanDispatcher, XyzDispatcher},
    lidar::Error,
    packet::PacketBatch,
    packet_source::{PacketSource, UdpSource},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.rust_log)
        .init();

    let mut calibration = Calibration::new();
    calibration.load_file(&args.calibration)?;
    let calibration = Arc::new(calibration);

    let mut source = build_source(&args.target)?;

    let total_points = Arc::new(AtomicU64::new(0));
    let points = total_points.clone();

    if args.xyz {
        let mut dispatcher = XyzDispatcher::new(
            calibration,
            Box::new(move |decoded, stamp, frame_id| {
                points.fetch_add(decoded.len() as u64, Ordering::Relaxed);
                debug!("{}: {} cartesian points at {} ns", frame_id, decoded.len(), stamp);
            }),
        );
        let alive = dispatcher.shutdown_handle();
        let handle = alive.clone();
        ctrlc::set_handler(move || handle.store(false, Ordering::Relaxed))?;

        while alive.load(Ordering::Relaxed) {
            let Some(batch) = next_batch(source.as_mut(), args.batch, &args.frame_id)? else {
                break;
            };
            dispatcher.process_batch(&batch);
        }
    } else {
        let mut dispatcher = ScanDispatcher::new(
            calibration,
            Box::new(move |decoded, stamp, frame_id| {
                points.fetch_add(decoded.len() as u64, Ordering::Relaxed);
                debug!("{}: {} scans at {} ns", frame_id, decoded.len(), stamp);
            }),
        );
        let alive = dispatcher.shutdown_handle();
        let handle = alive.clone();
        ctrlc::set_handler(move || handle.store(false, Ordering::Relaxed))?;

        while alive.load(Ordering::Relaxed) {
            let Some(batch) = next_batch(source.as_mut(), args.batch, &args.frame_id)? else {
                break;
            };
            dispatcher.process_batch(&batch);
        }
    }

    info!("{} points decoded", total_points.load(Ordering::Relaxed));
    Ok(())
}

/// Collect up to `capacity` packets into one batch.
///
/// Returns `None` once a finite source is drained and nothing was
/// collected.
fn next_batch(
    source: &mut dyn PacketSource,
    capacity: usize,
    frame_id: &str,
) -> Result<Option<PacketBatch>, Error> {
    let mut batch = PacketBatch::new(frame_id);
    while batch.len() < capacity {
        match source.recv()? {
            Some(packet) => batch.push(packet),
            None => break,
        }
    }

    if batch.is_empty() {
        Ok(None)
    } else {
        Ok(Some(batch))
    }
}

/// Resolve the target argument into a packet source.
fn build_source(target: &str) -> Result<Box<dyn PacketSource>, Error> {
    if Path::new(target).is_file() {
        #[cfg(feature = "pcap")]
        {
            info!("replaying capture {}", target);
            let source = velodyne_driver::pcap_source::PcapSource::from_file(
                target,
                Some(velodyne_driver::packet::DATA_PORT),
            )?;
            return Ok(Box::new(source));
        }
        #[cfg(not(feature = "pcap"))]
        return Err(Error::Config(format!(
            "{} looks like a capture file; rebuild with the pcap feature to replay it",
            target
        )));
    }

    let port: u16 = target.parse().map_err(|_| {
        Error::Config(format!(
            "target {:?} is neither an existing file nor a UDP port",
            target
        ))
    })?;
    info!("listening for packets on UDP port {}", port);
    Ok(Box::new(UdpSource::bind(&format!("0.0.0.0:{}", port))?))
}
