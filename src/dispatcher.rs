// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Batch dispatch of decoded output to a registered consumer.
//!
//! A dispatcher walks the packets of an inbound [`PacketBatch`] in order,
//! decodes each one and hands the result to its single consumer callback
//! together with the packet timestamp and the batch frame id. Two variants
//! exist: [`ScanDispatcher`] stops after polar decoding, and
//! [`XyzDispatcher`] additionally projects every point into Cartesian
//! coordinates. The XYZ variant layers on the same decode step rather than
//! reimplementing it.
//!
//! Processing is synchronous on the calling thread. Cancellation is
//! cooperative and batch-level: a shared flag is checked between packets,
//! so a packet already being decoded runs to completion.

use crate::{
    calibration::Calibration,
    decoder::ScanDecoder,
    lidar::{ScanPoint, XyzPoint},
    packet::{PacketBatch, SCANS_PER_PACKET},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::warn;

/// Consumer callback for polar scans: (points, timestamp ns, frame id).
pub type ScanHandler = Box<dyn FnMut(&[ScanPoint], u64, &str) + Send>;

/// Consumer callback for Cartesian points: (points, timestamp ns, frame id).
pub type XyzHandler = Box<dyn FnMut(&[XyzPoint], u64, &str) + Send>;

/// Dispatcher producing polar [`ScanPoint`]s.
///
/// One consumer per instance; fan-out belongs to the transport layer.
/// Instances are single-caller: the decode buffer is owned and reused.
pub struct ScanDispatcher {
    decoder: ScanDecoder,
    calibration: Arc<Calibration>,
    handler: ScanHandler,
    alive: Arc<AtomicBool>,
}

impl ScanDispatcher {
    /// Create a dispatcher over a loaded calibration table.
    ///
    /// The table may be shared with other dispatchers; it is never written
    /// after loading.
    pub fn new(calibration: Arc<Calibration>, handler: ScanHandler) -> Self {
        Self {
            decoder: ScanDecoder::new(),
            calibration,
            handler,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared shutdown flag. Store `false` to stop batch processing at the
    /// next packet boundary.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.alive.clone()
    }

    /// Decode every packet of the batch, invoking the consumer once per
    /// packet.
    ///
    /// Skipped silently while the calibration table is not ready; the
    /// condition is observable through [`Calibration::state`].
    pub fn process_batch(&mut self, batch: &PacketBatch) {
        if !self.calibration.is_ready() {
            warn!(
                "calibration not ready ({:?}), dropping batch of {} packets",
                self.calibration.state(),
                batch.len()
            );
            return;
        }

        for packet in &batch.packets {
            if !self.alive.load(Ordering::Relaxed) {
                break;
            }

            let scans = self.decoder.decode(packet, &self.calibration);
            (self.handler)(scans, packet.stamp, &batch.frame_id);
        }
    }
}

/// Dispatcher producing Cartesian [`XyzPoint`]s.
///
/// Decodes with the same [`ScanDecoder`] step as [`ScanDispatcher`], then
/// projects every point into an owned, reused buffer before invoking the
/// consumer.
pub struct XyzDispatcher {
    decoder: ScanDecoder,
    points: Vec<XyzPoint>,
    calibration: Arc<Calibration>,
    handler: XyzHandler,
    alive: Arc<AtomicBool>,
}

impl XyzDispatcher {
    pub fn new(calibration: Arc<Calibration>, handler: XyzHandler) -> Self {
        Self {
            decoder: ScanDecoder::new(),
            points: Vec::with_capacity(SCANS_PER_PACKET),
            calibration,
            handler,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared shutdown flag. Store `false` to stop batch processing at the
    /// next packet boundary.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.alive.clone()
    }

    /// Decode and project every packet of the batch, invoking the consumer
    /// once per packet.
    pub fn process_batch(&mut self, batch: &PacketBatch) {
        if !self.calibration.is_ready() {
            warn!(
                "calibration not ready ({:?}), dropping batch of {} packets",
                self.calibration.state(),
                batch.len()
            );
            return;
        }

        for packet in &batch.packets {
            if !self.alive.load(Ordering::Relaxed) {
                break;
            }

            let scans = self.decoder.decode(packet, &self.calibration);
            self.points.clear();
            self.points.extend(scans.iter().map(ScanPoint::project));
            (self.handler)(&self.points, packet.stamp, &batch.frame_id);
        }
    }
}
