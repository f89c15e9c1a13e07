// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Raw packet to polar scan decoding.
//!
//! [`ScanDecoder`] unpacks one 1206-byte packet into 384 calibrated
//! [`ScanPoint`]s. The output buffer is allocated once and reused across
//! calls, so steady-state decoding performs no allocation.

use crate::{
    calibration::Calibration,
    lidar::{ScanPoint, normalize_angle},
    packet::{
        PacketSlice, RawPacket, BLOCKS_PER_PACKET, DISTANCE_RESOLUTION, ROTATION_RESOLUTION,
        SCANS_PER_BLOCK, SCANS_PER_PACKET,
    },
};

/// Packet decoder with an owned, reused scan buffer.
///
/// Not safe for concurrent use: each decoder instance serves a single
/// calling thread, and the returned slice borrows the internal buffer
/// until the next call.
#[derive(Debug)]
pub struct ScanDecoder {
    scans: Vec<ScanPoint>,
}

impl ScanDecoder {
    pub fn new() -> Self {
        Self {
            scans: Vec::with_capacity(SCANS_PER_PACKET),
        }
    }

    /// Decode one packet into calibrated polar measurements.
    ///
    /// Returns exactly [`SCANS_PER_PACKET`] points for a well-formed
    /// packet. If `calibration` is not ready the result is empty: no
    /// points are fabricated from an unloaded table. Callers that need to
    /// distinguish the two cases query [`Calibration::state`].
    pub fn decode<'a>(
        &'a mut self,
        packet: &RawPacket,
        calibration: &Calibration,
    ) -> &'a [ScanPoint] {
        self.scans.clear();
        if !calibration.is_ready() {
            return &self.scans;
        }

        let view = PacketSlice::new(&packet.data);
        let revolution = view.revolution();

        for i in 0..BLOCKS_PER_PACKET {
            let block = view.block(i);
            let lower = block.is_lower_bank();
            let bank_origin: u8 = if lower { 0 } else { SCANS_PER_BLOCK as u8 };
            let corrections = calibration.bank(lower);

            let rotation = (block.rotation() as f32 * ROTATION_RESOLUTION).to_radians();

            for (j, entry) in corrections.iter().enumerate() {
                let range = block.distance(j) as f32 * DISTANCE_RESOLUTION;
                let range = entry.offset1 * range * range + entry.offset2 * range + entry.offset3;

                // beware: the sensor turns clockwise
                let heading = normalize_angle(-(rotation - entry.rotational));

                // Disabled lasers are decoded and emitted like any other;
                // the enabled flag only travels in the calibration table.
                self.scans.push(ScanPoint {
                    laser_number: bank_origin + j as u8,
                    heading,
                    pitch: entry.vertical,
                    range,
                    intensity: block.intensity(j),
                    revolution,
                });
            }
        }

        debug_assert_eq!(self.scans.len(), SCANS_PER_PACKET);
        &self.scans
    }
}

impl Default for ScanDecoder {
    fn default() -> Self {
        Self::new()
    }
}
