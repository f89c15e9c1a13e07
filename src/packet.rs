// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! HDL-64E raw packet wire format.
//!
//! Every data packet is a fixed 1206-byte record:
//!
//! - 12 blocks of 100 bytes each:
//!   - bank marker: 2 bytes, little-endian, `0xeeff` (upper) or `0xddff`
//!     (lower)
//!   - rotation encoder: 2 bytes, little-endian, hundredths of a degree
//!   - 32 laser samples of 3 bytes: 2-byte little-endian distance in 2 mm
//!     ticks + 1 intensity byte
//! - revolution counter: 2 bytes, little-endian, wraps at 65536
//! - status: 4 trailing bytes
//!
//! All multi-byte fields are extracted through [`PacketSlice`] and
//! [`BlockSlice`] accessors; no part of the packet is reinterpreted
//! in place.

use crate::lidar::Error;

/// Number of laser-firing blocks in one packet.
pub const BLOCKS_PER_PACKET: usize = 12;

/// Number of laser samples in one block (one bank's worth).
pub const SCANS_PER_BLOCK: usize = 32;

/// Size of one laser sample in bytes (distance + intensity).
pub const RAW_SCAN_SIZE: usize = 3;

/// Size of the sample area of one block in bytes.
pub const BLOCK_DATA_SIZE: usize = SCANS_PER_BLOCK * RAW_SCAN_SIZE;

/// Size of one block in bytes (marker + rotation + samples).
pub const BLOCK_SIZE: usize = 4 + BLOCK_DATA_SIZE;

/// Number of scan points produced by one well-formed packet.
pub const SCANS_PER_PACKET: usize = SCANS_PER_BLOCK * BLOCKS_PER_PACKET;

/// Size of the trailing revolution counter and status bytes.
const TRAILER_SIZE: usize = 6;

/// Total packet size in bytes.
pub const PACKET_SIZE: usize = BLOCKS_PER_PACKET * BLOCK_SIZE + TRAILER_SIZE;

/// Bank marker selecting the upper 32 lasers (ids 32-63).
pub const UPPER_BANK: u16 = 0xeeff;

/// Bank marker selecting the lower 32 lasers (ids 0-31).
pub const LOWER_BANK: u16 = 0xddff;

/// Rotation encoder resolution in degrees per tick.
pub const ROTATION_RESOLUTION: f32 = 0.01;

/// Distance resolution in meters per tick (2 mm).
pub const DISTANCE_RESOLUTION: f32 = 0.002;

/// UDP port the sensor transmits data packets on.
pub const DATA_PORT: u16 = 2368;

/// One raw packet as delivered by the transport, with its receive or
/// capture timestamp in nanoseconds.
///
/// The payload length is fixed by the type, so a constructed `RawPacket`
/// is always shape-correct.
#[derive(Clone, Debug)]
pub struct RawPacket {
    /// Raw packet bytes.
    pub data: [u8; PACKET_SIZE],
    /// Receive or capture timestamp in nanoseconds.
    pub stamp: u64,
}

impl RawPacket {
    pub fn new(data: [u8; PACKET_SIZE], stamp: u64) -> Self {
        Self { data, stamp }
    }

    /// Copy a packet out of a received buffer.
    ///
    /// Fails unless the slice is exactly one packet long; datagrams of any
    /// other length are not lidar data packets.
    pub fn from_slice(slice: &[u8], stamp: u64) -> Result<Self, Error> {
        if slice.len() != PACKET_SIZE {
            return Err(Error::UnexpectedEnd(slice.len()));
        }

        let mut data = [0u8; PACKET_SIZE];
        data.copy_from_slice(slice);
        Ok(Self { data, stamp })
    }
}

/// An ordered batch of raw packets sharing one coordinate frame.
///
/// This is the inbound delivery unit handed to a dispatcher; the transport
/// that assembles it is outside this crate.
#[derive(Clone, Debug)]
pub struct PacketBatch {
    /// Packets in arrival order.
    pub packets: Vec<RawPacket>,
    /// Coordinate frame identifier shared by every packet in the batch.
    pub frame_id: String,
}

impl PacketBatch {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            packets: Vec::new(),
            frame_id: frame_id.into(),
        }
    }

    pub fn push(&mut self, packet: RawPacket) {
        self.packets.push(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// Read-only field view over one raw packet.
#[derive(Copy, Clone, Debug)]
pub struct PacketSlice<'a> {
    slice: &'a [u8; PACKET_SIZE],
}

impl<'a> PacketSlice<'a> {
    pub fn new(slice: &'a [u8; PACKET_SIZE]) -> Self {
        Self { slice }
    }

    /// View of block `index`, 0-11.
    pub fn block(&self, index: usize) -> BlockSlice<'a> {
        debug_assert!(index < BLOCKS_PER_PACKET);
        let start = index * BLOCK_SIZE;
        BlockSlice {
            slice: &self.slice[start..start + BLOCK_SIZE],
        }
    }

    /// Revolution counter for this packet (wraps at 65536).
    pub fn revolution(&self) -> u16 {
        let offset = BLOCKS_PER_PACKET * BLOCK_SIZE;
        u16::from_le_bytes([self.slice[offset], self.slice[offset + 1]])
    }

    /// Trailing status bytes.
    pub fn status(&self) -> &'a [u8] {
        &self.slice[BLOCKS_PER_PACKET * BLOCK_SIZE + 2..]
    }
}

/// Read-only field view over one 100-byte block.
#[derive(Copy, Clone, Debug)]
pub struct BlockSlice<'a> {
    slice: &'a [u8],
}

impl BlockSlice<'_> {
    /// Raw bank marker value.
    pub fn bank_marker(&self) -> u16 {
        u16::from_le_bytes([self.slice[0], self.slice[1]])
    }

    /// True when this block carries lower-bank lasers (ids 0-31).
    ///
    /// Any marker other than [`LOWER_BANK`] selects the upper bank.
    pub fn is_lower_bank(&self) -> bool {
        self.bank_marker() == LOWER_BANK
    }

    /// Rotation encoder reading in hundredths of a degree.
    pub fn rotation(&self) -> u16 {
        u16::from_le_bytes([self.slice[2], self.slice[3]])
    }

    /// Raw distance ticks for laser slot `laser`, 0-31.
    pub fn distance(&self, laser: usize) -> u16 {
        debug_assert!(laser < SCANS_PER_BLOCK);
        let offset = 4 + laser * RAW_SCAN_SIZE;
        u16::from_le_bytes([self.slice[offset], self.slice[offset + 1]])
    }

    /// Intensity byte for laser slot `laser`, 0-31.
    pub fn intensity(&self, laser: usize) -> u8 {
        debug_assert!(laser < SCANS_PER_BLOCK);
        self.slice[4 + laser * RAW_SCAN_SIZE + 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(BLOCK_SIZE, 100);
        assert_eq!(PACKET_SIZE, 1206);
        assert_eq!(SCANS_PER_PACKET, 384);
    }

    fn sample_packet() -> [u8; PACKET_SIZE] {
        let mut data = [0u8; PACKET_SIZE];

        for (i, block) in data[..BLOCKS_PER_PACKET * BLOCK_SIZE]
            .chunks_exact_mut(BLOCK_SIZE)
            .enumerate()
        {
            let marker = if i % 2 == 0 { UPPER_BANK } else { LOWER_BANK };
            block[0..2].copy_from_slice(&marker.to_le_bytes());
            // rotation of 90.00 degrees
            block[2..4].copy_from_slice(&9000u16.to_le_bytes());

            for laser in 0..SCANS_PER_BLOCK {
                let offset = 4 + laser * RAW_SCAN_SIZE;
                let ticks = (laser as u16 + 1) * 100;
                block[offset..offset + 2].copy_from_slice(&ticks.to_le_bytes());
                block[offset + 2] = laser as u8;
            }
        }

        let trailer = BLOCKS_PER_PACKET * BLOCK_SIZE;
        data[trailer..trailer + 2].copy_from_slice(&4242u16.to_le_bytes());
        data[trailer + 2..].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        data
    }

    #[test]
    fn test_packet_slice_fields() {
        let data = sample_packet();
        let view = PacketSlice::new(&data);

        assert_eq!(view.revolution(), 4242);
        assert_eq!(view.status(), &[0xde, 0xad, 0xbe, 0xef]);

        let block = view.block(0);
        assert_eq!(block.bank_marker(), UPPER_BANK);
        assert!(!block.is_lower_bank());
        assert_eq!(block.rotation(), 9000);
        assert_eq!(block.distance(0), 100);
        assert_eq!(block.distance(31), 3200);
        assert_eq!(block.intensity(31), 31);

        let block = view.block(1);
        assert!(block.is_lower_bank());
    }

    #[test]
    fn test_unknown_marker_selects_upper() {
        let mut data = sample_packet();
        data[0..2].copy_from_slice(&0x1234u16.to_le_bytes());
        let view = PacketSlice::new(&data);
        assert!(!view.block(0).is_lower_bank());
    }

    #[test]
    fn test_raw_packet_from_slice() {
        let data = sample_packet();
        let packet = RawPacket::from_slice(&data, 17).unwrap();
        assert_eq!(packet.stamp, 17);
        assert_eq!(packet.data[2], data[2]);

        // Anything but exactly one packet is rejected
        assert!(RawPacket::from_slice(&data[..100], 0).is_err());
        let long = vec![0u8; PACKET_SIZE + 1];
        match RawPacket::from_slice(&long, 0) {
            Err(Error::UnexpectedEnd(len)) => assert_eq!(len, PACKET_SIZE + 1),
            other => panic!("expected UnexpectedEnd, got {:?}", other.map(|p| p.stamp)),
        }
    }

    #[test]
    fn test_packet_batch() {
        let mut batch = PacketBatch::new("velodyne");
        assert!(batch.is_empty());

        batch.push(RawPacket::new(sample_packet(), 1));
        batch.push(RawPacket::new(sample_packet(), 2));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.frame_id, "velodyne");
        assert_eq!(batch.packets[1].stamp, 2);
    }
}
