// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! PCAP file packet source for testing and offline replay.
//!
//! Reads UDP payloads from PCAP/PCAPNG captures and yields them as
//! timestamped [`RawPacket`]s through the [`PacketSource`] trait, so
//! recorded sensor data can drive the decoder without hardware. Payloads
//! that are not exactly one data packet long are dropped during
//! extraction.

use crate::{
    lidar::Error,
    packet::{RawPacket, PACKET_SIZE},
};
use crate::packet_source::PacketSource;
use pcap_parser::traits::PcapReaderIterator;
use std::path::Path;
use tracing::debug;

/// PCAP file packet source.
///
/// The whole capture is extracted into memory up front; replay then never
/// touches the filesystem.
pub struct PcapSource {
    packets: Vec<RawPacket>,
    index: usize,
}

impl PcapSource {
    /// Load a capture from disk, optionally filtering by UDP port.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a PCAP or PCAPNG file
    /// * `port` - Optional port filter (matches source OR destination)
    pub fn from_file<P: AsRef<Path>>(path: P, port: Option<u16>) -> Result<Self, Error> {
        let data = std::fs::read(path.as_ref()).map_err(Error::Io)?;
        Self::from_bytes(&data, port)
    }

    /// Load a capture from bytes, optionally filtering by UDP port.
    pub fn from_bytes(data: &[u8], port: Option<u16>) -> Result<Self, Error> {
        let mut packets = Vec::new();

        if data.len() >= 4 && data[0..4] == [0x0a, 0x0d, 0x0d, 0x0a] {
            // PCAPNG format (Section Header Block magic)
            Self::extract_pcapng(data, port, &mut packets)?;
        } else {
            Self::extract_legacy_pcap(data, port, &mut packets)?;
        }

        debug!("extracted {} lidar packets from capture", packets.len());
        Ok(Self { packets, index: 0 })
    }

    /// Extract packets from legacy PCAP format.
    fn extract_legacy_pcap(
        data: &[u8],
        port: Option<u16>,
        packets: &mut Vec<RawPacket>,
    ) -> Result<(), Error> {
        use pcap_parser::*;

        // Buffer size must be at least as large as the data to avoid
        // Incomplete errors
        let mut reader = LegacyPcapReader::new(data.len(), data)
            .map_err(|e| Error::InvalidPacket(format!("Failed to create PCAP reader: {:?}", e)))?;

        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    if let PcapBlockOwned::Legacy(record) = block {
                        let stamp =
                            record.ts_sec as u64 * 1_000_000_000 + record.ts_usec as u64 * 1_000;
                        if let Some(packet) = Self::extract_lidar_packet(record.data, port, stamp) {
                            packets.push(packet);
                        }
                    }
                    reader.consume(offset);
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete(_)) => {
                    // Need more data but we loaded everything, so just break
                    break;
                }
                Err(e) => {
                    return Err(Error::InvalidPacket(format!("PCAP parse error: {:?}", e)));
                }
            }
        }

        Ok(())
    }

    /// Extract packets from PCAPNG format.
    fn extract_pcapng(
        data: &[u8],
        port: Option<u16>,
        packets: &mut Vec<RawPacket>,
    ) -> Result<(), Error> {
        use pcap_parser::*;

        let mut reader = PcapNGReader::new(data.len(), data).map_err(|e| {
            Error::InvalidPacket(format!("Failed to create PCAPNG reader: {:?}", e))
        })?;

        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    match block {
                        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                            // Timestamps assume the default microsecond
                            // interface resolution.
                            let ticks = (epb.ts_high as u64) << 32 | epb.ts_low as u64;
                            let stamp = ticks * 1_000;
                            if let Some(packet) = Self::extract_lidar_packet(epb.data, port, stamp)
                            {
                                packets.push(packet);
                            }
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                            // Simple packet blocks carry no timestamp
                            if let Some(packet) = Self::extract_lidar_packet(spb.data, port, 0) {
                                packets.push(packet);
                            }
                        }
                        _ => {
                            // Skip other block types (SHB, IDB, etc.)
                        }
                    }
                    reader.consume(offset);
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete(_)) => break,
                Err(e) => {
                    return Err(Error::InvalidPacket(format!("PCAPNG parse error: {:?}", e)));
                }
            }
        }

        Ok(())
    }

    /// Extract a lidar data packet from one captured Ethernet frame.
    ///
    /// Non-UDP frames, filtered ports and payloads of the wrong length all
    /// return `None`.
    fn extract_lidar_packet(data: &[u8], port: Option<u16>, stamp: u64) -> Option<RawPacket> {
        use etherparse::SlicedPacket;

        let packet = SlicedPacket::from_ethernet(data).ok()?;

        let udp = match packet.transport {
            Some(etherparse::TransportSlice::Udp(udp)) => udp,
            _ => return None,
        };

        if let Some(filter_port) = port {
            let src_port = udp.source_port();
            let dst_port = udp.destination_port();
            if src_port != filter_port && dst_port != filter_port {
                return None;
            }
        }

        let payload = udp.payload();
        if payload.len() != PACKET_SIZE {
            return None;
        }

        RawPacket::from_slice(payload, stamp).ok()
    }

    /// Reset source to beginning for replay.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Get the total number of packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if the source contains no packets.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Get remaining packet count.
    pub fn remaining(&self) -> usize {
        self.packets.len().saturating_sub(self.index)
    }
}

impl PacketSource for PcapSource {
    fn recv(&mut self) -> Result<Option<RawPacket>, Error> {
        let Some(packet) = self.packets.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        Ok(Some(packet.clone()))
    }
}
