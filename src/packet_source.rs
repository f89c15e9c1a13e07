// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packet source abstraction for the replay binary and tests.
//!
//! A [`PacketSource`] yields timestamped raw packets one at a time:
//!
//! - [`UdpSource`]: live sensor data from a UDP socket
//! - [`TestSource`]: canned packets for testing
//! - [`crate::pcap_source::PcapSource`]: capture replay (feature `pcap`)
//!
//! Sources are synchronous; batch assembly and dispatch happen on the
//! calling thread.

use crate::{
    lidar::{timestamp, Error},
    packet::{RawPacket, PACKET_SIZE},
};
use std::net::UdpSocket;
use tracing::trace;

/// Trait for packet sources.
pub trait PacketSource {
    /// Receive the next packet.
    ///
    /// # Returns
    /// - `Ok(Some(packet))` - the next timestamped packet
    /// - `Ok(None)` - the source is exhausted (finite sources only)
    /// - `Err` - I/O or source error
    fn recv(&mut self) -> Result<Option<RawPacket>, Error>;
}

/// UDP socket packet source for live sensor operation.
///
/// Datagrams that are not exactly one data packet long are ignored; the
/// sensor shares its ports with position/telemetry packets of other sizes.
pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    /// Create a UDP source from an existing socket.
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Bind to an address and create a UDP source.
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr)?;
        Ok(Self { socket })
    }
}

impl PacketSource for UdpSource {
    fn recv(&mut self) -> Result<Option<RawPacket>, Error> {
        let mut buf = [0u8; 2048];
        loop {
            let (len, _src) = self.socket.recv_from(&mut buf)?;
            if len != PACKET_SIZE {
                trace!("ignoring {} byte datagram", len);
                continue;
            }

            return Ok(Some(RawPacket::from_slice(&buf[..len], timestamp()?)?));
        }
    }
}

/// Test packet source with a pre-defined packet sequence.
pub struct TestSource {
    packets: Vec<RawPacket>,
    index: usize,
}

impl TestSource {
    /// Create a new test source with the given packets.
    pub fn new(packets: Vec<RawPacket>) -> Self {
        Self { packets, index: 0 }
    }

    /// Create an empty test source.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Reset the source to the beginning.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Get the number of packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl PacketSource for TestSource {
    fn recv(&mut self) -> Result<Option<RawPacket>, Error> {
        let Some(packet) = self.packets.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        Ok(Some(packet.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(stamp: u64) -> RawPacket {
        RawPacket::new([0u8; PACKET_SIZE], stamp)
    }

    #[test]
    fn test_test_source_order_and_exhaustion() {
        let mut source = TestSource::new(vec![packet(1), packet(2), packet(3)]);
        assert_eq!(source.len(), 3);

        assert_eq!(source.recv().unwrap().unwrap().stamp, 1);
        assert_eq!(source.recv().unwrap().unwrap().stamp, 2);
        assert_eq!(source.recv().unwrap().unwrap().stamp, 3);
        assert!(source.recv().unwrap().is_none());
        assert!(source.recv().unwrap().is_none());
    }

    #[test]
    fn test_test_source_reset() {
        let mut source = TestSource::new(vec![packet(1), packet(2)]);
        source.recv().unwrap();
        source.recv().unwrap();
        assert!(source.recv().unwrap().is_none());

        source.reset();
        assert_eq!(source.recv().unwrap().unwrap().stamp, 1);
    }

    #[test]
    fn test_empty_test_source() {
        let mut source = TestSource::empty();
        assert!(source.is_empty());
        assert!(source.recv().unwrap().is_none());
    }

    #[test]
    fn test_udp_source_roundtrip() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();

        // A short datagram must be skipped, a full packet delivered
        sender.send_to(&[0u8; 10], addr).unwrap();
        let mut data = [0u8; PACKET_SIZE];
        data[0] = 0xff;
        data[1] = 0xdd;
        sender.send_to(&data, addr).unwrap();

        let mut source = UdpSource::new(receiver);
        let packet = source.recv().unwrap().unwrap();
        assert_eq!(packet.data[0], 0xff);
        assert_eq!(packet.data[1], 0xdd);
    }
}
