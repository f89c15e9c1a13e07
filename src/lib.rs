// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Velodyne HDL-64E Driver Library
//!
//! This library decodes raw HDL-64E data packets into calibrated per-laser
//! measurements and, optionally, Cartesian 3D points.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐    ┌──────────────────┐    ┌─────────────────────┐
//! │  PacketBatch   │ ─► │  ScanDispatcher  │ ─► │  consumer callback  │
//! │ (UDP/pcap/test)│    │  XyzDispatcher   │    │  (points, stamp,    │
//! └────────────────┘    └──────────────────┘    │   frame id)         │
//!                               │               └─────────────────────┘
//!                               ▼
//!                  ┌──────────────────────────┐
//!                  │ ScanDecoder ◄ Calibration │
//!                  │ (reused 384-point buffer) │
//!                  └──────────────────────────┘
//! ```
//!
//! The calibration table is loaded once at startup and injected into the
//! decoder; dispatchers own their decode buffers, so steady-state
//! processing performs no allocation. Everything is synchronous on the
//! calling thread.
//!
//! # Modules
//!
//! - [`calibration`]: per-laser correction table and angles file parser
//! - [`packet`]: raw packet wire format and inbound batch types
//! - [`decoder`]: packet to polar scan decoding
//! - [`dispatcher`]: batch dispatch to a registered consumer
//! - [`lidar`]: measurement types, projection, error handling
//! - [`packet_source`]: packet acquisition for replay and tests
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use velodyne_driver::{Calibration, ScanDispatcher};
//!
//! let mut calibration = Calibration::new();
//! calibration.load_file("angles.config")?;
//! let calibration = Arc::new(calibration);
//!
//! let mut dispatcher = ScanDispatcher::new(
//!     calibration,
//!     Box::new(|scans, stamp, frame_id| {
//!         println!("{}: {} points at {} ns", frame_id, scans.len(), stamp);
//!     }),
//! );
//!
//! // Batches arrive from the transport layer
//! dispatcher.process_batch(&batch);
//! ```

pub mod calibration;
pub mod decoder;
pub mod dispatcher;
pub mod lidar;
pub mod packet;
pub mod packet_source;
#[cfg(feature = "pcap")]
pub mod pcap_source;

// Re-exports for convenience
pub use calibration::{Calibration, CorrectionEntry, State};
pub use decoder::ScanDecoder;
pub use dispatcher::{ScanDispatcher, ScanHandler, XyzDispatcher, XyzHandler};
pub use lidar::{Error, ScanPoint, XyzPoint};
pub use packet::{PacketBatch, RawPacket, PACKET_SIZE, SCANS_PER_PACKET};
pub use packet_source::PacketSource;
#[cfg(feature = "pcap")]
pub use pcap_source::PcapSource;
