// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common LiDAR measurement types and error handling.
//!
//! This module provides the sensor-facing value types shared by the decoder
//! and dispatchers: polar [`ScanPoint`] measurements, their Cartesian
//! [`XyzPoint`] projection, and the crate-wide [`Error`] type.

use std::f32::consts::PI;
use std::fmt;

/// One decoded polar measurement from a single laser firing.
///
/// Angles are in radians, range in meters. The heading is normalized to
/// (-π, π] with the counter-clockwise-positive convention.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScanPoint {
    /// Laser id, 0-63. Lasers 0-31 belong to the lower bank, 32-63 to the
    /// upper bank.
    pub laser_number: u8,
    /// Azimuthal angle in radians, normalized to (-π, π].
    pub heading: f32,
    /// Fixed vertical angle of this laser in radians, from calibration.
    pub pitch: f32,
    /// Corrected range in meters. May be negative for degenerate
    /// calibration input; consumers decide how to treat such points.
    pub range: f32,
    /// Reflected intensity, 0-255.
    pub intensity: u8,
    /// Sensor revolution this measurement belongs to (wraps at 65536).
    pub revolution: u16,
}

impl ScanPoint {
    /// Project this polar measurement into Cartesian coordinates.
    ///
    /// Pure function of the point; laser id, heading, revolution and
    /// intensity pass through unchanged.
    #[inline]
    pub fn project(&self) -> XyzPoint {
        let xy_projection = self.range * self.pitch.cos();
        XyzPoint {
            laser_number: self.laser_number,
            heading: self.heading,
            x: xy_projection * self.heading.cos(),
            y: xy_projection * self.heading.sin(),
            z: self.range * self.pitch.sin(),
            intensity: self.intensity,
            revolution: self.revolution,
        }
    }
}

/// Cartesian projection of a [`ScanPoint`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XyzPoint {
    /// Laser id, 0-63.
    pub laser_number: u8,
    /// Azimuthal angle of the originating measurement in radians.
    pub heading: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Reflected intensity, 0-255.
    pub intensity: u8,
    /// Sensor revolution this measurement belongs to (wraps at 65536).
    pub revolution: u16,
}

/// Normalize an angle in radians to the half-open interval (-π, π].
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    PI - (PI - angle).rem_euclid(2.0 * PI)
}

/// Common error type for driver operations.
#[derive(Debug)]
pub enum Error {
    /// I/O error (socket, file operations)
    Io(std::io::Error),
    /// Invalid packet data
    InvalidPacket(String),
    /// Unexpected end of data at given byte position
    UnexpectedEnd(usize),
    /// Configuration error
    Config(String),
    /// System time error
    SystemTime(std::time::SystemTimeError),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::InvalidPacket(msg) => write!(f, "invalid packet: {}", msg),
            Error::UnexpectedEnd(len) => write!(f, "unexpected end of data at {} bytes", len),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::SystemTime(err) => write!(f, "system time error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(err: std::time::SystemTimeError) -> Self {
        Error::SystemTime(err)
    }
}

/// Get current timestamp in nanoseconds.
///
/// On Linux, uses `CLOCK_MONOTONIC_RAW` for best accuracy.
/// On other platforms, falls back to `SystemTime`.
#[cfg(target_os = "linux")]
pub fn timestamp() -> Result<u64, Error> {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let err = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut tp) };
    if err != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(tp.tv_sec as u64 * 1_000_000_000 + tp.tv_nsec as u64)
}

#[cfg(not(target_os = "linux"))]
pub fn timestamp() -> Result<u64, Error> {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH)?;
    Ok(duration.as_nanos() as u64)
}
