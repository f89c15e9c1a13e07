// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-laser correction table loaded from an angles configuration file.
//!
//! The file is plain text, one laser per line:
//!
//! ```text
//! # comment
//! upper
//! 32 -4.5 2.1 0.0 1.0 0.0 1
//! lower
//! 0 3.25 -7.1458 0.000008 0.998555 0.215672 -0.025 0.03 1
//! ```
//!
//! Two schemas are accepted, tried in order:
//!
//! 1. `index rotational vertical offset1 offset2 offset3 enabled`
//! 2. `index rotational vertical offset1 offset2 offset3 vertCorr horzCorr
//!    enabled`
//!
//! `rotational` and `vertical` are degrees on disk and radians in memory.
//! The literal `upper`/`lower` section labels are a legacy of older files
//! and carry no meaning. Lines matching neither schema are skipped.

use crate::lidar::Error;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{debug, info, warn};

/// Total number of lasers on the unit.
pub const LASER_COUNT: usize = 64;

/// Number of lasers per bank; ids below this are lower bank, the rest
/// upper with the origin subtracted.
pub const BANK_SIZE: usize = 32;

/// Correction coefficients for one laser. Immutable once loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CorrectionEntry {
    /// Rotational (azimuth) offset in radians.
    pub rotational: f32,
    /// Fixed vertical angle in radians.
    pub vertical: f32,
    /// Quadratic range correction coefficient.
    pub offset1: f32,
    /// Linear range correction coefficient.
    pub offset2: f32,
    /// Constant range correction term.
    pub offset3: f32,
    /// Vertical mechanical offset, extended schema only.
    pub vert_corr: f32,
    /// Horizontal mechanical offset, extended schema only.
    pub horz_corr: f32,
    /// Whether the laser is marked usable. Carried through to consumers;
    /// decoding does not filter on it.
    pub enabled: bool,
}

/// Calibration lifecycle.
///
/// The table is written exactly once during initialization and read-only
/// afterwards, so a `Ready` table can be shared across dispatchers without
/// synchronization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// No load attempted yet.
    #[default]
    Uninitialized,
    /// Load in progress.
    Loading,
    /// Table populated; decoding may proceed.
    Ready,
    /// Load failed; decoding stays a no-op.
    Failed,
}

/// The 64-laser correction table, split into lower and upper banks.
#[derive(Clone, Debug)]
pub struct Calibration {
    lower: [CorrectionEntry; BANK_SIZE],
    upper: [CorrectionEntry; BANK_SIZE],
    state: State,
}

impl Calibration {
    /// Create an empty table in the [`State::Uninitialized`] state.
    pub fn new() -> Self {
        Self {
            lower: [CorrectionEntry::default(); BANK_SIZE],
            upper: [CorrectionEntry::default(); BANK_SIZE],
            state: State::Uninitialized,
        }
    }

    /// Load correction angles from a file.
    ///
    /// Failure to open or read the file is the only fatal error in this
    /// subsystem: the call returns `Err` and the table stays
    /// [`State::Failed`]. Unparseable lines are skipped.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                self.state = State::Failed;
                warn!("failure opening correction angles file {:?}: {}", path, err);
                return Err(err.into());
            }
        };

        info!("correction angles: {:?}", path);
        self.load(BufReader::new(file))
    }

    /// Load correction angles from any buffered text source.
    pub fn load(&mut self, reader: impl BufRead) -> Result<(), Error> {
        self.state = State::Loading;

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    self.state = State::Failed;
                    return Err(err.into());
                }
            };
            let line = line.trim();

            // Comments and the legacy section labels carry no data.
            if line.is_empty() || line.starts_with('#') || line == "upper" || line == "lower" {
                continue;
            }

            let Some((index, entry)) = parse_entry(line) else {
                debug!("skipping unrecognized calibration line: {:?}", line);
                continue;
            };

            let Ok(index) = usize::try_from(index) else {
                warn!("calibration index {} negative, line ignored", index);
                continue;
            };
            if index >= LASER_COUNT {
                warn!("calibration index {} beyond laser {}, line ignored", index, LASER_COUNT - 1);
                continue;
            }

            if index < BANK_SIZE {
                self.lower[index] = entry;
            } else {
                self.upper[index - BANK_SIZE] = entry;
            }
        }

        self.state = State::Ready;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// True once a load has completed successfully.
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// Correction entry for laser `laser_number`.
    ///
    /// # Panics
    ///
    /// Panics if `laser_number` is 64 or above.
    pub fn entry(&self, laser_number: u8) -> &CorrectionEntry {
        let laser = laser_number as usize;
        if laser < BANK_SIZE {
            &self.lower[laser]
        } else {
            &self.upper[laser - BANK_SIZE]
        }
    }

    /// The 32 entries of one bank, selected the way packet blocks select
    /// them.
    pub(crate) fn bank(&self, lower: bool) -> &[CorrectionEntry; BANK_SIZE] {
        if lower {
            &self.lower
        } else {
            &self.upper
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one data line against the two supported schemas.
///
/// Returns the raw (possibly out-of-range) index and the entry, or `None`
/// when the line matches neither schema.
fn parse_entry(line: &str) -> Option<(i64, CorrectionEntry)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 7 && fields.len() != 9 {
        return None;
    }

    let index = fields[0].parse::<i64>().ok()?;
    let rotational = fields[1].parse::<f32>().ok()?.to_radians();
    let vertical = fields[2].parse::<f32>().ok()?.to_radians();
    let offset1 = fields[3].parse::<f32>().ok()?;
    let offset2 = fields[4].parse::<f32>().ok()?;
    let offset3 = fields[5].parse::<f32>().ok()?;

    let (vert_corr, horz_corr, enabled) = if fields.len() == 9 {
        (
            fields[6].parse::<f32>().ok()?,
            fields[7].parse::<f32>().ok()?,
            fields[8].parse::<i32>().ok()?,
        )
    } else {
        (0.0, 0.0, fields[6].parse::<i32>().ok()?)
    };

    Some((
        index,
        CorrectionEntry {
            rotational,
            vertical,
            offset1,
            offset2,
            offset3,
            vert_corr,
            horz_corr,
            enabled: enabled != 0,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_new_is_uninitialized() {
        let calibration = Calibration::new();
        assert_eq!(calibration.state(), State::Uninitialized);
        assert!(!calibration.is_ready());
    }

    #[test]
    fn test_load_seven_field_schema() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("5 90.0 -30.0 0.5 1.5 2.5 1\n"))
            .unwrap();

        assert!(calibration.is_ready());
        let entry = calibration.entry(5);
        assert!((entry.rotational - 90f32.to_radians()).abs() < 1e-6);
        assert!((entry.vertical + 30f32.to_radians()).abs() < 1e-6);
        assert_eq!(entry.offset1, 0.5);
        assert_eq!(entry.offset2, 1.5);
        assert_eq!(entry.offset3, 2.5);
        assert_eq!(entry.vert_corr, 0.0);
        assert_eq!(entry.horz_corr, 0.0);
        assert!(entry.enabled);
    }

    #[test]
    fn test_load_nine_field_schema() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("40 1.0 2.0 3.0 4.0 5.0 -0.025 0.03 0\n"))
            .unwrap();

        let entry = calibration.entry(40);
        assert_eq!(entry.vert_corr, -0.025);
        assert_eq!(entry.horz_corr, 0.03);
        assert!(!entry.enabled);
    }

    #[test]
    fn test_bank_split_boundary() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("31 0 0 0 1.0 10.0 1\n32 0 0 0 1.0 20.0 1\n"))
            .unwrap();

        // index 31 is the last lower-bank slot, 32 the first upper-bank slot
        assert_eq!(calibration.bank(true)[31].offset3, 10.0);
        assert_eq!(calibration.bank(false)[0].offset3, 20.0);
        assert_eq!(calibration.entry(31).offset3, 10.0);
        assert_eq!(calibration.entry(32).offset3, 20.0);
    }

    #[test]
    fn test_comments_and_labels_only() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("# HDL-64E unit 42\nupper\nlower\n\n"))
            .unwrap();

        assert!(calibration.is_ready());
        for laser in 0..LASER_COUNT {
            assert_eq!(*calibration.entry(laser as u8), CorrectionEntry::default());
        }
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let source = "\
garbage line
1 2 3
8 1.0 2.0 3.0 4.0 5.0 6.0 1
7 0 0 0 1.0 5.0 1
7 not a number here at all 1
";
        let mut calibration = Calibration::new();
        calibration.load(Cursor::new(source)).unwrap();

        assert!(calibration.is_ready());
        // Only the valid 7-field line landed
        assert_eq!(calibration.entry(7).offset3, 5.0);
        assert_eq!(*calibration.entry(8), CorrectionEntry::default());
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("64 0 0 0 1.0 9.0 1\n-1 0 0 0 1.0 9.0 1\n"))
            .unwrap();

        assert!(calibration.is_ready());
        for laser in 0..LASER_COUNT {
            assert_eq!(*calibration.entry(laser as u8), CorrectionEntry::default());
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let mut calibration = Calibration::new();
        let result = calibration.load_file("/nonexistent/angles.config");

        assert!(result.is_err());
        assert_eq!(calibration.state(), State::Failed);
        assert!(!calibration.is_ready());
    }

    #[test]
    fn test_last_line_wins() {
        let mut calibration = Calibration::new();
        calibration
            .load(Cursor::new("3 0 0 0 1.0 1.0 1\n3 0 0 0 1.0 2.0 1\n"))
            .unwrap();
        assert_eq!(calibration.entry(3).offset3, 2.0);
    }
}
