/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    devices::hdd::zones.rs

    Derives the physical zone table of a hard disk from its speed preset.
*/

//! Zoned bit recording.
//!
//! Outer cylinders have a longer circumference than inner ones, so drives of the early 1990s
//! onwards record more sectors per track on the outside of the platter. We approximate this by
//! splitting the physical cylinders into equal bands and giving each band a recording density
//! from a fixed quadratic curve, highest at the outer edge.

use thiserror::Error;

use crate::devices::hdd::preset::HddPreset;

// Coefficients of the sector density curve, in percent of the preset's average sectors per track
// as a function of zone position (0-100%).
const DENSITY_A: f64 = -0.00341684;
const DENSITY_B: f64 = -0.175811;
const DENSITY_C: f64 = 118.48;

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("preset defines no zones")]
    NoZones,
    #[error("preset has no heads")]
    NoHeads,
    #[error("preset has no average sectors per track")]
    NoSectorsPerTrack,
    #[error("preset has an invalid seek time")]
    BadSeekTime,
    #[error("drive geometry has no sectors")]
    EmptyGeometry,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HddZone {
    pub cylinders: u32,
    pub sectors_per_track: u32,
    pub start_sector: u32,
    pub start_track: u32,
    pub end_sector: u32,
    /// Time for one sector to pass under the head.
    pub sector_time_usec: f64,
}

impl HddZone {
    #[inline]
    pub fn contains(&self, lba: u32) -> bool {
        self.start_sector <= lba && lba <= self.end_sector
    }

    #[inline]
    pub fn sector_count(&self) -> u32 {
        self.end_sector - self.start_sector + 1
    }

    /// Return the physical track holding `lba`. `lba` is assumed to be at or past the zone start.
    #[inline]
    pub fn track_of(&self, lba: u32) -> u32 {
        self.start_track + (lba.saturating_sub(self.start_sector) / self.sectors_per_track)
    }
}

/// The physical layout derived from a preset and a logical sector count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneLayout {
    pub zones: Vec<HddZone>,
    pub cylinders: u32,
}

/// Sector density of zone `i` of `zone_ct`, as a percentage of the average.
#[inline]
fn zone_density_percent(i: u64, zone_ct: u64) -> f64 {
    let zone_percent = i as f64 * 100.0 / zone_ct as f64;
    DENSITY_A * zone_percent.powi(2) + DENSITY_B * zone_percent + DENSITY_C
}

/// Build the zone table for a drive of `total_sectors` logical sectors using the physical
/// parameters of `preset`.
///
/// The zones partition `[0, total_sectors)` exactly. The last zone takes whatever sectors the
/// density curve left over; if the outer zones already reach the total, the table ends early.
pub fn build_zones(preset: &HddPreset, total_sectors: u32) -> Result<ZoneLayout, ZoneError> {
    preset.validate()?;
    if preset.is_instant() {
        return Ok(ZoneLayout::default());
    }
    if total_sectors == 0 {
        return Err(ZoneError::EmptyGeometry);
    }

    let total = total_sectors as u64;
    let heads = preset.heads as u64;
    let avg_spt = preset.avg_spt as u64;

    let sectors_per_surface = total.div_ceil(heads);
    let cylinders = sectors_per_surface.div_ceil(avg_spt).max(1);
    // Every zone gets at least one cylinder.
    let zone_ct = (preset.zones as u64).min(cylinders);
    let cylinders_per_zone = cylinders / zone_ct;
    let revolution_usec = preset.revolution_usec();

    let mut zones = Vec::with_capacity(zone_ct as usize);
    let mut lba = 0u64;
    let mut track = 0u64;
    let mut cylinder = 0u64;

    for i in 0..zone_ct {
        let remaining = total - lba;

        let mut zone_cylinders = cylinders_per_zone;
        let mut spt = 0;
        let mut zone_sectors = remaining;
        let mut last = i == zone_ct - 1;

        if !last {
            spt = (avg_spt as f64 * zone_density_percent(i, zone_ct) / 100.0).ceil() as u64;
            zone_sectors = spt * zone_cylinders * heads;
            if zone_sectors >= remaining {
                log::debug!(
                    "build_zones(): zone {} of {} reaches end of disk, truncating zone table",
                    i,
                    zone_ct
                );
                last = true;
            }
        }

        if last {
            zone_cylinders = cylinders - cylinder;
            zone_sectors = remaining;
            spt = remaining.div_ceil(zone_cylinders * heads);
        }

        let zone_tracks = zone_cylinders * heads;
        zones.push(HddZone {
            cylinders: zone_cylinders as u32,
            sectors_per_track: spt as u32,
            start_sector: lba as u32,
            start_track: track as u32,
            end_sector: (lba + zone_sectors - 1) as u32,
            sector_time_usec: revolution_usec / spt as f64,
        });

        lba += zone_sectors;
        track += zone_tracks;
        cylinder += zone_cylinders;

        if last {
            break;
        }
    }

    log::debug!(
        "build_zones(): {} sectors over {} cylinders in {} zone(s), preset '{}'",
        total,
        cylinders,
        zones.len(),
        preset.internal_name
    );

    Ok(ZoneLayout {
        zones,
        cylinders: cylinders as u32,
    })
}
