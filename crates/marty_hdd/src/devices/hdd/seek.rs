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

    devices::hdd::seek.rs

    Head position tracking and seek time estimation.
*/

//! Mechanical model of the drive: head position and the cost of moving it.

use cfg_if::cfg_if;
use serde_derive::Deserialize;

use crate::devices::hdd::{
    preset::HddPreset,
    zones::{build_zones, HddZone},
    HDD_OVERHEAD_TIME,
    HDD_ZONE_FAULT_TIME,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HddOperation {
    Read,
    Write,
    Seek,
}

/// What to do when a timed drive is asked for a seek estimate but has no zones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneFaultPolicy {
    /// Log and halt. Used when the configuration is expected to be correct.
    Fatal,
    /// Charge [HDD_ZONE_FAULT_TIME] for every access.
    Fallback,
}

impl Default for ZoneFaultPolicy {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(feature = "strict_zones")] {
                ZoneFaultPolicy::Fatal
            }
            else {
                ZoneFaultPolicy::Fallback
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadPosition {
    pub addr: u32,
    pub track: u32,
    pub cylinder: u32,
}

#[derive(Clone, Debug)]
pub struct HddMechanics {
    timed: bool,
    zones: Vec<HddZone>,
    phy_cylinders: u32,
    phy_heads: u32,
    rpm: u32,
    avg_rotation_lat_usec: f64,
    full_stroke_usec: f64,
    head_switch_usec: f64,
    cyl_switch_usec: f64,
    position: HeadPosition,
    fault_policy: ZoneFaultPolicy,
}

impl Default for HddMechanics {
    fn default() -> Self {
        Self::instant(ZoneFaultPolicy::default())
    }
}

impl HddMechanics {
    /// Mechanics for a drive with no speed model. Every access costs the fixed overhead.
    pub fn instant(fault_policy: ZoneFaultPolicy) -> Self {
        Self {
            timed: false,
            zones: Vec::new(),
            phy_cylinders: 0,
            phy_heads: 0,
            rpm: 0,
            avg_rotation_lat_usec: 0.0,
            full_stroke_usec: 0.0,
            head_switch_usec: 0.0,
            cyl_switch_usec: 0.0,
            position: HeadPosition::default(),
            fault_policy,
        }
    }

    /// Derive the mechanics of a drive with `total_sectors` logical sectors from `preset`.
    ///
    /// A preset that cannot be laid out over the geometry leaves the drive timed but without
    /// zones; accesses then follow `fault_policy`.
    pub fn from_preset(preset: &HddPreset, total_sectors: u32, fault_policy: ZoneFaultPolicy) -> Self {
        if preset.is_instant() {
            return Self::instant(fault_policy);
        }

        let (zones, phy_cylinders) = match build_zones(preset, total_sectors) {
            Ok(layout) => (layout.zones, layout.cylinders),
            Err(e) => {
                log::warn!(
                    "Preset '{}' could not be applied to a drive of {} sectors: {}",
                    preset.internal_name,
                    total_sectors,
                    e
                );
                (Vec::new(), 0)
            }
        };

        let revolution_usec = preset.revolution_usec();
        Self {
            timed: true,
            zones,
            phy_cylinders,
            phy_heads: preset.heads,
            rpm: preset.rpm,
            avg_rotation_lat_usec: revolution_usec / 2.0,
            full_stroke_usec: preset.full_stroke_ms * 1000.0,
            head_switch_usec: preset.track_seek_ms * 1000.0,
            cyl_switch_usec: preset.track_seek_ms * 1000.0,
            position: HeadPosition::default(),
            fault_policy,
        }
    }

    #[inline]
    pub fn is_timed(&self) -> bool {
        self.timed
    }

    pub fn zones(&self) -> &[HddZone] {
        &self.zones
    }

    pub fn phy_cylinders(&self) -> u32 {
        self.phy_cylinders
    }

    pub fn phy_heads(&self) -> u32 {
        self.phy_heads
    }

    pub fn rpm(&self) -> u32 {
        self.rpm
    }

    pub fn avg_rotation_lat_usec(&self) -> f64 {
        self.avg_rotation_lat_usec
    }

    pub fn position(&self) -> HeadPosition {
        self.position
    }

    pub fn fault_policy(&self) -> ZoneFaultPolicy {
        self.fault_policy
    }

    pub fn set_fault_policy(&mut self, policy: ZoneFaultPolicy) {
        self.fault_policy = policy;
    }

    /// Park the heads at sector 0.
    pub fn reset_position(&mut self) {
        self.position = HeadPosition::default();
    }

    // Addresses past the end of the disk resolve to the last zone.
    fn zone_for(&self, dst: u32) -> Option<&HddZone> {
        self.zones.iter().find(|z| z.end_sector >= dst).or(self.zones.last())
    }

    fn zone_fault(&self) -> f64 {
        match self.fault_policy {
            ZoneFaultPolicy::Fatal => {
                log::error!("estimate_seek(): timed drive has no zones");
                panic!("estimate_seek(): timed drive has no zones");
            }
            ZoneFaultPolicy::Fallback => HDD_ZONE_FAULT_TIME,
        }
    }

    /// Estimate the time in microseconds to position the head at `dst` and transfer one sector.
    ///
    /// `continuous` requests streaming timing and only applies if `dst` directly follows the
    /// current address. If `max_seek_time` is nonzero the head only moves when the estimate
    /// fits within it; the estimate is returned either way.
    pub fn estimate_seek(&mut self, dst: u32, op: HddOperation, continuous: bool, max_seek_time: f64) -> f64 {
        if !self.timed {
            return HDD_OVERHEAD_TIME;
        }

        let zone = match self.zone_for(dst) {
            Some(zone) => *zone,
            None => return self.zone_fault(),
        };

        let new_track = zone.track_of(dst);
        let new_cylinder = new_track / self.phy_heads;
        let cylinder_diff = self.position.cylinder.abs_diff(new_cylinder);

        let sequential = self.position.addr.checked_add(1) == Some(dst);
        let continuous = continuous && sequential;

        let seek_time = if continuous {
            if new_track == self.position.track {
                zone.sector_time_usec
            }
            else if cylinder_diff == 0 {
                self.head_switch_usec
            }
            else {
                self.cyl_switch_usec
            }
        }
        else {
            let rotation = match op {
                HddOperation::Seek => 0.0,
                _ => self.avg_rotation_lat_usec,
            };
            if cylinder_diff == 0 {
                match op {
                    HddOperation::Seek => HDD_OVERHEAD_TIME,
                    _ => rotation,
                }
            }
            else {
                self.cyl_switch_usec
                    + (self.full_stroke_usec * cylinder_diff as f64 / self.phy_cylinders as f64)
                    + rotation
            }
        };

        if max_seek_time == 0.0 || seek_time <= max_seek_time {
            self.position = HeadPosition {
                addr: dst,
                track: new_track,
                cylinder: new_cylinder,
            };
        }

        seek_time
    }
}
