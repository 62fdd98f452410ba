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

    drive_set.rs

    Owns the hard disk units of a machine.
*/

//! A fixed set of hard disk units owned by the storage subsystem.
//!
//! Drives are addressed by a small integer handle. The set also owns the preset catalog used
//! to (re)configure its drives, so that custom presets loaded from configuration are visible to
//! every unit.

use crate::devices::hdd::{HardDisk, HddError, PresetCatalog};

pub const MAX_HARD_DISKS: usize = 4;

#[derive(Clone, Debug, Default)]
pub struct HardDiskSet {
    drives:  [Option<HardDisk>; MAX_HARD_DISKS],
    catalog: PresetCatalog,
}

impl HardDiskSet {
    pub fn new(catalog: PresetCatalog) -> Self {
        Self {
            drives: Default::default(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    fn check_handle(handle: usize) -> Result<(), HddError> {
        if handle >= MAX_HARD_DISKS {
            return Err(HddError::InvalidHandle(handle, MAX_HARD_DISKS));
        }
        Ok(())
    }

    /// Attach `hdd` at `handle`, returning any drive previously attached there.
    /// Only valid drives may be attached.
    pub fn insert(&mut self, handle: usize, hdd: HardDisk) -> Result<Option<HardDisk>, HddError> {
        Self::check_handle(handle)?;

        if !hdd.bus_type().is_enabled() {
            return Err(HddError::InvalidDrive(handle, "drive is not attached to a bus".to_string()));
        }
        if hdd.image_path().as_os_str().is_empty() {
            return Err(HddError::InvalidDrive(handle, "no image file".to_string()));
        }
        if hdd.geometry().is_degenerate() {
            return Err(HddError::InvalidDrive(handle, format!("empty geometry {}", hdd.geometry())));
        }

        log::debug!(
            "Attaching drive {}: {} on {} bus, geometry {}",
            handle,
            hdd.image_path().display(),
            hdd.bus_type(),
            hdd.geometry()
        );
        Ok(self.drives[handle].replace(hdd))
    }

    pub fn remove(&mut self, handle: usize) -> Option<HardDisk> {
        self.drives.get_mut(handle).and_then(Option::take)
    }

    pub fn get(&self, handle: usize) -> Option<&HardDisk> {
        self.drives.get(handle).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: usize) -> Option<&mut HardDisk> {
        self.drives.get_mut(handle).and_then(Option::as_mut)
    }

    pub fn is_valid(&self, handle: usize) -> bool {
        self.get(handle).is_some_and(HardDisk::is_valid)
    }

    /// Apply preset `preset` from the set's catalog to the drive at `handle`.
    pub fn apply_preset(&mut self, handle: usize, preset: usize) -> Result<(), HddError> {
        Self::check_handle(handle)?;
        let hdd = self.drives[handle].as_mut().ok_or(HddError::NoDrive(handle))?;
        hdd.apply_preset(&self.catalog, preset);
        Ok(())
    }

    /// Apply the preset with internal name `name` to the drive at `handle`.
    pub fn apply_preset_by_name(&mut self, handle: usize, name: &str) -> Result<(), HddError> {
        let preset = self
            .catalog
            .find(name)
            .ok_or_else(|| HddError::UnknownPreset(name.to_string()))?;
        self.apply_preset(handle, preset)
    }

    /// Iterate over the attached drives that are usable, with their handles.
    pub fn valid_drives(&self) -> impl Iterator<Item = (usize, &HardDisk)> {
        self.drives
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().filter(|d| d.is_valid()).map(|d| (i, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::SystemTicks,
        device_types::geometry::DriveGeometry,
        devices::hdd::{HddBusType, HDD_OVERHEAD_TIME},
    };

    fn disk(path: &str) -> HardDisk {
        HardDisk::new(HddBusType::Ide, path, DriveGeometry::new(615, 4, 17))
    }

    #[test]
    fn insert_and_lookup() {
        let mut set = HardDiskSet::default();
        assert!(set.insert(0, disk("c.img")).unwrap().is_none());
        assert!(set.insert(2, disk("e.img")).unwrap().is_none());

        let old = set.insert(0, disk("c2.img")).unwrap();
        assert_eq!(old.unwrap().image_path().to_str(), Some("c.img"));

        let handles: Vec<usize> = set.valid_drives().map(|(i, _)| i).collect();
        assert_eq!(handles, vec![0, 2]);
        assert!(set.is_valid(2));
        assert!(!set.is_valid(1));
        assert!(set.get(7).is_none());

        assert!(set.remove(2).is_some());
        assert!(set.remove(2).is_none());
        assert!(set.remove(9).is_none());
    }

    #[test]
    fn handle_out_of_range() {
        let mut set = HardDiskSet::default();
        assert_eq!(
            set.insert(MAX_HARD_DISKS, disk("c.img")).unwrap_err(),
            HddError::InvalidHandle(MAX_HARD_DISKS, MAX_HARD_DISKS)
        );
        assert_eq!(set.apply_preset(9, 1), Err(HddError::InvalidHandle(9, MAX_HARD_DISKS)));
        assert_eq!(set.apply_preset(1, 1), Err(HddError::NoDrive(1)));
    }

    #[test]
    fn invalid_drives_are_rejected() {
        let mut set = HardDiskSet::default();
        let disabled = HardDisk::new(HddBusType::Disabled, "c.img", DriveGeometry::new(615, 4, 17));
        assert!(matches!(set.insert(0, disabled), Err(HddError::InvalidDrive(0, _))));
        assert!(matches!(set.insert(0, disk("")), Err(HddError::InvalidDrive(0, _))));
        let empty = HardDisk::new(HddBusType::Ide, "c.img", DriveGeometry::new(0, 4, 17));
        assert!(matches!(set.insert(0, empty), Err(HddError::InvalidDrive(0, _))));
        assert_eq!(set.valid_drives().count(), 0);
    }

    #[test]
    fn drives_are_timed_independently() {
        let mut set = HardDiskSet::default();
        set.insert(0, disk("c.img")).unwrap();
        set.insert(1, disk("d.img")).unwrap();
        set.apply_preset_by_name(0, "1992_3600rpm").unwrap();

        let clock = SystemTicks::default();
        let timed = set.get_mut(0).unwrap().timing_read(&clock, 3000, 1);
        let instant = set.get_mut(1).unwrap().timing_read(&clock, 3000, 1);
        assert!(timed > HDD_OVERHEAD_TIME);
        assert_eq!(instant, HDD_OVERHEAD_TIME);
        assert_eq!(set.get(1).unwrap().mechanics().position().addr, 0);

        assert_eq!(
            set.apply_preset_by_name(0, "no_such_preset"),
            Err(HddError::UnknownPreset("no_such_preset".to_string()))
        );
    }
}
