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

    hdd_config.rs

    Configuration structures for the hard disk subsystem.
*/

//! Configuration of the hard disk subsystem.
//!
//! These structures are deserialized from the `[hdd]` section of a front end's TOML config file:
//!
//! ```toml
//! [[hdd.preset]]
//! name = "My Drive"
//! internal_name = "mydrive"
//! zones = 4
//! avg_spt = 60
//! heads = 4
//! rpm = 3600
//! full_stroke_ms = 28
//! track_seek_ms = 6
//!
//! [[hdd.drive]]
//! drive = 0
//! bus = "ide"
//! image = "media/hdd/dos622.img"
//! cylinders = 615
//! heads = 4
//! sectors = 17
//! preset = "mydrive"
//! ```

use std::path::PathBuf;

use serde_derive::Deserialize;

use crate::{
    device_types::geometry::DriveGeometry,
    devices::hdd::{HardDisk, HddBusType, HddError, HddPreset, PresetCatalog, ZoneFaultPolicy},
    drive_set::HardDiskSet,
};

#[derive(Clone, Debug, Deserialize)]
pub struct HardDiskConfig {
    pub drive: usize,
    #[serde(default)]
    pub bus: String,
    #[serde(default)]
    pub image: PathBuf,
    pub cylinders: u16,
    pub heads: u8,
    pub sectors: u8,
    /// Internal name of the speed preset. The default preset applies if absent.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub fault_policy: Option<ZoneFaultPolicy>,
}

impl HardDiskConfig {
    pub fn geometry(&self) -> DriveGeometry {
        DriveGeometry::new(self.cylinders, self.heads, self.sectors)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HddSubsystemConfig {
    /// Custom presets, appended to the built-in catalog.
    #[serde(default)]
    pub preset: Vec<HddPreset>,
    #[serde(default)]
    pub drive: Vec<HardDiskConfig>,
}

impl HddSubsystemConfig {
    /// Build the preset catalog: the built-in presets followed by any valid custom presets.
    /// Custom presets must not reuse an existing internal name.
    pub fn catalog(&self) -> Result<PresetCatalog, HddError> {
        let mut catalog = PresetCatalog::builtin();
        for preset in &self.preset {
            if preset.is_instant() {
                log::warn!("Custom preset '{}' has no rpm and will not be timed", preset.internal_name);
            }
            else {
                preset
                    .validate()
                    .map_err(|e| HddError::InvalidPreset(preset.internal_name.to_string(), e))?;
            }
            if catalog.find(&preset.internal_name).is_some() {
                return Err(HddError::DuplicatePreset(preset.internal_name.to_string()));
            }
            catalog.push(preset.clone());
        }
        Ok(catalog)
    }

    /// Construct the configured drives and apply their presets.
    pub fn build(&self) -> Result<HardDiskSet, HddError> {
        let mut set = HardDiskSet::new(self.catalog()?);

        for cfg in &self.drive {
            let mut hdd = HardDisk::new(HddBusType::from_str_lossy(&cfg.bus), cfg.image.clone(), cfg.geometry());
            if let Some(policy) = cfg.fault_policy {
                hdd.set_fault_policy(policy);
            }
            set.insert(cfg.drive, hdd)?;

            if let Some(name) = &cfg.preset {
                set.apply_preset_by_name(cfg.drive, name)?;
            }
            log::debug!(
                "Configured drive {} with preset '{}'",
                cfg.drive,
                set.catalog().internal_name(set.get(cfg.drive).map_or(0, HardDisk::speed_preset))
            );
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::hdd::zones::ZoneError;

    fn parse(s: &str) -> HddSubsystemConfig {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn empty_config() {
        let cfg = parse("");
        let set = cfg.build().unwrap();
        assert_eq!(set.valid_drives().count(), 0);
        assert_eq!(set.catalog().len(), PresetCatalog::builtin().len());
    }

    #[test]
    fn drives_with_custom_preset() {
        let cfg = parse(
            r#"
            [[preset]]
            name = "My Drive"
            internal_name = "mydrive"
            model = "MY DRIVE 40"
            zones = 4
            avg_spt = 60
            heads = 4
            rpm = 3600
            full_stroke_ms = 28
            track_seek_ms = 6

            [[drive]]
            drive = 0
            bus = "ide"
            image = "c.img"
            cylinders = 615
            heads = 4
            sectors = 17
            preset = "mydrive"
            fault_policy = "fatal"

            [[drive]]
            drive = 1
            bus = "xta"
            image = "d.img"
            cylinders = 306
            heads = 4
            sectors = 17
            "#,
        );
        let set = cfg.build().unwrap();
        assert_eq!(set.valid_drives().count(), 2);

        let c = set.get(0).unwrap();
        assert_eq!(set.catalog().internal_name(c.speed_preset()), "mydrive");
        assert_eq!(c.model(), Some("MY DRIVE 40"));
        assert_eq!(c.mechanics().zones().len(), 4);
        assert_eq!(c.mechanics().fault_policy(), ZoneFaultPolicy::Fatal);

        let d = set.get(1).unwrap();
        assert_eq!(d.bus_type(), HddBusType::Xta);
        assert_eq!(d.speed_preset(), 0);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let cfg = parse(
            r#"
            [[drive]]
            drive = 0
            bus = "ide"
            image = "c.img"
            cylinders = 615
            heads = 4
            sectors = 17
            preset = "nonexistent"
            "#,
        );
        assert_eq!(cfg.build().unwrap_err(), HddError::UnknownPreset("nonexistent".to_string()));
    }

    #[test]
    fn invalid_custom_preset_is_an_error() {
        let cfg = parse(
            r#"
            [[preset]]
            name = "Broken"
            internal_name = "broken"
            avg_spt = 60
            heads = 4
            rpm = 3600
            "#,
        );
        assert_eq!(
            cfg.catalog().unwrap_err(),
            HddError::InvalidPreset("broken".to_string(), ZoneError::NoZones)
        );
    }

    #[test]
    fn custom_preset_cannot_reuse_builtin_name() {
        let cfg = parse(
            r#"
            [[preset]]
            name = "Faster 1989"
            internal_name = "1989_3500rpm"
            zones = 1
            avg_spt = 40
            heads = 2
            rpm = 3600
            full_stroke_ms = 30
            track_seek_ms = 6
            "#,
        );
        assert_eq!(
            cfg.catalog().unwrap_err(),
            HddError::DuplicatePreset("1989_3500rpm".to_string())
        );
    }

    #[test]
    fn unknown_bus_disables_drive() {
        let cfg = parse(
            r#"
            [[drive]]
            drive = 0
            bus = "floppy"
            image = "c.img"
            cylinders = 615
            heads = 4
            sectors = 17
            "#,
        );
        assert!(matches!(cfg.build(), Err(HddError::InvalidDrive(0, _))));
    }
}
