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

    devices::hdd::preset.rs

    Hard disk speed preset catalog.
*/

//! Drive speed presets.
//!
//! A preset describes the physical characteristics of a drive model: spindle speed, head count,
//! seek times, recording density and cache organization. The catalog is static data; index 0 is
//! always the instantaneous RAM disk, which disables the timing model entirely.

use std::borrow::Cow;

use serde_derive::Deserialize;

use crate::devices::hdd::zones::ZoneError;

const fn _default_segments() -> u32 {
    1
}
const fn _default_segment_size() -> u32 {
    16
}
const fn _default_max_multiple() -> u32 {
    8
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HddPreset {
    pub name: Cow<'static, str>,
    pub internal_name: Cow<'static, str>,
    /// Overrides the model string the drive reports on identify.
    #[serde(default)]
    pub model: Option<Cow<'static, str>>,
    /// Overrides the firmware revision the drive reports on identify.
    #[serde(default)]
    pub firmware: Option<Cow<'static, str>>,
    #[serde(default)]
    pub zones: u32,
    #[serde(default)]
    pub avg_spt: u32,
    #[serde(default)]
    pub heads: u32,
    #[serde(default)]
    pub rpm: u32,
    #[serde(default)]
    pub full_stroke_ms: f64,
    #[serde(default)]
    pub track_seek_ms: f64,
    #[serde(default = "_default_segments")]
    pub rcache_num_seg: u32,
    #[serde(default = "_default_segment_size")]
    pub rcache_seg_size: u32,
    #[serde(default = "_default_max_multiple")]
    pub max_multiple: u32,
}

impl HddPreset {
    /// A preset with no speed model. Only the cache organization and block size apply.
    pub const fn instant(
        name: &'static str,
        internal_name: &'static str,
        rcache_num_seg: u32,
        rcache_seg_size: u32,
        max_multiple: u32,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            internal_name: Cow::Borrowed(internal_name),
            model: None,
            firmware: None,
            zones: 0,
            avg_spt: 0,
            heads: 0,
            rpm: 0,
            full_stroke_ms: 0.0,
            track_seek_ms: 0.0,
            rcache_num_seg,
            rcache_seg_size,
            max_multiple,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub const fn generic(
        name: &'static str,
        internal_name: &'static str,
        zones: u32,
        avg_spt: u32,
        heads: u32,
        rpm: u32,
        full_stroke_ms: f64,
        track_seek_ms: f64,
        rcache_num_seg: u32,
        rcache_seg_size: u32,
        max_multiple: u32,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            internal_name: Cow::Borrowed(internal_name),
            model: None,
            firmware: None,
            zones,
            avg_spt,
            heads,
            rpm,
            full_stroke_ms,
            track_seek_ms,
            rcache_num_seg,
            rcache_seg_size,
            max_multiple,
        }
    }

    /// A named historical drive, reporting its own model string and optionally its own firmware
    /// revision.
    #[allow(clippy::too_many_arguments)]
    pub const fn drive(
        name: &'static str,
        internal_name: &'static str,
        model: &'static str,
        zones: u32,
        avg_spt: u32,
        heads: u32,
        rpm: u32,
        full_stroke_ms: f64,
        track_seek_ms: f64,
        rcache_num_seg: u32,
        rcache_seg_size: u32,
        max_multiple: u32,
        firmware: Option<&'static str>,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            internal_name: Cow::Borrowed(internal_name),
            model: Some(Cow::Borrowed(model)),
            firmware: match firmware {
                Some(fw) => Some(Cow::Borrowed(fw)),
                None => None,
            },
            zones,
            avg_spt,
            heads,
            rpm,
            full_stroke_ms,
            track_seek_ms,
            rcache_num_seg,
            rcache_seg_size,
            max_multiple,
        }
    }

    /// An instantaneous preset has no spindle, so no access is ever charged mechanical time.
    #[inline]
    pub fn is_instant(&self) -> bool {
        self.rpm == 0
    }

    /// Time for one full revolution of the platters, in microseconds.
    pub fn revolution_usec(&self) -> f64 {
        if self.is_instant() {
            return 0.0;
        }
        60.0 / self.rpm as f64 * 1_000_000.0
    }

    /// Check that a timed preset can produce a zone table.
    pub fn validate(&self) -> Result<(), ZoneError> {
        if self.is_instant() {
            return Ok(());
        }
        if self.zones == 0 {
            return Err(ZoneError::NoZones);
        }
        if self.heads == 0 {
            return Err(ZoneError::NoHeads);
        }
        if self.avg_spt == 0 {
            return Err(ZoneError::NoSectorsPerTrack);
        }
        if !(self.full_stroke_ms >= 0.0 && self.track_seek_ms >= 0.0) {
            return Err(ZoneError::BadSeekTime);
        }
        Ok(())
    }
}

#[rustfmt::skip]
static HDD_SPEED_PRESETS: &[HddPreset] = &[
    HddPreset::instant("[Generic] RAM Disk (max. speed)", "ramdisk", 16, 128, 32),
    HddPreset::generic("[Generic] 1989 (3500 RPM)", "1989_3500rpm", 1, 35, 2, 3500, 40.0, 8.0, 1, 16, 8),
    HddPreset::generic("[Generic] 1992 (3600 RPM)", "1992_3600rpm", 1, 45, 2, 3600, 30.0, 6.0, 4, 16, 8),
    HddPreset::generic("[Generic] 1994 (4500 RPM)", "1994_4500rpm", 8, 80, 4, 4500, 26.0, 5.0, 4, 32, 16),
    HddPreset::generic("[Generic] 1996 (5400 RPM)", "1996_5400rpm", 16, 135, 4, 5400, 24.0, 3.0, 4, 64, 16),
    HddPreset::generic("[Generic] 1997 (5400 RPM)", "1997_5400rpm", 16, 185, 6, 5400, 20.0, 2.5, 8, 64, 32),
    HddPreset::generic("[Generic] 1998 (5400 RPM)", "1998_5400rpm", 16, 300, 8, 5400, 20.0, 2.0, 8, 128, 32),
    HddPreset::generic("[Generic] 2000 (7200 RPM)", "2000_7200rpm", 16, 350, 6, 7200, 15.0, 2.0, 16, 128, 32),
    HddPreset::drive("[PIO IDE] Areal A-90XT", "A90XT", "AREAL A-90XT", 1, 50, 2, 2087, 55.0, 4.0, 1, 32, 1, None),
    HddPreset::drive("[PIO IDE] IBM WDA-L42", "WDAL42", "WDA-L42", 1, 85, 2, 3600, 33.0, 2.5, 1, 32, 1, None),
    HddPreset::drive("[PIO-2] IBM DSAA-3270", "DSAA3270", "DSAA-3270", 8, 268, 2, 4500, 25.0, 2.1, 3, 32, 8, Some("25505120")),
    HddPreset::drive("[ATA-1] Alps Electric DR-311C AT", "DR311", "ALPS DR311", 1, 33, 2, 3448, 50.0, 5.0, 1, 128, 8, Some("E125052E")),
    HddPreset::drive("[ATA-1] Areal A-260AT", "A260AT", "AREAL A-260AT", 1, 50, 4, 2981, 35.0, 3.0, 1, 32, 8, None),
    HddPreset::drive("[ATA-1] Brand Tech BT-9170A", "BT9170A", "BRAND BT-9170A", 1, 165, 7, 3565, 33.0, 3.0, 1, 64, 8, None),
    HddPreset::drive("[ATA-1] Conner CP-3104", "CP3104", "Conner Peripherals 104MB - CP3104", 1, 33, 8, 3500, 45.0, 8.0, 4, 8, 8, None),
    HddPreset::drive("[ATA-1] Conner CFN-340A", "CFN340A", "Conner Peripherals 340MB - CFN340A", 4, 130, 6, 4500, 34.0, 3.0, 4, 32, 8, None),
    HddPreset::drive("[ATA-1] HP Kittyhawk", "C3014A", "HP C3014A", 6, 80, 3, 5400, 18.0, 3.0, 4, 16, 8, None),
    HddPreset::drive("[ATA-1] Maxtor 7120AT", "7120AT", "Maxtor 7120 AT", 1, 54, 2, 3524, 27.0, 4.0, 1, 64, 8, None),
    HddPreset::drive("[ATA-1] Maxtor 7245AT", "7245AT", "Maxtor 7245 AT", 4, 149, 4, 3551, 27.0, 4.4, 8, 64, 8, None),
    HddPreset::drive("[ATA-1] Quantum GoDrive GU256AT", "GU25A011", "QUANTUM GODRIVE 256AT", 1, 150, 4, 3605, 45.0, 4.0, 1, 128, 8, None),
    HddPreset::drive("[ATA-1] Seagate ST3243A", "ST3243A", "ST3243A", 2, 40, 4, 3811, 32.0, 4.0, 4, 32, 8, None),
    HddPreset::drive("[ATA-1] Western Digital Caviar 2340", "AC2340", "WDC AC2340H", 4, 130, 2, 3320, 28.0, 4.0, 4, 64, 8, None),
    HddPreset::drive("[ATA-2] Conner CFA-540A", "CFA540A", "Conner Peripherals 540MB - CFA540A", 2, 120, 4, 3551, 31.0, 4.3, 4, 32, 8, None),
    HddPreset::drive("[ATA-2] Fujitsu Picobird 9 1.9GB", "M1637TAU", "FUJITSU M1637TAU", 4, 110, 3, 5400, 21.0, 3.0, 4, 128, 8, None),
    HddPreset::drive("[ATA-2] Hitachi DK213A-13", "DK213A13", "HITACHI DK213A-13", 8, 120, 10, 4464, 30.0, 3.0, 4, 128, 8, None),
    HddPreset::drive("[ATA-2] IBM Deskstar 4 (DCAA-32880)", "DCAA32880", "IBM-DCAA-32880", 8, 185, 2, 5400, 19.0, 1.7, 4, 96, 16, None),
    HddPreset::drive("[ATA-2] Quantum Trailblazer TR-635AT", "TR63A011", "QUANTUM TRAIBLAZER 635AT", 4, 140, 3, 4500, 28.0, 5.0, 8, 128, 8, None),
    HddPreset::drive("[ATA-2] Quantum Bigfoot BF1.2AT", "BF12A011", "QUANTUM BIGFOOT BF1.2A", 2, 155, 2, 3600, 30.0, 3.5, 4, 128, 8, None),
    HddPreset::drive("[ATA-2] Seagate Medalist 850xe", "ST3850A", "ST3850A", 8, 150, 4, 3811, 34.0, 3.8, 8, 120, 8, None),
    HddPreset::drive("[ATA-2] Western Digital Caviar 2850", "AC2850", "AC2850F", 4, 130, 4, 5200, 12.0, 4.0, 8, 128, 8, None),
    HddPreset::drive("[ATA-2] Western Digital Caviar 31000", "AC31000", "WDC AC31000F", 8, 110, 2, 5200, 30.0, 3.0, 8, 128, 8, None),
    HddPreset::drive("[ATA-3] Fujitsu Mobile 4 3.2G", "MHC2032AT", "FUJITSU MHC2032AT", 12, 135, 4, 4000, 30.0, 2.5, 8, 512, 16, None),
    HddPreset::drive("[ATA-3] Hitachi DK226A-21", "DK226A21", "HITACHI DK226A-21", 8, 125, 6, 4000, 33.0, 3.0, 8, 128, 16, None),
    HddPreset::drive("[ATA-3] Seagate Medalist 1276", "ST31276A", "Seagate Technology 1275MB - ST31276A", 4, 130, 3, 4500, 25.0, 3.8, 4, 64, 16, None),
    HddPreset::drive("[ATA-4] Fujitsu MPA3026AT Ultra-ATA", "MPA3026AT4", "FUJITSU MPA3026AT", 8, 195, 3, 5400, 20.0, 3.2, 8, 128, 16, None),
    HddPreset::drive("[ATA-4] Fujitsu MPE3064AT", "MPE3064AT", "FUJITSU MPE3064AT", 7, 295, 2, 5400, 19.0, 1.5, 16, 512, 32, None),
    HddPreset::drive("[ATA-4] IBM Deskstar 25GP (DJNA-352500)", "DJNA352500", "IBM-DJNA-352500", 12, 311, 10, 5400, 19.0, 1.7, 16, 1966, 32, None),
    HddPreset::drive("[ATA-4] Maxtor DiamondMax Plus 6800 (91366U4)", "91366U4", "Maxtor 91366U4", 16, 290, 4, 7200, 20.0, 1.0, 16, 256, 32, None),
    HddPreset::drive("[ATA-4] Quantum Fireball SE8.4AT", "SE84A011", "QUANTUM FIREBALL SE8.4A", 12, 200, 8, 5400, 20.0, 2.0, 16, 128, 16, None),
    HddPreset::drive("[ATA-4] Seagate Medalist 2520", "ST32520A", "ST32520A", 15, 230, 4, 5411, 30.0, 2.5, 16, 256, 16, None),
    HddPreset::drive("[ATA-4] Western Digital Caviar 23200", "AC23200", "WDC AC23200L", 8, 210, 4, 5400, 21.0, 3.0, 8, 256, 16, None),
    HddPreset::drive("[ATA-4] Western Digital Expert 100BA", "WD100BA", "WDC WD100BA-60AK", 16, 350, 6, 7200, 15.0, 2.0, 16, 2048, 32, None),
    HddPreset::drive("[ATA-5] IBM Travelstar 25GN", "DARA225000", "IBM-DARA-225000", 12, 392, 10, 5411, 31.0, 4.0, 16, 512, 32, None),
    HddPreset::drive("[ATA-5] Quantum Fireball EX3.2A", "EX32A012", "QUANTUM FIREBALL EX3.2A", 1, 210, 2, 5400, 18.0, 2.0, 8, 512, 16, None),
    HddPreset::drive("[ATA-5] Quantum Fireball CX20.4A", "CX20A012", "QUANTUM FIREBALL CX20.4A", 8, 295, 8, 5400, 16.0, 2.0, 16, 512, 32, None),
    HddPreset::drive("[ATA-5] Samsung SpinPoint V6800 (SV1364D)", "SV1364D", "SAMSUNG SV1364D", 8, 295, 4, 5400, 18.0, 1.3, 16, 512, 32, None),
    HddPreset::drive("[ATA-5] Seagate U10 - 15GB", "ST315323A", "ST315323A", 16, 289, 3, 5400, 25.0, 1.5, 16, 512, 32, None),
];

/// An ordered list of presets. The built-in table is borrowed until a custom preset is added.
#[derive(Clone, Debug)]
pub struct PresetCatalog {
    presets: Cow<'static, [HddPreset]>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: Cow::Borrowed(HDD_SPEED_PRESETS),
        }
    }

    /// Append a preset to the end of the catalog and return its index.
    pub fn push(&mut self, preset: HddPreset) -> usize {
        let presets = self.presets.to_mut();
        presets.push(preset);
        presets.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Out-of-range indices resolve to the default preset (index 0).
    #[inline]
    pub fn clamp_index(&self, index: usize) -> usize {
        if index < self.presets.len() {
            index
        }
        else {
            0
        }
    }

    pub fn get(&self, index: usize) -> &HddPreset {
        &self.presets[self.clamp_index(index)]
    }

    pub fn name(&self, index: usize) -> &str {
        &self.get(index).name
    }

    pub fn internal_name(&self, index: usize) -> &str {
        &self.get(index).internal_name
    }

    pub fn find(&self, internal_name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.internal_name == internal_name)
    }

    /// Look up a preset by internal name, resolving unknown names to the default preset.
    pub fn index_from_internal_name(&self, internal_name: &str) -> usize {
        self.find(internal_name).unwrap_or_else(|| {
            log::warn!("Unknown speed preset '{}', using default", internal_name);
            0
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &HddPreset> {
        self.presets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_preset_is_instant() {
        let catalog = PresetCatalog::builtin();
        assert!(catalog.get(0).is_instant());
        assert_eq!(catalog.internal_name(0), "ramdisk");
        assert_eq!(catalog.get(0).revolution_usec(), 0.0);
    }

    #[test]
    fn builtin_presets_are_valid_and_unique() {
        let catalog = PresetCatalog::builtin();
        let mut names = HashSet::new();
        for (i, preset) in catalog.iter().enumerate() {
            assert_eq!(preset.validate(), Ok(()), "preset {} ({})", i, preset.name);
            assert!(names.insert(preset.internal_name.clone()), "duplicate {}", preset.internal_name);
            if i > 0 {
                assert!(!preset.is_instant());
            }
        }
    }

    #[test]
    fn out_of_range_index_clamps_to_default() {
        let catalog = PresetCatalog::builtin();
        assert_eq!(catalog.clamp_index(catalog.len()), 0);
        assert_eq!(catalog.get(usize::MAX).internal_name, "ramdisk");
        assert_eq!(catalog.clamp_index(3), 3);
    }

    #[test]
    fn lookup_by_internal_name() {
        let catalog = PresetCatalog::builtin();
        let idx = catalog.index_from_internal_name("1998_5400rpm");
        assert_eq!(catalog.get(idx).rpm, 5400);
        assert_eq!(catalog.get(idx).heads, 8);
        assert_eq!(catalog.index_from_internal_name("no_such_drive"), 0);

        let dsaa = catalog.get(catalog.index_from_internal_name("DSAA3270"));
        assert_eq!(dsaa.model.as_deref(), Some("DSAA-3270"));
        assert_eq!(dsaa.firmware.as_deref(), Some("25505120"));
    }

    #[test]
    fn custom_presets_append() {
        let mut catalog = PresetCatalog::builtin();
        let builtin_len = catalog.len();
        let idx = catalog.push(HddPreset::generic("Custom", "custom", 2, 60, 4, 3600, 30.0, 5.0, 2, 32, 8));
        assert_eq!(idx, builtin_len);
        assert_eq!(catalog.find("custom"), Some(idx));
        // The built-in table is untouched.
        assert_eq!(PresetCatalog::builtin().len(), builtin_len);
    }

    #[test]
    fn zero_zone_timed_preset_fails_validation() {
        let preset = HddPreset::generic("Broken", "broken", 0, 60, 4, 3600, 30.0, 5.0, 1, 16, 8);
        assert_eq!(preset.validate(), Err(ZoneError::NoZones));
        let preset = HddPreset::generic("Broken", "broken", 2, 60, 0, 3600, 30.0, 5.0, 1, 16, 8);
        assert_eq!(preset.validate(), Err(ZoneError::NoHeads));
    }

    #[test]
    fn custom_preset_deserializes_with_defaults() {
        let preset: HddPreset = toml::from_str(
            r#"
            name = "My drive"
            internal_name = "mine"
            zones = 4
            avg_spt = 100
            heads = 4
            rpm = 4500
            full_stroke_ms = 25
            track_seek_ms = 3
            "#,
        )
        .unwrap();
        assert_eq!(preset.rcache_num_seg, 1);
        assert_eq!(preset.rcache_seg_size, 16);
        assert_eq!(preset.max_multiple, 8);
        assert_eq!(preset.full_stroke_ms, 25.0);
        assert!(preset.model.is_none());
        assert_eq!(preset.validate(), Ok(()));
    }
}
