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

    devices::hdd::hard_disk.rs

    Implements a hard disk unit and its access timing.
*/

use std::path::{Path, PathBuf};

use crate::{
    clock::TickSource,
    device_types::geometry::DriveGeometry,
    devices::hdd::{
        bus::HddBusType,
        preset::PresetCatalog,
        read_cache::ReadCache,
        seek::{HddMechanics, HddOperation, ZoneFaultPolicy},
        write_cache::WriteCache,
        HDD_OVERHEAD_TIME,
    },
};

/// One attached hard disk unit.
///
/// The drive does not own or transfer sector data. A controller calls [HardDisk::timing_read]
/// and [HardDisk::timing_write] for each host command and delays completion by the returned
/// number of microseconds.
#[derive(Clone, Debug)]
pub struct HardDisk {
    bus_type: HddBusType,
    image_path: PathBuf,
    geometry: DriveGeometry,
    speed_preset: usize,
    model: Option<String>,
    firmware_revision: Option<String>,
    max_multiple_block: u32,
    mech: HddMechanics,
    read_cache: ReadCache,
    write_cache: WriteCache,
}

impl HardDisk {
    /// Create a drive with the default (instant) speed preset.
    pub fn new(bus_type: HddBusType, image_path: impl Into<PathBuf>, geometry: DriveGeometry) -> Self {
        let mut hdd = Self {
            bus_type,
            image_path: image_path.into(),
            geometry,
            speed_preset: 0,
            model: None,
            firmware_revision: None,
            max_multiple_block: 0,
            mech: HddMechanics::default(),
            read_cache: ReadCache::default(),
            write_cache: WriteCache::default(),
        };
        hdd.apply_preset(&PresetCatalog::builtin(), 0);
        hdd
    }

    /// Override the zone fault policy of this drive. Survives preset changes.
    pub fn with_fault_policy(mut self, policy: ZoneFaultPolicy) -> Self {
        self.set_fault_policy(policy);
        self
    }

    pub fn set_fault_policy(&mut self, policy: ZoneFaultPolicy) {
        self.mech.set_fault_policy(policy);
    }

    /// A drive is usable if it is on a bus, has a backing image and a nonzero geometry.
    pub fn is_valid(&self) -> bool {
        self.bus_type.is_enabled() && !self.image_path.as_os_str().is_empty() && !self.geometry.is_degenerate()
    }

    pub fn bus_type(&self) -> HddBusType {
        self.bus_type
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn geometry(&self) -> DriveGeometry {
        self.geometry
    }

    pub fn speed_preset(&self) -> usize {
        self.speed_preset
    }

    /// The model string to report on identify, if the preset overrides it.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn firmware_revision(&self) -> Option<&str> {
        self.firmware_revision.as_deref()
    }

    pub fn max_multiple_block(&self) -> u32 {
        self.max_multiple_block
    }

    pub fn mechanics(&self) -> &HddMechanics {
        &self.mech
    }

    pub fn read_cache(&self) -> &ReadCache {
        &self.read_cache
    }

    pub fn write_cache(&self) -> &WriteCache {
        &self.write_cache
    }

    /// Apply speed preset `preset` from `catalog`, rebuilding the physical model and resetting both
    /// caches and the head position. An out of range preset selects the default preset.
    pub fn apply_preset(&mut self, catalog: &PresetCatalog, preset: usize) {
        let id = catalog.clamp_index(preset);
        if id != preset {
            log::warn!("Speed preset {} out of range, using default preset", preset);
        }
        let p = catalog.get(id);

        self.speed_preset = id;
        self.max_multiple_block = p.max_multiple;
        self.model = p.model.as_ref().map(|m| m.to_string());
        self.firmware_revision = p.firmware.as_ref().map(|f| f.to_string());

        if !p.is_instant() && self.geometry.is_degenerate() {
            log::warn!("Drive geometry {} is empty, no zones will be built", self.geometry);
        }

        let policy = self.mech.fault_policy();
        self.mech = HddMechanics::from_preset(p, self.geometry.total_sectors(), policy);
        self.read_cache = ReadCache::new(p.rcache_num_seg, p.rcache_seg_size);
        self.write_cache = WriteCache::default();

        log::debug!(
            "Applied speed preset {} '{}': {} zone(s), {} physical cylinders, {}x{} read cache",
            id,
            p.name,
            self.mech.zones().len(),
            self.mech.phy_cylinders(),
            p.rcache_num_seg,
            p.rcache_seg_size
        );
    }

    /// See [HddMechanics::estimate_seek].
    #[inline]
    pub fn estimate_seek(&mut self, dst: u32, op: HddOperation, continuous: bool, max_seek_time: f64) -> f64 {
        self.mech.estimate_seek(dst, op, continuous, max_seek_time)
    }

    // Bring background activity up to date with the clock.
    fn catch_up(&mut self, clock: &impl TickSource) {
        self.read_cache.catch_up(&mut self.mech, clock);
        self.write_cache.catch_up(&mut self.mech, clock);
    }

    /// Return the time in microseconds the drive needs to read `len` sectors at `addr`.
    pub fn timing_read(&mut self, clock: &impl TickSource, addr: u32, len: u32) -> f64 {
        if !self.mech.is_timed() {
            return HDD_OVERHEAD_TIME;
        }

        self.catch_up(clock);

        let mut seek_time = self.write_cache.flush(&mut self.mech);
        let (segment, read_time) = self.read_cache.read(&mut self.mech, addr, len);
        seek_time += read_time;

        self.read_cache
            .start_readahead(segment, clock.ticks() + clock.usec_to_ticks(seek_time));

        seek_time
    }

    /// Return the time in microseconds the drive needs to accept a write of `len` sectors at `addr`.
    pub fn timing_write(&mut self, clock: &impl TickSource, addr: u32, len: u32) -> f64 {
        if !self.mech.is_timed() {
            return HDD_OVERHEAD_TIME;
        }

        self.catch_up(clock);
        self.read_cache.stop_readahead();

        self.write_cache.write(&mut self.mech, clock, addr, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::SystemTicks,
        devices::hdd::{preset::HddPreset, HDD_ZONE_FAULT_TIME},
    };

    const ST_1989: f64 = 60_000_000.0 / 3500.0 / 35.0;

    fn drive_with(catalog: &PresetCatalog, internal_name: &str) -> HardDisk {
        let mut hdd = HardDisk::new(HddBusType::Ide, "test.img", DriveGeometry::new(615, 4, 17))
            .with_fault_policy(ZoneFaultPolicy::Fallback);
        let id = catalog.find(internal_name).unwrap();
        hdd.apply_preset(catalog, id);
        hdd
    }

    fn drive_1989() -> HardDisk {
        drive_with(&PresetCatalog::builtin(), "1989_3500rpm")
    }

    #[test]
    fn validity() {
        assert!(drive_1989().is_valid());
        assert!(!HardDisk::new(HddBusType::Disabled, "a.img", DriveGeometry::new(615, 4, 17)).is_valid());
        assert!(!HardDisk::new(HddBusType::Ide, "", DriveGeometry::new(615, 4, 17)).is_valid());
        assert!(!HardDisk::new(HddBusType::Ide, "a.img", DriveGeometry::new(615, 0, 17)).is_valid());
    }

    #[test]
    fn instant_preset_charges_overhead() {
        let mut hdd = HardDisk::new(HddBusType::Ide, "test.img", DriveGeometry::new(615, 4, 17));
        let clock = SystemTicks::default();
        assert_eq!(hdd.speed_preset(), 0);
        assert_eq!(hdd.max_multiple_block(), 32);
        assert_eq!(hdd.read_cache().segments().len(), 16);
        assert_eq!(hdd.timing_read(&clock, 1000, 8), HDD_OVERHEAD_TIME);
        assert_eq!(hdd.timing_write(&clock, 1000, 8), HDD_OVERHEAD_TIME);
        assert_eq!(hdd.write_cache().pending(), 0);
    }

    #[test]
    fn out_of_range_preset_uses_default() {
        let mut hdd = drive_1989();
        hdd.apply_preset(&PresetCatalog::builtin(), 10_000);
        assert_eq!(hdd.speed_preset(), 0);
        assert!(!hdd.mechanics().is_timed());
    }

    #[test]
    fn preset_identity_overrides() {
        let catalog = PresetCatalog::builtin();
        let hdd = drive_with(&catalog, "DSAA3270");
        assert_eq!(hdd.model(), Some("DSAA-3270"));
        assert_eq!(hdd.firmware_revision(), Some("25505120"));
        assert_eq!(hdd.max_multiple_block(), 8);

        let hdd = drive_1989();
        assert_eq!(hdd.model(), None);
        assert_eq!(hdd.firmware_revision(), None);
    }

    #[test]
    fn sequential_streaming_cost() {
        let mut hdd = drive_1989();
        let mut clock = SystemTicks::new(1_000_000.0);

        let first = hdd.timing_read(&clock, 0, 1);
        assert!((first - hdd.mechanics().avg_rotation_lat_usec()).abs() < 1e-9);
        clock.advance_usec(first);

        // Runs across the 16 sector cache window up to the end of the first track.
        for addr in 1..35 {
            let cost = hdd.timing_read(&clock, addr, 1);
            assert!((cost - ST_1989).abs() < 1e-9, "sector {} cost {}", addr, cost);
            clock.advance_usec(cost);
        }
    }

    #[test]
    fn sequential_streaming_with_idle_time_uses_read_ahead() {
        let mut hdd = drive_1989();
        let mut clock = SystemTicks::new(1_000_000.0);

        let first = hdd.timing_read(&clock, 0, 1);
        clock.advance_usec(first);

        for addr in 1..30 {
            // Leave the drive idle long enough to read ahead two sectors.
            clock.advance_usec(ST_1989 * 2.5);
            let cost = hdd.timing_read(&clock, addr, 1);
            assert!(cost <= ST_1989 + 1e-9, "sector {} cost {}", addr, cost);
            clock.advance_usec(cost);
        }
        assert!(hdd.read_cache().segments()[0].ra_addr > 30);
    }

    #[test]
    fn repeated_read_is_free() {
        let mut hdd = drive_1989();
        let clock = SystemTicks::new(1_000_000.0);

        let first = hdd.timing_read(&clock, 500, 4);
        assert!(first > 0.0);
        assert_eq!(hdd.timing_read(&clock, 500, 4), 0.0);
        assert_eq!(hdd.timing_read(&clock, 500, 4), 0.0);
    }

    #[test]
    fn lru_eviction_with_two_segments() {
        let mut catalog = PresetCatalog::builtin();
        catalog.push(HddPreset::generic("Two segments", "twoseg", 1, 35, 2, 3500, 40.0, 8.0, 2, 16, 8));
        let mut hdd = drive_with(&catalog, "twoseg");
        let clock = SystemTicks::new(1_000_000.0);

        hdd.timing_read(&clock, 0, 1);
        hdd.timing_read(&clock, 1000, 1);
        hdd.timing_read(&clock, 2000, 1);

        let segments = hdd.read_cache().segments();
        assert_eq!(segments[0].lba_addr, 2000);
        assert_eq!(segments[1].lba_addr, 1000);

        // The second read is still cached; the first is gone.
        assert_eq!(hdd.timing_read(&clock, 1000, 1), 0.0);
        assert!(hdd.timing_read(&clock, 0, 1) > 0.0);
    }

    #[test]
    fn contiguous_writes_do_not_flush() {
        let mut hdd = drive_1989();
        let clock = SystemTicks::new(1_000_000.0);

        assert_eq!(hdd.timing_write(&clock, 200, 1), 0.0);
        assert_eq!(hdd.timing_write(&clock, 201, 1), 0.0);
        assert_eq!(hdd.write_cache().pending(), 2);
    }

    #[test]
    fn gapped_write_flushes_pending_run() {
        let mut hdd = drive_1989();
        let clock = SystemTicks::new(1_000_000.0);

        assert_eq!(hdd.timing_write(&clock, 200, 1), 0.0);
        assert!(hdd.timing_write(&clock, 205, 1) > 0.0);
        assert_eq!(hdd.write_cache().pending(), 1);
        assert_eq!(hdd.write_cache().write_addr(), 205);
        assert_eq!(hdd.mechanics().position().addr, 200);
    }

    #[test]
    fn read_flushes_writes_and_write_stops_read_ahead() {
        let mut hdd = drive_1989();
        let clock = SystemTicks::new(1_000_000.0);

        hdd.timing_write(&clock, 10, 4);
        hdd.timing_read(&clock, 10, 1);
        assert_eq!(hdd.write_cache().pending(), 0);
        assert!(hdd.read_cache().readahead_active());

        hdd.timing_write(&clock, 50, 1);
        assert!(!hdd.read_cache().readahead_active());
    }

    #[test]
    fn preset_application_resets_state() {
        let mut hdd = drive_1989();
        let clock = SystemTicks::new(1_000_000.0);
        hdd.timing_read(&clock, 5000, 8);
        hdd.timing_write(&clock, 9000, 8);

        let catalog = PresetCatalog::builtin();
        hdd.apply_preset(&catalog, catalog.index_from_internal_name("1992_3600rpm"));
        assert_eq!(hdd.mechanics().position().addr, 0);
        assert_eq!(hdd.write_cache().pending(), 0);
        assert_eq!(hdd.read_cache().segments().len(), 4);
        assert!(hdd.read_cache().segments().iter().all(|s| !s.valid));
        assert!(!hdd.read_cache().readahead_active());
    }

    #[test]
    fn zero_zone_preset_falls_back() {
        let mut catalog = PresetCatalog::builtin();
        catalog.push(HddPreset::generic("Zoneless", "zoneless", 0, 35, 2, 3500, 40.0, 8.0, 1, 16, 8));
        let mut hdd = drive_with(&catalog, "zoneless");
        let clock = SystemTicks::new(1_000_000.0);

        assert_eq!(hdd.timing_read(&clock, 0, 1), HDD_ZONE_FAULT_TIME);
        assert_eq!(hdd.timing_read(&clock, 100, 3), 3.0 * HDD_ZONE_FAULT_TIME);
    }

    #[test]
    #[should_panic]
    fn zero_zone_preset_is_fatal_in_strict_mode() {
        let mut catalog = PresetCatalog::builtin();
        catalog.push(HddPreset::generic("Zoneless", "zoneless", 0, 35, 2, 3500, 40.0, 8.0, 1, 16, 8));
        let mut hdd = drive_with(&catalog, "zoneless");
        hdd.set_fault_policy(ZoneFaultPolicy::Fatal);
        hdd.timing_read(&SystemTicks::default(), 0, 1);
    }
}
