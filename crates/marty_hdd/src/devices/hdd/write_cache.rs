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

    devices::hdd::write_cache.rs

    Write-back cache with background flush.
*/

//! Write-back cache.
//!
//! Host writes are accepted into a single contiguous run of up to [HDD_WRITE_CACHE_SIZE] sectors
//! and cost nothing until the run has to be committed to the platter, either because a
//! non-contiguous request arrives, a read needs the heads, or the run would overflow the cache.
//! While the host is busy elsewhere the drive drains the run in the background; like read-ahead,
//! this is caught up lazily from the elapsed clock time.

use crate::{
    clock::TickSource,
    devices::hdd::{
        seek::{HddMechanics, HddOperation},
        HDD_WRITE_CACHE_SIZE,
    },
};

#[derive(Clone, Debug)]
pub struct WriteCache {
    write_addr: u32,
    write_pending: u32,
    write_size: u32,
    write_start_time: u64,
}

impl Default for WriteCache {
    fn default() -> Self {
        Self::new(HDD_WRITE_CACHE_SIZE)
    }
}

impl WriteCache {
    pub fn new(write_size: u32) -> Self {
        Self {
            write_addr: 0,
            write_pending: 0,
            write_size: write_size.max(1),
            write_start_time: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.write_size);
    }

    /// Address of the first sector not yet committed.
    pub fn write_addr(&self) -> u32 {
        self.write_addr
    }

    pub fn pending(&self) -> u32 {
        self.write_pending
    }

    pub fn capacity(&self) -> u32 {
        self.write_size
    }

    /// Commit one sector of the pending run. Returns its cost.
    #[inline]
    fn commit_sector(&mut self, mech: &mut HddMechanics) -> f64 {
        let cost = mech.estimate_seek(self.write_addr, HddOperation::Write, true, 0.0);
        self.write_addr = self.write_addr.saturating_add(1);
        self.write_pending -= 1;
        cost
    }

    /// Commit the whole pending run. Returns the time spent.
    pub fn flush(&mut self, mech: &mut HddMechanics) -> f64 {
        let mut seek_time = 0.0;
        while self.write_pending > 0 {
            seek_time += self.commit_sector(mech);
        }
        seek_time
    }

    /// Commit as much of the pending run as the drive could have written since the last write.
    pub fn catch_up(&mut self, mech: &mut HddMechanics, clock: &impl TickSource) {
        if self.write_pending == 0 {
            return;
        }

        let elapsed_us = clock.ticks_to_usec(clock.ticks().saturating_sub(self.write_start_time));
        let mut seek_time = 0.0;

        while self.write_pending > 0 {
            let budget = elapsed_us - seek_time;
            if budget <= 0.0 {
                break;
            }
            let cost = mech.estimate_seek(self.write_addr, HddOperation::Write, true, budget);
            if cost > budget {
                break;
            }
            seek_time += cost;
            self.write_addr = self.write_addr.saturating_add(1);
            self.write_pending -= 1;
        }
    }

    /// Accept a host write of `len` sectors at `addr`, returning the time spent committing
    /// earlier data to make room for it.
    pub fn write(&mut self, mech: &mut HddMechanics, clock: &impl TickSource, addr: u32, len: u32) -> f64 {
        let mut seek_time = 0.0;

        if self.write_pending > 0 && addr != self.write_addr.saturating_add(self.write_pending) {
            log::trace!(
                "write(): non-contiguous write at {}, flushing {} sectors at {}",
                addr,
                self.write_pending,
                self.write_addr
            );
            seek_time += self.flush(mech);
        }

        if self.write_pending == 0 {
            self.write_addr = addr;
        }

        // Past capacity the head of the run is written out, but the pending count stays put.
        self.write_pending = self.write_pending.saturating_add(len);
        if self.write_pending > self.write_size {
            let flush_needed = self.write_pending - self.write_size;
            for _ in 0..flush_needed {
                seek_time += mech.estimate_seek(self.write_addr, HddOperation::Write, true, 0.0);
                self.write_addr = self.write_addr.saturating_add(1);
            }
        }

        self.write_start_time = clock.ticks() + clock.usec_to_ticks(seek_time);
        seek_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::SystemTicks,
        device_types::geometry::DriveGeometry,
        devices::hdd::{preset::PresetCatalog, seek::ZoneFaultPolicy},
    };

    fn mechanics() -> HddMechanics {
        let catalog = PresetCatalog::builtin();
        let preset = catalog.get(catalog.index_from_internal_name("1989_3500rpm"));
        HddMechanics::from_preset(
            preset,
            DriveGeometry::new(615, 4, 17).total_sectors(),
            ZoneFaultPolicy::Fallback,
        )
    }

    #[test]
    fn contiguous_writes_coalesce() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let clock = SystemTicks::new(1_000_000.0);

        assert_eq!(cache.write(&mut mech, &clock, 0, 8), 0.0);
        assert_eq!(cache.write(&mut mech, &clock, 8, 8), 0.0);
        assert_eq!(cache.pending(), 16);
        assert_eq!(cache.write_addr(), 0);

        let cost = cache.write(&mut mech, &clock, 100, 1);
        assert!(cost > 0.0);
        assert_eq!(cache.pending(), 1);
        assert_eq!(cache.write_addr(), 100);
        assert_eq!(mech.position().addr, 15);
    }

    #[test]
    fn overflow_flushes_excess() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let clock = SystemTicks::new(1_000_000.0);

        let cost = cache.write(&mut mech, &clock, 0, 70);
        assert!(cost > 0.0);
        assert_eq!(cache.pending(), 70);
        assert_eq!(cache.write_addr(), 6);
        assert_eq!(mech.position().addr, 5);

        // Contiguity is judged against write_addr + pending.
        cache.write(&mut mech, &clock, 76, 2);
        assert_eq!(cache.pending(), 72);
        assert_eq!(cache.write_addr(), 14);
    }

    #[test]
    fn write_near_end_of_address_space() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let clock = SystemTicks::new(1_000_000.0);

        cache.write(&mut mech, &clock, u32::MAX - 1, 4);
        assert_eq!(cache.pending(), 4);
        let cost = cache.flush(&mut mech);
        assert!(cost > 0.0);
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.write_addr(), u32::MAX);
    }

    #[test]
    fn flush_empties_run() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let clock = SystemTicks::new(1_000_000.0);

        cache.write(&mut mech, &clock, 40, 4);
        let cost = cache.flush(&mut mech);
        assert!(cost > 0.0);
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.write_addr(), 44);
        assert_eq!(cache.flush(&mut mech), 0.0);
    }

    #[test]
    fn catch_up_drains_in_background() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let mut clock = SystemTicks::new(1_000_000.0);

        cache.write(&mut mech, &clock, 1, 10);
        clock.advance_usec(10_000_000.0);
        cache.catch_up(&mut mech, &clock);
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.write_addr(), 11);
        assert_eq!(mech.position().addr, 10);
    }

    #[test]
    fn catch_up_without_elapsed_time_keeps_run() {
        let mut mech = mechanics();
        let mut cache = WriteCache::default();
        let clock = SystemTicks::new(1_000_000.0);

        cache.write(&mut mech, &clock, 1, 10);
        cache.catch_up(&mut mech, &clock);
        assert_eq!(cache.pending(), 10);
        assert_eq!(mech.position().addr, 0);
    }
}
