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

    devices::hdd::read_cache.rs

    Read cache segments and read-ahead.
*/

//! Segmented read cache with background read-ahead.
//!
//! Each segment caches a window of `segment_size` sectors starting at `lba_addr`. After every
//! read the drive keeps streaming sectors into the segment that served it, for as long as the
//! host leaves it idle. The read-ahead is not simulated in real time; instead it is caught up
//! lazily from the elapsed clock time at the start of the next request.

use crate::{
    clock::TickSource,
    devices::hdd::seek::{HddMechanics, HddOperation},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSegment {
    pub id: usize,
    pub valid: bool,
    pub lba_addr: u32,
    /// The last address requested by the host from this segment.
    pub host_addr: u32,
    /// The next address the drive will read into this segment.
    pub ra_addr: u32,
    pub lru: u32,
}

impl CacheSegment {
    #[inline]
    fn window_end(&self, segment_size: u32) -> u32 {
        self.lba_addr.saturating_add(segment_size)
    }

    /// The sector just past the window still hits; the window slides over it.
    #[inline]
    fn hit(&self, addr: u32, segment_size: u32) -> bool {
        self.valid && self.lba_addr <= addr && addr <= self.window_end(segment_size)
    }

    /// Slide the window forward so that it ends at `end`, if `end` lies past it.
    #[inline]
    fn slide_to(&mut self, end: u32, segment_size: u32) {
        let window_end = self.window_end(segment_size);
        if end > window_end {
            self.lba_addr += end - window_end;
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReadCache {
    segments: Vec<CacheSegment>,
    segment_size: u32,
    ra_ongoing: bool,
    ra_segment: usize,
    ra_start_time: u64,
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(1, 16)
    }
}

impl ReadCache {
    /// Create a cache of `num_segments` segments of `segment_size` sectors. Both are at least 1.
    pub fn new(num_segments: u32, segment_size: u32) -> Self {
        let segments = (0..num_segments.max(1) as usize)
            .map(|id| CacheSegment {
                id,
                ..Default::default()
            })
            .collect();

        Self {
            segments,
            segment_size: segment_size.max(1),
            ra_ongoing: false,
            ra_segment: 0,
            ra_start_time: 0,
        }
    }

    /// Invalidate every segment and cancel any read-ahead.
    pub fn reset(&mut self) {
        for segment in self.segments.iter_mut() {
            *segment = CacheSegment {
                id: segment.id,
                ..Default::default()
            };
        }
        self.stop_readahead();
        self.ra_segment = 0;
        self.ra_start_time = 0;
    }

    pub fn segments(&self) -> &[CacheSegment] {
        &self.segments
    }

    pub fn segment_size(&self) -> u32 {
        self.segment_size
    }

    pub fn readahead_active(&self) -> bool {
        self.ra_ongoing
    }

    pub fn readahead_segment(&self) -> Option<usize> {
        self.ra_ongoing.then_some(self.ra_segment)
    }

    pub fn start_readahead(&mut self, segment: usize, start_time: u64) {
        self.ra_ongoing = true;
        self.ra_segment = segment.min(self.segments.len() - 1);
        self.ra_start_time = start_time;
    }

    pub fn stop_readahead(&mut self) {
        self.ra_ongoing = false;
    }

    /// Advance the read-ahead of the active segment by as many sectors as the drive could have
    /// streamed since the read-ahead started.
    pub fn catch_up(&mut self, mech: &mut HddMechanics, clock: &impl TickSource) {
        if !self.ra_ongoing {
            return;
        }

        let elapsed_us = clock.ticks_to_usec(clock.ticks().saturating_sub(self.ra_start_time));
        let segment_size = self.segment_size;
        let segment = &mut self.segments[self.ra_segment];

        // Don't overwrite data the host has not read yet.
        let max_read_ahead = (segment.host_addr as u64 + segment_size as u64).saturating_sub(segment.ra_addr as u64);

        let mut seek_time = 0.0;
        for _ in 0..max_read_ahead {
            let budget = elapsed_us - seek_time;
            if budget <= 0.0 {
                break;
            }
            let cost = mech.estimate_seek(segment.ra_addr, HddOperation::Read, true, budget);
            if cost > budget {
                break;
            }
            seek_time += cost;
            segment.ra_addr = segment.ra_addr.saturating_add(1);
        }

        let ra_addr = segment.ra_addr;
        segment.slide_to(ra_addr, segment_size);
    }

    /// Charge a host read of `len` sectors at `addr`.
    ///
    /// Returns the index of the segment that now holds the data, and the time spent reading
    /// sectors that were not already cached.
    pub fn read(&mut self, mech: &mut HddMechanics, addr: u32, len: u32) -> (usize, f64) {
        let segment_size = self.segment_size;
        let end = addr.saturating_add(len);
        let mut seek_time = 0.0;

        let mut hit = None;
        let mut invalid = None;
        let mut oldest: Option<usize> = None;

        for (i, segment) in self.segments.iter().enumerate() {
            if !segment.valid {
                invalid.get_or_insert(i);
            }
            else if segment.hit(addr, segment_size) {
                hit = Some(i);
                break;
            }
            else if oldest.map_or(true, |o| segment.lru > self.segments[o].lru) {
                oldest = Some(i);
            }
        }

        let active = match hit {
            Some(i) => {
                let segment = &mut self.segments[i];
                segment.host_addr = addr;
                while segment.ra_addr < end {
                    seek_time += mech.estimate_seek(segment.ra_addr, HddOperation::Read, true, 0.0);
                    segment.ra_addr += 1;
                }
                segment.slide_to(end, segment_size);
                i
            }
            None => {
                let i = invalid.or(oldest).unwrap_or(0);
                log::trace!("read(): cache miss at {}, evicting segment {}", addr, i);
                let segment = &mut self.segments[i];
                segment.valid = true;
                segment.lba_addr = addr;
                segment.host_addr = addr;
                segment.ra_addr = addr;
                for n in 0..len {
                    seek_time += mech.estimate_seek(segment.ra_addr, HddOperation::Read, n != 0, 0.0);
                    segment.ra_addr = segment.ra_addr.saturating_add(1);
                }
                i
            }
        };

        for segment in self.segments.iter_mut() {
            segment.lru = segment.lru.saturating_add(1);
        }
        self.segments[active].lru = 0;

        (active, seek_time)
    }
}
