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
*/

//! Define a [DiskChs] that represents cylinder, head, sector addressing.

use crate::device_types::geometry::DriveGeometry;
use std::{fmt::Display, str::FromStr};

/// A structure representing a cylinder, head, sector address
///  - Cylinder (c)
///  - Head (h)
///  - Sector ID (s), starting at 1
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct DiskChs {
    pub(crate) c: u16,
    pub(crate) h: u8,
    pub(crate) s: u8,
}

impl Default for DiskChs {
    fn default() -> Self {
        Self { c: 0, h: 0, s: 1 }
    }
}

impl From<(u16, u8, u8)> for DiskChs {
    fn from((c, h, s): (u16, u8, u8)) -> Self {
        Self { c, h, s }
    }
}

impl From<DiskChs> for (u16, u8, u8) {
    fn from(chs: DiskChs) -> Self {
        (chs.c, chs.h, chs.s)
    }
}

impl Display for DiskChs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:4} h:{:2} s:{:3}]", self.c, self.h, self.s)
    }
}

/// Parse a `c/h/s` triple such as `12/3/17`.
impl FromStr for DiskChs {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        let mut parts = s.split('/');
        let (Some(c), Some(h), Some(sid), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("Bad CHS address '{}': expected c/h/s", s));
        };
        let c = c.trim().parse::<u16>().map_err(|e| format!("Bad cylinder '{}': {}", c, e))?;
        let h = h.trim().parse::<u8>().map_err(|e| format!("Bad head '{}': {}", h, e))?;
        let sid = sid.trim().parse::<u8>().map_err(|e| format!("Bad sector '{}': {}", sid, e))?;
        Ok(DiskChs::new(c, h, sid))
    }
}

impl DiskChs {
    /// Create a new `DiskChs` structure from cylinder, head and sector id components.
    pub fn new(c: u16, h: u8, s: u8) -> Self {
        Self { c, h, s }
    }
    /// Return the cylinder, head and sector id components in a tuple.
    #[inline]
    pub fn get(&self) -> (u16, u8, u8) {
        (self.c, self.h, self.s)
    }
    #[inline]
    pub fn c(&self) -> u16 {
        self.c
    }
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
    #[inline]
    pub fn s(&self) -> u8 {
        self.s
    }

    /// Convert a [DiskChs] to an LBA sector address in the specified geometry.
    /// Returns `None` if the address lies outside the geometry.
    pub fn to_lba(&self, geom: &DriveGeometry) -> Option<u32> {
        if !geom.contains(*self) {
            return None;
        }
        let hpc = geom.h() as u32;
        let spt = geom.s() as u32;
        Some((self.c as u32 * hpc + self.h as u32) * spt + (self.s as u32 - 1))
    }

    /// Convert an LBA sector address into a [DiskChs] in the specified geometry.
    /// Returns `None` if the LBA address is past the end of the geometry.
    pub fn from_lba(lba: u32, geom: &DriveGeometry) -> Option<DiskChs> {
        if geom.is_degenerate() {
            return None;
        }
        let hpc = geom.h() as u32;
        let spt = geom.s() as u32;
        let c = lba / (hpc * spt);
        let h = (lba / spt) % hpc;
        let s = (lba % spt) + 1;

        if c >= geom.c() as u32 {
            return None;
        }
        Some(DiskChs::from((c as u16, h as u8, s as u8)))
    }

    /// Return the next sector on the disk according to the specified geometry, or `None` if this
    /// is the last sector.
    pub fn next_sector(&self, geom: &DriveGeometry) -> Option<DiskChs> {
        if self.s < geom.s() {
            Some(DiskChs::from((self.c, self.h, self.s + 1)))
        }
        else if self.h < geom.h().saturating_sub(1) {
            // Last sector of the track, switch heads.
            Some(DiskChs::from((self.c, self.h + 1, 1)))
        }
        else if self.c < geom.c().saturating_sub(1) {
            Some(DiskChs::from((self.c + 1, 0, 1)))
        }
        else {
            None
        }
    }
}

/// Iterates through every sector of a [DriveGeometry] in LBA order.
pub struct DiskChsIterator {
    geom: DriveGeometry,
    chs:  Option<DiskChs>,
}

impl DiskChsIterator {
    pub fn new(geom: DriveGeometry) -> Self {
        Self { geom, chs: None }
    }
}

impl Iterator for DiskChsIterator {
    type Item = DiskChs;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(chs) = &mut self.chs {
            *chs = chs.next_sector(&self.geom)?;
        }
        else {
            if self.geom.is_degenerate() {
                return None;
            }
            self.chs = Some(DiskChs::default());
        }
        self.chs
    }
}
