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

//! Define a [DriveGeometry] that represents the logical cylinder, head, and sector
//! geometry a hard disk declares to its controller.
//! This is the geometry the guest sees, not the physical layout the timing model
//! derives from a speed preset.

use crate::device_types::chs::{DiskChs, DiskChsIterator};
use std::fmt::Display;

/// A structure representing a logical hard disk geometry
///  - Cylinder count (c)
///  - Head count (h)
///  - Sectors per track (s)
///
/// Sector ids always start at 1.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct DriveGeometry {
    pub(crate) c: u16,
    pub(crate) h: u8,
    pub(crate) s: u8,
}

impl Display for DriveGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:4} h:{:2} s:{:2}]", self.c, self.h, self.s)
    }
}

impl From<(u16, u8, u8)> for DriveGeometry {
    fn from((c, h, s): (u16, u8, u8)) -> Self {
        Self { c, h, s }
    }
}

impl DriveGeometry {
    /// Create a new [DriveGeometry] structure from cylinder, head and sector count components.
    pub fn new(c: u16, h: u8, s: u8) -> Self {
        Self { c, h, s }
    }
    pub fn get(&self) -> (u16, u8, u8) {
        (self.c, self.h, self.s)
    }
    /// Return the cylinder count (c) field.
    #[inline]
    pub fn c(&self) -> u16 {
        self.c
    }
    /// Return the head count (h) field.
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
    /// Return the sectors per track (s) field.
    #[inline]
    pub fn s(&self) -> u8 {
        self.s
    }
    /// Return the number of sectors represented by a [DriveGeometry].
    pub fn total_sectors(&self) -> u32 {
        (self.c as u32) * (self.h as u32) * (self.s as u32)
    }
    /// A geometry with any zero component cannot address a single sector.
    pub fn is_degenerate(&self) -> bool {
        self.c == 0 || self.h == 0 || self.s == 0
    }
    /// Return a boolean indicating whether this [DriveGeometry] contains the specified [DiskChs]
    /// representing a sector id.
    pub fn contains(&self, chs: impl Into<DiskChs>) -> bool {
        let chs = chs.into();
        self.c > chs.c && self.h > chs.h && chs.s >= 1 && self.s >= chs.s
    }

    pub fn chs_iter(&self) -> DiskChsIterator {
        DiskChsIterator::new(*self)
    }
}
