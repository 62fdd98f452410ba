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

    devices::hdd::mod.rs

    Hard disk timing and cache simulation.
*/

//! Hard disk timing model.
//!
//! The model is layered leaf first: a [preset](preset::HddPreset) is resolved from the catalog,
//! [zones](zones::HddZone) are derived from it and the drive's declared geometry, the
//! [mechanics](seek::HddMechanics) estimate the cost of moving the head, and the
//! [read cache](read_cache::ReadCache) and [write cache](write_cache::WriteCache) decide which
//! sectors have to be charged at all. [HardDisk] ties them together for one drive unit.

pub mod bus;
pub mod hard_disk;
pub mod hdd_error;
pub mod preset;
pub mod read_cache;
pub mod seek;
pub mod write_cache;
pub mod zones;

pub use bus::HddBusType;
pub use hard_disk::HardDisk;
pub use hdd_error::HddError;
pub use preset::{HddPreset, PresetCatalog};
pub use seek::{HddMechanics, HddOperation, ZoneFaultPolicy};

/// Fixed command overhead charged when no speed model applies.
pub const HDD_OVERHEAD_TIME: f64 = 50.0;
/// Latency substituted for every access when a timed preset resolved to no zones.
pub const HDD_ZONE_FAULT_TIME: f64 = 1000.0;
/// Size of the write cache, in sectors. The same for every preset.
pub const HDD_WRITE_CACHE_SIZE: u32 = 64;
