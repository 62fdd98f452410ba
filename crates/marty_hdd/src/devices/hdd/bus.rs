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

    devices::hdd::bus.rs

    Hard disk bus types.
*/

use serde_derive::Deserialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The bus a hard disk is attached to. A disabled drive is never timed.
#[derive(
    Copy, Clone, Debug, Default, Deserialize, Display, EnumIter, EnumString, IntoStaticStr, Hash, Eq, PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HddBusType {
    #[default]
    #[serde(rename = "none")]
    #[strum(to_string = "none")]
    Disabled,
    Mfm,
    Xta,
    Esdi,
    Ide,
    Atapi,
    Scsi,
}

impl HddBusType {
    /// Parse a bus name from a configuration string. Unrecognized names disable the drive.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.parse::<HddBusType>() {
            Ok(bus) => bus,
            Err(_) => {
                log::warn!("Unknown hard disk bus type '{}', drive disabled", s);
                HddBusType::Disabled
            }
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, HddBusType::Disabled)
    }
}
