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

    devices::hdd::hdd_error.rs

    Error types for hard disk configuration.
*/

use crate::devices::hdd::zones::ZoneError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HddError {
    #[error("Drive handle {0} is out of range (maximum {1} drives)")]
    InvalidHandle(usize, usize),
    #[error("No drive is attached at handle {0}")]
    NoDrive(usize),
    #[error("Unknown speed preset '{0}'")]
    UnknownPreset(String),
    #[error("Invalid custom preset '{0}': {1}")]
    InvalidPreset(String, ZoneError),
    #[error("Custom preset '{0}' reuses the name of an existing preset")]
    DuplicatePreset(String),
    #[error("Drive {0} has an invalid configuration: {1}")]
    InvalidDrive(usize, String),
}
