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

    martyhdd_headless::config.rs

    Reads configuration from a TOML file and the command line.
*/

use std::path::{Path, PathBuf};

use marty_hdd::{clock::DEFAULT_CLOCK_HZ, hdd_config::HddSubsystemConfig};

use bpaf::Bpaf;
use serde_derive::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "./martyhdd.toml";

fn _default_clock_hz() -> f64 {
    DEFAULT_CLOCK_HZ
}

#[derive(Debug, Default, Bpaf)]
#[bpaf(options, version, generate(cli_args))]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    /// Trace file to replay
    #[bpaf(long)]
    pub trace: Option<PathBuf>,

    /// Drive handle the trace is replayed against
    #[bpaf(long)]
    pub drive: Option<usize>,

    /// Frequency of the tick counter, in Hz
    #[bpaf(long)]
    pub clock_hz: Option<f64>,

    /// Override the speed preset of the replay drive by internal name
    #[bpaf(long)]
    pub preset: Option<String>,

    #[bpaf(long, switch)]
    pub list_presets: bool,

    /// Print the cost of every traced operation
    #[bpaf(long, switch)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    #[serde(default = "_default_clock_hz")]
    pub clock_hz: f64,
    #[serde(default)]
    pub trace: Option<PathBuf>,
    #[serde(default)]
    pub drive: usize,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            trace: None,
            drive: 0,
            verbose: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFileParams {
    #[serde(default)]
    pub emulator: Emulator,
    #[serde(default)]
    pub hdd: HddSubsystemConfig,
    #[serde(skip)]
    pub preset_override: Option<String>,
    #[serde(skip)]
    pub list_presets: bool,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(trace) = shell_args.trace {
            self.emulator.trace = Some(trace);
        }
        if let Some(drive) = shell_args.drive {
            self.emulator.drive = drive;
        }
        if let Some(clock_hz) = shell_args.clock_hz {
            self.emulator.clock_hz = clock_hz;
        }

        self.emulator.verbose |= shell_args.verbose;
        self.preset_override = shell_args.preset;
        self.list_presets = shell_args.list_presets;
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    Ok(toml_args)
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    log::debug!("Reading command line arguments...");
    let shell_args = cli_args().run();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        match std::fs::read_to_string(default_path) {
            Ok(s) => s,
            // Listing presets doesn't need any configuration.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && shell_args.list_presets => String::new(),
            Err(e) => return Err(e.into()),
        }
    };

    read_config(toml_string, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = read_config("", CmdLineArgs::default()).unwrap();
        assert_eq!(config.emulator.clock_hz, DEFAULT_CLOCK_HZ);
        assert_eq!(config.emulator.drive, 0);
        assert!(config.emulator.trace.is_none());
        assert!(config.hdd.drive.is_empty());
    }

    #[test]
    fn command_line_overrides_config() {
        let toml = r#"
            [emulator]
            clock_hz = 8000000.0
            trace = "boot.trace"
            drive = 1

            [[hdd.drive]]
            drive = 1
            bus = "ide"
            image = "c.img"
            cylinders = 615
            heads = 4
            sectors = 17
            preset = "1992_3600rpm"
        "#;

        let args = CmdLineArgs {
            trace: Some(PathBuf::from("other.trace")),
            preset: Some("1989_3500rpm".to_string()),
            verbose: true,
            ..Default::default()
        };

        let config = read_config(toml, args).unwrap();
        assert_eq!(config.emulator.clock_hz, 8_000_000.0);
        assert_eq!(config.emulator.drive, 1);
        assert_eq!(config.emulator.trace, Some(PathBuf::from("other.trace")));
        assert_eq!(config.preset_override.as_deref(), Some("1989_3500rpm"));
        assert!(config.emulator.verbose);
        assert_eq!(config.hdd.drive.len(), 1);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(read_config("[emulator\nclock_hz = ", CmdLineArgs::default()).is_err());
    }
}
