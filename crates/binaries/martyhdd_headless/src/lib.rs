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

    martyhdd_headless::lib.rs

    Main library component of the headless hard disk trace replayer.
*/

//! MartyPC hard disk headless front-end.
//!
//! Builds the configured drive set, replays a disk access trace against one drive and prints a
//! latency summary.

#![forbid(unsafe_code)]

pub mod config;
pub mod trace;

use std::time::Instant;

use anyhow::{anyhow, Context};
use colored::*;

use marty_hdd::{
    devices::hdd::{HddError, PresetCatalog},
    SystemTicks,
    TickSource,
};

use crate::{
    config::{ConfigFileParams, DEFAULT_CONFIG_FILE},
    trace::{parse_trace, replay, OpStats, ReplayStats},
};

pub fn run() {
    env_logger::init();

    let config = match config::read_config_file(DEFAULT_CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "Configuration file not found! Please create martyhdd.toml in the current directory \
                               or provide the path to configuration file with --configfile."
                );
                std::process::exit(1);
            }
            Some(e) => {
                eprintln!("Unknown IO error reading configuration file:\n{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!(
                    "Failed to parse configuration file. There may be a typo or otherwise invalid toml:\n{}",
                    e
                );
                std::process::exit(1);
            }
        },
    };

    let result = if config.list_presets {
        config.hdd.catalog().map(|c| list_presets(&c)).map_err(anyhow::Error::from)
    }
    else {
        run_replay(&config)
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn list_presets(catalog: &PresetCatalog) {
    println!(
        "{:>3} {:<24} {:<48} {:>5} {:>5} {:>5}",
        "#", "internal name", "name", "rpm", "zones", "heads"
    );
    for (i, preset) in catalog.iter().enumerate() {
        println!(
            "{:>3} {:<24} {:<48} {:>5} {:>5} {:>5}",
            i,
            preset.internal_name.bright_blue(),
            preset.name,
            preset.rpm,
            preset.zones,
            preset.heads
        );
    }
}

fn run_replay(config: &ConfigFileParams) -> Result<(), anyhow::Error> {
    let mut set = config.hdd.build().context("Failed to configure hard disks")?;
    let handle = config.emulator.drive;

    if let Some(preset) = &config.preset_override {
        set.apply_preset_by_name(handle, preset)?;
    }

    let trace_path = config
        .emulator
        .trace
        .as_ref()
        .ok_or_else(|| anyhow!("No trace file specified. Use --trace or set 'trace' in [emulator]."))?;
    let text = std::fs::read_to_string(trace_path)
        .with_context(|| format!("Failed to read trace file {}", trace_path.display()))?;
    let trace = parse_trace(&text)?;
    log::debug!("Read {} commands from {}", trace.len(), trace_path.display());

    let preset_name = set
        .get(handle)
        .map(|hdd| set.catalog().name(hdd.speed_preset()).to_string())
        .ok_or(HddError::NoDrive(handle))?;
    let hdd = set.get_mut(handle).ok_or(HddError::NoDrive(handle))?;

    println!(
        "Replaying {} commands on drive {} ({}, {}, preset {})",
        trace.len(),
        handle,
        hdd.image_path().display(),
        hdd.geometry(),
        preset_name.bright_blue()
    );

    let mut clock = SystemTicks::new(config.emulator.clock_hz);
    let start = Instant::now();
    let stats = replay(hdd, &mut clock, &trace, config.emulator.verbose)?;
    let host_time = start.elapsed();

    print_summary(&stats, &clock);
    log::debug!("Replay took {:?} of host time", host_time);
    Ok(())
}

fn print_stats_line(name: &str, stats: &OpStats) {
    println!(
        "{:<8} {:>8} {:>14.2} {:>12.2} {:>12.2}",
        name,
        stats.count,
        stats.total_usec,
        stats.mean_usec(),
        stats.max_usec
    );
}

fn print_summary(stats: &ReplayStats, clock: &SystemTicks) {
    println!();
    println!(
        "{:<8} {:>8} {:>14} {:>12} {:>12}",
        "op", "count", "total (us)", "mean (us)", "max (us)"
    );
    print_stats_line("read", &stats.reads);
    print_stats_line("write", &stats.writes);
    print_stats_line("seek", &stats.seeks);

    let total = stats.total();
    println!(
        "{:<8} {:>8} {:>14} {:>12} {:>12}",
        "total".bold(),
        total.count,
        format!("{:.2}", total.total_usec).green(),
        format!("{:.2}", total.mean_usec()).green(),
        format!("{:.2}", total.max_usec).yellow(),
    );
    println!(
        "Idle time: {:.2}us, emulated time: {:.2}us ({} ticks)",
        stats.idle_usec,
        clock.ticks_to_usec(stats.elapsed_ticks),
        stats.elapsed_ticks
    );
}
