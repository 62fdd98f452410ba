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

    martyhdd_headless::trace.rs

    Parses and replays disk access traces.
*/

//! Disk access traces.
//!
//! A trace is a text file with one command per line:
//!
//! ```text
//! # comment
//! r <addr> <len>     read len sectors
//! w <addr> <len>     write len sectors
//! s <addr>           seek
//! wait <usec>        leave the drive idle
//! ```
//!
//! `<addr>` is either an LBA sector number or a `c/h/s` triple in the drive's logical geometry.
//! The replay clock advances by the cost of each command, so the drive sees the trace as a host
//! that issues every command as soon as the previous one completes.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use marty_hdd::{
    device_types::{chs::DiskChs, geometry::DriveGeometry},
    HardDisk,
    HddOperation,
    SystemTicks,
    TickSource,
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TraceAddress {
    Lba(u32),
    Chs(DiskChs),
}

impl FromStr for TraceAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            Ok(TraceAddress::Chs(s.parse::<DiskChs>().map_err(|e| anyhow!(e))?))
        }
        else {
            Ok(TraceAddress::Lba(s.parse::<u32>().with_context(|| format!("Bad address '{}'", s))?))
        }
    }
}

impl TraceAddress {
    pub fn resolve(&self, geom: &DriveGeometry) -> Option<u32> {
        match self {
            TraceAddress::Lba(lba) => Some(*lba),
            TraceAddress::Chs(chs) => chs.to_lba(geom),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TraceCommand {
    Read { addr: TraceAddress, len: u32 },
    Write { addr: TraceAddress, len: u32 },
    Seek { addr: TraceAddress },
    Wait { usec: f64 },
}

fn parse_line(line: &str) -> Result<Option<TraceCommand>, anyhow::Error> {
    let line = match line.split_once('#') {
        Some((cmd, _comment)) => cmd,
        None => line,
    };
    let mut tokens = line.split_whitespace();
    let Some(op) = tokens.next()
    else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();

    let expect_args = |n: usize| -> Result<(), anyhow::Error> {
        if args.len() != n {
            bail!("'{}' takes {} argument(s), got {}", op, n, args.len());
        }
        Ok(())
    };
    let parse_len = |s: &str| -> Result<u32, anyhow::Error> {
        let len = s.parse::<u32>().with_context(|| format!("Bad length '{}'", s))?;
        if len == 0 {
            bail!("Length must be nonzero");
        }
        Ok(len)
    };

    let cmd = match op.to_ascii_lowercase().as_str() {
        "r" | "read" => {
            expect_args(2)?;
            TraceCommand::Read {
                addr: args[0].parse()?,
                len:  parse_len(args[1])?,
            }
        }
        "w" | "write" => {
            expect_args(2)?;
            TraceCommand::Write {
                addr: args[0].parse()?,
                len:  parse_len(args[1])?,
            }
        }
        "s" | "seek" => {
            expect_args(1)?;
            TraceCommand::Seek { addr: args[0].parse()? }
        }
        "wait" => {
            expect_args(1)?;
            let usec = args[0]
                .parse::<f64>()
                .with_context(|| format!("Bad wait time '{}'", args[0]))?;
            if !usec.is_finite() || usec < 0.0 {
                bail!("Wait time must be a nonnegative number of microseconds");
            }
            TraceCommand::Wait { usec }
        }
        other => bail!("Unknown trace command '{}'", other),
    };
    Ok(Some(cmd))
}

pub fn parse_trace(text: &str) -> Result<Vec<TraceCommand>, anyhow::Error> {
    let mut commands = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(cmd) = parse_line(line).with_context(|| format!("Trace line {}", i + 1))? {
            commands.push(cmd);
        }
    }
    Ok(commands)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct OpStats {
    pub count: u64,
    pub total_usec: f64,
    pub max_usec: f64,
}

impl OpStats {
    fn record(&mut self, usec: f64) {
        self.count += 1;
        self.total_usec += usec;
        self.max_usec = self.max_usec.max(usec);
    }

    fn merge(&mut self, other: &OpStats) {
        self.count += other.count;
        self.total_usec += other.total_usec;
        self.max_usec = self.max_usec.max(other.max_usec);
    }

    pub fn mean_usec(&self) -> f64 {
        if self.count == 0 {
            0.0
        }
        else {
            self.total_usec / self.count as f64
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReplayStats {
    pub reads:  OpStats,
    pub writes: OpStats,
    pub seeks:  OpStats,
    pub idle_usec: f64,
    pub elapsed_ticks: u64,
}

impl ReplayStats {
    pub fn total(&self) -> OpStats {
        let mut total = self.reads;
        total.merge(&self.writes);
        total.merge(&self.seeks);
        total
    }
}

/// Replay `trace` against `hdd`, advancing `clock` by the cost of every command.
pub fn replay(
    hdd: &mut HardDisk,
    clock: &mut SystemTicks,
    trace: &[TraceCommand],
    verbose: bool,
) -> Result<ReplayStats, anyhow::Error> {
    let geom = hdd.geometry();
    let start = clock.ticks();
    let mut stats = ReplayStats::default();

    let resolve = |addr: &TraceAddress, n: usize| -> Result<u32, anyhow::Error> {
        addr.resolve(&geom)
            .ok_or_else(|| anyhow!("Command {}: address {:?} is outside drive geometry {}", n, addr, geom))
    };

    for (n, cmd) in trace.iter().enumerate() {
        let (name, lba, cost) = match cmd {
            TraceCommand::Read { addr, len } => {
                let lba = resolve(addr, n)?;
                let cost = hdd.timing_read(&*clock, lba, *len);
                stats.reads.record(cost);
                ("read", lba, cost)
            }
            TraceCommand::Write { addr, len } => {
                let lba = resolve(addr, n)?;
                let cost = hdd.timing_write(&*clock, lba, *len);
                stats.writes.record(cost);
                ("write", lba, cost)
            }
            TraceCommand::Seek { addr } => {
                let lba = resolve(addr, n)?;
                let cost = hdd.estimate_seek(lba, HddOperation::Seek, false, 0.0);
                stats.seeks.record(cost);
                ("seek", lba, cost)
            }
            TraceCommand::Wait { usec } => {
                clock.advance_usec(*usec);
                stats.idle_usec += usec;
                continue;
            }
        };

        log::trace!("replay(): {} {} -> {:.2}us", name, lba, cost);
        if verbose {
            println!("{:6} {:>6} {:>10} {:>12.2}us", n, name, lba, cost);
        }
        clock.advance_usec(cost);
    }

    stats.elapsed_ticks = clock.ticks() - start;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marty_hdd::devices::hdd::{HddBusType, PresetCatalog, HDD_OVERHEAD_TIME};

    fn drive(preset: &str) -> HardDisk {
        let catalog = PresetCatalog::builtin();
        let mut hdd = HardDisk::new(HddBusType::Ide, "c.img", DriveGeometry::new(615, 4, 17));
        hdd.apply_preset(&catalog, catalog.index_from_internal_name(preset));
        hdd
    }

    #[test]
    fn parse_commands() {
        let trace = parse_trace(
            "# boot\n\
             r 0 1\n\
             \n\
             w 1/0/1 8   # fat\n\
             S 100\n\
             wait 250.5\n",
        )
        .unwrap();

        assert_eq!(
            trace,
            vec![
                TraceCommand::Read {
                    addr: TraceAddress::Lba(0),
                    len:  1,
                },
                TraceCommand::Write {
                    addr: TraceAddress::Chs(DiskChs::new(1, 0, 1)),
                    len:  8,
                },
                TraceCommand::Seek {
                    addr: TraceAddress::Lba(100),
                },
                TraceCommand::Wait { usec: 250.5 },
            ]
        );
    }

    #[test]
    fn parse_errors_report_line() {
        let err = parse_trace("r 0 1\nx 5\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
        assert!(parse_trace("r 0").is_err());
        assert!(parse_trace("r 0 0").is_err());
        assert!(parse_trace("w 1/2 4").is_err());
        assert!(parse_trace("wait -1").is_err());
    }

    #[test]
    fn chs_addresses_resolve_in_logical_geometry() {
        let geom = DriveGeometry::new(615, 4, 17);
        assert_eq!(TraceAddress::Chs(DiskChs::new(1, 0, 1)).resolve(&geom), Some(68));
        assert_eq!(TraceAddress::Chs(DiskChs::new(615, 0, 1)).resolve(&geom), None);
        assert_eq!(TraceAddress::Lba(99999).resolve(&geom), Some(99999));
    }

    #[test]
    fn replay_accumulates_costs() {
        let mut hdd = drive("1989_3500rpm");
        let mut clock = SystemTicks::new(1_000_000.0);
        let trace = parse_trace("r 0 1\nr 0 1\nw 500 2\nwait 100\ns 9000\n").unwrap();

        let stats = replay(&mut hdd, &mut clock, &trace, false).unwrap();
        assert_eq!(stats.reads.count, 2);
        assert_eq!(stats.writes.count, 1);
        assert_eq!(stats.seeks.count, 1);
        assert_eq!(stats.total().count, 4);
        assert!(stats.reads.total_usec > 0.0);
        assert_eq!(stats.reads.max_usec, stats.reads.total_usec);
        assert_eq!(stats.idle_usec, 100.0);
        assert!(stats.elapsed_ticks >= 100);
        assert_eq!(hdd.mechanics().position().addr, 9000);
    }

    #[test]
    fn replay_on_instant_drive() {
        let mut hdd = drive("ramdisk");
        let mut clock = SystemTicks::new(1_000_000.0);
        let trace = parse_trace("r 0 4\nw 10 4\n").unwrap();

        let stats = replay(&mut hdd, &mut clock, &trace, false).unwrap();
        assert_eq!(stats.total().mean_usec(), HDD_OVERHEAD_TIME);
        assert_eq!(stats.elapsed_ticks, 100);
    }

    #[test]
    fn replay_rejects_out_of_geometry_chs() {
        let mut hdd = drive("1989_3500rpm");
        let mut clock = SystemTicks::default();
        let trace = parse_trace("r 700/0/1 1\n").unwrap();
        assert!(replay(&mut hdd, &mut clock, &trace, false).is_err());
    }
}
