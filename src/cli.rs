/*
 *  cli.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command line: sources interleaved with timing directives
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{ConfigOverrides, DriverKind, MatrixConfig, PlaybackConfig, ScaleFilter};
use crate::timing::{Directive, TimelineEvent, TimingConfig, bind_timeline};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Clap(#[from] clap::Error),
    #[error("unknown {what} '{value}'")]
    Unknown { what: &'static str, value: String },
}

/// Everything the command line asked for
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub overrides: ConfigOverrides,
    /// Sources in command line order, each with the timing active where it appeared
    pub sources: Vec<(PathBuf, TimingConfig)>,
    /// Write frames to this file instead of driving the panel
    pub output: Option<PathBuf>,
    pub debug: bool,
    pub dump_config: bool,
}

pub fn command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .disable_version_flag(true)
        .arg(Arg::new("version")
        .long("version")
        .help("Print version")
        .action(ArgAction::Version))
        .arg(Arg::new("sources")
        .value_name("IMAGE")
        .help("Images, animations or pre-rendered frame streams to show")
        .value_parser(value_parser!(PathBuf))
        .action(ArgAction::Append)
        .num_args(1..)
        .required_unless_present("dump-config"))
        .arg(Arg::new("wait")
        .short('w')
        .value_name("SECONDS")
        .help("Time to show each still image [1.5]")
        .value_parser(value_parser!(f32))
        .action(ArgAction::Append))
        .arg(Arg::new("duration")
        .short('t')
        .value_name("SECONDS")
        .help("Stop animations after this long [unbounded]")
        .value_parser(value_parser!(f32))
        .action(ArgAction::Append))
        .arg(Arg::new("loops")
        .short('l')
        .value_name("LOOPS")
        .help("Number of loops through an animation, -1 for unbounded [-1]")
        .value_parser(value_parser!(i32))
        .allow_negative_numbers(true)
        .action(ArgAction::Append))
        .arg(Arg::new("delay")
        .short('D')
        .value_name("MS")
        .help("Override the animation frame delay, -1 uses the stored delay [-1]")
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true)
        .action(ArgAction::Append))
        .arg(Arg::new("center")
        .short('C')
        .long("center")
        .help("Center images on the panel")
        .action(ArgAction::SetTrue))
        .arg(Arg::new("shuffle")
        .short('s')
        .long("shuffle")
        .help("Shuffle the playlist on every pass")
        .action(ArgAction::SetTrue))
        .arg(Arg::new("forever")
        .short('f')
        .long("forever")
        .help("Loop through the whole list forever")
        .action(ArgAction::SetTrue))
        .arg(Arg::new("vsync")
        .short('V')
        .long("vsync-multiple")
        .value_name("N")
        .help("Swap only on every Nth refresh; slows down fast animations [1]")
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true))
        .arg(Arg::new("output")
        .short('O')
        .long("output")
        .value_name("FILE")
        .help("Write a frame stream to FILE instead of showing it")
        .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("fill-width")
        .long("fill-width")
        .help("Scale so the image covers the full panel width")
        .action(ArgAction::SetTrue))
        .arg(Arg::new("fill-height")
        .long("fill-height")
        .help("Scale so the image covers the full panel height")
        .action(ArgAction::SetTrue))
        .arg(Arg::new("filter")
        .long("filter")
        .help("Resampling filter")
        .value_parser(["nearest", "triangle", "catmullrom", "gaussian", "lanczos3"]))
        .arg(Arg::new("led-rows")
        .long("led-rows")
        .value_name("ROWS")
        .help("Rows per panel [32]")
        .value_parser(value_parser!(u32)))
        .arg(Arg::new("led-cols")
        .long("led-cols")
        .value_name("COLS")
        .help("Columns per panel [32]")
        .value_parser(value_parser!(u32)))
        .arg(Arg::new("led-chain")
        .long("led-chain")
        .value_name("PANELS")
        .help("Daisy-chained panels [1]")
        .value_parser(value_parser!(u32)))
        .arg(Arg::new("led-parallel")
        .long("led-parallel")
        .value_name("CHAINS")
        .help("Parallel chains [1]")
        .value_parser(value_parser!(u32)))
        .arg(Arg::new("led-brightness")
        .long("led-brightness")
        .value_name("PERCENT")
        .help("Panel brightness, 1-100")
        .value_parser(value_parser!(u8).range(1..=100)))
        .arg(Arg::new("refresh-hz")
        .long("refresh-hz")
        .value_name("HZ")
        .help("Panel refresh rate [100]")
        .value_parser(value_parser!(u32)))
        .arg(Arg::new("driver")
        .long("driver")
        .help("Matrix driver")
        .value_parser(["headless", "mock"]))
        .arg(Arg::new("config")
        .long("config")
        .value_name("FILE")
        .help("YAML config file")
        .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("log-level")
        .long("log-level")
        .help("Log level (overrides the config file)"))
        .arg(Arg::new("debug")
        .action(ArgAction::SetTrue)
        .long("debug")
        .short('v')
        .alias("verbose")
        .help("Enable debug log level"))
        .arg(Arg::new("dump-config")
        .long("dump-config")
        .help("Print the merged configuration and exit")
        .action(ArgAction::SetTrue))
        .after_help("Timing:\
            \n\t-w, -t, -l and -D apply to the images that follow them\
            \n\ton the command line, so each image can have its own timing.\
            \n\tWith both -l and -t given, whichever is reached first ends\
            \n\tthe animation.\
            \n\n\
            Playlist:\
            \n\tA single image stays up until interrupted. With several\
            \n\timages, animations without -l or -t play once.")
}

/// Parse a full argument vector, program name first
pub fn parse_from<I, T>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    from_matches(&matches)
}

fn from_matches(m: &ArgMatches) -> Result<CliArgs, CliError> {
    let matrix = MatrixConfig {
        rows: m.get_one::<u32>("led-rows").copied(),
        cols: m.get_one::<u32>("led-cols").copied(),
        chain_length: m.get_one::<u32>("led-chain").copied(),
        parallel: m.get_one::<u32>("led-parallel").copied(),
        refresh_hz: m.get_one::<u32>("refresh-hz").copied(),
        brightness: m.get_one::<u8>("led-brightness").copied(),
        driver: m.get_one::<String>("driver").map(|d| parse_driver(d)).transpose()?,
    };

    let playback = PlaybackConfig {
        center: flag(m, "center"),
        shuffle: flag(m, "shuffle"),
        forever: flag(m, "forever"),
        vsync_multiple: m.get_one::<i64>("vsync").map(|v| (*v).clamp(1, u32::MAX as i64) as u32),
        fill_width: flag(m, "fill-width"),
        fill_height: flag(m, "fill-height"),
        filter: m.get_one::<String>("filter").map(|f| parse_filter(f)).transpose()?,
    };

    let overrides = ConfigOverrides {
        config: m.get_one::<PathBuf>("config").cloned(),
        log_level: m.get_one::<String>("log-level").cloned(),
        matrix,
        playback,
    };

    Ok(CliArgs {
        overrides,
        sources: bind_timeline(timeline(m)),
        output: m.get_one::<PathBuf>("output").cloned(),
        debug: m.get_flag("debug"),
        dump_config: m.get_flag("dump-config"),
    })
}

/// Only flags actually given override the config file
fn flag(m: &ArgMatches, id: &str) -> Option<bool> {
    m.get_flag(id).then_some(true)
}

/// Rebuild command line order from clap's per-argument value indices
fn timeline(m: &ArgMatches) -> Vec<TimelineEvent<PathBuf>> {
    let mut events: Vec<(usize, TimelineEvent<PathBuf>)> = Vec::new();

    if let (Some(idx), Some(vals)) = (m.indices_of("sources"), m.get_many::<PathBuf>("sources")) {
        events.extend(idx.zip(vals.cloned().map(TimelineEvent::Source)));
    }
    if let (Some(idx), Some(vals)) = (m.indices_of("wait"), m.get_many::<f32>("wait")) {
        events.extend(idx.zip(vals.map(|s| TimelineEvent::Directive(Directive::Wait(Directive::seconds_to_ms(*s))))));
    }
    if let (Some(idx), Some(vals)) = (m.indices_of("duration"), m.get_many::<f32>("duration")) {
        events.extend(idx.zip(vals.map(|s| TimelineEvent::Directive(Directive::Duration(Directive::seconds_to_ms(*s))))));
    }
    if let (Some(idx), Some(vals)) = (m.indices_of("loops"), m.get_many::<i32>("loops")) {
        events.extend(idx.zip(vals.map(|n| TimelineEvent::Directive(Directive::Loops(*n)))));
    }
    if let (Some(idx), Some(vals)) = (m.indices_of("delay"), m.get_many::<i64>("delay")) {
        events.extend(idx.zip(vals.map(|ms| TimelineEvent::Directive(Directive::Delay(*ms)))));
    }

    events.sort_by_key(|(i, _)| *i);
    events.into_iter().map(|(_, e)| e).collect()
}

fn parse_driver(s: &str) -> Result<DriverKind, CliError> {
    match s {
        "headless" => Ok(DriverKind::Headless),
        "mock" => Ok(DriverKind::Mock),
        _ => Err(CliError::Unknown { what: "driver", value: s.to_string() }),
    }
}

fn parse_filter(s: &str) -> Result<ScaleFilter, CliError> {
    match s {
        "nearest" => Ok(ScaleFilter::Nearest),
        "triangle" => Ok(ScaleFilter::Triangle),
        "catmullrom" => Ok(ScaleFilter::CatmullRom),
        "gaussian" => Ok(ScaleFilter::Gaussian),
        "lanczos3" => Ok(ScaleFilter::Lanczos3),
        _ => Err(CliError::Unknown { what: "filter", value: s.to_string() }),
    }
}
