/*
 *  main.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Show images and animations on an RGB LED matrix
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

use anyhow::{Context, bail};
use env_logger::Env;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};

use lymons_viewer::cli::{self, CliError};
use lymons_viewer::config::{self, Config};
use lymons_viewer::display::DisplayDriverFactory;
use lymons_viewer::func_timer::FunctionTimer;
use lymons_viewer::prepare::{FillMode, PrepareOptions};
use lymons_viewer::stream::FileStreamIO;
use lymons_viewer::{BUILD_DATE, CancelToken, ContentPreparer, FrameStream, Player, SystemClock, TimingConfig};

async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn prepare_options(cfg: &Config) -> PrepareOptions {
    let matrix = cfg.matrix();
    let playback = cfg.playback();
    PrepareOptions {
        width: matrix.panel_width(),
        height: matrix.panel_height(),
        fill: FillMode {
            fill_width: playback.fill_width(),
            fill_height: playback.fill_height(),
        },
        center: playback.center(),
        filter: playback.filter().into(),
    }
}

/// Render everything into one frame stream file, no panel involved
fn write_output(cfg: &Config, output: &Path, sources: Vec<(PathBuf, TimingConfig)>) -> anyhow::Result<()> {
    let io = FileStreamIO::create(output)
        .with_context(|| format!("Couldn't open output stream {}", output.display()))?;
    let mut preparer = ContentPreparer::new(prepare_options(cfg))
        .with_sink(FrameStream::new(Box::new(io)));

    {
        let _timer = FunctionTimer::new("Loading");
        preparer.prepare_all(sources)?;
    }

    let sink = preparer
        .finish_sink()
        .with_context(|| format!("Nothing written to {}", output.display()))?;
    info!("Done: output to {} ({} bytes).", output.display(), sink.byte_len()?);
    info!("Play it back with: {} {}", env!("CARGO_PKG_NAME"), output.display());

    let playback = cfg.playback();
    if playback.shuffle() {
        warn!("Note: -s (shuffle) has no effect when writing an output stream.");
    }
    if playback.forever() {
        warn!("Note: -f (forever) has no effect when writing an output stream.");
    }
    Ok(())
}

#[tokio::main] // Requires the `tokio` runtime with `macros` and `rt-multi-thread` features
async fn main() -> anyhow::Result<()> {
    let args = match cli::parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(CliError::Clap(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let cfg = config::load(&args.overrides).context("Configuration")?;
    if args.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    // Initialize the logger with the appropriate level based on debug flag
    let level = if args.debug {
        "debug".to_string()
    } else {
        cfg.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    if let Some(output) = args.output.as_deref() {
        return write_output(&cfg, output, args.sources);
    }

    let matrix = cfg.matrix();
    let playback = cfg.playback();
    let driver = DisplayDriverFactory::create_from_config(&matrix)
        .context("Couldn't create matrix")?;

    info!("Loading {} files...", args.sources.len());
    let mut playlist = {
        let _timer = FunctionTimer::new("Loading").then("Display");
        let mut preparer = ContentPreparer::new(prepare_options(&cfg));
        preparer.prepare_all(args.sources)?
    };
    if playlist.is_empty() {
        bail!("Image couldn't be loaded.");
    }
    playlist.reconcile_defaults();

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = signal_handler().await {
                error!("Signal handler failed: {}", e);
                return;
            }
            cancel.cancel();
        });
    }

    let mut player = Player::new(driver, Arc::new(SystemClock::new()), cancel.clone(), playback.vsync_multiple());
    let (shuffle, forever) = (playback.shuffle(), playback.forever());
    let run_cancel = cancel.clone();
    let (mut player, result) = tokio::task::spawn_blocking(move || {
        let result = playlist.run(&mut player, shuffle, forever, &run_cancel);
        (player, result)
    })
    .await
    .context("Playback thread panicked")?;

    if cancel.is_cancelled() {
        info!("Signal received. Exiting.");
    }

    info!("Main application exiting. Clearing display.");
    if let Err(e) = player.clear() {
        warn!("Couldn't clear display: {}", e);
    }

    result?;
    Ok(())
}
