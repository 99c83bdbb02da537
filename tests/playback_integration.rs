/*
 *  tests/playback_integration.rs
 *
 *  End to end: command line -> preparation -> playlist -> panel
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 */

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use image::codecs::gif::GifEncoder;
use image::imageops::FilterType;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lymons_viewer::cli;
use lymons_viewer::display::MockDriver;
use lymons_viewer::prepare::{FillMode, PrepareOptions};
use lymons_viewer::stream::FileStreamIO;
use lymons_viewer::{
    CancelToken, Clock, ContentPreparer, FrameStream, ManualClock, Player, Termination,
    DISTANT_FUTURE_MS,
};

const W: u32 = 8;
const H: u32 = 4;

fn options() -> PrepareOptions {
    PrepareOptions {
        width: W,
        height: H,
        fill: FillMode::default(),
        center: false,
        filter: FilterType::Nearest,
    }
}

fn write_png(dir: &Path, name: &str, px: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(W, H, Rgba(px)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    std::fs::write(&path, buf).unwrap();
    path
}

/// Animation with one solid frame per entry of `reds`, each shown `delay_ms`
fn write_gif(dir: &Path, name: &str, reds: &[u8], delay_ms: u32) -> PathBuf {
    let path = dir.join(name);
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        for r in reds {
            let img = RgbaImage::from_pixel(W, H, Rgba([*r, 0, 0, 255]));
            encoder
                .encode_frame(Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1)))
                .unwrap();
        }
    }
    std::fs::write(&path, buf).unwrap();
    path
}

fn args(dir: &Path, rest: &[&str]) -> Vec<String> {
    let mut v = vec!["lymons-viewer".to_string()];
    v.extend(rest.iter().map(|a| {
        if a.ends_with(".gif") || a.ends_with(".png") {
            dir.join(a).display().to_string()
        } else {
            a.to_string()
        }
    }));
    v
}

#[test]
fn test_mixed_playlist_plays_once_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_gif(dir.path(), "anim.gif", &[10, 20, 30], 50);
    write_png(dir.path(), "still.png", [0, 200, 0, 255]);

    let cli = cli::parse_from(args(dir.path(), &["anim.gif", "-w", "0.3", "still.png"])).unwrap();
    let mut preparer = ContentPreparer::new(options());
    let mut playlist = preparer.prepare_all(cli.sources).unwrap();
    assert_eq!(playlist.len(), 2);
    playlist.reconcile_defaults();

    let clock = ManualClock::new();
    let driver = MockDriver::new_with_size(W, H).unwrap().with_clock(clock.clone(), Duration::from_millis(2));
    let state = driver.state();
    let cancel = CancelToken::new();
    let mut player = Player::new(Box::new(driver), Arc::new(clock.clone()), cancel.clone(), 1);

    let summary = playlist.run(&mut player, false, false, &cancel).unwrap();
    assert_eq!(summary.passes, 1);
    assert_eq!(summary.sources_played, 2);

    let shown = state.lock().unwrap().shown.clone();
    assert_eq!(shown, vec![
        Rgb888::new(10, 0, 0),
        Rgb888::new(20, 0, 0),
        Rgb888::new(30, 0, 0),
        Rgb888::new(0, 200, 0),
    ]);
    // 3 x 50ms animation, then the still for its 0.3s wait
    assert_eq!(clock.now(), Duration::from_millis(450));
}

#[test]
fn test_single_still_runs_until_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "only.png", [5, 5, 5, 255]);

    let cli = cli::parse_from(args(dir.path(), &["-w", "0.1", "only.png"])).unwrap();
    let mut playlist = ContentPreparer::new(options()).prepare_all(cli.sources).unwrap();
    playlist.reconcile_defaults();
    assert_eq!(playlist.sources()[0].timing.wait_ms, DISTANT_FUTURE_MS);

    let clock = ManualClock::new();
    let driver = MockDriver::new_with_size(W, H).unwrap();
    let state = driver.state();
    let cancel = CancelToken::new();
    state.lock().unwrap().cancel_after = Some((40, cancel.clone()));
    let mut player = Player::new(Box::new(driver), Arc::new(clock.clone()), cancel.clone(), 1);

    let summary = playlist.run(&mut player, false, true, &cancel).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.frames, 40);
    // the still re-shows every 100ms, its delay baked in at preparation
    assert_eq!(clock.now(), Duration::from_millis(3900));
}

#[test]
fn test_loops_and_duration_from_command_line() {
    let dir = tempfile::tempdir().unwrap();
    write_gif(dir.path(), "a.gif", &[1, 2], 100);
    write_gif(dir.path(), "b.gif", &[3, 4], 100);

    let cli = cli::parse_from(args(dir.path(), &["-l", "3", "a.gif", "-l", "-1", "-t", "0.25", "b.gif"])).unwrap();
    let mut playlist = ContentPreparer::new(options()).prepare_all(cli.sources).unwrap();
    playlist.reconcile_defaults();

    let clock = ManualClock::new();
    let driver = MockDriver::new_with_size(W, H).unwrap();
    let state = driver.state();
    let cancel = CancelToken::new();
    let mut player = Player::new(Box::new(driver), Arc::new(clock.clone()), cancel.clone(), 1);
    playlist.run(&mut player, false, false, &cancel).unwrap();

    let reds: Vec<u8> = state.lock().unwrap().shown.iter().map(|c| c.r()).collect();
    assert_eq!(reds, vec![1, 2, 1, 2, 1, 2, 3, 4, 3]);
}

#[test]
fn test_output_stream_replays_its_sources() {
    let dir = tempfile::tempdir().unwrap();
    let anim = write_gif(dir.path(), "anim.gif", &[100, 150], 40);
    let still = write_png(dir.path(), "still.png", [0, 0, 90, 255]);
    let out = dir.path().join("show.stream");

    let sink = FrameStream::new(Box::new(FileStreamIO::create(&out).unwrap()));
    let mut preparer = ContentPreparer::new(options()).with_sink(sink);
    let cli = cli::parse_from(vec![
        "lymons-viewer".to_string(),
        anim.display().to_string(),
        still.display().to_string(),
    ])
    .unwrap();
    assert!(preparer.prepare_all(cli.sources).unwrap().is_empty());
    drop(preparer.finish_sink().unwrap());

    // the written file is itself a playable source
    let mut playlist = ContentPreparer::new(options())
        .prepare_all(vec![(out, Default::default())])
        .unwrap();
    assert_eq!(playlist.len(), 1);
    assert!(playlist.sources()[0].is_multi_frame);

    let driver = MockDriver::new_with_size(W, H).unwrap();
    let state = driver.state();
    let cancel = CancelToken::new();
    state.lock().unwrap().cancel_after = Some((3, cancel.clone()));
    let mut player = Player::new(Box::new(driver), Arc::new(ManualClock::new()), cancel.clone(), 1);

    let report = player.play(&mut playlist.sources_mut()[0]).unwrap();
    assert_eq!(report.reason, Termination::Cancelled);

    let shown = state.lock().unwrap().shown.clone();
    assert_eq!(shown, vec![Rgb888::new(100, 0, 0), Rgb888::new(150, 0, 0), Rgb888::new(0, 0, 90)]);
}

#[test]
fn test_corrupt_stream_is_skipped_and_the_rest_plays() {
    let dir = tempfile::tempdir().unwrap();
    let write_stream = |name: &str, red: u8, tail: &[u8]| {
        let path = dir.path().join(name);
        {
            let mut out = FrameStream::new(Box::new(FileStreamIO::create(&path).unwrap()));
            let mut c = lymons_viewer::display::FrameCanvas::new(W, H);
            c.set_pixel(0, 0, red, 0, 0);
            out.append(&c, 10_000).unwrap();
        }
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(tail);
        std::fs::write(&path, bytes).unwrap();
        path
    };
    let bad = write_stream("bad.stream", 1, b"twenty bytes of junk");
    let good = write_stream("good.stream", 2, b"");

    let cli = cli::parse_from(vec![
        "lymons-viewer".to_string(),
        bad.display().to_string(),
        good.display().to_string(),
    ])
    .unwrap();
    let mut playlist = ContentPreparer::new(options()).prepare_all(cli.sources).unwrap();
    assert_eq!(playlist.len(), 1);
    assert!(playlist.sources()[0].name.ends_with("good.stream"));
    playlist.reconcile_defaults();

    let driver = MockDriver::new_with_size(W, H).unwrap();
    let state = driver.state();
    let cancel = CancelToken::new();
    state.lock().unwrap().cancel_after = Some((2, cancel.clone()));
    let mut player = Player::new(Box::new(driver), Arc::new(ManualClock::new()), cancel.clone(), 1);

    let summary = playlist.run(&mut player, false, false, &cancel).unwrap();
    assert!(summary.cancelled);
    let reds: Vec<u8> = state.lock().unwrap().shown.iter().map(|c| c.r()).collect();
    assert_eq!(reds, vec![2, 2]);
}
