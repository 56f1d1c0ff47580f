//! aria-cli - 无界面播放宿主
//!
//! 用本地音频文件组成播放列表，从标准输入读取传输命令，
//! 通知栏与前台保活以日志形式输出。

mod console;
mod logging;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

use aria_audio::{EngineConfig, SymphoniaEngine};
use aria_playback::{spawn_coordinator, CoordinatorConfig, PlaybackEvent, Track};

use console::{parse_line, Input, LogHost, LogSurface, HELP};

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {} [--config <config.json>] <audio files...>", program);
    std::process::exit(1);
}

fn track_for(index: usize, path: &Path) -> Track {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Track::new(index.to_string(), path.display().to_string(), name)
}

fn main() {
    logging::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("aria-cli");

    let mut config_path: Option<PathBuf> = None;
    let mut files: Vec<PathBuf> = Vec::new();
    let mut rest = args.iter().skip(1);
    while let Some(a) = rest.next() {
        match a.as_str() {
            "--config" => match rest.next() {
                Some(p) => config_path = Some(PathBuf::from(p)),
                None => usage(program),
            },
            "-h" | "--help" => usage(program),
            _ => files.push(PathBuf::from(a)),
        }
    }
    if files.is_empty() {
        usage(program);
    }

    let config = match &config_path {
        Some(path) => match CoordinatorConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => CoordinatorConfig::default(),
    };

    let tracks: Vec<Track> = files
        .iter()
        .enumerate()
        .map(|(i, p)| track_for(i, p))
        .collect();

    let handle = spawn_coordinator(
        Box::new(SymphoniaEngine::new(EngineConfig::default())),
        Box::new(LogSurface),
        Box::new(LogHost),
        config,
    );
    handle.set_playlist(tracks.clone());
    let router = handle.router();

    let evt_rx = handle.evt_rx.clone();
    let printer = thread::spawn(move || {
        for event in evt_rx.iter() {
            match event {
                PlaybackEvent::StateChanged(state) => println!("state: {:?}", state),
                PlaybackEvent::TrackChanged(track) => println!("track: {}", track.display_name),
                PlaybackEvent::Notice(err) => println!("notice: {}", err),
            }
        }
    });

    for (i, t) in tracks.iter().enumerate() {
        println!("  [{}] {}", i, t.display_name);
    }
    println!("{}", HELP);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stdin: {}", e);
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(Input::Bridge(call))) => {
                router.bridge(call);
            }
            Ok(Some(Input::Media(cb))) => {
                router.media_session(cb);
            }
            Ok(Some(Input::Notify(action))) => {
                router.notification(action);
            }
            Ok(Some(Input::Status)) => match serde_json::to_string_pretty(&handle.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("snapshot: {}", e),
            },
            Ok(Some(Input::Help)) => println!("{}", HELP),
            Ok(Some(Input::Quit)) => break,
            Ok(None) => {}
            Err(msg) => println!("{}", msg),
        }
    }

    drop(router);
    handle.shutdown();
    let _ = printer.join();
}
