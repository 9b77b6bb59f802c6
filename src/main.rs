use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use human_panic::setup_panic;
use platter::{
    audio::RodioMedia,
    config::AppConfig,
    controller::{ControllerEvent, PlaybackController, PlaybackStatus},
    media::{MediaSource, SilentMedia},
    presets,
    song::{CoverArt, Song, SongId, SongSource},
    tags::{self, TagInfo},
    theme::Theme,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Platter - a tiny vinyl-style music player 🎵
#[derive(Parser, Debug)]
#[command(name = "platter", version, about)]
struct Args {
    /// Audio files to queue up
    tracks: Vec<PathBuf>,

    /// Scan a directory for audio files
    #[arg(long, short = 'd')]
    dir: Option<PathBuf>,

    /// JSON preset list to load at startup
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Start with shuffle enabled
    #[arg(long, short = 's')]
    shuffle: bool,

    /// Initial volume (0.0 - 1.0)
    #[arg(long)]
    volume: Option<f32>,
}

/// A finished background resolution for one song.
struct Resolved {
    id: SongId,
    tags: Option<TagInfo>,
    theme: Option<Theme>,
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::never(AppConfig::get_config_dir(), "platter.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    guard
}

fn collect_songs(args: &Args, config: &AppConfig) -> Vec<Song> {
    let mut songs = Vec::new();

    let preset_path = args
        .presets
        .clone()
        .or_else(|| config.presets_path.as_ref().map(PathBuf::from));
    if let Some(path) = preset_path {
        songs.extend(presets::load_presets(&path));
    }

    let dir = args
        .dir
        .clone()
        .or_else(|| config.music_directory.as_ref().map(PathBuf::from));
    if let Some(dir) = dir {
        songs.extend(presets::scan_directory(&dir));
    }

    songs.extend(args.tracks.iter().map(|p| Song::from_file(p)));
    songs
}

/// Resolve tags and cover themes off the main thread. Results are keyed by
/// song identity; the controller drops anything that raced with a removal.
fn spawn_resolver(
    worklist: Vec<(SongId, SongSource, Option<String>)>,
    tx: mpsc::Sender<Resolved>,
) {
    thread::spawn(move || {
        for (id, source, cover_ref) in worklist {
            let tags = match &source {
                SongSource::File(path) => match tags::read_tags(path) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        debug!("tags unavailable for {}: {e}", path.display());
                        None
                    }
                },
                SongSource::Remote(_) => None,
            };

            let cover_bytes = tags.as_ref().and_then(|t| t.cover.clone());
            let theme = match (cover_bytes, cover_ref) {
                (Some(bytes), _) => image::load_from_memory(&bytes)
                    .ok()
                    .map(|img| Theme::from_image(&img)),
                (None, Some(reference)) => image::open(&reference)
                    .ok()
                    .map(|img| Theme::from_image(&img)),
                (None, None) => None,
            };

            if tx.send(Resolved { id, tags, theme }).is_err() {
                return;
            }
        }
    });
}

fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn status_line(controller: &PlaybackController) -> String {
    let Some(song) = controller.current_song() else {
        return "(empty playlist)".to_string();
    };

    let marker = match controller.status() {
        PlaybackStatus::Playing => "▶",
        PlaybackStatus::Paused => "⏸",
        PlaybackStatus::Stopped => "⏹",
    };
    let index = controller.current_index().map(|i| i + 1).unwrap_or(0);
    let total = controller.playlist().len();
    let elapsed = format_time(controller.position());
    let length = controller
        .duration()
        .map(format_time)
        .unwrap_or_else(|| "-:--".to_string());
    let volume = if controller.is_muted() {
        "muted".to_string()
    } else {
        format!("{:.0}%", controller.volume() * 100.0)
    };

    let mut line = format!(
        "{marker} {} — {} [{index}/{total}] {elapsed}/{length} vol {volume}",
        song.title, song.artist
    );
    if controller.shuffle() {
        line.push_str(" ⤨");
    }
    match controller.repeat() {
        platter::RepeatMode::List => line.push_str(" 🔁"),
        platter::RepeatMode::Single => line.push_str(" 🔂"),
        platter::RepeatMode::Off => {}
    }
    line
}

fn redraw(controller: &PlaybackController) {
    print!("\r\x1b[2K{}", status_line(controller));
    let _ = io::stdout().flush();
}

fn main() -> Result<()> {
    setup_panic!();
    let _guard = init_logging();

    let args = Args::parse();
    let mut config = AppConfig::load();

    let songs = collect_songs(&args, &config);
    info!("starting with {} songs", songs.len());

    let media: Box<dyn MediaSource> = match RodioMedia::new() {
        Ok(m) => Box::new(m),
        Err(e) => {
            warn!("audio unavailable, running silent: {e}");
            eprintln!("warning: no audio device, running silent");
            Box::new(SilentMedia::default())
        }
    };

    let worklist: Vec<(SongId, SongSource, Option<String>)> = songs
        .iter()
        .map(|s| {
            let cover_ref = match &s.cover {
                Some(CoverArt::Reference(r)) => Some(r.clone()),
                _ => None,
            };
            (s.id, s.source.clone(), cover_ref)
        })
        .collect();

    let mut controller = PlaybackController::new(media);
    let events = controller.subscribe();
    controller.load(songs);
    controller.set_shuffle(args.shuffle || config.shuffle);
    controller.set_repeat(config.repeat);
    controller.set_volume(args.volume.unwrap_or(config.volume));

    let (resolved_tx, resolved_rx) = mpsc::channel();
    spawn_resolver(worklist, resolved_tx);

    enable_raw_mode()?;
    let result = run(&mut controller, &events, &resolved_rx);
    disable_raw_mode()?;
    println!();

    config.volume = controller.volume();
    config.shuffle = controller.shuffle();
    config.repeat = controller.repeat();
    config.save();

    result
}

fn run(
    controller: &mut PlaybackController,
    events: &mpsc::Receiver<ControllerEvent>,
    resolved: &mpsc::Receiver<Resolved>,
) -> Result<()> {
    redraw(controller);

    loop {
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => controller.toggle_play(),
                    KeyCode::Char('n') => controller.next(),
                    KeyCode::Char('p') => controller.previous(),
                    KeyCode::Char('s') => {
                        let shuffle = !controller.shuffle();
                        controller.set_shuffle(shuffle);
                    }
                    KeyCode::Char('r') => {
                        controller.cycle_repeat();
                    }
                    KeyCode::Char('m') => controller.toggle_mute(),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        controller.set_volume(controller.volume() + 0.05);
                    }
                    KeyCode::Char('-') => {
                        controller.set_volume(controller.volume() - 0.05);
                    }
                    KeyCode::Right => {
                        controller.seek(controller.position() + Duration::from_secs(5));
                    }
                    KeyCode::Left => {
                        let back = controller.position().saturating_sub(Duration::from_secs(5));
                        controller.seek(back);
                    }
                    KeyCode::Char('x') => {
                        if let Some(index) = controller.current_index() {
                            controller.remove_at(index);
                        }
                    }
                    _ => {}
                }
            }
        }

        while let Ok(r) = resolved.try_recv() {
            if let Some(tags) = r.tags {
                controller.apply_tags(r.id, tags);
            }
            if let Some(theme) = r.theme {
                controller.apply_theme(r.id, theme);
            }
        }

        controller.tick();

        while let Ok(event) = events.try_recv() {
            if let ControllerEvent::PlaybackError(e) = event {
                debug!("playback error surfaced: {e}");
            }
        }

        redraw(controller);
    }

    Ok(())
}
