use anyhow::{bail, Result};
use platter::controller::{Advance, ControllerEvent, PlaybackController, PlaybackStatus, RepeatMode};
use platter::media::MediaSource;
use platter::song::{Song, SongSource};
use platter::tags::TagInfo;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted media double: playback state is settable from the outside and
/// every seek/volume call is recorded.
#[derive(Default)]
struct MediaLog {
    position: Duration,
    finished: bool,
    volume: f32,
    fail_play: bool,
    loaded: Option<SongSource>,
    seeks: Vec<Duration>,
    play_calls: u32,
}

#[derive(Clone, Default)]
struct FakeMedia(Arc<Mutex<MediaLog>>);

impl FakeMedia {
    fn log(&self) -> Arc<Mutex<MediaLog>> {
        Arc::clone(&self.0)
    }
}

impl MediaSource for FakeMedia {
    fn load(&mut self, source: &SongSource) -> Result<()> {
        let mut log = self.0.lock().unwrap();
        log.loaded = Some(source.clone());
        log.position = Duration::ZERO;
        log.finished = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut log = self.0.lock().unwrap();
        log.play_calls += 1;
        if log.fail_play {
            bail!("autoplay blocked");
        }
        Ok(())
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {
        self.0.lock().unwrap().loaded = None;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let mut log = self.0.lock().unwrap();
        log.seeks.push(position);
        log.position = position;
        log.finished = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.lock().unwrap().volume = volume;
    }

    fn position(&self) -> Duration {
        self.0.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn is_finished(&self) -> bool {
        self.0.lock().unwrap().finished
    }
}

fn make_songs(n: usize) -> Vec<Song> {
    (0..n)
        .map(|i| Song::new(format!("Track {i}"), "Artist", SongSource::from_ref(&format!("{i}.mp3"))))
        .collect()
}

fn make_controller(n: usize) -> (PlaybackController, Arc<Mutex<MediaLog>>) {
    let media = FakeMedia::default();
    let log = media.log();
    let mut controller = PlaybackController::new(Box::new(media));
    controller.load(make_songs(n));
    (controller, log)
}

#[test]
fn test_list_repeat_next_cycles_back_to_start() {
    let (mut controller, _) = make_controller(4);
    controller.set_repeat(RepeatMode::List);

    for _ in 0..4 {
        controller.next();
    }
    assert_eq!(controller.current_index(), Some(0));
}

#[test]
fn test_repeat_off_stops_at_end_of_list() {
    let (mut controller, log) = make_controller(3);
    controller.set_repeat(RepeatMode::Off);
    controller.play_index(2);
    assert!(controller.is_playing());

    controller.next();

    assert_eq!(controller.status(), PlaybackStatus::Stopped);
    assert_eq!(controller.current_index(), Some(2));
    // Halting rewinds to the start of the track.
    assert_eq!(log.lock().unwrap().seeks.last(), Some(&Duration::ZERO));
}

#[test]
fn test_single_repeat_restarts_on_ended() {
    let (mut controller, log) = make_controller(3);
    controller.set_repeat(RepeatMode::Single);
    controller.play_index(1);

    log.lock().unwrap().position = Duration::from_secs(200);
    controller.on_ended();

    assert_eq!(controller.current_index(), Some(1));
    assert_eq!(controller.status(), PlaybackStatus::Playing);
    assert_eq!(log.lock().unwrap().seeks.last(), Some(&Duration::ZERO));
}

#[test]
fn test_on_ended_advances_and_keeps_playing() {
    let (mut controller, log) = make_controller(3);
    controller.play();
    assert!(controller.is_playing());

    log.lock().unwrap().finished = true;
    controller.tick();

    assert_eq!(controller.current_index(), Some(1));
    assert!(controller.is_playing());
}

#[test]
fn test_remove_last_song_empties_the_cursor() {
    let (mut controller, _) = make_controller(1);
    controller.remove_at(0);

    assert_eq!(controller.current_index(), None);
    assert_eq!(controller.status(), PlaybackStatus::Stopped);
    assert!(controller.playlist().is_empty());
}

#[test]
fn test_remove_before_cursor_preserves_current_identity() {
    let (mut controller, _) = make_controller(4);
    controller.play_index(2);
    let current_id = controller.current_song().unwrap().id;

    controller.remove_at(0);

    assert_eq!(controller.current_index(), Some(1));
    assert_eq!(controller.current_song().unwrap().id, current_id);
}

#[test]
fn test_remove_after_cursor_changes_nothing() {
    let (mut controller, _) = make_controller(4);
    controller.play_index(1);
    let current_id = controller.current_song().unwrap().id;

    controller.remove_at(3);

    assert_eq!(controller.current_index(), Some(1));
    assert_eq!(controller.current_song().unwrap().id, current_id);
}

#[test]
fn test_remove_current_clamps_and_reloads() {
    let (mut controller, log) = make_controller(3);
    controller.play_index(2);

    // Removing the tail while it is current clamps the cursor back to 0.
    controller.remove_at(2);

    assert_eq!(controller.current_index(), Some(0));
    let loaded = log.lock().unwrap().loaded.clone();
    assert_eq!(loaded, Some(SongSource::from_ref("0.mp3")));
}

#[test]
fn test_shuffle_next_never_repeats_current() {
    let (mut controller, _) = make_controller(5);
    controller.set_shuffle(true);
    controller.play_index(3);

    for _ in 0..100 {
        match controller.next_index() {
            Advance::To(i) => assert_ne!(i, 3),
            other => panic!("unexpected advance: {other:?}"),
        }
    }
}

#[test]
fn test_previous_restarts_after_three_seconds() {
    let (mut controller, log) = make_controller(5);
    controller.play_index(2);

    log.lock().unwrap().position = Duration::from_secs(5);
    controller.previous();

    assert_eq!(controller.current_index(), Some(2));
    assert_eq!(log.lock().unwrap().seeks.last(), Some(&Duration::ZERO));
}

#[test]
fn test_previous_steps_back_early_in_the_track() {
    let (mut controller, log) = make_controller(5);
    controller.play_index(2);

    log.lock().unwrap().position = Duration::from_secs(1);
    controller.previous();

    assert_eq!(controller.current_index(), Some(1));
}

#[test]
fn test_previous_wraps_from_first_song() {
    let (mut controller, _) = make_controller(3);
    controller.previous();
    assert_eq!(controller.current_index(), Some(2));
}

#[test]
fn test_mute_then_unmute_restores_volume() {
    let (mut controller, log) = make_controller(2);
    controller.set_volume(0.37);

    controller.toggle_mute();
    assert!(controller.is_muted());
    assert_eq!(log.lock().unwrap().volume, 0.0);

    controller.toggle_mute();
    assert!(!controller.is_muted());
    assert_eq!(controller.volume(), 0.37);
    assert_eq!(log.lock().unwrap().volume, 0.37);
}

#[test]
fn test_rejected_play_does_not_claim_playing() {
    let (mut controller, log) = make_controller(2);
    let events = controller.subscribe();
    log.lock().unwrap().fail_play = true;

    controller.play();

    assert_ne!(controller.status(), PlaybackStatus::Playing);
    assert!(controller.last_error().is_some());
    assert_eq!(log.lock().unwrap().play_calls, 1);
    let got_error = events
        .try_iter()
        .any(|e| matches!(e, ControllerEvent::PlaybackError(_)));
    assert!(got_error);
}

#[test]
fn test_load_emits_song_changed() {
    let media = FakeMedia::default();
    let mut controller = PlaybackController::new(Box::new(media));
    let events = controller.subscribe();

    controller.load(make_songs(2));

    let changed: Vec<_> = events.try_iter().collect();
    assert!(changed.contains(&ControllerEvent::SongChanged(Some(0))));
    assert!(!controller.is_playing());
}

#[test]
fn test_stale_tag_resolution_is_discarded() {
    let (mut controller, _) = make_controller(2);
    let removed = controller.remove_at(1).unwrap();

    let tags = TagInfo {
        title: Some("Late Arrival".to_string()),
        ..TagInfo::default()
    };
    controller.apply_tags(removed.id, tags);

    assert!(controller.playlist().iter().all(|s| s.title != "Late Arrival"));
}

#[test]
fn test_tag_resolution_updates_surviving_song() {
    let (mut controller, _) = make_controller(2);
    let id = controller.current_song().unwrap().id;

    let tags = TagInfo {
        title: Some("Proper Title".to_string()),
        artist: Some("Proper Artist".to_string()),
        ..TagInfo::default()
    };
    controller.apply_tags(id, tags);

    let song = controller.current_song().unwrap();
    assert_eq!(song.title, "Proper Title");
    assert_eq!(song.artist, "Proper Artist");
}
