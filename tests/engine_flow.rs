use quaver::model::{SkipPolicy, Track};
use quaver::playlist::{Navigation, Playlist};
use quaver::validate::{TrackValidator, ValidationError};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn five_track_playlist() -> Playlist {
    let mut playlist = Playlist::with_seed(99);
    playlist.replace_tracks(
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| Track::from_path(PathBuf::from(format!("{name}.mp3"))))
            .collect(),
    );
    playlist
}

struct RejectC;

impl TrackValidator for RejectC {
    fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        if path == Path::new("c.mp3") {
            Err(ValidationError::Undecodable(String::from("truncated")))
        } else {
            Ok(())
        }
    }
}

#[test]
fn linear_cycle_returns_to_start() {
    let mut playlist = five_track_playlist();
    assert_eq!(playlist.current_index(), Some(0));

    let mut visited = Vec::new();
    for _ in 0..5 {
        match playlist.next().expect("next") {
            Navigation::Moved(index) => visited.push(index),
            Navigation::Restart => unreachable!(),
        }
    }

    assert_eq!(visited, vec![1, 2, 3, 4, 0]);
    assert_eq!(playlist.current_index(), Some(0));
}

#[test]
fn shuffle_back_step_replays_the_first_advance() {
    let mut playlist = five_track_playlist();
    playlist.set_shuffle(true);

    let first = match playlist.next().expect("next") {
        Navigation::Moved(index) => index,
        Navigation::Restart => unreachable!(),
    };
    playlist.next().expect("next");

    assert_eq!(playlist.prev(Duration::ZERO), Ok(Navigation::Moved(first)));
}

#[test]
fn early_prev_steps_back_without_history() {
    let mut playlist = five_track_playlist();
    playlist.next().expect("next");
    playlist.next().expect("next");
    assert_eq!(playlist.current_index(), Some(2));

    assert_eq!(
        playlist.prev(Duration::from_millis(500)),
        Ok(Navigation::Moved(1))
    );
}

#[test]
fn auto_skip_jumps_over_the_broken_track() {
    let mut playlist = five_track_playlist();
    playlist.set_skip_policy(SkipPolicy::AutoSkip);
    playlist.jump_to(1).expect("jump to b");

    assert_eq!(
        playlist.next_validated(&RejectC),
        Ok(Navigation::Moved(3))
    );
    assert!(playlist.is_corrupted(2));
    assert_eq!(playlist.corrupted().len(), 1);
}

#[test]
fn ratings_survive_a_rescan_through_the_sidecar() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sidecar = dir.path().join("ratings.txt");

    let mut playlist = five_track_playlist();
    playlist.jump_to(2).expect("jump");
    assert!(playlist.set_current_rating(4.0));
    quaver::ratings::save(playlist.tracks(), &sidecar).expect("save");

    // Simulate a fresh scan of the same files.
    let mut rescanned: Vec<Track> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| Track::from_path(PathBuf::from(format!("{name}.mp3"))))
        .collect();
    let saved = quaver::ratings::load(&sidecar).expect("load");
    quaver::ratings::apply(&mut rescanned, &saved);
    playlist.replace_tracks(rescanned);

    let ratings: Vec<f64> = playlist.tracks().iter().map(|track| track.rating).collect();
    assert_eq!(ratings, vec![0.0, 0.0, 4.0, 0.0, 0.0]);
}
