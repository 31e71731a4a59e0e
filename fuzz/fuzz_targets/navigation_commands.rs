#![no_main]

use libfuzzer_sys::fuzz_target;
use quaver::model::{RepeatMode, Track};
use quaver::playlist::Playlist;
use std::path::PathBuf;
use std::time::Duration;

fuzz_target!(|data: &[u8]| {
    let mut playlist = Playlist::with_seed(0xDECAF);
    let len = (data.len() % 32).max(1);
    playlist.replace_tracks(
        (0..len)
            .map(|idx| Track::from_path(PathBuf::from(format!("track_{idx}.mp3"))))
            .collect(),
    );

    for byte in data {
        match byte % 8 {
            0 => {
                let _ = playlist.next();
            }
            1 => {
                let _ = playlist.prev(Duration::ZERO);
            }
            2 => {
                let _ = playlist.prev(Duration::from_millis(u64::from(*byte) * 100));
            }
            3 => {
                let _ = playlist.jump_to(usize::from(*byte));
            }
            4 => playlist.set_shuffle(!playlist.is_shuffled()),
            5 => playlist.set_repeat(RepeatMode::One),
            6 => playlist.set_repeat(RepeatMode::None),
            _ => {
                let _ = playlist.on_track_ended();
            }
        }

        if let Some(index) = playlist.current_index() {
            assert!(index < playlist.len());
        }
    }
});
