use crate::model::{MAX_RATING, Track};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat sidecar file: one `path|rating` line per rated track, UTF-8,
/// newline-terminated, no header. Scan order changes between sessions, so
/// ratings key on the path rather than the index.

/// A missing file is "no ratings yet", not an error. Malformed lines and
/// ratings outside `[0, 5]` are skipped.
pub fn load(path: &Path) -> Result<HashMap<PathBuf, f64>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ratings file {}", path.display()))?;

    let mut ratings = HashMap::new();
    for line in raw.lines() {
        let Some((track_path, value)) = line.rsplit_once('|') else {
            continue;
        };
        let Ok(rating) = value.trim().parse::<f64>() else {
            continue;
        };
        if track_path.is_empty() || !(0.0..=MAX_RATING).contains(&rating) {
            continue;
        }
        ratings.insert(PathBuf::from(track_path), rating);
    }
    Ok(ratings)
}

/// Writes every rated track in traversal order. Rating 0 means "unrated"
/// and is omitted to keep the file small.
pub fn save(tracks: &[Track], path: &Path) -> Result<()> {
    let mut contents = String::new();
    for track in tracks {
        if track.is_rated() {
            contents.push_str(&format!(
                "{}|{}\n",
                track.path.display(),
                track.rating
            ));
        }
    }

    fs::write(path, contents)
        .with_context(|| format!("failed to write ratings file {}", path.display()))
}

/// Re-applies loaded ratings onto a freshly scanned track list. Tracks
/// absent from the map keep rating 0.
pub fn apply(tracks: &mut [Track], ratings: &HashMap<PathBuf, f64>) {
    for track in tracks {
        if let Some(rating) = ratings.get(&track.path) {
            track.rating = *rating;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn track(name: &str, rating: f64) -> Track {
        let mut track = Track::from_path(PathBuf::from(format!("/music/{name}.mp3")));
        track.rating = rating;
        track
    }

    #[test]
    fn save_load_apply_round_trip() {
        let dir = tempdir().expect("tempdir");
        let sidecar = dir.path().join("ratings.txt");

        let rated = vec![track("a", 4.5), track("b", 0.0), track("c", 1.0)];
        save(&rated, &sidecar).expect("save");

        let loaded = load(&sidecar).expect("load");
        let mut fresh = vec![track("a", 0.0), track("b", 0.0), track("c", 0.0)];
        apply(&mut fresh, &loaded);

        assert_eq!(fresh[0].rating, 4.5);
        assert_eq!(fresh[1].rating, 0.0);
        assert_eq!(fresh[2].rating, 1.0);
    }

    #[test]
    fn unrated_tracks_are_omitted_from_the_file() {
        let dir = tempdir().expect("tempdir");
        let sidecar = dir.path().join("ratings.txt");

        save(&[track("a", 0.0), track("b", 3.0)], &sidecar).expect("save");
        let contents = fs::read_to_string(&sidecar).expect("read");

        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("/music/b.mp3|3"));
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn missing_file_means_no_ratings() {
        let dir = tempdir().expect("tempdir");
        let loaded = load(&dir.path().join("nope.txt")).expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let sidecar = dir.path().join("ratings.txt");
        fs::write(
            &sidecar,
            "/music/a.mp3|4.5\nno separator here\n/music/b.mp3|not a number\n|2.0\n/music/c.mp3|9.5\n/music/d.mp3|2\n",
        )
        .expect("write");

        let loaded = load(&sidecar).expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(Path::new("/music/a.mp3")), Some(&4.5));
        assert_eq!(loaded.get(Path::new("/music/d.mp3")), Some(&2.0));
    }

    #[test]
    fn unmatched_paths_keep_zero_rating() {
        let mut tracks = vec![track("a", 0.0)];
        let mut loaded = HashMap::new();
        loaded.insert(PathBuf::from("/music/other.mp3"), 5.0);

        apply(&mut tracks, &loaded);
        assert_eq!(tracks[0].rating, 0.0);
    }
}
