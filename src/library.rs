use crate::config;
use crate::model::{self, Track};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;
use walkdir::WalkDir;

#[derive(Default)]
struct TrackMetadata {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    genre: Option<String>,
    year: Option<u32>,
}

/// Walks `root` and returns every supported audio file as a track, sorted
/// by path so scan order is stable across runs. Ratings are applied
/// separately from the sidecar.
pub fn scan_folder(root: &Path) -> Vec<Track> {
    let mut tracks = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !model::is_audio_file(path) {
            continue;
        }

        let cleaned = config::strip_windows_verbatim_prefix(path);
        let mut track = Track::from_path(cleaned);
        let metadata = probe_metadata(&track.path);
        if let Some(title) = metadata.title.filter(|title| !title.trim().is_empty()) {
            track.title = title;
        }
        if metadata.artist.is_some() {
            track.artist = metadata.artist;
        }
        track.album = metadata.album;
        track.genre = metadata.genre;
        track.year = metadata.year;
        tracks.push(track);
    }

    tracks.sort_by(|a, b| a.path.cmp(&b.path));
    tracks
}

pub fn scan_many(roots: &[PathBuf]) -> Vec<Track> {
    let mut tracks = Vec::new();
    for root in roots {
        tracks.append(&mut scan_folder(root));
    }
    tracks.sort_by(|a, b| a.path.cmp(&b.path));
    tracks.dedup_by(|a, b| a.path == b.path);
    tracks
}

fn probe_metadata(path: &Path) -> TrackMetadata {
    let Ok(file) = File::open(path) else {
        return TrackMetadata::default();
    };
    let source = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(OsStr::to_str) {
        hint.with_extension(extension);
    }

    let Ok(mut probed) = get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) else {
        return TrackMetadata::default();
    };

    let metadata = probed.format.metadata();
    let Some(revision) = metadata.current() else {
        return TrackMetadata::default();
    };

    let tags = revision.tags();
    let title = tag_value(tags, StandardTagKey::TrackTitle, &["title"]);
    let artist = tag_value(
        tags,
        StandardTagKey::Artist,
        &["artist", "albumartist", "album_artist"],
    );
    let album = tag_value(tags, StandardTagKey::Album, &["album"]);
    let genre = tag_value(tags, StandardTagKey::Genre, &["genre"]);
    let year = tag_value(tags, StandardTagKey::Date, &["date", "year", "originaldate"])
        .and_then(|value| parse_year(&value));

    TrackMetadata {
        title,
        artist,
        album,
        genre,
        year,
    }
}

/// Total decoded duration reported by the container, if the codec knows it.
pub fn track_duration(path: &Path) -> Option<Duration> {
    let stripped = config::strip_windows_verbatim_prefix(path);

    let file = File::open(&stripped).ok()?;
    let source = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = stripped.extension().and_then(OsStr::to_str) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let codec_params = &probed.format.default_track()?.codec_params;

    if let (Some(time_base), Some(frame_count)) = (codec_params.time_base, codec_params.n_frames) {
        let time = time_base.calc_time(frame_count);
        return Some(Duration::from_secs_f64(time.seconds as f64 + time.frac));
    }

    codec_params
        .n_frames
        .zip(codec_params.sample_rate)
        .filter(|(_, sample_rate)| *sample_rate > 0)
        .map(|(frame_count, sample_rate)| {
            Duration::from_secs_f64(frame_count as f64 / f64::from(sample_rate))
        })
}

fn tag_value(
    tags: &[symphonia::core::meta::Tag],
    standard_key: StandardTagKey,
    fallback_keys: &[&str],
) -> Option<String> {
    let from_standard = tags
        .iter()
        .find(|tag| tag.std_key == Some(standard_key))
        .map(|tag| tag.value.to_string());

    let from_fallback = || {
        tags.iter()
            .find(|tag| {
                fallback_keys
                    .iter()
                    .any(|key| tag.key.eq_ignore_ascii_case(key))
            })
            .map(|tag| tag.value.to_string())
    };

    from_standard.or_else(from_fallback).and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then_some(trimmed.to_string())
    })
}

/// Accepts either a bare year or a date string with a leading year
/// ("1959-08-17").
fn parse_year(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_year_handles_dates_and_bare_years() {
        assert_eq!(parse_year("1959"), Some(1959));
        assert_eq!(parse_year("1959-08-17"), Some(1959));
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("59"), None);
    }

    #[test]
    fn scan_skips_non_audio_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("cover.jpg"), b"jpg").expect("write");
        fs::write(dir.path().join("notes.txt"), b"txt").expect("write");
        fs::write(dir.path().join("one.mp3"), b"mp3").expect("write");
        fs::write(dir.path().join("two.flac"), b"flac").expect("write");

        let tracks = scan_folder(dir.path());
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|track| model::is_audio_file(&track.path)));
    }

    #[test]
    fn scan_output_is_sorted_by_path() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("b.mp3"), b"x").expect("write");
        fs::write(dir.path().join("a.mp3"), b"x").expect("write");

        let tracks = scan_folder(dir.path());
        let names: Vec<_> = tracks
            .iter()
            .filter_map(|track| track.path.file_name().and_then(OsStr::to_str))
            .collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3"]);
    }

    #[test]
    fn scan_many_deduplicates_overlapping_roots() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"x").expect("write");

        let roots = vec![dir.path().to_path_buf(), dir.path().to_path_buf()];
        let tracks = scan_many(&roots);
        assert_eq!(tracks.len(), 1);
    }

    #[test]
    fn unreadable_metadata_falls_back_to_filename() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("Artist - Song.mp3"), b"not real mp3 data").expect("write");

        let tracks = scan_folder(dir.path());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Song");
        assert_eq!(tracks[0].artist.as_deref(), Some("Artist"));
    }
}
