use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const MAX_RATING: f64 = 5.0;

/// Repeat behavior once the current track finishes. `None` wraps around at
/// the playlist edges, which is what a separate "repeat all" mode would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    #[default]
    None,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::One,
            Self::One => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "off",
            Self::One => "one",
        }
    }
}

/// What to do when navigation lands on a track that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SkipPolicy {
    /// Stop at the first invalid track and ask the user.
    #[default]
    Interactive,
    /// Keep searching in the same direction without asking.
    AutoSkip,
}

impl SkipPolicy {
    pub fn toggle(self) -> Self {
        match self {
            Self::Interactive => Self::AutoSkip,
            Self::AutoSkip => Self::Interactive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Interactive => "ask",
            Self::AutoSkip => "auto",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    #[serde(default)]
    pub rating: f64,
}

impl Track {
    /// Builds a track from its file path alone. A `"Artist - Title"` stem is
    /// split into both fields; anything else becomes the title as-is.
    /// Embedded metadata, when readable, overrides these guesses later.
    pub fn from_path(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("unknown")
            .to_string();

        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
                (Some(artist.trim().to_string()), title.trim().to_string())
            }
            _ => (None, stem),
        };

        Self {
            path,
            title,
            artist,
            album: None,
            genre: None,
            year: None,
            rating: 0.0,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub folders: Vec<PathBuf>,
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub skip_policy: SkipPolicy,
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
}

fn default_saved_volume() -> f32 {
    1.0
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            repeat_mode: RepeatMode::None,
            shuffle: false,
            skip_policy: SkipPolicy::Interactive,
            saved_volume: default_saved_volume(),
        }
    }
}

pub fn is_audio_file(path: &Path) -> bool {
    const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_splits_artist_and_title() {
        let track = Track::from_path(PathBuf::from("/music/Miles Davis - So What.mp3"));
        assert_eq!(track.artist.as_deref(), Some("Miles Davis"));
        assert_eq!(track.title, "So What");
        assert_eq!(track.rating, 0.0);
    }

    #[test]
    fn from_path_without_separator_keeps_stem_as_title() {
        let track = Track::from_path(PathBuf::from("/music/sowhat.flac"));
        assert_eq!(track.artist, None);
        assert_eq!(track.title, "sowhat");
    }

    #[test]
    fn repeat_mode_cycles() {
        assert_eq!(RepeatMode::None.next(), RepeatMode::One);
        assert_eq!(RepeatMode::One.next(), RepeatMode::None);
    }

    #[test]
    fn audio_extension_check_is_case_insensitive() {
        assert!(is_audio_file(Path::new("a.MP3")));
        assert!(is_audio_file(Path::new("b.Flac")));
        assert!(!is_audio_file(Path::new("c.txt")));
        assert!(!is_audio_file(Path::new("noext")));
    }
}
