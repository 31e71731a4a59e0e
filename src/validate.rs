use crate::library;
use crate::model;
use rodio::Decoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Tracks shorter than this are treated as broken files.
pub const MIN_TRACK_DURATION: Duration = Duration::from_secs(1);

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file does not exist")]
    Missing,
    #[error("file is empty (0 bytes)")]
    Empty,
    #[error("unsupported audio format")]
    UnsupportedFormat,
    #[error("could not determine track duration")]
    UnknownDuration,
    #[error("track is shorter than one second")]
    TooShort,
    #[error("failed to decode: {0}")]
    Undecodable(String),
}

/// Boundary the navigation engine consults before handing a track to the
/// audio engine. Implementations may block for bounded I/O but must return
/// within their internal timeout; cancellation mid-probe is not supported.
pub trait TrackValidator {
    fn validate(&self, path: &Path) -> Result<(), ValidationError>;
}

/// Production validator: cheap filesystem checks first, then a decoder
/// probe on a helper thread so a wedged codec cannot stall navigation past
/// the timeout.
pub struct DecoderValidator {
    probe_timeout: Duration,
}

impl DecoderValidator {
    pub fn new() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }
}

impl Default for DecoderValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackValidator for DecoderValidator {
    fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        let metadata = fs::metadata(path).map_err(|_| ValidationError::Missing)?;
        if !metadata.is_file() {
            return Err(ValidationError::Missing);
        }
        if metadata.len() == 0 {
            return Err(ValidationError::Empty);
        }
        if !model::is_audio_file(path) {
            return Err(ValidationError::UnsupportedFormat);
        }

        let (sender, receiver) = mpsc::channel();
        let probe_path: PathBuf = path.to_path_buf();
        thread::spawn(move || {
            let _ = sender.send(probe_track(&probe_path));
        });

        match receiver.recv_timeout(self.probe_timeout) {
            Ok(result) => result,
            Err(_) => Err(ValidationError::Undecodable(String::from(
                "decoder timed out",
            ))),
        }
    }
}

fn probe_track(path: &Path) -> Result<(), ValidationError> {
    let duration = library::track_duration(path).ok_or(ValidationError::UnknownDuration)?;
    if duration < MIN_TRACK_DURATION {
        return Err(ValidationError::TooShort);
    }

    let file = File::open(path).map_err(|err| ValidationError::Undecodable(err.to_string()))?;
    Decoder::try_from(file).map_err(|err| ValidationError::Undecodable(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_rejected() {
        let validator = DecoderValidator::new();
        let verdict = validator.validate(Path::new("/no/such/track.mp3"));
        assert_eq!(verdict, Err(ValidationError::Missing));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty.mp3");
        File::create(&path).expect("create");

        let validator = DecoderValidator::new();
        assert_eq!(validator.validate(&path), Err(ValidationError::Empty));
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        let mut file = File::create(&path).expect("create");
        file.write_all(b"not audio").expect("write");

        let validator = DecoderValidator::new();
        assert_eq!(
            validator.validate(&path),
            Err(ValidationError::UnsupportedFormat)
        );
    }

    #[test]
    fn garbage_audio_file_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("garbage.mp3");
        let mut file = File::create(&path).expect("create");
        file.write_all(&[0xDE, 0xAD, 0xBE, 0xEF]).expect("write");

        let validator = DecoderValidator::new();
        assert!(validator.validate(&path).is_err());
    }
}
