use crate::config;
use crate::library;
use crate::model::{MAX_RATING, PersistedState, SkipPolicy, Track};
use crate::playlist::{Direction, NavError, Navigation, Playlist};
use crate::ratings;
use crate::validate::{DecoderValidator, TrackValidator};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the event loop should do to the audio engine after a navigation
/// call: load a new source, or restart the one already playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreAction {
    Load(PathBuf),
    Restart,
}

/// An invalid track waiting for a user decision (interactive skip policy).
#[derive(Debug, Clone)]
pub struct BadTrack {
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadTrackDecision {
    SkipOnce,
    SkipAlways,
    Stop,
}

/// Application state behind the UI: the playlist engine, the scanned
/// folder roots, the table selection, and the status line. Every UI event
/// lands here; the caller feeds returned `CoreAction`s to the audio engine
/// and repaints when `dirty` is set.
pub struct PlayerCore {
    pub folders: Vec<PathBuf>,
    pub playlist: Playlist,
    pub selected: usize,
    pub status: String,
    pub dirty: bool,
    pub saved_volume: f32,
    validator: Box<dyn TrackValidator>,
    pending_bad_track: Option<BadTrack>,
}

impl PlayerCore {
    pub fn from_persisted(state: PersistedState) -> Self {
        let mut tracks = library::scan_many(&state.folders);
        apply_saved_ratings(&mut tracks);

        let mut playlist = Playlist::new();
        playlist.set_repeat(state.repeat_mode);
        playlist.set_skip_policy(state.skip_policy);
        playlist.replace_tracks(tracks);
        playlist.set_shuffle(state.shuffle);

        Self {
            folders: state.folders,
            playlist,
            selected: 0,
            status: String::from("Ready"),
            dirty: true,
            saved_volume: state.saved_volume,
            validator: Box::new(DecoderValidator::new()),
            pending_bad_track: None,
        }
    }

    /// Swaps the validator boundary; tests install stubs here.
    pub fn set_validator(&mut self, validator: Box<dyn TrackValidator>) {
        self.validator = validator;
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            folders: self.folders.clone(),
            repeat_mode: self.playlist.repeat(),
            shuffle: self.playlist.is_shuffled(),
            skip_policy: self.playlist.skip_policy(),
            saved_volume: self.saved_volume,
        }
    }

    pub fn save(&mut self) -> Result<()> {
        config::save_state(&self.persisted_state())?;
        self.set_status("State saved");
        Ok(())
    }

    pub fn add_folder(&mut self, input: &Path) {
        let normalized = config::normalize_path(input);
        if self.folders.iter().any(|folder| folder == &normalized) {
            self.set_status("Folder already added");
            return;
        }

        self.folders.push(normalized);
        let before = self.playlist.len();
        self.rescan();
        let added = self.playlist.len().saturating_sub(before);
        self.set_status(&format!("Added folder with {added} tracks"));
    }

    /// Full rescan: rebuilds the track list from every folder root,
    /// re-applies sidecar ratings, and resets navigation state tied to the
    /// old list. Active modes survive.
    pub fn rescan(&mut self) {
        let mut tracks = library::scan_many(&self.folders);
        apply_saved_ratings(&mut tracks);
        self.playlist.replace_tracks(tracks);
        self.selected = 0;
        self.pending_bad_track = None;
        self.set_status("Library rescanned");
    }

    pub fn select_next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.playlist.len() - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.dirty = true;
    }

    /// Explicit selection of the highlighted row.
    pub fn play_selected(&mut self) -> Option<CoreAction> {
        let result = self
            .playlist
            .jump_to_validated(self.selected, self.validator.as_ref());
        self.handle_navigation(result, Direction::Forward)
    }

    pub fn next_track(&mut self) -> Option<CoreAction> {
        let result = self.playlist.next_validated(self.validator.as_ref());
        self.handle_navigation(result, Direction::Forward)
    }

    /// `position` is how far the current track has played; past the restart
    /// threshold this restarts it instead of navigating.
    pub fn prev_track(&mut self, position: Duration) -> Option<CoreAction> {
        let result = self
            .playlist
            .prev_validated(position, self.validator.as_ref());
        self.handle_navigation(result, Direction::Backward)
    }

    pub fn go_forward(&mut self) -> Option<CoreAction> {
        let Some(index) = self.playlist.go_forward() else {
            self.set_status("Nothing to go forward to");
            return None;
        };
        self.finish_move(index)
    }

    /// End-of-media notification from the audio engine.
    pub fn on_track_ended(&mut self) -> Option<CoreAction> {
        let result = self
            .playlist
            .on_track_ended_validated(self.validator.as_ref());
        self.handle_navigation(result, Direction::Forward)
    }

    pub fn toggle_shuffle(&mut self) {
        let enabled = !self.playlist.is_shuffled();
        self.playlist.set_shuffle(enabled);
        self.set_status(if enabled { "Shuffle on" } else { "Shuffle off" });
    }

    pub fn cycle_repeat(&mut self) {
        let mode = self.playlist.repeat().next();
        self.playlist.set_repeat(mode);
        self.set_status(&format!("Repeat: {}", mode.label()));
    }

    pub fn toggle_skip_policy(&mut self) {
        let policy = self.playlist.skip_policy().toggle();
        self.playlist.set_skip_policy(policy);
        self.set_status(&format!("Bad tracks: {}", policy.label()));
    }

    /// Rates the current track and persists the sidecar immediately.
    pub fn rate_current(&mut self, rating: f64) {
        if !self.playlist.set_current_rating(rating) {
            self.set_status(&format!("Rating must be between 0 and {MAX_RATING:.0}"));
            return;
        }

        match self.save_ratings() {
            Ok(()) => self.set_status(&format!("Rated {rating:.1}/5")),
            Err(err) => self.set_status(&format!("rating save error: {err:#}")),
        }
    }

    pub fn pending_bad_track(&self) -> Option<&BadTrack> {
        self.pending_bad_track.as_ref()
    }

    /// Applies the user's decision about the reported invalid track.
    pub fn resolve_bad_track(&mut self, decision: BadTrackDecision) -> Option<CoreAction> {
        let pending = self.pending_bad_track.take()?;
        self.dirty = true;

        match decision {
            BadTrackDecision::Stop => {
                self.set_status("Playback stopped");
                None
            }
            BadTrackDecision::SkipAlways => {
                self.playlist.set_skip_policy(SkipPolicy::AutoSkip);
                self.continue_navigation(pending.direction)
            }
            BadTrackDecision::SkipOnce => self.continue_navigation(pending.direction),
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.current()
    }

    fn continue_navigation(&mut self, direction: Direction) -> Option<CoreAction> {
        let result = match direction {
            Direction::Forward => self.playlist.next_validated(self.validator.as_ref()),
            Direction::Backward => self
                .playlist
                .prev_validated(Duration::ZERO, self.validator.as_ref()),
        };
        self.handle_navigation(result, direction)
    }

    fn handle_navigation(
        &mut self,
        result: Result<Navigation, NavError>,
        direction: Direction,
    ) -> Option<CoreAction> {
        self.dirty = true;
        match result {
            Ok(Navigation::Moved(index)) => self.finish_move(index),
            Ok(Navigation::Restart) => {
                self.set_status("Restarting track");
                Some(CoreAction::Restart)
            }
            Err(NavError::TrackInvalid {
                index,
                path,
                reason,
            }) => {
                self.set_status("Track failed validation");
                self.pending_bad_track = Some(BadTrack {
                    index,
                    path,
                    reason,
                    direction,
                });
                None
            }
            Err(err) => {
                self.set_status(&err.to_string());
                None
            }
        }
    }

    fn finish_move(&mut self, index: usize) -> Option<CoreAction> {
        self.selected = index;
        let track = self.playlist.track(index)?;
        let path = track.path.clone();
        let title = track.title.clone();
        self.set_status(&format!("Playing {title}"));
        Some(CoreAction::Load(path))
    }

    fn save_ratings(&self) -> Result<()> {
        config::ensure_config_dir()?;
        let path = config::ratings_path()?;
        ratings::save(self.playlist.tracks(), &path)
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

fn apply_saved_ratings(tracks: &mut [Track]) {
    let Ok(path) = config::ratings_path() else {
        return;
    };
    if let Ok(saved) = ratings::load(&path) {
        ratings::apply(tracks, &saved);
    }
}
