use crate::history::History;
use crate::model::{MAX_RATING, RepeatMode, SkipPolicy, Track};
use crate::shuffle::ShuffleQueue;
use crate::validate::TrackValidator;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Pressing "previous" after this much playback restarts the current track
/// instead of navigating away.
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Result of a successful navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The current index changed; load the track at this index.
    Moved(usize),
    /// Keep the current track, seek to position 0 and resume.
    Restart,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("playlist is empty")]
    EmptyPlaylist,
    #[error("track {index} is out of range ({len} tracks)")]
    OutOfRange { index: usize, len: usize },
    #[error("cannot play {}: {reason}", .path.display())]
    TrackInvalid {
        index: usize,
        path: PathBuf,
        reason: String,
    },
    #[error("no playable track in this direction")]
    AllTracksInvalid,
}

/// The playlist navigation engine: an ordered track list, a current index,
/// and the mode state that decides where "next" and "previous" land.
///
/// The state machine is the cross product of shuffle on/off and
/// `RepeatMode`; every transition is triggered by one of `next`, `prev`,
/// `jump_to` or `on_track_ended`. The `_validated` variants wrap the same
/// transitions in the corrupted-track retry loop.
#[derive(Debug)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
    repeat: RepeatMode,
    skip_policy: SkipPolicy,
    shuffle: ShuffleQueue,
    history: History,
    corrupted: BTreeSet<usize>,
    rng: SmallRng,
}

impl Playlist {
    pub fn new() -> Self {
        Self::from_rng(rand::make_rng())
    }

    /// Deterministic construction for tests: same seed, same shuffle walk.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            repeat: RepeatMode::None,
            skip_policy: SkipPolicy::Interactive,
            shuffle: ShuffleQueue::new(),
            history: History::new(),
            corrupted: BTreeSet::new(),
            rng,
        }
    }

    /// Installs the result of a fresh scan. Navigation state tied to the old
    /// track list (history, corrupted set, shuffle walk) is discarded; the
    /// active modes survive, and shuffle re-anchors at the first track.
    pub fn replace_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current = (!self.tracks.is_empty()).then_some(0);
        self.history.reset();
        self.corrupted.clear();
        if self.shuffle.is_enabled() {
            self.shuffle.enable(self.current.unwrap_or(0));
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current?)
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    pub fn set_skip_policy(&mut self, policy: SkipPolicy) {
        self.skip_policy = policy;
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle.is_enabled()
    }

    /// Enabling anchors the shuffle walk at the current track; disabling
    /// keeps `current` where it is. Re-asserting the active state is a no-op
    /// so an already-explored walk is not thrown away.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled == self.shuffle.is_enabled() {
            return;
        }
        if enabled {
            self.shuffle.enable(self.current.unwrap_or(0));
        } else {
            self.shuffle.disable();
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn is_corrupted(&self, index: usize) -> bool {
        self.corrupted.contains(&index)
    }

    pub fn corrupted(&self) -> &BTreeSet<usize> {
        &self.corrupted
    }

    pub fn mark_corrupted(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.corrupted.insert(index)
    }

    /// Advances to the next track according to the active modes.
    pub fn next(&mut self) -> Result<Navigation, NavError> {
        self.step_forward().map(Navigation::Moved)
    }

    /// Moves backward, unless `position` says the current track has played
    /// past the restart threshold, in which case the track restarts instead.
    pub fn prev(&mut self, position: Duration) -> Result<Navigation, NavError> {
        if self.tracks.is_empty() {
            return Err(NavError::EmptyPlaylist);
        }
        if position > RESTART_THRESHOLD {
            return Ok(Navigation::Restart);
        }
        self.step_back().map(Navigation::Moved)
    }

    /// Explicit selection (a double-clicked row). Records the departure
    /// point for "go back", and under shuffle restarts exploration from the
    /// chosen track.
    pub fn jump_to(&mut self, index: usize) -> Result<Navigation, NavError> {
        if self.tracks.is_empty() {
            return Err(NavError::EmptyPlaylist);
        }
        if index >= self.tracks.len() {
            return Err(NavError::OutOfRange {
                index,
                len: self.tracks.len(),
            });
        }

        if let Some(current) = self.current {
            self.history.record_jump(current);
        }
        self.current = Some(index);
        self.shuffle.reset_anchor(index);
        Ok(Navigation::Moved(index))
    }

    /// Redoes a jump undone by a linear-mode "previous".
    pub fn go_forward(&mut self) -> Option<usize> {
        let current = self.current?;
        let index = self.history.go_forward(current)?;
        self.current = Some(index);
        Some(index)
    }

    /// End-of-media event from the player.
    pub fn on_track_ended(&mut self) -> Result<Navigation, NavError> {
        if self.tracks.is_empty() {
            return Err(NavError::EmptyPlaylist);
        }
        if self.repeat == RepeatMode::One {
            return Ok(Navigation::Restart);
        }
        self.next()
    }

    /// `next()` plus the corrupted-track retry loop.
    pub fn next_validated(
        &mut self,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        self.navigate_validated(Direction::Forward, validator)
    }

    /// `prev()` plus the corrupted-track retry loop. A restart triggered by
    /// the three-second rule is not validated: that track is already playing.
    pub fn prev_validated(
        &mut self,
        position: Duration,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        if self.tracks.is_empty() {
            return Err(NavError::EmptyPlaylist);
        }
        if position > RESTART_THRESHOLD {
            return Ok(Navigation::Restart);
        }
        self.navigate_validated(Direction::Backward, validator)
    }

    /// `jump_to()` plus validation of the chosen track; under auto-skip an
    /// invalid selection keeps searching forward from it.
    pub fn jump_to_validated(
        &mut self,
        index: usize,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        let origin = self.current;
        self.jump_to(index)?;
        self.settle_on_valid(origin, Direction::Forward, validator)
    }

    /// `on_track_ended()` plus the corrupted-track retry loop.
    pub fn on_track_ended_validated(
        &mut self,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        if self.tracks.is_empty() {
            return Err(NavError::EmptyPlaylist);
        }
        if self.repeat == RepeatMode::One {
            return Ok(Navigation::Restart);
        }
        self.navigate_validated(Direction::Forward, validator)
    }

    fn navigate_validated(
        &mut self,
        direction: Direction,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        let origin = self.current;
        self.step(direction)?;
        self.settle_on_valid(origin, direction, validator)
    }

    /// Validates the candidate at `current`, retrying in `direction` until a
    /// valid track is found. The retry loop is bounded by the playlist size
    /// and stops early once the search wraps back to `origin`; both exits
    /// restore the pre-navigation index. Under the interactive policy the
    /// first invalid candidate is reported instead of retried.
    fn settle_on_valid(
        &mut self,
        origin: Option<usize>,
        direction: Direction,
        validator: &dyn TrackValidator,
    ) -> Result<Navigation, NavError> {
        let mut attempts = 0;
        loop {
            let Some(index) = self.current else {
                return Err(NavError::EmptyPlaylist);
            };

            let reason = match self.check_track(index, validator) {
                Ok(()) => return Ok(Navigation::Moved(index)),
                Err(reason) => reason,
            };
            self.corrupted.insert(index);
            attempts += 1;

            if self.skip_policy == SkipPolicy::Interactive {
                return Err(NavError::TrackInvalid {
                    index,
                    path: self.tracks[index].path.clone(),
                    reason,
                });
            }

            if attempts >= self.tracks.len() {
                self.current = origin;
                return Err(NavError::AllTracksInvalid);
            }
            self.step(direction)?;
            if self.current == origin {
                return Err(NavError::AllTracksInvalid);
            }
        }
    }

    fn check_track(&self, index: usize, validator: &dyn TrackValidator) -> Result<(), String> {
        if self.corrupted.contains(&index) {
            return Err(String::from("previously failed validation"));
        }
        validator
            .validate(&self.tracks[index].path)
            .map_err(|err| err.to_string())
    }

    fn step(&mut self, direction: Direction) -> Result<usize, NavError> {
        match direction {
            Direction::Forward => self.step_forward(),
            Direction::Backward => self.step_back(),
        }
    }

    fn step_forward(&mut self) -> Result<usize, NavError> {
        let Some(current) = self.current else {
            return Err(NavError::EmptyPlaylist);
        };
        let len = self.tracks.len();

        let next = match (self.shuffle.is_enabled(), self.repeat) {
            (true, RepeatMode::None) | (true, RepeatMode::One) => self
                .shuffle
                .advance(1, len, &mut self.rng)
                .unwrap_or(current),
            // An explicit "next" escapes single-track repeat rather than
            // restarting; repeat-one only binds end-of-media.
            (false, RepeatMode::One) => (current + 1) % len,
            (false, RepeatMode::None) => (current + 1) % len,
        };

        self.history.clear_forward();
        self.current = Some(next);
        Ok(next)
    }

    fn step_back(&mut self) -> Result<usize, NavError> {
        let Some(current) = self.current else {
            return Err(NavError::EmptyPlaylist);
        };
        let len = self.tracks.len();

        let prev = if self.shuffle.is_enabled() {
            self.shuffle
                .advance(-1, len, &mut self.rng)
                .unwrap_or(current)
        } else if let Some(index) = self.history.go_back(current) {
            index
        } else {
            (current + len - 1) % len
        };

        self.current = Some(prev);
        Ok(prev)
    }

    /// Rates the current track. Out-of-range values are rejected with no
    /// state change; the caller persists the sidecar after a `true` return.
    pub fn set_current_rating(&mut self, rating: f64) -> bool {
        let Some(index) = self.current else {
            return false;
        };
        if !(0.0..=MAX_RATING).contains(&rating) {
            return false;
        }
        self.tracks[index].rating = rating;
        true
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}
