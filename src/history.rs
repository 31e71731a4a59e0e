/// Back/forward stacks for undoing explicit jumps, independent of the
/// active playback mode. Pure LIFO; the only failure mode is emptiness.
#[derive(Debug, Default)]
pub struct History {
    back: Vec<usize>,
    forward: Vec<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the user deliberately left `from`. Any redo trail is
    /// invalidated by a fresh jump.
    pub fn record_jump(&mut self, from: usize) {
        self.back.push(from);
        self.forward.clear();
    }

    /// Pops the most recent origin, remembering `leaving` so the move can be
    /// redone. `None` when there is nothing to go back to.
    pub fn go_back(&mut self, leaving: usize) -> Option<usize> {
        let index = self.back.pop()?;
        self.forward.push(leaving);
        Some(index)
    }

    pub fn go_forward(&mut self, leaving: usize) -> Option<usize> {
        let index = self.forward.pop()?;
        self.back.push(leaving);
        Some(index)
    }

    /// Forward-only advances (next track, auto-advance) invalidate the redo
    /// trail without recording an undo entry.
    pub fn clear_forward(&mut self) {
        self.forward.clear();
    }

    pub fn reset(&mut self) {
        self.back.clear();
        self.forward.clear();
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_and_forward_round_trip() {
        let mut history = History::new();
        history.record_jump(2);

        assert_eq!(history.go_back(7), Some(2));
        assert!(history.can_go_forward());
        assert_eq!(history.go_forward(2), Some(7));
        assert!(!history.can_go_forward());
    }

    #[test]
    fn jump_clears_forward_trail() {
        let mut history = History::new();
        history.record_jump(0);
        history.go_back(5);
        assert!(history.can_go_forward());

        history.record_jump(1);
        assert!(!history.can_go_forward());
        assert!(history.can_go_back());
    }

    #[test]
    fn empty_stacks_return_none() {
        let mut history = History::new();
        assert_eq!(history.go_back(0), None);
        assert_eq!(history.go_forward(0), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut history = History::new();
        history.record_jump(1);
        history.record_jump(2);
        history.go_back(3);

        history.reset();
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }
}
