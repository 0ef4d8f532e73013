//! Debounce state machine between the classifier and the applier.

use tracing::debug;

use super::orientation::Orientation;

/// Tracks the committed orientation plus the in-flight candidate and its
/// consecutive-evidence tick count.
///
/// Owned and mutated by exactly one consumer task; samples reach it in
/// arrival order, so no locking is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceState {
    current: Orientation,
    candidate: Option<Orientation>,
    ticks: u32,
}

impl DebounceState {
    /// Start in the Normal orientation with no pending candidate.
    pub fn new() -> Self {
        Self {
            current: Orientation::Normal,
            candidate: None,
            ticks: 0,
        }
    }

    /// The last committed orientation.
    pub fn current(&self) -> Orientation {
        self.current
    }

    /// The pending candidate, if a change is being debounced.
    pub fn candidate(&self) -> Option<Orientation> {
        self.candidate
    }

    /// Feed one classified orientation into the debounce window.
    ///
    /// Returns `Some(orientation)` exactly when the candidate has been seen
    /// on strictly more than `max_ticks` consecutive follow-up samples; the
    /// candidate then becomes the committed orientation. A proposal equal to
    /// the committed orientation is ignored outright: it neither commits nor
    /// clears an in-flight candidate, so a single sample reverting to the
    /// current orientation does not restart the window.
    pub fn observe(&mut self, proposed: Orientation, max_ticks: u32) -> Option<Orientation> {
        if proposed == self.current {
            return None;
        }
        if self.candidate != Some(proposed) {
            debug!(candidate = %proposed, "new orientation candidate");
            self.candidate = Some(proposed);
            self.ticks = 0;
            return None;
        }
        self.ticks += 1;
        if self.ticks > max_ticks {
            self.current = proposed;
            self.candidate = None;
            self.ticks = 0;
            return Some(proposed);
        }
        None
    }

    /// Restore a previously committed orientation after a failed apply.
    /// Only called when rollback-on-failure is configured; the default
    /// policy keeps the commit regardless of the applier outcome.
    pub fn rollback(&mut self, previous: Orientation) {
        self.current = previous;
    }
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::new()
    }
}
