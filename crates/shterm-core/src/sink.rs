//! Output boundary: screen changes handed to the host as they happen.

use crate::cell::Cell;

/// A committed screen mutation.
///
/// Rows are viewport rows of the screen that changed; while the alternate
/// screen is active they address the alternate screen.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScreenChange {
    /// A cell was stored (glyph, placeholder, or blank from wide-glyph fixups).
    CellWritten { row: u16, col: u16, cell: Cell },
    /// A new line was appended at logical `index`.
    LineAppended { index: usize },
    /// Columns `start..end` of `row` were blanked. `end == None` means to the
    /// end of the line.
    LineCleared {
        row: u16,
        start: u16,
        end: Option<u16>,
    },
    /// Every line from logical index `from` onwards was removed.
    LinesRemoved { from: usize },
    /// The viewport now starts at logical line `top`.
    ViewportScrolled { top: usize },
    /// `count` lines were dropped from the top of the scrollback.
    LinesEvicted { count: usize },
    /// The alternate screen became active (`true`) or was discarded.
    AltScreen { active: bool },
    Resized { rows: u16, cols: u16 },
    /// Changes were dropped because nobody drained them; re-read the whole
    /// screen instead of replaying.
    Resync,
}

/// Receiver of screen changes.
///
/// Called synchronously from [`Screen::write`](crate::Screen::write); a slow
/// sink stalls the writer.
pub trait OutputSink {
    fn notify(&mut self, change: ScreenChange);
}

impl OutputSink for Vec<ScreenChange> {
    fn notify(&mut self, change: ScreenChange) {
        self.push(change);
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn notify(&mut self, change: ScreenChange) {
        (**self).notify(change);
    }
}

/// Sink that drops every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn notify(&mut self, _change: ScreenChange) {}
}

/// Change buffer holding at most `capacity` entries.
///
/// On overflow the buffered changes are replaced by a single
/// [`ScreenChange::Resync`] and later changes are discarded until
/// [`take`](Self::take) drains the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeQueue {
    changes: Vec<ScreenChange>,
    capacity: usize,
    overflowed: bool,
}

impl ChangeQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            changes: Vec::new(),
            capacity: capacity.max(1),
            overflowed: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Whether changes were dropped since the last drain.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drain buffered changes and start recording again.
    pub fn take(&mut self) -> Vec<ScreenChange> {
        self.overflowed = false;
        std::mem::take(&mut self.changes)
    }
}

impl OutputSink for ChangeQueue {
    fn notify(&mut self, change: ScreenChange) {
        if self.overflowed {
            return;
        }
        if self.changes.len() >= self.capacity {
            crate::warn!(
                capacity = self.capacity,
                "change queue full, dropping buffered changes"
            );
            self.changes.clear();
            self.changes.push(ScreenChange::Resync);
            self.overflowed = true;
            return;
        }
        self.changes.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appended(index: usize) -> ScreenChange {
        ScreenChange::LineAppended { index }
    }

    #[test]
    fn queue_records_until_capacity() {
        let mut queue = ChangeQueue::new(3);
        for i in 0..3 {
            queue.notify(appended(i));
        }
        assert!(!queue.overflowed());
        assert_eq!(queue.take(), vec![appended(0), appended(1), appended(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_collapses_to_resync() {
        let mut queue = ChangeQueue::new(2);
        for i in 0..10 {
            queue.notify(appended(i));
        }
        assert!(queue.overflowed());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take(), vec![ScreenChange::Resync]);

        queue.notify(appended(11));
        assert!(!queue.overflowed());
        assert_eq!(queue.take(), vec![appended(11)]);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut queue = ChangeQueue::new(0);
        queue.notify(appended(0));
        assert_eq!(queue.len(), 1);
    }
}
