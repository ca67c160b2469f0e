//! Terminal facade: scanner → interpreter → screen in one place.
//!
//! ```
//! use shterm_core::Terminal;
//!
//! let mut term = Terminal::new(24, 80);
//! term.feed_str("\x1b[31mRed\x1b[0m plain\r\n");
//! assert_eq!(term.screen().viewport_lines()[0], "Red plain");
//! ```

use std::collections::VecDeque;

use crate::config::{ConfigError, TerminalConfig};
use crate::event::TerminalEvent;
use crate::interpreter::Interpreter;
use crate::scanner::Scanner;
use crate::screen::Screen;
use crate::sink::{ChangeQueue, OutputSink, ScreenChange};
use crate::style::Style;

/// Changes buffered for [`Terminal::take_changes`] before the queue collapses
/// to [`ScreenChange::Resync`].
pub const MAX_QUEUED_CHANGES: usize = 1 << 16;

/// Passthrough events buffered for [`Terminal::take_passthrough`]; the oldest
/// are dropped beyond this.
pub const MAX_QUEUED_PASSTHROUGH: usize = 1024;

/// A complete terminal engine instance.
///
/// Chunks must be fed in arrival order; the scanner residue, running style
/// and cursor carry over from one call to the next.
///
/// [`feed`](Self::feed) and [`feed_str`](Self::feed_str) buffer changes and
/// passthrough events; hosts drain them with [`take_changes`](Self::take_changes)
/// and [`take_passthrough`](Self::take_passthrough) after each feed. Both
/// buffers are bounded.
#[derive(Debug, Clone)]
pub struct Terminal {
    config: TerminalConfig,
    scanner: Scanner,
    interpreter: Interpreter,
    screen: Screen,
    /// Trailing bytes of an incomplete UTF-8 code point.
    utf8_carry: Vec<u8>,
    changes: ChangeQueue,
    passthrough: VecDeque<TerminalEvent>,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::from_config(TerminalConfig::default())
    }
}

impl Terminal {
    /// Create a terminal with the given viewport and default settings.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self::from_config(TerminalConfig::with_size(rows, cols))
    }

    /// Create a terminal after validating `config`.
    pub fn try_new(config: TerminalConfig) -> Result<Self, Vec<ConfigError>> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: TerminalConfig) -> Self {
        Self {
            config,
            scanner: Scanner::new(),
            interpreter: Interpreter::new(config.tab_width),
            screen: Screen::from_config(&config),
            utf8_carry: Vec::new(),
            changes: ChangeQueue::new(MAX_QUEUED_CHANGES),
            passthrough: VecDeque::new(),
        }
    }

    // ── Input Processing ────────────────────────────────────────────

    /// Feed raw bytes.
    ///
    /// A code point split across calls is completed on the next call;
    /// invalid sequences decode to U+FFFD.
    pub fn feed(&mut self, data: &[u8]) {
        let text = self.decode(data);
        if !text.is_empty() {
            self.feed_str(&text);
        }
    }

    /// Feed a string, recording screen changes for [`take_changes`](Self::take_changes)
    /// and unhandled sequences for [`take_passthrough`](Self::take_passthrough).
    pub fn feed_str(&mut self, chunk: &str) {
        let events = self.events(chunk);
        self.queue_passthrough(&events);
        self.screen.write(&events, &mut self.changes);
    }

    /// Feed a string, sending screen changes to `sink` instead.
    ///
    /// Nothing is buffered on this path; passthrough events are not kept.
    pub fn feed_with_sink<S: OutputSink + ?Sized>(&mut self, chunk: &str, sink: &mut S) {
        let events = self.events(chunk);
        self.screen.write(&events, sink);
    }

    fn events(&mut self, chunk: &str) -> Vec<TerminalEvent> {
        let span = crate::trace_span!("shterm.feed", len = chunk.len());
        let _guard = span.enter();
        let tokens = self.scanner.feed(chunk);
        self.interpreter.interpret_all(&tokens)
    }

    fn queue_passthrough(&mut self, events: &[TerminalEvent]) {
        for event in events.iter().filter(|event| event.is_passthrough()) {
            if self.passthrough.len() == MAX_QUEUED_PASSTHROUGH {
                self.passthrough.pop_front();
            }
            self.passthrough.push_back(event.clone());
        }
    }

    fn decode(&mut self, data: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.utf8_carry);
        buf.extend_from_slice(data);
        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.utf8_carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    // ── Host Control ────────────────────────────────────────────────

    /// Resize the viewport (and the alternate screen, if active).
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.screen.resize(rows, cols, &mut self.changes);
        self.config.rows = self.screen.rows();
        self.config.cols = self.screen.cols();
    }

    /// Back to the initial state, keeping the current size and settings.
    pub fn reset(&mut self) {
        *self = Self::from_config(self.config);
    }

    // ── State Inspection ────────────────────────────────────────────

    /// The primary screen. Use [`Screen::active`] for what is displayed.
    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Running SGR style.
    #[must_use]
    pub fn style(&self) -> &Style {
        self.interpreter.style()
    }

    #[must_use]
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Incomplete sequence waiting for the next chunk.
    #[must_use]
    pub fn residue(&self) -> &str {
        self.scanner.residue()
    }

    /// Drain recorded screen changes. A leading [`ScreenChange::Resync`]
    /// means changes were dropped and the screen should be re-read.
    pub fn take_changes(&mut self) -> Vec<ScreenChange> {
        self.changes.take()
    }

    /// Drain `Raw`/`Other` events the screen did not act on, oldest first.
    pub fn take_passthrough(&mut self) -> Vec<TerminalEvent> {
        self.passthrough.drain(..).collect()
    }

    // ── Query Responses ─────────────────────────────────────────────

    /// Cursor position report for the displayed screen.
    /// Format: `ESC [ row ; col R` (1-indexed).
    #[must_use]
    pub fn cpr_response(&self) -> Vec<u8> {
        let cursor = self.screen.active().cursor();
        format!("\x1b[{};{}R", cursor.row + 1, cursor.col + 1).into_bytes()
    }

    /// Primary device attributes (DA1) response.
    /// Reports as a VT220 with ANSI color.
    #[must_use]
    pub fn da1_response(&self) -> Vec<u8> {
        b"\x1b[?62;22c".to_vec()
    }
}
