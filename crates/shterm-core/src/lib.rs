#![forbid(unsafe_code)]

//! Host-agnostic terminal engine.
//!
//! `shterm-core` turns the output of a pty or remote exec channel into a
//! stateful screen model, the way a VT100/xterm-class terminal would show it.
//!
//! # Pipeline
//!
//! - **Scanner**: splits arbitrarily chunked text into text runs and control
//!   sequences, holding back an incomplete trailing sequence as residue.
//! - **Style resolver**: SGR parameters to a cumulative [`Style`].
//! - **Interpreter**: tokens to [`TerminalEvent`]s; unsupported sequences
//!   pass through as `Raw`/`Other`.
//! - **Screen**: applies events to lines of cells with wrapping, scrollback,
//!   wide-glyph placeholders, a saved-cursor stack and an alternate buffer.
//! - **Sink**: receives every committed change as a [`ScreenChange`].
//!
//! [`Terminal`] wires the pieces together.
//!
//! # Design principles
//!
//! - **No I/O**: the host supplies bytes and renders changes.
//! - **Never fails on input**: malformed or unknown sequences degrade to
//!   passthrough events, out-of-range moves clamp.
//! - **Deterministic**: identical streams produce identical screens, however
//!   they are chunked.

pub mod cell;
pub mod config;
pub mod event;
pub mod interpreter;
pub mod logging;
pub mod scanner;
pub mod screen;
pub mod sink;
pub mod style;
pub mod terminal;

pub use cell::{Cell, CellFlags, Line, grapheme_width};
pub use config::{ConfigError, TerminalConfig, TerminalConfigParse};
pub use event::{Coord, EditKind, ModeAction, TerminalEvent};
pub use interpreter::{Interpreter, interpret};
pub use scanner::{Scan, Scanner, SequenceFamily, Token, TokenKind, scan};
pub use screen::{ALT_SCREEN_MODES, Cursor, Screen, ScreenMode};
pub use sink::{ChangeQueue, NullSink, OutputSink, ScreenChange};
pub use style::{Color, NamedColor, Style, StyleFlags, apply_sgr, color_256};
pub use terminal::{MAX_QUEUED_CHANGES, MAX_QUEUED_PASSTHROUGH, Terminal};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, trace_span, warn};
