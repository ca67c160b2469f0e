//! End-to-end scenarios: raw stream in, screen and events out.

use shterm_core::{
    Color, Interpreter, NamedColor, Scanner, Screen, ScreenChange, Style, StyleFlags, Terminal,
    TerminalEvent,
};

fn events(input: &str) -> Vec<TerminalEvent> {
    let mut scanner = Scanner::new();
    let mut interp = Interpreter::new(4);
    let tokens = scanner.feed(input);
    interp.interpret_all(&tokens)
}

fn screen_after(rows: u16, cols: u16, chunks: &[&str]) -> Screen {
    let mut term = Terminal::new(rows, cols);
    for chunk in chunks {
        term.feed_str(chunk);
    }
    term.screen().clone()
}

// ── Styled text ─────────────────────────────────────────────────────────

#[test]
fn red_text_then_reset() {
    let mut scanner = Scanner::new();
    let mut interp = Interpreter::new(4);
    let events = interp.interpret_all(&scanner.feed("\x1b[31mRed\x1b[0m"));
    assert_eq!(
        events,
        vec![TerminalEvent::Text {
            text: "Red".into(),
            style: Style::with_fg(Color::Named(NamedColor::Red)),
        }]
    );
    assert_eq!(Style::with_fg(Color::Named(NamedColor::Red)).resolved_fg().to_string(), "_red");
    assert!(interp.style().is_default());
}

#[test]
fn orange_from_256_palette() {
    let events = events("\x1b[38;5;208mOrange\x1b[0m");
    let [TerminalEvent::Text { text, style }] = events.as_slice() else {
        panic!("expected one text event, got {events:?}");
    };
    assert_eq!(text, "Orange");
    assert_eq!(style.resolved_fg().to_string(), "#ff6600");
}

#[test]
fn sgr_split_across_chunks_matches_single_chunk() {
    let split = screen_after(2, 10, &["\x1b[31m", "X"]);
    let whole = screen_after(2, 10, &["\x1b[31mX"]);
    assert_eq!(split, whole);
    let cell = split.cell(0, 0).unwrap();
    assert_eq!(cell.content(), "X");
    assert_eq!(cell.style.fg, Some(Color::Named(NamedColor::Red)));
}

#[test]
fn truecolor_background_with_attributes() {
    let screen = screen_after(2, 10, &["\x1b[1;3;48;2;1;2;3mZ"]);
    let cell = screen.cell(0, 0).unwrap();
    assert_eq!(cell.style.bg, Some(Color::Rgb(1, 2, 3)));
    assert_eq!(cell.style.flags, StyleFlags::BOLD | StyleFlags::ITALIC);
}

// ── Wide glyphs ─────────────────────────────────────────────────────────

#[test]
fn chinese_text_occupies_four_columns() {
    let screen = screen_after(24, 80, &["你好"]);
    let line = screen.viewport_line(0).unwrap();
    assert_eq!(line.occupied_columns(), 4);
    assert_eq!(
        line.cells()
            .iter()
            .filter(|cell| cell.is_wide_continuation())
            .count(),
        2
    );
    assert_eq!(screen.cursor().col, 4);
}

#[test]
fn emoji_and_combining_sequences() {
    let screen = screen_after(2, 10, &["a👍e\u{301}b"]);
    let line = screen.viewport_line(0).unwrap();
    assert_eq!(line.text(), "a👍e\u{301}b");
    assert_eq!(screen.cursor().col, 5);
}

#[test]
fn emoji_sequences_split_across_reads() {
    let stream = "👍🏽 ❤\u{fe0f} 👨\u{200d}👩 🇺🇸";
    let whole = screen_after(2, 20, &[stream]);
    let bytes = stream.as_bytes();
    for cut in 1..bytes.len() {
        let mut term = Terminal::new(2, 20);
        term.feed(&bytes[..cut]);
        term.feed(&bytes[cut..]);
        assert_eq!(term.screen(), &whole, "cut at byte {cut}");
    }
    assert_eq!(whole.viewport_line(0).unwrap().text(), stream);
}

// ── Line editing ────────────────────────────────────────────────────────

#[test]
fn carriage_return_overwrites_in_place() {
    let screen = screen_after(2, 10, &["123\r9"]);
    assert_eq!(screen.viewport_text(), "923");
}

#[test]
fn backspace_and_erase_line() {
    let screen = screen_after(2, 20, &["hello\x08\x08\x1b[K"]);
    assert_eq!(screen.viewport_text(), "hel");
}

#[test]
fn clear_screen_and_home() {
    let screen = screen_after(3, 20, &["one\r\ntwo\r\nthree\x1b[2J\x1b[Hnew"]);
    assert_eq!(screen.viewport_text(), "new");
}

#[test]
fn tab_expands_to_four_spaces() {
    let screen = screen_after(2, 20, &["a\tb\x1b[Ic"]);
    assert_eq!(screen.viewport_text(), "a    b    c");
}

#[test]
fn long_output_scrolls_into_scrollback() {
    let mut term = Terminal::new(3, 10);
    for n in 0..10 {
        term.feed_str(&format!("line{n}\r\n"));
    }
    let screen = term.screen();
    assert_eq!(screen.line_count(), 11);
    assert_eq!(screen.viewport_lines(), vec!["line8", "line9", ""]);
    assert_eq!(screen.line(0).unwrap().text(), "line0");
}

// ── Alternate screen ────────────────────────────────────────────────────

#[test]
fn full_screen_program_round_trip() {
    let mut term = Terminal::new(5, 20);
    term.feed_str("$ ls\r\nfile.txt\r\n$ vim");
    let before = term.screen().clone();

    term.feed_str("\r\n\x1b[?1049h\x1b[H\x1b[2J~\r\n~\r\n\x1b[7m-- INSERT --\x1b[0m");
    assert!(term.screen().is_alt_active());
    assert_eq!(term.screen().active().viewport_lines()[2], "-- INSERT --");

    // Leave the alternate screen; primary content is exactly as before,
    // only the line feed that preceded the switch is visible.
    term.feed_str("\x1b[?1049l");
    assert!(!term.screen().is_alt_active());
    assert_eq!(term.screen().viewport_lines()[..3], before.viewport_lines()[..3]);
    assert_eq!(term.screen().line_count(), before.line_count() + 1);

    let changes = term.take_changes();
    assert!(changes.contains(&ScreenChange::AltScreen { active: true }));
    assert_eq!(changes.last(), Some(&ScreenChange::AltScreen { active: false }));
}

#[test]
fn alt_switch_split_mid_sequence() {
    let split = screen_after(4, 10, &["p\x1b[?10", "49hALT\x1b[?1049", "l"]);
    let whole = screen_after(4, 10, &["p\x1b[?1049hALT\x1b[?1049l"]);
    assert_eq!(split, whole);
    assert_eq!(split.viewport_text(), "p");
}

// ── Passthrough ─────────────────────────────────────────────────────────

#[test]
fn unsupported_sequences_never_block() {
    let screen = screen_after(
        2,
        40,
        &["\x1b]0;title\x07\x1bP+q\x1b\\\x1b[?2004h\x1b[5n\x1b(Bok\x1b[1J"],
    );
    assert_eq!(screen.viewport_text(), "ok");
    assert!(screen.is_mode_set("?2004"));
}

#[test]
fn save_restore_via_escape() {
    let screen = screen_after(3, 20, &["ab\x1b7\r\nxyz\x1b8!"]);
    assert_eq!(screen.viewport_lines()[0], "ab!");
    assert_eq!(screen.viewport_lines()[1], "xyz");
}
