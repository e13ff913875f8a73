//! A small multi-line text buffer with a cursor, used for both input fields.
//!
//! The cursor is a byte offset that always sits on a grapheme boundary. Rendering soft-wraps rows
//! by display width and keeps the cursor row visible when the text is taller than the area.

use std::ops::Range;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::key_hint::has_ctrl_or_alt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    cursor: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the whole value and move the cursor to the end.
    pub fn set_text(&mut self, text: String) {
        self.cursor = text.len();
        self.text = text;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Apply an editing or navigation key. Returns true when the key was consumed.
    ///
    /// Enter is not handled here: whether it submits or inserts a newline is the owner's call.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        match key {
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                ..
            } if !has_ctrl_or_alt(modifiers) => {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf));
                true
            }
            KeyEvent {
                code: KeyCode::Backspace,
                modifiers,
                ..
            } if modifiers.contains(KeyModifiers::ALT) => {
                self.delete_backward_word();
                true
            }
            KeyEvent {
                code: KeyCode::Char('w'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.delete_backward_word();
                true
            }
            KeyEvent {
                code: KeyCode::Char('u'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                let start = self.line_start();
                self.text.replace_range(start..self.cursor, "");
                self.cursor = start;
                true
            }
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                let start = self.prev_boundary();
                self.text.replace_range(start..self.cursor, "");
                self.cursor = start;
                true
            }
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => {
                let end = self.next_boundary();
                self.text.replace_range(self.cursor..end, "");
                true
            }
            KeyEvent {
                code: KeyCode::Left,
                ..
            } => {
                self.cursor = self.prev_boundary();
                true
            }
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => {
                self.cursor = self.next_boundary();
                true
            }
            KeyEvent {
                code: KeyCode::Home,
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('a'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.cursor = self.line_start();
                true
            }
            KeyEvent {
                code: KeyCode::End, ..
            }
            | KeyEvent {
                code: KeyCode::Char('e'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.cursor = self.line_end();
                true
            }
            _ => false,
        }
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len())
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor].rfind('\n').map_or(0, |idx| idx + 1)
    }

    fn line_end(&self) -> usize {
        self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |idx| self.cursor + idx)
    }

    fn delete_backward_word(&mut self) {
        let before = &self.text[..self.cursor];
        let trimmed = before.trim_end();
        let start = trimmed
            .split_word_bound_indices()
            .next_back()
            .map_or(0, |(idx, _)| idx);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Byte ranges of the soft-wrapped rows at `width` columns.
    fn wrapped_rows(&self, width: u16) -> Vec<Range<usize>> {
        let width = usize::from(width.max(1));
        let mut rows = Vec::new();
        let mut line_start = 0;
        for line in self.text.split('\n') {
            let mut row_start = line_start;
            let mut row_width = 0;
            for (idx, grapheme) in line.grapheme_indices(true) {
                let w = grapheme.width();
                if row_width > 0 && row_width + w > width {
                    rows.push(row_start..line_start + idx);
                    row_start = line_start + idx;
                    row_width = 0;
                }
                row_width += w;
            }
            rows.push(row_start..line_start + line.len());
            line_start += line.len() + 1;
        }
        rows
    }

    fn cursor_row(&self, rows: &[Range<usize>]) -> usize {
        // On a soft-wrap boundary the cursor belongs to the following row.
        rows.iter()
            .rposition(|row| row.start <= self.cursor && self.cursor <= row.end)
            .unwrap_or(0)
    }

    fn scroll_offset(&self, rows: &[Range<usize>], height: u16) -> usize {
        self.cursor_row(rows)
            .saturating_sub(usize::from(height.max(1)) - 1)
    }

    pub fn desired_height(&self, width: u16) -> u16 {
        u16::try_from(self.wrapped_rows(width).len()).unwrap_or(u16::MAX)
    }

    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.is_empty() {
            return None;
        }
        let rows = self.wrapped_rows(area.width);
        let row_idx = self.cursor_row(&rows);
        let visible_row = row_idx - self.scroll_offset(&rows, area.height);
        let row = rows.get(row_idx)?;
        let col = self.text[row.start..self.cursor].width();
        let x = area.x + u16::try_from(col).unwrap_or(u16::MAX).min(area.width - 1);
        let y = area.y + u16::try_from(visible_row).unwrap_or(0);
        Some((x, y))
    }

    /// Render the text, or `placeholder` when empty.
    pub fn render(&self, area: Rect, buf: &mut Buffer, placeholder: Option<(&str, Style)>) {
        if area.is_empty() {
            return;
        }
        if self.text.is_empty() {
            if let Some((placeholder, style)) = placeholder {
                buf.set_stringn(area.x, area.y, placeholder, usize::from(area.width), style);
            }
            return;
        }

        let rows = self.wrapped_rows(area.width);
        let offset = self.scroll_offset(&rows, area.height);
        for (y, row) in (area.y..area.bottom()).zip(rows.iter().skip(offset)) {
            buf.set_stringn(
                area.x,
                y,
                &self.text[row.clone()],
                usize::from(area.width),
                Style::default(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn typed(s: &str) -> TextField {
        let mut field = TextField::new();
        for c in s.chars() {
            field.input(key(KeyCode::Char(c)));
        }
        field
    }

    #[test]
    fn typing_and_backspace_respect_graphemes() {
        let mut field = typed("ae\u{301}");
        assert_eq!(field.text(), "ae\u{301}");

        field.input(key(KeyCode::Backspace));
        assert_eq!(field.text(), "a");
        assert_eq!(field.cursor(), 1);
    }

    #[test]
    fn cursor_moves_and_inserts_mid_text() {
        let mut field = typed("helo");
        field.input(key(KeyCode::Left));
        field.input(key(KeyCode::Char('l')));
        assert_eq!(field.text(), "hello");

        field.input(key(KeyCode::Home));
        field.input(key(KeyCode::Delete));
        assert_eq!(field.text(), "ello");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn ctrl_chars_are_not_inserted() {
        let mut field = typed("hi");
        let consumed = field.input(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::CONTROL));
        assert!(!consumed);
        assert_eq!(field.text(), "hi");
    }

    #[test]
    fn alt_backspace_deletes_previous_word() {
        let mut field = typed("what is this  ");
        field.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT));
        assert_eq!(field.text(), "what is ");
    }

    #[test]
    fn home_and_end_stay_on_current_line() {
        let mut field = TextField::new();
        field.set_text("first\nsecond".to_string());
        field.input(key(KeyCode::Home));
        assert_eq!(field.cursor(), "first\n".len());
        field.input(key(KeyCode::Left));
        field.input(key(KeyCode::Home));
        assert_eq!(field.cursor(), 0);
        field.input(key(KeyCode::End));
        assert_eq!(field.cursor(), "first".len());
    }

    #[test]
    fn wraps_long_lines_and_tracks_cursor() {
        let mut field = TextField::new();
        field.set_text("abcdef\ngh".to_string());

        assert_eq!(field.desired_height(4), 3);
        assert_eq!(field.cursor_pos(Rect::new(2, 5, 4, 3)), Some((4, 7)));

        field.input(key(KeyCode::Home));
        field.input(key(KeyCode::Left));
        // End of "abcdef": sits after "ef" on the wrapped second row.
        assert_eq!(field.cursor_pos(Rect::new(2, 5, 4, 3)), Some((4, 6)));
    }

    #[test]
    fn renders_placeholder_when_empty() {
        let field = TextField::new();
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        field.render(area, &mut buf, Some(("Ask me", Style::default())));
        let row: String = (0..area.width).map(|x| buf[(x, 0)].symbol()).collect();
        assert_eq!(row, "Ask me    ");
    }

    #[test]
    fn render_scrolls_to_cursor_row() {
        let mut field = TextField::new();
        field.set_text("one\ntwo\nthree".to_string());
        let mut terminal = Terminal::new(TestBackend::new(5, 2)).expect("terminal");

        terminal
            .draw(|f| field.render(f.area(), f.buffer_mut(), None))
            .expect("draw");

        assert_snapshot!(terminal.backend(), @r#"
        "two  "
        "three"
        "#);
    }
}
