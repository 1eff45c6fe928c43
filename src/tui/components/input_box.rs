//! # InputBox Component
//!
//! Captures the prompt text and emits a submission on Enter.
//!
//! The buffer and cursor are internal state. `busy` is a prop from the
//! application state: while a response is streaming the box is dimmed and
//! Enter does nothing, so the typed text is kept for the next turn.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from area edge to content (border + padding)
const CONTENT_OFFSET: u16 = 2;

pub const PLACEHOLDER: &str = "Type your message here...";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Text content or cursor changed
    ContentChanged,
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Wrapped lines of `text`, keeping the empty line after a trailing newline.
fn wrapped_lines(text: &str, width: u16) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![String::new()];
    }
    let mut lines: Vec<String> = textwrap::wrap(text, wrap_options(width))
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        lines.push(String::new());
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// A response is streaming (Prop)
    pub busy: bool,
    /// Cursor position as byte offset in buffer
    cursor: usize,
    /// Line offset for internal scrolling
    scroll_offset: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            busy: false,
            cursor: 0,
            scroll_offset: 0,
        }
    }

    /// Height for the current buffer, in `[1, MAX_VISIBLE_LINES]` lines plus borders.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let lines = wrapped_lines(&self.buffer, inner_width(area_width)).len();
        lines.clamp(1, MAX_VISIBLE_LINES as usize) as u16 + VERTICAL_OVERHEAD
    }

    /// (line, column) of the cursor within the wrapped buffer.
    fn cursor_line_col(&self, width: u16) -> (u16, u16) {
        let before = &self.buffer[..self.cursor];
        let lines = wrapped_lines(before, width);
        let line = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);

        // textwrap trims trailing spaces, so measure from the logical line instead
        let logical_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
        let logical = &before[logical_start..];
        let segments = wrapped_lines(logical, width);
        let consumed: usize = segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .map(|s| s.len())
            .sum();
        let tail = logical.get(consumed.min(logical.len())..).unwrap_or("");
        let col = UnicodeWidthStr::width(tail.trim_start()) as u16;
        (line, col.min(width))
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let total = wrapped_lines(&self.buffer, width).len();
        if total <= MAX_VISIBLE_LINES as usize {
            self.scroll_offset = 0;
            return;
        }
        let (line, _) = self.cursor_line_col(width);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset.saturating_add(MAX_VISIBLE_LINES) {
            self.scroll_offset = line + 1 - MAX_VISIBLE_LINES;
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let title = if self.busy { "Input (waiting for reply)" } else { "Input" };
        let border_style = if self.busy {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(1))
            .title(title);

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            let start = self.scroll_offset as usize;
            let visible: Vec<String> = wrapped_lines(&self.buffer, width)
                .into_iter()
                .skip(start)
                .take(MAX_VISIBLE_LINES as usize)
                .collect();
            let style = if self.busy {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            };
            Paragraph::new(visible.join("\n")).style(style)
        };

        frame.render_widget(paragraph.block(block), area);

        let (line, col) = self.cursor_line_col(width);
        let row = line.saturating_sub(self.scroll_offset);
        frame.set_cursor_position((area.x + CONTENT_OFFSET + col, area.y + 1 + row));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorRight if self.cursor < self.buffer.len() => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorHome => {
                self.cursor = 0;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Submit => {
                if self.busy || self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.scroll_offset = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
        input
    }

    fn render_text(input: &mut InputBox) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal.draw(|f| input.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_handle_input() {
        let mut input = typed("ab");
        assert_eq!(input.buffer, "ab");
        assert_eq!(input.handle_event(&TuiEvent::Backspace), Some(InputEvent::ContentChanged));
        assert_eq!(input.buffer, "a");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut input = InputBox::new();
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = typed("héllo");
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer, "hllo");
    }

    #[test]
    fn test_submit_clears_buffer() {
        let mut input = typed("hello");
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit("hello".into()))
        );
        assert!(input.buffer.is_empty());
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut input = typed("   ");
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.buffer, "   ");
    }

    #[test]
    fn test_busy_submit_keeps_text() {
        let mut input = typed("next question");
        input.busy = true;
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.buffer, "next question");
    }

    #[test]
    fn test_height_grows_then_caps() {
        let mut input = InputBox::new();
        assert_eq!(input.calculate_height(40), 1 + VERTICAL_OVERHEAD);
        input.buffer = "a\nb\nc".into();
        assert_eq!(input.calculate_height(40), 3 + VERTICAL_OVERHEAD);
        input.buffer = "1\n2\n3\n4\n5\n6\n7".into();
        assert_eq!(input.calculate_height(40), MAX_VISIBLE_LINES + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_height_caps_for_huge_paste() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::Paste("x\n".repeat(70_000)));
        assert_eq!(input.calculate_height(40), MAX_VISIBLE_LINES + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_render_placeholder_when_empty() {
        let mut input = InputBox::new();
        assert!(render_text(&mut input).contains(PLACEHOLDER));
    }

    #[test]
    fn test_render_busy_title() {
        let mut input = InputBox::new();
        input.busy = true;
        assert!(render_text(&mut input).contains("waiting for reply"));
    }

    #[test]
    fn test_wrapped_lines_keeps_trailing_newline() {
        assert_eq!(wrapped_lines("hi\n", 10), vec!["hi".to_string(), String::new()]);
        assert_eq!(wrapped_lines("", 10), vec![String::new()]);
    }
}
