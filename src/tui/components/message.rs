use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::transcript::{Role, Turn};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Pulse intensity threshold above which the border transitions from normal to BOLD.
const PULSE_BOLD_THRESHOLD: f32 = 0.6;
/// Pulse intensity threshold above which the border transitions from DIM to normal.
const PULSE_NORMAL_THRESHOLD: f32 = 0.2;

/// Shown in place of an open assistant turn that has no text yet.
pub const THINKING_TEXT: &str = "Thinking...";

/// A stateless component that renders a single turn with role-based styling.
///
/// Created fresh each frame by `MessageList`. An open assistant turn pulses
/// its border while text is arriving. While the transcript awaits the first
/// increment, the open turn shows the thinking indicator instead of content.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub turn: &'a Turn,
    /// Whether this turn is still receiving increments
    pub is_open: bool,
    /// Show the thinking indicator in place of the (empty) content
    pub thinking: bool,
    /// Current pulse intensity (0.0 to 1.0) for active generation animation
    pub pulse_intensity: f32,
}

impl<'a> Message<'a> {
    pub fn new(turn: &'a Turn, is_open: bool, pulse_intensity: f32) -> Self {
        Self {
            turn,
            is_open,
            thinking: false,
            pulse_intensity,
        }
    }

    pub fn thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }

    fn display_text(turn: &Turn, thinking: bool) -> &str {
        if thinking { THINKING_TEXT } else { &turn.content }
    }

    /// Calculate the height required for this turn given a width.
    ///
    /// The wrapping options must match the `Ratatui` default for `Paragraph`
    /// so the calculated height equals the rendered height.
    pub fn calculate_height(turn: &Turn, thinking: bool, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Degenerate case: terminal too narrow for borders + padding.
            return 1;
        }

        let content = Self::display_text(turn, thinking);
        if content.trim().is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options).len();
        u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "→ You",
        Role::Assistant => "← Analog AI",
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::LightRed),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = role_style(self.turn.role);

        let mut border_style = style.add_modifier(Modifier::DIM);
        // Three-phase breathing: DIM → normal → BOLD
        if self.pulse_intensity > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > PULSE_NORMAL_THRESHOLD {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .title(role_label(self.turn.role))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let text_style = if self.thinking {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC)
        } else {
            style
        };

        Paragraph::new(Self::display_text(self.turn, self.thinking))
            .style(text_style)
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}
