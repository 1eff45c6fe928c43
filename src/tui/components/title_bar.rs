//! # TitleBar Component
//!
//! Top status bar: product name, the session's model id, the current status,
//! the last request failure and a "↓ New" marker when text arrived below the
//! visible window.
//!
//! Stateless. The props come from different owners:
//! - `model_id`: core config, fixed for the session
//! - `status_message`, `last_error`: core `App` state
//! - `has_unseen_content`: TUI scroll state
//!
//! Priority when space is short: unseen marker, then status, then model.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub const PRODUCT_NAME: &str = "Analog AI";

pub struct TitleBar {
    pub model_id: String,
    pub status_message: String,
    pub last_error: Option<String>,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(
        model_id: String,
        status_message: String,
        last_error: Option<String>,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            model_id,
            status_message,
            last_error,
            has_unseen_content,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                PRODUCT_NAME,
                Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" (model: {})", self.model_id)),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(format!(" | {}", self.status_message)));
        }
        if let Some(error) = &self.last_error {
            spans.push(Span::styled(
                format!(" | {}", error),
                Style::default().fg(Color::Red),
            ));
        }
        if self.has_unseen_content {
            spans.push(Span::styled(" | ↓ New", Style::default().fg(Color::Yellow)));
        }

        frame.render_widget(Line::from(spans), area);
    }
}
