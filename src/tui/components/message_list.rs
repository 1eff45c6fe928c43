//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Display the turns in chronological order
//! - Follow new content (stick-to-bottom) unless the user scrolled up
//! - Cache turn heights between frames
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and a `Transcript` (props).
//! Heights of closed turns never change, so only the tail of the cache is
//! recomputed when a snapshot arrives.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::transcript::{Transcript, Turn};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// True when content exists below the visible window.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_offset()
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached turn heights for one content width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Turn handles the heights were computed for
    turns: Vec<Arc<Turn>>,
    open: bool,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            turns: Vec::new(),
            open: false,
            content_width: 0,
        }
    }

    pub fn total_height(&self) -> u16 {
        self.heights.iter().fold(0u16, |acc, h| acc.saturating_add(*h))
    }

    /// Number of leading heights still valid for `transcript` at `width`.
    ///
    /// Unchanged turns are the same `Arc`, so pointer equality is enough.
    fn reusable_count(&self, transcript: &Transcript, width: u16) -> usize {
        if width != self.content_width {
            return 0;
        }
        let mut count = self
            .turns
            .iter()
            .zip(transcript.turns())
            .take_while(|(cached, current)| Arc::ptr_eq(cached, current))
            .count();
        // The previously last turn renders differently once it closes.
        if self.open != transcript.is_open() && count == self.turns.len() && count > 0 {
            count -= 1;
        }
        count
    }

    pub fn update(&mut self, transcript: &Transcript, width: u16) {
        let reusable = self.reusable_count(transcript, width);
        self.heights.truncate(reusable);

        let last = transcript.len().saturating_sub(1);
        for (i, turn) in transcript.turns().iter().enumerate().skip(reusable) {
            let thinking = i == last && transcript.is_awaiting_first_increment();
            self.heights.push(Message::calculate_height(turn, thinking, width));
        }

        self.turns = transcript.turns().to_vec();
        self.open = transcript.is_open();
        self.content_width = width;
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub transcript: &'a Transcript,
    pub pulse_value: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, transcript: &'a Transcript, pulse_value: f32) -> Self {
        Self {
            state,
            transcript,
            pulse_value,
        }
    }

    fn render_empty(frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "Ready to chat?",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled("Ask me anything.", Style::default().fg(Color::DarkGray))),
        ];
        let [centered] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.transcript.is_empty() {
            Self::render_empty(frame, area);
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        self.state.layout.update(self.transcript, content_width);
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let total_height = self.state.layout.total_height();
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let last = self.transcript.len().saturating_sub(1);
        let awaiting = self.transcript.is_awaiting_first_increment();
        let mut y_offset: u16 = 0;
        for (i, turn) in self.transcript.turns().iter().enumerate() {
            if y_offset == u16::MAX {
                break;
            }
            let height = self.state.layout.heights[i];
            let is_open = self.transcript.is_open() && i == last;
            let pulse = if is_open { self.pulse_value } else { 0.0 };
            scroll_view.render_widget(
                Message::new(turn, is_open, pulse).thinking(is_open && awaiting),
                Rect::new(0, y_offset, content_width, height.min(u16::MAX - y_offset)),
            );
            y_offset = y_offset.saturating_add(height);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}
