use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar};

/// Splits the frame into title, transcript and input areas.
pub fn layout_areas(frame_area: Rect, input_height: u16) -> [Rect; 3] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame_area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let [title_area, main_area, input_area] = layout_areas(frame.area(), input_height);

    let transcript = app.transcript.snapshot();
    MessageList::new(&mut tui.message_list, &transcript, tui.pulse_value).render(frame, main_area);

    TitleBar::new(
        app.model_id.clone(),
        app.status_message.clone(),
        app.last_error.clone(),
        tui.message_list.has_unseen_content(),
    )
    .render(frame, title_area);

    tui.input_box.busy = app.is_loading;
    tui.input_box.render(frame, input_area);
}
