use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::InputMode;
use crate::theme;
use crate::view::CalendarView;

pub struct StatusBar;

impl StatusBar {
    /// View indicator on the left, then the status message if there is one,
    /// otherwise key hints sized to the terminal.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        view: CalendarView,
        mode: InputMode,
        unsaved: bool,
        message: Option<&str>,
    ) {
        let style = theme::current().status;
        let w = area.width as usize;

        let index = CalendarView::ALL
            .iter()
            .position(|&v| v == view)
            .map_or(0, |i| i + 1);
        let mode_str = match mode {
            InputMode::Form => " [Form]",
            InputMode::Normal => "",
        };
        let unsaved_str = if unsaved { " [unsaved]" } else { "" };
        let left = format!(" [{}]{}{}{} ", index, view.label(), mode_str, unsaved_str);

        let right = match message {
            Some(msg) => format!(" {} ", msg),
            None => hints(view, mode, w).to_string(),
        };

        let padding = " ".repeat(w.saturating_sub(left.chars().count() + right.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, style),
            Span::styled(padding, style),
            Span::styled(right, style),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), area);
    }
}

fn hints(view: CalendarView, mode: InputMode, w: usize) -> &'static str {
    match mode {
        InputMode::Form if w >= 60 => " Tab:Field Enter:Save Esc:Close ^D:Discard ",
        InputMode::Form => " Enter:Save Esc:Close ",
        InputMode::Normal => match view {
            _ if w < 50 => " ?:Help q:Quit ",
            CalendarView::Month if w >= 90 => {
                " hjkl:Nav [/]:Month t:Today Enter:New Tab:Select d:Del ?:Help q:Quit "
            }
            CalendarView::Agenda if w >= 80 => " jk:Move [/]:Page Enter:Edit d:Del ?:Help q:Quit ",
            _ if w >= 90 => " hl:Day jk:Slot v:Range Enter:New Tab:Select JK/HL:Move +/-:Resize ?:Help ",
            _ => " Enter:New Tab:Select ?:Help q:Quit ",
        },
    }
}
