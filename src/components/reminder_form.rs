use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::form::{FormDraft, FormField, FormMode};
use crate::theme;

const FORM_W: u16 = 48;
const FORM_H: u16 = 12;

pub struct ReminderForm;

impl ReminderForm {
    pub fn render(frame: &mut Frame, area: Rect, form: &FormDraft) {
        let theme = theme::current();
        let form_area = popup_area(area, FORM_W, FORM_H, form.anchor);

        frame.render_widget(Clear, form_area);

        let title = match form.mode {
            FormMode::Create => " New Reminder ",
            FormMode::Edit { .. } => " Edit Reminder ",
        };
        let accent = Style::default().fg(theme::reminder_color(&form.draft.color));

        let block = Block::default()
            .title(title)
            .title_style(accent.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(accent);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // time
            Constraint::Length(1), // ends
            Constraint::Length(1), // color
            Constraint::Length(1), // notes
            Constraint::Length(1), // spacer
            Constraint::Length(1), // error
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let field = |f: FormField| (form.value(f), form.active_field == f);

        let (value, active) = field(FormField::Title);
        render_field(frame, rows[0], "Title:", value, active);
        let (value, active) = field(FormField::Date);
        render_field(frame, rows[1], "Date:", value, active);
        let (value, active) = field(FormField::Time);
        render_field(frame, rows[2], "Time:", value, active);

        let ends = form.draft.end.format("%Y-%m-%d %H:%M").to_string();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{:<7}", "Ends:"), theme.dim),
                Span::styled(ends, theme.dim),
            ])),
            rows[3],
        );

        let (value, active) = field(FormField::Color);
        let swatch_bg = theme::reminder_color(value);
        let color_row = Layout::horizontal([Constraint::Length(3), Constraint::Min(1)]).split(rows[4]);
        render_field(frame, color_row[1], "Color:", value, active);
        frame.render_widget(
            Paragraph::new(Span::styled("  ", Style::default().bg(swatch_bg))),
            color_row[0],
        );

        let (value, active) = field(FormField::Notes);
        render_field(frame, rows[5], "Notes:", value, active);

        if let Some(ref error) = form.error {
            frame.render_widget(
                Paragraph::new(Span::styled(error.as_str(), theme.error)),
                rows[7],
            );
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let mut help = vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", theme.dim),
            Span::styled("Enter", key),
        ];
        match form.mode {
            FormMode::Create => {
                help.push(Span::styled(":Save ", theme.dim));
                help.push(Span::styled("Esc", key));
                help.push(Span::styled(":Cancel", theme.dim));
            }
            FormMode::Edit { .. } => {
                help.push(Span::styled(":Edit ", theme.dim));
                help.push(Span::styled("^D", key));
                help.push(Span::styled(":Discard ", theme.dim));
                help.push(Span::styled("Esc", key));
                help.push(Span::styled(":Close", theme.dim));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(help)), rows[8]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let theme = theme::current();
    let cursor = if active { "_" } else { "" };
    let style = if active { theme.highlight } else { Style::default() };

    let line = Line::from(vec![
        Span::styled(format!("{:<7}", label), theme.dim),
        Span::styled(format!("{}{}", value, cursor), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Where to draw a `w`x`h` popup. With an anchor the popup sits just
/// below it, or above when there is no room below; otherwise centered.
fn popup_area(area: Rect, w: u16, h: u16, anchor: Option<(u16, u16)>) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    let max_x = area.x + area.width - w;
    let max_y = area.y + area.height - h;

    match anchor {
        Some((col, row)) => {
            let x = col.saturating_sub(w / 2).clamp(area.x, max_x);
            let y = if row + 1 + h <= area.y + area.height {
                row + 1
            } else {
                row.saturating_sub(h)
            };
            Rect::new(x, y.clamp(area.y, max_y), w, h)
        }
        None => Rect::new(
            area.x + (area.width - w) / 2,
            area.y + (area.height - h) / 2,
            w,
            h,
        ),
    }
}
