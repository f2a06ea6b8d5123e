use chrono::{DateTime, Local, NaiveDate, TimeZone};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::GridSettings;
use crate::calendar::{Reminder, ReminderId};
use crate::interaction::SlotRange;
use crate::theme;

/// What the time grid needs to know besides the reminders themselves.
pub struct GridState<'a> {
    pub title: String,
    pub days: &'a [NaiveDate],
    pub today: NaiveDate,
    pub selected_date: NaiveDate,
    pub grid: GridSettings,
    pub cursor_slot: usize,
    pub selection: Option<SlotRange>,
    pub focused: Option<ReminderId>,
}

/// Time grid with one column per day; used by the day, week and work
/// week views.
pub struct WeekView;

impl WeekView {
    pub fn render(frame: &mut Frame, area: Rect, state: &GridState, reminders: &[&Reminder]) {
        let theme = theme::current();
        let block = Block::default()
            .title(state.title.as_str())
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width < 10 || inner.height < 4 || state.days.is_empty() {
            return;
        }

        let time_col_w: u16 = if inner.width >= 40 { 6 } else { 3 };
        let col_w = (inner.width.saturating_sub(time_col_w) / state.days.len() as u16).max(1);

        let mut col_constraints = vec![Constraint::Length(time_col_w)];
        col_constraints.extend(state.days.iter().map(|_| Constraint::Length(col_w)));
        col_constraints.push(Constraint::Min(0));
        let cols = Layout::horizontal(col_constraints).split(inner);

        // Day header and all-day strip take the first two rows.
        let slot_rows = (inner.height as usize).saturating_sub(2);
        let total = state.grid.slot_count();
        let first = first_visible(state.cursor_slot, slot_rows, total);
        let shown = slot_rows.min(total - first);

        let mut row_constraints = vec![Constraint::Length(1), Constraint::Length(1)];
        row_constraints.extend((0..shown).map(|_| Constraint::Length(1)));
        row_constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(row_constraints).split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(fit("all", time_col_w as usize), theme.dim)),
            cols[0].intersection(rows[1]),
        );

        for (day_idx, &date) in state.days.iter().enumerate() {
            let col = cols[day_idx + 1];
            let width = col.width as usize;

            let label = if col_w >= 10 {
                date.format("%a %d").to_string()
            } else if col_w >= 5 {
                date.format("%a").to_string()
            } else {
                date.format("%d").to_string()
            };
            let header_style = if date == state.selected_date {
                theme.selected
            } else if date == state.today {
                theme.today
            } else {
                theme.header
            };
            frame.render_widget(
                Paragraph::new(Span::styled(format!("{:^width$}", label), header_style)),
                col.intersection(rows[0]),
            );

            if let Some(r) = reminders.iter().copied().find(|r| r.is_all_day() && r.occurs_on(date)) {
                frame.render_widget(
                    Paragraph::new(reminder_span(r, width, true, state.focused)),
                    col.intersection(rows[1]),
                );
            }

            for row in 0..shown {
                let slot = first + row;
                let cell = col.intersection(rows[row + 2]);
                let line = slot_cell(state, reminders, date, slot, width);
                frame.render_widget(Paragraph::new(line), cell);
            }
        }

        for row in 0..shown {
            let slot = first + row;
            let time = state.grid.slot_time(slot);
            let label = if time_col_w >= 6 {
                format!("{} ", time.format("%H:%M"))
            } else {
                time.format("%H").to_string()
            };
            frame.render_widget(
                Paragraph::new(Span::styled(label, theme.dim)),
                cols[0].intersection(rows[row + 2]),
            );
        }
    }
}

fn slot_cell<'a>(
    state: &GridState,
    reminders: &[&'a Reminder],
    date: NaiveDate,
    slot: usize,
    width: usize,
) -> Line<'a> {
    let theme = theme::current();
    let is_cursor = date == state.selected_date && slot == state.cursor_slot;

    let Some(start) = Local
        .from_local_datetime(&date.and_time(state.grid.slot_time(slot)))
        .earliest()
    else {
        return Line::default();
    };
    let end = start + state.grid.slot();

    let hit = reminders
        .iter()
        .copied()
        .find(|r| !r.is_all_day() && r.overlaps(start, end));

    let line = match hit {
        Some(r) => {
            // Title on the reminder's first slot, or the top of the grid for
            // reminders that began earlier.
            let with_title = r.start() >= start || slot == 0;
            Line::from(reminder_span(r, width, with_title, state.focused))
        }
        None if in_selection(state.selection, start, end) => {
            Line::from(Span::styled(" ".repeat(width), theme.selected))
        }
        None => Line::from(Span::styled(fit("\u{00b7}", width), theme.dim)),
    };

    if is_cursor {
        line.patch_style(theme.cursor)
    } else {
        line
    }
}

fn reminder_span<'a>(
    r: &'a Reminder,
    width: usize,
    with_title: bool,
    focused: Option<ReminderId>,
) -> Span<'a> {
    let bg = theme::reminder_color(r.color());
    let mut style = Style::default().fg(theme::contrast_fg(bg)).bg(bg);
    let is_focused = focused == Some(r.id());
    if is_focused {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }

    let text = match (with_title, is_focused) {
        (true, true) => format!(">{}", r.title()),
        (true, false) => r.title().to_string(),
        (false, _) => "\u{2502}".to_string(),
    };
    Span::styled(fit(&text, width), style)
}

fn in_selection(selection: Option<SlotRange>, start: DateTime<Local>, end: DateTime<Local>) -> bool {
    selection.is_some_and(|s| s.start < end && start < s.end)
}

/// Pad or cut `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let cut: String = text.chars().take(width).collect();
    format!("{:<width$}", cut)
}

/// First slot row to draw so the cursor stays roughly centered.
fn first_visible(cursor: usize, rows: usize, total: usize) -> usize {
    if rows >= total {
        return 0;
    }
    cursor.saturating_sub(rows / 2).min(total - rows)
}
