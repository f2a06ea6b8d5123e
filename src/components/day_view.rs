use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::calendar::{Reminder, ReminderId};
use crate::theme;

/// Reminders of one day as a list, shown next to the month grid.
pub struct DayView;

impl DayView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        reminders: &[&Reminder],
        focused: Option<ReminderId>,
    ) {
        let theme = theme::current();
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let count = match reminders.len() {
            0 => String::new(),
            1 => " 1 reminder ".to_string(),
            n => format!(" {} reminders ", n),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(count, theme.dim)))
            .borders(Borders::ALL)
            .border_style(theme.border);

        if reminders.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No reminders. Enter or n to add one.").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let (all_day, timed): (Vec<&Reminder>, Vec<&Reminder>) =
            reminders.iter().partition(|r| r.is_all_day());

        let section = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let mut items: Vec<ListItem> = Vec::new();

        if !all_day.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled("All Day", section))));
            items.extend(all_day.iter().map(|r| format_reminder(r, focused)));
            if !timed.is_empty() {
                items.push(ListItem::new(Line::from("")));
            }
        }
        items.extend(timed.iter().map(|r| format_reminder(r, focused)));

        // Keep the focused reminder in view.
        let inner_h = area.height.saturating_sub(2) as usize;
        let focus_row = focused
            .and_then(|id| {
                let offset = if all_day.is_empty() { 0 } else { 1 };
                all_day
                    .iter()
                    .position(|r| r.id() == id)
                    .map(|i| i + offset)
                    .or_else(|| {
                        let gap = if all_day.is_empty() { 0 } else { all_day.len() + 2 };
                        timed.iter().position(|r| r.id() == id).map(|i| i + gap)
                    })
            })
            .unwrap_or(0);
        let scroll = (focus_row + 1).saturating_sub(inner_h);

        let list = List::new(items.into_iter().skip(scroll).collect::<Vec<_>>()).block(block);
        frame.render_widget(list, area);
    }
}

fn format_reminder(r: &Reminder, focused: Option<ReminderId>) -> ListItem<'static> {
    let theme = theme::current();
    let swatch = Span::styled("  ", Style::default().bg(theme::reminder_color(r.color())));

    let time = if r.is_all_day() {
        String::new()
    } else {
        format!(" {} ", r.time_display())
    };

    let title_style = if focused == Some(r.id()) {
        theme.highlight
    } else {
        Style::default()
    };

    let mut spans = vec![
        swatch,
        Span::styled(time, Style::default().add_modifier(Modifier::DIM)),
        Span::styled(format!(" {}", r.title()), title_style),
    ];
    if let Some(description) = r.description() {
        spans.push(Span::styled(format!("  {}", description), theme.dim));
    }

    ListItem::new(Line::from(spans))
}
