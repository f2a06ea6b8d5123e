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

/// Upcoming reminders grouped under a heading per day.
pub struct AgendaView;

impl AgendaView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        from: NaiveDate,
        days: i64,
        reminders: &[&Reminder],
        focused: Option<ReminderId>,
    ) {
        let theme = theme::current();

        let title = if area.width >= 40 {
            format!(" Agenda: {} + {} days ", from.format("%b %d, %Y"), days)
        } else {
            " Agenda ".to_string()
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(
                format!(" {} ", reminders.len()),
                theme.dim,
            )))
            .borders(Borders::ALL)
            .border_style(theme.border);

        if reminders.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("Nothing scheduled").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let mut items: Vec<ListItem> = Vec::new();
        let mut current_day: Option<NaiveDate> = None;
        let mut focus_row = 0;

        for r in reminders {
            // Reminders that started before the window are listed under its first day.
            let day = r.start().date_naive().max(from);
            if current_day != Some(day) {
                if current_day.is_some() {
                    items.push(ListItem::new(Line::from("")));
                }
                current_day = Some(day);
                let heading = Style::default().add_modifier(Modifier::BOLD);
                items.push(ListItem::new(Line::from(Span::styled(
                    day.format(" %a %b %d").to_string(),
                    heading,
                ))));
            }

            let is_focused = focused == Some(r.id());
            if is_focused {
                focus_row = items.len();
            }

            let time = format!("  {:<13}", r.time_display());
            let title_style = if is_focused { theme.highlight } else { Style::default() };
            let mut spans = vec![
                Span::styled(time, theme.dim),
                Span::styled("  ", Style::default().bg(theme::reminder_color(r.color()))),
                Span::styled(
                    format!(" {}", truncate(r.title(), inner_w.saturating_sub(20))),
                    title_style,
                ),
            ];

            if let Some(description) = r.description() {
                let used: usize = spans.iter().map(|s| s.width()).sum();
                if used + 3 < inner_w {
                    spans.push(Span::styled(
                        format!("  {}", truncate(description, inner_w - used - 2)),
                        theme.dim,
                    ));
                }
            }

            items.push(ListItem::new(Line::from(spans)));
        }

        let inner_h = area.height.saturating_sub(2) as usize;
        let scroll = (focus_row + 1).saturating_sub(inner_h);

        let list = List::new(items.into_iter().skip(scroll).collect::<Vec<_>>()).block(block);
        frame.render_widget(list, area);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        format!("{}...", s.chars().take(max - 3).collect::<String>())
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Geburtstag Öma", 8), "Gebur...");
        assert_eq!(truncate("ßßßß", 2), "ßß");
    }
}
