use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::theme;
use crate::view::days_in_month;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub struct MonthView;

impl MonthView {
    /// Sunday-first month grid. Days in `days_with_reminders` get a `*`.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        days_with_reminders: &HashSet<u32>,
    ) {
        let theme = theme::current();
        let year = selected_date.year();
        let month = selected_date.month();

        let block = Block::default()
            .title(format!(" {} ", selected_date.format("%B %Y")))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let header = Line::from(
            DAY_NAMES
                .iter()
                .map(|d| Span::styled(format!("{:^5}", d), theme.header))
                .collect::<Vec<_>>(),
        );

        let Some(first_day) = selected_date.with_day(1) else {
            return;
        };
        let first_weekday = first_day.weekday().num_days_from_sunday() as i32;
        let last_day = days_in_month(year, month) as i32;

        let mut weeks: Vec<Line> = Vec::new();
        let mut current_day: i32 = 1 - first_weekday;

        while current_day <= last_day {
            let mut cells: Vec<Span> = Vec::new();
            for _ in 0..7 {
                let date = u32::try_from(current_day)
                    .ok()
                    .and_then(|d| NaiveDate::from_ymd_opt(year, month, d));
                match date {
                    Some(date) => {
                        let day = date.day();
                        let marker = if days_with_reminders.contains(&day) { '*' } else { ' ' };

                        let style = if date == today && date == selected_date {
                            theme.today.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                        } else if date == selected_date {
                            theme.selected
                        } else if date == today {
                            theme.today
                        } else {
                            Style::default()
                        };

                        cells.push(Span::styled(format!(" {:>2}{} ", day, marker), style));
                    }
                    None => cells.push(Span::raw("     ")),
                }
                current_day += 1;
            }
            weeks.push(Line::from(cells));
        }

        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(weeks.iter().map(|_| Constraint::Length(1)));
        constraints.push(Constraint::Min(0));

        let rows = Layout::vertical(constraints).split(inner);

        frame.render_widget(Paragraph::new(header), rows[0]);
        for (i, week) in weeks.into_iter().enumerate() {
            frame.render_widget(Paragraph::new(week), rows[i + 1]);
        }
    }
}
