mod app;
mod calendar;
mod components;
mod config;
mod event;
mod form;
mod interaction;
mod logging;
mod theme;
mod tui;
mod view;

use std::time::Duration;

use app::{App, GridSettings, InputMode};
use chrono::Datelike;
use color_eyre::Result;
use config::Config;
use crossterm::event::{KeyCode, KeyModifiers};
use event::AppEvent;
use ratatui::layout::{Constraint, Layout, Rect};
use view::{CalendarView, Navigate};

fn main() -> Result<()> {
    color_eyre::install()?;

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let log_path = logging::init(&config.data_dir(), &config.log_level)?;
    tracing::info!(log = %log_path.display(), "starting reminder-tui");
    if let Some(ref e) = config_error {
        tracing::warn!("config ignored, using defaults: {e:#}");
    }

    theme::init(&config.theme);

    let mut app = App::new(&config);
    if config_error.is_some() {
        app.status_message = Some(format!("Config invalid, using defaults (see {})", log_path.display()));
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;

    if app.store.is_unsaved() {
        if let Err(e) = app.store.flush() {
            tracing::error!(error = %e, "reminders not saved on exit");
            eprintln!("warning: reminders could not be saved: {e}");
        }
    }
    tracing::info!("exiting");
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            let content_area = layout[0];

            match app.view() {
                CalendarView::Month => render_month_layout(frame, content_area, app),
                CalendarView::Agenda => {
                    let (from, _) = app.views.visible_range();
                    components::AgendaView::render(
                        frame,
                        content_area,
                        from,
                        app.views.agenda_days(),
                        &app.visible_reminders(),
                        app.focused,
                    );
                }
                view => render_time_grid(frame, content_area, app, view),
            }

            if let Some(form) = app.form.current() {
                components::ReminderForm::render(frame, content_area, form);
            }

            if app.show_help {
                render_help(frame, area);
            }

            components::StatusBar::render(
                frame,
                layout[1],
                app.view(),
                app.input_mode(),
                app.store.is_unsaved(),
                app.status_message.as_deref(),
            );
        })?;

        match event::next_event(Duration::from_millis(100))? {
            Some(AppEvent::Key(key)) => {
                app.status_message = None;

                if app.show_help {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                        app.show_help = false;
                    }
                    continue;
                }

                match app.input_mode() {
                    InputMode::Form => handle_form_input(app, key.code, key.modifiers),
                    InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
                }
            }
            Some(AppEvent::MouseDown(column, row)) => app.record_pointer(column, row),
            Some(AppEvent::Resize) => {}
            None => app.tick(),
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let slot = app.grid.slot();
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char(c @ '1'..='5'), _) => {
            let index = c as usize - '1' as usize;
            app.set_view(CalendarView::ALL[index]);
        }
        (KeyCode::Char('t'), _) => app.navigate(Navigate::Today),
        (KeyCode::Char('['), _) => app.navigate(Navigate::Prev),
        (KeyCode::Char(']'), _) => app.navigate(Navigate::Next),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.move_cursor(-1),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.move_cursor(1),
        (KeyCode::Char('v'), _) => app.toggle_selection(),
        (KeyCode::Enter, _) => app.activate(),
        (KeyCode::Char('n'), _) => app.select_slot(),
        (KeyCode::Tab, _) => app.focus_next(),
        (KeyCode::BackTab, _) => app.focus_prev(),
        (KeyCode::Esc, _) => app.clear_focus(),
        (KeyCode::Char('J'), _) => app.drag_focused(slot),
        (KeyCode::Char('K'), _) => app.drag_focused(-slot),
        (KeyCode::Char('L'), _) => app.drag_focused(chrono::Duration::days(1)),
        (KeyCode::Char('H'), _) => app.drag_focused(chrono::Duration::days(-1)),
        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => app.resize_focused(slot),
        (KeyCode::Char('-'), _) => app.resize_focused(-slot),
        (KeyCode::Char('d'), _) | (KeyCode::Delete, _) => app.delete_focused(),
        (KeyCode::Char('w'), _) => app.save(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => app.discard_form(),
        (KeyCode::Esc, _) => app.close_form(),
        (KeyCode::Enter, _) => app.submit_form(),
        (KeyCode::Tab, _) => app.form.next_field(),
        (KeyCode::BackTab, _) => app.form.prev_field(),
        (KeyCode::Up, _) => app.form_adjust(true),
        (KeyCode::Down, _) => app.form_adjust(false),
        (KeyCode::Backspace, _) => app.form.backspace(),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => app.form.input_char(c),
        _ => {}
    }
}

fn render_month_layout(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let selected = app.selected_date();
    let days = app.store.days_with_reminders(selected.year(), selected.month());

    if area.width < 60 {
        components::MonthView::render(frame, area, selected, app.today, &days);
        return;
    }

    let month_w = if area.width >= 100 { 44 } else { 37 };
    let content = Layout::horizontal([Constraint::Length(month_w), Constraint::Min(20)]).split(area);

    components::MonthView::render(frame, content[0], selected, app.today, &days);
    components::DayView::render(
        frame,
        content[1],
        selected,
        &app.store.on_date(selected),
        app.focused,
    );
}

fn render_time_grid(frame: &mut ratatui::Frame, area: Rect, app: &App, view: CalendarView) {
    let days = app.views.visible_days();
    let (Some(first), Some(last)) = (days.first().copied(), days.last().copied()) else {
        return;
    };

    let title = if first == last {
        format!(" {} ", first.format("%A, %B %d, %Y"))
    } else {
        format!(" {}: {} - {} ", view.label(), first.format("%b %d"), last.format("%b %d, %Y"))
    };

    let reminders = app.visible_reminders();
    let grid: GridSettings = app.grid;
    let state = components::GridState {
        title,
        days: &days,
        today: app.today,
        selected_date: app.selected_date(),
        grid,
        cursor_slot: grid.slot_index(app.cursor),
        selection: app.selection(),
        focused: app.focused,
    };
    components::WeekView::render(frame, area, &state, &reminders);
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let theme = theme::current();

    let popup_w = area.width.clamp(30, 58).min(area.width);
    let popup_h = area.height.clamp(12, 30).min(area.height);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(theme.header)
        .title_bottom(Line::from(Span::styled(format!(" theme: {} ", theme.name), theme.dim)))
        .borders(Borders::ALL)
        .border_style(theme.border);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = theme.header.add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        entry("h/l", "Previous/next day"),
        entry("j/k", "Slot cursor (month: week)"),
        entry("[/]", "Previous/next period"),
        entry("t", "Jump to today"),
        entry("1-5", "Month/Week/Work week/Day/Agenda"),
        Line::from(""),
        Line::from(Span::styled("Reminders", section_style)),
        entry("v", "Start/stop range selection"),
        entry("Enter", "Edit focused or create"),
        entry("n", "Create in selected slot"),
        entry("Tab", "Focus next reminder"),
        entry("J/K", "Move by one slot"),
        entry("H/L", "Move by one day"),
        entry("+/-", "Lengthen/shorten"),
        entry("d", "Delete focused"),
        entry("w", "Retry saving"),
        Line::from(""),
        Line::from(Span::styled("Form", section_style)),
        entry("Tab", "Next field"),
        entry("Up/Down", "Step date or time"),
        entry("Enter", "Save"),
        entry("Ctrl+D", "Discard (edit only)"),
        entry("Esc", "Close without saving"),
        Line::from(""),
        entry("q", "Quit"),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
