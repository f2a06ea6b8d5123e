use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};

/// Input the UI loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Left button pressed at (column, row).
    MouseDown(u16, u16),
    Resize,
}

pub fn poll_event(timeout: Duration) -> color_eyre::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Wait up to `timeout` for the next event the UI cares about. Key releases
/// and mouse motion are skipped.
pub fn next_event(timeout: Duration) -> color_eyre::Result<Option<AppEvent>> {
    loop {
        let Some(event) = poll_event(timeout)? else {
            return Ok(None);
        };
        if let Some(event) = translate(event) {
            return Ok(Some(event));
        }
    }
}

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                Some(AppEvent::MouseDown(mouse.column, mouse.row))
            }
            _ => None,
        },
        Event::Resize(..) => Some(AppEvent::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 7,
            row: 3,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn keeps_presses_and_left_clicks_only() {
        let press = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(translate(Event::Key(press)), Some(AppEvent::Key(press)));

        let mut release = press;
        release.kind = KeyEventKind::Release;
        assert_eq!(translate(Event::Key(release)), None);

        assert_eq!(
            translate(mouse(MouseEventKind::Down(MouseButton::Left))),
            Some(AppEvent::MouseDown(7, 3))
        );
        assert_eq!(translate(mouse(MouseEventKind::Moved)), None);
        assert_eq!(translate(mouse(MouseEventKind::Down(MouseButton::Right))), None);
    }
}
