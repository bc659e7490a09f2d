use super::app_logic::TuiApp;
use super::app_state::AppMode;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;

pub(super) fn handle_events(app: &mut TuiApp<'_>) -> Result<()> {
    app.tick();
    if event::poll(Duration::from_millis(50))? {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press {
                match app.mode {
                    AppMode::Browsing => app.handle_browsing_input(key_event),
                    AppMode::Searching => app.handle_searching_input(key_event),
                }
            }
        }
    }
    Ok(())
}
