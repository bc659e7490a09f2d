mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use app_state::PickerOptions;
pub use ui_renderer::plain_lines;

// The main function to run the TUI
pub use self::run_tui::run_picker;

// Terminal setup/teardown and the draw/poll loop
mod run_tui {
    use super::app_logic::TuiApp;
    use super::app_state::PickerOptions;
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use crate::collections::{CollectionTree, Identifier};
    use crate::config::Theme;
    use crate::search::SearchLoader;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use std::io::{self, Stdout};

    /// Run the picker until a question is chosen (`Some(id)`) or the user quits (`None`).
    pub fn run_picker(
        tree: &CollectionTree,
        options: PickerOptions,
        loader: SearchLoader,
        theme: &Theme,
    ) -> Result<Option<Identifier>> {
        let mut app = TuiApp::new(tree, options, loader);

        let mut terminal = init_terminal()?;
        let outcome = event_loop(&mut terminal, &mut app, theme);
        restore_terminal(terminal)?;
        outcome?;

        Ok(app.selected.take())
    }

    fn event_loop(
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        app: &mut TuiApp<'_>,
        theme: &Theme,
    ) -> Result<()> {
        while !app.quit {
            terminal.draw(|frame| ui_frame(frame, app, theme))?;
            handle_events(app)?;
        }
        Ok(())
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
