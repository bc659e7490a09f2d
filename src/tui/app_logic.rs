use super::app_state::{AppMode, PickerOptions};
use crate::collections::{CollectionTree, Identifier};
use crate::picker::{HierarchicalPicker, PickerItem, PickerView};
use crate::search::SearchLoader;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::{self, Receiver};
use tracing::info;

pub struct TuiApp<'t> {
    pub(super) picker: HierarchicalPicker<'t>,
    pub(super) loader: SearchLoader,
    selection_rx: Receiver<Identifier>,
    pub(super) selected: Option<Identifier>,
    pub(super) cursor: usize,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) mode: AppMode,
    pub(super) search_input: String,
    pub(super) search_cursor_pos: usize,
    pub(super) list_viewport_height: usize,
}

/// Byte offset of the `char_idx`-th character.
fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

impl<'t> TuiApp<'t> {
    pub fn new(tree: &'t CollectionTree, options: PickerOptions, loader: SearchLoader) -> Self {
        let (selection_tx, selection_rx) = mpsc::channel();
        let on_select = move |id: Identifier| {
            let _ = selection_tx.send(id);
        };
        let mut picker =
            HierarchicalPicker::new(tree, options.initial_location, options.policy, on_select);
        picker.set_search_text(options.search_text.clone());
        let mut app = TuiApp {
            picker,
            loader,
            selection_rx,
            selected: None,
            cursor: 0,
            scroll_offset: 0,
            quit: false,
            mode: AppMode::Browsing,
            search_cursor_pos: options.search_text.chars().count(),
            search_input: options.search_text,
            list_viewport_height: 0, // Set by ui_renderer
        };
        app.refresh_query();
        app
    }

    pub(super) fn view(&self) -> PickerView {
        self.picker.view(self.loader.state())
    }

    /// Pull in finished searches; keeps the cursor on a real row.
    pub(super) fn tick(&mut self) {
        if self.loader.poll() {
            self.clamp_cursor();
        }
    }

    fn refresh_query(&mut self) {
        self.loader.request(&self.picker.query());
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let rows = self.view().rows().len();
        if rows == 0 {
            self.cursor = 0;
        } else if self.cursor >= rows {
            self.cursor = rows - 1;
        }
    }

    pub(super) fn move_cursor(&mut self, delta: i32) {
        let rows = self.view().rows().len();
        if rows == 0 {
            return;
        }
        self.cursor = (self.cursor as i32 + delta).rem_euclid(rows as i32) as usize;
        self.ensure_cursor_is_visible_in_viewport();
    }

    pub(super) fn ensure_cursor_is_visible_in_viewport(&mut self) {
        if self.list_viewport_height == 0 {
            return;
        }
        let rows = self.view().rows().len();
        let height = self.list_viewport_height;
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor.saturating_sub(height - 1);
        }
        if rows <= height {
            self.scroll_offset = 0;
        } else {
            self.scroll_offset = self.scroll_offset.min(rows - height);
        }
    }

    fn current_row(&self) -> Option<PickerItem> {
        self.view().rows().get(self.cursor).map(|item| (*item).clone())
    }

    fn after_location_change(&mut self, changed: bool) {
        if changed {
            self.cursor = 0;
            self.scroll_offset = 0;
        }
        self.refresh_query();
    }

    pub(super) fn activate_current(&mut self) {
        let Some(item) = self.current_row() else {
            return;
        };
        let before = self.picker.state().current_location().clone();
        self.picker.activate(&item);
        if let Ok(id) = self.selection_rx.try_recv() {
            info!(%id, "selection made, closing picker");
            self.selected = Some(id);
            self.quit = true;
            return;
        }
        let changed = &before != self.picker.state().current_location();
        self.after_location_change(changed);
    }

    pub(super) fn go_up(&mut self) {
        let changed = self.picker.navigate_up();
        self.after_location_change(changed);
    }

    pub(super) fn go_root(&mut self) {
        let changed = self.picker.navigate_to(&Identifier::root());
        self.after_location_change(changed);
    }

    fn sync_search_text(&mut self) {
        self.picker.set_search_text(self.search_input.clone());
        self.cursor = 0;
        self.scroll_offset = 0;
        self.refresh_query();
    }

    pub(super) fn clear_search(&mut self) {
        self.search_input.clear();
        self.search_cursor_pos = 0;
        self.sync_search_text();
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_browsing_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('/') => self.mode = AppMode::Searching,
            KeyCode::Char('c') if key_event.modifiers == KeyModifiers::CONTROL => self.quit = true,
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Esc => {
                if self.picker.state().is_searching() {
                    self.clear_search();
                } else {
                    self.quit = true;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.activate_current(),
            KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => self.go_up(),
            KeyCode::Char('g') => self.go_root(),
            _ => {}
        }
    }

    pub(super) fn handle_searching_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => self.mode = AppMode::Browsing,
            KeyCode::Esc => {
                self.mode = AppMode::Browsing;
                self.clear_search();
            }
            KeyCode::Char('c') if key_event.modifiers == KeyModifiers::CONTROL => self.quit = true,
            KeyCode::Char(c) => {
                let at = byte_offset(&self.search_input, self.search_cursor_pos);
                self.search_input.insert(at, c);
                self.search_cursor_pos += 1;
                self.sync_search_text();
            }
            KeyCode::Backspace => {
                if self.search_cursor_pos > 0 {
                    self.search_cursor_pos -= 1;
                    let at = byte_offset(&self.search_input, self.search_cursor_pos);
                    self.search_input.remove(at);
                    self.sync_search_text();
                }
            }
            KeyCode::Left => {
                self.search_cursor_pos = self.search_cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.search_cursor_pos < self.search_input.chars().count() {
                    self.search_cursor_pos += 1;
                }
            }
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-1),
            _ => {}
        }
    }
}
