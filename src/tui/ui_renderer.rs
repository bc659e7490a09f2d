use super::app_logic::TuiApp;
use super::app_state::AppMode;
use crate::config::Theme;
use crate::picker::{Affordance, Crumb, EMPTY_MESSAGE, ListArea, PickerItem, PickerView};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const CHEVRON: &str = " >";
const CRUMB_SEPARATOR: &str = " / ";

pub(crate) fn item_label(item: &PickerItem, theme: &Theme) -> String {
    let chevron = if item.affordance == Affordance::Expand { CHEVRON } else { "" };
    format!("{} {}{}", theme.glyph(&item.icon), item.name, chevron)
}

pub(crate) fn crumb_trail(crumbs: &[Crumb]) -> String {
    crumbs
        .iter()
        .map(|crumb| crumb.name.as_str())
        .collect::<Vec<_>>()
        .join(CRUMB_SEPARATOR)
}

/// Line under the rows for the non-item list states. `Suppressed` draws nothing.
pub(crate) fn status_line(list: &ListArea) -> Option<String> {
    match list {
        ListArea::Loading => Some("Loading...".to_string()),
        ListArea::Failed(message) => Some(format!("Error: {message}")),
        ListArea::Empty => Some(EMPTY_MESSAGE.to_string()),
        ListArea::Suppressed | ListArea::Items(_) => None,
    }
}

/// Plain-text rendering of a view, used by headless mode.
pub fn plain_lines(view: &PickerView, theme: &Theme) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(crumbs) = &view.breadcrumbs {
        lines.push(crumb_trail(crumbs));
    }
    for item in view.rows() {
        lines.push(format!("{}  [{}]", item_label(item, theme), item.id));
    }
    lines.extend(status_line(&view.list));
    lines
}

fn draw_help_block(f: &mut Frame, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav | Enter/l: Open or pick | Backspace/h: Up | g: Root"),
        Line::from("/: Search | Esc: Clear search or quit | q: Quit"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pick a question"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_search_block(f: &mut Frame, app: &TuiApp<'_>, theme: &Theme, area: Rect) {
    let searching = app.mode == AppMode::Searching;
    let title = if searching {
        "Search (Esc to clear, Enter to browse results)"
    } else {
        "Search (/ to edit)"
    };
    let style = if searching {
        Style::default()
    } else {
        Style::default().fg(theme.muted)
    };
    let search_paragraph = Paragraph::new(app.search_input.as_str())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(search_paragraph, area);
    if searching {
        let before_cursor: String = app.search_input.chars().take(app.search_cursor_pos).collect();
        let x = area.x + 1 + Line::from(before_cursor).width() as u16;
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_breadcrumbs(f: &mut Frame, view: &PickerView, theme: &Theme, area: Rect) {
    let Some(crumbs) = &view.breadcrumbs else {
        return;
    };
    let mut spans = Vec::new();
    for (idx, crumb) in crumbs.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(CRUMB_SEPARATOR, Style::default().fg(theme.muted)));
        }
        let style = if crumb.target.is_some() {
            Style::default().fg(theme.muted)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(crumb.name.clone(), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_main_list_block(
    f: &mut Frame,
    app: &mut TuiApp<'_>,
    view: &PickerView,
    theme: &Theme,
    area: Rect,
) {
    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    app.ensure_cursor_is_visible_in_viewport();

    let rows = view.rows();
    let end = (app.scroll_offset + app.list_viewport_height).min(rows.len());
    let mut list_items: Vec<ListItem> = rows
        .get(app.scroll_offset..end)
        .unwrap_or(&[])
        .iter()
        .map(|item| {
            let line = Line::from(vec![
                Span::styled(theme.glyph(&item.icon).to_string(), Style::default().fg(theme.icon)),
                Span::raw(" "),
                Span::raw(item.name.clone()),
                Span::styled(
                    if item.affordance == Affordance::Expand { CHEVRON } else { "" },
                    Style::default().fg(theme.muted),
                ),
            ]);
            let style = if item.affordance == Affordance::Disabled {
                Style::default().fg(theme.muted)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    if let Some(status) = status_line(&view.list) {
        let color = match view.list {
            ListArea::Failed(_) => theme.error,
            _ => theme.muted,
        };
        list_items.push(ListItem::new(status).style(Style::default().fg(color)));
    }

    let list_title = if view.breadcrumbs.is_none() {
        format!("Questions matching '{}'", app.picker.state().search_text())
    } else {
        app.picker.current_node().name.clone()
    };

    let list_widget = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg),
        )
        .highlight_symbol("❯ ");

    let mut list_state_for_view = ListState::default();
    if !rows.is_empty()
        && app.cursor >= app.scroll_offset
        && app.cursor < app.scroll_offset + app.list_viewport_height
    {
        list_state_for_view.select(Some(app.cursor - app.scroll_offset));
    }
    f.render_stateful_widget(list_widget, area, &mut list_state_for_view);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp<'_>, theme: &Theme) {
    let help_lines = 2;
    let view = app.view();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(help_lines + 2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(frame.area());

    draw_help_block(frame, main_chunks[0]);
    draw_search_block(frame, app, theme, main_chunks[1]);
    draw_breadcrumbs(frame, &view, theme, main_chunks[2]);
    draw_main_list_block(frame, app, &view, theme, main_chunks[3]);
}
