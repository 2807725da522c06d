//! TUI rendering logic for the browser.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Tabs, Wrap};

use super::state::{ActivePane, BrowserState, InputMode, Status, Tab};

/// Formats a number with thousands separators (e.g. 10000 -> "10,000").
#[allow(clippy::arithmetic_side_effects)]
fn fmt_num(n: u32) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Draws the browser UI. Returns the main content area height for page size calculation.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, state: &mut BrowserState) -> u16 {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // tabs + input
            Constraint::Min(5),    // main content
            Constraint::Length(4), // status + key hints
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);

    let main_area = chunks[1];
    let mut constraints = Vec::with_capacity(3);
    if state.genre_panel_open {
        constraints.push(Constraint::Length(26));
    }
    constraints.push(Constraint::Percentage(55));
    constraints.push(Constraint::Percentage(45));
    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(main_area);

    let (results_area, detail_area) = if state.genre_panel_open {
        draw_genre_panel(frame, pane_chunks[0], state);
        (pane_chunks[1], pane_chunks[2])
    } else {
        (pane_chunks[0], pane_chunks[1])
    };
    draw_result_list(frame, results_area, state);
    draw_detail(frame, detail_area, state);

    draw_footer(frame, chunks[2], state);

    main_area.height
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

/// Draws the tab bar and the filter / search input.
#[allow(clippy::indexing_slicing)]
fn draw_header(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let loaded = state.tab(*tab);
            if loaded.is_loaded() {
                Line::from(format!(
                    "{} ({})",
                    tab.title(),
                    loaded.filtered_items().len()
                ))
            } else {
                Line::from(tab.title())
            }
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.active_tab.index())
        .highlight_style(header_style())
        .block(Block::default().borders(Borders::ALL).title(" CinéScope "));
    frame.render_widget(tabs, header_chunks[0]);

    let (title, text, active) = match state.input_mode {
        InputMode::Search => (" Search: s ", state.search_input.as_str(), true),
        InputMode::Filter => (" Filter: / ", state.filter.as_str(), true),
        InputMode::Normal if state.active_tab == Tab::Search && state.filter.is_empty() => {
            (" Search: s ", state.search_query.as_str(), false)
        }
        InputMode::Normal => (" Filter: / ", state.filter.as_str(), false),
    };
    let input_style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let input = Paragraph::new(text)
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, header_chunks[1]);
}

/// Draws the genre filter panel (left).
fn draw_genre_panel(frame: &mut Frame, area: Rect, state: &mut BrowserState) {
    let rows: Vec<Row> = state
        .genres
        .iter()
        .map(|g| {
            let checked = state.selected_genres.contains(&g.id);
            let mark = if checked { "[x]" } else { "[ ]" };
            let style = if checked {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![String::from(mark), g.name.clone()]).style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(3), Constraint::Min(10)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Genres ")
                .border_style(focus_style(state.active_pane == ActivePane::Genres)),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(table, area, &mut state.genre_table_state);
}

/// Draws the result list pane.
fn draw_result_list(frame: &mut Frame, area: Rect, state: &mut BrowserState) {
    let border_style = focus_style(state.active_pane == ActivePane::Results);
    let active_tab = state.active_tab;

    let tab = state.tab(active_tab);
    let title = if tab.is_loaded() {
        format!(
            " {} - page {}/{} ({} results) ",
            active_tab.title(),
            tab.page,
            tab.total_pages.max(1),
            fmt_num(tab.total_results),
        )
    } else if active_tab == Tab::Search {
        String::from(" Search - press s ")
    } else {
        format!(" {} ", active_tab.title())
    };

    let header = Row::new(vec!["Type", "Title", "Year", "Rating"])
        .style(header_style())
        .bottom_margin(1);

    let rows: Vec<Row> = tab
        .filtered_items()
        .iter()
        .filter_map(|&idx| {
            let item = tab.items.get(idx)?;
            Some(Row::new(vec![
                String::from(item.kind.as_str()),
                item.title.clone(),
                item.year()
                    .map_or_else(|| String::from("--"), |y| y.to_string()),
                format!("{:.1}", item.vote_average),
            ]))
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(5),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(table, area, &mut state.tab_mut(active_tab).table_state);
}

/// Draws the detail pane (right).
fn draw_detail(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");
    let Some(item) = state.current_item() else {
        frame.render_widget(Paragraph::new("No title selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Yellow);
    let genres = item
        .genre_ids
        .iter()
        .filter_map(|id| state.genre_name(*id))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        Line::from(Span::styled(
            item.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(original) = item.original_title.as_deref()
        && original != item.title
    {
        lines.push(Line::from(original.to_owned()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Type: ", label),
        Span::raw(item.kind.as_str()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Date: ", label),
        Span::raw(item.release_date.as_deref().unwrap_or("-").to_owned()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Rating: ", label),
        Span::raw(format!(
            "{:.1} ({} votes)",
            item.vote_average,
            fmt_num(item.vote_count)
        )),
    ]));
    if !genres.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Genres: ", label),
            Span::raw(genres),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("TMDB: ", label),
        Span::raw(item.tmdb_url()),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(
        item.overview
            .as_deref()
            .filter(|o| !o.is_empty())
            .unwrap_or("No overview.")
            .to_owned(),
    ));

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(detail, area);
}

/// Draws the status line and key hints.
fn draw_footer(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let status = match &state.status {
        Some(Status::Info(msg)) => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Green),
        )),
        Some(Status::Error(msg)) => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(format!("Library: {}", state.library_label)),
    };

    let help_text = match (state.input_mode, state.active_pane) {
        (InputMode::Filter, _) => Line::from("Type to filter | Esc: cancel | Enter: apply"),
        (InputMode::Search, _) => Line::from("Type a title | Esc: cancel | Enter: search"),
        (InputMode::Normal, ActivePane::Results) => Line::from(vec![Span::raw(
            "Tab: next tab  \u{2191}\u{2193}/j/k: move  n/p: page  g: genres  /: filter  s: search  f: favorite  w: watched  o: open  q: quit",
        )]),
        (InputMode::Normal, ActivePane::Genres) => Line::from(vec![Span::raw(
            "\u{2191}\u{2193}/j/k: move  Space: toggle  c: clear  g/Esc: close  q: quit",
        )]),
    };

    let footer =
        Paragraph::new(vec![status, help_text]).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
