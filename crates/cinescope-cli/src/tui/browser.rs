//! Browser TUI main loop.
//!
//! The key handler runs synchronously and hands back a [`BrowserAction`];
//! the async driver fulfils it (TMDB page loads, list writes) and resumes
//! the loop.
#![allow(clippy::future_not_send)]

use std::io;

use anyhow::{Context, Result};
use cinescope_api::supabase::ListKind;
use cinescope_api::tmdb::{
    DiscoverParams, LocalTmdbApi, MediaItem, MediaKind, MediaPage, MovieCategory, TvCategory,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::instrument;

use super::state::{ActivePane, BrowserAction, BrowserState, GenreOption, InputMode, Status, Tab};
use super::ui;
use crate::library::LibraryBackend;
use crate::report::{ContentUnavailable, report_error, user_message};

type CrosstermTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// First pages of the preloaded tabs and the genre panel content.
#[derive(Debug)]
pub struct BrowserData {
    /// Popular movies.
    pub movies: MediaPage,
    /// Popular shows.
    pub shows: MediaPage,
    /// Animated series.
    pub anime: MediaPage,
    /// Genres for the filter panel.
    pub genres: Vec<GenreOption>,
}

/// Fetches one page of a tab.
///
/// The search tab uses `query`; a blank query yields an empty page.
///
/// # Errors
///
/// Returns an error if the TMDB request fails.
#[instrument(skip(client, query))]
pub async fn fetch_tab(
    client: &impl LocalTmdbApi,
    tab: Tab,
    page: u32,
    query: &str,
) -> Result<MediaPage> {
    match tab {
        Tab::Movies => client.movie_list(MovieCategory::Popular, page).await,
        Tab::Shows => client.tv_list(TvCategory::Popular, page).await,
        Tab::Anime => {
            client
                .discover(&DiscoverParams::anime(MediaKind::Tv).page(page))
                .await
        }
        Tab::Search => client.search_multi(query, page).await,
    }
}

/// Fetches the first page of the movies, shows and anime tabs concurrently.
///
/// # Errors
///
/// Returns an error if any of the three requests fails.
#[instrument(skip_all)]
pub async fn preload_tabs(
    client: &impl LocalTmdbApi,
) -> Result<(MediaPage, MediaPage, MediaPage)> {
    futures::try_join!(
        fetch_tab(client, Tab::Movies, 1, ""),
        fetch_tab(client, Tab::Shows, 1, ""),
        fetch_tab(client, Tab::Anime, 1, ""),
    )
}

/// Runs the browser TUI.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_browser(
    client: &impl LocalTmdbApi,
    library: &LibraryBackend,
    data: BrowserData,
) -> Result<()> {
    let mut state = BrowserState::new(data.genres, library.label());
    state.set_page(Tab::Movies, data.movies);
    state.set_page(Tab::Shows, data.shows);
    state.set_page(Tab::Anime, data.anime);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = drive(&mut terminal, &mut state, client, library).await;

    // Cleanup (always attempt even if the loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Alternates between the key loop and the actions it requests.
async fn drive(
    terminal: &mut CrosstermTerminal,
    state: &mut BrowserState,
    client: &impl LocalTmdbApi,
    library: &LibraryBackend,
) -> Result<()> {
    loop {
        match run_event_loop(terminal, state)? {
            BrowserAction::Quit => return Ok(()),
            BrowserAction::Load { tab, page } => {
                state.set_status(Status::Info(format!(
                    "Loading {} page {page}...",
                    tab.title()
                )));
                terminal
                    .draw(|frame| {
                        ui::draw(frame, state);
                    })
                    .context("failed to draw TUI")?;

                let query = state.search_query.clone();
                match fetch_tab(client, tab, page, &query)
                    .await
                    .context(ContentUnavailable)
                {
                    Ok(loaded) => {
                        state.set_page(tab, loaded);
                        state.status = None;
                    }
                    Err(err) => fail(terminal, state, &err)?,
                }
            }
            BrowserAction::Save { list, item } => match library.add(list, &item).await {
                Ok(added) => {
                    state.set_status(Status::Info(save_message(list, &item.title, added)));
                }
                Err(err) => fail(terminal, state, &err)?,
            },
        }
    }
}

/// Logs a failed action and shows its user message in the status line.
fn fail(
    terminal: &mut CrosstermTerminal,
    state: &mut BrowserState,
    err: &anyhow::Error,
) -> Result<()> {
    report_error(err);
    // Log output lands on the alternate screen; force a full redraw.
    terminal.clear().context("failed to clear terminal")?;
    state.set_status(Status::Error(user_message(err)));
    Ok(())
}

fn save_message(list: ListKind, title: &str, added: bool) -> String {
    let name = match list {
        ListKind::Favorites => "favorites",
        ListKind::Watched => "watched",
    };
    if added {
        format!("Added \"{title}\" to {name}")
    } else {
        format!("\"{title}\" is already in {name}")
    }
}

/// Key loop. Returns when a key press needs the driver.
fn run_event_loop(
    terminal: &mut CrosstermTerminal,
    state: &mut BrowserState,
) -> Result<BrowserAction> {
    let mut main_area_height: u16 = 0;

    loop {
        terminal
            .draw(|frame| {
                main_area_height = ui::draw(frame, state);
            })
            .context("failed to draw TUI")?;

        let page_size = usize::from(main_area_height.saturating_sub(4));

        if event::poll(std::time::Duration::from_millis(100)).context("failed to poll events")?
            && let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            let action = match state.input_mode {
                InputMode::Filter => {
                    handle_filter_input(state, key.code);
                    None
                }
                InputMode::Search => handle_search_input(state, key.code),
                InputMode::Normal => handle_normal_input(state, key.code, key.modifiers, page_size),
            };
            if let Some(action) = action {
                return Ok(action);
            }
        }
    }
}

/// Handles key input in filter mode.
fn handle_filter_input(state: &mut BrowserState, key: KeyCode) {
    match key {
        KeyCode::Esc => {
            state.set_filter(String::new());
            state.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            state.filter_pop();
        }
        KeyCode::Char(c) => {
            state.filter_push(c);
        }
        _ => {}
    }
}

/// Handles key input in search mode. Returns `Some` when a search is submitted.
fn handle_search_input(state: &mut BrowserState, key: KeyCode) -> Option<BrowserAction> {
    match key {
        KeyCode::Esc => state.cancel_search(),
        KeyCode::Enter => {
            state.submit_search()?;
            return Some(BrowserAction::Load {
                tab: Tab::Search,
                page: 1,
            });
        }
        KeyCode::Backspace => {
            state.search_input.pop();
        }
        KeyCode::Char(c) => state.search_input.push(c),
        _ => {}
    }
    None
}

/// Handles key input in normal mode. Returns `Some` when the driver must act.
fn handle_normal_input(
    state: &mut BrowserState,
    key: KeyCode,
    modifiers: KeyModifiers,
    page_size: usize,
) -> Option<BrowserAction> {
    if state.active_pane == ActivePane::Genres {
        match key {
            KeyCode::Char(' ') => {
                state.toggle_current_genre();
                return None;
            }
            KeyCode::Char('c') if !modifiers.contains(KeyModifiers::CONTROL) => {
                state.clear_genres();
                return None;
            }
            KeyCode::Esc => {
                state.toggle_genre_panel();
                return None;
            }
            _ => {}
        }
    }

    let tab = state.active_tab;
    match key {
        KeyCode::Char('q') => return Some(BrowserAction::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(BrowserAction::Quit);
        }
        KeyCode::Tab => state.next_tab(),
        KeyCode::BackTab => state.prev_tab(),
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(target) = c
                .to_digit(10)
                .and_then(|d| usize::try_from(d).ok())
                .and_then(|d| Tab::ALL.get(d.saturating_sub(1)))
            {
                state.select_tab(*target);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => state.move_up(),
        KeyCode::Down | KeyCode::Char('j') => state.move_down(),
        KeyCode::PageUp => state.page_up(page_size),
        KeyCode::PageDown => state.page_down(page_size),
        KeyCode::Char('g') => state.toggle_genre_panel(),
        KeyCode::Char('/') => state.input_mode = InputMode::Filter,
        KeyCode::Char('s') => state.start_search(),
        KeyCode::Char('n') => {
            return state.next_page().map(|page| BrowserAction::Load { tab, page });
        }
        KeyCode::Char('p') => {
            return state.prev_page().map(|page| BrowserAction::Load { tab, page });
        }
        KeyCode::Char('r') => {
            return state.reload_page().map(|page| BrowserAction::Load { tab, page });
        }
        KeyCode::Char('f') => return state.save_request(ListKind::Favorites),
        KeyCode::Char('w') => return state.save_request(ListKind::Watched),
        KeyCode::Char('o') => open_selected(state, |url| open::that(url)),
        _ => {}
    }
    None
}

/// Opens the TMDB page of the selected title with `opener` and reports the outcome.
fn open_selected(state: &mut BrowserState, opener: impl FnOnce(&str) -> std::io::Result<()>) {
    let Some(url) = state.current_item().map(MediaItem::tmdb_url) else {
        return;
    };
    let status = match opener(&url) {
        Ok(()) => Status::Info(format!("Opened {url}")),
        Err(err) => Status::Error(format!("Cannot open {url}: {err}")),
    };
    state.set_status(status);
}
