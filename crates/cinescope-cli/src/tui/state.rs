//! Browser TUI state management.

use std::collections::BTreeSet;

use cinescope_api::supabase::{LibraryItem, ListKind};
use cinescope_api::tmdb::{MAX_PAGE, MediaItem, MediaPage};
use ratatui::widgets::TableState;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Popular movies.
    Movies,
    /// Popular TV shows.
    Shows,
    /// Animated series.
    Anime,
    /// Multi search results.
    Search,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Self; 4] = [Self::Movies, Self::Shows, Self::Anime, Self::Search];

    /// Tab label.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Movies => "Movies",
            Self::Shows => "Shows",
            Self::Anime => "Anime",
            Self::Search => "Search",
        }
    }

    /// Position in [`Tab::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Movies => 0,
            Self::Shows => 1,
            Self::Anime => 2,
            Self::Search => 3,
        }
    }

    /// Following tab, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Movies => Self::Shows,
            Self::Shows => Self::Anime,
            Self::Anime => Self::Search,
            Self::Search => Self::Movies,
        }
    }

    /// Preceding tab, wrapping around.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Movies => Self::Search,
            Self::Shows => Self::Movies,
            Self::Anime => Self::Shows,
            Self::Search => Self::Anime,
        }
    }
}

/// Currently focused pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    /// Result list.
    Results,
    /// Genre filter panel.
    Genres,
}

/// Input mode for the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode.
    Normal,
    /// Local filter text input.
    Filter,
    /// Search query input.
    Search,
}

/// Genre shown in the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreOption {
    /// TMDB genre ID.
    pub id: u32,
    /// Localized name.
    pub name: String,
}

/// Status line message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Informational message.
    Info(String),
    /// Error message.
    Error(String),
}

/// Request produced by a key press that the driver must fulfil.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserAction {
    /// Leave the browser.
    Quit,
    /// Load a page of a tab.
    Load {
        /// Tab to load.
        tab: Tab,
        /// Page number (1-based).
        page: u32,
    },
    /// Add the selected title to a list.
    Save {
        /// Target list.
        list: ListKind,
        /// Title to add.
        item: LibraryItem,
    },
}

/// Loaded results of one tab.
#[derive(Debug, Default)]
pub struct TabState {
    /// Items of the loaded page.
    pub items: Vec<MediaItem>,
    /// Loaded page number (0 when nothing is loaded).
    pub page: u32,
    /// Total pages reported by TMDB.
    pub total_pages: u32,
    /// Total results reported by TMDB.
    pub total_results: u32,
    /// Table state (handles selection and scroll).
    pub table_state: TableState,
    /// Cached filtered item indices.
    filtered_indices: Vec<usize>,
}

impl TabState {
    /// Returns filtered item indices.
    #[must_use]
    pub fn filtered_items(&self) -> &[usize] {
        &self.filtered_indices
    }

    /// Returns the cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    /// Returns the selected item (if any).
    #[must_use]
    pub fn current_item(&self) -> Option<&MediaItem> {
        let idx = self.filtered_indices.get(self.cursor())?;
        self.items.get(*idx)
    }

    /// Returns `true` once a page has been loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.page > 0
    }

    fn select_first(&mut self) {
        if self.filtered_indices.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }
}

/// State for the browser TUI.
#[derive(Debug)]
pub struct BrowserState {
    /// Active tab.
    pub active_tab: Tab,
    /// Results per tab, indexed by [`Tab::index`].
    tabs: [TabState; 4],
    /// Genres offered by the filter panel (sorted by name).
    pub genres: Vec<GenreOption>,
    /// Genre IDs an item must all carry to be shown.
    pub selected_genres: BTreeSet<u32>,
    /// Whether the genre panel is open.
    pub genre_panel_open: bool,
    /// Table state for the genre panel.
    pub genre_table_state: TableState,
    /// Currently focused pane.
    pub active_pane: ActivePane,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Local filter text.
    pub filter: String,
    /// Search query being typed.
    pub search_input: String,
    /// Last submitted search query.
    pub search_query: String,
    /// Status line message.
    pub status: Option<Status>,
    /// Where favorites and watched titles go.
    pub library_label: String,
}

impl BrowserState {
    /// Creates an empty browser state.
    #[must_use]
    pub fn new(genres: Vec<GenreOption>, library_label: String) -> Self {
        Self {
            active_tab: Tab::Movies,
            tabs: Default::default(),
            genres,
            selected_genres: BTreeSet::new(),
            genre_panel_open: false,
            genre_table_state: TableState::default(),
            active_pane: ActivePane::Results,
            input_mode: InputMode::Normal,
            filter: String::new(),
            search_input: String::new(),
            search_query: String::new(),
            status: None,
            library_label,
        }
    }

    /// Returns the state of a tab.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn tab(&self, tab: Tab) -> &TabState {
        &self.tabs[tab.index()]
    }

    /// Returns the state of a tab, mutably.
    #[allow(clippy::indexing_slicing)]
    pub fn tab_mut(&mut self, tab: Tab) -> &mut TabState {
        &mut self.tabs[tab.index()]
    }

    /// Returns the active tab state.
    #[must_use]
    pub fn current_tab(&self) -> &TabState {
        self.tab(self.active_tab)
    }

    /// Returns the selected item of the active tab (if any).
    #[must_use]
    pub fn current_item(&self) -> Option<&MediaItem> {
        self.current_tab().current_item()
    }

    /// Returns the genre under the panel cursor (if any).
    #[must_use]
    pub fn current_genre(&self) -> Option<&GenreOption> {
        self.genres
            .get(self.genre_table_state.selected().unwrap_or(0))
    }

    /// Returns the name of a genre ID (if known).
    #[must_use]
    pub fn genre_name(&self, id: u32) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    /// Replaces a tab's results with a freshly loaded page.
    pub fn set_page(&mut self, tab: Tab, page: MediaPage) {
        let selected_genres = self.selected_genres.clone();
        let filter = fold(&self.filter);
        let state = self.tab_mut(tab);
        state.items = page.items;
        state.page = page.page;
        state.total_pages = page.total_pages;
        state.total_results = page.total_results;
        state.filtered_indices = filtered_indices(&state.items, &filter, &selected_genres);
        state.select_first();
    }

    /// Switches to the next tab.
    pub const fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
    }

    /// Switches to the previous tab.
    pub const fn prev_tab(&mut self) {
        self.active_tab = self.active_tab.prev();
    }

    /// Switches to a tab.
    pub const fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Page to request for "next page", if there is one.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        let tab = self.current_tab();
        let last = tab.total_pages.min(MAX_PAGE);
        (tab.is_loaded() && tab.page < last).then(|| tab.page.saturating_add(1))
    }

    /// Page to request for "previous page", if there is one.
    #[must_use]
    pub fn prev_page(&self) -> Option<u32> {
        let tab = self.current_tab();
        (tab.page > 1).then(|| tab.page.saturating_sub(1))
    }

    /// Page to request to reload the active tab, if it has a source.
    #[must_use]
    pub fn reload_page(&self) -> Option<u32> {
        if self.active_tab == Tab::Search && self.search_query.is_empty() {
            return None;
        }
        Some(self.current_tab().page.max(1))
    }

    /// Moves cursor up.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn move_up(&mut self) {
        let table_state = self.focused_table_state();
        let current = table_state.selected().unwrap_or(0);
        if current > 0 {
            table_state.select(Some(current - 1));
        }
    }

    /// Moves cursor down.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn move_down(&mut self) {
        let count = self.focused_len();
        let table_state = self.focused_table_state();
        let current = table_state.selected().unwrap_or(0);
        if current + 1 < count {
            table_state.select(Some(current + 1));
        }
    }

    /// Scrolls up by a page.
    pub fn page_up(&mut self, page_size: usize) {
        let table_state = self.focused_table_state();
        let current = table_state.selected().unwrap_or(0);
        table_state.select(Some(current.saturating_sub(page_size)));
    }

    /// Scrolls down by a page.
    pub fn page_down(&mut self, page_size: usize) {
        let max = self.focused_len().saturating_sub(1);
        let table_state = self.focused_table_state();
        let current = table_state.selected().unwrap_or(0);
        table_state.select(Some(current.saturating_add(page_size).min(max)));
    }

    fn focused_len(&self) -> usize {
        match self.active_pane {
            ActivePane::Results => self.current_tab().filtered_indices.len(),
            ActivePane::Genres => self.genres.len(),
        }
    }

    fn focused_table_state(&mut self) -> &mut TableState {
        match self.active_pane {
            ActivePane::Results => &mut self.tab_mut(self.active_tab).table_state,
            ActivePane::Genres => &mut self.genre_table_state,
        }
    }

    /// Opens or closes the genre panel, moving focus with it.
    pub fn toggle_genre_panel(&mut self) {
        self.genre_panel_open = !self.genre_panel_open;
        if self.genre_panel_open {
            self.active_pane = ActivePane::Genres;
            if self.genre_table_state.selected().is_none() && !self.genres.is_empty() {
                self.genre_table_state.select(Some(0));
            }
        } else {
            self.active_pane = ActivePane::Results;
        }
    }

    /// Toggles the genre under the panel cursor.
    pub fn toggle_current_genre(&mut self) {
        let Some(id) = self.current_genre().map(|g| g.id) else {
            return;
        };
        if !self.selected_genres.remove(&id) {
            self.selected_genres.insert(id);
        }
        self.rebuild_filter_cache();
    }

    /// Clears the genre selection.
    pub fn clear_genres(&mut self) {
        self.selected_genres.clear();
        self.rebuild_filter_cache();
    }

    /// Updates the filter and rebuilds the cache.
    pub fn set_filter(&mut self, filter: String) {
        self.filter = filter;
        self.rebuild_filter_cache();
    }

    /// Appends a character to the filter.
    pub fn filter_push(&mut self, ch: char) {
        self.filter.push(ch);
        self.rebuild_filter_cache();
    }

    /// Removes the last character from the filter.
    pub fn filter_pop(&mut self) {
        self.filter.pop();
        self.rebuild_filter_cache();
    }

    /// Starts typing a search query on the search tab.
    pub fn start_search(&mut self) {
        self.active_tab = Tab::Search;
        self.active_pane = ActivePane::Results;
        self.search_input.clone_from(&self.search_query);
        self.input_mode = InputMode::Search;
    }

    /// Submits the typed query. Returns `None` if it is blank.
    pub fn submit_search(&mut self) -> Option<String> {
        self.input_mode = InputMode::Normal;
        let query = self.search_input.trim();
        if query.is_empty() {
            return None;
        }
        self.search_query = String::from(query);
        Some(self.search_query.clone())
    }

    /// Abandons the typed query.
    pub fn cancel_search(&mut self) {
        self.search_input.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Builds a save request for the selected title.
    #[must_use]
    pub fn save_request(&self, list: ListKind) -> Option<BrowserAction> {
        self.current_item().map(|item| BrowserAction::Save {
            list,
            item: LibraryItem::from(item),
        })
    }

    /// Sets the status line.
    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    /// Rebuilds the filtered item indices of every tab.
    fn rebuild_filter_cache(&mut self) {
        let filter = fold(&self.filter);
        for tab in &mut self.tabs {
            tab.filtered_indices = filtered_indices(&tab.items, &filter, &self.selected_genres);
            tab.select_first();
        }
    }
}

/// Lowercases and strips diacritics, so "eclair" matches "Éclair".
#[must_use]
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Indices of items matching the folded filter text and carrying every selected genre.
fn filtered_indices(items: &[MediaItem], filter: &str, genres: &BTreeSet<u32>) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| genres.iter().all(|id| item.genre_ids.contains(id)))
        .filter(|(_, item)| {
            filter.is_empty()
                || fold(&item.title).contains(filter)
                || item
                    .original_title
                    .as_deref()
                    .is_some_and(|t| fold(t).contains(filter))
        })
        .map(|(i, _)| i)
        .collect()
}
