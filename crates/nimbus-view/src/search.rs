//! City search combobox.
//!
//! A search is split into [`SearchBox::begin_search`] and
//! [`SearchBox::finish_search`] so results that arrive after a newer search
//! started can be recognised and dropped.

use nimbus_core::{AppError, Config, RequestTracker, Ticket, WeatherConfig, WeatherError};
use nimbus_weather::GeoPlace;

use crate::client::WeatherSource;

/// Keys the combobox reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// What the caller should do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Nothing,
    /// Run a search for the current query
    Search,
    Choose(GeoPlace),
}

/// Result of applying a geocode response.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A newer search superseded this one
    Stale,
    /// Exactly one match; load it
    Choose(GeoPlace),
    /// Several matches are now listed
    Suggestions,
    NotFound,
    Failed,
}

#[derive(Debug)]
pub struct SearchBox {
    query: String,
    suggestions: Vec<GeoPlace>,
    focused: Option<usize>,
    open: bool,
    error: Option<String>,
    preselect_first: bool,
    limit: usize,
    /// `count` sent with each geocode request
    count: u32,
    tracker: RequestTracker,
}

impl SearchBox {
    pub fn new(limit: usize) -> Self {
        Self::with_count(limit, WeatherConfig::default().geocode_default_count)
    }

    pub fn with_count(limit: usize, count: u32) -> Self {
        Self {
            query: String::new(),
            suggestions: Vec::new(),
            focused: None,
            open: false,
            error: None,
            preselect_first: false,
            limit,
            count,
            tracker: RequestTracker::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_count(
            config.ui.suggestion_limit,
            config.weather.geocode_default_count,
        )
    }

    /// Typing closes the list and drops the highlight.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.close();
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.close();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.focused = None;
    }

    /// Start a search. `None` for a blank query.
    pub fn begin_search(&mut self) -> Option<(Ticket, String)> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        self.error = None;
        Some((self.tracker.issue(), query.to_string()))
    }

    pub fn finish_search(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<GeoPlace>, AppError>,
    ) -> SearchOutcome {
        let Some(result) = self.tracker.accept(ticket, result) else {
            return SearchOutcome::Stale;
        };
        let preselect = std::mem::take(&mut self.preselect_first);

        match result {
            Ok(mut places) => match places.len() {
                0 => {
                    self.suggestions.clear();
                    self.close();
                    let err = WeatherError::PlaceNotFound(self.query.trim().to_string());
                    tracing::debug!("{}", err);
                    self.error = Some(err.to_string());
                    SearchOutcome::NotFound
                }
                1 => {
                    self.suggestions.clear();
                    self.close();
                    SearchOutcome::Choose(places.remove(0))
                }
                _ => {
                    places.truncate(self.limit);
                    self.suggestions = places;
                    self.open = true;
                    self.focused = preselect.then_some(0);
                    SearchOutcome::Suggestions
                }
            },
            Err(e) => {
                tracing::warn!("City search failed: {}", e);
                self.suggestions.clear();
                self.close();
                self.error = Some("Search failed. Please try again.".to_string());
                SearchOutcome::Failed
            }
        }
    }

    /// Full search round trip through `source`.
    pub async fn search(&mut self, source: &dyn WeatherSource) -> Option<SearchOutcome> {
        let (ticket, query) = self.begin_search()?;
        let result = source.geocode(&query, self.count).await;
        Some(self.finish_search(ticket, result))
    }

    pub fn key(&mut self, key: Key) -> KeyAction {
        let len = self.suggestions.len();
        if self.open && len > 0 {
            match key {
                Key::ArrowDown => {
                    self.focused = Some(match self.focused {
                        None => 0,
                        Some(i) => (i + 1) % len,
                    });
                }
                Key::ArrowUp => {
                    self.focused = Some(match self.focused {
                        None | Some(0) => len - 1,
                        Some(i) => i - 1,
                    });
                }
                Key::Enter => {
                    return match self.focused {
                        Some(i) => self.choose(i).map_or(KeyAction::Nothing, KeyAction::Choose),
                        None => KeyAction::Search,
                    };
                }
                Key::Escape => self.close(),
            }
            return KeyAction::Nothing;
        }

        match key {
            Key::ArrowDown if !self.query.trim().is_empty() => {
                self.preselect_first = true;
                KeyAction::Search
            }
            Key::Enter => KeyAction::Search,
            _ => KeyAction::Nothing,
        }
    }

    /// Pick a listed suggestion; closes the list.
    pub fn choose(&mut self, index: usize) -> Option<GeoPlace> {
        let place = self.suggestions.get(index).cloned()?;
        self.close();
        Some(place)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[GeoPlace] {
        &self.suggestions
    }

    pub fn is_open(&self) -> bool {
        self.open && !self.suggestions.is_empty()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
