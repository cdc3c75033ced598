//! Navigation state, its URL fragment form, and the application context.
//!
//! `AppState` bundles everything one session owns into a single value: the
//! current store, the navigation state, the last failure notice and the open
//! trend views. It is created at startup and its store is replaced wholesale
//! on every year change.

use crate::registry::ViewRegistry;
use std::{fmt, rc::Rc};
use wqm_core::config::Config;
use wqm_store::Store;

/// Which year is shown and which reservoir, if any, is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub year: String,
    pub selected: Option<String>,
}

/// Whether a reservoir detail is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Detail,
}

impl NavigationState {
    pub fn new(year: &str, selected: Option<&str>) -> Self {
        Self {
            year: year.to_string(),
            selected: selected.map(str::to_string),
        }
    }

    pub fn idle(year: &str) -> Self {
        Self::new(year, None)
    }

    pub fn mode(&self) -> Mode {
        match self.selected {
            Some(_) => Mode::Detail,
            None => Mode::Idle,
        }
    }

    /// `<year>` or `<year>/<url-encoded name>`.
    pub fn to_fragment(&self) -> String {
        match &self.selected {
            Some(name) => format!("{}/{}", self.year, urlencoding::encode(name)),
            None => self.year.clone(),
        }
    }

    /// Parse a URL fragment into a candidate state.
    ///
    /// A leading `#` is ignored. An empty fragment means the default year with
    /// nothing selected. An unsupported or malformed year token falls back to
    /// `current_year`. A name that is not valid percent-encoding is taken
    /// verbatim.
    pub fn parse_fragment(fragment: &str, current_year: &str, config: &Config) -> Self {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Self::idle(&config.default_year);
        }

        let (year_token, name_token) = match fragment.split_once('/') {
            Some((year, rest)) => (year, Some(rest)),
            None => (fragment, None),
        };
        let year = if config.is_supported_year(year_token) {
            year_token
        } else {
            current_year
        };
        // Names never contain an unescaped '/', anything after a second one is noise.
        let selected = name_token
            .map(|token| token.split('/').next().unwrap_or_default())
            .filter(|token| !token.is_empty())
            .map(|token| match urlencoding::decode(token) {
                Ok(name) => name.into_owned(),
                Err(_) => token.to_string(),
            });
        Self {
            year: year.to_string(),
            selected,
        }
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fragment())
    }
}

/// Per-session application context.
pub struct AppState {
    /// Current store; generation 0 until the first load publishes
    pub store: Rc<Store>,
    pub nav: NavigationState,
    /// Failure notice of the last load cycle, cleared by the next success
    pub error_msg: Option<String>,
    pub views: ViewRegistry,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: Rc::new(Store::empty(&config.default_year)),
            nav: NavigationState::idle(&config.default_year),
            error_msg: None,
            views: ViewRegistry::new(),
        }
    }

    /// True once a load cycle has published a store.
    pub fn is_loaded(&self) -> bool {
        self.store.generation() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_forms() {
        assert_eq!(NavigationState::idle("2023").to_fragment(), "2023");
        assert_eq!(
            NavigationState::new("2024", Some("石門水庫")).to_fragment(),
            "2024/%E7%9F%B3%E9%96%80%E6%B0%B4%E5%BA%AB"
        );
        assert_eq!(
            NavigationState::new("2024", Some("Reservoir X")).to_fragment(),
            "2024/Reservoir%20X"
        );
    }

    #[test]
    fn test_fragment_round_trip() {
        let config = Config::default();
        for state in [
            NavigationState::new("2024", Some("Reservoir X")),
            NavigationState::new("2021", Some("A/B & C")),
            NavigationState::idle("2019"),
        ] {
            let parsed = NavigationState::parse_fragment(&state.to_fragment(), "2020", &config);
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_empty_fragment_is_default_year() {
        let config = Config::default();
        assert_eq!(
            NavigationState::parse_fragment("", "2021", &config),
            NavigationState::idle("2024")
        );
        assert_eq!(
            NavigationState::parse_fragment("#", "2021", &config),
            NavigationState::idle("2024")
        );
    }

    #[test]
    fn test_bad_year_falls_back_to_current() {
        let config = Config::default();
        assert_eq!(
            NavigationState::parse_fragment("#1999/A", "2022", &config),
            NavigationState::new("2022", Some("A"))
        );
        assert_eq!(
            NavigationState::parse_fragment("abc", "2022", &config),
            NavigationState::idle("2022")
        );
    }

    #[test]
    fn test_malformed_name_is_kept() {
        let config = Config::default();
        let parsed = NavigationState::parse_fragment("2024/%FF", "2024", &config);
        assert_eq!(parsed.selected.as_deref(), Some("%FF"));
        let parsed = NavigationState::parse_fragment("2024/", "2024", &config);
        assert_eq!(parsed.mode(), Mode::Idle);
    }
}
