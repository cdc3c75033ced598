//! The navigation state machine.
//!
//! Two channels drive navigation: UI requests (select, clear, change year)
//! and external URL fragment changes. Both are reconciled into one
//! [`NavigationState`] against the currently loaded store. The navigator
//! writes the canonical fragment back whenever the resolved state differs
//! from what the fragment says, and skips the echo of its own write.
//!
//! Borrows of the application context are never held across an await, so a
//! request arriving while a load is in flight sees the previous store. The
//! latest request always wins: one that resolves against the loaded year
//! invalidates any load still in flight, which then publishes nothing.

use crate::{
    error::{NavError, Result},
    registry::Toggle,
    state::{AppState, Mode, NavigationState},
};
use log::{debug, info, warn};
use std::{cell::RefCell, rc::Rc};
use wqm_core::{config::Config, measurement::ItemKey};
use wqm_data::{
    ranking,
    summary::{self, ReservoirDetail, ReservoirSummary},
};
use wqm_store::{models::DatedRecords, Fetcher, LoadOutcome, Loader, Store};

/// Observable consequence of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A new store was published for `year`.
    Reloaded { year: String, generation: u64 },
    Selected(String),
    Cleared,
    /// The URL fragment was rewritten to this value.
    FragmentWritten(String),
    /// The load cycle failed; state is unchanged.
    LoadFailed(String),
    /// Open trend views were released.
    ViewsReleased(usize),
}

pub struct Navigator<F> {
    loader: Loader<F>,
    app: RefCell<AppState>,
    /// Fragment as last observed or written
    shown: RefCell<Option<String>>,
    /// Our last write, until the external channel echoes it back
    pending_echo: RefCell<Option<String>>,
}

impl<F: Fetcher> Navigator<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        let app = AppState::new(&config);
        Self {
            loader: Loader::new(fetcher, config),
            app: RefCell::new(app),
            shown: RefCell::new(None),
            pending_echo: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        self.loader.config()
    }

    pub fn loader(&self) -> &Loader<F> {
        &self.loader
    }

    pub fn state(&self) -> NavigationState {
        self.app.borrow().nav.clone()
    }

    pub fn mode(&self) -> Mode {
        self.app.borrow().nav.mode()
    }

    pub fn store(&self) -> Rc<Store> {
        Rc::clone(&self.app.borrow().store)
    }

    pub fn error_msg(&self) -> Option<String> {
        self.app.borrow().error_msg.clone()
    }

    /// The fragment as the navigator last saw or wrote it.
    pub fn fragment(&self) -> Option<String> {
        self.shown.borrow().clone()
    }

    /// Load the initial year from the startup fragment, if any.
    pub async fn start(&self, fragment: Option<&str>) -> Vec<Effect> {
        self.on_fragment_changed(fragment.unwrap_or_default()).await
    }

    /// Handle a change of the URL fragment from outside.
    pub async fn on_fragment_changed(&self, fragment: &str) -> Vec<Effect> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        {
            let mut pending = self.pending_echo.borrow_mut();
            if pending.as_deref() == Some(fragment) {
                debug!("nav: skipping echo of {}", fragment);
                *pending = None;
                return Vec::new();
            }
        }
        *self.shown.borrow_mut() = Some(fragment.to_string());

        let current_year = self.app.borrow().nav.year.clone();
        let target = NavigationState::parse_fragment(fragment, &current_year, self.config());
        debug!("nav: fragment {:?} resolves to {}", fragment, target);
        self.apply(target).await
    }

    /// Move to `target`, reloading if its year differs from the loaded one.
    ///
    /// An unsupported year is replaced by the current year. Applying the
    /// current state again does nothing.
    pub async fn apply(&self, mut target: NavigationState) -> Vec<Effect> {
        if !self.config().is_supported_year(&target.year) {
            target.year = self.app.borrow().nav.year.clone();
        }
        let mut effects = Vec::new();
        if self.reconcile(&target, &mut effects).await {
            self.sync_fragment(&mut effects);
        }
        effects
    }

    /// UI request to open a reservoir of the loaded year.
    pub fn select_entity(&self, name: &str) -> Result<Vec<Effect>> {
        if !self.app.borrow().store.contains(name) {
            return Err(NavError::UnknownReservoir(name.to_string()));
        }
        self.loader.invalidate();
        let mut effects = Vec::new();
        self.resolve_selection(Some(name), &mut effects);
        self.sync_fragment(&mut effects);
        Ok(effects)
    }

    /// UI request to close the open reservoir.
    pub fn clear_selection(&self) -> Vec<Effect> {
        self.loader.invalidate();
        let mut effects = Vec::new();
        self.resolve_selection(None, &mut effects);
        self.sync_fragment(&mut effects);
        effects
    }

    /// UI request to show another year. Goes idle after the reload.
    pub async fn set_year(&self, year: &str) -> Result<Vec<Effect>> {
        if !self.config().is_supported_year(year) {
            return Err(NavError::UnsupportedYear(year.to_string()));
        }
        {
            let app = self.app.borrow();
            if app.is_loaded() && app.nav.year == year {
                self.loader.invalidate();
                return Ok(Vec::new());
            }
        }
        Ok(self.apply(NavigationState::idle(year)).await)
    }

    /// Toggle the trend view of an item at a station of the open reservoir.
    pub fn toggle_trend(&self, station_id: &str, key: &ItemKey) -> Result<Toggle> {
        let mut app = self.app.borrow_mut();
        let AppState {
            store, nav, views, ..
        } = &mut *app;
        let name = nav.selected.as_deref().ok_or(NavError::NoSelection)?;
        Ok(views.toggle(store, name, station_id, key))
    }

    pub fn close_trend(&self, id: &str) -> bool {
        self.app.borrow_mut().views.close(id)
    }

    pub fn open_views(&self) -> usize {
        self.app.borrow().views.len()
    }

    /// Ranked summaries of the loaded year whose name matches `query`.
    pub fn visible(&self, query: &str) -> Vec<ReservoirSummary> {
        let app = self.app.borrow();
        let ranked = ranking::rank(app.store.reservoirs());
        ranking::filter(&ranked, query)
            .into_iter()
            .map(|reservoir| summary::summarize(reservoir, app.store.usage(), self.config()))
            .collect()
    }

    /// Every dated entry of a station of the open reservoir, newest first.
    pub fn station_history(&self, station_id: &str) -> Result<Vec<DatedRecords>> {
        let app = self.app.borrow();
        let name = app.nav.selected.as_deref().ok_or(NavError::NoSelection)?;
        Ok(app.store.query_station_history(name, station_id))
    }

    /// Detail view of the open reservoir.
    pub fn detail(&self) -> Option<ReservoirDetail> {
        let app = self.app.borrow();
        let name = app.nav.selected.as_deref()?;
        let reservoir = app.store.reservoir(name)?;
        Some(summary::detail(reservoir, app.store.usage(), self.config()))
    }

    /// Returns false when the request was abandoned (failed or superseded
    /// load), in which case nothing changed.
    async fn reconcile(&self, target: &NavigationState, effects: &mut Vec<Effect>) -> bool {
        let needs_load = {
            let app = self.app.borrow();
            !app.is_loaded() || app.nav.year != target.year
        };
        if !needs_load {
            self.loader.invalidate();
        } else if !self.reload(&target.year, effects).await {
            return false;
        }
        self.resolve_selection(target.selected.as_deref(), effects);
        true
    }

    async fn reload(&self, year: &str, effects: &mut Vec<Effect>) -> bool {
        match self.loader.load(year).await {
            Ok(LoadOutcome::Published(store)) => {
                let mut app = self.app.borrow_mut();
                Self::release_views(&mut app, effects);
                if app.nav.selected.is_some() {
                    effects.push(Effect::Cleared);
                }
                let generation = store.generation();
                app.store = store;
                app.nav = NavigationState::idle(year);
                app.error_msg = None;
                info!("nav: now showing {} (generation {})", year, generation);
                effects.push(Effect::Reloaded {
                    year: year.to_string(),
                    generation,
                });
                true
            }
            Ok(LoadOutcome::Superseded { generation }) => {
                debug!("nav: generation {} for {} superseded", generation, year);
                false
            }
            Err(e) => {
                warn!("nav: could not load {}: {}", year, e);
                let msg = e.to_string();
                self.app.borrow_mut().error_msg = Some(msg.clone());
                effects.push(Effect::LoadFailed(msg));
                false
            }
        }
    }

    /// Select `name` if the loaded store has it, otherwise go idle.
    fn resolve_selection(&self, name: Option<&str>, effects: &mut Vec<Effect>) {
        let mut app = self.app.borrow_mut();
        match name {
            Some(name) if app.store.contains(name) => {
                if app.nav.selected.as_deref() != Some(name) {
                    Self::release_views(&mut app, effects);
                    app.nav.selected = Some(name.to_string());
                    effects.push(Effect::Selected(name.to_string()));
                }
            }
            other => {
                if let Some(name) = other {
                    debug!("nav: {} not found in {}, staying idle", name, app.nav.year);
                }
                if app.nav.selected.take().is_some() {
                    Self::release_views(&mut app, effects);
                    effects.push(Effect::Cleared);
                }
            }
        }
    }

    fn release_views(app: &mut AppState, effects: &mut Vec<Effect>) {
        let released = app.views.release_all();
        if released > 0 {
            effects.push(Effect::ViewsReleased(released));
        }
    }

    fn sync_fragment(&self, effects: &mut Vec<Effect>) {
        let canonical = self.app.borrow().nav.to_fragment();
        if self.shown.borrow().as_deref() == Some(canonical.as_str()) {
            return;
        }
        debug!("nav: writing fragment {}", canonical);
        *self.shown.borrow_mut() = Some(canonical.clone());
        *self.pending_echo.borrow_mut() = Some(canonical.clone());
        effects.push(Effect::FragmentWritten(canonical));
    }
}
