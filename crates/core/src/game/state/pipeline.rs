//! City → catalog → availability → reachability.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use super::{GameState, Request};
use crate::{
    error::GameError,
    game::tokens::{Resource, Token},
    models::{GameStatus, LineCatalog, LineInfo},
    service::ServiceError,
};

pub(super) fn non_empty(station: Option<String>) -> Option<String> {
    station
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl GameState {
    pub(super) fn set_city(&mut self, id: &str, requests: &mut Vec<Request>) {
        let Some(city) = self.cities.get(id).cloned() else {
            warn!(city = id, "ignoring unknown city");
            return;
        };

        let is_new_city = city.id != self.city.id;
        let needs_load = self.catalog.is_none() && !self.tokens.is_pending(Resource::Catalog);

        if is_new_city {
            info!(from = %self.city.id, to = %city.id, "switching city");
            self.tokens.invalidate_all();
            self.busy = false;
            self.catalog = None;
            self.selection.clear();
            self.available.clear();
            self.reachable.clear();
            self.start = None;
            self.end = None;
            self.clear_answer();
            self.set_status(GameStatus::Setup);
            self.city = city;
        }

        if is_new_city || needs_load {
            let token = self.tokens.issue(Resource::Catalog);
            info!(city = %self.city.id, seq = token.seq, "loading line catalog");
            requests.push(Request::LoadCatalog {
                token,
                city: self.city.id.clone(),
            });
        }
    }

    pub(super) fn on_catalog(
        &mut self,
        token: Token,
        result: Result<(Vec<String>, HashMap<String, LineInfo>), ServiceError>,
    ) {
        if !self.tokens.complete(token) {
            debug!(seq = token.seq, "discarding stale catalog response");
            return;
        }
        match result {
            Ok((lines, metadata)) => {
                info!(city = %self.city.id, lines = lines.len(), "line catalog loaded");
                self.catalog = Some(LineCatalog::new(lines, metadata, token.seq));
            }
            Err(err) => {
                error!(?err, city = %self.city.id, "failed to load line catalog");
                self.catalog = None;
                self.fail(GameError::load("Failed to load metro lines"));
            }
        }
    }

    pub(super) fn toggle_line(&mut self, line: &str, requests: &mut Vec<Request>) {
        if line.is_empty() {
            return;
        }
        match self.selection.iter().position(|selected| selected == line) {
            Some(index) => {
                self.selection.remove(index);
            }
            None => self.selection.push(line.to_string()),
        }
        debug!(line, selected = self.selection.len(), "line toggled");
        self.selection_changed(requests);
    }

    pub(super) fn select_all_lines(&mut self, requests: &mut Vec<Request>) {
        self.selection = self.all_lines().to_vec();
        self.selection_changed(requests);
    }

    pub(super) fn clear_lines(&mut self, requests: &mut Vec<Request>) {
        self.selection.clear();
        self.selection_changed(requests);
    }

    /// A round is tied to the lines it was started with; changing them ends it.
    fn selection_changed(&mut self, requests: &mut Vec<Request>) {
        if self.busy {
            self.cancel_operation();
        }
        if self.status != GameStatus::Setup {
            info!(phase = self.status.label(), "line selection changed; abandoning round");
            self.clear_answer();
            self.set_status(GameStatus::Setup);
        }
        // An answer fetched in setup was computed for the old lines.
        self.forget_answer();
        self.refresh_availability(requests);
    }

    pub(super) fn refresh_availability(&mut self, requests: &mut Vec<Request>) {
        if self.selection.is_empty() {
            self.tokens.invalidate(Resource::Availability);
            self.available.clear();
            self.revalidate_endpoints(requests);
            return;
        }
        let token = self.tokens.issue(Resource::Availability);
        debug!(seq = token.seq, lines = self.selection.len(), "loading available stations");
        requests.push(Request::LoadAvailability {
            token,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
        });
    }

    pub(super) fn on_availability(
        &mut self,
        token: Token,
        result: Result<Vec<String>, ServiceError>,
        requests: &mut Vec<Request>,
    ) {
        if !self.tokens.complete(token) {
            debug!(seq = token.seq, "discarding stale availability response");
            return;
        }
        match result {
            Ok(stations) => {
                debug!(stations = stations.len(), "available stations loaded");
                self.available = stations;
            }
            Err(err) => {
                error!(?err, "failed to load available stations");
                self.available.clear();
                self.fail(GameError::load("Failed to load available stations"));
            }
        }
        self.revalidate_endpoints(requests);
    }

    /// Start must be on the selected lines; end must stay reachable from start.
    fn revalidate_endpoints(&mut self, requests: &mut Vec<Request>) {
        if self.status != GameStatus::Setup {
            return;
        }
        let Some(start) = self.start.clone() else {
            return;
        };
        if !self.available.contains(&start) {
            info!(%start, "start station left the selected lines; clearing endpoints");
            self.start = None;
            self.end = None;
            self.clear_reachability();
            return;
        }
        self.request_reachability(&start, true, requests);
    }

    pub(super) fn clear_reachability(&mut self) {
        self.tokens.invalidate(Resource::Reachability);
        self.reachable.clear();
    }

    pub(super) fn request_reachability(
        &mut self,
        start: &str,
        revalidate_end: bool,
        requests: &mut Vec<Request>,
    ) {
        if self.selection.is_empty() || start.is_empty() {
            self.clear_reachability();
            return;
        }
        let token = self.tokens.issue(Resource::Reachability);
        debug!(seq = token.seq, start, "loading reachable stations");
        requests.push(Request::LoadReachability {
            token,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start: start.to_string(),
            revalidate_end,
        });
    }

    pub(super) fn on_reachability(
        &mut self,
        token: Token,
        revalidate_end: bool,
        result: Result<Vec<String>, ServiceError>,
    ) {
        if !self.tokens.complete(token) {
            debug!(seq = token.seq, "discarding stale reachability response");
            return;
        }
        match result {
            Ok(stations) => {
                debug!(stations = stations.len(), "reachable stations loaded");
                self.reachable = stations;
            }
            Err(err) => {
                error!(?err, "failed to load reachable stations");
                self.reachable.clear();
                self.fail(GameError::load("Failed to load reachable stations"));
            }
        }
        if !revalidate_end || self.status != GameStatus::Setup {
            return;
        }
        if let Some(end) = self.end.as_ref() {
            if !self.reachable.contains(end) {
                info!(%end, "end station no longer reachable; clearing it");
                self.end = None;
            }
        }
    }

    pub(super) fn set_start(&mut self, station: Option<String>, requests: &mut Vec<Request>) {
        if self.status != GameStatus::Setup {
            self.reject("Start a new game before changing the start station");
            return;
        }
        if self.busy {
            self.reject("Cannot change the start station while another operation is running");
            return;
        }
        self.forget_answer();
        self.start = non_empty(station);
        self.end = None;
        self.clear_reachability();
        if let Some(start) = self.start.clone() {
            self.request_reachability(&start, false, requests);
        }
    }

    pub(super) fn set_end(&mut self, station: Option<String>) {
        if self.status != GameStatus::Setup {
            self.reject("Start a new game before changing the end station");
            return;
        }
        if self.busy {
            self.reject("Cannot change the end station while another operation is running");
            return;
        }
        self.forget_answer();
        self.end = non_empty(station);
    }
}
