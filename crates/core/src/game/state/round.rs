//! Round lifecycle: starting, editing, scoring, revealing and resetting.

use tracing::{debug, error, info};

use super::{pipeline::non_empty, GameState, Request, SolvePurpose};
use crate::{
    error::GameError,
    game::tokens::{Resource, Token},
    models::{GameStatus, PathSolution, RandomPair, ValidationOutcome},
    service::ServiceError,
};

const NEED_LINES: &str = "Please select at least one line";
const NEED_STATIONS: &str = "Please select start and end stations";

impl GameState {
    /// Take the busy flag for a phase-changing operation.
    fn begin_operation(&mut self, allowed: &[GameStatus], action: &str) -> Option<Token> {
        if self.busy {
            self.reject(format!("Cannot {action} while another operation is running"));
            return None;
        }
        if !allowed.contains(&self.status) {
            self.reject(format!(
                "Cannot {action} during the {} phase",
                self.status.label()
            ));
            return None;
        }
        self.busy = true;
        Some(self.tokens.issue(Resource::Operation))
    }

    fn finish_operation(&mut self, token: Token) -> bool {
        if !self.tokens.complete(token) {
            debug!(seq = token.seq, "discarding stale operation response");
            return false;
        }
        self.busy = false;
        true
    }

    fn endpoints(&self) -> Option<(String, String)> {
        Some((self.start.clone()?, self.end.clone()?))
    }

    pub(super) fn generate_random(&mut self, requests: &mut Vec<Request>) {
        if !self.has_selected_lines() {
            self.reject(NEED_LINES);
            return;
        }
        let Some(token) = self.begin_operation(&[GameStatus::Setup], "start a round") else {
            return;
        };
        self.clear_answer();
        info!(lines = self.selection.len(), "requesting random stations");
        requests.push(Request::RandomPair {
            token,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
        });
    }

    pub(super) fn on_random_pair(
        &mut self,
        token: Token,
        result: Result<RandomPair, ServiceError>,
        requests: &mut Vec<Request>,
    ) {
        if !self.tokens.is_current(token) {
            debug!(seq = token.seq, "discarding stale random pair");
            return;
        }
        let pair = match result {
            Ok(pair) if pair.start != pair.end => pair,
            Ok(pair) => {
                self.finish_operation(token);
                error!(station = %pair.start, "service returned identical endpoints");
                self.fail(GameError::compute(SolvePurpose::RandomRound.failure_message()));
                return;
            }
            Err(err) => {
                self.finish_operation(token);
                error!(?err, "failed to generate random stations");
                self.fail(GameError::compute(SolvePurpose::RandomRound.failure_message()));
                return;
            }
        };

        info!(start = %pair.start, end = %pair.end, "random stations chosen");
        self.start = Some(pair.start.clone());
        self.end = Some(pair.end.clone());
        self.clear_reachability();
        self.request_reachability(&pair.start, false, requests);
        requests.push(Request::ShortestPath {
            token,
            purpose: SolvePurpose::RandomRound,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start: pair.start,
            end: pair.end,
        });
    }

    pub(super) fn set_endpoints(&mut self, start: String, end: String, requests: &mut Vec<Request>) {
        let (Some(start), Some(end)) = (non_empty(Some(start)), non_empty(Some(end))) else {
            return;
        };
        if !self.has_selected_lines() {
            self.reject(NEED_LINES);
            return;
        }
        if start == end {
            self.reject("Start and end stations must differ");
            return;
        }
        let Some(token) = self.begin_operation(&[GameStatus::Setup], "start a round") else {
            return;
        };

        self.clear_answer();
        let start_changed = self.start.as_deref() != Some(start.as_str());
        self.start = Some(start.clone());
        self.end = Some(end.clone());
        if start_changed {
            self.clear_reachability();
            self.request_reachability(&start, false, requests);
        }
        info!(%start, %end, "calculating shortest path for chosen stations");
        requests.push(Request::ShortestPath {
            token,
            purpose: SolvePurpose::ChosenRound,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start,
            end,
        });
    }

    pub(super) fn on_path_calculated(
        &mut self,
        token: Token,
        purpose: SolvePurpose,
        result: Result<PathSolution, ServiceError>,
    ) {
        if !self.finish_operation(token) {
            return;
        }
        let solution = match result {
            Ok(solution) => solution,
            Err(err) => {
                error!(?err, ?purpose, "shortest path calculation failed");
                self.fail(GameError::compute(purpose.failure_message()));
                return;
            }
        };
        info!(
            ?purpose,
            cost = solution.shortest_cost,
            paths = solution.paths.len(),
            "shortest path calculated"
        );
        self.solution = Some(solution);

        match purpose {
            SolvePurpose::RandomRound | SolvePurpose::ChosenRound => {
                let Some((start, end)) = self.endpoints() else {
                    self.fail(GameError::compute(purpose.failure_message()));
                    return;
                };
                self.path.seed(&start, &end);
                self.set_status(GameStatus::Playing);
            }
            SolvePurpose::Reveal => self.revealed = true,
            SolvePurpose::Query => {
                self.revealed = true;
                self.set_status(GameStatus::Query);
            }
        }
    }

    pub(super) fn submit(&mut self, requests: &mut Vec<Request>) {
        if !self.can_submit() {
            self.reject("Path must have at least 2 stations");
            return;
        }
        let Some((start, end)) = self.endpoints() else {
            self.reject(NEED_STATIONS);
            return;
        };
        let Some(token) = self.begin_operation(&[GameStatus::Playing], "submit a path") else {
            return;
        };
        info!(stations = self.path.len(), "submitting path");
        requests.push(Request::ValidatePath {
            token,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start,
            end,
            user_path: self.path.stations().to_vec(),
        });
    }

    pub(super) fn on_path_validated(
        &mut self,
        token: Token,
        result: Result<ValidationOutcome, ServiceError>,
    ) {
        if !self.finish_operation(token) {
            return;
        }
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(?err, "path validation failed");
                self.fail(GameError::validation("Failed to validate path"));
                return;
            }
        };
        info!(
            valid = outcome.valid,
            is_shortest = outcome.is_shortest,
            cost = outcome.shortest_cost,
            "path validated"
        );
        self.solution = Some(PathSolution {
            shortest_cost: outcome.shortest_cost,
            paths: outcome.all_shortest_paths.clone(),
        });
        // A wrong answer keeps the round open with the path intact.
        self.revealed = outcome.is_shortest;
        if outcome.is_shortest {
            self.set_status(GameStatus::Result);
        }
        self.validation = Some(outcome);
    }

    pub(super) fn reveal_answer(&mut self, requests: &mut Vec<Request>) {
        if self.busy {
            self.reject("Cannot reveal the answer while another operation is running");
            return;
        }
        if !self.system_paths().is_empty() {
            self.revealed = true;
            return;
        }
        let Some((start, end)) = self.endpoints() else {
            self.reject(NEED_STATIONS);
            return;
        };
        // In setup the answer is shown without starting a round.
        let allowed = [
            GameStatus::Setup,
            GameStatus::Playing,
            GameStatus::Result,
            GameStatus::Query,
        ];
        let Some(token) = self.begin_operation(&allowed, "reveal the answer") else {
            return;
        };
        info!(%start, %end, "fetching answer before revealing it");
        requests.push(Request::ShortestPath {
            token,
            purpose: SolvePurpose::Reveal,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start,
            end,
        });
    }

    pub(super) fn query_route(&mut self, requests: &mut Vec<Request>) {
        let Some((start, end)) = self.endpoints() else {
            self.reject(NEED_STATIONS);
            return;
        };
        let allowed = [GameStatus::Setup, GameStatus::Query];
        let Some(token) = self.begin_operation(&allowed, "look up a route") else {
            return;
        };
        self.validation = None;
        info!(%start, %end, "querying route");
        requests.push(Request::ShortestPath {
            token,
            purpose: SolvePurpose::Query,
            city: self.city.id.clone(),
            lines: self.selection.clone(),
            start,
            end,
        });
    }

    pub(super) fn reset(&mut self, requests: &mut Vec<Request>) {
        info!(phase = self.status.label(), "resetting game");
        self.cancel_operation();
        self.start = None;
        self.end = None;
        self.clear_reachability();
        self.clear_answer();
        self.set_status(GameStatus::Setup);
        if self.has_selected_lines() {
            self.refresh_availability(requests);
        }
    }

    /// Setup edits freely; a running round keeps its endpoints pinned.
    fn path_editable(&mut self) -> bool {
        match self.status {
            GameStatus::Setup | GameStatus::Playing => true,
            GameStatus::Result | GameStatus::Query => {
                self.reject("The path cannot be edited now; start a new game");
                false
            }
        }
    }

    pub(super) fn append_station(&mut self, station: &str) {
        if !self.path_editable() {
            return;
        }
        let before_end = self.status == GameStatus::Playing;
        if self.path.append(station.trim(), before_end) {
            debug!(station, len = self.path.len(), "station added to path");
        }
    }

    pub(super) fn insert_station(&mut self, station: &str, index: usize) {
        if !self.path_editable() {
            return;
        }
        let station = station.trim();
        let inserted = if self.status == GameStatus::Playing {
            self.path.insert_between_anchors(station, index)
        } else {
            self.path.insert_at(station, index)
        };
        if inserted {
            debug!(station, index, "station inserted into path");
        }
    }

    pub(super) fn remove_station(&mut self, index: usize) {
        if !self.path_editable() {
            return;
        }
        match self.path.remove_at(index) {
            Some(station) => debug!(%station, index, "station removed from path"),
            None => debug!(index, "refusing to remove path endpoint"),
        }
    }

    pub(super) fn clear_path(&mut self) {
        if !self.path_editable() {
            return;
        }
        let start = self.start.clone();
        let end = self.end.clone();
        self.path.clear_intermediate(start.as_deref(), end.as_deref());
    }
}
