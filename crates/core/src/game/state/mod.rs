//! Pure game state machine.
//!
//! [`GameState::update`] applies one [`Event`] and returns the [`Request`]s the
//! caller must run against the graph service. Responses come back as events
//! carrying the token of the request that produced them, so overlapping loads
//! resolve to whichever request was issued last.

mod pipeline;
mod round;

use std::{collections::HashMap, sync::Arc};

use tracing::{info, warn};

use super::{
    membership::{MembershipCache, StationLines},
    path::PathEditor,
    tokens::{Resource, SequenceTokens, Token},
};
use crate::{
    city::{City, CityRegistry},
    error::GameError,
    models::{
        display_cost, GameStatus, LineCatalog, LineInfo, PathSolution, RandomPair, SystemPath,
        ValidationOutcome,
    },
    service::ServiceError,
};

/// What a shortest-path request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePurpose {
    /// Second step of a random round.
    RandomRound,
    /// Round with caller-chosen endpoints.
    ChosenRound,
    /// Answer requested by the player.
    Reveal,
    /// Read-only route lookup.
    Query,
}

impl SolvePurpose {
    fn failure_message(self) -> &'static str {
        match self {
            SolvePurpose::RandomRound => "Failed to generate random stations",
            SolvePurpose::ChosenRound => "Failed to calculate path",
            SolvePurpose::Reveal => "Failed to fetch answer",
            SolvePurpose::Query => "Failed to query route",
        }
    }
}

/// Player actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Switch to a city by id.
    SetCity(String),
    /// Add or remove a line from the selection.
    ToggleLine(String),
    /// Select every catalog line.
    SelectAllLines,
    /// Deselect every line.
    ClearLines,
    /// Choose (or clear) the start station.
    SetStart(Option<String>),
    /// Choose (or clear) the end station.
    SetEnd(Option<String>),
    /// Start a round between two random stations.
    GenerateRandom,
    /// Start a round between chosen stations.
    SetEndpoints {
        /// Start station.
        start: String,
        /// End station.
        end: String,
    },
    /// Add a stop to the path.
    AppendStation(String),
    /// Insert a stop at a position.
    InsertStation {
        /// Station to insert.
        station: String,
        /// Target position.
        index: usize,
    },
    /// Remove the stop at a position.
    RemoveStation(usize),
    /// Drop every intermediate stop.
    ClearPath,
    /// Score the current path.
    Submit,
    /// Show the optimal answer.
    RevealAnswer,
    /// Look up the route between the chosen stations.
    QueryRoute,
    /// Back to setup, keeping the city and lines.
    Reset,
    /// Same as [`Intent::Reset`].
    NewGame,
}

/// Graph service call the state machine wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Line list followed by line metadata.
    LoadCatalog {
        /// Stamp to echo back.
        token: Token,
        /// City path segment.
        city: String,
    },
    /// Stations on the selected lines.
    LoadAvailability {
        /// Stamp to echo back.
        token: Token,
        /// City path segment.
        city: String,
        /// Selected lines.
        lines: Vec<String>,
    },
    /// Stations reachable from `start`.
    LoadReachability {
        /// Stamp to echo back.
        token: Token,
        /// City path segment.
        city: String,
        /// Selected lines.
        lines: Vec<String>,
        /// Start station.
        start: String,
        /// Clear the end station if the reply no longer contains it.
        revalidate_end: bool,
    },
    /// Random endpoints.
    RandomPair {
        /// Stamp to echo back.
        token: Token,
        /// City path segment.
        city: String,
        /// Selected lines.
        lines: Vec<String>,
    },
    /// Shortest paths between two stations.
    ShortestPath {
        /// Stamp to echo back.
        token: Token,
        /// How the answer will be used.
        purpose: SolvePurpose,
        /// City path segment.
        city: String,
        /// Selected lines.
        lines: Vec<String>,
        /// Start station.
        start: String,
        /// End station.
        end: String,
    },
    /// Score the player's path.
    ValidatePath {
        /// Stamp to echo back.
        token: Token,
        /// City path segment.
        city: String,
        /// Selected lines.
        lines: Vec<String>,
        /// Start station.
        start: String,
        /// End station.
        end: String,
        /// Path to score.
        user_path: Vec<String>,
    },
}

impl Request {
    /// Stamp of this request.
    pub fn token(&self) -> Token {
        match self {
            Request::LoadCatalog { token, .. }
            | Request::LoadAvailability { token, .. }
            | Request::LoadReachability { token, .. }
            | Request::RandomPair { token, .. }
            | Request::ShortestPath { token, .. }
            | Request::ValidatePath { token, .. } => *token,
        }
    }
}

/// Graph service reply, tagged with the request token.
#[derive(Debug)]
pub enum Response {
    /// Reply to [`Request::LoadCatalog`].
    CatalogLoaded {
        /// Echoed stamp.
        token: Token,
        /// Lines and their metadata.
        result: Result<(Vec<String>, HashMap<String, LineInfo>), ServiceError>,
    },
    /// Reply to [`Request::LoadAvailability`].
    AvailabilityLoaded {
        /// Echoed stamp.
        token: Token,
        /// Available stations.
        result: Result<Vec<String>, ServiceError>,
    },
    /// Reply to [`Request::LoadReachability`].
    ReachabilityLoaded {
        /// Echoed stamp.
        token: Token,
        /// Echoed from the request.
        revalidate_end: bool,
        /// Reachable stations.
        result: Result<Vec<String>, ServiceError>,
    },
    /// Reply to [`Request::RandomPair`].
    RandomPairGenerated {
        /// Echoed stamp.
        token: Token,
        /// Chosen endpoints.
        result: Result<RandomPair, ServiceError>,
    },
    /// Reply to [`Request::ShortestPath`].
    PathCalculated {
        /// Echoed stamp.
        token: Token,
        /// Echoed from the request.
        purpose: SolvePurpose,
        /// Optimal cost and paths.
        result: Result<PathSolution, ServiceError>,
    },
    /// Reply to [`Request::ValidatePath`].
    PathValidated {
        /// Echoed stamp.
        token: Token,
        /// Score.
        result: Result<ValidationOutcome, ServiceError>,
    },
}

/// Input to [`GameState::update`].
#[derive(Debug)]
pub enum Event {
    /// Something the player did.
    Intent(Intent),
    /// Something the graph service answered.
    Response(Response),
}

/// Complete client-side game state.
#[derive(Debug, Clone)]
pub struct GameState {
    cities: CityRegistry,
    city: City,
    catalog: Option<LineCatalog>,
    selection: Vec<String>,
    available: Vec<String>,
    reachable: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    path: PathEditor,
    solution: Option<PathSolution>,
    validation: Option<ValidationOutcome>,
    revealed: bool,
    status: GameStatus,
    busy: bool,
    error: Option<GameError>,
    tokens: SequenceTokens,
    membership: MembershipCache,
}

impl GameState {
    /// Fresh state for `city` (resolved through the registry). Nothing is loaded yet;
    /// dispatch [`Intent::SetCity`] to fetch the catalog.
    pub fn new(cities: CityRegistry, city: &str) -> Self {
        let city = cities
            .resolve(city)
            .cloned()
            .unwrap_or_else(|| City {
                id: city.to_string(),
                name: city.to_string(),
                title: city.to_string(),
                subtitle: String::new(),
            });
        Self {
            cities,
            city,
            catalog: None,
            selection: Vec::new(),
            available: Vec::new(),
            reachable: Vec::new(),
            start: None,
            end: None,
            path: PathEditor::default(),
            solution: None,
            validation: None,
            revealed: false,
            status: GameStatus::Setup,
            busy: false,
            error: None,
            tokens: SequenceTokens::default(),
            membership: MembershipCache::default(),
        }
    }

    /// Apply one event, returning the service calls to perform.
    pub fn update(&mut self, event: Event) -> Vec<Request> {
        match event {
            Event::Intent(intent) => self.handle_intent(intent),
            Event::Response(response) => self.handle_response(response),
        }
    }

    /// Apply a player action.
    pub fn handle_intent(&mut self, intent: Intent) -> Vec<Request> {
        let mut requests = Vec::new();
        self.error = None;
        match intent {
            Intent::SetCity(city) => self.set_city(&city, &mut requests),
            Intent::ToggleLine(line) => self.toggle_line(&line, &mut requests),
            Intent::SelectAllLines => self.select_all_lines(&mut requests),
            Intent::ClearLines => self.clear_lines(&mut requests),
            Intent::SetStart(station) => self.set_start(station, &mut requests),
            Intent::SetEnd(station) => self.set_end(station),
            Intent::GenerateRandom => self.generate_random(&mut requests),
            Intent::SetEndpoints { start, end } => self.set_endpoints(start, end, &mut requests),
            Intent::AppendStation(station) => self.append_station(&station),
            Intent::InsertStation { station, index } => self.insert_station(&station, index),
            Intent::RemoveStation(index) => self.remove_station(index),
            Intent::ClearPath => self.clear_path(),
            Intent::Submit => self.submit(&mut requests),
            Intent::RevealAnswer => self.reveal_answer(&mut requests),
            Intent::QueryRoute => self.query_route(&mut requests),
            Intent::Reset | Intent::NewGame => self.reset(&mut requests),
        }
        requests
    }

    /// Apply a graph service reply. Stale replies are dropped.
    pub fn handle_response(&mut self, response: Response) -> Vec<Request> {
        let mut requests = Vec::new();
        match response {
            Response::CatalogLoaded { token, result } => self.on_catalog(token, result),
            Response::AvailabilityLoaded { token, result } => {
                self.on_availability(token, result, &mut requests)
            }
            Response::ReachabilityLoaded {
                token,
                revalidate_end,
                result,
            } => self.on_reachability(token, revalidate_end, result),
            Response::RandomPairGenerated { token, result } => {
                self.on_random_pair(token, result, &mut requests)
            }
            Response::PathCalculated {
                token,
                purpose,
                result,
            } => self.on_path_calculated(token, purpose, result),
            Response::PathValidated { token, result } => self.on_path_validated(token, result),
        }
        requests
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            info!(from = self.status.label(), to = status.label(), "game phase changed");
            self.status = status;
        }
    }

    fn reject(&mut self, message: impl Into<String>) {
        let error = GameError::precondition(message);
        warn!(message = error.message(), "operation rejected");
        self.error = Some(error);
    }

    fn fail(&mut self, error: GameError) {
        self.error = Some(error);
    }

    /// Drop path, answer, score and reveal flag.
    fn clear_answer(&mut self) {
        self.path.clear();
        self.forget_answer();
    }

    /// Drop answer, score and reveal flag but keep the path.
    fn forget_answer(&mut self) {
        self.solution = None;
        self.validation = None;
        self.revealed = false;
    }

    /// Cancel the in-flight game operation, if any, and release the busy flag.
    fn cancel_operation(&mut self) {
        if self.busy || self.tokens.is_pending(Resource::Operation) {
            info!("cancelling in-flight game operation");
        }
        self.tokens.invalidate(Resource::Operation);
        self.busy = false;
    }

    // --- read access -------------------------------------------------------

    /// Known cities.
    pub fn cities(&self) -> &CityRegistry {
        &self.cities
    }

    /// Active city.
    pub fn city(&self) -> &City {
        &self.city
    }

    /// Loaded catalog, if any.
    pub fn catalog(&self) -> Option<&LineCatalog> {
        self.catalog.as_ref()
    }

    /// Every catalog line, in catalog order.
    pub fn all_lines(&self) -> &[String] {
        self.catalog.as_ref().map(LineCatalog::lines).unwrap_or_default()
    }

    /// Selected lines in selection order.
    pub fn selected_lines(&self) -> &[String] {
        &self.selection
    }

    /// Selected lines in catalog order.
    pub fn sorted_selected_lines(&self) -> Vec<String> {
        self.all_lines()
            .iter()
            .filter(|line| self.selection.contains(*line))
            .cloned()
            .collect()
    }

    /// Whether `line` is selected.
    pub fn is_line_selected(&self, line: &str) -> bool {
        self.selection.iter().any(|selected| selected == line)
    }

    /// Stations on the selected lines.
    pub fn available_stations(&self) -> &[String] {
        &self.available
    }

    /// Stations reachable from the start station.
    pub fn reachable_stations(&self) -> &[String] {
        &self.reachable
    }

    /// Start station.
    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    /// End station.
    pub fn end(&self) -> Option<&str> {
        self.end.as_deref()
    }

    /// Candidate path.
    pub fn path(&self) -> &PathEditor {
        &self.path
    }

    /// Known optimal answer.
    pub fn solution(&self) -> Option<&PathSolution> {
        self.solution.as_ref()
    }

    /// Optimal paths known so far.
    pub fn system_paths(&self) -> &[SystemPath] {
        self.solution
            .as_ref()
            .map(|solution| solution.paths.as_slice())
            .unwrap_or_default()
    }

    /// Raw optimal cost, 0 when unknown.
    pub fn shortest_cost(&self) -> f64 {
        self.solution
            .as_ref()
            .map(|solution| solution.shortest_cost)
            .unwrap_or_default()
    }

    /// Optimal cost rounded up for display.
    pub fn display_cost(&self) -> u64 {
        display_cost(self.shortest_cost())
    }

    /// Score of the last submission.
    pub fn validation(&self) -> Option<&ValidationOutcome> {
        self.validation.as_ref()
    }

    /// Whether the optimal answer is shown.
    pub fn revealed(&self) -> bool {
        self.revealed
    }

    /// Current phase.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Whether a game operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether a load for `resource` is in flight.
    pub fn is_loading(&self, resource: Resource) -> bool {
        self.tokens.is_pending(resource)
    }

    /// Error from the last operation.
    pub fn error(&self) -> Option<&GameError> {
        self.error.as_ref()
    }

    /// Whether any line is selected.
    pub fn has_selected_lines(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Whether both endpoints are chosen.
    pub fn has_stations(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Whether the path is long enough to submit.
    pub fn can_submit(&self) -> bool {
        self.path.len() >= 2
    }

    /// Whether a round or lookup is on screen.
    pub fn is_playing(&self) -> bool {
        matches!(
            self.status,
            GameStatus::Playing | GameStatus::Result | GameStatus::Query
        )
    }

    /// Station → line badges for the selected lines.
    pub fn station_lines(&self) -> Arc<StationLines> {
        match self.catalog.as_ref() {
            Some(catalog) => self.membership.get(&self.selection, catalog),
            None => Arc::default(),
        }
    }
}
