//! Async driver connecting [`GameState`] to a [`GraphService`].
//!
//! Each [`Request`] produced by the state machine runs as its own tokio task and
//! reports back over an mpsc channel. The owner of the receiver feeds replies to
//! [`GameEngine::apply`], usually from a `tokio::select!` loop.

use std::{future::Future, sync::Arc};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    game::{Event, GameState, Intent, Request, Response},
    service::{fetch_catalog, GraphService, ServiceError},
};

const RESPONSE_BUFFER: usize = 64;

/// Owns the game state and runs its service calls in the background.
pub struct GameEngine<S> {
    state: GameState,
    service: Arc<S>,
    tx: mpsc::Sender<Response>,
    in_flight: usize,
}

impl<S: GraphService> GameEngine<S> {
    /// Create an engine and the receiver its responses arrive on.
    pub fn new(service: Arc<S>, state: GameState) -> (Self, mpsc::Receiver<Response>) {
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        let engine = Self {
            state,
            service,
            tx,
            in_flight: 0,
        };
        (engine, rx)
    }

    /// Current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Number of service calls not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply a player action and start the calls it needs.
    pub fn dispatch(&mut self, intent: Intent) {
        debug!(?intent, "dispatching intent");
        let requests = self.state.update(Event::Intent(intent));
        self.spawn_all(requests);
    }

    /// Apply a service reply received on the engine channel.
    pub fn apply(&mut self, response: Response) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let requests = self.state.update(Event::Response(response));
        self.spawn_all(requests);
    }

    /// Fetch the stations of one line in the current city for a detail view.
    ///
    /// The lookup is read-only and never touches the game state, so the caller
    /// awaits it wherever it likes.
    pub fn line_stations(
        &self,
        line: &str,
    ) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send + 'static {
        let service = Arc::clone(&self.service);
        let city = self.state.city().id.clone();
        let line = line.to_string();
        debug!(%city, %line, "fetching line stations");
        async move { service.line_stations(&city, &line).await }
    }

    /// Apply replies until nothing is in flight.
    pub async fn settle(&mut self, rx: &mut mpsc::Receiver<Response>) {
        while self.in_flight > 0 {
            match rx.recv().await {
                Some(response) => self.apply(response),
                None => break,
            }
        }
    }

    fn spawn_all(&mut self, requests: Vec<Request>) {
        for request in requests {
            self.spawn(request);
        }
    }

    fn spawn(&mut self, request: Request) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let response = execute(service.as_ref(), request).await;
            if tx.send(response).await.is_err() {
                warn!("game engine dropped before a response was delivered");
            }
        });
    }
}

/// Run one request against `service` and wrap the outcome as a [`Response`].
pub async fn execute<S: GraphService>(service: &S, request: Request) -> Response {
    match request {
        Request::LoadCatalog { token, city } => Response::CatalogLoaded {
            token,
            result: fetch_catalog(service, &city).await,
        },
        Request::LoadAvailability { token, city, lines } => Response::AvailabilityLoaded {
            token,
            result: service.stations_for(&city, &lines).await,
        },
        Request::LoadReachability {
            token,
            city,
            lines,
            start,
            revalidate_end,
        } => Response::ReachabilityLoaded {
            token,
            revalidate_end,
            result: service.reachable_from(&city, &lines, &start).await,
        },
        Request::RandomPair { token, city, lines } => Response::RandomPairGenerated {
            token,
            result: service.random_pair(&city, &lines).await,
        },
        Request::ShortestPath {
            token,
            purpose,
            city,
            lines,
            start,
            end,
        } => Response::PathCalculated {
            token,
            purpose,
            result: service.shortest_path(&city, &lines, &start, &end).await,
        },
        Request::ValidatePath {
            token,
            city,
            lines,
            start,
            end,
            user_path,
        } => Response::PathValidated {
            token,
            result: service
                .validate_path(&city, &lines, &start, &end, &user_path)
                .await,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::{
        city::CityRegistry,
        error::GameError,
        models::{GameStatus, LineInfo, PathSolution, RandomPair, SystemPath, ValidationOutcome},
        service::ServiceError,
    };

    /// In-memory network: 1号线 runs A-C-B, 2号线 runs C-D.
    #[derive(Default)]
    struct FakeService {
        fail_catalog: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeService {
        fn record(&self, call: &'static str) {
            self.calls.lock().push(call);
        }

        fn line(name: &str) -> Vec<String> {
            let stations: &[&str] = match name {
                "1号线" => &["A", "C", "B"],
                "2号线" => &["C", "D"],
                _ => &[],
            };
            stations.iter().map(|s| s.to_string()).collect()
        }

        fn union(lines: &[String]) -> Vec<String> {
            let mut stations: Vec<String> = Vec::new();
            for line in lines {
                for station in Self::line(line) {
                    if !stations.contains(&station) {
                        stations.push(station);
                    }
                }
            }
            stations
        }
    }

    impl GraphService for FakeService {
        async fn lines(&self, _city: &str) -> Result<Vec<String>, ServiceError> {
            self.record("lines");
            if self.fail_catalog {
                return Err(ServiceError::Status {
                    status: 503,
                    detail: "unavailable".to_string(),
                });
            }
            Ok(vec!["1号线".to_string(), "2号线".to_string()])
        }

        async fn line_stations(&self, _city: &str, line: &str) -> Result<Vec<String>, ServiceError> {
            self.record("line_stations");
            Ok(Self::line(line))
        }

        async fn line_metadata(
            &self,
            _city: &str,
        ) -> Result<HashMap<String, LineInfo>, ServiceError> {
            self.record("line_metadata");
            Ok(["1号线", "2号线"]
                .into_iter()
                .map(|line| {
                    let info = LineInfo {
                        color: None,
                        stations: Self::line(line),
                        branch_stations: Vec::new(),
                    };
                    (line.to_string(), info)
                })
                .collect())
        }

        async fn stations_for(
            &self,
            _city: &str,
            lines: &[String],
        ) -> Result<Vec<String>, ServiceError> {
            self.record("stations_for");
            Ok(Self::union(lines))
        }

        async fn reachable_from(
            &self,
            _city: &str,
            lines: &[String],
            start: &str,
        ) -> Result<Vec<String>, ServiceError> {
            self.record("reachable_from");
            Ok(Self::union(lines)
                .into_iter()
                .filter(|station| station != start)
                .collect())
        }

        async fn random_pair(
            &self,
            _city: &str,
            _lines: &[String],
        ) -> Result<RandomPair, ServiceError> {
            self.record("random_pair");
            Ok(RandomPair {
                start: "A".to_string(),
                end: "B".to_string(),
            })
        }

        async fn shortest_path(
            &self,
            _city: &str,
            _lines: &[String],
            _start: &str,
            _end: &str,
        ) -> Result<PathSolution, ServiceError> {
            self.record("shortest_path");
            Ok(PathSolution {
                shortest_cost: 1.5,
                paths: vec![SystemPath::Stations(vec![
                    "A".to_string(),
                    "C".to_string(),
                    "B".to_string(),
                ])],
            })
        }

        async fn validate_path(
            &self,
            _city: &str,
            _lines: &[String],
            _start: &str,
            _end: &str,
            user_path: &[String],
        ) -> Result<ValidationOutcome, ServiceError> {
            self.record("validate_path");
            let is_shortest = user_path == ["A", "C", "B"];
            Ok(ValidationOutcome {
                is_shortest,
                shortest_cost: 1.5,
                all_shortest_paths: vec![SystemPath::Annotated("A → C → B".to_string())],
                valid: true,
                user_cost: Some(1.5),
                message: None,
                error_reason: None,
                user_path_annotated: None,
            })
        }
    }

    fn engine(service: FakeService) -> (GameEngine<FakeService>, mpsc::Receiver<Response>) {
        let state = GameState::new(CityRegistry::builtin(), "sz");
        GameEngine::new(Arc::new(service), state)
    }

    #[tokio::test]
    async fn plays_a_full_round() {
        let (mut engine, mut rx) = engine(FakeService::default());

        engine.dispatch(Intent::SetCity("sz".into()));
        engine.settle(&mut rx).await;
        assert_eq!(engine.state().all_lines(), ["1号线", "2号线"]);

        engine.dispatch(Intent::ToggleLine("1号线".into()));
        engine.settle(&mut rx).await;
        assert_eq!(engine.state().available_stations(), ["A", "C", "B"]);

        engine.dispatch(Intent::GenerateRandom);
        engine.settle(&mut rx).await;
        let state = engine.state();
        assert_eq!(state.status(), GameStatus::Playing);
        assert_eq!(state.path().stations(), ["A", "B"]);
        assert_eq!(state.reachable_stations(), ["C", "B"]);
        assert_eq!(state.display_cost(), 2);

        engine.dispatch(Intent::AppendStation("C".into()));
        engine.dispatch(Intent::Submit);
        engine.settle(&mut rx).await;
        assert_eq!(engine.state().status(), GameStatus::Result);
        assert!(engine.state().revealed());
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn catalog_failure_surfaces_load_error() {
        let service = FakeService {
            fail_catalog: true,
            ..FakeService::default()
        };
        let (mut engine, mut rx) = engine(service);
        engine.dispatch(Intent::SetCity("sz".into()));
        engine.settle(&mut rx).await;

        assert!(engine.state().catalog().is_none());
        assert_eq!(
            engine.state().error(),
            Some(&GameError::Load("Failed to load metro lines".into()))
        );
        assert_eq!(*engine.service.calls.lock(), ["lines"]);
    }

    #[tokio::test]
    async fn reset_discards_in_flight_round() {
        let (mut engine, mut rx) = engine(FakeService::default());
        engine.dispatch(Intent::SetCity("sz".into()));
        engine.settle(&mut rx).await;
        engine.dispatch(Intent::ToggleLine("1号线".into()));
        engine.settle(&mut rx).await;

        engine.dispatch(Intent::GenerateRandom);
        engine.dispatch(Intent::Reset);
        engine.settle(&mut rx).await;

        let state = engine.state();
        assert_eq!(state.status(), GameStatus::Setup);
        assert_eq!(state.start(), None);
        assert!(state.path().is_empty());
        assert!(!engine.service.calls.lock().contains(&"shortest_path"));
    }

    #[tokio::test]
    async fn fetches_line_detail_without_touching_state() {
        let (mut engine, mut rx) = engine(FakeService::default());
        engine.dispatch(Intent::SetCity("sz".into()));
        engine.settle(&mut rx).await;

        let stations = engine.line_stations("2号线").await.unwrap();
        assert_eq!(stations, ["C", "D"]);
        assert_eq!(engine.in_flight(), 0);
        assert!(engine.state().selected_lines().is_empty());
        assert!(engine.service.calls.lock().contains(&"line_stations"));
    }
}
