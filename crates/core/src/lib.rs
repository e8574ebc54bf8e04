#![warn(clippy::all, missing_docs)]

//! Core logic for the metro shortest-path game.
//!
//! This crate hosts the domain models, the city registry, configuration,
//! the graph service boundary, and the pure game state machine together
//! with the async engine that drives it. Frontends only render state and
//! dispatch intents.

pub mod city;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod runtime;
pub mod service;

pub use city::{City, CityRegistry};
pub use config::AppConfig;
pub use error::GameError;
pub use game::{Event, GameState, Intent, Request, Response, SolvePurpose};
pub use models::{GameStatus, LineCatalog, LineInfo, PathSolution, SystemPath, ValidationOutcome};
pub use runtime::GameEngine;
pub use service::{GraphService, HttpGraphService, ServiceError};
