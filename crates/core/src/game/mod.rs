//! Client-side game logic: state machine, path editing and derived views.

pub mod membership;
pub mod path;
pub mod state;
pub mod tokens;

pub use membership::{station_lines, MembershipCache, StationLines};
pub use path::PathEditor;
pub use state::{Event, GameState, Intent, Request, Response, SolvePurpose};
pub use tokens::{Resource, SequenceTokens, Token};
