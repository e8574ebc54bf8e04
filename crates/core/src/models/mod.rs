//! Shared domain models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color shown for lines whose metadata carries none.
pub const DEFAULT_LINE_COLOR: &str = "#3B82F6";

/// Per-line metadata from the map endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineInfo {
    /// Display color (usually `#RRGGBB`).
    #[serde(default)]
    pub color: Option<String>,
    /// Member stations in running order.
    #[serde(default)]
    pub stations: Vec<String>,
    /// Stations on a forked branch sharing the line identifier.
    #[serde(default)]
    pub branch_stations: Vec<String>,
}

impl LineInfo {
    /// Color to render this line with.
    pub fn display_color(&self) -> &str {
        self.color
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LINE_COLOR)
    }
}

/// Lines of the active city together with their metadata.
#[derive(Debug, Clone)]
pub struct LineCatalog {
    lines: Vec<String>,
    metadata: HashMap<String, LineInfo>,
    revision: u64,
    loaded_at: DateTime<Utc>,
}

impl LineCatalog {
    /// Build a catalog; `revision` distinguishes successive loads.
    pub fn new(lines: Vec<String>, metadata: HashMap<String, LineInfo>, revision: u64) -> Self {
        Self {
            lines,
            metadata,
            revision,
            loaded_at: Utc::now(),
        }
    }

    /// Line identifiers in service order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Metadata for a single line, if the map endpoint described it.
    pub fn info(&self, line: &str) -> Option<&LineInfo> {
        self.metadata.get(line)
    }

    /// Whether `line` is part of the catalog.
    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|candidate| candidate == line)
    }

    /// Load revision used to key derived views.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// When the catalog was fetched.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Random start/end pair chosen by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomPair {
    /// Start station.
    pub start: String,
    /// End station.
    pub end: String,
}

/// One system-optimal path, either as raw stations or as the service's annotated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPath {
    /// Ordered station identifiers.
    Stations(Vec<String>),
    /// Pre-rendered text including transfer hints.
    Annotated(String),
}

impl SystemPath {
    /// Text shown to the user.
    pub fn display(&self) -> String {
        match self {
            SystemPath::Stations(stations) => format_path(stations),
            SystemPath::Annotated(text) => text.clone(),
        }
    }
}

/// Shortest-path answer for a start/end pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSolution {
    /// Minimum cost between the endpoints.
    pub shortest_cost: f64,
    /// Every minimum-cost path.
    #[serde(default)]
    pub paths: Vec<SystemPath>,
}

/// Result of scoring a user path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the user path is one of the optimal paths.
    pub is_shortest: bool,
    /// Optimal cost between the endpoints.
    pub shortest_cost: f64,
    /// Every optimal path; empty when the submitted path was malformed.
    #[serde(default)]
    pub all_shortest_paths: Vec<SystemPath>,
    /// Whether the path was legal at all.
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// Cost of the submitted path when it was legal.
    #[serde(default)]
    pub user_cost: Option<f64>,
    /// Short verdict from the service.
    #[serde(default)]
    pub message: Option<String>,
    /// Why the path was rejected or not optimal.
    #[serde(default)]
    pub error_reason: Option<String>,
    /// Submitted path annotated with transfers.
    #[serde(default)]
    pub user_path_annotated: Option<String>,
}

fn default_valid() -> bool {
    true
}

/// Game phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Choosing lines and endpoints.
    #[default]
    Setup,
    /// Building a candidate path.
    Playing,
    /// Round solved.
    Result,
    /// Read-only answer lookup.
    Query,
}

impl GameStatus {
    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Setup => "setup",
            GameStatus::Playing => "playing",
            GameStatus::Result => "result",
            GameStatus::Query => "query",
        }
    }
}

/// A line a station belongs to, as rendered next to the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBadge {
    /// Line identifier.
    pub line: String,
    /// Display color.
    pub color: String,
}

/// Render a station sequence the way the service annotates paths.
pub fn format_path(stations: &[String]) -> String {
    stations.join(" → ")
}

/// Shortest cost as displayed: partial segments count as a whole unit.
pub fn display_cost(cost: f64) -> u64 {
    if !cost.is_finite() || cost <= 0.0 {
        return 0;
    }
    cost.ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_rounds_up() {
        assert_eq!(display_cost(4.5), 5);
        assert_eq!(display_cost(4.0), 4);
        assert_eq!(display_cost(0.0), 0);
        assert_eq!(display_cost(f64::NAN), 0);
    }

    #[test]
    fn system_paths_accept_both_shapes() -> anyhow::Result<()> {
        let solution: PathSolution = serde_json::from_str(
            r#"{"shortest_cost": 3.5, "paths": [["A", "C", "B"], "A → D(1号线换乘2号线) → B"]}"#,
        )?;
        assert_eq!(solution.paths.len(), 2);
        assert_eq!(solution.paths[0].display(), "A → C → B");
        assert_eq!(solution.paths[1].display(), "A → D(1号线换乘2号线) → B");
        Ok(())
    }

    #[test]
    fn validation_outcome_defaults_optional_fields() -> anyhow::Result<()> {
        let outcome: ValidationOutcome = serde_json::from_str(
            r#"{"is_shortest": false, "shortest_cost": 3.0, "all_shortest_paths": []}"#,
        )?;
        assert!(outcome.valid);
        assert!(outcome.user_cost.is_none());
        assert!(outcome.all_shortest_paths.is_empty());
        Ok(())
    }

    #[test]
    fn missing_color_uses_default() {
        let info = LineInfo::default();
        assert_eq!(info.display_color(), DEFAULT_LINE_COLOR);
        let info = LineInfo {
            color: Some("#E4002B".to_string()),
            ..LineInfo::default()
        };
        assert_eq!(info.display_color(), "#E4002B");
    }
}
