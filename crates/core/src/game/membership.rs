//! Station → line membership for the selected lines.

use std::{collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::models::{LineBadge, LineCatalog};

/// Lines serving each station, ordered by line number.
pub type StationLines = BTreeMap<String, Vec<LineBadge>>;

static LINE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)").expect("failed to compile line number regex"));

/// First run of digits in a line identifier (`"11号线"` → 11).
pub fn line_number(line: &str) -> Option<u64> {
    LINE_NUMBER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Build the membership map for `selected` lines.
///
/// Branch stations count as members of their line. Lines without a number sort
/// after numbered ones and keep selection order among themselves.
pub fn station_lines(selected: &[String], catalog: &LineCatalog) -> StationLines {
    let mut map = StationLines::new();
    for line in selected {
        let Some(info) = catalog.info(line) else {
            continue;
        };
        let color = info.display_color();
        for station in info.stations.iter().chain(info.branch_stations.iter()) {
            let badges = map.entry(station.clone()).or_default();
            if badges.iter().any(|badge| &badge.line == line) {
                continue;
            }
            badges.push(LineBadge {
                line: line.clone(),
                color: color.to_string(),
            });
        }
    }
    for badges in map.values_mut() {
        badges.sort_by_key(|badge| line_number(&badge.line).unwrap_or(u64::MAX));
    }
    map
}

#[derive(Debug)]
struct Memo {
    selected: Vec<String>,
    revision: u64,
    value: Arc<StationLines>,
}

/// Single-entry memo keyed by (selected lines, catalog revision).
#[derive(Debug, Default)]
pub struct MembershipCache {
    memo: Mutex<Option<Memo>>,
}

impl Clone for MembershipCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl MembershipCache {
    /// Cached map for `selected`, rebuilt when the key changes.
    pub fn get(&self, selected: &[String], catalog: &LineCatalog) -> Arc<StationLines> {
        let mut memo = self.memo.lock();
        if let Some(entry) = memo.as_ref() {
            if entry.revision == catalog.revision() && entry.selected == selected {
                return Arc::clone(&entry.value);
            }
        }
        let value = Arc::new(station_lines(selected, catalog));
        *memo = Some(Memo {
            selected: selected.to_vec(),
            revision: catalog.revision(),
            value: Arc::clone(&value),
        });
        value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::{LineInfo, DEFAULT_LINE_COLOR};

    fn catalog(revision: u64) -> LineCatalog {
        let mut metadata = HashMap::new();
        metadata.insert(
            "11号线".to_string(),
            LineInfo {
                color: Some("#672146".to_string()),
                stations: vec!["A".into(), "B".into()],
                branch_stations: vec![],
            },
        );
        metadata.insert(
            "2号线".to_string(),
            LineInfo {
                color: Some("#FF6900".to_string()),
                stations: vec!["B".into(), "C".into()],
                branch_stations: vec!["C".into(), "D".into()],
            },
        );
        metadata.insert(
            "机场线".to_string(),
            LineInfo {
                color: None,
                stations: vec!["B".into()],
                branch_stations: vec![],
            },
        );
        metadata.insert(
            "磁悬浮".to_string(),
            LineInfo {
                color: None,
                stations: vec!["B".into()],
                branch_stations: vec![],
            },
        );
        let lines = vec!["2号线", "11号线", "机场线", "磁悬浮"]
            .into_iter()
            .map(String::from)
            .collect();
        LineCatalog::new(lines, metadata, revision)
    }

    fn names(badges: &[LineBadge]) -> Vec<&str> {
        badges.iter().map(|badge| badge.line.as_str()).collect()
    }

    #[test]
    fn extracts_first_digit_run() {
        assert_eq!(line_number("11号线"), Some(11));
        assert_eq!(line_number("5号线支线2"), Some(5));
        assert_eq!(line_number("机场线"), None);
    }

    #[test]
    fn orders_lines_by_number_then_selection() {
        let selected: Vec<String> = vec!["磁悬浮", "11号线", "机场线", "2号线"]
            .into_iter()
            .map(String::from)
            .collect();
        let map = station_lines(&selected, &catalog(1));
        assert_eq!(names(&map["B"]), ["2号线", "11号线", "磁悬浮", "机场线"]);
        assert_eq!(map["B"][2].color, DEFAULT_LINE_COLOR);
    }

    #[test]
    fn branch_stations_count_once() {
        let selected = vec!["2号线".to_string()];
        let map = station_lines(&selected, &catalog(1));
        assert_eq!(names(&map["C"]), ["2号线"]);
        assert_eq!(names(&map["D"]), ["2号线"]);
        assert!(!map.contains_key("A"), "unselected lines are ignored");
    }

    #[test]
    fn memo_rebuilds_on_key_change() {
        let cache = MembershipCache::default();
        let selected = vec!["2号线".to_string()];
        let first = cache.get(&selected, &catalog(1));
        let again = cache.get(&selected, &catalog(1));
        assert!(Arc::ptr_eq(&first, &again));

        let reloaded = cache.get(&selected, &catalog(2));
        assert!(!Arc::ptr_eq(&first, &reloaded));

        let wider = cache.get(&["2号线".to_string(), "11号线".to_string()], &catalog(2));
        assert_eq!(names(&wider["B"]), ["2号线", "11号线"]);
    }
}
