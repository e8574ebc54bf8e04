//! Ordered, duplicate-free candidate path.

/// The player's candidate path.
///
/// Positions 0 and `len - 1` are the anchors: once present they can only be
/// replaced by reseeding or clearing the path, never removed one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEditor {
    stations: Vec<String>,
}

impl PathEditor {
    /// Path consisting of exactly the two endpoints.
    pub fn seeded(start: &str, end: &str) -> Self {
        let mut path = Self::default();
        path.seed(start, end);
        path
    }

    /// Replace the contents with `[start, end]`.
    pub fn seed(&mut self, start: &str, end: &str) {
        self.stations.clear();
        self.stations.push(start.to_string());
        if end != start {
            self.stations.push(end.to_string());
        }
    }

    /// Stations in travel order.
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the path has no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Whether `station` is already on the path.
    pub fn contains(&self, station: &str) -> bool {
        self.stations.iter().any(|candidate| candidate == station)
    }

    /// First station.
    pub fn first(&self) -> Option<&str> {
        self.stations.first().map(String::as_str)
    }

    /// Last station.
    pub fn last(&self) -> Option<&str> {
        self.stations.last().map(String::as_str)
    }

    /// Insert `station` at `index` (clamped to the tail). No-op when already present.
    pub fn insert_at(&mut self, station: &str, index: usize) -> bool {
        if station.is_empty() || self.contains(station) {
            return false;
        }
        let index = index.min(self.stations.len());
        self.stations.insert(index, station.to_string());
        true
    }

    /// Insert `station` strictly between the anchors.
    ///
    /// Requires at least two stations; shorter paths fall back to [`insert_at`](Self::insert_at).
    pub fn insert_between_anchors(&mut self, station: &str, index: usize) -> bool {
        if self.stations.len() < 2 {
            return self.insert_at(station, index);
        }
        let index = index.clamp(1, self.stations.len() - 1);
        self.insert_at(station, index)
    }

    /// Add `station` as the next stop.
    ///
    /// With `before_end` set and at least two stations, the station goes right
    /// before the destination; otherwise it is appended at the tail.
    pub fn append(&mut self, station: &str, before_end: bool) -> bool {
        if before_end && self.stations.len() >= 2 {
            let index = self.stations.len() - 1;
            return self.insert_at(station, index);
        }
        self.insert_at(station, self.stations.len())
    }

    /// Remove the station at `index`. The first and last positions are protected.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        if index == 0 || index + 1 >= self.stations.len() {
            return None;
        }
        Some(self.stations.remove(index))
    }

    /// Drop intermediate stops: `[start, end]` when both are known, empty otherwise.
    pub fn clear_intermediate(&mut self, start: Option<&str>, end: Option<&str>) {
        match (start, end) {
            (Some(start), Some(end)) => self.seed(start, end),
            _ => self.clear(),
        }
    }

    /// Remove every station.
    pub fn clear(&mut self) {
        self.stations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(stations: &[&str]) -> PathEditor {
        let mut editor = PathEditor::default();
        for station in stations {
            editor.append(station, false);
        }
        editor
    }

    #[test]
    fn anchors_cannot_be_removed() {
        let mut editor = path(&["A", "C", "D", "B"]);
        assert_eq!(editor.remove_at(0), None);
        assert_eq!(editor.remove_at(3), None);
        assert_eq!(editor.remove_at(9), None);
        assert_eq!(editor.remove_at(1).as_deref(), Some("C"));
        assert_eq!(editor.stations(), ["A", "D", "B"]);

        let mut single = path(&["A"]);
        assert_eq!(single.remove_at(0), None);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn append_is_idempotent() {
        let mut editor = PathEditor::seeded("A", "B");
        assert!(editor.append("C", true));
        let snapshot = editor.clone();
        assert!(!editor.append("C", true));
        assert_eq!(editor, snapshot);
    }

    #[test]
    fn append_before_end_keeps_destination_last() {
        let mut editor = PathEditor::seeded("A", "B");
        editor.append("C", true);
        editor.append("D", true);
        assert_eq!(editor.stations(), ["A", "C", "D", "B"]);

        let mut free = PathEditor::default();
        free.append("A", true);
        free.append("B", true);
        assert_eq!(free.stations(), ["A", "B"], "short paths grow at the tail");
    }

    #[test]
    fn insert_skips_duplicates_and_clamps() {
        let mut editor = PathEditor::seeded("A", "B");
        assert!(!editor.insert_at("A", 1));
        assert!(editor.insert_at("C", 99));
        assert_eq!(editor.stations(), ["A", "B", "C"]);
    }

    #[test]
    fn anchored_insert_stays_inside_endpoints() {
        let mut editor = PathEditor::seeded("A", "B");
        editor.insert_between_anchors("C", 0);
        editor.insert_between_anchors("D", 10);
        assert_eq!(editor.stations(), ["A", "C", "D", "B"]);
    }

    #[test]
    fn clear_intermediate_restores_endpoints() {
        let mut editor = path(&["A", "C", "B"]);
        editor.clear_intermediate(Some("A"), Some("B"));
        assert_eq!(editor.stations(), ["A", "B"]);
        editor.clear_intermediate(Some("A"), None);
        assert!(editor.is_empty());
    }
}
