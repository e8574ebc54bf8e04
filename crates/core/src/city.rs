//! Cities the game can be played in.

use serde::{Deserialize, Serialize};

/// City used when a lookup misses.
pub const FALLBACK_CITY: &str = "sz";

const SUBTITLE: &str = "找出两个站点之间的最短路径";

/// Static descriptor for a playable city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Path segment used by the graph service (e.g. `sz`).
    pub id: String,
    /// Human-readable city name.
    pub name: String,
    /// Page title.
    pub title: String,
    /// Tagline shown under the title.
    pub subtitle: String,
}

impl City {
    fn builtin(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            title: format!("{name}地铁寻路挑战"),
            subtitle: SUBTITLE.to_string(),
        }
    }

    /// Returns a user-facing label combining title and subtitle.
    pub fn display_name(&self) -> String {
        if self.subtitle.is_empty() {
            self.title.clone()
        } else {
            format!("{} · {}", self.title, self.subtitle)
        }
    }
}

/// Known cities in menu order.
#[derive(Debug, Clone)]
pub struct CityRegistry {
    cities: Vec<City>,
}

impl Default for CityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CityRegistry {
    /// Registry with the networks the graph service ships.
    pub fn builtin() -> Self {
        Self {
            cities: vec![
                City::builtin("sz", "深圳"),
                City::builtin("sh", "上海"),
                City::builtin("bj", "北京"),
                City::builtin("gz", "广州"),
                City::builtin("wh", "武汉"),
                City::builtin("cs", "长沙"),
            ],
        }
    }

    /// Registry over an explicit city list.
    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }

    /// Exact lookup.
    pub fn get(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }

    /// Descriptor for `id`, falling back to the default city, then to the first entry.
    pub fn resolve(&self, id: &str) -> Option<&City> {
        self.get(id)
            .or_else(|| self.get(FALLBACK_CITY))
            .or_else(|| self.cities.first())
    }

    /// All cities.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// City after `id` in menu order, wrapping around.
    pub fn next_after(&self, id: &str) -> Option<&City> {
        let index = self.cities.iter().position(|city| city.id == id);
        match index {
            Some(index) => self.cities.get((index + 1) % self.cities.len()),
            None => self.cities.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unknown_city_to_fallback() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.resolve("xx").map(|city| city.id.as_str()), Some("sz"));
        assert_eq!(
            registry.get("bj").map(|city| city.title.as_str()),
            Some("北京地铁寻路挑战")
        );
    }

    #[test]
    fn cycles_cities_in_menu_order() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.next_after("sz").map(|c| c.id.as_str()), Some("sh"));
        assert_eq!(registry.next_after("cs").map(|c| c.id.as_str()), Some("sz"));
    }
}
