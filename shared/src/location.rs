//! State → city selection.
//!
//! The selected city must always belong to the selected state's option list.
//! Selecting a state whose list does not contain the current city moves the
//! selection to that list's first city; an empty list disables the field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::ResourcePayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCatalog {
    regions: Vec<Region>,
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const ANDHRA_PRADESH: &[&str] = &[
    "Visakhapatnam",
    "Vijayawada",
    "Guntur",
    "Nellore",
    "Kurnool",
    "Tirupati",
    "Kakinada",
    "Rajahmundry",
    "Kadapa",
    "Anantapur",
];

const TELANGANA: &[&str] = &["Hyderabad", "Warangal", "Nizamabad", "Karimnagar"];

impl LocationCatalog {
    #[must_use]
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Catalog compiled into the core, used until `/locations` answers.
    #[must_use]
    pub fn builtin() -> Self {
        let region = |name: &str, cities: &[&str]| Region {
            name: name.to_string(),
            cities: cities.iter().map(|c| (*c).to_string()).collect(),
        };
        Self {
            regions: vec![
                region("Andhra Pradesh", ANDHRA_PRADESH),
                region("Telangana", TELANGANA),
            ],
        }
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn states(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    #[must_use]
    pub fn cities(&self, state: &str) -> &[String] {
        self.regions
            .iter()
            .find(|r| r.name == state)
            .map(|r| r.cities.as_slice())
            .unwrap_or_default()
    }

    /// Every city in catalog order, for the flat location selector.
    #[must_use]
    pub fn all_locations(&self) -> Vec<&str> {
        self.regions
            .iter()
            .flat_map(|r| r.cities.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn state_of(&self, city: &str) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| r.cities.iter().any(|c| c == city))
            .map(|r| r.name.as_str())
    }
}

/// `/locations` payload: `{ "<state>": { "<city>": { "modifier": 1.02 } } }`.
/// Only the keys are used; their order is the backend's.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LocationsPayload(serde_json::Map<String, serde_json::Value>);

impl LocationsPayload {
    #[must_use]
    pub fn into_catalog(self) -> LocationCatalog {
        let regions = self
            .0
            .into_iter()
            .map(|(name, cities)| Region {
                name,
                cities: match cities {
                    serde_json::Value::Object(map) => map.into_iter().map(|(k, _)| k).collect(),
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                },
            })
            .collect();
        LocationCatalog::new(regions)
    }
}

impl ResourcePayload for LocationsPayload {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("unknown state: {0}")]
    UnknownState(String),

    #[error("{city} is not a city of {state}")]
    CityNotInState { city: String, state: String },

    #[error("unknown location: {0}")]
    UnknownLocation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub state: Option<String>,
    pub city: Option<String>,
    /// Effective location sent to location-bound panels.
    pub location: String,
}

impl LocationSelection {
    /// Starts from `state`/`city`, repaired against `catalog`.
    #[must_use]
    pub fn new(state: &str, city: &str, catalog: &LocationCatalog) -> Self {
        let mut selection = Self {
            state: None,
            city: Some(city.to_string()),
            location: city.to_string(),
        };
        let state = if catalog.cities(state).is_empty() {
            catalog.states().first().map_or(state, |s| *s).to_string()
        } else {
            state.to_string()
        };
        selection.apply_state(state, catalog);
        selection
    }

    /// Whether the city field is usable for the current state.
    #[must_use]
    pub fn city_enabled(&self, catalog: &LocationCatalog) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| !catalog.cities(s).is_empty())
    }

    pub fn select_state(
        &mut self,
        state: &str,
        catalog: &LocationCatalog,
    ) -> Result<(), LocationError> {
        if !catalog.states().contains(&state) {
            return Err(LocationError::UnknownState(state.to_string()));
        }
        self.apply_state(state.to_string(), catalog);
        Ok(())
    }

    fn apply_state(&mut self, state: String, catalog: &LocationCatalog) {
        let cities = catalog.cities(&state);
        let keep = self
            .city
            .as_ref()
            .is_some_and(|current| cities.iter().any(|c| c == current));
        if !keep {
            self.city = cities.first().cloned();
        }
        self.location = self.city.clone().unwrap_or_else(|| state.clone());
        self.state = Some(state);
    }

    pub fn select_city(
        &mut self,
        city: &str,
        catalog: &LocationCatalog,
    ) -> Result<(), LocationError> {
        let state = self.state.clone().unwrap_or_default();
        if !catalog.cities(&state).iter().any(|c| c == city) {
            return Err(LocationError::CityNotInState {
                city: city.to_string(),
                state,
            });
        }
        self.city = Some(city.to_string());
        self.location = city.to_string();
        Ok(())
    }

    /// Flat selector: any city of the catalog; the state follows it.
    pub fn select_location(
        &mut self,
        location: &str,
        catalog: &LocationCatalog,
    ) -> Result<(), LocationError> {
        let state = catalog
            .state_of(location)
            .ok_or_else(|| LocationError::UnknownLocation(location.to_string()))?
            .to_string();
        self.state = Some(state);
        self.city = Some(location.to_string());
        self.location = location.to_string();
        Ok(())
    }

    /// Re-validates after the catalog was replaced.
    pub fn reconcile(&mut self, catalog: &LocationCatalog) {
        let state = self
            .state
            .clone()
            .filter(|s| catalog.states().contains(&s.as_str()))
            .or_else(|| catalog.states().first().map(|s| (*s).to_string()));
        match state {
            Some(state) => self.apply_state(state, catalog),
            None => {
                self.state = None;
                self.city = None;
            }
        }
    }
}
