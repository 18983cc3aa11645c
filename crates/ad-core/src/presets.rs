//! Saved filter presets
//!
//! A preset captures the dropdown filters and search term of a dashboard so
//! they can be re-applied later. Presets persist as a JSON list in the local
//! key-value store.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::store::{KeyValueStore, StoreError};

/// Store key holding the preset list
pub const PRESETS_KEY: &str = "analyst-data-presets";

/// Unique identifier for a preset
pub type PresetId = Uuid;

/// A named set of filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: PresetId,
    pub name: String,
    pub filters: IndexMap<String, String>,
    pub search_term: String,
    pub created_at: DateTime<Utc>,
}

/// Preset list in creation order
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetManager {
    presets: Vec<FilterPreset>,
}

impl PresetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read presets from the store; a missing key yields an empty list
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        match store.get(PRESETS_KEY)? {
            Some(json) => {
                let manager: PresetManager = serde_json::from_str(&json)?;
                debug!("Loaded {} filter presets", manager.presets.len());
                Ok(manager)
            }
            None => Ok(Self::new()),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(PRESETS_KEY, serde_json::to_string(self)?)
    }

    /// Capture the filters and search term of `config` under `name`
    pub fn create_preset(&mut self, name: impl Into<String>, config: &FilterConfig) -> PresetId {
        let preset = FilterPreset {
            id: Uuid::new_v4(),
            name: name.into(),
            filters: config
                .equality_filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            search_term: config.search_term.clone(),
            created_at: Utc::now(),
        };

        info!("Saved filter preset '{}'", preset.name);
        let id = preset.id;
        self.presets.push(preset);
        id
    }

    pub fn delete_preset(&mut self, id: PresetId) -> Option<FilterPreset> {
        let pos = self.presets.iter().position(|p| p.id == id)?;
        Some(self.presets.remove(pos))
    }

    pub fn get(&self, id: PresetId) -> Option<&FilterPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Most recently created preset with this name
    pub fn find_by_name(&self, name: &str) -> Option<&FilterPreset> {
        self.presets.iter().rev().find(|p| p.name == name)
    }

    pub fn all(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl FilterPreset {
    /// Replace the filters and search term of `config`, keeping its
    /// searchable columns
    pub fn apply_to(&self, config: &mut FilterConfig) {
        config.equality_filters = self.filters.clone();
        config.search_term = self.search_term.clone();
    }
}
