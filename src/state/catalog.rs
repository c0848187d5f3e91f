use std::{fs, io::ErrorKind, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

/// One image/location challenge of the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Reference to the photo shown to players (relative URL or path).
    #[validate(length(min = 1))]
    pub image_path: String,
    /// Latitude of the correct answer.
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Longitude of the correct answer.
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Human readable name of the location.
    #[serde(default, alias = "description")]
    pub label: String,
}

/// Errors raised while loading the round catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog file is not a JSON array of rounds.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// A record failed validation.
    #[error("round #{index} is invalid: {source}")]
    InvalidRound {
        /// Zero-based position of the offending record.
        index: usize,
        /// Validation details.
        #[source]
        source: ValidationErrors,
    },
}

/// Ordered, immutable list of rounds for a game run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundCatalog {
    rounds: Vec<Round>,
}

impl RoundCatalog {
    /// Wrap an already validated list of rounds.
    pub fn new(rounds: Vec<Round>) -> Self {
        Self { rounds }
    }

    /// Parse and validate a JSON catalog document.
    pub fn from_json_str(contents: &str) -> Result<Self, CatalogError> {
        let rounds: Vec<Round> = serde_json::from_str(contents)?;
        for (index, round) in rounds.iter().enumerate() {
            round
                .validate()
                .map_err(|source| CatalogError::InvalidRound { index, source })?;
        }
        Ok(Self::new(rounds))
    }

    /// Read the catalog at `path`.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load the catalog at `path`, degrading to an empty catalog on failure.
    ///
    /// An empty catalog keeps the server up; `start-game` then reports the
    /// configuration error to the administrator.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(catalog) => {
                if catalog.is_empty() {
                    warn!(path = %path.display(), "round catalog is empty");
                } else {
                    info!(path = %path.display(), rounds = catalog.len(), "loaded round catalog");
                }
                catalog
            }
            Err(CatalogError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "round catalog not found; starting with no rounds");
                Self::default()
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to load round catalog");
                Self::default()
            }
        }
    }

    /// Round at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }

    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether the catalog holds no rounds.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_with_description_alias() {
        let catalog = RoundCatalog::from_json_str(
            r#"[
                {"imagePath": "images/berlin.jpg", "lat": 52.52, "lng": 13.405, "description": "Berlin"},
                {"imagePath": "images/paris.jpg", "lat": 48.8566, "lng": 2.3522, "label": "Paris"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().label, "Berlin");
        assert_eq!(catalog.get(1).unwrap().label, "Paris");
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = RoundCatalog::from_json_str(
            r#"[{"imagePath": "a.jpg", "lat": 0, "lng": 0},
                {"imagePath": "b.jpg", "lat": 91.0, "lng": 0}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::InvalidRound { index: 1, .. }));
    }

    #[test]
    fn rejects_empty_image_path() {
        let err = RoundCatalog::from_json_str(r#"[{"imagePath": "", "lat": 0, "lng": 0}]"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRound { index: 0, .. }));
    }

    #[test]
    fn missing_file_yields_empty_catalog() {
        let catalog = RoundCatalog::load_or_empty(Path::new("does/not/exist/rounds.json"));
        assert!(catalog.is_empty());
    }
}
