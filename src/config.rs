//! Request input and sampling defaults.
//!
//! Values are resolved with the following precedence:
//! 1. Command-line flags and their `PLOTCORE_*` environment variables
//! 2. Fields of a JSON request document
//! 3. A JSON configuration file
//! 4. Built-in defaults

use crate::classify::Mode;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_XMIN: f64 = -10.0;
const DEFAULT_XMAX: f64 = 10.0;
const DEFAULT_POINTS: usize = 500;
const DEFAULT_MAX_POINTS: usize = 250_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{points} points requested, the limit is {max}")]
    TooManyPoints { points: usize, max: usize },
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialInput")]
pub struct RawInput {
    pub expression: String,
    pub xmin: f64,
    pub xmax: f64,
    pub points: usize,
    pub mode: Option<Mode>,
}

impl Default for RawInput {
    fn default() -> Self {
        Settings::default().resolve(PartialInput::default())
    }
}

impl RawInput {
    pub fn new(expression: impl Into<String>) -> Self {
        RawInput {
            expression: expression.into(),
            ..Default::default()
        }
    }
}

/// A request with every field optional, as it arrives in JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialInput {
    pub expression: Option<String>,
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub points: Option<usize>,
    #[serde(deserialize_with = "lenient_mode")]
    pub mode: Option<Mode>,
}

impl From<PartialInput> for RawInput {
    fn from(partial: PartialInput) -> Self {
        Settings::default().resolve(partial)
    }
}

impl PartialInput {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Fill unset fields from `other`.
    pub fn or(self, other: PartialInput) -> PartialInput {
        PartialInput {
            expression: self.expression.or(other.expression),
            xmin: self.xmin.or(other.xmin),
            xmax: self.xmax.or(other.xmax),
            points: self.points.or(other.points),
            mode: self.mode.or(other.mode),
        }
    }
}

// unknown mode names count as "no hint"
fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<Mode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|name| match name.parse() {
        Ok(mode) => Some(mode),
        Err(e) => {
            warn!("ignoring mode hint: {e}");
            None
        }
    }))
}

/// Defaults applied to requests, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_xmin")]
    pub xmin: f64,
    #[serde(default = "default_xmax")]
    pub xmax: f64,
    #[serde(default = "default_points")]
    pub points: usize,
    /// Upper bound on `points` accepted from a request.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

fn default_xmin() -> f64 {
    DEFAULT_XMIN
}

fn default_xmax() -> f64 {
    DEFAULT_XMAX
}

fn default_points() -> usize {
    DEFAULT_POINTS
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            xmin: DEFAULT_XMIN,
            xmax: DEFAULT_XMAX,
            points: DEFAULT_POINTS,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded settings from {}: {settings:?}", path.display());
        Ok(settings)
    }

    pub fn resolve(&self, partial: PartialInput) -> RawInput {
        RawInput {
            expression: partial.expression.unwrap_or_default(),
            xmin: partial.xmin.unwrap_or(self.xmin),
            xmax: partial.xmax.unwrap_or(self.xmax),
            points: partial.points.unwrap_or(self.points),
            mode: partial.mode,
        }
    }

    pub fn check(&self, input: &RawInput) -> Result<(), ConfigError> {
        if input.points > self.max_points {
            return Err(ConfigError::TooManyPoints {
                points: input.points,
                max: self.max_points,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_take_defaults() {
        let input: RawInput = serde_json::from_str(r#"{"expression": "x^2"}"#).unwrap();
        assert_eq!(input.expression, "x^2");
        assert_eq!((input.xmin, input.xmax, input.points), (-10.0, 10.0, 500));
        assert_eq!(input.mode, None);

        let empty: RawInput = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RawInput::default());
        assert_eq!(empty.expression, "");
    }

    #[test]
    fn mode_hints_are_lenient() {
        let input: RawInput =
            serde_json::from_str(r#"{"expression": "t", "mode": "Parametric"}"#).unwrap();
        assert_eq!(input.mode, Some(Mode::Parametric));
        let input: RawInput =
            serde_json::from_str(r#"{"expression": "t", "mode": "sideways"}"#).unwrap();
        assert_eq!(input.mode, None);
        let input: RawInput = serde_json::from_str(r#"{"mode": null}"#).unwrap();
        assert_eq!(input.mode, None);
    }

    #[test]
    fn earlier_sources_win() {
        let flags = PartialInput { points: Some(9), ..Default::default() };
        let request = PartialInput::from_json(r#"{"points": 4, "xmin": 0}"#).unwrap();
        let settings = Settings { xmax: 2.0, ..Default::default() };

        let input = settings.resolve(flags.or(request));
        assert_eq!(input.points, 9);
        assert_eq!(input.xmin, 0.0);
        assert_eq!(input.xmax, 2.0);
    }

    #[test]
    fn settings_files_may_be_partial() {
        let settings: Settings = serde_json::from_str(r#"{"max_points": 100}"#).unwrap();
        assert_eq!(settings.max_points, 100);
        assert_eq!(settings.points, 500);
    }

    #[test]
    fn point_limit() {
        let settings = Settings { max_points: 10, ..Default::default() };
        assert!(settings.check(&RawInput { points: 10, ..RawInput::new("x") }).is_ok());
        assert!(matches!(
            settings.check(&RawInput { points: 11, ..RawInput::new("x") }),
            Err(ConfigError::TooManyPoints { points: 11, max: 10 })
        ));
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = Settings::load(Path::new("/nonexistent/plotcore.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/plotcore.json"));
    }
}
