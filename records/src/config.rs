//! Analyzer configuration.
//!
//! Policy thresholds, the note length budget, and batch controls are
//! configuration inputs rather than analyzer decisions. They are read from a
//! YAML file; every section is optional and falls back to the pipeline's
//! documented defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! evaluation:
//!   pass_threshold: 0.5
//!   platform_acceptance_floor: -0.5
//!   qualifying_status: "CORRECTION WITH TRUSTWORTHY CITATION"
//! length:
//!   limit: 280
//!   url_cost: 1
//! batch:
//!   limit: 500
//!   jobs: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use note_funnel_core::labels::QUALIFYING_STATUS;
use serde::{Deserialize, Serialize};

use crate::error::{RecordsError, Result};

/// Largest accepted `length.limit`.
pub const MAX_LENGTH_LIMIT: usize = 100_000;

/// Largest accepted `length.url_cost`.
pub const MAX_URL_COST: usize = 10_000;

/// Gate thresholds for stage evaluation.
///
/// # Examples
///
/// ```
/// # use note_funnel_records::EvaluationConfig;
/// let eval = EvaluationConfig::default();
/// assert_eq!(eval.pass_threshold, 0.5);
/// assert_eq!(eval.platform_acceptance_floor, -0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Filter scores must exceed this value to pass.
    pub pass_threshold: f64,
    /// Platform acceptance scores pass at or above this value.
    pub platform_acceptance_floor: f64,
    /// Status admitting a record into the filter phase.
    pub qualifying_status: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 0.5,
            platform_acceptance_floor: -0.5,
            qualifying_status: QUALIFYING_STATUS.to_string(),
        }
    }
}

/// Note length budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthConfig {
    pub limit: usize,
    /// Characters charged per URL.
    pub url_cost: usize,
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            limit: 280,
            url_cost: 1,
        }
    }
}

impl LengthConfig {
    /// Checks that the budget and URL cost are within range.
    ///
    /// # Examples
    ///
    /// ```
    /// use note_funnel_records::LengthConfig;
    ///
    /// assert!(LengthConfig::default().validate().is_ok());
    /// assert!(LengthConfig { limit: 280, url_cost: usize::MAX }.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LENGTH_LIMIT {
            return Err(RecordsError::InvalidConfig(format!(
                "length.limit must be between 1 and {MAX_LENGTH_LIMIT}"
            )));
        }
        if self.url_cost > MAX_URL_COST {
            return Err(RecordsError::InvalidConfig(format!(
                "length.url_cost must be at most {MAX_URL_COST}"
            )));
        }
        Ok(())
    }
}

/// Batch controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of records analyzed per run (unlimited when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Worker threads for stage evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

/// Top-level analyzer configuration.
///
/// # Examples
///
/// ```no_run
/// use note_funnel_records::AnalyzerConfig;
///
/// let config = AnalyzerConfig::load("note-funnel.yml").unwrap();
/// println!("qualifying status: {}", config.evaluation.qualifying_status);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub evaluation: EvaluationConfig,
    pub length: LengthConfig,
    pub batch: BatchConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            evaluation: EvaluationConfig::default(),
            length: LengthConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RecordsError::IoError) if the file cannot
    /// be read, [`YamlError`](crate::RecordsError::YamlError) if parsing
    /// fails, or [`InvalidConfig`](crate::RecordsError::InvalidConfig) if a
    /// value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks that every value is usable.
    ///
    /// # Examples
    ///
    /// ```
    /// use note_funnel_records::AnalyzerConfig;
    ///
    /// let mut config = AnalyzerConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.batch.jobs = Some(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !self.evaluation.pass_threshold.is_finite() {
            return Err(RecordsError::InvalidConfig(
                "evaluation.pass_threshold must be a finite number".to_string(),
            ));
        }
        if !self.evaluation.platform_acceptance_floor.is_finite() {
            return Err(RecordsError::InvalidConfig(
                "evaluation.platform_acceptance_floor must be a finite number".to_string(),
            ));
        }
        if self.evaluation.qualifying_status.trim().is_empty() {
            return Err(RecordsError::InvalidConfig(
                "evaluation.qualifying_status cannot be empty".to_string(),
            ));
        }
        self.length.validate()?;
        if self.batch.limit == Some(0) {
            return Err(RecordsError::InvalidConfig(
                "batch.limit must be at least 1".to_string(),
            ));
        }
        if self.batch.jobs == Some(0) {
            return Err(RecordsError::InvalidConfig(
                "batch.jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
