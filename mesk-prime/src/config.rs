use std::path::Path;
use std::time::Duration;

use mesk_detect::AnalysisSettings;
use mesk_detect::backend::mock::ScriptedLoader;
use mesk_field::MapViewport;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub backend: BackendConfig,
    pub map: MapViewport,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub score_threshold: f64,
    pub analysis_delay_ms: u64,
    /// Detections listed per image in reports.
    pub display_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            score_threshold: mesk_detect::SCORE_THRESHOLD,
            analysis_delay_ms: 500,
            display_limit: 3,
        }
    }
}

impl DetectionConfig {
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            score_threshold: self.score_threshold,
            load_delay: Duration::from_millis(self.analysis_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Scripted {
        #[serde(default = "enabled")]
        accelerated: bool,
        #[serde(default)]
        labels: Vec<LabelConfig>,
    },
    Unavailable,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Scripted {
            accelerated: true,
            labels: Vec::new(),
        }
    }
}

impl BackendConfig {
    pub fn loader(&self) -> ScriptedLoader {
        match self {
            Self::Scripted {
                accelerated,
                labels,
            } => {
                let loader =
                    ScriptedLoader::new(labels.iter().map(|l| (l.label.clone(), l.score)));
                if *accelerated {
                    loader
                } else {
                    loader.without_accelerator()
                }
            }
            Self::Unavailable => ScriptedLoader::unavailable(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelConfig {
    pub label: String,
    pub score: f64,
}

fn enabled() -> bool {
    true
}
