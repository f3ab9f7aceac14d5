use crate::{MatchError, MatchResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Matcher run configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// Threads for the parallel matcher; ignored when `parallel` is off
    pub n_threads: usize,
    /// Run the outer query loop on the Rayon pool
    pub parallel: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            n_threads: 1,
            parallel: false,
            name: None,
        }
    }
}

impl MatchConfig {
    /// Sequential preset, matching the legacy tool exactly
    pub fn sequential() -> Self {
        Self {
            n_threads: 1,
            parallel: false,
            name: Some("Sequential".to_string()),
        }
    }

    /// Parallel preset using every available core
    pub fn parallel_preset() -> Self {
        Self {
            n_threads: num_cpus::get().max(1),
            parallel: true,
            name: Some("Parallel".to_string()),
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> MatchResult<()> {
        if self.n_threads == 0 {
            return Err(MatchError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "MatchConfig: parallel={}, threads={}",
            self.parallel, self.n_threads
        )
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
