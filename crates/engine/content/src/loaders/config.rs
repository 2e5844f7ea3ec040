//! Engine configuration loader.

use std::path::Path;

use cadence_core::EngineConfig;
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine timing from TOML files.
///
/// Keys left out of the file keep their defaults:
///
/// ```toml
/// promotion_delay_ms = 10
/// resume_delay_ms = 10
/// effect_resume_delay_ms = 1000
/// reaction_delay_ms = 100
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        let config = Self::from_str(&content)?;
        debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Parse config data from TOML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}
