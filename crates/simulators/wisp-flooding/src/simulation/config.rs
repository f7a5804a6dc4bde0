use std::path::PathBuf;

use serde::Deserialize;

use wisp_core::control::Pacing;
use wisp_core::error::{SimError, SimResult};
use wisp_core::project::Project;
use wisp_core::registry::{ModelSettings, NodeModelSettings};
use wisp_output::logger::LogSettings;
use wisp_output::result::OutputSettings;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    pub project: Project,
    pub run_settings: RunSettings,
    pub flooding: FloodingSettings,
    pub log_settings: LogSettings,
    pub output_settings: Option<OutputSettings>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    pub rounds: u64,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub pacing: Pacing,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FloodingSettings {
    pub nodes: usize,
    /// Position of the source among the placed nodes.
    #[serde(default)]
    pub source: usize,
    pub interval: u64,
    pub floods: u32,
    #[serde(default)]
    pub payload_size: usize,
    pub distribution: ModelSettings,
    pub node_models: NodeModelSettings,
}

impl FloodingSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.nodes == 0 {
            return Err(SimError::config("flooding.nodes", "must place at least one node"));
        }
        if self.source >= self.nodes {
            return Err(SimError::config(
                "flooding.source",
                format!("{} is not one of the {} nodes", self.source, self.nodes),
            ));
        }
        if self.interval == 0 {
            return Err(SimError::config("flooding.interval", "must be at least one round"));
        }
        Ok(())
    }
}

pub struct BaseConfigReader {
    file_path: PathBuf,
}

impl BaseConfigReader {
    pub fn new(file_name: &str) -> Self {
        let file_path = PathBuf::from(file_name);
        Self { file_path }
    }

    pub fn parse(&self) -> Result<BaseConfig, Box<dyn std::error::Error>> {
        let parsing_result = std::fs::read_to_string(&self.file_path)?;
        let config = parse_config(&parsing_result)?;
        Ok(config)
    }
}

/// Parses and validates a configuration.
pub fn parse_config(content: &str) -> Result<BaseConfig, Box<dyn std::error::Error>> {
    let config: BaseConfig = toml::from_str(content)?;
    config.project.validate()?;
    config.run_settings.pacing.validate()?;
    config.flooding.validate()?;
    Ok(config)
}
