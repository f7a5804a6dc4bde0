use std::path::{Path, PathBuf};

use log::info;

use wisp_core::behavior::NodeBehavior;
use wisp_core::control::{RoundDriver, RunControl};
use wisp_core::error::SimResult;
use wisp_core::node::NodeId;
use wisp_core::registry::ModelRegistry;
use wisp_core::simulation::Simulation;
use wisp_models::register_defaults;
use wisp_output::logger::initiate_logger;
use wisp_output::result::Results;
use wisp_output::ui::SimUIMetadata;

use crate::flooding::hooks::FloodHooks;
use crate::flooding::relay::{FloodSource, Relay};
use crate::simulation::config::{BaseConfig, BaseConfigReader};
use crate::simulation::ui::FloodRenderer;

pub struct SimulationBuilder {
    base_config: BaseConfig,
    config_path: PathBuf,
    metadata: SimUIMetadata,
    registry: ModelRegistry,
}

impl SimulationBuilder {
    pub fn new(base_config_file: &str) -> Self {
        if !Path::new(base_config_file).exists() {
            panic!("Configuration file {} is not found.", base_config_file);
        }
        let config_path = Path::new(base_config_file)
            .parent()
            .unwrap_or_else(|| panic!("Invalid directory for the configuration file"))
            .to_path_buf();

        let config_reader = BaseConfigReader::new(base_config_file);
        match config_reader.parse() {
            Ok(base_config) => Self::with_config(base_config, config_path, base_config_file),
            Err(e) => panic!("Error while parsing the base configuration file: {}", e),
        }
    }

    /// A builder for an already parsed configuration. Relative paths resolve against
    /// `config_path`.
    pub fn with_config(base_config: BaseConfig, config_path: PathBuf, input_file: &str) -> Self {
        let metadata = Self::build_metadata(&base_config, input_file);
        let mut registry = ModelRegistry::new();
        if let Err(e) = register_defaults(&mut registry) {
            panic!("Error while registering the bundled models: {}", e);
        }
        Self {
            base_config,
            config_path,
            metadata,
            registry,
        }
    }

    fn build_metadata(base_config: &BaseConfig, input_file: &str) -> SimUIMetadata {
        SimUIMetadata {
            project: base_config.project.name.clone(),
            input_file: input_file.to_owned(),
            output_path: base_config
                .output_settings
                .as_ref()
                .map(|settings| settings.output_path.clone())
                .unwrap_or_default(),
            log_path: base_config.log_settings.log_path.clone(),
        }
    }

    pub fn config(&self) -> &BaseConfig {
        &self.base_config
    }

    /// Models of other scopes are registered here before [`SimulationBuilder::build`].
    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    pub fn build(&mut self) -> Simulation {
        match initiate_logger(&self.config_path, &self.base_config.log_settings) {
            Ok(log_file) => self.metadata.log_path = log_file.display().to_string(),
            Err(e) => panic!("Error while initializing the logger: {}", e),
        }
        info!("Building the flooding simulation...");
        match self.build_simulation() {
            Ok(sim) => sim,
            Err(e) => panic!("Error while building the simulation: {}", e),
        }
    }

    /// Places the nodes and resolves every model. The logger is left alone.
    pub fn build_simulation(&self) -> SimResult<Simulation> {
        let flooding = &self.base_config.flooding;
        let mut sim = Simulation::from_registry(
            self.base_config.project.clone(),
            &self.registry,
            Box::new(FloodHooks::new(flooding.floods)),
        )?;
        let mut distribution = self.registry.distribution(&flooding.distribution)?;
        let source = NodeId::from(flooding.source as u64);
        let flood_source = FloodSource {
            interval: flooding.interval,
            floods: flooding.floods,
            payload_size: flooding.payload_size,
        };

        sim.place_nodes(distribution.as_mut(), flooding.nodes, |id| {
            let models = self.registry.node_models(&flooding.node_models)?;
            let behavior: Box<dyn NodeBehavior> = if id == source {
                Box::new(Relay::source(flood_source))
            } else {
                Box::new(Relay::new())
            };
            Ok((models, behavior))
        })?;
        info!("Source is node {}", source);
        Ok(sim)
    }

    pub fn driver(&self) -> RoundDriver {
        RoundDriver::new(RunControl::new(), self.base_config.run_settings.pacing)
    }

    pub fn rounds(&self) -> u64 {
        self.base_config.run_settings.rounds
    }

    pub fn headless(&self) -> bool {
        self.base_config.run_settings.headless
    }

    pub fn results(&self) -> Option<Results> {
        let settings = self.base_config.output_settings.as_ref()?;
        match Results::new(&self.config_path, settings) {
            Ok(results) => Some(results),
            Err(e) => panic!("Error while creating the output files: {}", e),
        }
    }

    pub fn metadata(&self) -> SimUIMetadata {
        self.metadata.clone()
    }

    pub fn renderer(&self) -> FloodRenderer {
        FloodRenderer::new()
    }
}
