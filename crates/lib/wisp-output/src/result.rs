use std::fs;
use std::path::{Path, PathBuf};

use arrow::datatypes::Schema;
use log::debug;
use serde::Deserialize;

use wisp_core::simulation::Simulation;

use crate::error::{OutputError, OutputResult};
use crate::tables::rounds::RoundStatsWriter;
use crate::tables::topology::TopologyWriter;

#[derive(Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputType {
    RoundStats,
    Topology,
}

fn every_round() -> u64 {
    1
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Rows are buffered and written every `output_interval` rounds.
    #[serde(default = "every_round")]
    pub output_interval: u64,
    pub output_path: String,
    #[serde(default)]
    pub outputs: Vec<Outputs>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    pub output_type: OutputType,
    pub output_filename: String,
}

pub trait ResultWriter {
    fn schema() -> Schema;
    fn write_to_file(&mut self) -> OutputResult<()>;
    fn close_file(self) -> OutputResult<()>;
}

/// The tables requested by the configuration. A table listed twice is written to the file of
/// its last entry.
#[derive(Debug)]
pub struct Results {
    pub round_stats: Option<RoundStatsWriter>,
    pub topology: Option<TopologyWriter>,
    output_interval: u64,
    output_path: PathBuf,
}

impl Results {
    pub fn new(base_path: &Path, output_settings: &OutputSettings) -> OutputResult<Self> {
        let output_path = base_path.join(&output_settings.output_path).join("files");
        if !output_path.exists() {
            fs::create_dir_all(&output_path).map_err(|e| OutputError::io(&output_path, e))?;
        }
        let file_of = |output_type: OutputType| {
            output_settings
                .outputs
                .iter()
                .filter(|output| output.output_type == output_type)
                .last()
                .map(|settings| output_path.join(&settings.output_filename))
        };

        let round_stats = file_of(OutputType::RoundStats)
            .map(|file| RoundStatsWriter::new(&file))
            .transpose()?;
        let topology = file_of(OutputType::Topology)
            .map(|file| TopologyWriter::new(&file))
            .transpose()?;
        Ok(Self {
            round_stats,
            topology,
            output_interval: output_settings.output_interval.max(1),
            output_path,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Adds the rows of the round that just completed and writes them out when the interval
    /// is reached.
    pub fn record(&mut self, sim: &Simulation) -> OutputResult<()> {
        let summary = sim.summary();
        if let Some(writer) = &mut self.round_stats {
            writer.add_data(summary.round, sim.statistics());
        }
        if let Some(writer) = &mut self.topology {
            writer.add_data(&summary);
        }
        if summary.round % self.output_interval == 0 {
            self.write_to_file()?;
        }
        Ok(())
    }

    pub fn write_to_file(&mut self) -> OutputResult<()> {
        if let Some(writer) = &mut self.round_stats {
            writer.write_to_file()?;
        }
        if let Some(writer) = &mut self.topology {
            writer.write_to_file()?;
        }
        Ok(())
    }

    pub fn close_files(self) -> OutputResult<()> {
        if let Some(writer) = self.round_stats {
            writer.close_file()?;
        }
        if let Some(writer) = self.topology {
            writer.close_file()?;
        }
        debug!("Output files closed in {}", self.output_path.display());
        Ok(())
    }
}
