use std::path::Path;
use std::sync::Arc;

use wisp_core::simulation::SimulationSummary;

use crate::arrow::array::{ArrayRef, RecordBatch, UInt64Array};
use crate::arrow::datatypes::{DataType, Field, Schema};
use crate::error::OutputResult;
use crate::result::ResultWriter;
use crate::writer::DataOutput;

/// Node and edge counts per round.
#[derive(Debug)]
pub struct TopologyWriter {
    round: Vec<u64>,
    nodes: Vec<u64>,
    edges: Vec<u64>,
    to_output: DataOutput,
}

impl TopologyWriter {
    pub fn new(output_file: &Path) -> OutputResult<Self> {
        Ok(Self {
            to_output: DataOutput::new(output_file, Self::schema())?,
            round: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        })
    }

    pub fn add_data(&mut self, summary: &SimulationSummary) {
        self.round.push(summary.round);
        self.nodes.push(summary.nodes as u64);
        self.edges.push(summary.edges as u64);
    }
}

impl ResultWriter for TopologyWriter {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("round", DataType::UInt64, false),
            Field::new("nodes", DataType::UInt64, false),
            Field::new("edges", DataType::UInt64, false),
        ])
    }

    fn write_to_file(&mut self) -> OutputResult<()> {
        if self.round.is_empty() {
            return Ok(());
        }
        let record_batch = RecordBatch::try_from_iter(vec![
            (
                "round",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.round))) as ArrayRef,
            ),
            (
                "nodes",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.nodes))) as ArrayRef,
            ),
            (
                "edges",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.edges))) as ArrayRef,
            ),
        ])?;
        self.to_output.write(&record_batch)
    }

    fn close_file(mut self) -> OutputResult<()> {
        self.write_to_file()?;
        self.to_output.close()
    }
}
