use std::path::Path;
use std::sync::Arc;

use typed_builder::TypedBuilder;

use wisp_core::statistics::Statistics;

use crate::arrow::array::{ArrayRef, RecordBatch, UInt64Array};
use crate::arrow::datatypes::{DataType, Field, Schema};
use crate::error::OutputResult;
use crate::result::ResultWriter;
use crate::writer::DataOutput;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TypedBuilder)]
struct Totals {
    sent: u64,
    received: u64,
    sent_bytes: u64,
    received_bytes: u64,
}

impl Totals {
    fn of(statistics: &Statistics) -> Self {
        Self::builder()
            .sent(statistics.sent_messages())
            .received(statistics.received_messages())
            .sent_bytes(statistics.sent_bytes())
            .received_bytes(statistics.received_bytes())
            .build()
    }
}

/// Messages and bytes sent and received per round. Rows are the difference of the running
/// totals between two recorded rounds, so the per-round history need not be kept.
#[derive(Debug)]
pub struct RoundStatsWriter {
    round: Vec<u64>,
    sent: Vec<u64>,
    received: Vec<u64>,
    sent_bytes: Vec<u64>,
    received_bytes: Vec<u64>,
    previous: Totals,
    to_output: DataOutput,
}

impl RoundStatsWriter {
    pub fn new(output_file: &Path) -> OutputResult<Self> {
        Ok(Self {
            to_output: DataOutput::new(output_file, Self::schema())?,
            round: Vec::new(),
            sent: Vec::new(),
            received: Vec::new(),
            sent_bytes: Vec::new(),
            received_bytes: Vec::new(),
            previous: Totals::default(),
        })
    }

    pub fn add_data(&mut self, round: u64, statistics: &Statistics) {
        let totals = Totals::of(statistics);
        self.round.push(round);
        self.sent.push(totals.sent.saturating_sub(self.previous.sent));
        self.received
            .push(totals.received.saturating_sub(self.previous.received));
        self.sent_bytes
            .push(totals.sent_bytes.saturating_sub(self.previous.sent_bytes));
        self.received_bytes
            .push(totals.received_bytes.saturating_sub(self.previous.received_bytes));
        self.previous = totals;
    }

    pub fn pending_rows(&self) -> usize {
        self.round.len()
    }
}

impl ResultWriter for RoundStatsWriter {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("round", DataType::UInt64, false),
            Field::new("sent", DataType::UInt64, false),
            Field::new("received", DataType::UInt64, false),
            Field::new("sent_bytes", DataType::UInt64, false),
            Field::new("received_bytes", DataType::UInt64, false),
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
                "sent",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.sent))) as ArrayRef,
            ),
            (
                "received",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.received))) as ArrayRef,
            ),
            (
                "sent_bytes",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.sent_bytes))) as ArrayRef,
            ),
            (
                "received_bytes",
                Arc::new(UInt64Array::from(std::mem::take(&mut self.received_bytes))) as ArrayRef,
            ),
        ])?;
        self.to_output.write(&record_batch)
    }

    fn close_file(mut self) -> OutputResult<()> {
        self.write_to_file()?;
        self.to_output.close()
    }
}
