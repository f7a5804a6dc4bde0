use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow::csv::Writer;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchWriter};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{OutputError, OutputResult};

/// A table file. The format follows the file extension, an existing file is replaced.
#[derive(Debug)]
pub enum DataOutput {
    Parquet(WriterParquet),
    Csv(WriterCsv),
}

impl DataOutput {
    pub fn new(file_name: &Path, schema: Schema) -> OutputResult<Self> {
        let format = file_name.extension().and_then(|ext| ext.to_str());
        let output = match format {
            Some("parquet") => DataOutput::Parquet(WriterParquet::new(file_name, schema)?),
            Some("csv") => DataOutput::Csv(WriterCsv::new(file_name)?),
            _ => {
                return Err(OutputError::UnsupportedFormat {
                    path: file_name.to_path_buf(),
                })
            }
        };
        Ok(output)
    }

    pub fn write(&mut self, batch: &RecordBatch) -> OutputResult<()> {
        match self {
            DataOutput::Parquet(output) => output.writer.write(batch)?,
            DataOutput::Csv(output) => output.writer.write(batch)?,
        }
        Ok(())
    }

    pub fn close(self) -> OutputResult<()> {
        match self {
            DataOutput::Parquet(output) => output.close(),
            DataOutput::Csv(output) => output.close(),
        }
    }
}

fn create(file_name: &Path) -> OutputResult<File> {
    if file_name.exists() {
        fs::remove_file(file_name).map_err(|e| OutputError::io(file_name, e))?;
    }
    File::create(file_name).map_err(|e| OutputError::io(file_name, e))
}

#[derive(Debug)]
pub struct WriterParquet {
    pub writer: ArrowWriter<File>,
}

impl WriterParquet {
    fn new(file_name: &Path, schema: Schema) -> OutputResult<Self> {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let output_file = create(file_name)?;
        let writer = ArrowWriter::try_new(output_file, SchemaRef::from(schema), Some(props))?;
        Ok(Self { writer })
    }

    pub fn close(self) -> OutputResult<()> {
        self.writer.close()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct WriterCsv {
    pub writer: Writer<File>,
    path: PathBuf,
}

impl WriterCsv {
    fn new(file_name: &Path) -> OutputResult<Self> {
        let writer = Writer::new(create(file_name)?);
        Ok(Self {
            writer,
            path: file_name.to_path_buf(),
        })
    }

    pub fn close(self) -> OutputResult<()> {
        let path = self.path;
        self.writer.close()?;
        log::debug!("Closed {}", path.display());
        Ok(())
    }
}
