//! Output sinks and the index-assigning record writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kiji_common::{CleanedDocument, ContentHash, CorpusRecord, KijiError, RunState};
use kiji_config::OutputFormat;
use tracing::{debug, info};

const CSV_HEADER: [&str; 4] = ["index", "date", "text", "links"];
const MAX_FILE_STEM: usize = 100;

/// Append-only destination for retained documents.
pub trait RecordSink: Send {
    fn append(&mut self, index: u64, doc: &CleanedDocument) -> kiji_common::Result<()>;

    fn finish(&mut self) -> kiji_common::Result<()> {
        Ok(())
    }
}

fn sink_err(e: csv::Error) -> KijiError {
    KijiError::Sink(e.to_string())
}

/// One CSV file with an `index,date,text,links` header. Rows are flushed as
/// they are written so a file abandoned mid-run keeps every finished row.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> kiji_common::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::new(File::create(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> kiji_common::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER).map_err(sink_err)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> kiji_common::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| KijiError::Sink(e.to_string()))
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn append(&mut self, index: u64, doc: &CleanedDocument) -> kiji_common::Result<()> {
        self.writer
            .serialize(CorpusRecord::new(index, doc))
            .map_err(sink_err)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> kiji_common::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One `.txt` file per record inside a directory.
pub struct TextDirSink {
    dir: PathBuf,
}

impl TextDirSink {
    pub fn create(dir: &Path) -> kiji_common::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

impl RecordSink for TextDirSink {
    fn append(&mut self, index: u64, doc: &CleanedDocument) -> kiji_common::Result<()> {
        let path = self.dir.join(text_file_name(&doc.url, index));
        let mut out = BufWriter::new(File::create(&path)?);
        write!(out, "{}\n\nLinks:\n{}", doc.text, doc.links.join("\n"))?;
        out.flush()?;
        debug!(path = %path.display(), index, "pipeline.sink.text_file");
        Ok(())
    }
}

/// `<last path segment>_<index>.txt`, or the URL digest in place of the
/// segment when it is empty or too long for a file name.
pub fn text_file_name(url: &str, index: u64) -> String {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segs| segs.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => url.rsplit('/').next().unwrap_or_default().to_string(),
    };
    let stem_ok = !segment.is_empty()
        && segment.chars().count() <= MAX_FILE_STEM
        && !segment.contains(['\\', ':'])
        && segment != "."
        && segment != "..";
    let stem = if stem_ok {
        segment
    } else {
        ContentHash::of(url).to_string()
    };
    format!("{stem}_{index}.txt")
}

/// Assigns indices from a [`RunState`] and appends to a sink.
///
/// The index is consumed only after the sink accepted the record, so a
/// failed write leaves no gap.
pub struct RecordWriter {
    sink: Box<dyn RecordSink>,
    written: u64,
}

impl RecordWriter {
    pub fn new(sink: impl RecordSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            written: 0,
        }
    }

    /// Open the sink for a job output.
    pub fn open(format: OutputFormat, output: &Path) -> kiji_common::Result<Self> {
        info!(output = %output.display(), ?format, "pipeline.sink.open");
        Ok(match format {
            OutputFormat::Csv => Self::new(CsvSink::create(output)?),
            OutputFormat::Text => Self::new(TextDirSink::create(output)?),
        })
    }

    pub fn write(&mut self, state: &mut RunState, doc: &CleanedDocument) -> kiji_common::Result<u64> {
        let index = state.peek_index();
        self.sink.append(index, doc)?;
        self.written += 1;
        Ok(state.commit_index())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(mut self) -> kiji_common::Result<()> {
        self.sink.finish()
    }
}
